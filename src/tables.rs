use crate::ingest::{ColumnMap, TableRowParser};
use crate::schema::{TableSchema, OA_ZONE_WIDTH};

pub const ENGLAND: &str = "England";
pub const WALES: &str = "Wales";
pub const SCOTLAND: &str = "Scotland";
pub const NORTHERN_IRELAND: &str = "Northern Ireland";

/// Table names the driver accepts, in catalogue order.
pub const TABLE_NAMES: [&str; 10] = [
    "ks001", "ks002", "ks004", "ks006", "ks009", "ks013", "ks016", "ks017",
    "ks020", "cs021",
];

/// One catalogue entry: the schema plus any per-country column layout
/// exceptions. This data replaces the per-table classes of the old
/// pipeline; every table goes through the same engine.
pub struct TableDef {
    pub schema: TableSchema,
    country_maps: Vec<(&'static str, ColumnMap)>,
}

impl TableDef {
    fn plain(schema: TableSchema) -> Self {
        Self {
            schema,
            country_maps: Vec::new(),
        }
    }

    /// Row parser configured with this table's country exceptions.
    pub fn parser(&self) -> TableRowParser {
        let mut parser = TableRowParser::new(&self.schema);
        for (country, map) in &self.country_maps {
            parser = parser.with_country_map(country, map.clone());
        }
        parser
    }
}

/// Look a table up by catalogue name.
pub fn builtin(name: &str) -> Option<TableDef> {
    match name {
        "ks001" => Some(usual_residents()),
        "ks002" => Some(age_structure()),
        "ks004" => Some(marital_status()),
        "ks006" => Some(ethnic_group()),
        "ks009" => Some(economic_activity()),
        "ks013" => Some(qualifications()),
        "ks016" => Some(household_spaces()),
        "ks017" => Some(cars_and_vans()),
        "ks020" => Some(household_composition()),
        "cs021" => Some(communal_residents()),
        _ => None,
    }
}

fn usual_residents() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks001",
        OA_ZONE_WIDTH,
        &["all_people", "males", "females", "lives_in_household", "lives_in_communal"],
    ))
}

fn age_structure() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks002",
        OA_ZONE_WIDTH,
        &[
            "all_people",
            "age_0_4",
            "age_5_7",
            "age_8_9",
            "age_10_14",
            "age_15",
            "age_16_17",
            "age_18_19",
            "age_20_24",
            "age_25_29",
            "age_30_44",
            "age_45_59",
            "age_60_64",
            "age_65_74",
            "age_75_84",
            "age_85_89",
            "age_90_plus",
        ],
    ))
}

fn marital_status() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks004",
        OA_ZONE_WIDTH,
        &[
            "all_people_16_plus",
            "single",
            "married",
            "remarried",
            "separated",
            "divorced",
            "widowed",
        ],
    ))
}

fn ethnic_group() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks006",
        OA_ZONE_WIDTH,
        &[
            "all_people",
            "white",
            "mixed",
            "asian_or_asian_british",
            "black_or_black_british",
            "chinese_or_other",
        ],
    ))
}

fn economic_activity() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks009",
        OA_ZONE_WIDTH,
        &[
            "all_people_16_74",
            "employed_part_time",
            "employed_full_time",
            "self_employed",
            "unemployed",
            "full_time_student",
            "retired",
            "looking_after_home",
            "permanently_sick",
            "economically_inactive_other",
        ],
    ))
}

/// The qualifications table is the layout-variance case: Northern Ireland
/// extracts carry a separate level-5 column that every other country folds
/// into level 4/5 at source. The NI map absorbs data column 13 into field
/// 5 by addition so one schema covers all four countries.
fn qualifications() -> TableDef {
    let schema = TableSchema::new(
        "ks013",
        OA_ZONE_WIDTH,
        &[
            "all_people_16_74",
            "no_qualifications",
            "level_1",
            "level_2",
            "level_3",
            "level_4_5",
            "other_qualifications",
            "full_time_students_16_17",
            "full_time_students_18_74",
            "students_in_employment",
            "students_unemployed",
            "students_economically_inactive",
            "schoolchildren_16_17",
        ],
    );
    let ni_map = ColumnMap::with_folds(schema.field_count(), &[(13, 5)]);
    TableDef {
        schema,
        country_maps: vec![(NORTHERN_IRELAND, ni_map)],
    }
}

fn household_spaces() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks016",
        OA_ZONE_WIDTH,
        &[
            "all_household_spaces",
            "with_residents",
            "vacant",
            "second_residence",
            "holiday_accommodation",
        ],
    ))
}

fn cars_and_vans() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks017",
        OA_ZONE_WIDTH,
        &[
            "all_households",
            "no_car",
            "one_car",
            "two_cars",
            "three_cars",
            "four_plus_cars",
        ],
    ))
}

fn household_composition() -> TableDef {
    TableDef::plain(TableSchema::new(
        "ks020",
        OA_ZONE_WIDTH,
        &[
            "all_households",
            "one_person_pensioner",
            "one_person_other",
            "one_family_pensioners",
            "one_family_no_children",
            "one_family_dependent_children",
            "one_family_nondependent_children",
            "lone_parent_dependent_children",
            "lone_parent_nondependent_children",
            "other_households",
        ],
    ))
}

fn communal_residents() -> TableDef {
    TableDef::plain(TableSchema::new(
        "cs021",
        OA_ZONE_WIDTH,
        &[
            "all_communal_residents",
            "medical_establishment",
            "defence_establishment",
            "prison_service",
            "education_establishment",
            "other_establishment",
        ],
    ))
}
