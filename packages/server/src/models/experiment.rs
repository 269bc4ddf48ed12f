use chrono::NaiveDate;
use serde::Serialize;

/// Options for rendering the new-experiment form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct NewExperimentForm {
    /// Mapping schema files available for experiment types without a fixed schema.
    #[schema(example = json!(["ED_mapping.json", "TEM_mapping.json", "TVIPS_mapping.json"]))]
    pub schema_files: Vec<String>,
    /// Material suggestions; `Other` enables the free-text `custom_material` field.
    pub materials: Vec<&'static str>,
    #[schema(example = json!(["ED", "TVIPS", "TEM"]))]
    pub experiment_types: Vec<&'static str>,
    /// Today's date (UTC).
    #[schema(value_type = String, example = "2026-10-19")]
    pub default_date: NaiveDate,
    #[schema(example = 2026)]
    pub current_year: i32,
    #[schema(example = "Trieste")]
    pub default_location: String,
}

/// Response for a stored experiment.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ExperimentCreated {
    #[schema(example = "success")]
    pub status: &'static str,
    /// Object key of the stored container.
    #[schema(example = "TEM_1760870400.nxs")]
    pub filename: String,
}
