use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Endpoint, PROJECT_ENDPOINT};

/// Renders a scalar JSON value the way it is stored: strings verbatim,
/// everything else through its JSON text.
#[must_use]
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunProcessing {
    #[serde(default)]
    #[garde(skip)]
    pub project_name: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub operation_platform: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub run_ext_id: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub run_ext_src: Option<String>,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub run_name: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub run_instrument: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub run_date: Option<String>,
    #[serde(default)]
    #[garde(dive)]
    pub specimen: Vec<SpecimenPayload>,
}

impl Endpoint for RunProcessing {
    fn endpoint() -> String {
        format!("{PROJECT_ENDPOINT}/{{project}}/ingest_run_processing")
    }
}

impl RunProcessing {
    pub fn readset_names(&self) -> impl Iterator<Item = &str> {
        self.specimen
            .iter()
            .flat_map(|specimen| &specimen.sample)
            .flat_map(|sample| &sample.readset)
            .map(|readset| readset.readset_name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SpecimenPayload {
    #[garde(length(min = 1))]
    pub specimen_name: String,
    #[serde(default)]
    #[garde(skip)]
    pub specimen_cohort: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub specimen_institution: Option<String>,
    #[serde(default)]
    #[garde(dive)]
    pub sample: Vec<SamplePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SamplePayload {
    #[garde(length(min = 1))]
    pub sample_name: String,
    #[serde(default)]
    #[garde(skip)]
    pub sample_alias: Option<Vec<String>>,
    #[serde(default)]
    #[garde(skip)]
    pub sample_tumour: bool,
    #[serde(default)]
    #[garde(dive)]
    pub readset: Vec<ReadsetPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReadsetPayload {
    #[serde(default)]
    #[garde(skip)]
    pub experiment_sequencing_technology: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub experiment_type: Option<String>,
    #[garde(skip)]
    pub experiment_nucleic_acid_type: String,
    #[serde(default)]
    #[garde(skip)]
    pub experiment_library_kit: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub experiment_kit_expiration_date: Option<String>,
    #[garde(length(min = 1))]
    pub readset_name: String,
    #[serde(default)]
    #[garde(skip)]
    pub readset_lane: Option<Value>,
    #[serde(default)]
    #[garde(skip)]
    pub readset_adapter1: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub readset_adapter2: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub readset_sequencing_type: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub readset_quality_offset: Option<Value>,
    #[serde(default)]
    #[garde(dive)]
    pub file: Vec<FilePayload>,
    #[serde(default)]
    #[garde(dive)]
    pub metric: Vec<MetricPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FilePayload {
    #[garde(pattern(r"^[^:/]+://"))]
    pub location_uri: String,
    #[garde(length(min = 1))]
    pub file_name: String,
    #[serde(default)]
    #[garde(skip)]
    pub file_extra_metadata: Option<Value>,
    #[serde(default)]
    #[garde(skip)]
    pub file_deliverable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MetricPayload {
    #[garde(length(min = 1))]
    pub metric_name: String,
    #[garde(skip)]
    pub metric_value: Value,
    #[serde(default)]
    #[garde(skip)]
    pub metric_flag: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub metric_aggregate: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub metric_deliverable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Transfer {
    #[serde(default)]
    #[garde(skip)]
    pub operation_platform: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub operation_cmd_line: Option<String>,
    #[serde(default)]
    #[garde(dive)]
    pub readset: Vec<TransferReadset>,
}

impl Endpoint for Transfer {
    fn endpoint() -> String {
        format!("{PROJECT_ENDPOINT}/{{project}}/ingest_transfer")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransferReadset {
    #[garde(length(min = 1))]
    pub readset_name: String,
    #[serde(default)]
    #[garde(dive)]
    pub file: Vec<TransferFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransferFile {
    #[garde(pattern(r"^[^:/]+://"))]
    pub src_location_uri: String,
    #[garde(pattern(r"^[^:/]+://"))]
    pub dest_location_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Genpipes {
    #[serde(default)]
    #[garde(skip)]
    pub operation_platform: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub operation_cmd_line: Option<String>,
    #[garde(length(min = 1))]
    pub operation_config_name: String,
    #[garde(length(min = 1))]
    pub operation_config_version: String,
    #[serde(default)]
    #[garde(skip)]
    pub operation_config_md5sum: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub operation_config_data: Option<String>,
    #[serde(default)]
    #[garde(dive)]
    pub sample: Vec<GenpipesSample>,
}

impl Endpoint for Genpipes {
    fn endpoint() -> String {
        format!("{PROJECT_ENDPOINT}/{{project}}/ingest_genpipes")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenpipesSample {
    #[garde(length(min = 1))]
    pub sample_name: String,
    #[serde(default)]
    #[garde(dive)]
    pub readset: Vec<GenpipesReadset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenpipesReadset {
    #[garde(length(min = 1))]
    pub readset_name: String,
    #[serde(default)]
    #[garde(dive)]
    pub job: Vec<GenpipesJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenpipesJob {
    #[garde(length(min = 1))]
    pub job_name: String,
    #[serde(default)]
    #[garde(skip)]
    pub job_start: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub job_stop: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub job_status: Option<String>,
    #[serde(default)]
    #[garde(dive)]
    pub file: Vec<FilePayload>,
    #[serde(default)]
    #[garde(dive)]
    pub metric: Vec<MetricPayload>,
}
