use garde::Validate;
use serde::{Deserialize, Serialize};

use super::{
    Endpoint, PROJECT_ENDPOINT,
    entity::Id,
    vocabulary::{Aggregate, MetricFlag, NucleicAcidType},
};

/// References to specimens, samples and readsets, by name or id, plus the
/// nucleic-acid type and endpoint a digest is computed for.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DigestRequest {
    #[serde(default)]
    #[garde(inner(length(min = 1)))]
    pub specimen_name: Vec<String>,
    #[serde(default)]
    #[garde(skip)]
    pub specimen_id: Vec<Id>,
    #[serde(default)]
    #[garde(inner(length(min = 1)))]
    pub sample_name: Vec<String>,
    #[serde(default)]
    #[garde(skip)]
    pub sample_id: Vec<Id>,
    #[serde(default)]
    #[garde(inner(length(min = 1)))]
    pub readset_name: Vec<String>,
    #[serde(default)]
    #[garde(skip)]
    pub readset_id: Vec<Id>,
    #[serde(default)]
    #[garde(skip)]
    pub experiment_nucleic_acid_type: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub location_endpoint: Option<String>,
}

/// Which digest a [`DigestRequest`] is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DigestKind {
    ReadsetFile,
    PairFile,
    Delivery,
}

impl DigestKind {
    #[must_use]
    pub fn endpoint(self) -> String {
        format!("{PROJECT_ENDPOINT}/{{project}}/digest_{self}")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UnanalyzedRequest {
    #[serde(default)]
    #[garde(skip)]
    pub sample_name: bool,
    #[serde(default)]
    #[garde(skip)]
    pub sample_id: bool,
    #[serde(default)]
    #[garde(skip)]
    pub readset_name: bool,
    #[serde(default)]
    #[garde(skip)]
    pub readset_id: bool,
    #[serde(default)]
    #[garde(skip)]
    pub run_id: Option<Id>,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub run_name: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub experiment_nucleic_acid_type: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub location_endpoint: Option<String>,
}

impl Endpoint for UnanalyzedRequest {
    fn endpoint() -> String {
        format!("{PROJECT_ENDPOINT}/{{project}}/digest_unanalyzed")
    }
}

/// One line of a pipeline readset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReadsetFileRecord {
    pub sample: String,
    pub readset: String,
    pub library_type: Option<String>,
    pub run_type: Option<String>,
    pub run: Option<String>,
    pub lane: Option<String>,
    pub adapter1: Option<String>,
    pub adapter2: Option<String>,
    pub quality_offset: String,
    #[serde(rename = "BED")]
    pub bed: Option<String>,
    #[serde(rename = "FASTQ1")]
    pub fastq1: Option<String>,
    #[serde(rename = "FASTQ2")]
    pub fastq2: Option<String>,
    #[serde(rename = "BAM")]
    pub bam: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    #[serde(rename = "Specimen")]
    pub specimen: String,
    #[serde(rename = "Sample_N")]
    pub sample_n: Option<String>,
    #[serde(rename = "Sample_T")]
    pub sample_t: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnanalyzedSelection {
    SampleName(Vec<String>),
    SampleId(Vec<Id>),
    ReadsetName(Vec<String>),
    ReadsetId(Vec<Id>),
}

impl UnanalyzedSelection {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::SampleName(v) | Self::ReadsetName(v) => v.len(),
            Self::SampleId(v) | Self::ReadsetId(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnanalyzedOutput {
    pub location_endpoint: Option<String>,
    pub experiment_nucleic_acid_type: Option<NucleicAcidType>,
    #[serde(flatten)]
    pub selection: UnanalyzedSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutput {
    pub location_endpoint: String,
    pub experiment_nucleic_acid_type: NucleicAcidType,
    pub operation: Vec<DeliveryOperation>,
    pub specimen: Vec<DeliverySpecimen>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOperation {
    pub cmd_line: String,
    pub config_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySpecimen {
    pub name: String,
    pub cohort: Option<String>,
    pub institution: Option<String>,
    pub sample: Vec<DeliverySample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySample {
    pub name: String,
    pub tumour: bool,
    pub readset: Vec<DeliveryReadset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReadset {
    pub name: String,
    pub file: Vec<DeliveryFile>,
    pub metric: Vec<DeliveryMetric>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFile {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMetric {
    pub name: String,
    pub value: String,
    pub aggregate: Option<Aggregate>,
    pub flag: Option<MetricFlag>,
}
