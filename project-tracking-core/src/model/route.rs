use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{PROJECT_ENDPOINT, entity::Id};

#[must_use]
pub fn projects_endpoint() -> String {
    PROJECT_ENDPOINT.to_string()
}

#[must_use]
pub fn project_endpoint() -> String {
    format!("{PROJECT_ENDPOINT}/{{project}}")
}

#[must_use]
pub fn listing_endpoint(plural: &str) -> String {
    format!("{PROJECT_ENDPOINT}/{{project}}/{plural}")
}

#[must_use]
pub fn samples_pair_endpoint() -> String {
    format!("{PROJECT_ENDPOINT}/{{project}}/samples_pair")
}

pub const CREATE_PROJECT_ENDPOINT: &str = "/admin/create_project/{name}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingQuery {
    pub specimen_id: Option<Id>,
    pub sample_id: Option<Id>,
    pub readset_id: Option<Id>,
    pub operation_id: Option<Id>,
    pub job_id: Option<Id>,
    pub file_id: Option<Id>,
    pub metric_id: Option<Id>,
    pub tumour: Option<bool>,
    pub deliverable: Option<bool>,
    pub deprecated: bool,
    pub deleted: bool,
}

impl Display for ListingQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            specimen_id,
            sample_id,
            readset_id,
            operation_id,
            job_id,
            file_id,
            metric_id,
            tumour,
            deliverable,
            deprecated,
            deleted,
        } = self;

        let optional = [
            ("specimen_id", specimen_id.map(|v| v.to_string())),
            ("sample_id", sample_id.map(|v| v.to_string())),
            ("readset_id", readset_id.map(|v| v.to_string())),
            ("operation_id", operation_id.map(|v| v.to_string())),
            ("job_id", job_id.map(|v| v.to_string())),
            ("file_id", file_id.map(|v| v.to_string())),
            ("metric_id", metric_id.map(|v| v.to_string())),
            ("tumour", tumour.map(|v| v.to_string())),
            ("deliverable", deliverable.map(|v| v.to_string())),
        ];

        for (name, value) in optional {
            if let Some(value) = value {
                write!(f, "{name}={value}, ")?;
            }
        }

        write!(f, "deprecated={deprecated}, deleted={deleted}")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PairQuery {
    pub pair: bool,
    pub specimen_id: Option<Id>,
    pub deprecated: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProject {
    pub ext_id: Option<String>,
    pub ext_src: Option<String>,
}
