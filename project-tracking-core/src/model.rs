use serde::{Deserialize, Serialize};

pub mod digest;
pub mod entity;
pub mod ingest;
pub mod modification;
pub mod route;
pub mod vocabulary;

pub trait Endpoint {
    fn endpoint() -> String;
}

const PROJECT_ENDPOINT: &str = "/project";

/// The envelope every action returns. Warnings are non-fatal and only
/// serialized when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutput<T> {
    #[serde(
        rename = "DB_ACTION_WARNING",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub warnings: Vec<String>,
    #[serde(rename = "DB_ACTION_OUTPUT")]
    pub output: Vec<T>,
}

impl<T> Default for ActionOutput<T> {
    fn default() -> Self {
        Self {
            warnings: Vec::new(),
            output: Vec::new(),
        }
    }
}

impl<T> ActionOutput<T> {
    #[must_use]
    pub fn new(output: Vec<T>, warnings: Vec<String>) -> Self {
        Self { warnings, output }
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn push(&mut self, item: T) {
        self.output.push(item);
    }
}
