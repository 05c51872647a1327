use std::ops::{Deref, DerefMut};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
#[cfg(feature = "backend")]
use diesel::prelude::*;
#[cfg(feature = "backend")]
use project_tracking_schema::{
    experiment, file, job, location, metric, operation, operation_config, project, readset, run,
    sample, specimen,
};
use serde::{Deserialize, Serialize};

use super::vocabulary::{
    Aggregate, Lane, MetricFlag, NucleicAcidType, SequencingType, State, Status,
};

pub type Id = i64;

/// Every table that can be named in a modification request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::VariantArray,
    strum::VariantNames,
)]
#[strum(ascii_case_insensitive)]
pub enum EntityKind {
    Project,
    Specimen,
    Sample,
    Experiment,
    Run,
    Readset,
    Operation,
    #[strum(to_string = "OperationConfig", serialize = "operation_config")]
    OperationConfig,
    Job,
    Metric,
    File,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SoftFlag {
    Deleted,
    Deprecated,
}

/// The two independent soft-state flags every row carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftState {
    pub deprecated: bool,
    pub deleted: bool,
}

impl SoftState {
    #[must_use]
    pub fn get(self, flag: SoftFlag) -> bool {
        match flag {
            SoftFlag::Deleted => self.deleted,
            SoftFlag::Deprecated => self.deprecated,
        }
    }

    pub fn set(&mut self, flag: SoftFlag, value: bool) {
        match flag {
            SoftFlag::Deleted => self.deleted = value,
            SoftFlag::Deprecated => self.deprecated = value,
        }
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        !self.deleted && !self.deprecated
    }
}

/// A stored entity: the shared bookkeeping columns plus the kind-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row<T> {
    pub id: Id,
    #[serde(flatten)]
    pub state: SoftState,
    pub creation: DateTime<Utc>,
    #[serde(default)]
    pub modification: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra_metadata: Option<serde_json::Value>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Deref for Row<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for Row<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<T> Row<T> {
    /// Looks up a string field of `extra_metadata`.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.extra_metadata.as_ref()?.get(key)?.as_str()
    }
}

pub trait Entity {
    const KIND: EntityKind;

    /// Column and value that must be unique among non-deleted rows.
    fn unique_key(&self) -> Option<(&'static str, &str)> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = project, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub ext_id: Option<String>,
    #[serde(default)]
    pub ext_src: Option<String>,
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn unique_key(&self) -> Option<(&'static str, &str)> {
        Some(("name", &self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = specimen, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Specimen {
    pub project_id: Id,
    pub name: String,
    #[serde(default)]
    pub cohort: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub ext_id: Option<String>,
    #[serde(default)]
    pub ext_src: Option<String>,
}

impl Entity for Specimen {
    const KIND: EntityKind = EntityKind::Specimen;

    fn unique_key(&self) -> Option<(&'static str, &str)> {
        Some(("name", &self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = sample, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Sample {
    pub specimen_id: Id,
    pub name: String,
    #[serde(default)]
    pub alias: Option<Aliases>,
    #[serde(default)]
    pub tumour: bool,
    #[serde(default)]
    pub ext_id: Option<String>,
    #[serde(default)]
    pub ext_src: Option<String>,
}

/// Alternative names of a sample, stored as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "backend", derive(diesel::expression::AsExpression, diesel::deserialize::FromSqlRow))]
#[cfg_attr(feature = "backend", diesel(sql_type = diesel::sql_types::Text))]
#[serde(transparent)]
pub struct Aliases(pub Vec<String>);

#[cfg(feature = "backend")]
impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::sqlite::Sqlite> for Aliases {
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, diesel::sqlite::Sqlite>,
    ) -> diesel::serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(diesel::serialize::IsNull::No)
    }
}

#[cfg(feature = "backend")]
impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::sqlite::Sqlite> for Aliases {
    fn from_sql(
        bytes: <diesel::sqlite::Sqlite as diesel::backend::Backend>::RawValue<'_>,
    ) -> diesel::deserialize::Result<Self> {
        let raw = <String as diesel::deserialize::FromSql<
            diesel::sql_types::Text,
            diesel::sqlite::Sqlite,
        >>::from_sql(bytes)?;

        Ok(Self(serde_json::from_str(&raw)?))
    }
}

impl Entity for Sample {
    const KIND: EntityKind = EntityKind::Sample;

    fn unique_key(&self) -> Option<(&'static str, &str)> {
        Some(("name", &self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = experiment, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Experiment {
    #[serde(default)]
    pub sequencing_technology: Option<String>,
    #[serde(rename = "type", default)]
    pub experiment_type: Option<String>,
    pub nucleic_acid_type: NucleicAcidType,
    #[serde(default)]
    pub library_kit: Option<String>,
    #[serde(default)]
    pub kit_expiration_date: Option<NaiveDate>,
}

impl Entity for Experiment {
    const KIND: EntityKind = EntityKind::Experiment;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = run, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Run {
    #[serde(default)]
    pub ext_id: Option<String>,
    #[serde(default)]
    pub ext_src: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
}

impl Entity for Run {
    const KIND: EntityKind = EntityKind::Run;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = readset, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Readset {
    pub sample_id: Id,
    pub experiment_id: Id,
    pub run_id: Id,
    pub name: String,
    #[serde(default)]
    pub lane: Option<Lane>,
    #[serde(default)]
    pub adapter1: Option<String>,
    #[serde(default)]
    pub adapter2: Option<String>,
    #[serde(default)]
    pub sequencing_type: Option<SequencingType>,
    #[serde(default)]
    pub quality_offset: Option<String>,
    #[serde(default)]
    pub state: State,
}

impl Entity for Readset {
    const KIND: EntityKind = EntityKind::Readset;

    fn unique_key(&self) -> Option<(&'static str, &str)> {
        Some(("name", &self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = operation, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Operation {
    pub project_id: Id,
    #[serde(default)]
    pub operation_config_id: Option<Id>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub cmd_line: Option<String>,
    pub name: String,
    pub status: Status,
}

impl Entity for Operation {
    const KIND: EntityKind = EntityKind::Operation;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = operation_config, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct OperationConfig {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub md5sum: Option<String>,
    #[serde(rename = "data", default)]
    pub content: Option<String>,
}

impl Entity for OperationConfig {
    const KIND: EntityKind = EntityKind::OperationConfig;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = job, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Job {
    pub operation_id: Id,
    pub name: String,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub stop: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,
}

impl Entity for Job {
    const KIND: EntityKind = EntityKind::Job;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = metric, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Metric {
    pub job_id: Id,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub flag: Option<MetricFlag>,
    #[serde(default)]
    pub deliverable: bool,
    #[serde(default)]
    pub aggregate: Option<Aggregate>,
}

impl Entity for Metric {
    const KIND: EntityKind = EntityKind::Metric;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = file, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct File {
    pub name: String,
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub md5sum: Option<String>,
    #[serde(default)]
    pub deliverable: bool,
    #[serde(default)]
    pub state: State,
}

impl Entity for File {
    const KIND: EntityKind = EntityKind::File;
}

impl File {
    /// Derives the file type from the suffix chain of `name`. When `.gz` is
    /// one of the suffixes the last two are kept, joined by a dot.
    #[must_use]
    pub fn type_from_name(name: &str) -> Option<String> {
        let base = name.rsplit('/').next().unwrap_or(name);
        let suffixes: Vec<&str> = base.split('.').skip(1).collect();

        if suffixes.contains(&"gz") && suffixes.len() >= 2 {
            return Some(suffixes[suffixes.len() - 2..].join("."));
        }

        suffixes.last().map(|s| (*s).to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    feature = "backend",
    derive(Queryable, Selectable, Insertable, AsChangeset),
    diesel(table_name = location, check_for_backend(diesel::sqlite::Sqlite), treat_none_as_null = true)
)]
pub struct Location {
    pub file_id: Id,
    pub uri: String,
    pub endpoint: String,
    #[serde(default)]
    pub deliverable: bool,
}

impl Entity for Location {
    const KIND: EntityKind = EntityKind::Location;

    fn unique_key(&self) -> Option<(&'static str, &str)> {
        Some(("uri", &self.uri))
    }
}

impl Location {
    #[must_use]
    pub fn new(file_id: Id, uri: &str) -> Self {
        Self {
            file_id,
            uri: uri.to_string(),
            endpoint: Self::endpoint_of(uri).to_string(),
            deliverable: false,
        }
    }

    /// The scheme token of `uri`.
    #[must_use]
    pub fn endpoint_of(uri: &str) -> &str {
        uri.split_once("://").map_or(uri, |(endpoint, _)| endpoint)
    }

    /// Everything after `://`, as handed to pipelines.
    #[must_use]
    pub fn path_of(uri: &str) -> &str {
        uri.split_once("://").map_or(uri, |(_, path)| path)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        Self::path_of(&self.uri)
    }
}
