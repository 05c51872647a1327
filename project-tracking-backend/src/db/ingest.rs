use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use itertools::Itertools;
use project_tracking_core::model::{
    ActionOutput,
    entity::{
        Aliases, EntityKind, Experiment, File, Id, Job, Location, Metric, Operation,
        OperationConfig, Readset, Row, Run, Sample, Specimen,
    },
    ingest::{
        FilePayload, Genpipes, MetricPayload, ReadsetPayload, RunProcessing, SpecimenPayload,
        Transfer, scalar_to_string,
    },
    vocabulary::{
        Aggregate, DATE_FMT, DATE_LONG_FMT, GENPIPES, Lane, MetricFlag, NucleicAcidType,
        RUN_PROCESSING, SequencingType, Status, TRANSFER, VocabularyEnum,
    },
};
use project_tracking_schema::{
    experiment, file, job, location, metric, operation, operation_config, readset, readset_file,
    readset_job, readset_metric, run, sample, specimen,
};
use serde_json::Value;

use super::{
    BoxedDieselExpression, Link, Stored, Transaction,
    error::{Error, Result},
    resolve::Scoped,
};

/// A pipeline payload that can be written into a project in one transaction.
/// The output is the operation recording the ingestion.
pub trait Ingest {
    /// # Errors
    fn ingest(&self, tx: &mut Transaction, project_id: Id) -> Result<ActionOutput<Value>>;
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_LONG_FMT).map_err(|_| {
        Error::request(format!(
            "'{value}' doesn't match the date format '{DATE_LONG_FMT}'"
        ))
    })
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FMT)
        .map_err(|_| Error::request(format!("'{value}' doesn't match the date format '{DATE_FMT}'")))
}

fn parse_optional<T>(value: Option<&str>, parse: impl Fn(&str) -> Result<T>) -> Result<Option<T>> {
    value.map(parse).transpose()
}

fn parse_vocabulary<T: VocabularyEnum>(value: Option<&str>) -> Result<Option<T>> {
    Ok(value.map(T::parse_value).transpose()?)
}

fn operation_output(tx: &mut Transaction, operation_id: Id) -> Result<Value> {
    tx.flat_json(EntityKind::Operation, operation_id)?
        .ok_or_else(|| Error::did_not_find(EntityKind::Operation, "id", operation_id))
}

impl Transaction<'_> {
    fn completed_job(&mut self, operation_id: Id, name: &str) -> Result<Id> {
        let now = self.now().naive_utc();

        self.insert(Job {
            operation_id,
            name: name.to_string(),
            start: Some(now),
            stop: Some(now),
            status: Some(Status::Completed),
            job_type: None,
        })
    }

    /// Reuses the first row matching `existing`, or inserts `data`.
    fn reuse_or_insert<T: Stored>(
        &mut self,
        existing: BoxedDieselExpression<'_, T::Table>,
        data: T,
    ) -> Result<Id> {
        match self.find::<T>(existing)? {
            Some(row) => Ok(row.id),
            None => self.insert(data),
        }
    }

    fn experiment_for(&mut self, data: Experiment) -> Result<Id> {
        let existing = experiment::deleted
            .eq(false)
            .and(experiment::sequencing_technology.is(data.sequencing_technology.clone()))
            .and(experiment::experiment_type.is(data.experiment_type.clone()))
            .and(experiment::nucleic_acid_type.eq(data.nucleic_acid_type))
            .and(experiment::library_kit.is(data.library_kit.clone()))
            .and(experiment::kit_expiration_date.is(data.kit_expiration_date));

        self.reuse_or_insert(Box::new(existing), data)
    }

    fn run_for(&mut self, data: Run) -> Result<Id> {
        let existing = run::deleted
            .eq(false)
            .and(run::ext_id.is(data.ext_id.clone()))
            .and(run::ext_src.is(data.ext_src.clone()))
            .and(run::name.is(data.name.clone()))
            .and(run::instrument.is(data.instrument.clone()))
            .and(run::date.is(data.date));

        self.reuse_or_insert(Box::new(existing), data)
    }

    fn live_location(&mut self, uri: &str) -> Result<Option<Row<Location>>> {
        self.find::<Location>(Box::new(
            location::uri.eq(uri).and(location::deleted.eq(false)),
        ))
    }

    /// Finds a live location by uri, or creates it for `file_id`. A uri
    /// already held by another file is a conflict.
    fn location_for(&mut self, file_id: Id, uri: &str, deliverable: bool) -> Result<Id> {
        if let Some(existing) = self.live_location(uri)? {
            if existing.file_id != file_id {
                return Err(Error::unique(EntityKind::Location, "uri", uri));
            }
            return Ok(existing.id);
        }

        self.insert(Location {
            deliverable,
            ..Location::new(file_id, uri)
        })
    }

    fn new_file(&mut self, payload: &FilePayload) -> Result<Id> {
        self.insert_with_metadata(
            File {
                name: payload.file_name.clone(),
                file_type: File::type_from_name(&payload.file_name),
                md5sum: None,
                deliverable: payload.file_deliverable,
                state: Default::default(),
            },
            payload.file_extra_metadata.clone(),
        )
    }

    fn refresh_file(&mut self, file_id: Id, payload: &FilePayload) -> Result<()> {
        self.update::<File>(file_id, |file| {
            file.deliverable = payload.file_deliverable;
            if payload.file_extra_metadata.is_some() {
                file.extra_metadata.clone_from(&payload.file_extra_metadata);
            }
        })
    }

    /// The file already stored at the payload's uri, refreshed from the
    /// payload. The uri must not be held under another file name.
    fn file_at(&mut self, payload: &FilePayload) -> Result<Option<Id>> {
        let Some(location) = self.live_location(&payload.location_uri)? else {
            return Ok(None);
        };

        let file = self.fetch::<File>(location.file_id)?;
        if file.name != payload.file_name {
            return Err(Error::unique(
                EntityKind::Location,
                "uri",
                &payload.location_uri,
            ));
        }

        self.refresh_file(file.id, payload)?;

        Ok(Some(file.id))
    }

    fn new_metric(&mut self, job_id: Id, payload: &MetricPayload) -> Result<Metric> {
        Ok(Metric {
            job_id,
            name: payload.metric_name.clone(),
            value: scalar_to_string(&payload.metric_value),
            flag: parse_vocabulary::<MetricFlag>(payload.metric_flag.as_deref())?,
            deliverable: payload.metric_deliverable,
            aggregate: parse_vocabulary::<Aggregate>(payload.metric_aggregate.as_deref())?,
        })
    }

    fn specimen_by_name(
        &mut self,
        project_id: Id,
        payload: &SpecimenPayload,
        output: &mut ActionOutput<Value>,
    ) -> Result<Id> {
        let name = &payload.specimen_name;

        let existing = self.find::<Specimen>(Box::new(
            specimen::name.eq(name).and(specimen::deleted.eq(false)),
        ))?;
        if let Some(existing) = existing {
            if existing.project_id != project_id {
                output.warn(format!(
                    "'Specimen' with 'name' '{name}' already exists in 'Project' with id '{}', \
                     it will be reused.",
                    existing.project_id
                ));
            }
            return Ok(existing.id);
        }

        self.insert(Specimen {
            project_id,
            name: name.clone(),
            cohort: payload.specimen_cohort.clone(),
            institution: payload.specimen_institution.clone(),
            ext_id: None,
            ext_src: None,
        })
    }

    fn ingest_readset(
        &mut self,
        sample_id: Id,
        run_id: Id,
        operation_id: Id,
        job_id: Id,
        payload: &ReadsetPayload,
    ) -> Result<()> {
        let experiment_id = self.experiment_for(Experiment {
            sequencing_technology: payload.experiment_sequencing_technology.clone(),
            experiment_type: payload.experiment_type.clone(),
            nucleic_acid_type: NucleicAcidType::parse_value(&payload.experiment_nucleic_acid_type)?,
            library_kit: payload.experiment_library_kit.clone(),
            kit_expiration_date: parse_optional(
                payload.experiment_kit_expiration_date.as_deref(),
                parse_date,
            )?,
        })?;

        let lane = payload.readset_lane.as_ref().map(scalar_to_string);
        let readset_id = self.insert(Readset {
            sample_id,
            experiment_id,
            run_id,
            name: payload.readset_name.clone(),
            lane: parse_vocabulary::<Lane>(lane.as_deref())?,
            adapter1: payload.readset_adapter1.clone(),
            adapter2: payload.readset_adapter2.clone(),
            sequencing_type: parse_vocabulary::<SequencingType>(
                payload.readset_sequencing_type.as_deref(),
            )?,
            quality_offset: payload.readset_quality_offset.as_ref().map(scalar_to_string),
            state: Default::default(),
        })?;

        self.link(Link::ReadsetOperation, readset_id, operation_id)?;
        self.link(Link::ReadsetJob, readset_id, job_id)?;

        for file in &payload.file {
            let file_id = match self.file_at(file)? {
                Some(file_id) => file_id,
                None => {
                    let file_id = self.new_file(file)?;
                    self.location_for(file_id, &file.location_uri, file.file_deliverable)?;
                    file_id
                }
            };

            self.link(Link::ReadsetFile, readset_id, file_id)?;
            self.link(Link::JobFile, job_id, file_id)?;
        }

        for metric in &payload.metric {
            let metric = self.new_metric(job_id, metric)?;
            let metric_id = self.insert(metric)?;
            self.link(Link::ReadsetMetric, readset_id, metric_id)?;
        }

        Ok(())
    }
}

impl Ingest for RunProcessing {
    fn ingest(&self, tx: &mut Transaction, project_id: Id) -> Result<ActionOutput<Value>> {
        let mut output = ActionOutput::default();

        let names: Vec<&str> = self.readset_names().collect();
        let existing: BTreeSet<String> = readset::table
            .filter(readset::deleted.eq(false))
            .filter(readset::name.eq_any(names.clone()))
            .select(readset::name)
            .load::<String>(tx.conn())?
            .into_iter()
            .collect();
        let offending: Vec<&str> = names
            .iter()
            .copied()
            .duplicates()
            .chain(names.iter().copied().filter(|name| existing.contains(*name)))
            .unique()
            .collect();
        if !offending.is_empty() {
            return Err(Error::unique(
                EntityKind::Readset,
                "name",
                offending.join(", "),
            ));
        }

        let operation_id = tx.insert(Operation {
            project_id,
            operation_config_id: None,
            platform: self.operation_platform.clone(),
            cmd_line: None,
            name: RUN_PROCESSING.to_string(),
            status: Status::Completed,
        })?;
        let job_id = tx.completed_job(operation_id, RUN_PROCESSING)?;

        let run_id = tx.run_for(Run {
            ext_id: self.run_ext_id.clone(),
            ext_src: self.run_ext_src.clone(),
            name: self.run_name.clone(),
            instrument: self.run_instrument.clone(),
            date: parse_optional(self.run_date.as_deref(), parse_datetime)?,
        })?;

        for specimen in &self.specimen {
            let specimen_id = tx.specimen_by_name(project_id, specimen, &mut output)?;

            for sample in &specimen.sample {
                let existing = tx.find::<Sample>(Box::new(
                    sample::name
                        .eq(&sample.sample_name)
                        .and(sample::deleted.eq(false)),
                ))?;
                let sample_id = match existing {
                    Some(existing) => {
                        if existing.specimen_id != specimen_id {
                            output.warn(format!(
                                "'Sample' with 'name' '{}' already exists under 'Specimen' with \
                                 id '{}', it will be reused.",
                                sample.sample_name, existing.specimen_id
                            ));
                        }
                        existing.id
                    }
                    None => tx.insert(Sample {
                        specimen_id,
                        name: sample.sample_name.clone(),
                        alias: sample.sample_alias.clone().map(Aliases),
                        tumour: sample.sample_tumour,
                        ext_id: None,
                        ext_src: None,
                    })?,
                };

                for readset in &sample.readset {
                    tx.ingest_readset(sample_id, run_id, operation_id, job_id, readset)?;
                }
            }
        }

        tracing::info!(operation_id, "ingested run processing");
        output.push(operation_output(tx, operation_id)?);

        Ok(output)
    }
}

/// The live row named `name` within a project.
fn live_in_project<T: Scoped>(tx: &mut Transaction, name: &str, project_id: Id) -> Result<Row<T>> {
    tx.load::<T>(T::named_in(name, project_id))?
        .into_iter()
        .find(|row| !row.state.deleted)
        .ok_or_else(|| Error::did_not_find(T::KIND, "name", name))
}

impl Ingest for Transfer {
    fn ingest(&self, tx: &mut Transaction, project_id: Id) -> Result<ActionOutput<Value>> {
        let operation_id = tx.insert(Operation {
            project_id,
            operation_config_id: None,
            platform: self.operation_platform.clone(),
            cmd_line: self.operation_cmd_line.clone(),
            name: TRANSFER.to_string(),
            status: Status::Completed,
        })?;
        let job_id = tx.completed_job(operation_id, TRANSFER)?;

        for readset in &self.readset {
            let readset_id =
                live_in_project::<Readset>(tx, &readset.readset_name, project_id)?.id;

            tx.link(Link::ReadsetOperation, readset_id, operation_id)?;
            tx.link(Link::ReadsetJob, readset_id, job_id)?;

            for file in &readset.file {
                let source = tx.find::<Location>(Box::new(
                    location::uri
                        .eq(&file.src_location_uri)
                        .and(location::deleted.eq(false))
                        .and(
                            location::file_id.eq_any(
                                readset_file::table
                                    .filter(readset_file::readset_id.eq(readset_id))
                                    .select(readset_file::file_id),
                            ),
                        ),
                ))?;
                let file_id = source
                    .ok_or_else(|| Error::DidNotFind {
                        message: format!(
                            "No 'File' with 'uri' '{}' and 'Readset' with 'name' '{}'",
                            file.src_location_uri, readset.readset_name
                        ),
                    })?
                    .file_id;

                tx.location_for(file_id, &file.dest_location_uri, false)?;
                tx.link(Link::JobFile, job_id, file_id)?;
            }
        }

        tracing::info!(operation_id, "ingested transfer");

        Ok(ActionOutput::new(
            vec![operation_output(tx, operation_id)?],
            Vec::new(),
        ))
    }
}

impl Ingest for Genpipes {
    fn ingest(&self, tx: &mut Transaction, project_id: Id) -> Result<ActionOutput<Value>> {
        if self.sample.is_empty() {
            return Err(Error::request(
                "No 'Sample' found, this json won't be ingested.",
            ));
        }

        let mut output = ActionOutput::default();

        let config_id = tx.config_for(self)?;

        let existing = tx.find::<Operation>(Box::new(
            operation::deleted
                .eq(false)
                .and(operation::project_id.eq(project_id))
                .and(operation::operation_config_id.eq(config_id).assume_not_null())
                .and(operation::platform.is(self.operation_platform.clone()))
                .and(operation::cmd_line.is(self.operation_cmd_line.clone()))
                .and(operation::name.eq(GENPIPES)),
        ))?;
        let operation_id = match existing {
            Some(existing) => {
                output.warn(format!(
                    "Operation with id {} already exists, informations will be attached to \
                     this one.",
                    existing.id
                ));
                existing.id
            }
            None => tx.insert(Operation {
                project_id,
                operation_config_id: Some(config_id),
                platform: self.operation_platform.clone(),
                cmd_line: self.operation_cmd_line.clone(),
                name: GENPIPES.to_string(),
                status: Status::Completed,
            })?,
        };

        let mut ingested_jobs = 0;

        for sample in &self.sample {
            let sample_id = live_in_project::<Sample>(tx, &sample.sample_name, project_id)?.id;

            for readset in &sample.readset {
                let found = tx
                    .find::<Readset>(Box::new(
                        readset::name
                            .eq(&readset.readset_name)
                            .and(readset::deleted.eq(false)),
                    ))?
                    .ok_or_else(|| {
                        Error::did_not_find(EntityKind::Readset, "name", &readset.readset_name)
                    })?;
                if found.sample_id != sample_id {
                    return Err(Error::DidNotFind {
                        message: format!(
                            "'Sample' with 'name' '{}' not linked with 'Readset' with 'name' '{}'",
                            sample.sample_name, readset.readset_name
                        ),
                    });
                }
                let readset_id = found.id;

                tx.link(Link::ReadsetOperation, readset_id, operation_id)?;

                for job in &readset.job {
                    let Some(status) = job.job_status.as_deref() else {
                        output.warn(format!(
                            "'Readset' with 'name' '{}' has 'Job' with 'name' '{}' with no \
                             status, skipping.",
                            readset.readset_name, job.job_name
                        ));
                        continue;
                    };
                    let status = Status::parse_value(status)?;
                    let start = parse_optional(job.job_start.as_deref(), parse_datetime)?;
                    let stop = parse_optional(job.job_stop.as_deref(), parse_datetime)?;

                    let existing = tx.find::<Job>(Box::new(
                        job::deleted
                            .eq(false)
                            .and(job::operation_id.eq(operation_id))
                            .and(job::name.eq(&job.job_name))
                            .and(job::start.is(start))
                            .and(
                                job::id.eq_any(
                                    readset_job::table
                                        .filter(readset_job::readset_id.eq(readset_id))
                                        .select(readset_job::job_id),
                                ),
                            ),
                    ))?;
                    let job_id = match existing {
                        Some(existing) => {
                            tx.update::<Job>(existing.id, |j| {
                                j.stop = stop;
                                j.status = Some(status);
                            })?;
                            existing.id
                        }
                        None => {
                            let job_id = tx.insert(Job {
                                operation_id,
                                name: job.job_name.clone(),
                                start,
                                stop,
                                status: Some(status),
                                job_type: None,
                            })?;
                            tx.link(Link::ReadsetJob, readset_id, job_id)?;
                            job_id
                        }
                    };
                    ingested_jobs += 1;

                    for file in &job.file {
                        tx.upsert_file(readset_id, job_id, file)?;
                    }

                    for metric in &job.metric {
                        tx.upsert_metric(readset_id, job_id, &readset.readset_name, metric, &mut output)?;
                    }
                }
            }
        }

        if ingested_jobs == 0 {
            return Err(Error::request(
                "No 'Job' has a status, this json won't be ingested.",
            ));
        }

        tracing::info!(operation_id, ingested_jobs, "ingested genpipes");
        output.push(operation_output(tx, operation_id)?);

        Ok(output)
    }
}

impl Transaction<'_> {
    fn config_for(&mut self, payload: &Genpipes) -> Result<Id> {
        let existing = operation_config::deleted
            .eq(false)
            .and(operation_config::name.eq(payload.operation_config_name.clone()))
            .and(operation_config::version.eq(payload.operation_config_version.clone()))
            .and(operation_config::md5sum.is(payload.operation_config_md5sum.clone()));

        self.reuse_or_insert(
            Box::new(existing),
            OperationConfig {
                name: payload.operation_config_name.clone(),
                version: payload.operation_config_version.clone(),
                md5sum: payload.operation_config_md5sum.clone(),
                content: payload.operation_config_data.clone(),
            },
        )
    }

    /// Updates the readset's file of the same name, or creates it.
    fn upsert_file(&mut self, readset_id: Id, job_id: Id, payload: &FilePayload) -> Result<()> {
        let existing = self.find::<File>(Box::new(
            file::name
                .eq(&payload.file_name)
                .and(file::deleted.eq(false))
                .and(
                    file::id.eq_any(
                        readset_file::table
                            .filter(readset_file::readset_id.eq(readset_id))
                            .select(readset_file::file_id),
                    ),
                ),
        ))?;

        let file_id = match existing {
            Some(existing) => {
                self.refresh_file(existing.id, payload)?;
                existing.id
            }
            None => {
                let file_id = self.new_file(payload)?;
                self.link(Link::ReadsetFile, readset_id, file_id)?;
                file_id
            }
        };

        self.location_for(file_id, &payload.location_uri, payload.file_deliverable)?;
        self.link(Link::JobFile, job_id, file_id)?;

        Ok(())
    }

    /// Updates the readset's metric of the same name, or creates it.
    fn upsert_metric(
        &mut self,
        readset_id: Id,
        job_id: Id,
        readset_name: &str,
        payload: &MetricPayload,
        output: &mut ActionOutput<Value>,
    ) -> Result<()> {
        let metric = self.new_metric(job_id, payload)?;

        let existing = self.find::<Metric>(Box::new(
            metric::name
                .eq(metric.name.clone())
                .and(metric::deleted.eq(false))
                .and(
                    metric::id.eq_any(
                        readset_metric::table
                            .filter(readset_metric::readset_id.eq(readset_id))
                            .select(readset_metric::metric_id),
                    ),
                ),
        ))?;

        match existing {
            Some(existing) => {
                if existing.value != metric.value {
                    output.warn(format!(
                        "'Metric' with 'name' '{}' for 'Readset' '{readset_name}' changes value \
                         from '{}' to '{}'.",
                        metric.name, existing.value, metric.value
                    ));
                }
                self.update::<Metric>(existing.id, |row| row.data = metric)?;
            }
            None => {
                let metric_id = self.insert(metric)?;
                self.link(Link::ReadsetMetric, readset_id, metric_id)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;
    use pretty_assertions::assert_eq;
    use project_tracking_core::model::{
        entity::{
            Experiment, File, Id, Job, Location, Metric, Operation, Readset, Run, Sample,
            Specimen,
        },
        ingest::{RunProcessing, Transfer},
    };
    use project_tracking_schema::{file, job, location, metric, readset_file};
    use rstest::rstest;
    use serde_json::json;

    use super::Ingest;
    use crate::db::{
        Link, Store, Stored,
        error::Error,
        test_util::{genpipes_payload, id_by_name, project_id, run_processing_payload, store},
    };

    fn count<T: Stored>(store: &Store) -> usize {
        store.read(|tx| Ok(tx.rows::<T>()?.len())).unwrap()
    }

    fn file_named(store: &Store, name: &str) -> Id {
        store
            .read(|tx| Ok(tx.find::<File>(Box::new(file::name.eq(name)))?.unwrap().id))
            .unwrap()
    }

    /// A second run adding readset `RS5` with one file stored at the uri of
    /// `RS1.bam`.
    fn reusing_rs1_bam(file_name: &str) -> RunProcessing {
        serde_json::from_value(json!({
            "run_name": "RUN2",
            "specimen": [{
                "specimen_name": "SP1",
                "sample": [{
                    "sample_name": "SA5",
                    "readset": [{
                        "experiment_nucleic_acid_type": "DNA",
                        "readset_name": "RS5",
                        "file": [{
                            "location_uri": "abacus:///lb/robot/RS1.bam",
                            "file_name": file_name,
                            "file_extra_metadata": {"origin": "RUN2"}
                        }]
                    }]
                }]
            }]
        }))
        .unwrap()
    }

    #[rstest]
    fn run_processing_builds_the_hierarchy(store: Store) {
        assert_eq!(count::<Specimen>(&store), 3);
        assert_eq!(count::<Sample>(&store), 4);
        assert_eq!(count::<Readset>(&store), 4);
        assert_eq!(count::<Run>(&store), 1);
        assert_eq!(count::<Experiment>(&store), 2);
        assert_eq!(count::<File>(&store), 5);
        assert_eq!(count::<Location>(&store), 5);
        assert_eq!(count::<Metric>(&store), 1);

        store
            .read(|tx| {
                let bam = tx.find::<File>(Box::new(file::name.eq("RS1.bam")))?.unwrap();
                assert_eq!(bam.file_type.as_deref(), Some("bam"));
                let location = tx
                    .find::<Location>(Box::new(location::file_id.eq(bam.id)))?
                    .unwrap();
                assert_eq!(location.endpoint, "abacus");
                Ok(())
            })
            .unwrap();
    }

    #[rstest]
    fn duplicate_readsets_are_listed_and_rolled_back(store: Store) {
        let project_id = project_id(&store);
        let payload: RunProcessing = serde_json::from_value(run_processing_payload()).unwrap();

        let result = store.transaction(|tx| payload.ingest(tx, project_id));

        assert_eq!(
            result.unwrap_err(),
            Error::unique("Readset", "name", "RS1, RS2, RS3, RS4")
        );
        assert_eq!(count::<Operation>(&store), 1);
    }

    #[rstest]
    fn known_uri_under_its_own_name_reuses_the_file(store: Store) {
        let project_id = project_id(&store);

        store
            .transaction(|tx| reusing_rs1_bam("RS1.bam").ingest(tx, project_id))
            .unwrap();

        assert_eq!(count::<File>(&store), 5);
        assert_eq!(count::<Location>(&store), 5);
        let bam = file_named(&store, "RS1.bam");
        let rs5 = id_by_name::<Readset>(&store, "RS5");
        store
            .read(|tx| {
                assert!(tx.linked(Link::ReadsetFile, rs5, bam)?);
                let bam = tx.fetch::<File>(bam)?;
                assert_eq!(bam.metadata_str("origin"), Some("RUN2"));
                assert!(!bam.deliverable);
                Ok(())
            })
            .unwrap();
    }

    #[rstest]
    fn known_uri_under_another_name_is_a_conflict(store: Store) {
        let project_id = project_id(&store);

        let result = store.transaction(|tx| reusing_rs1_bam("other.bam").ingest(tx, project_id));

        assert_eq!(
            result.unwrap_err(),
            Error::unique("Location", "uri", "abacus:///lb/robot/RS1.bam")
        );
        assert_eq!(count::<Readset>(&store), 4);
        assert_eq!(count::<File>(&store), 5);
    }

    #[rstest]
    fn genpipes_is_idempotent(store: Store) {
        let project_id = project_id(&store);
        let payload = genpipes_payload();

        let first = store
            .transaction(|tx| payload.ingest(tx, project_id))
            .unwrap();
        assert_eq!(
            first.warnings,
            ["'Readset' with 'name' 'RS1' has 'Job' with 'name' 'gatk.RS1' with no status, \
              skipping."]
        );

        let counts = |store: &Store| {
            let links = store
                .read(|tx| Ok(readset_file::table.count().get_result::<i64>(tx.conn())?))
                .unwrap();

            (
                count::<Operation>(store),
                count::<Job>(store),
                count::<File>(store),
                count::<Metric>(store),
                links,
            )
        };
        let after_first = counts(&store);

        let second = store
            .transaction(|tx| payload.ingest(tx, project_id))
            .unwrap();
        assert_eq!(counts(&store), after_first);
        assert_eq!(
            second.warnings[0],
            format!(
                "Operation with id {} already exists, informations will be attached to this one.",
                first.output[0]["id"]
            )
        );
    }

    #[rstest]
    fn genpipes_marks_readsets_as_analyzed(store: Store) {
        let project_id = project_id(&store);
        let rs1 = id_by_name::<Readset>(&store, "RS1");

        store
            .transaction(|tx| genpipes_payload().ingest(tx, project_id))
            .unwrap();

        store
            .read(|tx| {
                let mut operations = Vec::new();
                for id in tx.rights_of(Link::ReadsetOperation, rs1)? {
                    operations.push(tx.fetch::<Operation>(id)?.data.name);
                }
                assert_eq!(operations, ["run_processing", "genpipes"]);

                let job = tx
                    .find::<Job>(Box::new(job::name.eq("trimmomatic.RS1")))?
                    .unwrap();
                let metric = tx
                    .find::<Metric>(Box::new(metric::name.eq("trimmed_reads")))?
                    .unwrap();
                assert_eq!(metric.job_id, job.id);
                Ok(())
            })
            .unwrap();
    }

    #[rstest]
    fn genpipes_without_any_status_is_rejected(store: Store) {
        let project_id = project_id(&store);
        let mut payload = genpipes_payload();
        for job in &mut payload.sample[0].readset[0].job {
            job.job_status = None;
        }

        let result = store.transaction(|tx| payload.ingest(tx, project_id));

        assert_eq!(
            result.unwrap_err(),
            Error::request("No 'Job' has a status, this json won't be ingested.")
        );
    }

    #[rstest]
    fn genpipes_rejects_unlinked_readset(store: Store) {
        let project_id = project_id(&store);
        let mut payload = genpipes_payload();
        payload.sample[0].readset[0].readset_name = "RS2".to_string();

        let result = store.transaction(|tx| payload.ingest(tx, project_id));

        assert!(matches!(result, Err(Error::DidNotFind { .. })));
    }

    #[rstest]
    fn transfer_adds_a_destination(store: Store) {
        let project_id = project_id(&store);
        let transfer: Transfer = serde_json::from_value(json!({
            "operation_platform": "beluga",
            "operation_cmd_line": "globus transfer",
            "readset": [{
                "readset_name": "RS1",
                "file": [{
                    "src_location_uri": "abacus:///lb/robot/RS1.bam",
                    "dest_location_uri": "beluga:///project/RS1.bam"
                }]
            }]
        }))
        .unwrap();

        store
            .transaction(|tx| transfer.ingest(tx, project_id))
            .unwrap();

        let bam = file_named(&store, "RS1.bam");
        store
            .read(|tx| {
                let endpoints: Vec<_> = tx
                    .locations_of(bam)?
                    .into_iter()
                    .map(|l| l.data.endpoint)
                    .collect();
                assert_eq!(endpoints, ["abacus", "beluga"]);
                Ok(())
            })
            .unwrap();

        // the same transfer again is a no-op on locations
        store
            .transaction(|tx| transfer.ingest(tx, project_id))
            .unwrap();
        assert_eq!(count::<Location>(&store), 6);
    }

    #[rstest]
    fn transfer_of_unknown_file_is_an_error(store: Store) {
        let project_id = project_id(&store);
        let transfer: Transfer = serde_json::from_value(json!({
            "readset": [{
                "readset_name": "RS2",
                "file": [{
                    "src_location_uri": "abacus:///lb/robot/RS1.bam",
                    "dest_location_uri": "beluga:///project/RS1.bam"
                }]
            }]
        }))
        .unwrap();

        let result = store.transaction(|tx| transfer.ingest(tx, project_id));

        assert_eq!(
            result.unwrap_err(),
            Error::DidNotFind {
                message: "No 'File' with 'uri' 'abacus:///lb/robot/RS1.bam' and 'Readset' with \
                          'name' 'RS2'"
                    .to_string()
            }
        );
    }
}
