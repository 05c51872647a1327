use std::collections::HashSet;

use diesel::prelude::*;
use itertools::Itertools;
use project_tracking_core::model::{
    ActionOutput,
    digest::{
        DeliveryFile, DeliveryMetric, DeliveryOperation, DeliveryOutput, DeliveryReadset,
        DeliverySample, DeliverySpecimen, DigestRequest, PairRecord, ReadsetFileRecord,
        UnanalyzedOutput, UnanalyzedRequest, UnanalyzedSelection,
    },
    entity::{
        EntityKind, Experiment, File, Id, Location, Metric, Readset, Row, Run, Sample, Specimen,
    },
    vocabulary::{NucleicAcidType, QUALITY_OFFSET, RUN_PROCESSING, State, VocabularyEnum},
};
use project_tracking_schema::{
    experiment, file, job, job_file, location, metric, operation, operation_config, readset,
    readset_file, readset_metric, readset_operation, run,
};
use regex::RegexBuilder;

use super::{
    DieselExpressionBuilder, Transaction,
    error::{Error, Result},
    resolve::{readsets_in, select_readsets, select_samples},
};

const FASTQ_TYPES: [&str; 4] = ["fastq", "fq", "fq.gz", "fastq.gz"];

fn required_nucleic_acid_type(value: Option<&str>) -> Result<NucleicAcidType> {
    let value = value.ok_or_else(|| Error::missing_argument("experiment_nucleic_acid_type"))?;

    Ok(NucleicAcidType::parse_value(value)?)
}

fn required_endpoint(value: Option<&str>) -> Result<&str> {
    value.ok_or_else(|| Error::missing_argument("location_endpoint"))
}

impl Transaction<'_> {
    /// Live locations of a file.
    /// # Errors
    pub fn locations_of(&mut self, file_id: Id) -> Result<Vec<Row<Location>>> {
        self.load::<Location>(Box::new(
            location::file_id
                .eq(file_id)
                .and(location::deleted.eq(false)),
        ))
    }

    fn location_on(&mut self, file_id: Id, endpoint: &str) -> Result<Option<Row<Location>>> {
        Ok(self
            .locations_of(file_id)?
            .into_iter()
            .find(|location| location.endpoint == endpoint))
    }

    fn endpoint_list(&mut self, file_id: Id) -> Result<String> {
        Ok(format!(
            "[{}]",
            self.locations_of(file_id)?
                .iter()
                .map(|location| location.endpoint.as_str())
                .join(", ")
        ))
    }

    /// Live files of a readset produced by its `run_processing` operations.
    fn run_processing_files(&mut self, readset_id: Id) -> Result<Vec<Row<File>>> {
        let operations = readset_operation::table
            .filter(readset_operation::readset_id.eq(readset_id))
            .select(readset_operation::operation_id);
        let produced = job_file::table
            .inner_join(job::table.inner_join(operation::table))
            .filter(operation::name.eq(RUN_PROCESSING))
            .filter(operation::id.eq_any(operations))
            .select(job_file::file_id);
        let attached = readset_file::table
            .filter(readset_file::readset_id.eq(readset_id))
            .select(readset_file::file_id);

        self.load::<File>(Box::new(
            file::id
                .eq_any(produced)
                .and(file::id.eq_any(attached))
                .and(file::deleted.eq(false)),
        ))
    }
}

/// The pipeline readset file: one record per readset, with the paths of its
/// raw data on the requested endpoint.
/// # Errors
pub fn digest_readset_file(
    tx: &mut Transaction,
    project_id: Id,
    request: &DigestRequest,
) -> Result<ActionOutput<ReadsetFileRecord>> {
    let nucleic_acid_type =
        required_nucleic_acid_type(request.experiment_nucleic_acid_type.as_deref())?;
    let endpoint = required_endpoint(request.location_endpoint.as_deref())?;

    let mut output = ActionOutput::default();
    let readsets = select_readsets(tx, request, nucleic_acid_type, project_id, &mut output.warnings)?;

    for readset_id in readsets {
        let readset = tx.fetch::<Readset>(readset_id)?;
        let sample = tx.fetch::<Sample>(readset.sample_id)?;
        let experiment = tx.fetch::<Experiment>(readset.experiment_id)?;
        let run = tx.fetch::<Run>(readset.run_id)?;

        let mut record = ReadsetFileRecord {
            sample: sample.name.clone(),
            readset: readset.name.clone(),
            library_type: experiment.library_kit.clone(),
            run_type: readset.sequencing_type.map(|t| t.to_string()),
            run: run.name.clone(),
            lane: readset.lane.map(|l| l.to_string()),
            adapter1: readset.adapter1.clone(),
            adapter2: readset.adapter2.clone(),
            quality_offset: QUALITY_OFFSET.to_string(),
            bed: None,
            fastq1: None,
            fastq2: None,
            bam: None,
        };

        for file in tx.run_processing_files(readset_id)? {
            let file_type = file.file_type.as_deref().unwrap_or_default();

            let (slot, label) = if FASTQ_TYPES.contains(&file_type) {
                match file.metadata_str("read_type") {
                    Some("R1") => (&mut record.fastq1, "R1 fastq"),
                    Some("R2") => (&mut record.fastq2, "R2 fastq"),
                    _ => continue,
                }
            } else if file_type == "bam" {
                (&mut record.bam, "bam")
            } else {
                if file_type == "bed" {
                    record.bed = Some(file.name.clone());
                }
                continue;
            };

            match tx.location_on(file.id, endpoint)? {
                Some(location) => *slot = Some(location.path().to_string()),
                None => output.warn(format!(
                    "Looking for {label} 'File' for 'Sample' '{}' and 'Readset' '{}' in \
                     '{endpoint}', file only exists on {}.",
                    sample.name,
                    readset.name,
                    tx.endpoint_list(file.id)?
                )),
            }
        }

        output.push(record);
    }

    Ok(output)
}

/// The pipeline pair file: tumour and normal samples grouped by specimen.
/// # Errors
pub fn digest_pair_file(
    tx: &mut Transaction,
    project_id: Id,
    request: &DigestRequest,
    complete_only: bool,
) -> Result<ActionOutput<PairRecord>> {
    let nucleic_acid_type =
        required_nucleic_acid_type(request.experiment_nucleic_acid_type.as_deref())?;

    let mut output = ActionOutput::default();
    let samples = select_samples(tx, request, nucleic_acid_type, project_id, &mut output.warnings)?;

    let mut pairs: Vec<(Id, PairRecord)> = Vec::new();

    for sample_id in samples {
        let sample = tx.fetch::<Sample>(sample_id)?;
        let specimen = tx.fetch::<Specimen>(sample.specimen_id)?;

        let position = match pairs.iter().position(|(id, _)| *id == specimen.id) {
            Some(position) => position,
            None => {
                pairs.push((
                    specimen.id,
                    PairRecord {
                        specimen: specimen.name.clone(),
                        sample_n: None,
                        sample_t: None,
                    },
                ));
                pairs.len() - 1
            }
        };
        let record = &mut pairs[position].1;

        let (slot, label) = if sample.tumour {
            (&mut record.sample_t, "tumour")
        } else {
            (&mut record.sample_n, "normal")
        };

        if let Some(previous) = slot.replace(sample.name.clone()) {
            output.warn(format!(
                "'Specimen' with 'name' '{}' has more than one {label} 'Sample', '{}' replaces \
                 '{previous}'.",
                specimen.name, sample.name
            ));
        }
    }

    for (_, record) in pairs {
        if complete_only && (record.sample_n.is_none() || record.sample_t.is_none()) {
            output.warn(format!(
                "'Specimen' with 'name' '{}' has no tumour/normal pair. Skipping...",
                record.specimen
            ));
            continue;
        }

        output.push(record);
    }

    Ok(output)
}

/// Readsets of a project that no genpipes operation has processed yet.
/// # Errors
pub fn digest_unanalyzed(
    tx: &mut Transaction,
    project_id: Id,
    request: &UnanalyzedRequest,
) -> Result<ActionOutput<UnanalyzedOutput>> {
    let flags = [
        request.sample_name,
        request.sample_id,
        request.readset_name,
        request.readset_id,
    ];
    match flags.iter().filter(|flag| **flag).count() {
        0 => {
            return Err(Error::missing_argument(
                "sample_name, sample_id, readset_name or readset_id",
            ));
        }
        1 => (),
        _ => {
            return Err(Error::request(
                "Only one of 'sample_name', 'sample_id', 'readset_name' or 'readset_id' can be \
                 true.",
            ));
        }
    }

    let nucleic_acid_type = request
        .experiment_nucleic_acid_type
        .as_deref()
        .map(NucleicAcidType::parse_value)
        .transpose()?;

    let run_id = match (&request.run_id, &request.run_name) {
        (Some(id), _) => Some(tx.fetch::<Run>(*id)?.id),
        (None, Some(name)) => Some(
            tx.find::<Run>(Box::new(run::name.eq(name).assume_not_null()))?
                .ok_or_else(|| Error::did_not_find(EntityKind::Run, "name", name))?
                .id,
        ),
        (None, None) => None,
    };

    let genpipes = RegexBuilder::new("genpipes")
        .case_insensitive(true)
        .build()
        .map_err(Error::from_other_error)?;

    let analyzed: HashSet<Id> = readset_operation::table
        .inner_join(operation::table)
        .filter(readset_operation::readset_id.eq_any(readsets_in(project_id)))
        .select((readset_operation::readset_id, operation::name))
        .load::<(Id, String)>(tx.conn())?
        .into_iter()
        .filter(|(_, name)| genpipes.is_match(name))
        .map(|(readset, _)| readset)
        .collect();

    let filter = DieselExpressionBuilder::default()
        .and(readset::id.eq_any(readsets_in(project_id)))
        .and(readset::state.eq(State::Valid))
        .and(readset::deleted.eq(false))
        .and(readset::deprecated.eq(false))
        .and_if(run_id.map(|run| readset::run_id.eq(run)))
        .and_if(nucleic_acid_type.map(|t| {
            readset::experiment_id.eq_any(
                experiment::table
                    .filter(experiment::nucleic_acid_type.eq(t))
                    .select(experiment::id),
            )
        }))
        .build();

    let readsets: Vec<Row<Readset>> = tx
        .filtered::<Readset>(filter)?
        .into_iter()
        .filter(|readset| !analyzed.contains(&readset.id))
        .collect();

    let selection = if request.sample_name {
        let mut names = Vec::new();
        for sample_id in readsets.iter().map(|readset| readset.sample_id).unique() {
            names.push(tx.fetch::<Sample>(sample_id)?.data.name);
        }
        UnanalyzedSelection::SampleName(names)
    } else if request.sample_id {
        UnanalyzedSelection::SampleId(
            readsets
                .iter()
                .map(|readset| readset.sample_id)
                .unique()
                .collect(),
        )
    } else if request.readset_name {
        UnanalyzedSelection::ReadsetName(
            readsets
                .iter()
                .map(|readset| readset.name.clone())
                .unique()
                .collect(),
        )
    } else {
        UnanalyzedSelection::ReadsetId(readsets.iter().map(|readset| readset.id).collect())
    };

    Ok(ActionOutput::new(
        vec![UnanalyzedOutput {
            location_endpoint: request.location_endpoint.clone(),
            experiment_nucleic_acid_type: nucleic_acid_type,
            selection,
        }],
        Vec::new(),
    ))
}

/// Distinct `(command line, configuration)` pairs of the operations that
/// processed `readsets`, one per configuration.
fn delivery_operations(tx: &mut Transaction, readsets: &[Id]) -> Result<Vec<DeliveryOperation>> {
    let operations = readset_operation::table
        .filter(readset_operation::readset_id.eq_any(readsets.to_vec()))
        .select(readset_operation::operation_id);

    let rows: Vec<(Id, Option<String>, Option<String>)> = operation::table
        .inner_join(operation_config::table)
        .filter(operation::id.eq_any(operations))
        .order(operation::id)
        .select((
            operation_config::id,
            operation::cmd_line,
            operation_config::content,
        ))
        .load(tx.conn())?;

    Ok(rows
        .into_iter()
        .filter_map(|(config, cmd_line, content)| Some((config, cmd_line?, content?)))
        .unique_by(|(config, ..)| *config)
        .map(|(_, cmd_line, config_data)| DeliveryOperation {
            cmd_line,
            config_data,
        })
        .collect())
}

/// The delivery manifest: deliverable files and metrics of the selected
/// readsets nested under their samples and specimens.
/// # Errors
pub fn digest_delivery(
    tx: &mut Transaction,
    project_id: Id,
    request: &DigestRequest,
) -> Result<ActionOutput<DeliveryOutput>> {
    let nucleic_acid_type =
        required_nucleic_acid_type(request.experiment_nucleic_acid_type.as_deref())?;
    let endpoint = required_endpoint(request.location_endpoint.as_deref())?;

    let known_endpoint: bool = diesel::select(diesel::dsl::exists(
        location::table.filter(location::endpoint.eq(endpoint)),
    ))
    .get_result(tx.conn())?;
    if !known_endpoint {
        return Err(Error::did_not_find(
            EntityKind::Location,
            "endpoint",
            endpoint,
        ));
    }

    let mut warnings = Vec::new();
    let readsets = select_readsets(tx, request, nucleic_acid_type, project_id, &mut warnings)?;
    let operations = delivery_operations(tx, &readsets)?;

    let mut specimens: Vec<(Id, DeliverySpecimen)> = Vec::new();

    for readset_id in readsets {
        let readset = tx.fetch::<Readset>(readset_id)?;
        let sample = tx.fetch::<Sample>(readset.sample_id)?;
        let specimen = tx.fetch::<Specimen>(sample.specimen_id)?;

        let deliverable_files = tx.load::<File>(Box::new(
            file::id
                .eq_any(
                    readset_file::table
                        .filter(readset_file::readset_id.eq(readset_id))
                        .select(readset_file::file_id),
                )
                .and(file::deliverable.eq(true))
                .and(file::deleted.eq(false)),
        ))?;

        let mut files = Vec::new();
        for file in deliverable_files {
            match tx.location_on(file.id, endpoint)? {
                Some(location) => files.push(DeliveryFile {
                    name: file.name.clone(),
                    location: location.path().to_string(),
                }),
                None => warnings.push(format!(
                    "Looking for 'File' '{}' for 'Sample' '{}' and 'Readset' '{}' in \
                     '{endpoint}', file only exists on {}.",
                    file.name,
                    sample.name,
                    readset.name,
                    tx.endpoint_list(file.id)?
                )),
            }
        }

        if files.is_empty() {
            warnings.push(format!(
                "No deliverable files found for 'Sample' '{}' and 'Readset' '{}' on \
                 'LocationEndpoint' '{endpoint}'.",
                sample.name, readset.name
            ));
        }

        let metrics = tx
            .load::<Metric>(Box::new(
                metric::id
                    .eq_any(
                        readset_metric::table
                            .filter(readset_metric::readset_id.eq(readset_id))
                            .select(readset_metric::metric_id),
                    )
                    .and(metric::deliverable.eq(true))
                    .and(metric::deleted.eq(false)),
            ))?
            .into_iter()
            .map(|metric| DeliveryMetric {
                name: metric.name.clone(),
                value: metric.value.clone(),
                aggregate: metric.aggregate,
                flag: metric.flag,
            })
            .collect();

        let delivered = DeliveryReadset {
            name: readset.name.clone(),
            file: files,
            metric: metrics,
        };

        let position = match specimens.iter().position(|(id, _)| *id == specimen.id) {
            Some(position) => position,
            None => {
                specimens.push((
                    specimen.id,
                    DeliverySpecimen {
                        name: specimen.name.clone(),
                        cohort: specimen.cohort.clone(),
                        institution: specimen.institution.clone(),
                        sample: Vec::new(),
                    },
                ));
                specimens.len() - 1
            }
        };
        let specimen_entry = &mut specimens[position].1;

        match specimen_entry
            .sample
            .iter_mut()
            .find(|entry| entry.name == sample.name)
        {
            Some(entry) => entry.readset.push(delivered),
            None => specimen_entry.sample.push(DeliverySample {
                name: sample.name.clone(),
                tumour: sample.tumour,
                readset: vec![delivered],
            }),
        }
    }

    Ok(ActionOutput::new(
        vec![DeliveryOutput {
            location_endpoint: endpoint.to_string(),
            experiment_nucleic_acid_type: nucleic_acid_type,
            operation: operations,
            specimen: specimens.into_iter().map(|(_, entry)| entry).collect(),
        }],
        warnings,
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use project_tracking_core::model::{
        digest::{
            DeliveryOperation, DigestRequest, PairRecord, UnanalyzedRequest, UnanalyzedSelection,
        },
        entity::Run,
    };
    use rstest::rstest;

    use super::{digest_delivery, digest_pair_file, digest_readset_file, digest_unanalyzed};
    use crate::db::{
        Store,
        error::Error,
        ingest::Ingest,
        test_util::{genpipes_payload, project_id, store},
    };

    fn request(specimens: &[&str], readsets: &[&str], endpoint: Option<&str>) -> DigestRequest {
        let owned = |names: &[&str]| names.iter().map(ToString::to_string).collect();

        DigestRequest {
            specimen_name: owned(specimens),
            readset_name: owned(readsets),
            experiment_nucleic_acid_type: Some("DNA".to_string()),
            location_endpoint: endpoint.map(ToString::to_string),
            ..Default::default()
        }
    }

    #[rstest]
    fn readset_file_lists_ingested_paths(store: Store) {
        let project_id = project_id(&store);

        let output = store
            .read(|tx| digest_readset_file(tx, project_id, &request(&[], &["RS1"], Some("abacus"))))
            .unwrap();

        assert!(output.warnings.is_empty());
        let [record] = output.output.as_slice() else {
            panic!("expected one record, got {:?}", output.output);
        };
        assert_eq!(record.sample, "SA1");
        assert_eq!(record.run.as_deref(), Some("RUN1"));
        assert_eq!(record.lane.as_deref(), Some("1"));
        assert_eq!(record.run_type.as_deref(), Some("PAIRED_END"));
        assert_eq!(record.quality_offset, "33");
        assert_eq!(
            record.fastq1.as_deref(),
            Some("/lb/robot/RS1_R1.fastq.gz")
        );
        assert_eq!(
            record.fastq2.as_deref(),
            Some("/lb/robot/RS1_R2.fastq.gz")
        );
        assert_eq!(record.bam.as_deref(), Some("/lb/robot/RS1.bam"));
        assert_eq!(record.bed.as_deref(), Some("RS1.bed"));
    }

    #[rstest]
    fn readset_file_warns_about_other_endpoints(store: Store) {
        let project_id = project_id(&store);

        let output = store
            .read(|tx| digest_readset_file(tx, project_id, &request(&[], &["RS2"], Some("beluga"))))
            .unwrap();

        assert_eq!(output.output[0].fastq1, None);
        assert_eq!(
            output.warnings,
            ["Looking for R1 fastq 'File' for 'Sample' 'SA2' and 'Readset' 'RS2' in 'beluga', \
              file only exists on [abacus]."]
        );
    }

    #[rstest]
    fn readset_file_requires_nucleic_acid_type(store: Store) {
        let project_id = project_id(&store);
        let request = DigestRequest {
            readset_name: vec!["RS1".to_string()],
            location_endpoint: Some("abacus".to_string()),
            ..Default::default()
        };

        let result = store.read(|tx| digest_readset_file(tx, project_id, &request));

        assert_eq!(
            result.unwrap_err(),
            Error::missing_argument("experiment_nucleic_acid_type")
        );
    }

    #[rstest]
    #[case(false, vec![
        PairRecord { specimen: "SP1".to_string(), sample_n: Some("SA2".to_string()), sample_t: Some("SA1".to_string()) },
        PairRecord { specimen: "SP3".to_string(), sample_n: Some("SA4".to_string()), sample_t: None },
    ])]
    #[case(true, vec![
        PairRecord { specimen: "SP1".to_string(), sample_n: Some("SA2".to_string()), sample_t: Some("SA1".to_string()) },
    ])]
    fn pair_file_groups_by_specimen(
        store: Store,
        #[case] complete_only: bool,
        #[case] expected: Vec<PairRecord>,
    ) {
        let project_id = project_id(&store);

        let output = store
            .read(|tx| {
                digest_pair_file(
                    tx,
                    project_id,
                    &request(&["SP1", "SP3"], &[], None),
                    complete_only,
                )
            })
            .unwrap();

        assert_eq!(output.output, expected);
        assert_eq!(output.warnings.len(), usize::from(complete_only));
    }

    #[rstest]
    fn unanalyzed_lists_unprocessed_readsets(store: Store) {
        let project_id = project_id(&store);
        let request = UnanalyzedRequest {
            readset_name: true,
            experiment_nucleic_acid_type: Some("DNA".to_string()),
            ..Default::default()
        };

        let output = store
            .read(|tx| digest_unanalyzed(tx, project_id, &request))
            .unwrap();

        assert_eq!(
            output.output[0].selection,
            UnanalyzedSelection::ReadsetName(vec![
                "RS1".to_string(),
                "RS2".to_string(),
                "RS4".to_string()
            ])
        );
    }

    #[rstest]
    fn unanalyzed_on_an_empty_run_is_empty(store: Store) {
        let project_id = project_id(&store);
        store
            .transaction(|tx| {
                tx.insert(Run {
                    ext_id: None,
                    ext_src: None,
                    name: Some("EMPTY".to_string()),
                    instrument: None,
                    date: None,
                })
            })
            .unwrap();
        let request = UnanalyzedRequest {
            sample_id: true,
            run_name: Some("EMPTY".to_string()),
            ..Default::default()
        };

        let output = store
            .read(|tx| digest_unanalyzed(tx, project_id, &request))
            .unwrap();

        assert!(output.output[0].selection.is_empty());
    }

    #[rstest]
    #[case(UnanalyzedRequest::default())]
    #[case(UnanalyzedRequest { sample_name: true, readset_id: true, ..Default::default() })]
    fn unanalyzed_needs_exactly_one_key(store: Store, #[case] request: UnanalyzedRequest) {
        let project_id = project_id(&store);

        let result = store.read(|tx| digest_unanalyzed(tx, project_id, &request));

        assert!(matches!(result, Err(Error::Request { .. })));
    }

    #[rstest]
    fn unanalyzed_unknown_run_is_an_error(store: Store) {
        let project_id = project_id(&store);
        let request = UnanalyzedRequest {
            readset_id: true,
            run_name: Some("RUN9".to_string()),
            ..Default::default()
        };

        let result = store.read(|tx| digest_unanalyzed(tx, project_id, &request));

        assert_eq!(result, Err(Error::did_not_find("Run", "name", "RUN9")));
    }

    #[rstest]
    fn delivery_nests_deliverables(store: Store) {
        let project_id = project_id(&store);

        let output = store
            .read(|tx| digest_delivery(tx, project_id, &request(&["SP1"], &[], Some("abacus"))))
            .unwrap();

        let delivery = &output.output[0];
        assert_eq!(delivery.specimen.len(), 1);
        let specimen = &delivery.specimen[0];
        assert_eq!(specimen.name, "SP1");
        assert_eq!(specimen.cohort.as_deref(), Some("COHORT"));

        let names: Vec<_> = specimen.sample.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["SA1", "SA2"]);

        let rs1 = &specimen.sample[0].readset[0];
        let locations: Vec<_> = rs1.file.iter().map(|f| f.location.as_str()).collect();
        assert_eq!(
            locations,
            [
                "/lb/robot/RS1_R1.fastq.gz",
                "/lb/robot/RS1_R2.fastq.gz",
                "/lb/robot/RS1.bam"
            ]
        );
        assert_eq!(rs1.metric.len(), 1);
        assert_eq!(rs1.metric[0].value, "1000000");
        assert!(output.warnings.is_empty());
    }

    #[rstest]
    fn delivery_lists_the_configurations_that_processed_the_readsets(store: Store) {
        let project_id = project_id(&store);
        store
            .transaction(|tx| genpipes_payload().ingest(tx, project_id))
            .unwrap();

        let output = store
            .read(|tx| digest_delivery(tx, project_id, &request(&[], &["RS1"], Some("abacus"))))
            .unwrap();

        assert_eq!(
            output.output[0].operation,
            [DeliveryOperation {
                cmd_line: "genpipes dnaseq -c base.ini".to_string(),
                config_data: "[DEFAULT]".to_string(),
            }]
        );
        assert_eq!(
            output.warnings,
            ["Looking for 'File' 'RS1.trim.fastq.gz' for 'Sample' 'SA1' and 'Readset' 'RS1' in \
              'abacus', file only exists on [beluga]."]
        );
    }

    #[rstest]
    fn delivery_requires_a_known_endpoint(store: Store) {
        let project_id = project_id(&store);

        let result = store
            .read(|tx| digest_delivery(tx, project_id, &request(&["SP1"], &[], Some("mars"))));

        assert_eq!(
            result.unwrap_err(),
            Error::did_not_find("Location", "endpoint", "mars")
        );
    }
}
