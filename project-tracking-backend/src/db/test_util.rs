use diesel::prelude::*;
use project_tracking_core::model::{
    entity::{Id, Project},
    ingest::{Genpipes, RunProcessing},
    route::NewProject,
};
use project_tracking_schema::project;
use rstest::fixture;
use serde_json::{Value, json};

use super::{Store, Stored, ingest::Ingest, route::create_project};

pub const PROJECT: &str = "TEST";

pub fn run_processing_payload() -> Value {
    let fastq = |readset: &str, read: &str| {
        json!({
            "location_uri": format!("abacus:///lb/robot/{readset}_{read}.fastq.gz"),
            "file_name": format!("{readset}_{read}.fastq.gz"),
            "file_extra_metadata": {"read_type": read},
            "file_deliverable": true
        })
    };
    let readset = |name: &str, nucleic_acid_type: &str, files: Vec<Value>, metrics: Vec<Value>| {
        json!({
            "experiment_sequencing_technology": "ILLUMINA",
            "experiment_type": "PCR-FREE",
            "experiment_nucleic_acid_type": nucleic_acid_type,
            "experiment_library_kit": "KAPA",
            "experiment_kit_expiration_date": "2025-06-30",
            "readset_name": name,
            "readset_lane": 1,
            "readset_adapter1": "AGATCGGAAG",
            "readset_adapter2": "AGATCGGAAG",
            "readset_sequencing_type": "PAIRED_END",
            "readset_quality_offset": 33,
            "file": files,
            "metric": metrics
        })
    };

    json!({
        "project_name": PROJECT,
        "operation_platform": "abacus",
        "run_ext_id": "R-0001",
        "run_ext_src": "lims",
        "run_name": "RUN1",
        "run_instrument": "NovaSeq",
        "run_date": "2024-01-02 03:04:05",
        "specimen": [
            {
                "specimen_name": "SP1",
                "specimen_cohort": "COHORT",
                "specimen_institution": "MUHC",
                "sample": [
                    {
                        "sample_name": "SA1",
                        "sample_tumour": true,
                        "readset": [readset(
                            "RS1",
                            "DNA",
                            vec![
                                fastq("RS1", "R1"),
                                fastq("RS1", "R2"),
                                json!({
                                    "location_uri": "abacus:///lb/robot/RS1.bam",
                                    "file_name": "RS1.bam",
                                    "file_deliverable": true
                                }),
                                json!({
                                    "location_uri": "abacus:///lb/robot/RS1.bed",
                                    "file_name": "RS1.bed"
                                })
                            ],
                            vec![json!({
                                "metric_name": "raw_reads_count",
                                "metric_value": 1_000_000,
                                "metric_flag": "PASS",
                                "metric_deliverable": true
                            })]
                        )]
                    },
                    {
                        "sample_name": "SA2",
                        "sample_tumour": false,
                        "readset": [readset("RS2", "DNA", vec![fastq("RS2", "R1")], vec![])]
                    }
                ]
            },
            {
                "specimen_name": "SP2",
                "sample": [{
                    "sample_name": "SA3",
                    "sample_tumour": true,
                    "readset": [readset("RS3", "RNA", vec![], vec![])]
                }]
            },
            {
                "specimen_name": "SP3",
                "sample": [{
                    "sample_name": "SA4",
                    "sample_tumour": false,
                    "readset": [readset("RS4", "DNA", vec![], vec![])]
                }]
            }
        ]
    })
}

pub fn genpipes_payload() -> Genpipes {
    serde_json::from_value(json!({
        "operation_platform": "beluga",
        "operation_cmd_line": "genpipes dnaseq -c base.ini",
        "operation_config_name": "dnaseq",
        "operation_config_version": "5.0.0",
        "operation_config_md5sum": "abc123",
        "operation_config_data": "[DEFAULT]",
        "sample": [{
            "sample_name": "SA1",
            "readset": [{
                "readset_name": "RS1",
                "job": [
                    {
                        "job_name": "trimmomatic.RS1",
                        "job_start": "2024-02-01 10:00:00",
                        "job_stop": "2024-02-01 11:00:00",
                        "job_status": "COMPLETED",
                        "file": [{
                            "location_uri": "beluga:///scratch/RS1.trim.fastq.gz",
                            "file_name": "RS1.trim.fastq.gz",
                            "file_deliverable": true
                        }],
                        "metric": [{
                            "metric_name": "trimmed_reads",
                            "metric_value": 900_000,
                            "metric_deliverable": true
                        }]
                    },
                    {
                        "job_name": "gatk.RS1",
                        "job_start": "2024-02-01 12:00:00",
                        "job_status": null
                    }
                ]
            }]
        }]
    }))
    .unwrap()
}

#[fixture]
pub fn store() -> Store {
    let store = Store::in_memory().unwrap();
    let payload: RunProcessing = serde_json::from_value(run_processing_payload()).unwrap();

    store
        .transaction(|tx| {
            let project = create_project(tx, PROJECT, &NewProject::default())?;
            let project_id = project.output[0].id;
            payload.ingest(tx, project_id)
        })
        .unwrap();

    store
}

pub fn project_id(store: &Store) -> Id {
    store
        .read(|tx| {
            Ok(tx
                .find::<Project>(Box::new(project::name.eq(PROJECT)))?
                .unwrap()
                .id)
        })
        .unwrap()
}

/// The id of the first row of `T` whose `name` column is `name`.
pub fn id_by_name<T: Stored>(store: &Store, name: &str) -> Id {
    store
        .read(|tx| {
            Ok(tx
                .rows::<T>()?
                .into_iter()
                .find(|row| serde_json::to_value(&row.data).unwrap()["name"] == name)
                .unwrap()
                .id)
        })
        .unwrap()
}
