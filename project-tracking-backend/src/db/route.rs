use std::collections::BTreeMap;

use diesel::prelude::*;
use project_tracking_core::model::{
    ActionOutput,
    entity::{File, Id, Job, Metric, Operation, Project, Readset, Row, Sample, Specimen},
    route::{ListingQuery, NewProject, PairQuery},
    vocabulary::NucleicAcidType,
};
use project_tracking_schema::{
    file, job, job_file, metric, operation, project, readset, readset_file, readset_job,
    readset_metric, readset_operation, sample, specimen,
};
use serde_json::Value;

use super::{
    BoxedDieselExpression, DieselExpressionBuilder, Stored, Transaction,
    error::{Error, Result},
    resolve::{readsets_in, samples_in, specimens_in},
};

fn live_projects(tx: &mut Transaction) -> Result<Vec<Row<Project>>> {
    tx.load::<Project>(Box::new(project::deleted.eq(false)))
}

/// Resolves the `{project}` path segment: digits are an id, anything else a
/// name matched case-insensitively.
/// # Errors
pub fn project_id(tx: &mut Transaction, project: &str) -> Result<Id> {
    let found = match project.parse::<Id>() {
        Ok(id) => tx.find::<Project>(Box::new(
            project::id.eq(id).and(project::deleted.eq(false)),
        ))?,
        Err(_) => tx.find::<Project>(Box::new(
            project::name
                .eq(project.to_uppercase())
                .and(project::deleted.eq(false)),
        ))?,
    };

    match found {
        Some(found) => Ok(found.id),
        None => Err(Error::ProjectNotFound {
            project: project.to_string(),
            available: live_projects(tx)?
                .iter()
                .map(|p| format!("id: {}, name: {}", p.id, p.name))
                .collect(),
        }),
    }
}

/// Creates a project, or returns the live one of the same name.
/// # Errors
pub fn create_project(
    tx: &mut Transaction,
    name: &str,
    new: &NewProject,
) -> Result<ActionOutput<Row<Project>>> {
    let name = name.to_uppercase();
    let mut output = ActionOutput::default();

    let existing = tx.find::<Project>(Box::new(
        project::name.eq(name.clone()).and(project::deleted.eq(false)),
    ))?;
    let id = match existing {
        Some(existing) => {
            output.warn(format!("Project '{name}' already exists."));
            existing.id
        }
        None => {
            tracing::info!(project = %name, "creating project");
            tx.insert(Project {
                name,
                ext_id: new.ext_id.clone(),
                ext_src: new.ext_src.clone(),
            })?
        }
    };

    output.push(tx.fetch::<Project>(id)?);

    Ok(output)
}

/// # Errors
pub fn projects(tx: &mut Transaction) -> Result<ActionOutput<Row<Project>>> {
    Ok(ActionOutput::new(live_projects(tx)?, Vec::new()))
}

/// # Errors
pub fn project(tx: &mut Transaction, project_id: Id) -> Result<ActionOutput<Row<Project>>> {
    Ok(ActionOutput::new(
        vec![tx.fetch::<Project>(project_id)?],
        Vec::new(),
    ))
}

/// A row type listed under `/project/{project}/<plural>`.
pub trait Listing: Stored {
    const PLURAL: &'static str;

    /// Rows of the project with the query's soft-state flags that satisfy
    /// its relation filters.
    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>>;
}

impl Listing for Specimen {
    const PLURAL: &'static str = "specimens";

    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>> {
        DieselExpressionBuilder::default()
            .and(specimen::project_id.eq(project_id))
            .and(specimen::deleted.eq(query.deleted))
            .and(specimen::deprecated.eq(query.deprecated))
            .and_if(query.specimen_id.map(|id| specimen::id.eq(id)))
            .and_if(query.sample_id.map(|id| {
                specimen::id.eq_any(
                    sample::table
                        .filter(sample::id.eq(id))
                        .select(sample::specimen_id),
                )
            }))
            .and_if(query.readset_id.map(|id| {
                specimen::id.eq_any(
                    readset::table
                        .inner_join(sample::table)
                        .filter(readset::id.eq(id))
                        .select(sample::specimen_id),
                )
            }))
            .build()
    }
}

impl Listing for Sample {
    const PLURAL: &'static str = "samples";

    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>> {
        DieselExpressionBuilder::default()
            .and(sample::specimen_id.eq_any(specimens_in(project_id)))
            .and(sample::deleted.eq(query.deleted))
            .and(sample::deprecated.eq(query.deprecated))
            .and_if(query.specimen_id.map(|id| sample::specimen_id.eq(id)))
            .and_if(query.sample_id.map(|id| sample::id.eq(id)))
            .and_if(query.readset_id.map(|id| {
                sample::id.eq_any(
                    readset::table
                        .filter(readset::id.eq(id))
                        .select(readset::sample_id),
                )
            }))
            .and_if(query.tumour.map(|tumour| sample::tumour.eq(tumour)))
            .build()
    }
}

impl Listing for Readset {
    const PLURAL: &'static str = "readsets";

    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>> {
        DieselExpressionBuilder::default()
            .and(readset::sample_id.eq_any(samples_in(project_id)))
            .and(readset::deleted.eq(query.deleted))
            .and(readset::deprecated.eq(query.deprecated))
            .and_if(query.specimen_id.map(|id| {
                readset::sample_id.eq_any(
                    sample::table
                        .filter(sample::specimen_id.eq(id))
                        .select(sample::id),
                )
            }))
            .and_if(query.sample_id.map(|id| readset::sample_id.eq(id)))
            .and_if(query.readset_id.map(|id| readset::id.eq(id)))
            .and_if(query.operation_id.map(|id| {
                readset::id.eq_any(
                    readset_operation::table
                        .filter(readset_operation::operation_id.eq(id))
                        .select(readset_operation::readset_id),
                )
            }))
            .and_if(query.job_id.map(|id| {
                readset::id.eq_any(
                    readset_job::table
                        .filter(readset_job::job_id.eq(id))
                        .select(readset_job::readset_id),
                )
            }))
            .and_if(query.file_id.map(|id| {
                readset::id.eq_any(
                    readset_file::table
                        .filter(readset_file::file_id.eq(id))
                        .select(readset_file::readset_id),
                )
            }))
            .and_if(query.metric_id.map(|id| {
                readset::id.eq_any(
                    readset_metric::table
                        .filter(readset_metric::metric_id.eq(id))
                        .select(readset_metric::readset_id),
                )
            }))
            .build()
    }
}

impl Listing for Operation {
    const PLURAL: &'static str = "operations";

    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>> {
        DieselExpressionBuilder::default()
            .and(operation::project_id.eq(project_id))
            .and(operation::deleted.eq(query.deleted))
            .and(operation::deprecated.eq(query.deprecated))
            .and_if(query.operation_id.map(|id| operation::id.eq(id)))
            .and_if(query.readset_id.map(|id| {
                operation::id.eq_any(
                    readset_operation::table
                        .filter(readset_operation::readset_id.eq(id))
                        .select(readset_operation::operation_id),
                )
            }))
            .and_if(query.job_id.map(|id| {
                operation::id.eq_any(job::table.filter(job::id.eq(id)).select(job::operation_id))
            }))
            .build()
    }
}

impl Listing for Job {
    const PLURAL: &'static str = "jobs";

    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>> {
        DieselExpressionBuilder::default()
            .and(
                job::operation_id.eq_any(
                    operation::table
                        .filter(operation::project_id.eq(project_id))
                        .select(operation::id),
                ),
            )
            .and(job::deleted.eq(query.deleted))
            .and(job::deprecated.eq(query.deprecated))
            .and_if(query.operation_id.map(|id| job::operation_id.eq(id)))
            .and_if(query.job_id.map(|id| job::id.eq(id)))
            .and_if(query.readset_id.map(|id| {
                job::id.eq_any(
                    readset_job::table
                        .filter(readset_job::readset_id.eq(id))
                        .select(readset_job::job_id),
                )
            }))
            .and_if(query.file_id.map(|id| {
                job::id.eq_any(
                    job_file::table
                        .filter(job_file::file_id.eq(id))
                        .select(job_file::job_id),
                )
            }))
            .and_if(query.metric_id.map(|id| {
                job::id.eq_any(metric::table.filter(metric::id.eq(id)).select(metric::job_id))
            }))
            .build()
    }
}

impl Listing for File {
    const PLURAL: &'static str = "files";

    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>> {
        DieselExpressionBuilder::default()
            .and(
                file::id.eq_any(
                    readset_file::table
                        .filter(readset_file::readset_id.eq_any(readsets_in(project_id)))
                        .select(readset_file::file_id),
                ),
            )
            .and(file::deleted.eq(query.deleted))
            .and(file::deprecated.eq(query.deprecated))
            .and_if(query.specimen_id.map(|id| {
                file::id.eq_any(
                    readset_file::table
                        .inner_join(readset::table.inner_join(sample::table))
                        .filter(sample::specimen_id.eq(id))
                        .select(readset_file::file_id),
                )
            }))
            .and_if(query.sample_id.map(|id| {
                file::id.eq_any(
                    readset_file::table
                        .inner_join(readset::table)
                        .filter(readset::sample_id.eq(id))
                        .select(readset_file::file_id),
                )
            }))
            .and_if(query.readset_id.map(|id| {
                file::id.eq_any(
                    readset_file::table
                        .filter(readset_file::readset_id.eq(id))
                        .select(readset_file::file_id),
                )
            }))
            .and_if(query.job_id.map(|id| {
                file::id.eq_any(
                    job_file::table
                        .filter(job_file::job_id.eq(id))
                        .select(job_file::file_id),
                )
            }))
            .and_if(query.file_id.map(|id| file::id.eq(id)))
            .and_if(query.deliverable.map(|deliverable| file::deliverable.eq(deliverable)))
            .build()
    }
}

impl Listing for Metric {
    const PLURAL: &'static str = "metrics";

    fn filter(
        project_id: Id,
        query: &ListingQuery,
    ) -> Option<BoxedDieselExpression<'static, Self::Table>> {
        DieselExpressionBuilder::default()
            .and(
                metric::id.eq_any(
                    readset_metric::table
                        .filter(readset_metric::readset_id.eq_any(readsets_in(project_id)))
                        .select(readset_metric::metric_id),
                ),
            )
            .and(metric::deleted.eq(query.deleted))
            .and(metric::deprecated.eq(query.deprecated))
            .and_if(query.specimen_id.map(|id| {
                metric::id.eq_any(
                    readset_metric::table
                        .inner_join(readset::table.inner_join(sample::table))
                        .filter(sample::specimen_id.eq(id))
                        .select(readset_metric::metric_id),
                )
            }))
            .and_if(query.sample_id.map(|id| {
                metric::id.eq_any(
                    readset_metric::table
                        .inner_join(readset::table)
                        .filter(readset::sample_id.eq(id))
                        .select(readset_metric::metric_id),
                )
            }))
            .and_if(query.readset_id.map(|id| {
                metric::id.eq_any(
                    readset_metric::table
                        .filter(readset_metric::readset_id.eq(id))
                        .select(readset_metric::metric_id),
                )
            }))
            .and_if(query.job_id.map(|id| metric::job_id.eq(id)))
            .and_if(query.metric_id.map(|id| metric::id.eq(id)))
            .and_if(query.deliverable.map(|deliverable| metric::deliverable.eq(deliverable)))
            .build()
    }
}

/// Lists the rows of `T` in a project whose soft-state flags equal the
/// query's and that satisfy its filters.
/// # Errors
pub fn list<T: Listing>(
    tx: &mut Transaction,
    project_id: Id,
    query: &ListingQuery,
) -> Result<ActionOutput<Value>> {
    let rows = tx
        .filtered::<T>(T::filter(project_id, query))?
        .into_iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut output = ActionOutput::new(rows, Vec::new());
    if output.output.is_empty() {
        output.warn(format!(
            "No {} found with the following criteria: project_id={project_id}, {query}",
            T::PLURAL
        ));
    }

    Ok(output)
}

/// DNA samples of a project, split by whether their specimen has both a
/// tumour and a normal sample.
/// # Errors
pub fn samples_pair(
    tx: &mut Transaction,
    project_id: Id,
    query: &PairQuery,
) -> Result<ActionOutput<Row<Sample>>> {
    let filter = DieselExpressionBuilder::default()
        .and(sample::specimen_id.eq_any(specimens_in(project_id)))
        .and(sample::deleted.eq(query.deleted))
        .and(sample::deprecated.eq(query.deprecated))
        .and_if(query.specimen_id.map(|id| sample::specimen_id.eq(id)))
        .build();

    let mut samples = Vec::new();
    for sample in tx.filtered::<Sample>(filter)? {
        if tx.sample_nucleic_acid_type(sample.id)? == Some(NucleicAcidType::Dna) {
            samples.push(sample);
        }
    }

    let mut kinds: BTreeMap<Id, (bool, bool)> = BTreeMap::new();
    for sample in &samples {
        let (tumour, normal) = kinds.entry(sample.specimen_id).or_default();
        if sample.tumour {
            *tumour = true;
        } else {
            *normal = true;
        }
    }

    let paired = |specimen_id: Id| kinds.get(&specimen_id) == Some(&(true, true));

    let rows: Vec<Row<Sample>> = samples
        .into_iter()
        .filter(|s| paired(s.specimen_id) == query.pair)
        .collect();

    let mut output = ActionOutput::new(rows, Vec::new());
    if output.output.is_empty() {
        output.warn(format!(
            "No samples found with the following criteria: project_id={project_id}, pair={}",
            query.pair
        ));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use project_tracking_core::model::{
        entity::{File, Metric, Project, Readset, Sample, Specimen},
        route::{ListingQuery, NewProject, PairQuery},
    };
    use rstest::rstest;

    use super::{create_project, list, project_id, samples_pair};
    use crate::db::{
        Store,
        error::Error,
        test_util::{self, id_by_name, store},
    };

    fn names(output: &[serde_json::Value]) -> Vec<&str> {
        output
            .iter()
            .map(|row| row["name"].as_str().unwrap())
            .collect()
    }

    #[rstest]
    #[case("test")]
    #[case("TEST")]
    fn project_by_name_or_id(store: Store, #[case] project: &str) {
        let expected = test_util::project_id(&store);

        let by_name = store.read(|tx| project_id(tx, project)).unwrap();
        let by_id = store
            .read(|tx| project_id(tx, &expected.to_string()))
            .unwrap();

        assert_eq!(by_name, expected);
        assert_eq!(by_id, expected);
    }

    #[rstest]
    fn unknown_project_lists_available_ones(store: Store) {
        let result = store.read(|tx| project_id(tx, "MOH"));

        assert_eq!(
            result,
            Err(Error::ProjectNotFound {
                project: "MOH".to_string(),
                available: vec!["id: 1, name: TEST".to_string()]
            })
        );
    }

    #[rstest]
    fn create_project_is_get_or_create(store: Store) {
        let output = store
            .transaction(|tx| create_project(tx, "test", &NewProject::default()))
            .unwrap();

        assert_eq!(output.warnings, ["Project 'TEST' already exists."]);
        assert_eq!(store.read(|tx| Ok(tx.rows::<Project>()?.len())).unwrap(), 1);
    }

    #[rstest]
    fn listing_filters_by_relation(store: Store) {
        let project_id = test_util::project_id(&store);
        let query = ListingQuery {
            specimen_id: Some(id_by_name::<Specimen>(&store, "SP1")),
            ..Default::default()
        };

        let samples = store
            .read(|tx| list::<Sample>(tx, project_id, &query))
            .unwrap();
        assert_eq!(names(&samples.output), ["SA1", "SA2"]);

        let readsets = store
            .read(|tx| list::<Readset>(tx, project_id, &query))
            .unwrap();
        assert_eq!(names(&readsets.output), ["RS1", "RS2"]);

        let query = ListingQuery {
            readset_id: Some(id_by_name::<Readset>(&store, "RS2")),
            ..Default::default()
        };
        let files = store
            .read(|tx| list::<File>(tx, project_id, &query))
            .unwrap();
        assert_eq!(names(&files.output), ["RS2_R1.fastq.gz"]);
    }

    #[rstest]
    #[case("SP1", "SA1", vec!["raw_reads_count"])]
    #[case("SP1", "SA2", vec![])]
    #[case("SP3", "SA1", vec![])]
    fn metrics_filter_by_specimen_and_sample(
        store: Store,
        #[case] specimen: &str,
        #[case] sample: &str,
        #[case] expected: Vec<&str>,
    ) {
        let project_id = test_util::project_id(&store);
        let by_specimen = ListingQuery {
            specimen_id: Some(id_by_name::<Specimen>(&store, specimen)),
            ..Default::default()
        };
        let by_both = ListingQuery {
            sample_id: Some(id_by_name::<Sample>(&store, sample)),
            ..by_specimen.clone()
        };

        let metrics = store
            .read(|tx| list::<Metric>(tx, project_id, &by_both))
            .unwrap();
        assert_eq!(names(&metrics.output), expected);

        let metrics = store
            .read(|tx| list::<Metric>(tx, project_id, &by_specimen))
            .unwrap();
        let expected = if specimen == "SP1" { vec!["raw_reads_count"] } else { vec![] };
        assert_eq!(names(&metrics.output), expected);
    }

    #[rstest]
    fn empty_listing_warns(store: Store) {
        let project_id = test_util::project_id(&store);
        let query = ListingQuery {
            deleted: true,
            ..Default::default()
        };

        let output = store
            .read(|tx| list::<Specimen>(tx, project_id, &query))
            .unwrap();

        assert!(output.output.is_empty());
        assert_eq!(
            output.warnings,
            [format!(
                "No specimens found with the following criteria: project_id={project_id}, \
                 deprecated=false, deleted=true"
            )]
        );
    }

    #[rstest]
    #[case(true, vec!["SA1", "SA2"])]
    #[case(false, vec!["SA4"])]
    fn samples_pair_splits_on_tumour_normal(
        store: Store,
        #[case] pair: bool,
        #[case] expected: Vec<&str>,
    ) {
        let project_id = test_util::project_id(&store);
        let query = PairQuery {
            pair,
            ..Default::default()
        };

        let output = store
            .read(|tx| samples_pair(tx, project_id, &query))
            .unwrap();

        let names: Vec<_> = output.output.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, expected);
    }
}
