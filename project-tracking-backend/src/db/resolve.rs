//! Resolution of the specimen, sample and readset references carried by a
//! digest request. References that exist but do not fit the request are
//! dropped with a warning. References that do not exist are errors.

use diesel::prelude::*;
use itertools::Itertools;
use project_tracking_core::model::{
    digest::DigestRequest,
    entity::{EntityKind, Id, Readset, Row, Sample, Specimen},
    vocabulary::NucleicAcidType,
};
use project_tracking_schema::{experiment, readset, sample, specimen};

use super::{
    BoxedDieselExpression, Stored, Transaction,
    error::{Error, Result},
};

/// An entity reachable from a project, looked up by name or id.
pub trait Scoped: Stored {
    fn named_in<'a>(name: &'a str, project_id: Id) -> BoxedDieselExpression<'a, Self::Table>;

    fn numbered_in<'a>(id: Id, project_id: Id) -> BoxedDieselExpression<'a, Self::Table>;

    fn name(&self) -> &str;
}

impl Scoped for Specimen {
    fn named_in<'a>(name: &'a str, project_id: Id) -> BoxedDieselExpression<'a, Self::Table> {
        Box::new(
            specimen::name
                .eq(name)
                .and(specimen::project_id.eq(project_id)),
        )
    }

    fn numbered_in<'a>(id: Id, project_id: Id) -> BoxedDieselExpression<'a, Self::Table> {
        Box::new(specimen::id.eq(id).and(specimen::project_id.eq(project_id)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Scoped for Sample {
    fn named_in<'a>(name: &'a str, project_id: Id) -> BoxedDieselExpression<'a, Self::Table> {
        Box::new(
            sample::name
                .eq(name)
                .and(sample::specimen_id.eq_any(specimens_in(project_id))),
        )
    }

    fn numbered_in<'a>(id: Id, project_id: Id) -> BoxedDieselExpression<'a, Self::Table> {
        Box::new(
            sample::id
                .eq(id)
                .and(sample::specimen_id.eq_any(specimens_in(project_id))),
        )
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Scoped for Readset {
    fn named_in<'a>(name: &'a str, project_id: Id) -> BoxedDieselExpression<'a, Self::Table> {
        Box::new(
            readset::name
                .eq(name)
                .and(readset::sample_id.eq_any(samples_in(project_id))),
        )
    }

    fn numbered_in<'a>(id: Id, project_id: Id) -> BoxedDieselExpression<'a, Self::Table> {
        Box::new(
            readset::id
                .eq(id)
                .and(readset::sample_id.eq_any(samples_in(project_id))),
        )
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[diesel::dsl::auto_type]
pub(super) fn specimens_in(project_id: Id) -> _ {
    specimen::table
        .filter(specimen::project_id.eq(project_id))
        .select(specimen::id)
}

#[diesel::dsl::auto_type]
pub(super) fn samples_in(project_id: Id) -> _ {
    sample::table
        .inner_join(specimen::table)
        .filter(specimen::project_id.eq(project_id))
        .select(sample::id)
}

#[diesel::dsl::auto_type]
pub(super) fn readsets_in(project_id: Id) -> _ {
    readset::table
        .inner_join(sample::table.inner_join(specimen::table))
        .filter(specimen::project_id.eq(project_id))
        .select(readset::id)
}

impl Transaction<'_> {
    /// # Errors
    pub fn samples_of_specimen(&mut self, specimen_id: Id) -> Result<Vec<Row<Sample>>> {
        self.load::<Sample>(Box::new(sample::specimen_id.eq(specimen_id)))
    }

    /// # Errors
    pub fn readsets_of_sample(&mut self, sample_id: Id) -> Result<Vec<Row<Readset>>> {
        self.load::<Readset>(Box::new(readset::sample_id.eq(sample_id)))
    }

    /// # Errors
    pub fn readset_nucleic_acid_type(&mut self, readset: &Readset) -> Result<Option<NucleicAcidType>> {
        Ok(experiment::table
            .find(readset.experiment_id)
            .select(experiment::nucleic_acid_type)
            .first(self.conn())
            .optional()?)
    }

    /// A sample's nucleic-acid type is the one of its first readset.
    /// # Errors
    pub fn sample_nucleic_acid_type(&mut self, sample_id: Id) -> Result<Option<NucleicAcidType>> {
        Ok(readset::table
            .inner_join(experiment::table)
            .filter(readset::sample_id.eq(sample_id))
            .order(readset::id)
            .select(experiment::nucleic_acid_type)
            .first(self.conn())
            .optional()?)
    }
}

/// Looks a row up by name within a project, preferring live rows over
/// deleted ones.
fn by_name<T: Scoped>(tx: &mut Transaction, name: &str, project_id: Id) -> Result<Row<T>> {
    tx.load::<T>(T::named_in(name, project_id))?
        .into_iter()
        .min_by_key(|row| row.state.deleted)
        .ok_or_else(|| Error::did_not_find(T::KIND, "name", name))
}

fn by_id<T: Scoped>(tx: &mut Transaction, id: Id, project_id: Id) -> Result<Row<T>> {
    tx.find::<T>(T::numbered_in(id, project_id))?
        .ok_or_else(|| Error::did_not_find(T::KIND, "id", id))
}

/// Rows named in `names` then rows numbered in `ids`, in request order.
fn referenced<T: Scoped>(
    tx: &mut Transaction,
    names: &[String],
    ids: &[Id],
    project_id: Id,
) -> Result<Vec<Row<T>>> {
    let mut rows = Vec::with_capacity(names.len() + ids.len());

    for name in names {
        rows.push(by_name(tx, name, project_id)?);
    }
    for id in ids {
        rows.push(by_id(tx, *id, project_id)?);
    }

    Ok(rows)
}

fn specimens(
    tx: &mut Transaction,
    request: &DigestRequest,
    project_id: Id,
) -> Result<Vec<Row<Specimen>>> {
    referenced(tx, &request.specimen_name, &request.specimen_id, project_id)
}

fn samples(
    tx: &mut Transaction,
    request: &DigestRequest,
    project_id: Id,
) -> Result<Vec<Row<Sample>>> {
    referenced(tx, &request.sample_name, &request.sample_id, project_id)
}

fn readsets(
    tx: &mut Transaction,
    request: &DigestRequest,
    project_id: Id,
) -> Result<Vec<Row<Readset>>> {
    referenced(tx, &request.readset_name, &request.readset_id, project_id)
}

fn keep_sample(
    tx: &mut Transaction,
    sample: &Row<Sample>,
    nucleic_acid_type: NucleicAcidType,
    warnings: &mut Vec<String>,
) -> Result<bool> {
    let Some(first) = tx.readsets_of_sample(sample.id)?.into_iter().next() else {
        warnings.push(format!(
            "'Sample' with 'name' '{}' has no associated readsets. Skipping...",
            sample.name
        ));
        return Ok(false);
    };

    let actual = tx.readset_nucleic_acid_type(&first)?;

    Ok(keep(
        EntityKind::Sample,
        &sample.name,
        sample.state.is_active(),
        actual,
        nucleic_acid_type,
        warnings,
    ))
}

fn keep_readset(
    tx: &mut Transaction,
    readset: &Row<Readset>,
    nucleic_acid_type: NucleicAcidType,
    warnings: &mut Vec<String>,
) -> Result<bool> {
    let actual = tx.readset_nucleic_acid_type(readset)?;

    Ok(keep(
        EntityKind::Readset,
        &readset.name,
        readset.state.is_active(),
        actual,
        nucleic_acid_type,
        warnings,
    ))
}

/// Keeps a live row of the requested type. Anything else is reported under
/// the type it is stored with.
fn keep(
    kind: EntityKind,
    name: &str,
    active: bool,
    actual: Option<NucleicAcidType>,
    requested: NucleicAcidType,
    warnings: &mut Vec<String>,
) -> bool {
    if active && actual == Some(requested) {
        return true;
    }

    let actual = actual.map_or_else(|| "None".to_string(), |t| t.to_string());
    warnings.push(format!(
        "'{kind}' with 'name' '{name}' only exists with 'nucleic_acid_type' '{actual}' on \
         database. Skipping..."
    ));

    false
}

/// # Errors
pub fn select_samples_from_specimens(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let mut selected = Vec::new();

    for specimen in specimens(tx, request, project_id)? {
        for sample in tx.samples_of_specimen(specimen.id)? {
            if keep_sample(tx, &sample, nucleic_acid_type, warnings)? {
                selected.push(sample.id);
            }
        }
    }

    Ok(selected)
}

/// # Errors
pub fn select_samples_from_samples(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let mut selected = Vec::new();

    for sample in samples(tx, request, project_id)? {
        if keep_sample(tx, &sample, nucleic_acid_type, warnings)? {
            selected.push(sample.id);
        }
    }

    Ok(selected)
}

/// # Errors
pub fn select_samples_from_readsets(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let mut selected = Vec::new();

    for readset in readsets(tx, request, project_id)? {
        let sample = tx.fetch::<Sample>(readset.sample_id)?;
        if keep_sample(tx, &sample, nucleic_acid_type, warnings)? {
            selected.push(sample.id);
        }
    }

    Ok(selected)
}

/// # Errors
pub fn select_readsets_from_specimens(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let mut selected = Vec::new();

    for specimen in specimens(tx, request, project_id)? {
        for sample in tx.samples_of_specimen(specimen.id)? {
            for readset in tx.readsets_of_sample(sample.id)? {
                if keep_readset(tx, &readset, nucleic_acid_type, warnings)? {
                    selected.push(readset.id);
                }
            }
        }
    }

    Ok(selected)
}

/// # Errors
pub fn select_readsets_from_samples(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let mut selected = Vec::new();

    for sample in samples(tx, request, project_id)? {
        let readsets = tx.readsets_of_sample(sample.id)?;
        if readsets.is_empty() {
            warnings.push(format!(
                "'Sample' with 'name' '{}' has no associated readsets. Skipping...",
                sample.name
            ));
            continue;
        }

        for readset in readsets {
            if keep_readset(tx, &readset, nucleic_acid_type, warnings)? {
                selected.push(readset.id);
            }
        }
    }

    Ok(selected)
}

/// # Errors
pub fn select_readsets_from_readsets(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let mut selected = Vec::new();

    for readset in readsets(tx, request, project_id)? {
        if keep_readset(tx, &readset, nucleic_acid_type, warnings)? {
            selected.push(readset.id);
        }
    }

    Ok(selected)
}

/// Every sample referenced by the request, directly or not, in first-seen
/// order and without duplicates.
/// # Errors
pub fn select_samples(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let from_specimens =
        select_samples_from_specimens(tx, request, nucleic_acid_type, project_id, warnings)?;
    let from_samples =
        select_samples_from_samples(tx, request, nucleic_acid_type, project_id, warnings)?;
    let from_readsets =
        select_samples_from_readsets(tx, request, nucleic_acid_type, project_id, warnings)?;

    Ok(from_specimens
        .into_iter()
        .chain(from_samples)
        .chain(from_readsets)
        .unique()
        .collect())
}

/// Every readset referenced by the request, directly or not, in first-seen
/// order and without duplicates.
/// # Errors
pub fn select_readsets(
    tx: &mut Transaction,
    request: &DigestRequest,
    nucleic_acid_type: NucleicAcidType,
    project_id: Id,
    warnings: &mut Vec<String>,
) -> Result<Vec<Id>> {
    let from_specimens =
        select_readsets_from_specimens(tx, request, nucleic_acid_type, project_id, warnings)?;
    let from_samples =
        select_readsets_from_samples(tx, request, nucleic_acid_type, project_id, warnings)?;
    let from_readsets =
        select_readsets_from_readsets(tx, request, nucleic_acid_type, project_id, warnings)?;

    Ok(from_specimens
        .into_iter()
        .chain(from_samples)
        .chain(from_readsets)
        .unique()
        .collect())
}
