use std::collections::BTreeMap;

use diesel::prelude::*;
use project_tracking_core::model::entity::{EntityKind, Id};
use project_tracking_schema as schema;
use strum::VariantArray;

use super::{
    Link, Transaction,
    error::{Error, Result},
};

/// Whether a child row is held through a foreign key or a link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Linked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Parents,
    Children,
}

impl Direction {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Parents => Self::Children,
            Self::Children => Self::Parents,
        }
    }
}

/// Every parent to child edge of the entity graph that the cascade engine
/// walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::VariantArray)]
pub enum Relationship {
    ProjectSpecimen,
    ProjectOperation,
    SpecimenSample,
    SampleReadset,
    ExperimentReadset,
    RunReadset,
    OperationConfigOperation,
    OperationJob,
    JobMetric,
    FileLocation,
    ReadsetFile,
    ReadsetMetric,
    JobFile,
}

impl Relationship {
    #[must_use]
    pub fn parent(self) -> EntityKind {
        use EntityKind as K;
        use Relationship as R;

        match self {
            R::ProjectSpecimen | R::ProjectOperation => K::Project,
            R::SpecimenSample => K::Specimen,
            R::SampleReadset => K::Sample,
            R::ExperimentReadset => K::Experiment,
            R::RunReadset => K::Run,
            R::OperationConfigOperation => K::OperationConfig,
            R::OperationJob => K::Operation,
            R::JobMetric | R::JobFile => K::Job,
            R::FileLocation => K::File,
            R::ReadsetFile | R::ReadsetMetric => K::Readset,
        }
    }

    #[must_use]
    pub fn child(self) -> EntityKind {
        use EntityKind as K;
        use Relationship as R;

        match self {
            R::ProjectSpecimen => K::Specimen,
            R::ProjectOperation | R::OperationConfigOperation => K::Operation,
            R::SpecimenSample => K::Sample,
            R::SampleReadset | R::ExperimentReadset | R::RunReadset => K::Readset,
            R::OperationJob => K::Job,
            R::JobMetric | R::ReadsetMetric => K::Metric,
            R::FileLocation => K::Location,
            R::ReadsetFile | R::JobFile => K::File,
        }
    }

    #[must_use]
    pub fn ownership(self) -> Ownership {
        match self {
            Self::ReadsetFile | Self::ReadsetMetric | Self::JobFile => Ownership::Linked,
            _ => Ownership::Owned,
        }
    }

    /// Whether a soft-state cascade follows this edge when walking in
    /// `direction`. Readsets never reach their experiment, and the walk
    /// upwards stops below projects, runs and operation configs.
    #[must_use]
    pub fn cascades(self, direction: Direction) -> bool {
        use Relationship as R;

        match direction {
            Direction::Children => self != R::ExperimentReadset,
            Direction::Parents => matches!(
                self,
                R::SpecimenSample
                    | R::SampleReadset
                    | R::OperationJob
                    | R::JobMetric
                    | R::FileLocation
                    | R::ReadsetFile
                    | R::ReadsetMetric
                    | R::JobFile
            ),
        }
    }

    /// The column of the child table holding the parent id, for owned edges.
    #[must_use]
    pub fn foreign_key(self) -> Option<&'static str> {
        use Relationship as R;

        match self {
            R::ProjectSpecimen | R::ProjectOperation => Some("project_id"),
            R::SpecimenSample => Some("specimen_id"),
            R::SampleReadset => Some("sample_id"),
            R::ExperimentReadset => Some("experiment_id"),
            R::RunReadset => Some("run_id"),
            R::OperationConfigOperation => Some("operation_config_id"),
            R::OperationJob => Some("operation_id"),
            R::JobMetric => Some("job_id"),
            R::FileLocation => Some("file_id"),
            R::ReadsetFile | R::ReadsetMetric | R::JobFile => None,
        }
    }

    /// The kind found at the far end of this edge when walking in `direction`.
    #[must_use]
    pub fn kind_towards(self, direction: Direction) -> EntityKind {
        match direction {
            Direction::Parents => self.parent(),
            Direction::Children => self.child(),
        }
    }

    /// The edges that leave `kind` in `direction`.
    pub fn edges(kind: EntityKind, direction: Direction) -> impl Iterator<Item = Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .filter(move |rel| rel.kind_towards(direction.opposite()) == kind)
    }

    /// Verifies that the parent to child graph has no cycle, by topological
    /// sort.
    /// # Errors
    pub fn check_acyclic() -> Result<()> {
        let mut in_degree: BTreeMap<EntityKind, usize> =
            EntityKind::VARIANTS.iter().map(|kind| (*kind, 0)).collect();
        for rel in Self::VARIANTS {
            *in_degree.entry(rel.child()).or_default() += 1;
        }

        let mut ready: Vec<EntityKind> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(kind, _)| *kind)
            .collect();
        let mut visited = 0;

        while let Some(kind) = ready.pop() {
            visited += 1;

            for rel in Self::edges(kind, Direction::Children) {
                let Some(degree) = in_degree.get_mut(&rel.child()) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    ready.push(rel.child());
                }
            }
        }

        if visited != in_degree.len() {
            return Err(Error::Other {
                message: "cascade map contains a cycle".to_string(),
            });
        }

        Ok(())
    }
}

impl Transaction<'_> {
    /// Ids of the rows held by `id` through `rel`.
    /// # Errors
    pub fn children(&mut self, rel: Relationship, id: Id) -> Result<Vec<Id>> {
        use Relationship as R;

        macro_rules! owned_by {
            ($table:ident, $fk:ident) => {
                schema::$table::table
                    .filter(schema::$table::$fk.eq(id))
                    .select(schema::$table::id)
                    .order(schema::$table::id)
                    .load(self.conn())?
            };
        }

        let ids = match rel {
            R::ProjectSpecimen => owned_by!(specimen, project_id),
            R::ProjectOperation => owned_by!(operation, project_id),
            R::SpecimenSample => owned_by!(sample, specimen_id),
            R::SampleReadset => owned_by!(readset, sample_id),
            R::ExperimentReadset => owned_by!(readset, experiment_id),
            R::RunReadset => owned_by!(readset, run_id),
            R::OperationConfigOperation => owned_by!(operation, operation_config_id),
            R::OperationJob => owned_by!(job, operation_id),
            R::JobMetric => owned_by!(metric, job_id),
            R::FileLocation => owned_by!(location, file_id),
            R::ReadsetFile => self.rights_of(Link::ReadsetFile, id)?,
            R::ReadsetMetric => self.rights_of(Link::ReadsetMetric, id)?,
            R::JobFile => self.rights_of(Link::JobFile, id)?,
        };

        Ok(ids)
    }

    /// Ids of the rows holding `id` through `rel`.
    /// # Errors
    pub fn parents(&mut self, rel: Relationship, id: Id) -> Result<Vec<Id>> {
        use Relationship as R;

        macro_rules! owner_of {
            ($table:ident, $fk:ident) => {
                schema::$table::table
                    .find(id)
                    .select(schema::$table::$fk)
                    .first::<Id>(self.conn())
                    .optional()?
            };
        }

        let owner = match rel {
            R::ProjectSpecimen => owner_of!(specimen, project_id),
            R::ProjectOperation => owner_of!(operation, project_id),
            R::SpecimenSample => owner_of!(sample, specimen_id),
            R::SampleReadset => owner_of!(readset, sample_id),
            R::ExperimentReadset => owner_of!(readset, experiment_id),
            R::RunReadset => owner_of!(readset, run_id),
            R::OperationConfigOperation => schema::operation::table
                .find(id)
                .select(schema::operation::operation_config_id)
                .first::<Option<Id>>(self.conn())
                .optional()?
                .flatten(),
            R::OperationJob => owner_of!(job, operation_id),
            R::JobMetric => owner_of!(metric, job_id),
            R::FileLocation => owner_of!(location, file_id),
            R::ReadsetFile => return self.lefts_of(Link::ReadsetFile, id),
            R::ReadsetMetric => return self.lefts_of(Link::ReadsetMetric, id),
            R::JobFile => return self.lefts_of(Link::JobFile, id),
        };

        Ok(owner.into_iter().collect())
    }

    /// # Errors
    pub fn related(&mut self, rel: Relationship, id: Id, direction: Direction) -> Result<Vec<Id>> {
        match direction {
            Direction::Parents => self.parents(rel, id),
            Direction::Children => self.children(rel, id),
        }
    }
}
