use project_tracking_core::model::{
    ActionOutput,
    entity::{EntityKind, Id, SoftFlag},
    ingest::scalar_to_string,
    modification::{CascadeField, CascadeMode, ModificationAction, ModificationRequest},
    vocabulary::EnumValueError,
};
use itertools::Itertools;
use serde_json::Value;
use strum::VariantNames;

use super::{
    Transaction,
    cascade::{Direction, Ownership, Relationship},
    error::{Error, Result},
};

/// A validated modification target.
struct Target {
    kind: EntityKind,
    ids: Vec<Id>,
    column: Option<String>,
    new: Option<Value>,
}

/// Resolves the cascade mode from either the `cascade` field or the boolean
/// `cascade_up`/`cascade_down` flags.
/// # Errors
pub fn cascade_mode(request: &ModificationRequest) -> Result<CascadeMode> {
    let from_field = match request.cascade {
        None | Some(CascadeField::Flag(false)) => CascadeMode::None,
        Some(CascadeField::Flag(true)) => CascadeMode::Cascade,
        Some(CascadeField::Mode(mode)) => mode,
    };

    let requested = [
        (from_field != CascadeMode::None, from_field),
        (request.cascade_up, CascadeMode::CascadeUp),
        (request.cascade_down, CascadeMode::CascadeDown),
    ];

    let mut set = requested.iter().filter(|(on, _)| *on);
    match (set.next(), set.next()) {
        (None, _) => Ok(CascadeMode::None),
        (Some((_, mode)), None) => Ok(*mode),
        (Some(_), Some(_)) => Err(Error::request(
            "Only one of 'cascade', 'cascade_up', or 'cascade_down' can be true.",
        )),
    }
}

fn parse_kind(table: &str) -> Result<EntityKind> {
    table.parse().map_err(|_| {
        EnumValueError {
            value: table.to_string(),
            enum_name: "table",
            valid: EntityKind::VARIANTS.join(", "),
        }
        .into()
    })
}

fn validate(
    tx: &mut Transaction,
    action: ModificationAction,
    request: &ModificationRequest,
    output: &mut ActionOutput<String>,
) -> Result<Vec<Target>> {
    if request.modification.is_empty() {
        return Err(Error::request(
            "No 'table' provided under 'modification' list, this json is malformed.",
        ));
    }

    let mut targets = Vec::with_capacity(request.modification.len());

    for entry in &request.modification {
        let kind = parse_kind(&entry.table)?;

        if entry.id.is_empty() {
            output.warn(format!(
                "No IDs provided for table '{}'. Skipping...",
                entry.table
            ));
            continue;
        }

        let ids: Vec<Id> = entry.id.iter().copied().unique().collect();
        for id in &ids {
            if !tx.exists(kind, *id)? {
                return Err(Error::did_not_find(kind, "id", id));
            }
        }

        if action == ModificationAction::Edit {
            if entry.column.is_none() {
                return Err(Error::missing_argument("column"));
            }
            if entry.new.is_none() {
                return Err(Error::missing_argument("new"));
            }
        }

        targets.push(Target {
            kind,
            ids,
            column: entry.column.clone(),
            new: entry.new.clone(),
        });
    }

    Ok(targets)
}

/// Applies a modification action to every listed row. All targets are
/// validated before anything is touched.
/// # Errors
pub fn modify(
    tx: &mut Transaction,
    action: ModificationAction,
    request: &ModificationRequest,
) -> Result<ActionOutput<String>> {
    let mode = cascade_mode(request)?;
    let mut output = ActionOutput::default();
    let targets = validate(tx, action, request, &mut output)?;

    for Target {
        kind,
        ids,
        column,
        new,
    } in targets
    {
        for id in ids {
            match (action, action.soft_flag()) {
                (_, Some((flag, true))) => set_flag(tx, kind, id, flag, mode, &mut output)?,
                (_, Some((flag, false))) => clear_flag(tx, kind, id, flag, mode, &mut output)?,
                (ModificationAction::Curate, _) => {
                    curate(tx, kind, id, mode.down(), mode.up(), &mut output)?;
                }
                (ModificationAction::Edit, _) => {
                    let (Some(column), Some(new)) = (&column, &new) else {
                        continue;
                    };
                    edit(tx, kind, id, column, new, &mut output)?;
                }
                _ => (),
            }
        }
    }

    Ok(output)
}

fn directions(mode: CascadeMode) -> impl Iterator<Item = Direction> {
    [
        (mode.down(), Direction::Children),
        (mode.up(), Direction::Parents),
    ]
    .into_iter()
    .filter_map(|(on, direction)| on.then_some(direction))
}

/// The edges a cascade follows out of `kind` in `direction`.
fn walked(kind: EntityKind, direction: Direction) -> impl Iterator<Item = Relationship> {
    Relationship::edges(kind, direction).filter(move |rel| rel.cascades(direction))
}

fn past_tense(flag: SoftFlag, value: bool) -> &'static str {
    match (flag, value) {
        (SoftFlag::Deleted, true) => "deleted",
        (SoftFlag::Deleted, false) => "undeleted",
        (SoftFlag::Deprecated, true) => "deprecated",
        (SoftFlag::Deprecated, false) => "undeprecated",
    }
}

fn mark(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    flag: SoftFlag,
    value: bool,
    output: &mut ActionOutput<String>,
) -> Result<()> {
    tx.set_flag(kind, id, flag, value)?;
    tracing::debug!(%kind, id, %flag, value, "soft state changed");
    output.push(format!(
        "'{kind}' with id '{id}' {}.",
        past_tense(flag, value)
    ));

    Ok(())
}

fn set_flag(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    flag: SoftFlag,
    mode: CascadeMode,
    output: &mut ActionOutput<String>,
) -> Result<()> {
    if tx.is_flagged(kind, id, flag)? {
        output.warn(format!(
            "'{kind}' with id '{id}' already {}. Skipping...",
            past_tense(flag, true)
        ));
        return Ok(());
    }

    mark(tx, kind, id, flag, true, output)?;

    for direction in directions(mode) {
        flag_related(tx, kind, id, flag, direction, output)?;
    }

    Ok(())
}

/// Whether every row `kind`/`id` cascades back to, opposite to `direction`,
/// already carries `flag`.
fn eligible(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    flag: SoftFlag,
    direction: Direction,
) -> Result<bool> {
    let back = direction.opposite();

    for rel in walked(kind, back) {
        for other in tx.related(rel, id, back)? {
            if !tx.is_flagged(rel.kind_towards(back), other, flag)? {
                return Ok(false);
            }
        }
    }

    Ok(true)
}

/// Flags the rows reached from `id` in `direction` that are eligible.
fn flag_related(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    flag: SoftFlag,
    direction: Direction,
    output: &mut ActionOutput<String>,
) -> Result<()> {
    for rel in walked(kind, direction) {
        let related_kind = rel.kind_towards(direction);

        for related in tx.related(rel, id, direction)? {
            if tx.is_flagged(related_kind, related, flag)?
                || !eligible(tx, related_kind, related, flag, direction)?
            {
                continue;
            }

            mark(tx, related_kind, related, flag, true, output)?;
            flag_related(tx, related_kind, related, flag, direction, output)?;
        }
    }

    Ok(())
}

fn clear_flag(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    flag: SoftFlag,
    mode: CascadeMode,
    output: &mut ActionOutput<String>,
) -> Result<()> {
    if !tx.is_flagged(kind, id, flag)? {
        output.warn(format!(
            "'{kind}' with id '{id}' already {}. Skipping...",
            past_tense(flag, false)
        ));
        return Ok(());
    }

    mark(tx, kind, id, flag, false, output)?;

    for direction in directions(mode) {
        clear_related(tx, kind, id, flag, direction, output)?;
    }

    Ok(())
}

fn clear_related(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    flag: SoftFlag,
    direction: Direction,
    output: &mut ActionOutput<String>,
) -> Result<()> {
    for rel in walked(kind, direction) {
        let related_kind = rel.kind_towards(direction);

        for related in tx.related(rel, id, direction)? {
            if !tx.is_flagged(related_kind, related, flag)? {
                continue;
            }

            mark(tx, related_kind, related, flag, false, output)?;
            clear_related(tx, related_kind, related, flag, direction, output)?;
        }
    }

    Ok(())
}

fn childless(tx: &mut Transaction, kind: EntityKind, id: Id) -> Result<bool> {
    for rel in Relationship::edges(kind, Direction::Children) {
        if !tx.children(rel, id)?.is_empty() {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Physically removes a row. Owned rows always go with it. Linked children
/// left without any other parent go when walking down. Walking up, parents
/// along the cascade edges go once they hold no row of any kind.
fn curate(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    down: bool,
    up: bool,
    output: &mut ActionOutput<String>,
) -> Result<()> {
    if !tx.exists(kind, id)? {
        output.warn(format!(
            "'{kind}' with id '{id}' already permanently deleted. Skipping..."
        ));
        return Ok(());
    }

    for rel in Relationship::edges(kind, Direction::Children) {
        for child in tx.children(rel, id)? {
            let remove = match rel.ownership() {
                Ownership::Owned => true,
                Ownership::Linked => down && tx.parents(rel, child)? == [id],
            };
            if remove && tx.exists(rel.child(), child)? {
                curate(tx, rel.child(), child, down, false, output)?;
            }
        }
    }

    let mut parents = Vec::new();
    if up {
        for rel in walked(kind, Direction::Parents) {
            for parent in tx.parents(rel, id)? {
                parents.push((rel.parent(), parent));
            }
        }
    }

    tx.remove(kind, id)?;
    tracing::debug!(%kind, id, "row removed");
    output.push(format!("'{kind}' with id '{id}' permanently deleted."));

    for (parent_kind, parent) in parents {
        if tx.exists(parent_kind, parent)? && childless(tx, parent_kind, parent)? {
            curate(tx, parent_kind, parent, false, true, output)?;
        }
    }

    Ok(())
}

fn edit(
    tx: &mut Transaction,
    kind: EntityKind,
    id: Id,
    column: &str,
    new: &Value,
    output: &mut ActionOutput<String>,
) -> Result<()> {
    if matches!(column, "id" | "creation") {
        return Err(Error::request(format!(
            "Column '{column}' of table '{kind}' can't be edited."
        )));
    }

    let mut row = tx
        .to_json(kind, id)?
        .ok_or_else(|| Error::did_not_find(kind, "id", id))?;
    let Value::Object(columns) = &mut row else {
        return Err(Error::Other {
            message: format!("'{kind}' with id '{id}' is not stored as an object"),
        });
    };

    let Some(old) = columns.get(column).cloned() else {
        return Err(Error::request(format!(
            "Column '{column}' doesn't exist in table '{kind}'."
        )));
    };

    if old == *new {
        output.warn(format!(
            "Table '{kind}' with id '{id}' already has '{column}' with value '{}'. Skipping...",
            scalar_to_string(&old)
        ));
        return Ok(());
    }

    columns.insert(column.to_string(), new.clone());

    for rel in Relationship::edges(kind, Direction::Parents) {
        let Some(parent) = rel
            .foreign_key()
            .and_then(|fk| columns.get(fk))
            .and_then(Value::as_i64)
        else {
            continue;
        };
        if !tx.exists(rel.parent(), parent)? {
            return Err(Error::did_not_find(rel.parent(), "id", parent));
        }
    }

    tx.replace_json(kind, id, row)?;

    output.push(format!(
        "Table '{kind}' edited: column '{column}' with id '{id}' changes from '{}' to '{}'.",
        scalar_to_string(&old),
        scalar_to_string(new)
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use project_tracking_core::model::{
        ActionOutput,
        entity::{EntityKind, File, Id, Operation, Project, Readset, Sample, SoftFlag, Specimen},
        modification::{CascadeMode, ModificationAction, ModificationRequest},
    };
    use rstest::rstest;
    use serde_json::json;

    use super::{cascade_mode, modify};
    use crate::db::{
        Link, Store,
        error::Error,
        test_util::{id_by_name, project_id, store},
    };

    fn request(value: serde_json::Value) -> ModificationRequest {
        serde_json::from_value(value).unwrap()
    }

    fn apply(
        store: &Store,
        action: ModificationAction,
        value: serde_json::Value,
    ) -> Result<ActionOutput<String>, Error> {
        let request = request(value);
        store.transaction(|tx| modify(tx, action, &request))
    }

    fn flagged(store: &Store, kind: EntityKind, id: Id, flag: SoftFlag) -> bool {
        store.read(|tx| tx.is_flagged(kind, id, flag)).unwrap()
    }

    #[rstest]
    #[case(json!({"cascade": "cascade_up"}), Ok(CascadeMode::CascadeUp))]
    #[case(json!({"cascade": true}), Ok(CascadeMode::Cascade))]
    #[case(json!({"cascade_down": true}), Ok(CascadeMode::CascadeDown))]
    #[case(json!({}), Ok(CascadeMode::None))]
    #[case(
        json!({"cascade_up": true, "cascade_down": true}),
        Err(Error::request("Only one of 'cascade', 'cascade_up', or 'cascade_down' can be true."))
    )]
    fn cascade_forms(
        #[case] value: serde_json::Value,
        #[case] expected: Result<CascadeMode, Error>,
    ) {
        assert_eq!(cascade_mode(&request(value)), expected);
    }

    #[rstest]
    fn deleting_unknown_id_rolls_back(store: Store) {
        let sample = id_by_name::<Sample>(&store, "SA1");

        let result = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [
                {"table": "Sample", "id": [sample]},
                {"table": "Specimen", "id": [9999]}
            ]}),
        );

        assert_eq!(
            result.unwrap_err(),
            Error::did_not_find("Specimen", "id", 9999)
        );
        assert!(!flagged(
            &store,
            EntityKind::Sample,
            sample,
            SoftFlag::Deleted
        ));
    }

    #[rstest]
    fn empty_modification_list_is_rejected(store: Store) {
        let result = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": []}),
        );

        assert!(matches!(result, Err(Error::Request { .. })));
    }

    #[rstest]
    fn unknown_table_is_an_enum_error(store: Store) {
        let result = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "Banana", "id": [1]}]}),
        );

        assert!(matches!(result, Err(Error::EnumValue { .. })));
    }

    #[rstest]
    fn repeated_ids_are_modified_once(store: Store) {
        let sa1 = id_by_name::<Sample>(&store, "SA1");

        let output = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "Sample", "id": [sa1, sa1]}]}),
        )
        .unwrap();

        assert_eq!(output.output, [format!("'Sample' with id '{sa1}' deleted.")]);
        assert!(output.warnings.is_empty());
    }

    #[rstest]
    fn delete_cascades_up_only_when_all_siblings_are_deleted(store: Store) {
        let specimen = id_by_name::<Specimen>(&store, "SP1");
        let sa1 = id_by_name::<Sample>(&store, "SA1");
        let sa2 = id_by_name::<Sample>(&store, "SA2");

        let output = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "sample", "id": [sa1]}], "cascade_up": true}),
        )
        .unwrap();
        assert_eq!(output.output, [format!("'Sample' with id '{sa1}' deleted.")]);
        assert!(!flagged(
            &store,
            EntityKind::Specimen,
            specimen,
            SoftFlag::Deleted
        ));

        let output = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "sample", "id": [sa2]}], "cascade": "cascade_up"}),
        )
        .unwrap();
        assert_eq!(
            output.output,
            [
                format!("'Sample' with id '{sa2}' deleted."),
                format!("'Specimen' with id '{specimen}' deleted."),
            ]
        );

        // Undeleting one sample upwards brings its specimen back, not its sibling
        let output = apply(
            &store,
            ModificationAction::Undelete,
            json!({"modification": [{"table": "sample", "id": [sa2]}], "cascade_up": true}),
        )
        .unwrap();
        assert_eq!(
            output.output,
            [
                format!("'Sample' with id '{sa2}' undeleted."),
                format!("'Specimen' with id '{specimen}' undeleted."),
            ]
        );
        assert!(flagged(&store, EntityKind::Sample, sa1, SoftFlag::Deleted));
    }

    #[rstest]
    fn delete_up_stops_below_the_project(store: Store) {
        let project = project_id(&store);
        let specimens: Vec<Id> = ["SP1", "SP2", "SP3"]
            .into_iter()
            .map(|name| id_by_name::<Specimen>(&store, name))
            .collect();

        let output = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "Specimen", "id": specimens}], "cascade_up": true}),
        )
        .unwrap();

        assert_eq!(output.output.len(), 3);
        assert!(!flagged(
            &store,
            EntityKind::Project,
            project,
            SoftFlag::Deleted
        ));
    }

    #[rstest]
    fn delete_up_never_reaches_the_experiment(store: Store) {
        let rs3 = id_by_name::<Readset>(&store, "RS3");
        let sa3 = id_by_name::<Sample>(&store, "SA3");
        let sp2 = id_by_name::<Specimen>(&store, "SP2");
        let experiment = store
            .read(|tx| Ok(tx.fetch::<Readset>(rs3)?.experiment_id))
            .unwrap();

        let output = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "Readset", "id": [rs3]}], "cascade_up": true}),
        )
        .unwrap();

        assert_eq!(
            output.output,
            [
                format!("'Readset' with id '{rs3}' deleted."),
                format!("'Sample' with id '{sa3}' deleted."),
                format!("'Specimen' with id '{sp2}' deleted."),
            ]
        );
        assert!(!flagged(
            &store,
            EntityKind::Experiment,
            experiment,
            SoftFlag::Deleted
        ));
    }

    #[rstest]
    fn delete_down_then_undelete_restores_every_row(store: Store) {
        let specimen = id_by_name::<Specimen>(&store, "SP1");
        let readset_states = |store: &Store| {
            store
                .read(|tx| {
                    Ok(tx
                        .rows::<Readset>()?
                        .into_iter()
                        .map(|row| (row.id, row.state))
                        .collect::<Vec<_>>())
                })
                .unwrap()
        };
        let before = readset_states(&store);

        let deleted = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "Specimen", "id": [specimen]}], "cascade_down": true}),
        )
        .unwrap();
        assert!(deleted.output.len() > 3);
        for readset in ["RS1", "RS2"] {
            let id = id_by_name::<Readset>(&store, readset);
            assert!(flagged(&store, EntityKind::Readset, id, SoftFlag::Deleted));
        }
        let rs3 = id_by_name::<Readset>(&store, "RS3");
        assert!(!flagged(&store, EntityKind::Readset, rs3, SoftFlag::Deleted));

        let undeleted = apply(
            &store,
            ModificationAction::Undelete,
            json!({"modification": [{"table": "Specimen", "id": [specimen]}], "cascade_down": true}),
        )
        .unwrap();
        assert_eq!(undeleted.output.len(), deleted.output.len());

        assert_eq!(readset_states(&store), before);
    }

    #[rstest]
    fn deprecate_down_then_undeprecate(store: Store) {
        let specimen = id_by_name::<Specimen>(&store, "SP1");
        let rs1 = id_by_name::<Readset>(&store, "RS1");
        let body =
            json!({"modification": [{"table": "Specimen", "id": [specimen]}], "cascade": "cascade_down"});

        let deprecated = apply(&store, ModificationAction::Deprecate, body.clone()).unwrap();
        assert!(deprecated.output.contains(&format!("'Readset' with id '{rs1}' deprecated.")));
        assert!(flagged(&store, EntityKind::Readset, rs1, SoftFlag::Deprecated));
        assert!(!flagged(&store, EntityKind::Readset, rs1, SoftFlag::Deleted));

        let undeprecated = apply(&store, ModificationAction::Undeprecate, body).unwrap();
        assert_eq!(undeprecated.output.len(), deprecated.output.len());
        assert!(!flagged(&store, EntityKind::Readset, rs1, SoftFlag::Deprecated));
    }

    #[rstest]
    fn flags_are_independent(store: Store) {
        let sa1 = id_by_name::<Sample>(&store, "SA1");
        let body = json!({"modification": [{"table": "Sample", "id": [sa1]}]});

        apply(&store, ModificationAction::Deprecate, body.clone()).unwrap();
        apply(&store, ModificationAction::Delete, body.clone()).unwrap();
        assert!(flagged(&store, EntityKind::Sample, sa1, SoftFlag::Deprecated));
        assert!(flagged(&store, EntityKind::Sample, sa1, SoftFlag::Deleted));

        apply(&store, ModificationAction::Undelete, body).unwrap();
        assert!(flagged(&store, EntityKind::Sample, sa1, SoftFlag::Deprecated));
        assert!(!flagged(&store, EntityKind::Sample, sa1, SoftFlag::Deleted));
    }

    #[rstest]
    fn repeated_delete_warns(store: Store) {
        let sa1 = id_by_name::<Sample>(&store, "SA1");
        let body = json!({"modification": [{"table": "Sample", "id": [sa1]}]});

        apply(&store, ModificationAction::Deprecate, body.clone()).unwrap();
        let output = apply(&store, ModificationAction::Deprecate, body).unwrap();

        assert!(output.output.is_empty());
        assert_eq!(
            output.warnings,
            [format!("'Sample' with id '{sa1}' already deprecated. Skipping...")]
        );
    }

    #[rstest]
    fn missing_ids_warn(store: Store) {
        let output = apply(
            &store,
            ModificationAction::Delete,
            json!({"modification": [{"table": "Sample", "id": []}]}),
        )
        .unwrap();

        assert_eq!(
            output.warnings,
            ["No IDs provided for table 'Sample'. Skipping..."]
        );
    }

    #[rstest]
    fn edit_changes_a_column(store: Store) {
        let sa1 = id_by_name::<Sample>(&store, "SA1");
        let body = json!({"modification": [
            {"table": "Sample", "id": [sa1], "column": "name", "new": "SA1-renamed"}
        ]});

        let output = apply(&store, ModificationAction::Edit, body.clone()).unwrap();
        assert_eq!(
            output.output,
            [format!(
                "Table 'Sample' edited: column 'name' with id '{sa1}' changes from 'SA1' to \
                 'SA1-renamed'."
            )]
        );

        let output = apply(&store, ModificationAction::Edit, body).unwrap();
        assert_eq!(
            output.warnings,
            [format!(
                "Table 'Sample' with id '{sa1}' already has 'name' with value 'SA1-renamed'. \
                 Skipping..."
            )]
        );
    }

    #[rstest]
    #[case(json!("id"), json!(12))]
    #[case(json!("colour"), json!("blue"))]
    #[case(json!("specimen_id"), json!(9999))]
    fn invalid_edits_are_rejected(
        store: Store,
        #[case] column: serde_json::Value,
        #[case] new: serde_json::Value,
    ) {
        let sa1 = id_by_name::<Sample>(&store, "SA1");

        let result = apply(
            &store,
            ModificationAction::Edit,
            json!({"modification": [{"table": "Sample", "id": [sa1], "column": column, "new": new}]}),
        );

        assert!(matches!(
            result,
            Err(Error::Request { .. } | Error::DidNotFind { .. })
        ));
    }

    #[rstest]
    fn edit_into_a_taken_name_is_a_unique_error(store: Store) {
        let sa1 = id_by_name::<Sample>(&store, "SA1");

        let result = apply(
            &store,
            ModificationAction::Edit,
            json!({"modification": [{"table": "Sample", "id": [sa1], "column": "name", "new": "SA2"}]}),
        );

        assert!(matches!(result, Err(Error::UniqueConstraint { .. })));
    }

    #[rstest]
    fn edit_rejects_unknown_enum_value(store: Store) {
        let rs1 = id_by_name::<Readset>(&store, "RS1");

        let result = apply(
            &store,
            ModificationAction::Edit,
            json!({"modification": [{"table": "Readset", "id": [rs1], "column": "state", "new": "LOST"}]}),
        );

        assert!(matches!(result, Err(Error::EnumValue { .. })));
    }

    #[rstest]
    fn curate_removes_owned_rows(store: Store) {
        let sa1 = id_by_name::<Sample>(&store, "SA1");
        let rs1 = id_by_name::<Readset>(&store, "RS1");

        let output = apply(
            &store,
            ModificationAction::Curate,
            json!({"modification": [{"table": "Sample", "id": [sa1]}], "cascade_down": true}),
        )
        .unwrap();

        assert!(output.output.contains(&format!("'Readset' with id '{rs1}' permanently deleted.")));
        assert_eq!(
            output.output.last().unwrap(),
            &format!("'Sample' with id '{sa1}' permanently deleted.")
        );

        store
            .read(|tx| {
                assert!(tx.get::<Readset>(rs1)?.is_none());
                assert!(tx.rights_of(Link::ReadsetFile, rs1)?.is_empty());
                assert!(
                    tx.rows::<File>()?
                        .iter()
                        .all(|file| !file.name.starts_with("RS1"))
                );
                Ok(())
            })
            .unwrap();
    }

    #[rstest]
    fn curate_up_removes_childless_parent(store: Store) {
        let sa4 = id_by_name::<Sample>(&store, "SA4");
        let sp3 = id_by_name::<Specimen>(&store, "SP3");

        let output = apply(
            &store,
            ModificationAction::Curate,
            json!({"modification": [{"table": "Sample", "id": [sa4]}], "cascade_up": true}),
        )
        .unwrap();

        assert_eq!(
            output.output.last().unwrap(),
            &format!("'Specimen' with id '{sp3}' permanently deleted.")
        );
    }

    #[rstest]
    fn curate_up_keeps_the_project_and_its_operations(store: Store) {
        let project = project_id(&store);
        let specimens: Vec<Id> = ["SP1", "SP2", "SP3"]
            .into_iter()
            .map(|name| id_by_name::<Specimen>(&store, name))
            .collect();
        let operations = store
            .read(|tx| Ok(tx.rows::<Operation>()?.len()))
            .unwrap();

        apply(
            &store,
            ModificationAction::Curate,
            json!({"modification": [{"table": "Specimen", "id": specimens}], "cascade_up": true}),
        )
        .unwrap();

        store
            .read(|tx| {
                assert!(tx.get::<Project>(project)?.is_some());
                assert!(tx.rows::<Specimen>()?.is_empty());
                assert_eq!(tx.rows::<Operation>()?.len(), operations);
                Ok(())
            })
            .unwrap();
    }
}
