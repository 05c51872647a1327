use std::fmt::Debug;

use axum::{
    Json,
    extract::{
        FromRequest, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use garde::Validate;
use project_tracking_core::model::{
    ActionOutput,
    digest::{
        DeliveryOutput, DigestRequest, PairRecord, ReadsetFileRecord, UnanalyzedOutput,
        UnanalyzedRequest,
    },
    entity::{Project, Row, Sample},
    modification::{ModificationAction, ModificationRequest},
    route::{ListingQuery, NewProject, PairQuery},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    db::{
        digest,
        ingest::Ingest,
        modification,
        route::{self, Listing, project_id},
    },
    server::AppState,
};

use super::error::Result;

pub(super) struct ValidJson<T>(T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: Validate,
    <T as Validate>::Context: std::default::Default,
{
    type Rejection = super::error::Error;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let axum::Json(data) = axum::Json::<T>::from_request(req, state).await?;
        data.validate()?;

        Ok(Self(data))
    }
}

pub(super) async fn create_project(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
    query: std::result::Result<Query<NewProject>, QueryRejection>,
) -> Result<Json<ActionOutput<Row<Project>>>> {
    let Query(new_project) = query?;
    tracing::info!(%name, ?new_project);

    let output = app_state
        .store
        .spawn(move |store| store.transaction(|tx| route::create_project(tx, &name, &new_project)))
        .await?;

    Ok(Json(output))
}

pub(super) async fn projects(
    State(app_state): State<AppState>,
) -> Result<Json<ActionOutput<Row<Project>>>> {
    let output = app_state
        .store
        .spawn(|store| store.read(route::projects))
        .await?;

    Ok(Json(output))
}

pub(super) async fn project(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
) -> Result<Json<ActionOutput<Row<Project>>>> {
    tracing::info!(%project);

    let output = app_state
        .store
        .spawn(move |store| {
            store.read(|tx| {
                let project_id = project_id(tx, &project)?;
                route::project(tx, project_id)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn list<T: Listing>(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
    query: std::result::Result<Query<ListingQuery>, QueryRejection>,
) -> Result<Json<ActionOutput<Value>>> {
    let Query(query) = query?;
    tracing::info!(%project, listing = T::PLURAL, ?query);

    let output = app_state
        .store
        .spawn(move |store| {
            store.read(|tx| {
                let project_id = project_id(tx, &project)?;
                route::list::<T>(tx, project_id, &query)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn samples_pair(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
    query: std::result::Result<Query<PairQuery>, QueryRejection>,
) -> Result<Json<ActionOutput<Row<Sample>>>> {
    let Query(query) = query?;
    tracing::info!(%project, ?query);

    let output = app_state
        .store
        .spawn(move |store| {
            store.read(|tx| {
                let project_id = project_id(tx, &project)?;
                route::samples_pair(tx, project_id, &query)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn ingest<Payload>(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
    ValidJson(payload): ValidJson<Payload>,
) -> Result<Json<ActionOutput<Value>>>
where
    Payload: Ingest + Validate + DeserializeOwned + Debug + Send + 'static,
    <Payload as Validate>::Context: std::default::Default,
{
    tracing::info!(%project, deserialized_payload = ?payload);

    let output = app_state
        .store
        .spawn(move |store| {
            store.transaction(|tx| {
                let project_id = project_id(tx, &project)?;
                payload.ingest(tx, project_id)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn digest_readset_file(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
    ValidJson(request): ValidJson<DigestRequest>,
) -> Result<Json<ActionOutput<ReadsetFileRecord>>> {
    tracing::info!(%project, deserialized_request = ?request);

    let output = app_state
        .store
        .spawn(move |store| {
            store.read(|tx| {
                let project_id = project_id(tx, &project)?;
                digest::digest_readset_file(tx, project_id, &request)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn digest_pair_file(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
    ValidJson(request): ValidJson<DigestRequest>,
) -> Result<Json<ActionOutput<PairRecord>>> {
    tracing::info!(%project, deserialized_request = ?request);

    let complete_only = app_state.config.pair_file_complete_only();
    let output = app_state
        .store
        .spawn(move |store| {
            store.read(|tx| {
                let project_id = project_id(tx, &project)?;
                digest::digest_pair_file(tx, project_id, &request, complete_only)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn digest_unanalyzed(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
    ValidJson(request): ValidJson<UnanalyzedRequest>,
) -> Result<Json<ActionOutput<UnanalyzedOutput>>> {
    tracing::info!(%project, deserialized_request = ?request);

    let output = app_state
        .store
        .spawn(move |store| {
            store.read(|tx| {
                let project_id = project_id(tx, &project)?;
                digest::digest_unanalyzed(tx, project_id, &request)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn digest_delivery(
    State(app_state): State<AppState>,
    Path(project): Path<String>,
    ValidJson(request): ValidJson<DigestRequest>,
) -> Result<Json<ActionOutput<DeliveryOutput>>> {
    tracing::info!(%project, deserialized_request = ?request);

    let output = app_state
        .store
        .spawn(move |store| {
            store.read(|tx| {
                let project_id = project_id(tx, &project)?;
                digest::digest_delivery(tx, project_id, &request)
            })
        })
        .await?;

    Ok(Json(output))
}

pub(super) async fn modify(
    State(app_state): State<AppState>,
    action: std::result::Result<Path<ModificationAction>, PathRejection>,
    request: std::result::Result<Json<ModificationRequest>, JsonRejection>,
) -> Result<Json<ActionOutput<String>>> {
    let Path(action) = action?;
    let Json(request) = request?;
    tracing::info!(%action, deserialized_request = ?request);

    let output = app_state
        .store
        .spawn(move |store| {
            if request.dry_run {
                store.dry_run(|tx| modification::modify(tx, action, &request))
            } else {
                store.transaction(|tx| modification::modify(tx, action, &request))
            }
        })
        .await?;

    Ok(Json(output))
}
