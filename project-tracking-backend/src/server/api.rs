use axum::{
    Router,
    routing::{get, post},
};
use project_tracking_core::model::{
    Endpoint,
    digest::{DigestKind, UnanalyzedRequest},
    entity::{File, Job, Metric, Operation, Readset, Sample, Specimen},
    ingest::{Genpipes, RunProcessing, Transfer},
    modification,
    route::{
        CREATE_PROJECT_ENDPOINT, listing_endpoint, project_endpoint, projects_endpoint,
        samples_pair_endpoint,
    },
};

use crate::db::route::Listing;

use super::AppState;
use handler::{
    create_project, digest_delivery, digest_pair_file, digest_readset_file, digest_unanalyzed,
    ingest, list, modify, project, projects, samples_pair,
};

mod error;
mod handler;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async {}))
        .route(CREATE_PROJECT_ENDPOINT, post(create_project))
        .route(&projects_endpoint(), get(projects))
        .route(&project_endpoint(), get(project))
        .route(&samples_pair_endpoint(), get(samples_pair))
        .route(&RunProcessing::endpoint(), post(ingest::<RunProcessing>))
        .route(&Transfer::endpoint(), post(ingest::<Transfer>))
        .route(&Genpipes::endpoint(), post(ingest::<Genpipes>))
        .route(
            &DigestKind::ReadsetFile.endpoint(),
            post(digest_readset_file),
        )
        .route(&DigestKind::PairFile.endpoint(), post(digest_pair_file))
        .route(&DigestKind::Delivery.endpoint(), post(digest_delivery))
        .route(&UnanalyzedRequest::endpoint(), post(digest_unanalyzed))
        .route(modification::ENDPOINT, post(modify))
        .route(&listing_endpoint(Specimen::PLURAL), get(list::<Specimen>))
        .route(&listing_endpoint(Sample::PLURAL), get(list::<Sample>))
        .route(&listing_endpoint(Readset::PLURAL), get(list::<Readset>))
        .route(&listing_endpoint(Operation::PLURAL), get(list::<Operation>))
        .route(&listing_endpoint(Job::PLURAL), get(list::<Job>))
        .route(&listing_endpoint(File::PLURAL), get(list::<File>))
        .route(&listing_endpoint(Metric::PLURAL), get(list::<Metric>))
}
