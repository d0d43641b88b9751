//! The HTTP server which receives trigger push deliveries.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{AddExtensionLayer, Router};
use futures::prelude::*;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::dataform::DataformClient;
use crate::error::TriggerError;
use crate::event::PushEnvelope;
use crate::pipeline::PipelineCtl;

/// Spawn the HTTP server which receives Pub/Sub push deliveries.
pub fn spawn_server(config: Arc<Config>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<Result<()>> {
    let pipeline = Arc::new(PipelineCtl::new(config.clone(), DataformClient::new()));
    let app = Router::new()
        .route("/", post(handle_push))
        .route("/health", get(|| async { StatusCode::OK }))
        .layer(AddExtensionLayer::new(pipeline));
    let server = axum::Server::bind(&([0, 0, 0, 0], config.http_port).into())
        .serve(app.into_make_service())
        .with_graceful_shutdown(async move {
            let _res = shutdown.recv().await;
        });
    tracing::info!("trigger server is listening at 0.0.0.0:{}", config.http_port);
    tokio::spawn(server.map_err(anyhow::Error::from))
}

/// Handle a push delivery by running one pipeline instance for it.
///
/// A non-success status causes the subscription to consider the delivery failed and to redeliver
/// per its own policy.
#[tracing::instrument(level = "debug", skip(pipeline, envelope))]
async fn handle_push(Extension(pipeline): Extension<Arc<PipelineCtl<DataformClient>>>, Json(envelope): Json<PushEnvelope>) -> StatusCode {
    match pipeline.execute(&envelope, time::OffsetDateTime::now_utc()).await {
        Ok(_invocation) => StatusCode::NO_CONTENT,
        Err(err) => {
            tracing::error!(error = ?err, "error processing trigger delivery");
            status_for(&err)
        }
    }
}

/// Map a pipeline error onto the response status of the delivery.
///
/// Malformed events are reported as client errors since redelivery cannot fix them; remote
/// failures are reported as gateway errors so the delivery is retried.
fn status_for(err: &TriggerError) -> StatusCode {
    match err {
        TriggerError::Decode(_) | TriggerError::Schema => StatusCode::BAD_REQUEST,
        TriggerError::Remote { .. } | TriggerError::MalformedResponse(_) | TriggerError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}
