//! Admission webhook server.
//!
//! Provides the HTTP endpoint for the notebook MutatingWebhookConfiguration.
//!
//! To enable the webhook:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a MutatingWebhookConfiguration pointing at `/mutate`
//! 3. Mount the TLS certificate secret to the pod at /etc/webhook/certs/
//!
//! The webhook server starts automatically when certificates are present.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use axum_server::tls_rustls::RustlsConfig;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::health::{AdmissionOutcome, HealthState};
use crate::webhooks::mutator::{MutateError, Mutator};

/// Shared state for webhook handlers
pub struct WebhookState {
    pub mutator: Mutator,
    pub health: Arc<HealthState>,
}

impl WebhookState {
    pub fn new(health: Arc<HealthState>) -> Self {
        Self {
            mutator: Mutator::default(),
            health,
        }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(mutate_pod))
        .with_state(state)
}

/// Mutating admission handler for Pods
pub(crate) async fn mutate_pod(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            state
                .health
                .metrics
                .record_admission(AdmissionOutcome::Error, 0.0);
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    let uid = &request.uid;
    debug!(
        uid = %uid,
        operation = ?request.operation,
        namespace = ?request.namespace,
        name = ?request.name,
        "Processing admission request"
    );

    let started = Instant::now();
    let result = state.mutator.mutate(&request);
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(response) => {
            let outcome = if response.patch.is_some() {
                AdmissionOutcome::Mutated
            } else {
                AdmissionOutcome::Skipped
            };
            state.health.metrics.record_admission(outcome, elapsed);
            info!(uid = %uid, outcome = %outcome, "Admission request allowed");
            (StatusCode::OK, Json(response.into_review()))
        }
        Err(e @ MutateError::Decode(_)) => {
            state
                .health
                .metrics
                .record_admission(AdmissionOutcome::Error, elapsed);
            warn!(uid = %uid, error = %e, "Admission request denied");
            (
                StatusCode::OK,
                Json(AdmissionResponse::from(&request).deny(e).into_review()),
            )
        }
        Err(e) => {
            state
                .health
                .metrics
                .record_admission(AdmissionOutcome::Error, elapsed);
            error!(uid = %uid, error = %e, "Failed to build admission response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AdmissionResponse::invalid(e).into_review()),
            )
        }
    }
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[source] std::io::Error),

    /// Server error
    #[error("Webhook server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0:`port` and serves the /mutate endpoint. The health
/// state is marked ready once the certificates are loaded.
///
/// # Arguments
/// * `health` - Shared health state for readiness and metrics
/// * `port` - Port to listen on
/// * `cert_path` - Path to TLS certificate file (PEM format)
/// * `key_path` - Path to TLS private key file (PEM format)
pub async fn run_webhook_server(
    health: Arc<HealthState>,
    port: u16,
    cert_path: &Path,
    key_path: &Path,
) -> Result<(), WebhookError> {
    let state = Arc::new(WebhookState::new(health.clone()));
    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(WebhookError::TlsConfig)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Webhook server listening with TLS");
    health.set_ready(true).await;

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(WebhookError::Server)?;

    Ok(())
}
