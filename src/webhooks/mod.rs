//! Webhook module for mutating admission requests.
//!
//! Pods labelled `notebook-name` get the `NB_NAMESPACE` environment variable
//! injected into their first container. All other pods pass through unchanged.

pub mod decode;
pub mod log;
pub mod mutator;
pub mod patch;
mod server;

pub use decode::{DecodeError, JsonPodDecoder, PodDecoder};
pub use log::{MutationLog, PodRef, TracingLog};
pub use mutator::{
    AUDIT_ANNOTATION_KEY, AUDIT_ANNOTATION_VALUE, MutateError, Mutator, NOTEBOOK_LABEL, clean_name,
    is_notebook,
};
pub use patch::{NAMESPACE_ENV_VAR, PodPatch};
pub use server::{WebhookError, WebhookState, create_webhook_router, run_webhook_server};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
