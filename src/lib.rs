//! notebook-env-injector library crate
//!
//! This module exports the pod mutator, the webhook and health servers, and
//! process configuration.

pub mod config;
pub mod health;
pub mod webhooks;

pub use config::{Config, ConfigError, HEALTH_PORT, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT};
pub use health::HealthState;
pub use webhooks::{MutateError, Mutator, WebhookError, clean_name, run_webhook_server};
