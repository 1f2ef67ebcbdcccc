//! Pod decoding for admission payloads.
//!
//! The admission request carries the Pod as an untyped object. Decoding it
//! into a typed [`Pod`] is kept behind [`PodDecoder`] so the mutator never
//! touches serde directly.

use k8s_openapi::api::core::v1::Pod;
use kube::core::DynamicObject;
use thiserror::Error;

/// Errors raised while decoding the Pod payload
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The admission request did not carry an object
    #[error("admission request has no object")]
    MissingObject,

    /// The payload is not JSON or does not match the Pod schema
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodes the raw admission object into a Pod.
pub trait PodDecoder: Send + Sync {
    fn decode(&self, object: Option<&DynamicObject>) -> Result<Pod, DecodeError>;
}

/// Schema-aware JSON decoder backed by the k8s-openapi Pod type.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPodDecoder;

impl JsonPodDecoder {
    /// Decode a Pod from serialized bytes as they appear on the wire.
    pub fn decode_bytes(&self, raw: &[u8]) -> Result<Pod, DecodeError> {
        Ok(serde_json::from_slice(raw)?)
    }
}

impl PodDecoder for JsonPodDecoder {
    fn decode(&self, object: Option<&DynamicObject>) -> Result<Pod, DecodeError> {
        let object = object.ok_or(DecodeError::MissingObject)?;
        let value = serde_json::to_value(object)?;
        Ok(serde_json::from_value(value)?)
    }
}
