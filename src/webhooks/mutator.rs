//! Notebook pod mutator.
//!
//! Pods labelled `notebook-name` get `NB_NAMESPACE` appended to the env of
//! their first container. Every other pod is admitted unchanged. The mutator
//! never denies; failures are returned as [`MutateError`] and the HTTP layer
//! decides how to report them.

use std::collections::{BTreeMap, HashMap};

use json_patch::Patch;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::core::{DynamicObject, Status};
use thiserror::Error;

use super::decode::{DecodeError, JsonPodDecoder, PodDecoder};
use super::log::{MutationLog, PodRef, TracingLog};
use super::patch::PodPatch;

/// Label whose presence marks a pod as a notebook workload
pub const NOTEBOOK_LABEL: &str = "notebook-name";
/// Audit annotation key recorded on mutated pods
pub const AUDIT_ANNOTATION_KEY: &str = "namespace-admission-controller";
/// Audit annotation value recorded on mutated pods
pub const AUDIT_ANNOTATION_VALUE: &str = "Added custom environment variables";

/// Errors returned by [`Mutator::mutate`]
#[derive(Error, Debug)]
pub enum MutateError {
    /// The pod payload could not be decoded
    #[error("unable to decode Pod: {0}")]
    Decode(#[from] DecodeError),

    /// The patch could not be serialized
    #[error(transparent)]
    Serialization(Box<dyn std::error::Error + Send + Sync>),
}

impl MutateError {
    fn serialization(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        MutateError::Serialization(Box::new(err))
    }
}

/// Replace underscores with hyphens.
///
/// Not used by the mutation path.
pub fn clean_name(name: &str) -> String {
    name.replace('_', "-")
}

/// Whether the pod carries the notebook label (any value)
pub fn is_notebook(labels: Option<&BTreeMap<String, String>>) -> bool {
    labels.is_some_and(|labels| labels.contains_key(NOTEBOOK_LABEL))
}

/// Admission mutator for notebook pods.
///
/// Stateless; one instance can serve any number of concurrent requests.
#[derive(Clone, Debug, Default)]
pub struct Mutator<D = JsonPodDecoder, L = TracingLog> {
    decoder: D,
    log: L,
}

impl<D: PodDecoder, L: MutationLog> Mutator<D, L> {
    /// Create a mutator with explicit decoder and log sink
    pub fn new(decoder: D, log: L) -> Self {
        Self { decoder, log }
    }

    /// Decide on an admission request.
    ///
    /// On error the request defaults (`uid`, `allowed = true`) are available
    /// through `AdmissionResponse::from(request)` but are not a decision.
    pub fn mutate(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<AdmissionResponse, MutateError> {
        let response = AdmissionResponse::from(request);

        let pod = self.decoder.decode(request.object.as_ref())?;

        let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
        let pod_ref = PodRef {
            namespace,
            name: pod.metadata.name.as_deref().unwrap_or_default(),
        };
        self.log.checking(&request.uid, pod_ref);

        let notebook = is_notebook(pod.metadata.labels.as_ref());
        self.log.classified(&request.uid, pod_ref, notebook);
        if !notebook {
            return Ok(response);
        }

        let operation = PodPatch::namespace_env(namespace)
            .into_operation()
            .map_err(MutateError::serialization)?;

        let mut response = response
            .with_patch(Patch(vec![operation]))
            .map_err(MutateError::serialization)?;
        response.audit_annotations = HashMap::from([(
            AUDIT_ANNOTATION_KEY.to_string(),
            AUDIT_ANNOTATION_VALUE.to_string(),
        )]);
        response.result = Status::success();

        Ok(response)
    }
}
