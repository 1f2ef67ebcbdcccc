//! Test fixtures and builder patterns for Pods and admission requests.

use k8s_openapi::api::core::v1::{Container, EnvVar, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::DynamicObject;
use notebook_env_injector::webhooks::{AdmissionRequest, AdmissionReview};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Builder for creating Pod test fixtures.
///
/// # Example
/// ```
/// let pod = PodBuilder::new("my-nb-0")
///     .namespace("kubeflow-user")
///     .label("notebook-name", "my-nb")
///     .container("notebook")
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct PodBuilder {
    name: String,
    namespace: Option<String>,
    labels: BTreeMap<String, String>,
    containers: Vec<Container>,
}

impl PodBuilder {
    /// Create a new builder with the given pod name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            labels: BTreeMap::new(),
            containers: Vec::new(),
        }
    }

    /// Set the namespace for the pod.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a single label.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a container with an empty env list.
    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.containers.push(Container {
            name: name.into(),
            env: Some(Vec::new()),
            ..Default::default()
        });
        self
    }

    /// Add a container with the given env entries.
    pub fn container_with_env(mut self, name: impl Into<String>, env: &[(&str, &str)]) -> Self {
        self.containers.push(Container {
            name: name.into(),
            env: Some(
                env.iter()
                    .map(|(k, v)| EnvVar {
                        name: k.to_string(),
                        value: Some(v.to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        });
        self
    }

    /// Build the Pod.
    pub fn build(self) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: self.namespace,
                labels: if self.labels.is_empty() {
                    None
                } else {
                    Some(self.labels)
                },
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: self.containers,
                ..Default::default()
            }),
            status: None,
        }
    }
}

/// Notebook pod as created by the notebook controller.
pub fn notebook_pod(namespace: &str, name: &str, notebook: &str) -> Pod {
    PodBuilder::new(name)
        .namespace(namespace)
        .label("notebook-name", notebook)
        .container("notebook")
        .build()
}

/// Wrap an arbitrary object in an AdmissionReview as the API server sends it.
pub fn review_json(uid: &str, object: Option<Value>) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": uid,
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "operation": "CREATE",
            "userInfo": {"username": "kubernetes-admin"},
            "object": object,
            "dryRun": false
        }
    })
}

/// AdmissionRequest carrying an arbitrary object payload.
pub fn raw_request(uid: &str, object: Option<Value>) -> AdmissionRequest<DynamicObject> {
    let review: AdmissionReview<DynamicObject> =
        serde_json::from_value(review_json(uid, object)).expect("valid admission review");
    review.try_into().expect("review carries a request")
}

/// AdmissionRequest carrying `pod`.
pub fn pod_request(uid: &str, pod: &Pod) -> AdmissionRequest<DynamicObject> {
    let object = serde_json::to_value(pod).expect("pod serializes");
    raw_request(uid, Some(object))
}

/// Decode the response patch into JSON.
pub fn patch_json(patch: &[u8]) -> Value {
    serde_json::from_slice(patch).expect("patch is valid JSON")
}
