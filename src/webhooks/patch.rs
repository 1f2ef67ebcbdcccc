//! Typed JSON-Patch operations emitted by the mutator.

use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, PatchOperation};
use k8s_openapi::api::core::v1::EnvVar;

/// Environment variable carrying the pod's namespace
pub const NAMESPACE_ENV_VAR: &str = "NB_NAMESPACE";

/// A single edit the mutator may apply to a Pod.
#[derive(Clone, Debug, PartialEq)]
pub enum PodPatch {
    /// Append `env` to the env list of the container at index `container`.
    AppendEnv { container: usize, env: EnvVar },
}

impl PodPatch {
    /// `NB_NAMESPACE=<namespace>` appended to the first container.
    ///
    /// The container count is never checked here; a pod without containers
    /// fails when the API server applies the patch.
    pub fn namespace_env(namespace: &str) -> Self {
        PodPatch::AppendEnv {
            container: 0,
            env: EnvVar {
                name: NAMESPACE_ENV_VAR.to_string(),
                value: Some(namespace.to_string()),
                ..Default::default()
            },
        }
    }

    /// JSON pointer targeted by this operation
    pub fn path(&self) -> PointerBuf {
        match self {
            PodPatch::AppendEnv { container, .. } => {
                let index = container.to_string();
                PointerBuf::from_tokens(["spec", "containers", index.as_str(), "env", "-"])
            }
        }
    }

    /// Render as an RFC 6902 operation.
    pub fn into_operation(self) -> Result<PatchOperation, serde_json::Error> {
        let path = self.path();
        match self {
            PodPatch::AppendEnv { env, .. } => Ok(PatchOperation::Add(AddOperation {
                path,
                value: serde_json::to_value(env)?,
            })),
        }
    }
}
