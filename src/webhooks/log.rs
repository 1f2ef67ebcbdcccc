//! Logging sink for mutation decisions.

use std::fmt;

use tracing::info;

/// `namespace/name` of the pod under review
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PodRef<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
}

impl fmt::Display for PodRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Receives the mutator's diagnostic events.
///
/// Implementations must not panic; the mutator ignores the sink when deciding.
pub trait MutationLog: Send + Sync {
    /// A pod was decoded and is about to be classified
    fn checking(&self, uid: &str, pod: PodRef<'_>);

    /// Classification finished
    fn classified(&self, uid: &str, pod: PodRef<'_>, notebook: bool);
}

/// Default sink emitting `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl MutationLog for TracingLog {
    fn checking(&self, uid: &str, pod: PodRef<'_>) {
        info!(uid = %uid, pod = %pod, "Check pod for notebook name");
    }

    fn classified(&self, uid: &str, pod: PodRef<'_>, notebook: bool) {
        if notebook {
            info!(uid = %uid, pod = %pod, "Found notebook name");
        } else {
            info!(uid = %uid, pod = %pod, "Notebook name not found");
        }
    }
}
