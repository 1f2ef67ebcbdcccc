// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for notebook-env-injector.
//!
//! Uses proptest to generate random pods and verify the mutator's invariants.

#[path = "../common/mod.rs"]
#[allow(dead_code)]
mod common;

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

use common::fixtures::{PodBuilder, patch_json, pod_request};
use notebook_env_injector::clean_name;
use notebook_env_injector::webhooks::{
    AUDIT_ANNOTATION_KEY, AUDIT_ANNOTATION_VALUE, Mutator, NOTEBOOK_LABEL,
};

/// Strategy for DNS-1123 style names.
fn dns_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}"
}

/// Strategy for label maps that never contain the notebook label.
fn plain_labels() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z][a-z0-9./-]{0,15}", "[a-zA-Z0-9_.-]{0,10}", 0..5)
        .prop_filter("notebook label excluded", |labels| {
            !labels.contains_key(NOTEBOOK_LABEL)
        })
}

fn build_pod(
    namespace: &str,
    name: &str,
    labels: &BTreeMap<String, String>,
    containers: usize,
) -> k8s_openapi::api::core::v1::Pod {
    let mut builder = PodBuilder::new(name).namespace(namespace);
    for (k, v) in labels {
        builder = builder.label(k.as_str(), v.as_str());
    }
    for i in 0..containers {
        builder = builder.container(format!("c{i}"));
    }
    builder.build()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Pods without the notebook label are admitted untouched
    #[test]
    fn non_notebook_pods_pass_through(
        uid in "[a-f0-9-]{0,36}",
        namespace in dns_name(),
        name in dns_name(),
        labels in plain_labels(),
        containers in 0usize..4,
    ) {
        let mutator: Mutator = Mutator::default();
        let pod = build_pod(&namespace, &name, &labels, containers);

        let response = mutator.mutate(&pod_request(&uid, &pod)).unwrap();

        prop_assert!(response.allowed);
        prop_assert_eq!(&response.uid, &uid);
        prop_assert!(response.patch.is_none());
        prop_assert!(response.audit_annotations.is_empty());
        prop_assert!(response.result.status.is_none());
    }

    /// Any notebook-name value triggers the single fixed patch
    #[test]
    fn notebook_pods_get_namespace_env(
        uid in "[a-f0-9-]{0,36}",
        namespace in dns_name(),
        name in dns_name(),
        notebook in "[a-zA-Z0-9_.-]{0,20}",
        labels in plain_labels(),
        containers in 0usize..4,
    ) {
        let mut labels = labels;
        labels.insert(NOTEBOOK_LABEL.to_string(), notebook);
        let mutator: Mutator = Mutator::default();
        let pod = build_pod(&namespace, &name, &labels, containers);

        let response = mutator.mutate(&pod_request(&uid, &pod)).unwrap();

        prop_assert!(response.allowed);
        prop_assert_eq!(&response.uid, &uid);
        prop_assert_eq!(
            patch_json(response.patch.as_ref().unwrap()),
            json!([{
                "op": "add",
                "path": "/spec/containers/0/env/-",
                "value": {"name": "NB_NAMESPACE", "value": namespace}
            }])
        );
        prop_assert_eq!(response.audit_annotations.len(), 1);
        prop_assert_eq!(
            response.audit_annotations.get(AUDIT_ANNOTATION_KEY).map(String::as_str),
            Some(AUDIT_ANNOTATION_VALUE)
        );
        prop_assert!(response.result.is_success());
    }

    /// Running twice on the same request gives identical responses
    #[test]
    fn mutation_is_idempotent(
        uid in "[a-f0-9-]{0,36}",
        namespace in dns_name(),
        notebook in prop::bool::ANY,
        labels in plain_labels(),
    ) {
        let mut labels = labels;
        if notebook {
            labels.insert(NOTEBOOK_LABEL.to_string(), "nb".to_string());
        }
        let mutator: Mutator = Mutator::default();
        let request = pod_request(&uid, &build_pod(&namespace, "pod", &labels, 1));

        let first = serde_json::to_value(mutator.mutate(&request).unwrap().into_review()).unwrap();
        let second = serde_json::to_value(mutator.mutate(&request).unwrap().into_review()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// clean_name only touches underscores
    #[test]
    fn clean_name_replaces_underscores(name in "\\PC{0,40}") {
        let cleaned = clean_name(&name);
        prop_assert!(!cleaned.contains('_'));
        prop_assert_eq!(cleaned.chars().count(), name.chars().count());
        for (before, after) in name.chars().zip(cleaned.chars()) {
            if before == '_' {
                prop_assert_eq!(after, '-');
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }
}
