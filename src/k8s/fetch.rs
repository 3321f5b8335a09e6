use futures::future::{BoxFuture, FutureExt};
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{api::ListParams, Api, Client};
use thiserror::Error;

use super::replicaset_pods::PodSource;

/// Pods are listed in pages of this size
pub const FETCH_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("ReplicaSet {namespace}/{name} has an empty selector")]
    EmptySelector { namespace: String, name: String },
    #[error("Unsupported selector operator '{operator}' for key '{key}'")]
    InvalidSelector { key: String, operator: String },
}

/// Fetches the pods a replica set selects, straight from the API server.
#[derive(Clone)]
pub struct ReplicaSetPodFetcher {
    client: Client,
}

impl ReplicaSetPodFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, namespace: &str, name: &str) -> Result<Vec<Pod>, FetchError> {
        let replica_sets: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        let replica_set = replica_sets.get(name).await?;

        let selector = replica_set
            .spec
            .as_ref()
            .map(|spec| label_selector_string(&spec.selector))
            .transpose()?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FetchError::EmptySelector {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let mut params = ListParams::default()
            .labels(&selector)
            .limit(FETCH_PAGE_SIZE);
        let mut items = Vec::new();

        loop {
            let page = pods.list(&params).await?;
            items.extend(page.items);

            match page.metadata.continue_.filter(|token| !token.is_empty()) {
                Some(token) => params = params.continue_token(&token),
                None => break,
            }
        }

        tracing::debug!(namespace, replica_set = name, %selector, count = items.len(), "fetched pods");
        Ok(items)
    }
}

impl PodSource for ReplicaSetPodFetcher {
    type Error = FetchError;

    fn fetch_raw_pods<'a>(
        &'a self,
        namespace: &'a str,
        replica_set: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Pod>, Self::Error>> {
        self.fetch(namespace, replica_set).boxed()
    }
}

/// Renders a label selector in the syntax accepted by list calls,
/// e.g. `app=web,tier in (front,back),!canary`.
pub fn label_selector_string(selector: &LabelSelector) -> Result<String, FetchError> {
    let mut terms = Vec::new();

    if let Some(labels) = &selector.match_labels {
        // BTreeMap iterates in key order
        terms.extend(labels.iter().map(|(k, v)| format!("{}={}", k, v)));
    }

    for expr in selector.match_expressions.iter().flatten() {
        let values = expr.values.as_deref().unwrap_or_default().join(",");
        let term = match expr.operator.as_str() {
            "In" => format!("{} in ({})", expr.key, values),
            "NotIn" => format!("{} notin ({})", expr.key, values),
            "Exists" => expr.key.clone(),
            "DoesNotExist" => format!("!{}", expr.key),
            other => {
                return Err(FetchError::InvalidSelector {
                    key: expr.key.clone(),
                    operator: other.to_string(),
                })
            }
        };
        terms.push(term);
    }

    Ok(terms.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::replicaset_pods::get_replica_set_pods;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelectorRequirement;
    use kube::Config;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PODS_PATH: &str = "/api/v1/namespaces/ns/pods";

    fn fetcher_for(server: &MockServer) -> ReplicaSetPodFetcher {
        let config = Config::new(server.uri().parse().unwrap());
        ReplicaSetPodFetcher::new(Client::try_from(config).unwrap())
    }

    fn replica_set_json(name: &str, selector: Value) -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "ReplicaSet",
            "metadata": { "name": name, "namespace": "ns" },
            "spec": { "selector": selector }
        })
    }

    fn pod_json(name: &str, restarts: i32) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name, "namespace": "ns" },
            "status": {
                "containerStatuses": [{
                    "name": "app",
                    "image": "web:1.0",
                    "imageID": "",
                    "ready": true,
                    "restartCount": restarts
                }]
            }
        })
    }

    fn pod_list_json(items: Vec<Value>, continue_token: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "PodList",
            "metadata": { "continue": continue_token },
            "items": items
        })
    }

    async fn mount_replica_set(server: &MockServer, name: &str, selector: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/apis/apps/v1/namespaces/ns/replicasets/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(replica_set_json(name, selector)))
            .mount(server)
            .await;
    }

    fn requirement(key: &str, operator: &str, values: &[&str]) -> LabelSelectorRequirement {
        LabelSelectorRequirement {
            key: key.to_string(),
            operator: operator.to_string(),
            values: if values.is_empty() {
                None
            } else {
                Some(values.iter().map(|v| v.to_string()).collect())
            },
        }
    }

    #[test]
    fn test_match_labels_sorted_by_key() {
        let selector = LabelSelector {
            match_labels: Some(BTreeMap::from([
                ("tier".to_string(), "front".to_string()),
                ("app".to_string(), "web".to_string()),
            ])),
            match_expressions: None,
        };
        assert_eq!(label_selector_string(&selector).unwrap(), "app=web,tier=front");
    }

    #[test]
    fn test_match_expressions() {
        let selector = LabelSelector {
            match_labels: Some(BTreeMap::from([("app".to_string(), "web".to_string())])),
            match_expressions: Some(vec![
                requirement("tier", "In", &["front", "back"]),
                requirement("env", "NotIn", &["dev"]),
                requirement("team", "Exists", &[]),
                requirement("canary", "DoesNotExist", &[]),
            ]),
        };
        assert_eq!(
            label_selector_string(&selector).unwrap(),
            "app=web,tier in (front,back),env notin (dev),team,!canary"
        );
    }

    #[test]
    fn test_empty_selector_renders_empty() {
        assert_eq!(label_selector_string(&LabelSelector::default()).unwrap(), "");
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let selector = LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![requirement("app", "Matches", &["w.*"])]),
        };
        let err = label_selector_string(&selector).unwrap_err();
        assert!(matches!(err, FetchError::InvalidSelector { ref operator, .. } if operator == "Matches"));
        assert_eq!(err.to_string(), "Unsupported selector operator 'Matches' for key 'app'");
    }

    #[test]
    fn test_empty_selector_error_message() {
        let err = FetchError::EmptySelector {
            namespace: "default".to_string(),
            name: "web".to_string(),
        };
        assert_eq!(err.to_string(), "ReplicaSet default/web has an empty selector");
    }

    #[tokio::test]
    async fn test_fetch_follows_continue_tokens() {
        let server = MockServer::start().await;
        mount_replica_set(&server, "web", json!({ "matchLabels": { "app": "web" } })).await;

        Mock::given(method("GET"))
            .and(path(PODS_PATH))
            .and(query_param("labelSelector", "app=web"))
            .and(query_param_is_missing("continue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod_list_json(
                vec![pod_json("a", 0), pod_json("b", 2)],
                "tok",
            )))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PODS_PATH))
            .and(query_param("labelSelector", "app=web"))
            .and(query_param("continue", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod_list_json(vec![pod_json("c", 3)], "")))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let raw = fetcher.fetch_raw_pods("ns", "web").await.unwrap();
        let fetched: Vec<_> = raw.iter().filter_map(|p| p.metadata.name.as_deref()).collect();
        assert_eq!(fetched, vec!["a", "b", "c"]);

        let ranked = get_replica_set_pods(&fetcher, "ns", "web", 2).await.unwrap();
        let names: Vec<_> = ranked.pods.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_missing_replica_set_is_kube_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apis/apps/v1/namespaces/ns/replicasets/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "apiVersion": "v1",
                "kind": "Status",
                "status": "Failure",
                "message": "replicasets.apps \"missing\" not found",
                "reason": "NotFound",
                "code": 404
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PODS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod_list_json(Vec::new(), "")))
            .expect(0)
            .mount(&server)
            .await;

        let err = fetcher_for(&server).fetch_raw_pods("ns", "missing").await.unwrap_err();
        assert!(
            matches!(err, FetchError::Kube(kube::Error::Api(ref response)) if response.code == 404),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_replica_set_with_empty_selector_is_rejected() {
        let server = MockServer::start().await;
        mount_replica_set(&server, "empty", json!({})).await;
        Mock::given(method("GET"))
            .and(path(PODS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod_list_json(Vec::new(), "")))
            .expect(0)
            .mount(&server)
            .await;

        let err = fetcher_for(&server).fetch_raw_pods("ns", "empty").await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::EmptySelector { ref namespace, ref name } if namespace == "ns" && name == "empty"
        ));
        assert_eq!(err.to_string(), "ReplicaSet ns/empty has an empty selector");
    }
}
