//! Node queries.

use crate::models::{decode, Node, ResourceLink};
use crate::Result;
use ganeti_core::query::QueryParams;
use ganeti_core::types::decode_normalized;
use ganeti_core::ApiClient;
use serde_json::Value;

const ENDPOINT: &str = "nodes";

/// Operations under `nodes`.
#[derive(Clone, Copy)]
pub struct NodeService<'a> {
    api: &'a ApiClient,
}

impl<'a> NodeService<'a> {
    pub(crate) const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Names of all nodes.
    pub async fn node_names(&self) -> Result<Vec<String>> {
        let links: Vec<ResourceLink> = decode(self.api.get(ENDPOINT, &[]).await?, "node list")?;
        Ok(links.into_iter().map(|link| link.id).collect())
    }

    /// Full details of every node (`bulk=1`).
    pub async fn list_nodes(&self) -> Result<Vec<Node>> {
        let params = QueryParams::new().flag("bulk", true);
        let raw: Vec<Value> =
            decode(self.api.get(ENDPOINT, params.as_pairs()).await?, "node list")?;
        raw.into_iter()
            .map(|item| decode_normalized(item, "node"))
            .collect()
    }

    /// Details of one node.
    pub async fn get_node(&self, name: &str) -> Result<Node> {
        let endpoint = format!("{ENDPOINT}/{}", urlencoding::encode(name));
        let raw = self.api.get(&endpoint, &[]).await?;
        decode_normalized(raw, "node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeRole;
    use ganeti_core::{Error, RapiClientConfig};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_api(server: &MockServer) -> ApiClient {
        let config = RapiClientConfig::new(server.uri(), "admin", "secret").unwrap();
        ApiClient::new(config).unwrap()
    }

    fn node_json(name: &str, role: &str) -> Value {
        json!({
            "name": name,
            "offline": false,
            "master_candidate": role != "R",
            "drained": false,
            "dtotal": 102_400,
            "dfree": 51_200,
            "sptotal": 2,
            "spfree": 2,
            "mtotal": 32_768,
            "mnode": 1024,
            "mfree": 16_384,
            "pinst_cnt": 3,
            "sinst_cnt": 2,
            "ctotal": 8,
            "cnos": 1,
            "cnodes": 1,
            "csockets": 1,
            "pip": "192.168.1.200",
            "sip": "10.0.0.200",
            "role": role,
            "pinst_list": ["vm1.example.com"],
            "sinst_list": [],
            "master_capable": true,
            "vm_capable": true,
            "ndparams": {"spindle_count": 1},
            "group.uuid": "4d3bf3ba-972e-49b0-8680-f783fb07a048",
            "ctime": 1_650_000_000.0,
            "mtime": null,
            "uuid": "0b6c2f8e-95a4-4d8b-9c41-2b7a6f1e3d20",
            "serial_no": 12,
            "tags": []
        })
    }

    #[tokio::test]
    async fn node_names_extracts_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/nodes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "node1.example.com", "uri": "/2/nodes/node1.example.com"}
            ])))
            .mount(&server)
            .await;

        let api = test_api(&server);
        let names = NodeService::new(&api).node_names().await.unwrap();
        assert_eq!(names, vec!["node1.example.com"]);
    }

    #[tokio::test]
    async fn list_nodes_uses_bulk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/nodes"))
            .and(query_param("bulk", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                node_json("node1.example.com", "M"),
                node_json("node2.example.com", "R")
            ])))
            .mount(&server)
            .await;

        let api = test_api(&server);
        let nodes = NodeService::new(&api).list_nodes().await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].is_master());
        assert_eq!(nodes[1].role, NodeRole::Regular);
    }

    #[tokio::test]
    async fn get_node_decodes_group_uuid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/nodes/node1.example.com"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(node_json("node1.example.com", "C")),
            )
            .mount(&server)
            .await;

        let api = test_api(&server);
        let node = NodeService::new(&api)
            .get_node("node1.example.com")
            .await
            .unwrap();

        assert_eq!(node.pip, "192.168.1.200");
        assert_eq!(
            node.group_uuid.to_string(),
            "4d3bf3ba-972e-49b0-8680-f783fb07a048"
        );
        assert_eq!(node.role, NodeRole::Candidate);
        assert!(node.mtime.is_none());
        assert!(node.created_at().is_some());
    }

    #[tokio::test]
    async fn get_node_escapes_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/nodes/node%201%3Fbulk%3D1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(node_json("node 1?bulk=1", "R")))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server);
        let node = NodeService::new(&api).get_node("node 1?bulk=1").await.unwrap();
        assert_eq!(node.name, "node 1?bulk=1");
    }

    #[tokio::test]
    async fn get_node_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/nodes/node1.example.com"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let api = test_api(&server);
        let err = NodeService::new(&api)
            .get_node("node1.example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Server(_)));
        assert_eq!(err.message(), Some("Bad Gateway"));
    }
}
