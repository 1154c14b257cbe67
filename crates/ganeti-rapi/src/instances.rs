//! Instance operations.

use crate::models::{
    decode, CreateInstanceBody, CreateOptions, InstanceInfo, JobId, ModifyInstance, NewInstance,
    ResourceLink,
};
use crate::Result;
use ganeti_core::query::QueryParams;
use ganeti_core::types::decode_normalized;
use ganeti_core::ApiClient;
use serde_json::{json, Map, Value};
use tracing::debug;

const ENDPOINT: &str = "instances";

/// `instances/{name}` with the name escaped as one path segment.
fn instance_path(name: &str) -> String {
    format!("{ENDPOINT}/{}", urlencoding::encode(name))
}

/// Operations under `instances`.
///
/// Mutating calls return the id of the job the cluster queued for them.
#[derive(Clone, Copy)]
pub struct InstanceService<'a> {
    api: &'a ApiClient,
}

impl<'a> InstanceService<'a> {
    pub(crate) const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Names of all instances.
    pub async fn instance_names(&self) -> Result<Vec<String>> {
        let links: Vec<ResourceLink> =
            decode(self.api.get(ENDPOINT, &[]).await?, "instance list")?;
        Ok(links.into_iter().map(|link| link.id).collect())
    }

    /// Full details of every instance (`bulk=1`).
    pub async fn list_instances(&self) -> Result<Vec<InstanceInfo>> {
        let params = QueryParams::new().flag("bulk", true);
        let raw: Vec<Value> =
            decode(self.api.get(ENDPOINT, params.as_pairs()).await?, "instance list")?;
        raw.into_iter()
            .map(|item| decode_normalized(item, "instance"))
            .collect()
    }

    /// Details of one instance.
    pub async fn get_instance(&self, name: &str) -> Result<InstanceInfo> {
        let raw = self.api.get(&instance_path(name), &[]).await?;
        decode_normalized(raw, "instance")
    }

    /// Queue creation of a new instance.
    pub async fn create_instance(
        &self,
        instance: &NewInstance,
        options: &CreateOptions,
    ) -> Result<JobId> {
        let body = CreateInstanceBody {
            version: 1,
            mode: "create",
            instance,
            options,
        };
        debug!(instance = %instance.name, "creating instance");
        decode(self.api.post(ENDPOINT, &body).await?, "job id")
    }

    /// Queue a parameter change.
    pub async fn modify_instance(&self, name: &str, change: &ModifyInstance) -> Result<JobId> {
        let endpoint = format!("{}/modify", instance_path(name));
        decode(self.api.put(&endpoint, change).await?, "job id")
    }

    /// Queue removal of an instance.
    pub async fn delete_instance(&self, name: &str) -> Result<JobId> {
        decode(self.api.delete(&instance_path(name)).await?, "job id")
    }

    /// Queue startup.
    pub async fn start_instance(&self, name: &str) -> Result<JobId> {
        self.put_action(name, "startup").await
    }

    /// Queue shutdown.
    pub async fn stop_instance(&self, name: &str) -> Result<JobId> {
        self.put_action(name, "shutdown").await
    }

    /// Queue a reboot.
    pub async fn restart_instance(&self, name: &str) -> Result<JobId> {
        let endpoint = format!("{}/reboot", instance_path(name));
        decode(self.api.post(&endpoint, &Map::new()).await?, "job id")
    }

    /// Queue a live migration to the secondary node.
    pub async fn migrate_instance(&self, name: &str) -> Result<JobId> {
        self.put_action(name, "migrate").await
    }

    /// Queue a failover to the secondary node.
    pub async fn failover_instance(&self, name: &str) -> Result<JobId> {
        self.put_action(name, "failover").await
    }

    /// Queue growth of disk `disk_index` by `amount` MiB.
    pub async fn grow_instance_disk(
        &self,
        name: &str,
        disk_index: u32,
        amount: u64,
    ) -> Result<JobId> {
        let endpoint = format!("{}/disk/{disk_index}/grow", instance_path(name));
        decode(
            self.api.post(&endpoint, &json!({ "amount": amount })).await?,
            "job id",
        )
    }

    /// Queue an information-gathering job.
    ///
    /// With `static_only` the cluster reports configuration data without querying the
    /// hypervisor. The result is read from the finished job.
    pub async fn instance_info(&self, name: &str, static_only: bool) -> Result<JobId> {
        let params = QueryParams::new().flag("static", static_only);
        let endpoint = format!("{}/info", instance_path(name));
        decode(
            self.api.get(&endpoint, params.as_pairs()).await?,
            "job id",
        )
    }

    async fn put_action(&self, name: &str, action: &str) -> Result<JobId> {
        let endpoint = format!("{}/{action}", instance_path(name));
        decode(self.api.put(&endpoint, &Map::new()).await?, "job id")
    }
}
