//! RAPI record types.
//!
//! Each record declares its decoding schema explicitly. Dotted server keys (`nic.ips`) are
//! normalized to underscores before decoding, unknown top-level keys are ignored, and nested
//! values of the wrong shape are rejected.

use chrono::{DateTime, Utc};
use ganeti_core::types::epoch_to_datetime;
use ganeti_core::uuid::{DiskUuid, GroupUuid, InstanceUuid, NicUuid, NodeUuid};
use ganeti_core::{Error, Result};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Decode a raw RAPI value into `T`.
pub(crate) fn decode<T>(value: Value, what: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(value)
        .map_err(|err| Error::ParseError(format!("Failed to decode {what}: {err}")))
}

/// Identifier of a job in the cluster job queue.
///
/// RAPI reports job ids as JSON numbers in some places and numeric strings in others; both
/// decode to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// The raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct JobIdVisitor;

        impl de::Visitor<'_> for JobIdVisitor {
            type Value = JobId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a job id as a non-negative integer or numeric string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<JobId, E> {
                Ok(JobId(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<JobId, E> {
                u64::try_from(value)
                    .map(JobId)
                    .map_err(|_| E::custom(format!("negative job id {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<JobId, E> {
                value
                    .trim()
                    .parse()
                    .map(JobId)
                    .map_err(|_| E::custom(format!("invalid job id `{value}`")))
            }
        }

        deserializer.deserialize_any(JobIdVisitor)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet picked up
    Queued,
    /// Waiting for locks
    Waiting,
    /// Cancellation requested, not yet effective
    Canceling,
    /// Executing opcodes
    Running,
    /// Cancelled before completion
    Canceled,
    /// All opcodes succeeded
    Success,
    /// An opcode failed
    Error,
}

impl JobStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Waiting => "waiting",
            Self::Canceling => "canceling",
            Self::Running => "running",
            Self::Canceled => "canceled",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Queued, waiting or canceling.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::Waiting | Self::Canceling)
    }

    /// Canceled, success or error. A finalized job never changes state again.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        matches!(self, Self::Canceled | Self::Success | Self::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(seconds, microseconds)` pair used by the job queue.
pub type JobTimestamp = (i64, i64);

/// A job as reported by `GET jobs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Job id
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Submitted opcodes
    pub ops: Vec<Value>,
    /// Per-opcode status
    pub opstatus: Vec<Value>,
    /// Per-opcode result
    pub opresult: Vec<Value>,
    /// Human-readable opcode summaries
    #[serde(default)]
    pub summary: Vec<String>,
    /// When the job entered the queue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_ts: Option<JobTimestamp>,
    /// When execution started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ts: Option<JobTimestamp>,
    /// When execution finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<JobTimestamp>,
}

impl Job {
    /// See [`JobStatus::is_pending`].
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// See [`JobStatus::is_finalized`].
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.status.is_finalized()
    }

    /// True when the job finished successfully.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Success
    }

    /// Completion time, if the job has finished.
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.end_ts.and_then(|(secs, micros)| {
            let nanos = u32::try_from(micros.clamp(0, 999_999) * 1_000).ok()?;
            DateTime::from_timestamp(secs, nanos)
        })
    }
}

/// Entry of a plain (non-bulk) instance or node listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceLink {
    /// Resource name
    pub id: String,
    /// Resource URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Entry of the job listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobLink {
    /// Job id
    pub id: JobId,
    /// Job URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Backend (hypervisor-independent) parameters of an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendParams {
    /// Number of virtual CPUs
    pub vcpus: u32,
    /// Memory in MiB (older clusters only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// Minimum memory in MiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minmem: Option<u64>,
    /// Maximum memory in MiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    /// Fail over instead of migrating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_failover: Option<bool>,
    /// Take part in cluster balancing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_balance: Option<bool>,
    /// Spindles consumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spindle_use: Option<u32>,
}

/// Instance details as reported by `GET instances/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceInfo {
    /// Instance name
    pub name: String,
    /// Administrative state (`up`, `down`, `offline`)
    pub admin_state: String,
    /// Operating system definition
    pub os: String,
    /// Primary node
    pub pnode: String,
    /// Secondary nodes
    pub snodes: Vec<String>,
    /// Disk template (`drbd`, `plain`, ...)
    pub disk_template: String,

    /// NIC IP addresses
    pub nic_ips: Vec<Option<String>>,
    /// NIC MAC addresses
    pub nic_macs: Vec<String>,
    /// NIC modes
    pub nic_modes: Vec<String>,
    /// NIC UUIDs
    pub nic_uuids: Vec<NicUuid>,
    /// NIC names
    pub nic_names: Vec<Option<String>>,
    /// NIC links
    pub nic_links: Vec<String>,
    /// NIC network UUIDs
    pub nic_networks: Vec<Option<String>>,
    /// NIC network names
    pub nic_networks_names: Vec<Option<String>>,
    /// NIC bridges
    pub nic_bridges: Vec<Option<String>>,
    /// Console network port
    #[serde(default)]
    pub network_port: Option<u16>,

    /// Disk sizes in MiB
    pub disk_sizes: Vec<u64>,
    /// Disk spindles
    pub disk_spindles: Vec<Option<u64>>,
    /// Disk UUIDs
    pub disk_uuids: Vec<DiskUuid>,
    /// Disk names
    pub disk_names: Vec<Option<String>>,
    /// Total disk usage in MiB
    pub disk_usage: u64,

    /// Backend parameters
    pub beparams: BackendParams,
    /// Hypervisor parameters
    pub hvparams: Map<String, Value>,

    /// Whether the instance is actually running, unknown while its node is unreachable
    #[serde(default)]
    pub oper_state: Option<bool>,
    /// Memory in use, when running
    #[serde(default)]
    pub oper_ram: Option<u64>,
    /// vCPUs in use, when running
    #[serde(default)]
    pub oper_vcpus: Option<u32>,

    /// Combined status (`running`, `ADMIN_down`, `ERROR_down`, ...)
    pub status: String,
    /// Creation time (epoch seconds)
    #[serde(default)]
    pub ctime: Option<f64>,
    /// Last modification time (epoch seconds)
    #[serde(default)]
    pub mtime: Option<f64>,
    /// Instance UUID
    pub uuid: InstanceUuid,
    /// Configuration serial number
    pub serial_no: u64,
    /// Tags
    pub tags: Vec<String>,
}

impl InstanceInfo {
    /// True when the instance is running as intended.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.ctime.and_then(epoch_to_datetime)
    }

    /// Last modification time.
    #[must_use]
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.mtime.and_then(epoch_to_datetime)
    }
}

/// Definition of an instance to create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInstance {
    /// Instance name
    pub name: String,
    /// Disk template
    pub disk_template: String,
    /// Disk definitions (`size`, `mode`, ...)
    pub disks: Vec<Map<String, Value>>,
    /// NIC definitions (`link`, `ip`, `mac`, ...)
    pub nics: Vec<Map<String, Value>>,
    /// Operating system definition
    pub os: String,
    /// OS parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osparams: Option<Map<String, Value>>,
    /// Primary node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnode: Option<String>,
    /// Secondary node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snode: Option<String>,
    /// Hypervisor parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvparams: Option<Map<String, Value>>,
    /// Backend parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beparams: Option<BackendParams>,
}

/// Creation flags sent alongside a [`NewInstance`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CreateOptions {
    /// Check that the instance IP is not in use
    pub ip_check: bool,
    /// Check that the instance name resolves
    pub name_check: bool,
    /// Start the instance after creation
    pub start: bool,
    /// Ignore instance policy violations
    pub ignore_ipolicy: bool,
}

impl CreateOptions {
    /// Default flags: no IP or name check, start after creation, honour the policy.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ip_check: false,
            name_check: false,
            start: true,
            ignore_ipolicy: false,
        }
    }

    /// Set whether to check the IP.
    #[must_use]
    pub const fn with_ip_check(mut self, check: bool) -> Self {
        self.ip_check = check;
        self
    }

    /// Set whether to check the name.
    #[must_use]
    pub const fn with_name_check(mut self, check: bool) -> Self {
        self.name_check = check;
        self
    }

    /// Set whether to start the instance.
    #[must_use]
    pub const fn with_start(mut self, start: bool) -> Self {
        self.start = start;
        self
    }

    /// Set whether to ignore the instance policy.
    #[must_use]
    pub const fn with_ignore_ipolicy(mut self, ignore: bool) -> Self {
        self.ignore_ipolicy = ignore;
        self
    }
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of `POST instances`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateInstanceBody<'a> {
    #[serde(rename = "__version__")]
    pub version: u8,
    pub mode: &'static str,
    #[serde(flatten)]
    pub instance: &'a NewInstance,
    #[serde(flatten)]
    pub options: &'a CreateOptions,
}

/// Changes for `PUT instances/{name}/modify`.
///
/// Only fields that are set are sent. Parameters without a dedicated field go in `extra`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ModifyInstance {
    /// Backend parameter changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beparams: Option<Map<String, Value>>,
    /// Hypervisor parameter changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hvparams: Option<Map<String, Value>>,
    /// OS parameter changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osparams: Option<Map<String, Value>>,
    /// New OS definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    /// NIC modifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nics: Option<Vec<Value>>,
    /// Disk modifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disks: Option<Vec<Value>>,
    /// Additional parameters
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Role of a node in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Master node
    #[serde(rename = "M")]
    Master,
    /// Master candidate
    #[serde(rename = "C")]
    Candidate,
    /// Regular node
    #[serde(rename = "R")]
    Regular,
    /// Drained node
    #[serde(rename = "D")]
    Drained,
    /// Offline node
    #[serde(rename = "O")]
    Offline,
}

/// Node details as reported by `GET nodes/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node name
    pub name: String,
    /// Marked offline
    pub offline: bool,
    /// Master candidate flag
    pub master_candidate: bool,
    /// Drained flag
    pub drained: bool,
    /// Total disk in MiB
    #[serde(default)]
    pub dtotal: Option<u64>,
    /// Free disk in MiB
    #[serde(default)]
    pub dfree: Option<u64>,
    /// Total spindles
    #[serde(default)]
    pub sptotal: Option<u64>,
    /// Free spindles
    #[serde(default)]
    pub spfree: Option<u64>,
    /// Total memory in MiB
    #[serde(default)]
    pub mtotal: Option<u64>,
    /// Memory used by the node itself in MiB
    #[serde(default)]
    pub mnode: Option<u64>,
    /// Free memory in MiB
    #[serde(default)]
    pub mfree: Option<u64>,
    /// Number of primary instances
    pub pinst_cnt: u32,
    /// Number of secondary instances
    pub sinst_cnt: u32,
    /// Total CPUs
    #[serde(default)]
    pub ctotal: Option<u32>,
    /// CPUs reserved for the node
    #[serde(default)]
    pub cnos: Option<u32>,
    /// NUMA nodes
    #[serde(default)]
    pub cnodes: Option<u32>,
    /// CPU sockets
    #[serde(default)]
    pub csockets: Option<u32>,
    /// Primary IP
    pub pip: String,
    /// Secondary IP
    pub sip: String,
    /// Cluster role
    pub role: NodeRole,
    /// Primary instances
    pub pinst_list: Vec<String>,
    /// Secondary instances
    pub sinst_list: Vec<String>,
    /// May become master
    pub master_capable: bool,
    /// May host instances
    pub vm_capable: bool,
    /// Node parameters
    pub ndparams: Map<String, Value>,
    /// Owning node group
    pub group_uuid: GroupUuid,
    /// Creation time (epoch seconds)
    #[serde(default)]
    pub ctime: Option<f64>,
    /// Last modification time (epoch seconds)
    #[serde(default)]
    pub mtime: Option<f64>,
    /// Node UUID
    pub uuid: NodeUuid,
    /// Configuration serial number
    pub serial_no: u64,
    /// Tags
    pub tags: Vec<String>,
    /// Secondary IP, as reported by newer clusters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_ip: Option<String>,
}

impl Node {
    /// True for the cluster master.
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.role == NodeRole::Master
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.ctime.and_then(epoch_to_datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_id_accepts_numbers_and_strings() {
        assert_eq!(serde_json::from_value::<JobId>(json!(42)).unwrap(), JobId(42));
        assert_eq!(serde_json::from_value::<JobId>(json!("42")).unwrap(), JobId(42));
        assert!(serde_json::from_value::<JobId>(json!(-1)).is_err());
        assert!(serde_json::from_value::<JobId>(json!("abc")).is_err());
        assert!(serde_json::from_value::<JobId>(json!({"id": 1})).is_err());
    }

    #[test]
    fn job_status_sets_partition_states() {
        let all = [
            JobStatus::Queued,
            JobStatus::Waiting,
            JobStatus::Canceling,
            JobStatus::Running,
            JobStatus::Canceled,
            JobStatus::Success,
            JobStatus::Error,
        ];
        for status in all {
            assert!(!(status.is_pending() && status.is_finalized()), "{status}");
        }
        assert!(JobStatus::Queued.is_pending());
        assert!(JobStatus::Canceling.is_pending());
        assert!(JobStatus::Error.is_finalized());
        assert!(!JobStatus::Running.is_pending());
        assert!(!JobStatus::Running.is_finalized());
    }

    #[test]
    fn job_status_rejects_unknown_values() {
        assert!(serde_json::from_value::<JobStatus>(json!("paused")).is_err());
        assert_eq!(
            serde_json::from_value::<JobStatus>(json!("canceling")).unwrap(),
            JobStatus::Canceling
        );
    }

    #[test]
    fn job_finished_at() {
        let job: Job = serde_json::from_value(json!({
            "id": 7,
            "status": "success",
            "ops": [],
            "opstatus": [],
            "opresult": [],
            "end_ts": [1_700_000_000, 250_000]
        }))
        .unwrap();

        assert!(job.succeeded());
        let finished = job.finished_at().unwrap();
        assert_eq!(finished.timestamp(), 1_700_000_000);
        assert_eq!(finished.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn backend_params_reject_wrong_shape() {
        assert!(serde_json::from_value::<BackendParams>(json!("vcpus=2")).is_err());
        let params: BackendParams =
            serde_json::from_value(json!({"vcpus": 2, "maxmem": 2048, "spindle_use": 1}))
                .unwrap();
        assert_eq!(params.vcpus, 2);
        assert_eq!(params.maxmem, Some(2048));
    }

    #[test]
    fn create_body_layout() {
        let instance = NewInstance {
            name: "vm1.example.com".into(),
            disk_template: "plain".into(),
            disks: vec![json!({"size": 10240}).as_object().cloned().unwrap()],
            nics: vec![Map::new()],
            os: "debootstrap+default".into(),
            osparams: None,
            pnode: Some("node1.example.com".into()),
            snode: None,
            hvparams: None,
            beparams: None,
        };
        let options = CreateOptions::new().with_ip_check(true);
        let body = CreateInstanceBody {
            version: 1,
            mode: "create",
            instance: &instance,
            options: &options,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "__version__": 1,
                "mode": "create",
                "name": "vm1.example.com",
                "disk_template": "plain",
                "disks": [{"size": 10240}],
                "nics": [{}],
                "os": "debootstrap+default",
                "pnode": "node1.example.com",
                "ip_check": true,
                "name_check": false,
                "start": true,
                "ignore_ipolicy": false
            })
        );
    }

    #[test]
    fn modify_sends_only_set_fields() {
        let mut extra = Map::new();
        extra.insert("offline".into(), json!(false));
        let change = ModifyInstance {
            beparams: json!({"maxmem": 4096}).as_object().cloned(),
            extra,
            ..ModifyInstance::default()
        };

        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({"beparams": {"maxmem": 4096}, "offline": false})
        );
    }

    #[test]
    fn node_role_codes() {
        assert_eq!(serde_json::from_value::<NodeRole>(json!("M")).unwrap(), NodeRole::Master);
        assert_eq!(serde_json::from_value::<NodeRole>(json!("O")).unwrap(), NodeRole::Offline);
        assert!(serde_json::from_value::<NodeRole>(json!("X")).is_err());
    }
}
