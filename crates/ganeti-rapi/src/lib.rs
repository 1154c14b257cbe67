//! Typed client for the Ganeti Remote API (RAPI v2).
//!
//! [`GanetiRapiClient`] holds one authenticated session against a cluster and hands out
//! borrowing services for instances, jobs and nodes. Mutating calls return the id of the
//! queued job; [`JobService::wait_for_job`] polls that job until it finalizes.
//!
//! ```no_run
//! use ganeti_core::PollPolicy;
//! use ganeti_rapi::GanetiRapiClient;
//!
//! # async fn run() -> ganeti_rapi::Result<()> {
//! let client = GanetiRapiClient::connect("cluster.example.com:5080", "admin", "secret", true)?;
//! let job_id = client.instances().start_instance("vm1.example.com").await?;
//! let job = client.jobs().wait_for_job(job_id, &PollPolicy::default()).await?;
//! assert!(job.succeeded());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod instances;
pub mod jobs;
pub mod models;
pub mod nodes;

pub use client::{GanetiRapiClient, GanetiRapiClientBuilder};
pub use instances::InstanceService;
pub use jobs::{wait_for_job, JobService, JobSource};
pub use models::{
    BackendParams, CreateOptions, InstanceInfo, Job, JobId, JobLink, JobStatus, JobTimestamp,
    ModifyInstance, NewInstance, Node, NodeRole, ResourceLink,
};
pub use nodes::NodeService;

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = ganeti_core::Result<T>;
