//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod client_credential_token_provider;
mod cron_recurrence_schedule;
mod graph_client;
mod graph_recycle_bin_gateway;
mod graph_storage_gateway;
mod remote_http;
mod sharepoint_recycle_bin_gateway;

#[cfg(test)]
mod test_support;

pub use client_credential_token_provider::{
    AccessTokenProvider, ClientCredential, ClientCredentialTokenProvider, DEFAULT_AUTHORITY_HOST,
    thumbprint_to_x5t,
};
pub use cron_recurrence_schedule::{CronRecurrenceSchedule, DEFAULT_CRON_SCHEDULE};
pub use graph_client::{GRAPH_BETA_BASE_URL, GRAPH_SCOPE, GRAPH_V1_BASE_URL, GraphClient};
pub use graph_recycle_bin_gateway::GraphRecycleBinGateway;
pub use graph_storage_gateway::GraphStorageGateway;
pub use remote_http::{REQUEST_TIMEOUT, build_http_client};
pub use sharepoint_recycle_bin_gateway::SharePointRecycleBinGateway;
