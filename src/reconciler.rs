//! Reconciliation of the remote blocklist against the router's managed records.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::error::Result;
use crate::fetcher::{BlocklistSource, RemoteBlocklist};
use crate::records::{ManagedSet, RecordId, RouterRecords};
use crate::routeros::RouterApi;
use crate::utils::{format_count, preview};

/// Hostnames shown per set at info level
const PREVIEW_LEN: usize = 10;

/// What has to change on the router.
///
/// `to_add` and `to_delete` are disjoint: a hostname present on both sides
/// belongs to neither difference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Remote hostnames with no managed record
    pub to_add: BTreeSet<String>,
    /// Managed records no longer listed remotely, with their router ids
    pub to_delete: BTreeMap<String, RecordId>,
}

impl Plan {
    pub fn compute(remote: &RemoteBlocklist, router: &RouterRecords) -> Self {
        let to_add = remote
            .iter()
            .filter(|host| !router.contains_key(*host))
            .cloned()
            .collect();

        let to_delete = router
            .iter()
            .filter(|(host, _)| !remote.contains(*host))
            .map(|(host, id)| (host.clone(), id.clone()))
            .collect();

        Self { to_add, to_delete }
    }

    /// Nothing to add and nothing to delete
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_delete.is_empty()
    }

    /// Router identifiers of the records to delete
    pub fn delete_ids(&self) -> impl Iterator<Item = &str> {
        self.to_delete.values().map(String::as_str)
    }

    /// Log the plan cardinalities (info) and contents (debug)
    pub fn log(&self) {
        info!("Records to add: {}", format_count(self.to_add.len()));
        info!("Records to delete: {}", format_count(self.to_delete.len()));
        if !self.to_delete.is_empty() {
            info!("Deleting: {}", preview(self.to_delete.keys(), PREVIEW_LEN));
        }
        debug!("Set to add: {:?}", self.to_add);
        debug!("Set to delete: {:?}", self.to_delete.keys().collect::<Vec<_>>());
    }
}

/// Fetch the remote list and read the router's managed records concurrently.
///
/// Fails with the first error from either side; the other is abandoned.
pub async fn gather(
    source: &dyn BlocklistSource,
    api: &dyn RouterApi,
    managed: &ManagedSet,
) -> Result<(RemoteBlocklist, RouterRecords)> {
    tokio::try_join!(source.fetch(), managed.read(api))
}

/// Gather both sides and compute the plan
pub async fn reconcile(
    source: &dyn BlocklistSource,
    api: &dyn RouterApi,
    managed: &ManagedSet,
) -> Result<Plan> {
    let (remote, router) = gather(source, api, managed).await?;
    let plan = Plan::compute(&remote, &router);
    plan.log();
    Ok(plan)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    use crate::error::AdisheError;

    /// In-memory blocklist source
    pub struct StaticSource {
        pub hosts: Option<RemoteBlocklist>,
        pub delay: Duration,
    }

    impl StaticSource {
        pub fn new(hosts: &[&str]) -> Self {
            Self {
                hosts: Some(hosts.iter().map(|h| h.to_string()).collect()),
                delay: Duration::ZERO,
            }
        }

        pub fn unreachable() -> Self {
            Self {
                hosts: None,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl BlocklistSource for StaticSource {
        async fn fetch(&self) -> Result<RemoteBlocklist> {
            tokio::time::sleep(self.delay).await;
            self.hosts
                .clone()
                .ok_or_else(|| AdisheError::fetch("https://list.invalid/hosts", "connection refused"))
        }
    }
}
