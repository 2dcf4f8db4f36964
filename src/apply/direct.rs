//! Direct apply: live API calls only.

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{remove_obsolete, Applied, ApplyStrategy};
use crate::error::{AdisheError, Result};
use crate::records::ManagedSet;
use crate::reconciler::Plan;
use crate::routeros::RouterApi;
use crate::utils::format_count;

/// Adds one record per API call; removal and additions run side by side
pub struct DirectApply {
    managed: ManagedSet,
}

impl DirectApply {
    pub fn new(managed: ManagedSet) -> Self {
        Self { managed }
    }

    async fn add_missing(&self, api: &dyn RouterApi, hosts: &BTreeSet<String>) -> Result<usize> {
        if hosts.is_empty() {
            return Ok(0);
        }

        info!("Adding {} records to router...", format_count(hosts.len()));
        for host in hosts {
            debug!("Adding {}", host);
            api.execute(&self.managed.add_request(host))
                .await
                .map_err(|e| AdisheError::apply("Adding record", e))?;
        }
        info!("Records have been added to router");

        Ok(hosts.len())
    }
}

#[async_trait]
impl ApplyStrategy for DirectApply {
    async fn apply(&self, api: &dyn RouterApi, plan: &Plan) -> Result<Applied> {
        // Adds are addressed by hostname, so they do not wait for the removal
        let (deleted, added) = tokio::try_join!(
            remove_obsolete(api, &self.managed, plan),
            self.add_missing(api, &plan.to_add),
        )?;
        Ok(Applied { added, deleted })
    }
}
