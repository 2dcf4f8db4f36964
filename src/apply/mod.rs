//! Apply strategies: converge the router onto a computed [`Plan`].
//!
//! - [`DirectApply`] adds each hostname with a live API call.
//! - [`ScriptedApply`] uploads an import script and runs `/import`.
//!
//! Both remove obsolete records with one batched call. Any failure aborts
//! the remaining steps; nothing is rolled back. The next run recomputes the
//! plan from router state, so a partial apply converges on rerun.

mod direct;
mod scripted;

use async_trait::async_trait;
use tracing::info;

pub use direct::DirectApply;
pub use scripted::{render_script, ScriptedApply};

use crate::config::{ApplyMode, Config};
use crate::error::{AdisheError, Result};
use crate::records::ManagedSet;
use crate::reconciler::Plan;
use crate::routeros::RouterApi;
use crate::transfer::SshTransport;
use crate::utils::format_count;

/// Counts of what an apply changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub added: usize,
    pub deleted: usize,
}

/// Trait for apply strategies
#[async_trait]
pub trait ApplyStrategy: Send + Sync {
    /// Execute the plan against the router
    async fn apply(&self, api: &dyn RouterApi, plan: &Plan) -> Result<Applied>;
}

/// Create the strategy selected in the configuration
pub fn create_strategy(config: &Config) -> Box<dyn ApplyStrategy> {
    let managed = ManagedSet::from_config(config);
    match config.mode {
        ApplyMode::Direct => Box::new(DirectApply::new(managed)),
        ApplyMode::Scripted => Box::new(ScriptedApply::new(
            managed,
            Box::new(SshTransport::new(&config.router)),
        )),
    }
}

/// Remove the plan's obsolete records in one call. No call when there are none.
pub(crate) async fn remove_obsolete(
    api: &dyn RouterApi,
    managed: &ManagedSet,
    plan: &Plan,
) -> Result<usize> {
    if plan.to_delete.is_empty() {
        return Ok(0);
    }

    info!(
        "Removing {} obsolete records from router...",
        format_count(plan.to_delete.len())
    );
    api.execute(&managed.remove_request(plan.delete_ids()))
        .await
        .map_err(|e| AdisheError::apply("Removing obsolete records", e))?;
    info!("Obsolete records have been removed from router");

    Ok(plan.to_delete.len())
}
