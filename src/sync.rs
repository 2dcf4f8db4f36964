//! One reconciliation run, from connect to converged.

use std::fmt;
use tracing::info;

use crate::apply::{create_strategy, Applied, ApplyStrategy};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{BlocklistSource, Fetcher};
use crate::lock::LockGuard;
use crate::reconciler::reconcile;
use crate::records::ManagedSet;
use crate::routeros::{ApiClient, RouterApi};
use crate::utils::format_count;

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Router already matches the remote list; nothing was sent
    NothingToDo,
    /// Plan computed but not applied
    DryRun { to_add: usize, to_delete: usize },
    /// Plan applied
    Converged(Applied),
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::NothingToDo => write!(f, "router already in sync, nothing to do"),
            SyncOutcome::DryRun { to_add, to_delete } => write!(
                f,
                "dry run: {} to add, {} to delete",
                format_count(*to_add),
                format_count(*to_delete)
            ),
            SyncOutcome::Converged(applied) => write!(
                f,
                "{} added, {} deleted",
                format_count(applied.added),
                format_count(applied.deleted)
            ),
        }
    }
}

/// Reconcile and apply with already constructed collaborators
pub async fn sync(
    source: &dyn BlocklistSource,
    api: &dyn RouterApi,
    strategy: &dyn ApplyStrategy,
    managed: &ManagedSet,
    dry_run: bool,
) -> Result<SyncOutcome> {
    let plan = reconcile(source, api, managed).await?;

    if plan.is_empty() {
        info!("Nothing to do here. Exiting now.");
        return Ok(SyncOutcome::NothingToDo);
    }

    if dry_run {
        info!("Dry run: router left untouched");
        return Ok(SyncOutcome::DryRun {
            to_add: plan.to_add.len(),
            to_delete: plan.to_delete.len(),
        });
    }

    let applied = strategy.apply(api, &plan).await?;
    info!(
        "Router converged: {} added, {} deleted",
        format_count(applied.added),
        format_count(applied.deleted)
    );
    Ok(SyncOutcome::Converged(applied))
}

/// Run the whole reconciliation described by `config`
pub async fn run(config: &Config) -> Result<SyncOutcome> {
    let _lock = LockGuard::acquire(&config.lock_file)?;

    let fetcher = Fetcher::new(&config.source_url, config.router.timeout)?;
    let api = ApiClient::connect(&config.router).await?;
    let strategy = create_strategy(config);
    let managed = ManagedSet::from_config(config);

    info!(
        "Reconciling {} entries tagged '{}' ({:?} apply)",
        config.target, config.tag, config.mode
    );
    sync(&fetcher, &api, strategy.as_ref(), &managed, config.dry_run).await
}
