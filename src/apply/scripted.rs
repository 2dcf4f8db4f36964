//! Scripted apply: upload an import script and run it on the router.
//!
//! Order of operations:
//!
//! ```text
//! remove obsolete ─────────────────────┐
//!                                      ├─> /import ─> /file/remove
//! write script ─> ssh session ─> scp ──┘
//! ```

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::{remove_obsolete, Applied, ApplyStrategy};
use crate::error::{AdisheError, Result};
use crate::records::ManagedSet;
use crate::reconciler::Plan;
use crate::routeros::{Request, RouterApi};
use crate::transfer::ScriptTransport;

/// Render the import script: context line, then one add line per hostname
pub fn render_script(managed: &ManagedSet, hosts: &BTreeSet<String>) -> String {
    let mut script = String::with_capacity(64 * (hosts.len() + 1));
    script.push_str(managed.target.script_header());
    script.push('\n');
    for host in hosts {
        script.push_str(&managed.script_line(host));
        script.push('\n');
    }
    script
}

/// A script uploaded to the router. The local copy lives as long as this does.
struct StagedScript {
    _local: NamedTempFile,
    remote_name: String,
}

/// Bulk add through `/import`
pub struct ScriptedApply {
    managed: ManagedSet,
    transport: Box<dyn ScriptTransport>,
}

impl ScriptedApply {
    pub fn new(managed: ManagedSet, transport: Box<dyn ScriptTransport>) -> Self {
        Self { managed, transport }
    }

    /// Write the script to a scratch file and upload it
    async fn stage(&self, hosts: &BTreeSet<String>) -> Result<StagedScript> {
        let script = render_script(&self.managed, hosts);

        let mut local = tempfile::Builder::new()
            .prefix("adishe-")
            .suffix(".rsc")
            .tempfile()?;
        local.write_all(script.as_bytes())?;
        local.flush()?;

        let remote_name = local
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AdisheError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "scratch file name is not valid UTF-8",
                ))
            })?;

        self.transport.upload(local.path(), &remote_name).await?;

        Ok(StagedScript {
            _local: local,
            remote_name,
        })
    }

    async fn import(&self, api: &dyn RouterApi, remote_name: &str) -> Result<()> {
        info!("Importing script {}...", remote_name);
        api.execute(&Request::new("/import").attr("file-name", remote_name))
            .await
            .map_err(|e| {
                // Left in place for post-mortem inspection
                warn!("Import failed; {} is left on the router", remote_name);
                AdisheError::apply("Importing script", e)
            })?;
        info!("Script has been imported");
        Ok(())
    }

    async fn remove_uploaded(&self, api: &dyn RouterApi, remote_name: &str) -> Result<()> {
        info!("Removing script {} from router...", remote_name);
        api.execute(&Request::new("/file/remove").attr("numbers", remote_name))
            .await
            .map_err(|e| AdisheError::apply("Removing uploaded script", e))?;
        info!("Script has been removed");
        Ok(())
    }
}

#[async_trait]
impl ApplyStrategy for ScriptedApply {
    async fn apply(&self, api: &dyn RouterApi, plan: &Plan) -> Result<Applied> {
        if plan.to_add.is_empty() {
            let deleted = remove_obsolete(api, &self.managed, plan).await?;
            return Ok(Applied { added: 0, deleted });
        }

        // The import must see both the removal and the uploaded file
        let (deleted, staged) = tokio::try_join!(
            remove_obsolete(api, &self.managed, plan),
            self.stage(&plan.to_add),
        )?;

        self.import(api, &staged.remote_name).await?;
        self.remove_uploaded(api, &staged.remote_name).await?;

        Ok(Applied {
            added: plan.to_add.len(),
            deleted,
        })
    }
}
