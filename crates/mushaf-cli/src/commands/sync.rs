//! Sync command handler

use anyhow::Result;

use mushaf_core::{SyncCoordinator, SyncStatus};

use crate::output::{Output, OutputFormat};

/// Retry queued edits against the remote backend
pub async fn run(coordinator: &mut SyncCoordinator, output: &Output) -> Result<()> {
    if coordinator.sync_status() == SyncStatus::Offline {
        output.message(
            "No backend configured; edits stay local.\n\
             Configure one with: mushaf config set supabase_url <url>",
        );
        return Ok(());
    }

    if coordinator.pending_count() == 0 {
        output.message("Nothing to sync.");
        return Ok(());
    }

    let report = coordinator.flush_pending().await?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "flushed": report.flushed,
                    "failed": report.failed,
                    "deferred": report.deferred,
                    "dropped": report.dropped,
                    "pending": coordinator.pending_count()
                })
            );
        }
        OutputFormat::Quiet => {}
        OutputFormat::Human => {
            if report.flushed > 0 {
                output.success(&format!("Synced {} edit(s)", report.flushed));
            }
            if report.failed > 0 {
                output.warning(&format!(
                    "{} edit(s) failed and remain queued",
                    report.failed
                ));
            }
            if report.deferred > 0 {
                output.message(&format!(
                    "{} edit(s) not yet due for retry",
                    report.deferred
                ));
            }
            if report.dropped > 0 {
                output.warning(&format!(
                    "{} edit(s) abandoned after repeated failures",
                    report.dropped
                ));
            }
        }
    }
    Ok(())
}
