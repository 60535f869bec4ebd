//! Status command handler

use anyhow::Result;

use mushaf_core::{SyncCoordinator, SyncStatus};

use crate::output::{Output, OutputFormat};

/// Show backend, content, and pending-sync status
pub fn show(coordinator: &SyncCoordinator, output: &Output) -> Result<()> {
    let config = coordinator.config();
    let state = coordinator.state();
    let position = coordinator.position();

    let backend = coordinator
        .backend()
        .map(|b| b.kind().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": coordinator.backend().map(|b| b.kind().to_string()),
                    "data_dir": config.data_dir,
                    "position": {
                        "surah": position.surah,
                        "verse_index": position.verse_index
                    },
                    "surahs_stored": state.all_content.len(),
                    "edits": state.edit_overrides.len(),
                    "media_overrides": state.media_overrides.len(),
                    "pending_writes": coordinator.pending_count()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", coordinator.pending_count());
        }
        OutputFormat::Human => {
            println!("Mushaf Status");
            println!("=============");
            println!();
            println!("Backend:  {}", backend);
            println!("Storage:  {}", config.data_dir.display());
            println!();
            println!("Position: surah {}, ayah index {}", position.surah, position.verse_index);
            println!();
            println!("Contents:");
            println!("  Surahs stored:   {}", state.all_content.len());
            println!("  Word edits:      {}", state.edit_overrides.len());
            println!("  Media overrides: {}", state.media_overrides.len());
            println!();
            match coordinator.sync_status() {
                SyncStatus::Offline => println!("Sync: offline (no backend configured)"),
                SyncStatus::Idle => println!("Sync: up to date"),
                SyncStatus::Pending(n) => {
                    println!("Sync: {} edit(s) queued", n);
                    println!("  Retry with: mushaf sync");
                }
            }
        }
    }

    Ok(())
}
