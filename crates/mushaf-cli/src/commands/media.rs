//! Media command handler

use anyhow::{bail, Result};

use mushaf_core::SyncCoordinator;

use crate::output::Output;

/// Set or clear an alternate recitation URL for an ayah
pub fn run(
    coordinator: &mut SyncCoordinator,
    surah: u32,
    ayah: u32,
    url: String,
    output: &Output,
) -> Result<()> {
    if url.is_empty() || url == "none" {
        coordinator.clear_media_override(surah, ayah)?;
        output.success(&format!("Cleared media override for {}:{}", surah, ayah));
        return Ok(());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("Media URL must start with http:// or https://");
    }

    coordinator.save_media_override(surah, ayah, url)?;
    output.success(&format!("Set media override for {}:{}", surah, ayah));
    Ok(())
}
