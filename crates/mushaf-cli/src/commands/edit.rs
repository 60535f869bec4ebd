//! Edit command handler

use anyhow::{bail, Result};

use mushaf_core::{SyncCoordinator, WordKey};

use crate::output::Output;

/// Analysis fields provided on the command line
///
/// Unset fields keep the word's current value.
pub struct AnalysisArgs {
    pub word_type: Option<String>,
    pub root: Option<String>,
    pub root_explanation: Option<String>,
    pub grammar: Option<String>,
}

impl AnalysisArgs {
    fn is_empty(&self) -> bool {
        self.word_type.is_none()
            && self.root.is_none()
            && self.root_explanation.is_none()
            && self.grammar.is_none()
    }
}

/// Save a word analysis edit, syncing if a backend is configured
pub async fn run(
    coordinator: &mut SyncCoordinator,
    surah: u32,
    ayah: u32,
    word: u32,
    args: AnalysisArgs,
    output: &Output,
) -> Result<()> {
    if args.is_empty() {
        bail!(
            "Nothing to change. Provide at least one of:\n\
             --word-type, --root, --root-explanation, --grammar"
        );
    }

    let key = WordKey::new(surah, ayah, word);

    let surah_data = match coordinator.surah(surah).await? {
        Some(surah) => surah,
        None => bail!("Surah {} is not available; fetch it first with: mushaf read {}", surah, surah),
    };
    let current = match surah_data.word(&key) {
        Some(word) => word,
        None => bail!(
            "No word at {}. Check the ayah number and word index with: mushaf read {} --ayah {}",
            key,
            surah,
            ayah
        ),
    };

    let mut analysis = current.analysis.clone();
    if let Some(word_type) = args.word_type {
        analysis.word_type = word_type;
    }
    if let Some(root) = args.root {
        analysis.root = root;
    }
    if let Some(root_explanation) = args.root_explanation {
        analysis.root_explanation = root_explanation;
    }
    if let Some(grammar) = args.grammar {
        analysis.grammar = grammar;
    }

    let outcome = coordinator.save_word_analysis(key, analysis).await?;

    if outcome.synced {
        output.success(&format!("Saved and synced analysis for word {}", key));
    } else if let Some(error) = &outcome.error {
        output.success(&format!("Saved analysis for word {}", key));
        output.warning(&format!(
            "Sync failed ({}); the edit is queued. Retry with: mushaf sync",
            error
        ));
    } else {
        output.success(&format!(
            "Saved analysis for word {} (local only, no backend configured)",
            key
        ));
    }
    Ok(())
}
