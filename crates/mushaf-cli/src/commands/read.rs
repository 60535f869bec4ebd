//! Read command handler

use anyhow::{bail, Result};

use mushaf_core::{Position, SyncCoordinator};

use crate::output::Output;

/// Read an ayah and save the position
///
/// With no arguments, resumes from the saved position. `--next`/`--prev`
/// step through the surah; stepping past either end moves into the
/// adjacent surah.
pub async fn run(
    coordinator: &mut SyncCoordinator,
    surah: Option<u32>,
    ayah: Option<u32>,
    next: bool,
    prev: bool,
    output: &Output,
) -> Result<()> {
    let mut position = match surah {
        Some(surah) => {
            if !(1..=114).contains(&surah) {
                bail!("Surah number must be between 1 and 114");
            }
            Position {
                surah,
                verse_index: 0,
            }
        }
        None => coordinator.position(),
    };

    // Stepping back from the first ayah lands on the previous surah's last
    let mut jump_to_last = false;
    if next {
        position.verse_index += 1;
    } else if prev {
        if position.verse_index > 0 {
            position.verse_index -= 1;
        } else if position.surah > 1 {
            position.surah -= 1;
            jump_to_last = true;
        } else {
            bail!("Already at the beginning of the Quran");
        }
    }

    let mut surah_data = match coordinator.surah(position.surah).await? {
        Some(surah) => surah,
        None => bail!(
            "Surah {} is not available locally and no backend is reachable.\n\
             Configure one with: mushaf config set supabase_url <url>",
            position.surah
        ),
    };

    if let Some(ayah_number) = ayah {
        position.verse_index = match surah_data
            .ayat
            .iter()
            .position(|a| a.ayah_number == ayah_number)
        {
            Some(index) => index,
            None => bail!(
                "Surah {} has no ayah {} ({} ayat available)",
                position.surah,
                ayah_number,
                surah_data.ayat.len()
            ),
        };
    }

    // Stepping past the end rolls over to the next surah
    if next && position.verse_index >= surah_data.ayat.len() {
        if position.surah >= 114 {
            bail!("Already at the end of the Quran");
        }
        position = Position {
            surah: position.surah + 1,
            verse_index: 0,
        };
        surah_data = match coordinator.surah(position.surah).await? {
            Some(surah) => surah,
            None => bail!("Surah {} is not available", position.surah),
        };
    }

    if surah_data.ayat.is_empty() {
        bail!("Surah {} has no content", position.surah);
    }
    if jump_to_last {
        position.verse_index = surah_data.ayat.len() - 1;
    }
    position.verse_index = position.verse_index.min(surah_data.ayat.len() - 1);

    coordinator.set_position(position)?;

    let ayah = &surah_data.ayat[position.verse_index];
    output.print_ayah(&surah_data, ayah);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use mushaf_core::Config;
    use tempfile::TempDir;

    fn coordinator(temp_dir: &TempDir) -> SyncCoordinator {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        SyncCoordinator::open_with_config(config).unwrap()
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[tokio::test]
    async fn test_prev_within_surah_steps_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut coord = coordinator(&temp_dir);
        coord
            .set_position(Position {
                surah: 1,
                verse_index: 3,
            })
            .unwrap();

        run(&mut coord, None, None, false, true, &quiet())
            .await
            .unwrap();

        assert_eq!(coord.position().verse_index, 2);
    }

    #[tokio::test]
    async fn test_prev_rolls_back_into_previous_surah() {
        let temp_dir = TempDir::new().unwrap();
        let mut coord = coordinator(&temp_dir);
        coord
            .set_position(Position {
                surah: 2,
                verse_index: 0,
            })
            .unwrap();

        run(&mut coord, None, None, false, true, &quiet())
            .await
            .unwrap();

        // Lands on the last ayah of Al-Fatihah (7 ayat)
        let position = coord.position();
        assert_eq!(position.surah, 1);
        assert_eq!(position.verse_index, 6);
    }

    #[tokio::test]
    async fn test_prev_at_very_start_errors() {
        let temp_dir = TempDir::new().unwrap();
        let mut coord = coordinator(&temp_dir);

        let result = run(&mut coord, None, None, false, true, &quiet()).await;
        assert!(result.is_err());
        // Position untouched
        assert_eq!(coord.position(), Position::default());
    }
}
