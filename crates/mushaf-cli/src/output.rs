//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use mushaf_core::{Ayah, Surah};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print one ayah with its word analyses
    pub fn print_ayah(&self, surah: &Surah, ayah: &Ayah) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "{} ({}) - Ayah {}",
                    surah.surah_name, surah.surah_number, ayah.ayah_number
                );
                println!();
                println!("{}", ayah.arabic);
                println!("{}", ayah.transliteration);
                println!("{}", ayah.translation);
                if !ayah.recitation_url.is_empty() {
                    println!();
                    println!("Audio: {}", ayah.recitation_url);
                }
                if !ayah.words.is_empty() {
                    println!();
                    for (i, word) in ayah.words.iter().enumerate() {
                        let analysis = &word.analysis;
                        if analysis.is_empty() {
                            println!("[{}] {} - {}", i, word.arabic, word.translation);
                        } else {
                            println!(
                                "[{}] {} - {} | {} | root: {}",
                                i,
                                word.arabic,
                                word.translation,
                                analysis.word_type,
                                analysis.root
                            );
                        }
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(ayah).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}:{}", surah.surah_number, ayah.ayah_number);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a non-fatal warning
    pub fn warning(&self, msg: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", msg);
        }
    }
}
