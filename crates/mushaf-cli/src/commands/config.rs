//! Config command handlers

use anyhow::{bail, Context, Result};

use mushaf_core::Config;

use crate::output::{Output, OutputFormat};

fn redact(value: &Option<String>) -> String {
    match value {
        Some(v) if v.len() > 8 => format!("{}...", &v[..8]),
        Some(v) => v.clone(),
        None => "(not set)".to_string(),
    }
}

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "backend": config.backend,
                    "airtable_base_id": config.airtable_base_id,
                    "airtable_table": config.airtable_table,
                    "airtable_configured": config.airtable_configured(),
                    "supabase_url": config.supabase_url,
                    "supabase_configured": config.supabase_configured()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:          {}", config.data_dir.display());
            println!(
                "  backend:           {}",
                config.backend.as_deref().unwrap_or("(auto)")
            );
            println!("  airtable_api_key:  {}", redact(&config.airtable_api_key));
            println!(
                "  airtable_base_id:  {}",
                config.airtable_base_id.as_deref().unwrap_or("(not set)")
            );
            println!("  airtable_table:    {}", config.airtable_table);
            println!(
                "  supabase_url:      {}",
                config.supabase_url.as_deref().unwrap_or("(not set)")
            );
            println!("  supabase_anon_key: {}", redact(&config.supabase_anon_key));
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value)
    }
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "backend" => {
            let choice = optional(value.clone());
            if let Some(ref choice) = choice {
                if !matches!(choice.as_str(), "airtable" | "supabase" | "memory") {
                    bail!(
                        "Unknown backend '{}'. Valid backends: airtable, supabase, memory",
                        choice
                    );
                }
            }
            config.backend = choice;
        }
        "airtable_api_key" => {
            config.airtable_api_key = optional(value.clone());
        }
        "airtable_base_id" => {
            config.airtable_base_id = optional(value.clone());
        }
        "airtable_table" => {
            config.airtable_table = value.clone();
        }
        "supabase_url" => {
            config.supabase_url = optional(value.clone());
        }
        "supabase_anon_key" => {
            config.supabase_anon_key = optional(value.clone());
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, backend, airtable_api_key, airtable_base_id,\n\
                 airtable_table, supabase_url, supabase_anon_key",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;

    // Don't echo secrets back
    if key.ends_with("_key") {
        output.success(&format!("Set {}", key));
    } else {
        output.success(&format!("Set {} = {}", key, value));
    }

    Ok(())
}
