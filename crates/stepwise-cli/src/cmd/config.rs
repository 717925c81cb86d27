use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use stepwise_core::config::{Config, WarnLevel};
use stepwise_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective provider configuration
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a default .stepwise/config.yaml if none exists
    Init,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Init => init(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let key_set = config.provider.api_key().is_some();

    if json {
        return print_json(&serde_json::json!({
            "provider": config.provider,
            "apiKeySet": key_set,
        }));
    }

    print!("{}", serde_yaml::to_string(&config)?);
    let state = if key_set { "set" } else { "not set" };
    println!("# {} is {state}", config.provider.api_key_env);
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();
    let key_missing = config.provider.api_key().is_none();

    if json {
        print_json(&serde_json::json!({
            "warnings": warnings,
            "apiKeySet": !key_missing,
        }))?;
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
        if key_missing {
            println!(
                "[warning] {} is not set; plans and help are unavailable",
                config.provider.api_key_env
            );
        }
        if warnings.is_empty() && !key_missing {
            println!("Config is valid. No warnings.");
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

fn init(root: &Path, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    let created = !path.exists();
    if created {
        Config::default()
            .save(root)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if json {
        return print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "created": created,
        }));
    }
    if created {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists", path.display());
    }
    Ok(())
}
