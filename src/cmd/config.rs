//! Configuration view and validation commands: `waymark config`.

use anyhow::Result;
use std::path::Path;

use super::super::ConfigCommands;
use waymark::ui::icons::{CHECK, WARN};

pub fn cmd_config(root: &Path, command: Option<ConfigCommands>) -> Result<()> {
    use waymark::config::Config;
    use waymark::waymark_config::{CONFIG_FILE, WaymarkToml};

    let config_path = root.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Waymark Configuration");
            println!("=====================");
            println!();
            println!("Data root: {}", root.display());

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                WaymarkToml::load(&config_path)?
            } else {
                println!("No waymark.toml found; using defaults.");
                WaymarkToml::default()
            };
            println!();

            println!("[storage]");
            println!("  lock_timeout_ms = {}", toml.storage.lock_timeout_ms);
            println!();
            println!("[commit]");
            println!("  summary_max_len = {}", toml.commit.summary_max_len);
            println!("  remote = \"{}\"", toml.commit.remote);
            if let Some(branch) = &toml.commit.branch {
                println!("  branch = \"{}\"", branch);
            }
            println!("  push = {}", toml.commit.push);
            println!();
            println!("[status]");
            println!("  history_limit = {}", toml.status.history_limit);
            println!();

            // Show effective values (including env overrides)
            let config = Config::new(root.to_path_buf(), false)?;
            println!("Effective values (with env overrides):");
            println!("  lock_timeout_ms = {}", config.lock_timeout.as_millis());
            println!();

            if !config_path.exists() {
                println!("Run 'waymark config init' to create a waymark.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No waymark.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = WaymarkToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("{}Configuration is valid.", CHECK);
            } else {
                println!("{}Configuration warnings:", WARN);
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("waymark.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !root.exists() {
                std::fs::create_dir_all(root)?;
            }

            WaymarkToml::default().save(&config_path)?;

            println!("Created waymark.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [storage] lock_timeout_ms");
            println!("  - [commit] summary_max_len, remote, branch, push");
            println!("  - [status] history_limit");
            println!();
        }
    }

    Ok(())
}
