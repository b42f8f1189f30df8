//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;

/// Keys whose values are never printed
const SECRET_KEYS: &[&str] = &["chain.private_key"];

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "chain.rpc_url")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    // Show path
    if args.path {
        let path = Config::config_path()?;
        println!("{}", path.display());
        return Ok(());
    }

    // Reset config
    if args.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    match (&args.key, &args.value) {
        // No arguments: show all config
        (None, None) => {
            print!("{}", render_all(&Config::load()?));
        }

        // Key only: show that value
        (Some(key), None) => {
            let config = Config::load()?;
            let Some(value) = config.get(key) else {
                eprintln!("Available keys:");
                for k in Config::available_keys() {
                    eprintln!("  {}", k);
                }
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            };
            println!("{}", display_value(key, &value));
        }

        // Key and value: set the value in the file only, ignoring env overrides
        (Some(key), Some(value)) => {
            let path = Config::config_path()?;
            let mut config = Config::load_from(path.clone())?;
            config.set(key, value)?;
            config.save_to(path)?;
            println!("{} = {}", key, display_value(key, value));
        }

        // Value without key: not valid
        (None, Some(_)) => {
            return Err(Error::Config("Must specify a key to set a value".to_string()));
        }
    }

    Ok(())
}

/// Mask secrets, keeping only whether they are set
fn display_value(key: &str, value: &str) -> String {
    if !SECRET_KEYS.contains(&key) {
        return value.to_string();
    }
    if value.is_empty() {
        "\"\" # not configured".to_string()
    } else {
        "\"***\" # configured".to_string()
    }
}

/// Render every key grouped by section
fn render_all(config: &Config) -> String {
    let mut out = String::new();
    let mut section = "";

    for key in Config::available_keys() {
        let Some((name, field)) = key.split_once('.') else {
            continue;
        };
        if name != section {
            if !section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", name));
            section = name;
        }

        let value = config.get(key).unwrap_or_default();
        let shown = if SECRET_KEYS.contains(&key) {
            display_value(key, &value)
        } else if value.parse::<u64>().is_ok() {
            value
        } else {
            format!("\"{}\"", value)
        };
        out.push_str(&format!("{} = {}\n", field, shown));
    }

    out
}
