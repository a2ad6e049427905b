pub mod config;

use clap::{Parser, Subcommand};

/// VoiceBridge — a voice-assistant ⇄ messaging-platform correlation gateway.
#[derive(Debug, Parser)]
#[command(name = "voicebridge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load `config.toml` (or the file named by `VB_CONFIG`). A missing file
/// yields the built-in defaults so the server can start in dev mode.
pub fn load_config() -> anyhow::Result<(vb_domain::config::Config, String)> {
    let config_path = std::env::var("VB_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        vb_domain::config::Config::default()
    };

    Ok((config, config_path))
}
