use vb_domain::config::Config;

/// Parse and validate the config, printing any issues.
///
/// Returns true when the config can run a live bridge. Missing messaging
/// settings are warnings: the server still starts, it just cannot deliver
/// prompts until they are filled in.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let mut warnings = Vec::new();

    if config.messaging.api_base_url.is_empty() {
        warnings.push("[messaging] api_base_url is empty — outbound sends will fail".to_string());
    }
    if config.messaging.destination.is_empty() {
        warnings.push(
            "[messaging] destination is empty — send `info` to the bot to discover it"
                .to_string(),
        );
    }
    if config.bridge.max_attempts == 0 {
        warnings.push("[bridge] max_attempts is 0 — every exchange will time out".to_string());
    }

    if warnings.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    for warning in &warnings {
        println!("warning: {warning}");
    }
    println!("\n{} warning(s) in {config_path}", warnings.len());
    true
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}
