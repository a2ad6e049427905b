use vb_domain::config::Config;

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3210);
}

#[test]
fn explicit_zero_host_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 3210
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(!config.server.cors.allowed_origins.is_empty());
    assert!(config
        .server
        .cors
        .allowed_origins
        .contains(&"http://localhost:*".to_string()));
}

#[test]
fn bridge_defaults_give_thirty_second_budget() {
    let config = Config::default();
    assert_eq!(config.bridge.poll_interval_secs, 5);
    assert_eq!(config.bridge.max_attempts, 6);
}

#[test]
fn messaging_section_parses() {
    let toml_str = r#"
[messaging]
api_base_url = "https://api.messaging.example"
destination = "R1234"
yes_label = "Yes"
no_label = "No"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.messaging.destination, "R1234");
    assert_eq!(config.messaging.yes_label, "Yes");
    // Defaults survive partial sections.
    assert_eq!(config.messaging.channel_secret_env, "VB_CHANNEL_SECRET");
}

#[test]
fn bridge_texts_have_defaults() {
    let config = Config::default();
    assert!(!config.bridge.keepalive_text.is_empty());
    assert!(!config.bridge.timeout_text.is_empty());
}
