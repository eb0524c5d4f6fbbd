use std::io::Write;
use std::time::Duration;

use form_binder::{BindingConfig, WaitPolicy, load_config};

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn config_default_values() {
    let config = BindingConfig::default();
    assert_eq!(config.wait.timeout_ms, 5000);
    assert_eq!(config.wait.poll_interval_ms, 200);
    assert_eq!(config.driver.command, "node");
    assert_eq!(config.driver.script, "driver/browser_server.js");
}

#[test]
fn config_default_wait_policy_matches_policy_default() {
    assert_eq!(BindingConfig::default().wait_policy(), WaitPolicy::default());
}

#[test]
fn config_load_nonexistent_returns_defaults() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    assert_eq!(config, BindingConfig::default());
}

#[test]
fn config_partial_yaml_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "wait:\n  timeout_ms: 1500\ndriver:\n  script: drivers/chrome.js").unwrap();

    let config = load_config(file.path().to_str());
    assert_eq!(config.wait.timeout_ms, 1500);
    assert_eq!(config.wait.poll_interval_ms, 200);
    assert_eq!(config.driver.command, "node");
    assert_eq!(config.driver.script, "drivers/chrome.js");

    assert_eq!(
        config.wait_policy(),
        WaitPolicy::new(Duration::from_millis(1500), Duration::from_millis(200))
    );
}

#[test]
fn config_malformed_yaml_returns_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "wait: [this is: not, a mapping").unwrap();

    let config = load_config(file.path().to_str());
    assert_eq!(config, BindingConfig::default());
}

#[test]
fn config_empty_file_returns_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = load_config(file.path().to_str());
    assert_eq!(config, BindingConfig::default());
}
