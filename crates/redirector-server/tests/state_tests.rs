//! Wiring the engine from a config file

use std::fs;

use redirector_core::Config;
use redirector_server::{AppState, Error};
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> Config {
    let path = dir.path().join("redirector.toml");
    fs::write(&path, body).unwrap();
    Config::load(&path).unwrap()
}

#[test]
fn test_complete_config_builds_state() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("manifest.toml");
    let config = write_config(
        &dir,
        &format!(
            r#"
managed_folder_id = "5"

[remote]
access_token = "token"

[webhook]
primary_key = "primary"

[manifest]
path = "{}"
"#,
            manifest.display().to_string().replace('\\', "/")
        ),
    );

    let state = AppState::from_config(&config).unwrap();

    assert_eq!(state.root_id(), "5");
    assert_eq!(state.lookup("S/a.dat").unwrap(), None);
    assert!(!manifest.exists(), "lookups must not create the manifest");
}

#[test]
fn test_missing_token_is_refused() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r#"
managed_folder_id = "5"

[webhook]
primary_key = "primary"
"#,
    );

    let result = AppState::from_config(&config);

    match result {
        Err(Error::Core(e)) => assert!(e.to_string().contains("access_token")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("config without a token was accepted"),
    }
}
