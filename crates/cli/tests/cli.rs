use assert_cmd::Command;

fn bookshelf() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    // Keep the developer's config and environment out of the way.
    cmd.env("BOOKSHELF_CONFIG_DIR", std::env::temp_dir().join("bookshelf-cli-no-config"))
        .env_remove("BOOKSHELF_ENV")
        .env_remove("BOOKSHELF_SERVER__HOST")
        .env_remove("BOOKSHELF_SERVER__PORT");
    cmd
}

#[test]
fn config_prints_defaults() {
    let output = bookshelf().arg("config").output().unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["environment"], "local");
    assert_eq!(settings["server"]["host"], "localhost");
    assert_eq!(settings["server"]["port"], 9000);
    assert_eq!(settings["telemetry"]["log_format"], "pretty");
}

#[test]
fn config_honours_env_overrides() {
    let output = bookshelf()
        .arg("config")
        .env("BOOKSHELF_SERVER__PORT", "9123")
        .env("BOOKSHELF_ENV", "staging")
        .output()
        .unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["environment"], "staging");
    assert_eq!(settings["server"]["port"], 9123);
}

#[test]
fn unknown_environment_fails() {
    bookshelf()
        .arg("config")
        .env("BOOKSHELF_ENV", "qa")
        .assert()
        .failure();
}
