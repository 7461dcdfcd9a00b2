use assert_cmd::Command;
use tempfile::TempDir;

/// Fresh state directory so tests never touch the user's real config.
pub fn state_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A `tm` invocation with isolated state and the browser suppressed.
pub fn tm(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tm").unwrap();
    cmd.env("TM_CONFIG_DIR", dir.path())
        .env("TM_NO_BROWSER", "1");
    cmd
}

/// Same, pointed at a mock server instead of the production API.
pub fn tm_at(dir: &TempDir, api: &str) -> Command {
    let mut cmd = tm(dir);
    cmd.arg("--api").arg(api);
    cmd
}
