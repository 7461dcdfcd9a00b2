use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tm::store::{DEFAULT_API_BASE, FileStore, Location, Session};

fn session_at(path: &Path) -> Session {
    Session::new(Arc::new(FileStore::open(path)))
}

#[test]
fn test_values_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let session = session_at(&path);
    session.set_session_cookie("tm_session=abc123").unwrap();
    session.set_csrf_token("tok").unwrap();
    session
        .set_location(&Location {
            city: "Lisbon".to_string(),
            country: "PT".to_string(),
        })
        .unwrap();
    drop(session);

    let reopened = session_at(&path);
    assert_eq!(
        reopened.session_cookie().as_deref(),
        Some("tm_session=abc123")
    );
    assert_eq!(reopened.csrf_token().as_deref(), Some("tok"));
    assert_eq!(reopened.location().unwrap().city, "Lisbon");
}

#[test]
fn test_missing_file_reads_as_defaults() {
    let dir = TempDir::new().unwrap();
    let session = session_at(&dir.path().join("config.json"));

    assert_eq!(session.api_base(), DEFAULT_API_BASE);
    assert_eq!(session.session_cookie(), None);
    assert_eq!(session.cookie_name(), "tm_session");
    assert_eq!(session.user(), None);
    assert_eq!(session.location(), None);
}

#[test]
fn test_corrupt_file_reads_empty_and_recovers_on_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{not json at all").unwrap();

    let session = session_at(&path);
    assert_eq!(session.session_cookie(), None);

    session.set_session_cookie("tm_session=fresh").unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str::<serde_json::Value>(&contents).unwrap();

    let reopened = session_at(&path);
    assert_eq!(reopened.session_cookie().as_deref(), Some("tm_session=fresh"));
}

#[test]
fn test_api_override_is_never_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let session = Session::new(Arc::new(FileStore::open(&path)))
        .with_api_override(Some("http://localhost:9999".to_string()));
    assert_eq!(session.api_base(), "http://localhost:9999");
    // Writing unrelated keys must not leak the override to disk.
    session.set_session_cookie("tm_session=x").unwrap();
    drop(session);

    let reopened = session_at(&path);
    assert_eq!(reopened.api_base(), DEFAULT_API_BASE);
}

#[test]
fn test_set_api_base_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    session_at(&path)
        .set_api_base("https://staging.example.com/api")
        .unwrap();

    assert_eq!(
        session_at(&path).api_base(),
        "https://staging.example.com/api"
    );
}

#[test]
fn test_clear_auth_keeps_preferences() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let session = session_at(&path);
    session.set_session_cookie("tm_session=abc").unwrap();
    session.set_csrf_token("tok").unwrap();
    session.set_user(json!({"email": "ada@example.com"})).unwrap();
    session.set_api_base("https://staging.example.com/api").unwrap();
    session
        .set_location(&Location {
            city: "Porto".to_string(),
            country: "PT".to_string(),
        })
        .unwrap();

    session.clear_auth().unwrap();

    assert_eq!(session.session_cookie(), None);
    assert_eq!(session.csrf_token(), None);
    assert_eq!(session.user(), None);
    assert_eq!(session.api_base(), "https://staging.example.com/api");
    assert!(session.location().is_some());
}

#[test]
fn test_reset_drops_everything() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let session = session_at(&path);
    session.set_session_cookie("tm_session=abc").unwrap();
    session.set_api_base("https://staging.example.com/api").unwrap();
    session.set_cookie_name("connect.sid").unwrap();
    session
        .set_location(&Location {
            city: "Porto".to_string(),
            country: "PT".to_string(),
        })
        .unwrap();

    session.reset().unwrap();

    assert_eq!(session.session_cookie(), None);
    assert_eq!(session.api_base(), DEFAULT_API_BASE);
    assert_eq!(session.cookie_name(), "tm_session");
    assert_eq!(session.location(), None);
}

#[test]
fn test_user_snapshot_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let user = json!({"id": 7, "email": "ada@example.com", "name": "Ada"});
    session_at(&path).set_user(user.clone()).unwrap();

    assert_eq!(session_at(&path).user(), Some(user));
}

#[cfg(unix)]
#[test]
fn test_config_file_is_private_to_the_user() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    session_at(&path).set_session_cookie("tm_session=s").unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
