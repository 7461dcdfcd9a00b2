use crate::error::{ErrorContext, TmError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Production API base used when the store holds no override.
pub const DEFAULT_API_BASE: &str = "https://terminalmarket.app/api";

/// Session-cookie name matched against `Set-Cookie` headers. The backend has
/// renamed its cookie before, so this is only a default; `config
/// set-cookie-name` overrides it.
pub const DEFAULT_COOKIE_NAME: &str = "tm_session";

const KEY_API_BASE: &str = "api_base";
const KEY_SESSION_COOKIE: &str = "session_cookie";
const KEY_CSRF_TOKEN: &str = "csrf_token";
const KEY_USER: &str = "user";
const KEY_LOCATION: &str = "location";
const KEY_COOKIE_NAME: &str = "cookie_name";

/// Durable key-value persistence for the handful of fields the client keeps
/// between invocations.
///
/// `get` never fails: an absent key, a missing file, or a corrupt file all
/// read as "no value". Writes persist immediately.
pub trait StateStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<(), TmError>;

    fn delete(&self, key: &str) -> Result<(), TmError>;
}

/// On-disk store backed by a single JSON object at
/// `<os-config-dir>/tm/config.json` (or `$TM_CONFIG_DIR/config.json`).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileStore {
    /// Open the store at the per-user default location.
    pub fn open_default() -> Result<Self, TmError> {
        Ok(Self::open(Self::default_path()?))
    }

    /// Open a store at an explicit path. The file is read fail-open: anything
    /// unreadable or unparseable is treated as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read_values(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn default_path() -> Result<PathBuf, TmError> {
        if let Ok(dir) = std::env::var("TM_CONFIG_DIR") {
            return Ok(PathBuf::from(dir).join("config.json"));
        }
        let base = dirs::config_dir()
            .ok_or_else(|| TmError::Config("Could not determine config directory".to_string()))?;
        Ok(base.join("tm").join("config.json"))
    }

    fn read_values(path: &Path) -> Map<String, Value> {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            Err(_) => Map::new(),
        }
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), TmError> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).tm_config_err(format!(
                    "Failed to create configuration directory at {}",
                    dir.display()
                ))?;
                #[cfg(unix)]
                Self::set_mode(dir, 0o700)?;
            }
        }

        let contents = serde_json::to_string_pretty(&Value::Object(values.clone()))
            .tm_config_err("Failed to encode configuration")?;
        fs::write(&self.path, contents).tm_config_err(format!(
            "Failed to write configuration to {}",
            self.path.display()
        ))?;
        // The file holds a session cookie, so keep it private to the user.
        #[cfg(unix)]
        Self::set_mode(&self.path, 0o600)?;
        Ok(())
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) -> Result<(), TmError> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path)
            .tm_config_err(format!("Failed to get metadata for {}", path.display()))?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(mode);
        fs::set_permissions(path, permissions)
            .tm_config_err(format!("Failed to set permissions for {}", path.display()))
    }
}

// A poisoned lock still holds a usable map.
fn lock_values(values: &Mutex<Map<String, Value>>) -> MutexGuard<'_, Map<String, Value>> {
    values.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock_values(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), TmError> {
        let mut values = lock_values(&self.values);
        values.insert(key.to_string(), value);
        self.persist(&values)
    }

    fn delete(&self, key: &str) -> Result<(), TmError> {
        let mut values = lock_values(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and for injecting a fake into [`crate::ApiClient`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock_values(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), TmError> {
        lock_values(&self.values).insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), TmError> {
        lock_values(&self.values).remove(key);
        Ok(())
    }
}

/// User locality preference, used to bias product and seller listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

/// Typed view over a [`StateStore`], constructed once at startup and passed
/// into the dispatcher and the HTTP adapter.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<dyn StateStore>,
    api_override: Option<String>,
}

impl Session {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            api_override: None,
        }
    }

    /// Apply a one-shot `--api` override that is never persisted.
    pub fn with_api_override(mut self, url: Option<String>) -> Self {
        self.api_override = url;
        self
    }

    pub fn api_base(&self) -> String {
        self.api_override
            .clone()
            .or_else(|| self.get_str(KEY_API_BASE))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn set_api_base(&self, url: &str) -> Result<(), TmError> {
        self.store.set(KEY_API_BASE, json!(url))
    }

    /// The stored `name=value` cookie pair, replayed verbatim in `Cookie`.
    pub fn session_cookie(&self) -> Option<String> {
        self.get_str(KEY_SESSION_COOKIE)
    }

    pub fn set_session_cookie(&self, pair: &str) -> Result<(), TmError> {
        self.store.set(KEY_SESSION_COOKIE, json!(pair))
    }

    pub fn cookie_name(&self) -> String {
        self.get_str(KEY_COOKIE_NAME)
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string())
    }

    pub fn set_cookie_name(&self, name: &str) -> Result<(), TmError> {
        self.store.set(KEY_COOKIE_NAME, json!(name))
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.get_str(KEY_CSRF_TOKEN)
    }

    pub fn set_csrf_token(&self, token: &str) -> Result<(), TmError> {
        self.store.set(KEY_CSRF_TOKEN, json!(token))
    }

    /// Last-known profile snapshot, for optimistic display only. The
    /// `/auth/status` endpoint is authoritative.
    pub fn user(&self) -> Option<Value> {
        self.store.get(KEY_USER)
    }

    pub fn set_user(&self, user: Value) -> Result<(), TmError> {
        self.store.set(KEY_USER, user)
    }

    pub fn location(&self) -> Option<Location> {
        self.store
            .get(KEY_LOCATION)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set_location(&self, location: &Location) -> Result<(), TmError> {
        let value = serde_json::to_value(location)
            .tm_config_err("Failed to encode location preference")?;
        self.store.set(KEY_LOCATION, value)
    }

    pub fn clear_location(&self) -> Result<(), TmError> {
        self.store.delete(KEY_LOCATION)
    }

    /// Drop all authentication state. Called on logout in both the success
    /// and the failure branch of the remote call.
    pub fn clear_auth(&self) -> Result<(), TmError> {
        self.store.delete(KEY_SESSION_COOKIE)?;
        self.store.delete(KEY_CSRF_TOKEN)?;
        self.store.delete(KEY_USER)
    }

    /// Drop everything, including preferences. Used by `config reset`.
    pub fn reset(&self) -> Result<(), TmError> {
        self.clear_auth()?;
        self.store.delete(KEY_API_BASE)?;
        self.store.delete(KEY_LOCATION)?;
        self.store.delete(KEY_COOKIE_NAME)
    }

    fn get_str(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .and_then(|v| v.as_str().map(|s| s.to_string()))
    }
}
