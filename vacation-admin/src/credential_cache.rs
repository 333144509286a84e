//! Encrypted "remember me" store and employee snapshot cache for the
//! `remote` commands.
//!
//! Layout:
//!
//! * `<cache_dir>/credentials.enc` - `base64(nonce_12bytes || ciphertext || tag_16bytes)`
//!   of the JSON [`SavedCredentials`]
//! * `<cache_dir>/snapshot.enc` - last employee overview, encrypted the same way
//! * `<cache_dir>/snapshot_meta.json` - when the snapshot was taken
//! * `<key_dir>/cache.key` - base64 AES-256 key, owner-only permissions
//!
//! The key file is only consulted when `VACATION_CACHE_KEY` is not set. The
//! password itself is never stored, only the session token the server issued.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

pub const CACHE_KEY_ENV: &str = "VACATION_CACHE_KEY";
pub const CACHE_DIR_ENV: &str = "VACATION_CACHE_DIR";
pub const KEY_DIR_ENV: &str = "VACATION_KEY_DIR";

/// Snapshot age accepted for the employee list.
pub const SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(1800);
/// Snapshot age accepted for the logged-in user's own data.
pub const USER_SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(3600);

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

const CREDENTIALS_FILE: &str = "credentials.enc";
const SNAPSHOT_FILE: &str = "snapshot.enc";
const SNAPSHOT_META_FILE: &str = "snapshot_meta.json";
const KEY_FILE: &str = "cache.key";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Cache key must be 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("Ciphertext too short")]
    Truncated,

    #[error("Decryption failed (wrong key or tampered data)")]
    Decrypt,

    #[error("Encryption failed")]
    Encrypt,

    #[error("No home directory; set VACATION_CACHE_DIR and VACATION_KEY_DIR")]
    NoHome,
}

/// What "remember me" keeps between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCredentials {
    pub username: String,
    pub session_token: String,
    pub remember_me: bool,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotMeta {
    last_updated: DateTime<Utc>,
}

struct CacheKey {
    bytes: [u8; KEY_LEN],
}

impl Drop for CacheKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl CacheKey {
    fn from_base64(encoded: &str) -> Result<Self, CacheError> {
        let mut decoded = STANDARD.decode(encoded.trim())?;
        if decoded.len() != KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(CacheError::KeyLength(len));
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(CacheKey { bytes })
    }

    fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        CacheKey { bytes }
    }

    fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    fn cipher(&self) -> Result<Aes256Gcm, CacheError> {
        Aes256Gcm::new_from_slice(&self.bytes).map_err(|_| CacheError::KeyLength(KEY_LEN))
    }

    /// plaintext -> base64(nonce || ciphertext || tag)
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CacheError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()?
            .encrypt(&nonce, plaintext)
            .map_err(|_| CacheError::Encrypt)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(&blob))
    }

    fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, CacheError> {
        let data = STANDARD.decode(encoded.trim())?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CacheError::Truncated);
        }
        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);
        self.cipher()?
            .decrypt(nonce, &data[NONCE_LEN..])
            .map_err(|_| CacheError::Decrypt)
    }
}

/// File-backed cache for the remote commands.
pub struct CredentialCache {
    cache_dir: PathBuf,
    key_dir: PathBuf,
    env_key: Option<String>,
}

impl CredentialCache {
    /// Cache under `$VACATION_CACHE_DIR` (default `~/.cache/vacation-admin`)
    /// with the key under `$VACATION_KEY_DIR` (default
    /// `~/.config/vacation-admin/keys`).
    pub fn from_env() -> Result<Self, CacheError> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        let cache_dir = match std::env::var_os(CACHE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => home
                .as_ref()
                .ok_or(CacheError::NoHome)?
                .join(".cache")
                .join("vacation-admin"),
        };
        let key_dir = match std::env::var_os(KEY_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => home
                .as_ref()
                .ok_or(CacheError::NoHome)?
                .join(".config")
                .join("vacation-admin")
                .join("keys"),
        };
        Ok(Self::new(cache_dir, key_dir, std::env::var(CACHE_KEY_ENV).ok()))
    }

    pub fn new(
        cache_dir: impl Into<PathBuf>,
        key_dir: impl Into<PathBuf>,
        env_key: Option<String>,
    ) -> Self {
        CredentialCache {
            cache_dir: cache_dir.into(),
            key_dir: key_dir.into(),
            env_key,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    fn key_path(&self) -> PathBuf {
        self.key_dir.join(KEY_FILE)
    }

    /// Key from the environment, else the key file, generating it when
    /// `create` is set and it does not exist yet.
    fn key(&self, create: bool) -> Result<Option<CacheKey>, CacheError> {
        if let Some(encoded) = &self.env_key {
            return CacheKey::from_base64(encoded).map(Some);
        }
        let path = self.key_path();
        if path.exists() {
            let mut encoded = fs::read_to_string(&path)?;
            let key = CacheKey::from_base64(&encoded);
            encoded.zeroize();
            return key.map(Some);
        }
        if !create {
            return Ok(None);
        }
        let key = CacheKey::generate();
        let mut encoded = key.to_base64();
        let written = write_atomic(&path, encoded.as_bytes(), true);
        encoded.zeroize();
        written?;
        Ok(Some(key))
    }

    /// Stores the session when `remember_me` is set; otherwise removes every
    /// stored credential file.
    pub fn save_credentials(
        &self,
        username: &str,
        session_token: &str,
        remember_me: bool,
    ) -> Result<(), CacheError> {
        if !remember_me {
            remove_if_exists(&self.path(CREDENTIALS_FILE))?;
            return Ok(());
        }
        let saved = SavedCredentials {
            username: username.to_string(),
            session_token: session_token.to_string(),
            remember_me,
            saved_at: Utc::now(),
        };
        let key = self.key(true)?.ok_or(CacheError::Encrypt)?;
        let mut plaintext = serde_json::to_vec(&saved)?;
        let encrypted = key.encrypt(&plaintext);
        plaintext.zeroize();
        write_atomic(&self.path(CREDENTIALS_FILE), encrypted?.as_bytes(), true)
    }

    /// The remembered session, if there is one and it can be decrypted.
    pub fn load_credentials(&self) -> Result<Option<SavedCredentials>, CacheError> {
        let path = self.path(CREDENTIALS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let Some(key) = self.key(false)? else {
            return Ok(None);
        };
        let mut plaintext = key.decrypt(&fs::read_to_string(&path)?)?;
        let saved = serde_json::from_slice::<SavedCredentials>(&plaintext);
        plaintext.zeroize();
        Ok(Some(saved?).filter(|s| s.remember_me && !s.username.is_empty()))
    }

    /// True when a readable "remember me" entry exists. Unreadable files
    /// count as absent.
    pub fn has_saved_credentials(&self) -> bool {
        matches!(self.load_credentials(), Ok(Some(_)))
    }

    /// Stores the employee snapshot and stamps its metadata.
    pub fn save_snapshot(&self, data: &serde_json::Value) -> Result<(), CacheError> {
        let key = self.key(true)?.ok_or(CacheError::Encrypt)?;
        let encrypted = key.encrypt(&serde_json::to_vec(data)?)?;
        write_atomic(&self.path(SNAPSHOT_FILE), encrypted.as_bytes(), true)?;
        self.save_snapshot_meta()
    }

    /// The stored snapshot, regardless of its age.
    pub fn load_snapshot(&self) -> Result<Option<serde_json::Value>, CacheError> {
        let path = self.path(SNAPSHOT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let Some(key) = self.key(false)? else {
            return Ok(None);
        };
        let plaintext = key.decrypt(&fs::read_to_string(&path)?)?;
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    pub fn save_snapshot_meta(&self) -> Result<(), CacheError> {
        let meta = SnapshotMeta {
            last_updated: Utc::now(),
        };
        write_atomic(
            &self.path(SNAPSHOT_META_FILE),
            serde_json::to_string_pretty(&meta)?.as_bytes(),
            false,
        )
    }

    fn snapshot_meta(&self) -> Option<SnapshotMeta> {
        let content = fs::read_to_string(self.path(SNAPSHOT_META_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// True when the snapshot metadata is younger than `max_age`.
    pub fn is_snapshot_valid(&self, max_age: Duration) -> bool {
        let Some(meta) = self.snapshot_meta() else {
            return false;
        };
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return false;
        };
        Utc::now().signed_duration_since(meta.last_updated) < max_age
    }

    pub fn is_snapshot_valid_for_user(&self) -> bool {
        self.is_snapshot_valid(USER_SNAPSHOT_MAX_AGE)
    }

    /// Forces the next read to refresh. Credentials stay.
    pub fn invalidate_snapshot(&self) -> Result<(), CacheError> {
        remove_if_exists(&self.path(SNAPSHOT_META_FILE))
    }

    /// Removes every cache file, including a generated key.
    pub fn clear_all(&self) -> Result<(), CacheError> {
        for name in [CREDENTIALS_FILE, SNAPSHOT_FILE, SNAPSHOT_META_FILE] {
            remove_if_exists(&self.path(name))?;
        }
        remove_if_exists(&self.key_path())
    }
}

fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Writes `contents` to a sibling temp file and renames it over `path`.
fn write_atomic(path: &Path, contents: &[u8], private: bool) -> Result<(), CacheError> {
    let dir = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "cache path has no parent")
    })?;
    create_dir(dir, private)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = dir.join(tmp_name);

    let result = (|| -> std::io::Result<()> {
        let mut file = open_for_write(&tmp_path, private)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    Ok(result?)
}

#[cfg(unix)]
fn create_dir(dir: &Path, private: bool) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    if private {
        builder.mode(0o700);
    }
    builder.create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path, _private: bool) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_for_write(path: &Path, private: bool) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if private {
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _private: bool) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir) -> CredentialCache {
        CredentialCache::new(dir.path().join("cache"), dir.path().join("keys"), None)
    }

    #[test]
    fn test_credentials_round_trip_without_password() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        assert!(!cache.has_saved_credentials());

        cache.save_credentials("alice", "token-123", true).unwrap();
        let saved = cache.load_credentials().unwrap().unwrap();
        assert_eq!(saved.username, "alice");
        assert_eq!(saved.session_token, "token-123");
        assert!(saved.remember_me);
        assert!(cache.has_saved_credentials());

        let raw = fs::read_to_string(dir.path().join("cache").join(CREDENTIALS_FILE)).unwrap();
        assert!(!raw.contains("alice"));
        assert!(!raw.contains("token-123"));
        // The key lives outside the cache directory.
        assert!(dir.path().join("keys").join(KEY_FILE).exists());
        assert!(!dir.path().join("cache").join(KEY_FILE).exists());
    }

    #[test]
    fn test_remember_me_off_removes_credentials() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        cache.save_credentials("alice", "token", true).unwrap();
        cache.save_credentials("alice", "token", false).unwrap();
        assert!(cache.load_credentials().unwrap().is_none());
        assert!(!cache.has_saved_credentials());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        cache.save_credentials("bob", "token", true).unwrap();
        let mode = fs::metadata(dir.path().join("keys").join(KEY_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_environment_key_is_used() {
        let dir = TempDir::new().unwrap();
        let env_key = STANDARD.encode([7u8; KEY_LEN]);
        let cache = CredentialCache::new(
            dir.path().join("cache"),
            dir.path().join("keys"),
            Some(env_key.clone()),
        );
        cache.save_credentials("carol", "token", true).unwrap();
        assert!(!dir.path().join("keys").join(KEY_FILE).exists());

        let same_key = CredentialCache::new(
            dir.path().join("cache"),
            dir.path().join("keys"),
            Some(env_key),
        );
        assert_eq!(same_key.load_credentials().unwrap().unwrap().username, "carol");

        let other_key = CredentialCache::new(
            dir.path().join("cache"),
            dir.path().join("keys"),
            Some(STANDARD.encode([8u8; KEY_LEN])),
        );
        assert!(matches!(other_key.load_credentials(), Err(CacheError::Decrypt)));
        assert!(!other_key.has_saved_credentials());
    }

    #[test]
    fn test_short_environment_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::new(
            dir.path().join("cache"),
            dir.path().join("keys"),
            Some(STANDARD.encode([1u8; 16])),
        );
        assert!(matches!(
            cache.save_credentials("dave", "token", true),
            Err(CacheError::KeyLength(16))
        ));
    }

    #[test]
    fn test_snapshot_validity_and_invalidation() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        assert!(!cache.is_snapshot_valid(SNAPSHOT_MAX_AGE));

        let data = serde_json::json!([{ "employee": { "name": "Alice Smith" } }]);
        cache.save_snapshot(&data).unwrap();
        assert!(cache.is_snapshot_valid(SNAPSHOT_MAX_AGE));
        assert!(cache.is_snapshot_valid_for_user());
        assert!(!cache.is_snapshot_valid(Duration::ZERO));
        assert_eq!(cache.load_snapshot().unwrap().unwrap(), data);

        cache.save_credentials("alice", "token", true).unwrap();
        cache.invalidate_snapshot().unwrap();
        assert!(!cache.is_snapshot_valid(SNAPSHOT_MAX_AGE));
        assert!(cache.has_saved_credentials());
    }

    #[test]
    fn test_stale_snapshot_meta() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let stale = SnapshotMeta {
            last_updated: Utc::now() - chrono::Duration::seconds(2000),
        };
        write_atomic(
            &dir.path().join("cache").join(SNAPSHOT_META_FILE),
            serde_json::to_string(&stale).unwrap().as_bytes(),
            false,
        )
        .unwrap();
        assert!(!cache.is_snapshot_valid(SNAPSHOT_MAX_AGE));
        assert!(cache.is_snapshot_valid_for_user());
    }

    #[test]
    fn test_clear_all_removes_generated_key() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        cache.save_credentials("alice", "token", true).unwrap();
        cache.save_snapshot(&serde_json::json!([])).unwrap();

        cache.clear_all().unwrap();
        assert!(!cache.has_saved_credentials());
        assert!(!cache.is_snapshot_valid(SNAPSHOT_MAX_AGE));
        assert!(cache.load_snapshot().unwrap().is_none());
        assert!(!dir.path().join("keys").join(KEY_FILE).exists());

        // Clearing twice is fine.
        cache.clear_all().unwrap();
    }
}
