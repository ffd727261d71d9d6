//! Authentication store
//!
//! Users and public links live in one JSON document
//! `<auth dir>/gui-web-user.json`. Every operation re-reads the file and
//! writes it back whole; the last writer wins.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use artdeck_core::dti::{self, DTI_KEY};
use artdeck_core::prelude::*;
use artdeck_daemon::workspace::{read_json, write_json_atomic};

use super::password::{hash_password, verify_password};

pub const USER_DB_DTI: &str = "/catharsys/gui/web/user:1.0";
const USER_DB_PATTERN: &str = "/catharsys/gui/web/user:1";
pub const USER_DB_FILE: &str = "gui-web-user.json";

/// Outcome of a credential or link check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Valid,
    NoFile,
    CorruptDb,
    InvalidLink,
    InvalidId,
    InvalidUser,
    Expired,
}

impl AuthResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, AuthResult::Valid)
    }

    /// User-facing text. Unknown users and wrong passwords read the same.
    pub fn message(&self) -> &'static str {
        match self {
            AuthResult::Valid => "Valid",
            AuthResult::NoFile => "Authentication database missing",
            AuthResult::CorruptDb => "Authentication database corrupted",
            AuthResult::InvalidId | AuthResult::InvalidLink => "Invalid link",
            AuthResult::InvalidUser => "Invalid username or password",
            AuthResult::Expired => "Authentication expired",
        }
    }
}

impl fmt::Display for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "sUser", default)]
    pub user: String,
    #[serde(rename = "sKey", default)]
    pub key: Option<String>,
    #[serde(rename = "sSalt", default)]
    pub salt: Option<String>,
    /// Unix timestamp, 0 = never
    #[serde(rename = "iExpire", default)]
    pub expire: i64,
    #[serde(rename = "lRights", default)]
    pub rights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "sId")]
    pub id: String,
    #[serde(rename = "sLink")]
    pub link: String,
    #[serde(rename = "sUsername")]
    pub user: String,
    #[serde(rename = "iCreated")]
    pub created: i64,
    #[serde(rename = "iExpire")]
    pub expire: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserDb {
    #[serde(rename = "mUser", default, skip_serializing_if = "Option::is_none")]
    users: Option<BTreeMap<String, UserRecord>>,
    #[serde(rename = "mPublicLinks", default, skip_serializing_if = "Option::is_none")]
    links: Option<BTreeMap<String, BTreeMap<String, LinkRecord>>>,
}

pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

fn is_expired(expire: i64, now: i64) -> bool {
    expire > 0 && expire <= now
}

/// User database of one workspace
#[derive(Debug, Clone)]
pub struct AuthStore {
    dir: PathBuf,
}

impl AuthStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn user_file(&self) -> PathBuf {
        self.dir.join(USER_DB_FILE)
    }

    /// Authentication is enabled once the user file exists
    pub fn user_file_exists(&self) -> bool {
        self.user_file().is_file()
    }

    fn load(&self) -> std::result::Result<UserDb, AuthResult> {
        let path = self.user_file();
        if !path.exists() {
            return Err(AuthResult::NoFile);
        }
        let value = read_json(&path).map_err(|e| {
            warn!("Failed to read user database {:?}: {}", path, e);
            AuthResult::CorruptDb
        })?;
        if dti::check(&value, USER_DB_PATTERN).is_none() {
            warn!("User database {:?} has wrong document type", path);
            return Err(AuthResult::CorruptDb);
        }
        serde_json::from_value(value).map_err(|e| {
            warn!("Failed to parse user database {:?}: {}", path, e);
            AuthResult::CorruptDb
        })
    }

    fn load_or_err(&self) -> Result<UserDb> {
        self.load().map_err(|r| Error::auth(r.message()))
    }

    fn save(&self, db: &UserDb) -> Result<()> {
        let mut value = serde_json::to_value(db)?;
        if let Value::Object(map) = &mut value {
            map.insert(DTI_KEY.to_string(), Value::String(USER_DB_DTI.to_string()));
        }
        write_json_atomic(&self.user_file(), &value)
    }

    /// Add a user, creating the database if needed.
    ///
    /// An existing user is only replaced with `force`.
    pub fn add_user(
        &self,
        user: &str,
        password: &str,
        force: bool,
        expire: Option<DateTime<Utc>>,
        rights: &[String],
    ) -> Result<()> {
        let mut db = match self.load() {
            Ok(db) => db,
            Err(AuthResult::NoFile) => UserDb::default(),
            Err(other) => return Err(Error::auth(other.message())),
        };
        let users = db.users.get_or_insert_with(BTreeMap::new);

        if users.contains_key(user) && !force {
            return Err(Error::UserExists {
                user: user.to_string(),
            });
        }

        let hashed = hash_password(password);
        users.insert(
            user.to_string(),
            UserRecord {
                user: user.to_string(),
                key: Some(hashed.key),
                salt: Some(hashed.salt),
                expire: expire.map(|dt| dt.timestamp()).unwrap_or(0),
                rights: rights.to_vec(),
            },
        );
        self.save(&db)?;
        info!("Stored user '{}' in {:?}", user, self.user_file());
        Ok(())
    }

    pub fn set_user_password(&self, user: &str, password: &str) -> Result<()> {
        let mut db = self.load_or_err()?;
        let Some(users) = db.users.as_mut() else {
            return Err(Error::auth(AuthResult::CorruptDb.message()));
        };
        let Some(record) = users.get_mut(user) else {
            return Err(Error::auth(AuthResult::InvalidId.message()));
        };
        let hashed = hash_password(password);
        record.key = Some(hashed.key);
        record.salt = Some(hashed.salt);
        self.save(&db)
    }

    /// Check credentials. An unknown user gives [`AuthResult::InvalidId`].
    pub fn test_username_password(&self, user: &str, password: &str) -> AuthResult {
        let db = match self.load() {
            Ok(db) => db,
            Err(result) => return result,
        };
        let Some(users) = db.users.as_ref() else {
            return AuthResult::CorruptDb;
        };
        let Some(record) = users.get(user) else {
            return AuthResult::InvalidId;
        };
        let (Some(key), Some(salt)) = (&record.key, &record.salt) else {
            return AuthResult::CorruptDb;
        };
        match verify_password(password, key, salt) {
            Ok(true) => {}
            Ok(false) => return AuthResult::InvalidUser,
            Err(_) => return AuthResult::CorruptDb,
        }
        if is_expired(record.expire, now_timestamp()) {
            return AuthResult::Expired;
        }
        AuthResult::Valid
    }

    /// Create a link id in namespace `link` owned by `user`.
    ///
    /// Returns `None` when the user is unknown or no database exists.
    pub fn provide_public_link_id(
        &self,
        user: &str,
        link: &str,
        expire: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let mut db = match self.load() {
            Ok(db) => db,
            Err(AuthResult::NoFile) => return Ok(None),
            Err(other) => return Err(Error::auth(other.message())),
        };
        let known = db
            .users
            .as_ref()
            .map(|u| u.contains_key(user))
            .unwrap_or(false);
        if !known {
            return Ok(None);
        }

        let now = now_timestamp();
        let ids = db
            .links
            .get_or_insert_with(BTreeMap::new)
            .entry(link.to_string())
            .or_default();
        ids.retain(|_, rec| rec.expire > now);

        let id = uuid::Uuid::new_v4().simple().to_string();
        ids.insert(
            id.clone(),
            LinkRecord {
                id: id.clone(),
                link: link.to_string(),
                user: user.to_string(),
                created: now,
                expire: expire.timestamp(),
            },
        );
        self.save(&db)?;
        debug!("Created public link id for '{}'", link);
        Ok(Some(id))
    }

    /// Check a link id. With `remove_if_valid` a valid id is deleted, so it
    /// can be used once.
    pub fn test_public_link_id(&self, link: &str, id: &str, remove_if_valid: bool) -> AuthResult {
        let mut db = match self.load() {
            Ok(db) => db,
            Err(result) => return result,
        };
        let Some(links) = db.links.as_mut() else {
            return AuthResult::CorruptDb;
        };
        let Some(ids) = links.get_mut(link) else {
            return AuthResult::InvalidLink;
        };
        let Some(record) = ids.get(id) else {
            return AuthResult::InvalidId;
        };
        if record.expire <= now_timestamp() {
            return AuthResult::Expired;
        }

        if remove_if_valid {
            ids.remove(id);
            if let Err(e) = self.save(&db) {
                error!("Failed to consume public link id: {}", e);
                return AuthResult::CorruptDb;
            }
        }
        AuthResult::Valid
    }

    pub fn user_rights(&self, user: &str) -> Result<Vec<String>> {
        let db = self.load_or_err()?;
        let users = db
            .users
            .ok_or_else(|| Error::auth(AuthResult::CorruptDb.message()))?;
        users
            .get(user)
            .map(|r| r.rights.clone())
            .ok_or_else(|| Error::auth(AuthResult::InvalidId.message()))
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.load()
            .ok()
            .and_then(|db| db.users)
            .map(|u| u.contains_key(user))
            .unwrap_or(false)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, AuthStore) {
        let temp = TempDir::new().unwrap();
        let store = AuthStore::new(temp.path());
        (temp, store)
    }

    fn rights(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_messages() {
        assert_eq!(AuthResult::NoFile.message(), "Authentication database missing");
        assert_eq!(AuthResult::CorruptDb.message(), "Authentication database corrupted");
        assert_eq!(AuthResult::InvalidId.message(), "Invalid link");
        assert_eq!(AuthResult::InvalidLink.message(), "Invalid link");
        assert_eq!(AuthResult::InvalidUser.message(), "Invalid username or password");
        assert_eq!(AuthResult::Expired.message(), "Authentication expired");
    }

    #[test]
    fn test_add_user_and_login() {
        let (_temp, store) = store();
        assert!(!store.user_file_exists());
        store.add_user("alice", "secret", false, None, &rights(&["default"])).unwrap();
        assert!(store.user_file_exists());

        assert_eq!(store.test_username_password("alice", "secret"), AuthResult::Valid);
        assert_eq!(store.test_username_password("alice", "wrong"), AuthResult::InvalidUser);
        assert_eq!(store.test_username_password("bob", "secret"), AuthResult::InvalidId);
    }

    #[test]
    fn test_file_layout() {
        let (_temp, store) = store();
        store.add_user("alice", "secret", false, None, &[]).unwrap();
        let raw = read_json(&store.user_file()).unwrap();
        assert_eq!(raw["sDTI"], USER_DB_DTI);
        assert_eq!(raw["mUser"]["alice"]["sUser"], "alice");
        assert_eq!(raw["mUser"]["alice"]["iExpire"], 0);
    }

    #[test]
    fn test_add_existing_user_requires_force() {
        let (_temp, store) = store();
        store.add_user("alice", "one", false, None, &[]).unwrap();
        let err = store.add_user("alice", "two", false, None, &[]).unwrap_err();
        assert!(matches!(err, Error::UserExists { .. }));
        assert_eq!(store.test_username_password("alice", "one"), AuthResult::Valid);

        store.add_user("alice", "two", true, None, &[]).unwrap();
        assert_eq!(store.test_username_password("alice", "two"), AuthResult::Valid);
    }

    #[test]
    fn test_expired_user() {
        let (_temp, store) = store();
        let past = Utc::now() - Duration::seconds(5);
        store.add_user("old", "pw", false, Some(past), &[]).unwrap();
        assert_eq!(store.test_username_password("old", "pw"), AuthResult::Expired);
        assert_eq!(store.test_username_password("old", "bad"), AuthResult::InvalidUser);
    }

    #[test]
    fn test_no_file_results() {
        let (_temp, store) = store();
        assert_eq!(store.test_username_password("a", "b"), AuthResult::NoFile);
        assert_eq!(store.test_public_link_id("x", "y", false), AuthResult::NoFile);
        assert!(store.set_user_password("a", "b").is_err());
        assert!(!store.has_user("a"));
        assert_eq!(
            store
                .provide_public_link_id("a", "x", Utc::now() + Duration::days(1))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_corrupt_db() {
        let (_temp, store) = store();
        write_json_atomic(&store.user_file(), &json!({"sDTI": USER_DB_DTI, "mUser": 5})).unwrap();
        assert_eq!(store.test_username_password("a", "b"), AuthResult::CorruptDb);

        write_json_atomic(&store.user_file(), &json!({"sDTI": USER_DB_DTI})).unwrap();
        assert_eq!(store.test_username_password("a", "b"), AuthResult::CorruptDb);
        assert_eq!(store.test_public_link_id("x", "y", false), AuthResult::CorruptDb);

        std::fs::write(store.user_file(), "not json").unwrap();
        assert_eq!(store.test_username_password("a", "b"), AuthResult::CorruptDb);
    }

    #[test]
    fn test_set_user_password() {
        let (_temp, store) = store();
        store.add_user("alice", "one", false, None, &[]).unwrap();
        store.set_user_password("alice", "two").unwrap();
        assert_eq!(store.test_username_password("alice", "two"), AuthResult::Valid);
        assert_eq!(store.test_username_password("alice", "one"), AuthResult::InvalidUser);

        let err = store.set_user_password("bob", "x").unwrap_err();
        assert!(err.to_string().contains("Invalid link"));
    }

    #[test]
    fn test_public_link_single_use() {
        let (_temp, store) = store();
        store.add_user("alice", "pw", false, None, &[]).unwrap();
        let expire = Utc::now() + Duration::minutes(10);
        let id = store
            .provide_public_link_id("alice", "resetpw/alice", expire)
            .unwrap()
            .unwrap();
        assert_eq!(id.len(), 32);

        assert_eq!(store.test_public_link_id("resetpw/alice", &id, false), AuthResult::Valid);
        assert_eq!(store.test_public_link_id("resetpw/alice", &id, true), AuthResult::Valid);
        assert_eq!(store.test_public_link_id("resetpw/alice", &id, true), AuthResult::InvalidId);
    }

    #[test]
    fn test_consuming_one_id_keeps_others() {
        let (_temp, store) = store();
        store.add_user("alice", "pw", false, None, &[]).unwrap();
        let expire = Utc::now() + Duration::minutes(10);
        let first = store.provide_public_link_id("alice", "ns", expire).unwrap().unwrap();
        let second = store.provide_public_link_id("alice", "ns", expire).unwrap().unwrap();

        assert_eq!(store.test_public_link_id("ns", &first, true), AuthResult::Valid);
        assert_eq!(store.test_public_link_id("ns", &first, true), AuthResult::InvalidId);
        assert_eq!(store.test_public_link_id("ns", &second, false), AuthResult::Valid);
    }

    #[test]
    fn test_public_link_checks() {
        let (_temp, store) = store();
        store.add_user("alice", "pw", false, None, &[]).unwrap();
        assert_eq!(
            store
                .provide_public_link_id("bob", "ns", Utc::now() + Duration::days(1))
                .unwrap(),
            None
        );

        let id = store
            .provide_public_link_id("alice", "ns", Utc::now() + Duration::days(1))
            .unwrap()
            .unwrap();
        assert_eq!(store.test_public_link_id("other", &id, false), AuthResult::InvalidLink);
        assert_eq!(store.test_public_link_id("ns", "nope", false), AuthResult::InvalidId);
    }

    #[test]
    fn test_expired_link_not_consumed() {
        let (_temp, store) = store();
        store.add_user("alice", "pw", false, None, &[]).unwrap();
        let id = store
            .provide_public_link_id("alice", "ns", Utc::now() - Duration::seconds(1))
            .unwrap()
            .unwrap();
        assert_eq!(store.test_public_link_id("ns", &id, true), AuthResult::Expired);
        assert_eq!(store.test_public_link_id("ns", &id, true), AuthResult::Expired);
    }

    #[test]
    fn test_rights_and_has_user() {
        let (_temp, store) = store();
        store
            .add_user("root", "pw", false, None, &rights(&["default", "admin"]))
            .unwrap();
        assert_eq!(store.user_rights("root").unwrap(), rights(&["default", "admin"]));
        assert!(store.user_rights("nobody").is_err());
        assert!(store.has_user("root"));
        assert!(!store.has_user("nobody"));
    }
}
