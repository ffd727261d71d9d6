//! Authentication
//!
//! - [`password`] - PBKDF2-HMAC-SHA256 hashing
//! - [`store`] - The persisted user and public link database
//! - [`login`] - Per-client login state

pub mod login;
pub mod password;
pub mod store;

pub use login::{add_user_temp_password, LoginState, ADMIN_RIGHT, DEFAULT_RIGHT, PUBLIC_USER};
pub use password::{hash_password, verify_password, HashedPassword};
pub use store::{AuthResult, AuthStore, LinkRecord, UserRecord, USER_DB_FILE};
