pub mod sqlite;

use crate::app::Result;
use crate::domain::Identity;

pub use sqlite::SqliteIdentityStore;

/// Durable storage for posting identities, keyed by identity name.
pub trait IdentityStore {
    fn add(&self, identity: &Identity) -> Result<()>;
    fn remove(&self, name: &str) -> Result<()>;
    fn find_by_name(&self, name: &str) -> Result<Option<Identity>>;
    fn list(&self) -> Result<Vec<Identity>>;

    // Selection
    fn get_current(&self) -> Result<Option<Identity>>;
    fn set_current(&self, name: &str) -> Result<()>;
    fn clear_current(&self) -> Result<()>;
}
