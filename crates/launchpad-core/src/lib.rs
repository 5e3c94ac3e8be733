pub mod cache;
pub mod checklist;
pub mod config;
pub mod error;
pub mod io;
pub mod launchpad;
pub mod listing;
pub mod paths;
pub mod project;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;

pub use cache::{CacheEntry, CacheEvent, QueryCache, QueryKey, Staleness, Subscription};
pub use checklist::{ChecklistItem, Progress};
pub use config::Config;
pub use error::{LaunchpadError, Result};
pub use launchpad::{Launchpad, ProjectCard};
pub use listing::{ListingField, StoreListing};
pub use project::Project;
pub use session::EditSession;
pub use store::{AnyStore, LocalStore, Record, RemoteStore, RestStore};
pub use sync::{FieldSynchronizer, SyncOutcome};

/// Lock a std mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(m: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
