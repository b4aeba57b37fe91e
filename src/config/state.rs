// Application state module
// Shared between all connections: configuration, the book store and cached flags

use tokio::sync::RwLock;

use super::types::Config;
use crate::store::BookStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub books: RwLock<BookStore>,

    // Cached config values for fast access without locks
    pub cached_access_log: bool,
}

impl AppState {
    /// Create `AppState`, seeding the store when configured to
    pub fn new(config: Config) -> Self {
        let store = if config.store.seed {
            BookStore::seeded()
        } else {
            BookStore::default()
        };
        Self::with_store(config, store)
    }

    /// Create `AppState` around an existing store
    pub fn with_store(config: Config, store: BookStore) -> Self {
        let cached_access_log = config.logging.access_log;

        Self {
            config,
            books: RwLock::new(store),
            cached_access_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_from_config() {
        let mut config = Config::default();
        config.logging.access_log = false;
        config.store.seed = false;
        let state = AppState::new(config);
        assert!(!state.cached_access_log);
        assert_eq!(state.books.read().await.len(), 0);

        let state = AppState::new(Config::default());
        assert!(state.cached_access_log);
        assert_eq!(state.books.read().await.len(), 5);
    }
}
