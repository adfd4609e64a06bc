use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::allocator::TurfLocks;
use crate::services::notify::NotificationDispatcher;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub notifier: Box<dyn NotificationDispatcher>,
    pub turf_locks: TurfLocks,
}
