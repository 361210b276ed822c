//! Runtime settings for the audit services.

use std::time::Duration;

use super::labels::Locale;

/// Feature toggles and limits shared by the recorder, query service and
/// rollback engine. Loaded once at startup from the `audit` config section.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    /// Master switch for recording.
    pub enabled: bool,
    /// Switch for the rollback engine.
    pub rollback_enabled: bool,
    pub default_page_size: i64,
    pub max_page_size: i64,
    /// How long a looked-up network origin is reused.
    pub origin_cache_ttl: Duration,
    /// Upper bound on a single store or lookup call.
    pub io_timeout: Duration,
    pub locale: Locale,
    /// Refuse rollbacks when the live entity no longer matches the entry's
    /// `afterData`.
    pub verify_current_state: bool,
}

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 100;

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rollback_enabled: true,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            origin_cache_ttl: Duration::from_secs(300),
            io_timeout: Duration::from_millis(5000),
            locale: Locale::default(),
            verify_current_state: false,
        }
    }
}
