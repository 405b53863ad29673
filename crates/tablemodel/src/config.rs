use std::time::Duration;

/// Configuration for a [`Database`](crate::Database) context.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Reuse prepared statements keyed by SQL text.
    pub statement_cache: bool,
    /// Emit a `debug` event for every executed statement.
    pub logging_enabled: bool,
    /// Statements slower than this emit a `warn` event.
    pub slow_query_threshold: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            statement_cache: true,
            logging_enabled: true,
            slow_query_threshold: None,
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable prepared statement reuse.
    ///
    /// With the cache off every execution prepares its SQL again.
    pub fn statement_cache(mut self, enabled: bool) -> Self {
        self.statement_cache = enabled;
        self
    }

    /// Enable per-statement logging.
    pub fn with_logging(mut self) -> Self {
        self.logging_enabled = true;
        self
    }

    /// Disable per-statement logging.
    pub fn no_logging(mut self) -> Self {
        self.logging_enabled = false;
        self
    }

    /// Set slow query threshold.
    pub fn slow_threshold(mut self, duration: Duration) -> Self {
        self.slow_query_threshold = Some(duration);
        self
    }
}
