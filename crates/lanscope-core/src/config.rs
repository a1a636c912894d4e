// ── Runtime session configuration ──
//
// Describes *how* a session talks to the scan backend and how often it
// polls. Core never reads config files: the CLI builds a `SessionConfig`
// (usually via `lanscope-config`) and hands it in.

use std::time::Duration;

use url::Url;

pub use lanscope_api::TlsMode;

/// Default cadence between device fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a single backend session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend root, e.g. `http://localhost:8080`.
    pub base_endpoint: Url,
    /// Cadence between fetches. `Duration::ZERO` disables periodic polling;
    /// scope entry and explicit refreshes still fetch.
    pub poll_interval: Duration,
    /// Request timeout handed to the transport.
    pub timeout: Duration,
    pub tls: TlsMode,
    /// Refresh scan history on the device cadence as well.
    pub poll_history: bool,
}

impl SessionConfig {
    pub fn new(base_endpoint: Url) -> Self {
        Self {
            base_endpoint,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            tls: TlsMode::default(),
            poll_history: true,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    #[must_use]
    pub fn with_history_polling(mut self, enabled: bool) -> Self {
        self.poll_history = enabled;
        self
    }

    /// Transport settings derived from this config.
    pub fn transport(&self) -> lanscope_api::TransportConfig {
        lanscope_api::TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
