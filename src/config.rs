//! Server configuration.
//!
//! ```
//! use fading_tictactoe::config::ServerConfig;
//!
//! let config = ServerConfig::new()
//!     .with_bind_addr("127.0.0.1:4000")
//!     .with_room_code_length(8);
//! assert_eq!(config.room_code_length, 8);
//! ```

use tracing::warn;

use crate::room::DEFAULT_ROOM_CODE_LENGTH;
pub use crate::room::MIN_ROOM_CODE_LENGTH;

/// Address the server listens on unless configured otherwise.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";

/// Environment variable overriding [`ServerConfig::bind_addr`].
pub const BIND_ADDR_ENV: &str = "FADING_TTT_BIND";

/// Environment variable overriding [`ServerConfig::room_code_length`].
pub const ROOM_CODE_LENGTH_ENV: &str = "FADING_TTT_ROOM_CODE_LENGTH";

/// Configuration for the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub bind_addr: String,
    /// Length of generated room codes, at least [`MIN_ROOM_CODE_LENGTH`].
    pub room_code_length: usize,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            room_code_length: DEFAULT_ROOM_CODE_LENGTH,
        }
    }

    /// Defaults overridden by `FADING_TTT_BIND` and
    /// `FADING_TTT_ROOM_CODE_LENGTH`. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();
        if let Some(addr) = lookup(BIND_ADDR_ENV) {
            config = config.with_bind_addr(addr);
        }
        if let Some(raw) = lookup(ROOM_CODE_LENGTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(length) => config = config.with_room_code_length(length),
                Err(e) => warn!(
                    var = ROOM_CODE_LENGTH_ENV,
                    value = %raw,
                    error = %e,
                    "ignoring invalid room code length"
                ),
            }
        }
        config
    }

    #[must_use]
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the room code length, clamped to at least [`MIN_ROOM_CODE_LENGTH`].
    #[must_use]
    pub fn with_room_code_length(mut self, length: usize) -> Self {
        self.room_code_length = length.max(MIN_ROOM_CODE_LENGTH);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
