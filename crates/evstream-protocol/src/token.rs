//! Stream cursor tokens.
//!
//! A token marks a position in the remote event stream. The client never
//! inspects or builds tokens itself; it only echoes back what the server
//! handed out, or one of the two sentinels below.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque position in the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamToken(String);

impl StreamToken {
    /// Sentinel for "the live end of the stream". Polling from here only
    /// returns events that arrive after the request.
    pub const END: &'static str = "END";

    /// Sentinel for the very beginning of the stream.
    pub const START: &'static str = "START";

    /// Create a token from a server-issued value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The `END` sentinel token.
    #[must_use]
    pub fn end() -> Self {
        Self(Self::END.to_string())
    }

    /// The `START` sentinel token.
    #[must_use]
    pub fn start() -> Self {
        Self(Self::START.to_string())
    }

    /// Whether this is the `END` sentinel.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.0 == Self::END
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StreamToken {
    fn default() -> Self {
        Self::end()
    }
}

impl fmt::Display for StreamToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StreamToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StreamToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
