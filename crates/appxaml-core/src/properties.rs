//! Well-known application properties.

use std::fmt;
use std::str::FromStr;

/// Name of the property holding the startup document reference.
pub const STARTUP_URI: &str = "StartupUri";

/// Name of the property holding the shutdown policy.
pub const SHUTDOWN_MODE: &str = "ShutdownMode";

/// When the application shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShutdownMode {
    /// When the last window closes, or on explicit shutdown.
    #[default]
    OnLastWindowClose,
    /// When the main window closes, or on explicit shutdown.
    OnMainWindowClose,
    /// Only on explicit shutdown.
    OnExplicitShutdown,
}

impl ShutdownMode {
    /// All modes, in declaration order.
    pub const ALL: [ShutdownMode; 3] = [
        ShutdownMode::OnLastWindowClose,
        ShutdownMode::OnMainWindowClose,
        ShutdownMode::OnExplicitShutdown,
    ];

    /// The markup spelling of the mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnLastWindowClose => "OnLastWindowClose",
            Self::OnMainWindowClose => "OnMainWindowClose",
            Self::OnExplicitShutdown => "OnExplicitShutdown",
        }
    }
}

impl fmt::Display for ShutdownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that names no [`ShutdownMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid shutdown mode")]
pub struct UnknownShutdownMode(pub String);

impl FromStr for ShutdownMode {
    type Err = UnknownShutdownMode;

    /// Parse a mode name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownShutdownMode(s.to_string()))
    }
}
