//! WebSocket close codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Close code reported when a console stream ends.
///
/// Only [`CloseCode::NORMAL`] counts as a clean shutdown; every other code
/// puts the subscription into the error status.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CloseCode(u16);

impl CloseCode {
    /// Normal closure.
    pub const NORMAL: CloseCode = CloseCode(1000);
    /// Server going away (shutdown, restart).
    pub const GOING_AWAY: CloseCode = CloseCode(1001);
    /// A close frame arrived without a status code.
    pub const NO_STATUS: CloseCode = CloseCode(1005);
    /// The connection dropped without a close frame, or never opened.
    pub const ABNORMAL: CloseCode = CloseCode(1006);

    /// Wrap a raw code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// The raw code.
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// True only for 1000.
    pub fn is_normal(&self) -> bool {
        *self == Self::NORMAL
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CloseCode({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_1000_is_normal() {
        assert!(CloseCode::new(1000).is_normal());
        assert!(!CloseCode::GOING_AWAY.is_normal());
        assert!(!CloseCode::NO_STATUS.is_normal());
        assert!(!CloseCode::ABNORMAL.is_normal());
        assert!(!CloseCode::from(4000).is_normal());
    }

    #[test]
    fn value_roundtrip() {
        assert_eq!(CloseCode::from(1005).value(), 1005);
        assert_eq!(CloseCode::NO_STATUS, CloseCode::new(1005));
    }
}
