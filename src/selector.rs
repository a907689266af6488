use std::fmt;

use serde::{Deserialize, Serialize};

/// how many hours ahead the alarm may go off
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct WindowHours(u8);

impl WindowHours {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 23;

    /// out of range values are clamped
    #[must_use]
    pub const fn new(hours: u8) -> Self {
        if hours < Self::MIN {
            Self(Self::MIN)
        } else if hours > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(hours)
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// returns true if the value changed
    pub fn increment(&mut self) -> bool {
        if self.0 < Self::MAX {
            self.0 += 1;
            true
        } else {
            false
        }
    }

    /// returns true if the value changed
    pub fn decrement(&mut self) -> bool {
        if self.0 > Self::MIN {
            self.0 -= 1;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn as_millis(self) -> i64 {
        i64::from(self.0) * 60 * 60 * 1000
    }
}

impl Default for WindowHours {
    fn default() -> Self {
        Self(12)
    }
}

impl From<u8> for WindowHours {
    fn from(hours: u8) -> Self {
        Self::new(hours)
    }
}

impl From<WindowHours> for u8 {
    fn from(hours: WindowHours) -> Self {
        hours.0
    }
}

impl fmt::Display for WindowHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hours", self.0)
    }
}
