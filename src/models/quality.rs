//! Recall quality reported after a review, 0 (blackout) to 5 (perfect).
use crate::error::{Result, SrsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const BLACKOUT: Quality = Quality(0);
    pub const INCORRECT: Quality = Quality(1);
    pub const FAMILIAR: Quality = Quality(2);
    pub const DIFFICULT: Quality = Quality(3);
    pub const HESITANT: Quality = Quality(4);
    pub const PERFECT: Quality = Quality(5);

    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        Self::try_from(i64::from(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Failed recall: resets the repetition streak.
    pub fn is_lapse(self) -> bool {
        self.0 < 3
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "blackout",
            1 => "incorrect",
            2 => "familiar",
            3 => "difficult",
            4 => "hesitant",
            _ => "perfect",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "blackout" => Some(Self::BLACKOUT),
            "incorrect" => Some(Self::INCORRECT),
            "familiar" => Some(Self::FAMILIAR),
            "difficult" => Some(Self::DIFFICULT),
            "hesitant" => Some(Self::HESITANT),
            "perfect" => Some(Self::PERFECT),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Quality {
    type Error = SrsError;

    fn try_from(value: i64) -> Result<Self> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(SrsError::InvalidQuality(value))
        }
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

/// Accepts either the number or the button label.
impl FromStr for Quality {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(q) = Self::from_label(s) {
            return Ok(q);
        }
        match s.parse::<i64>() {
            Ok(n) => Self::try_from(n),
            Err(_) => Err(SrsError::UnknownQualityLabel(s.to_string())),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}
