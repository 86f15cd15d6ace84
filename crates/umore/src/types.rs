use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of squares in the year grid
pub const DAYS_IN_GRID: usize = 365;

/// The color recorded for a single day.
///
/// Serialized as the CSS color name, so a stored grid is a plain JSON array
/// of strings like `["lightgray", "yellow", "white", ...]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Mood {
    /// Nothing recorded (past or future day)
    #[serde(rename = "lightgray")]
    Unset,

    /// Nothing recorded yet for today
    #[serde(rename = "white")]
    TodayUnset,

    #[serde(rename = "yellow")]
    Happy,

    #[serde(rename = "darkblue")]
    Sad,

    #[serde(rename = "darkgreen")]
    Sick,

    #[serde(rename = "darkred")]
    Anxious,

    #[serde(rename = "purple")]
    Energetic,

    #[serde(rename = "pink")]
    Relaxed,

    #[serde(rename = "darkorange")]
    Amazing,
}

impl Mood {
    /// Selectable moods, in picker order
    pub const PALETTE: [Mood; 7] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Sick,
        Mood::Anxious,
        Mood::Energetic,
        Mood::Relaxed,
        Mood::Amazing,
    ];

    /// Default value for a day that has nothing recorded
    pub fn default_for(index: usize, today_index: usize) -> Self {
        if index == today_index {
            Mood::TodayUnset
        } else {
            Mood::Unset
        }
    }

    /// True for the two "nothing recorded" values
    pub fn is_sentinel(self) -> bool {
        matches!(self, Mood::Unset | Mood::TodayUnset)
    }

    /// CSS color used to paint the square
    pub fn color(self) -> &'static str {
        match self {
            Mood::Unset => "lightgray",
            Mood::TodayUnset => "white",
            Mood::Happy => "yellow",
            Mood::Sad => "darkblue",
            Mood::Sick => "darkgreen",
            Mood::Anxious => "darkred",
            Mood::Energetic => "purple",
            Mood::Relaxed => "pink",
            Mood::Amazing => "darkorange",
        }
    }

    /// Human-readable name shown in the mood picker
    pub fn label(self) -> &'static str {
        match self {
            Mood::Unset => "Unset",
            Mood::TodayUnset => "Today",
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Sick => "Sick",
            Mood::Anxious => "Anxious",
            Mood::Energetic => "Energetic",
            Mood::Relaxed => "Relaxed",
            Mood::Amazing => "Amazing",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.color())
    }
}

/// Returned when a string names no known mood color
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mood color: {0}")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    /// Accepts either the color ("yellow") or the label ("Happy"), case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        [Mood::Unset, Mood::TodayUnset]
            .into_iter()
            .chain(Mood::PALETTE)
            .find(|m| m.color() == needle || m.label().to_lowercase() == needle)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}
