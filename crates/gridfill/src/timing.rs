//! Speed presets and the timing profile they select.

use crate::result::{GridfillError, GridfillResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Five waits that pace a replay, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingProfile {
    /// Between key-down and key-up, and after key-up
    pub tab: u64,
    /// After a navigation burst, before resolving the next field
    pub after_tab: u64,
    /// After focusing a field
    pub focus: u64,
    /// Before the blur that commits a value
    pub blur: u64,
    /// Between records
    pub next: u64,
}

impl TimingProfile {
    /// Inter-key delay
    #[must_use]
    pub const fn tab_delay(&self) -> Duration {
        Duration::from_millis(self.tab)
    }

    /// Post-navigation settle delay
    #[must_use]
    pub const fn after_tab_delay(&self) -> Duration {
        Duration::from_millis(self.after_tab)
    }

    /// Focus settle delay
    #[must_use]
    pub const fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus)
    }

    /// Blur settle delay
    #[must_use]
    pub const fn blur_delay(&self) -> Duration {
        Duration::from_millis(self.blur)
    }

    /// Inter-record delay
    #[must_use]
    pub const fn next_delay(&self) -> Duration {
        Duration::from_millis(self.next)
    }

    /// Lower bound of the time spent on `records` records with `stride`
    /// presses between them, ignoring fallbacks.
    #[must_use]
    pub fn estimate(&self, records: usize, stride: u32) -> Duration {
        if records == 0 {
            return Duration::ZERO;
        }
        let per_record = self.focus + self.blur + self.next;
        let per_move = u64::from(stride) * self.tab * 2 + self.after_tab;
        let records = records as u64;
        Duration::from_millis(records * per_record + (records - 1) * per_move)
    }
}

impl Default for TimingProfile {
    fn default() -> Self {
        SpeedPreset::default().profile()
    }
}

/// Named speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    /// Shortest waits
    Fastest,
    /// Short waits
    Fast,
    /// Default pacing
    #[default]
    Normal,
    /// Long waits
    Slow,
    /// Longest waits, for sluggish pages
    Slowest,
}

impl SpeedPreset {
    /// Every preset, fastest first
    pub const ALL: [Self; 5] = [
        Self::Fastest,
        Self::Fast,
        Self::Normal,
        Self::Slow,
        Self::Slowest,
    ];

    /// Timing profile selected by this preset
    #[must_use]
    pub const fn profile(self) -> TimingProfile {
        let (tab, after_tab, focus, blur, next) = match self {
            Self::Fastest => (30, 40, 10, 30, 80),
            Self::Fast => (50, 60, 20, 50, 120),
            Self::Normal => (80, 100, 30, 80, 200),
            Self::Slow => (120, 150, 50, 120, 300),
            Self::Slowest => (200, 250, 80, 180, 400),
        };
        TimingProfile {
            tab,
            after_tab,
            focus,
            blur,
            next,
        }
    }

    /// Persisted name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fastest => "fastest",
            Self::Fast => "fast",
            Self::Normal => "normal",
            Self::Slow => "slow",
            Self::Slowest => "slowest",
        }
    }
}

impl fmt::Display for SpeedPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpeedPreset {
    type Err = GridfillError;

    fn from_str(s: &str) -> GridfillResult<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| GridfillError::UnknownPreset {
                name: s.to_string(),
            })
    }
}
