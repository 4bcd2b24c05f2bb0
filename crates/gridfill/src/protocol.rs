//! Replay request/response contract and multi-frame aggregation.
//!
//! A replay runs once in every frame of the target tab. Each frame answers
//! with one of two JSON shapes:
//!
//! ```text
//! {"success":false,"error":"NO_ANCHOR"}
//! {"success":true,"total":<records>,"count":<injected>}
//! ```
//!
//! [`aggregate_frames`] folds the per-frame answers into one outcome.

use crate::append::AppendConfig;
use crate::driver::FormDriver;
use crate::locator::GridSelectors;
use crate::replay::FormReplayer;
use crate::result::{GridfillError, GridfillResult};
use crate::timing::TimingProfile;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contract version carried by every request
pub const PROTOCOL_VERSION: u32 = 1;

/// Tab presses per record for the fixed trigger
pub const DEFAULT_STRIDE: u32 = 2;

/// Error code of the no-anchor response
pub const NO_ANCHOR: &str = "NO_ANCHOR";

/// Tab presses between consecutive records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stride {
    /// [`DEFAULT_STRIDE`] presses
    #[default]
    Fixed,
    /// User-chosen press count
    Custom(u32),
}

impl Stride {
    /// Press count
    #[must_use]
    pub const fn presses(self) -> u32 {
        match self {
            Self::Fixed => DEFAULT_STRIDE,
            Self::Custom(n) => n,
        }
    }
}

impl From<Option<u32>> for Stride {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Fixed, Self::Custom)
    }
}

impl fmt::Display for Stride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "{DEFAULT_STRIDE} (fixed)"),
            Self::Custom(n) => write!(f, "{n}"),
        }
    }
}

/// Everything a frame needs to replay the records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    /// Contract version
    pub version: u32,
    /// Records, in order
    pub records: Vec<String>,
    /// Tab presses between records
    pub stride: u32,
    /// Append policy
    pub append: AppendConfig,
    /// Active timing profile
    pub timing: TimingProfile,
}

impl ReplayRequest {
    /// Current-version request
    #[must_use]
    pub fn new(
        records: Vec<String>,
        stride: Stride,
        append: AppendConfig,
        timing: TimingProfile,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            records,
            stride: stride.presses(),
            append,
            timing,
        }
    }

    /// Reject requests this build cannot honor
    pub fn validate(&self) -> GridfillResult<()> {
        if self.version != PROTOCOL_VERSION {
            return Err(GridfillError::invalid_request(format!(
                "unsupported protocol version {} (expected {PROTOCOL_VERSION})",
                self.version
            )));
        }
        if self.stride == 0 {
            return Err(GridfillError::invalid_request("stride must be at least 1"));
        }
        Ok(())
    }
}

/// One frame's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireResponse", into = "WireResponse")]
pub enum ReplayResponse {
    /// No anchor field; nothing was touched
    NoAnchor,
    /// Every record was processed
    Completed {
        /// Records in the request
        total: usize,
        /// Records written into a field
        count: usize,
    },
}

impl ReplayResponse {
    /// Whether the frame replayed
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireResponse {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

impl From<ReplayResponse> for WireResponse {
    fn from(value: ReplayResponse) -> Self {
        match value {
            ReplayResponse::NoAnchor => Self {
                success: false,
                error: Some(NO_ANCHOR.to_string()),
                total: None,
                count: None,
            },
            ReplayResponse::Completed { total, count } => Self {
                success: true,
                error: None,
                total: Some(total),
                count: Some(count),
            },
        }
    }
}

impl TryFrom<WireResponse> for ReplayResponse {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        match wire {
            WireResponse {
                success: true,
                total: Some(total),
                count: Some(count),
                ..
            } => Ok(Self::Completed { total, count }),
            WireResponse { success: true, .. } => {
                Err("successful response without total/count".to_string())
            }
            WireResponse {
                error: Some(code), ..
            } if code == NO_ANCHOR => Ok(Self::NoAnchor),
            WireResponse { error, .. } => Err(format!(
                "unrecognized error code {}",
                error.as_deref().unwrap_or("<none>")
            )),
        }
    }
}

/// Aggregate outcome across frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Folded response
    pub response: ReplayResponse,
    /// Frames that answered
    pub frames_answered: usize,
    /// Frames that replayed
    pub frames_succeeded: usize,
}

/// Fold per-frame answers.
///
/// Any successful frame makes the replay a success: `total` comes from a
/// successful frame and counts are summed over successful frames. When no
/// frame succeeded but at least one reported no anchor, the result is
/// [`ReplayResponse::NoAnchor`]. When no frame answered at all the host page
/// is the wrong one and the replay failed.
pub fn aggregate_frames(
    results: impl IntoIterator<Item = GridfillResult<ReplayResponse>>,
) -> GridfillResult<ReplaySummary> {
    let mut total = None;
    let mut count = 0;
    let mut answered = 0;
    let mut succeeded = 0;
    let mut failures = Vec::new();

    for result in results {
        match result {
            Ok(ReplayResponse::Completed { total: t, count: c }) => {
                answered += 1;
                succeeded += 1;
                total.get_or_insert(t);
                count += c;
            }
            Ok(ReplayResponse::NoAnchor) => answered += 1,
            Err(e) => failures.push(e.to_string()),
        }
    }

    let response = match total {
        Some(total) => ReplayResponse::Completed { total, count },
        None if answered > 0 => ReplayResponse::NoAnchor,
        None if failures.is_empty() => {
            return Err(GridfillError::injection_failed("no frame answered"));
        }
        None => return Err(GridfillError::injection_failed(failures.join("; "))),
    };

    Ok(ReplaySummary {
        response,
        frames_answered: answered,
        frames_succeeded: succeeded,
    })
}

/// Replay in every frame concurrently and fold the answers
pub async fn replay_frames<D: FormDriver>(
    frames: &[D],
    request: &ReplayRequest,
    selectors: &GridSelectors,
) -> GridfillResult<ReplaySummary> {
    request.validate()?;
    let runs = frames.iter().map(|frame| async move {
        let outcome = FormReplayer::new(frame)
            .with_target_cell(selectors.target_cell)
            .run(request)
            .await;
        if let Err(e) = &outcome {
            tracing::warn!(frame = %frame.label(), error = %e, "frame replay failed");
        }
        outcome
    });
    aggregate_frames(join_all(runs).await)
}
