//! Run command handler

use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::RunArgs;
use gridfill::{
    replay_frames, FormDriver, GridSelectors, Panel, ReplayRequest, ReplayResponse, ReplaySummary,
    SpeedPreset, StateStore,
};
use std::path::Path;
use std::time::Instant;

/// Grid selectors from a YAML override file, or the defaults
pub fn load_selectors(path: Option<&Path>) -> CliResult<GridSelectors> {
    match path {
        Some(path) => Ok(GridSelectors::from_yaml_file(path)?),
        None => Ok(GridSelectors::default()),
    }
}

/// Build the replay request from the stored records and the run flags.
///
/// `--speed` applies to this run only; the stored selection is untouched.
pub fn build_request<S: StateStore>(panel: &Panel<S>, args: &RunArgs) -> CliResult<ReplayRequest> {
    let mut request = panel.prepare_replay(args.stride(), args.append_config())?;
    if let Some(speed) = args.speed {
        request.timing = SpeedPreset::from(speed).profile();
    }
    Ok(request)
}

/// Replay into `frames` and report the outcome.
///
/// A replay where no frame had a focused field is turned into
/// [`CliError::NoAnchor`].
pub async fn replay_into<D: FormDriver>(
    frames: &[D],
    request: &ReplayRequest,
    selectors: &GridSelectors,
    reporter: &mut ProgressReporter,
) -> CliResult<ReplaySummary> {
    let estimate = request.timing.estimate(request.records.len(), request.stride);
    reporter.start_spinner(
        &format!(
            "Writing {} records across {} frame(s)",
            request.records.len(),
            frames.len()
        ),
        estimate,
    );
    let started = Instant::now();
    let outcome = replay_frames(frames, request, selectors).await;
    reporter.finish();

    let summary = outcome?;
    tracing::info!(
        answered = summary.frames_answered,
        succeeded = summary.frames_succeeded,
        "replay finished"
    );
    match summary.response {
        ReplayResponse::NoAnchor => Err(CliError::NoAnchor),
        ReplayResponse::Completed { total, count } => {
            reporter.replay_summary(total, count, started.elapsed());
            Ok(summary)
        }
    }
}

/// Execute the run command against the browser named by `--cdp`
pub async fn execute_run<S: StateStore>(
    panel: &Panel<S>,
    reporter: &mut ProgressReporter,
    args: &RunArgs,
) -> CliResult<ReplaySummary> {
    let selectors = load_selectors(args.selectors.as_deref())?;
    let request = build_request(panel, args)?;
    replay_in_browser(&request, &selectors, args, reporter).await
}

#[cfg(feature = "browser")]
async fn replay_in_browser(
    request: &ReplayRequest,
    selectors: &GridSelectors,
    args: &RunArgs,
    reporter: &mut ProgressReporter,
) -> CliResult<ReplaySummary> {
    let session = gridfill::CdpSession::connect(&args.cdp, args.tab_url.as_deref()).await?;
    reporter.info(&format!("Attached to {}", session.url()));
    let frames = match session.frames(selectors).await {
        Ok(frames) => frames,
        Err(e) => {
            session.detach();
            return Err(e.into());
        }
    };
    let outcome = replay_into(&frames, request, selectors, reporter).await;
    session.detach();
    outcome
}

#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
async fn replay_in_browser(
    _request: &ReplayRequest,
    _selectors: &GridSelectors,
    _args: &RunArgs,
    _reporter: &mut ProgressReporter,
) -> CliResult<ReplaySummary> {
    Err(CliError::BrowserUnsupported)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{AppendArg, SpeedArg};
    use gridfill::{
        AppendConfig, ClipboardPayload, GridfillError, MemoryStore, MockGrid, TimingProfile,
        DEFAULT_SEPARATOR,
    };
    use tempfile::TempDir;

    fn run_args() -> RunArgs {
        RunArgs {
            stride: None,
            append: AppendArg::None,
            separator: DEFAULT_SEPARATOR.to_string(),
            speed: None,
            cdp: "ws://127.0.0.1:9/devtools/browser/none".to_string(),
            tab_url: None,
            selectors: None,
        }
    }

    fn panel_with(text: &str) -> Panel<MemoryStore> {
        let panel = Panel::new(MemoryStore::new());
        panel.paste(&ClipboardPayload::text(text)).unwrap();
        panel
    }

    mod request_tests {
        use super::*;

        #[test]
        fn test_stored_speed_is_used() {
            let panel = panel_with("a\nb");
            panel.select_speed(SpeedPreset::Slowest).unwrap();
            let request = build_request(&panel, &run_args()).unwrap();
            assert_eq!(request.timing, SpeedPreset::Slowest.profile());
            assert_eq!(request.stride, 2);
            assert_eq!(request.append, AppendConfig::overwrite());
        }

        #[test]
        fn test_speed_flag_is_not_persisted() {
            let panel = panel_with("a");
            let mut args = run_args();
            args.speed = Some(SpeedArg::Fastest);
            args.stride = Some(5);
            let request = build_request(&panel, &args).unwrap();
            assert_eq!(request.timing, SpeedPreset::Fastest.profile());
            assert_eq!(request.stride, 5);
            assert_eq!(panel.speed().unwrap(), SpeedPreset::Normal);
        }

        #[test]
        fn test_empty_records_fail_before_connecting() {
            let panel = Panel::new(MemoryStore::new());
            let err = build_request(&panel, &run_args()).unwrap_err();
            assert!(matches!(err, CliError::Gridfill(GridfillError::EmptyRecords)));
        }

        #[test]
        fn test_selectors_from_yaml() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("grid.yaml");
            std::fs::write(&path, "row_class: my-row\ntarget_cell: 2\n").unwrap();
            let selectors = load_selectors(Some(&path)).unwrap();
            assert_eq!(selectors.row_class, "my-row");
            assert_eq!(selectors.target_cell, Some(2));
            assert_eq!(selectors.text_class, GridSelectors::default().text_class);
        }

        #[test]
        fn test_default_selectors() {
            assert_eq!(load_selectors(None).unwrap(), GridSelectors::default());
        }
    }

    mod replay_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_replay_into_focused_frame() {
            let panel = panel_with("Kim\nLee");
            let request = build_request(&panel, &run_args()).unwrap();
            let frames = vec![MockGrid::new(2, 1), MockGrid::new(2, 1).with_focus(0, 0)];
            let mut reporter = ProgressReporter::new(false, true);

            let summary = replay_into(&frames, &request, &GridSelectors::default(), &mut reporter)
                .await
                .unwrap();
            assert_eq!(summary.response, ReplayResponse::Completed { total: 2, count: 2 });
            assert_eq!(frames[1].value_at(0, 0), "Kim");
            assert_eq!(frames[1].value_at(1, 0), "Lee");
        }

        #[tokio::test(start_paused = true)]
        async fn test_no_focus_is_instructional_error() {
            let mut request = build_request(&panel_with("a"), &run_args()).unwrap();
            request.timing = TimingProfile::default();
            let frames = vec![MockGrid::new(1, 1)];
            let mut reporter = ProgressReporter::new(false, true);

            let err = replay_into(&frames, &request, &GridSelectors::default(), &mut reporter)
                .await
                .unwrap_err();
            assert!(matches!(err, CliError::NoAnchor));
        }

        #[tokio::test(start_paused = true)]
        async fn test_no_frames_is_injection_failure() {
            let request = build_request(&panel_with("a"), &run_args()).unwrap();
            let frames: Vec<MockGrid> = Vec::new();
            let mut reporter = ProgressReporter::new(false, true);

            let err = replay_into(&frames, &request, &GridSelectors::default(), &mut reporter)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("page that shows the grid form"));
        }
    }
}
