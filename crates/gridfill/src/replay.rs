//! FormReplayer: writes a record list into consecutive grid fields.
//!
//! ## Flow
//!
//! ```text
//! resolve anchor ──none──▶ NoAnchor (page untouched)
//!      │
//!      ▼
//! record 0 ─▶ inject(anchor)
//! record i ─▶ Tab × stride ─▶ resolve next field
//!                                 │ none
//!                                 ▼
//!                   row[anchor_row + i] ─▶ cell ─▶ editor
//!                                                   │ none
//!                                                   ▼
//!                                 double-click control ─▶ editor
//!                                                   │ none
//!                                                   ▼
//!                                              skip record
//! ```
//!
//! A driver error while moving to or writing a record skips that record
//! like a missing field does. Only errors before the first write fail the
//! whole frame.
//!
//! Every wait is a `tokio::time::sleep`, so tests can run on paused time.

use crate::append::AppendConfig;
use crate::driver::{ElementHandle, FormDriver};
use crate::event::{double_click_sequence, FieldEvent, KeyEvent};
use crate::protocol::{ReplayRequest, ReplayResponse};
use crate::resolve::ResolutionChain;
use crate::result::GridfillResult;
use crate::timing::TimingProfile;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Wait after scrolling a fallback row into view
pub const SCROLL_SETTLE: Duration = Duration::from_millis(100);

/// Wait after double-clicking a cell into edit mode
pub const EDIT_MODE_SETTLE: Duration = Duration::from_millis(300);

/// Where the replay started
#[derive(Debug)]
struct Origin {
    anchor: ElementHandle,
    row: usize,
    cell: usize,
}

/// Replays records through one [`FormDriver`]
#[derive(Debug)]
pub struct FormReplayer<'a, D: FormDriver + ?Sized> {
    driver: &'a D,
    target_cell: Option<usize>,
    anchor_chain: ResolutionChain,
    navigation_chain: ResolutionChain,
}

impl<'a, D: FormDriver + ?Sized> FormReplayer<'a, D> {
    /// Replayer over `driver` with the default chains
    #[must_use]
    pub fn new(driver: &'a D) -> Self {
        Self {
            driver,
            target_cell: None,
            anchor_chain: ResolutionChain::anchor(),
            navigation_chain: ResolutionChain::navigation(),
        }
    }

    /// Fix the cell index used by the fallback path
    #[must_use]
    pub fn with_target_cell(mut self, cell: Option<usize>) -> Self {
        self.target_cell = cell;
        self
    }

    /// Replay `request` into the page
    pub async fn run(&self, request: &ReplayRequest) -> GridfillResult<ReplayResponse> {
        request.validate()?;
        let frame = self.driver.label();

        let Some((strategy, anchor)) = self.anchor_chain.resolve(self.driver).await? else {
            info!(frame = %frame, "no anchor field");
            return Ok(ReplayResponse::NoAnchor);
        };
        info!(frame = %frame, strategy, records = request.records.len(), "anchor found");

        let position = self.driver.grid_position(&anchor).await?;
        let origin = Origin {
            row: position.row.unwrap_or(0),
            cell: self.target_cell.or(position.cell).unwrap_or(0),
            anchor,
        };

        let mut current = origin.anchor.clone();
        let mut count = 0;
        for (index, record) in request.records.iter().enumerate() {
            match self.write_record(index, record, &origin, &current, request).await {
                Ok(Some(field)) => {
                    count += 1;
                    info!(frame = %frame, index, field = %field.id, "record written");
                    current = field;
                }
                Ok(None) => warn!(frame = %frame, index, "no field for record, skipped"),
                Err(e) => warn!(frame = %frame, index, error = %e, "record failed, skipped"),
            }
            sleep(request.timing.next_delay()).await;
        }

        Ok(ReplayResponse::Completed {
            total: request.records.len(),
            count,
        })
    }

    /// Move to the field for record `index` and write it.
    ///
    /// Returns the written field, or `None` when no field could be found.
    async fn write_record(
        &self,
        index: usize,
        record: &str,
        origin: &Origin,
        current: &ElementHandle,
        request: &ReplayRequest,
    ) -> GridfillResult<Option<ElementHandle>> {
        let field = if index == 0 {
            Some(origin.anchor.clone())
        } else {
            self.advance(current, request.stride, &request.timing).await?;
            match self.navigation_chain.resolve(self.driver).await? {
                Some((_, field)) => Some(field),
                None => {
                    debug!(index, "navigation did not land on a field");
                    self.fallback(origin.row + index, origin.cell).await?
                }
            }
        };

        let Some(field) = field else {
            return Ok(None);
        };
        self.inject(&field, record, &request.append, &request.timing).await?;
        Ok(Some(field))
    }

    /// Press Tab `stride` times at whatever has focus
    async fn advance(
        &self,
        current: &ElementHandle,
        stride: u32,
        timing: &TimingProfile,
    ) -> GridfillResult<()> {
        for _ in 0..stride {
            let target = self
                .driver
                .active_element()
                .await?
                .unwrap_or_else(|| current.clone());
            self.driver.dispatch_key(&target, &KeyEvent::tab_down()).await?;
            sleep(timing.tab_delay()).await;
            self.driver.dispatch_key(&target, &KeyEvent::tab_up()).await?;
            sleep(timing.tab_delay()).await;
        }
        sleep(timing.after_tab_delay()).await;
        Ok(())
    }

    /// Find the field positionally, forcing the cell into edit mode if needed
    async fn fallback(&self, row_index: usize, cell_index: usize) -> GridfillResult<Option<ElementHandle>> {
        let Some(row) = self.driver.row_at(row_index).await? else {
            debug!(row_index, "fallback row not found");
            return Ok(None);
        };
        self.driver.scroll_into_view(&row).await?;
        sleep(SCROLL_SETTLE).await;

        let Some(cell) = self.driver.cell_at(&row, cell_index).await? else {
            debug!(row_index, cell_index, "fallback cell not found");
            return Ok(None);
        };
        if let Some(editor) = self.driver.editor_in(&cell).await? {
            return Ok(Some(editor));
        }

        let Some(control) = self.driver.control_in(&cell).await? else {
            return Ok(None);
        };
        if let Some(bbox) = self.driver.bounding_box(&control).await? {
            for event in double_click_sequence(bbox.center()) {
                self.driver.dispatch_mouse(&control, &event).await?;
            }
            sleep(EDIT_MODE_SETTLE).await;
        }
        self.driver.editor_in(&cell).await
    }

    /// Write one record into `field`
    async fn inject(
        &self,
        field: &ElementHandle,
        record: &str,
        append: &AppendConfig,
        timing: &TimingProfile,
    ) -> GridfillResult<()> {
        self.driver.focus(field).await?;
        sleep(timing.focus_delay()).await;

        let existing = if append.replaces() {
            self.driver.select_all(field).await?;
            String::new()
        } else {
            self.driver.value(field).await?
        };
        let text = append.compose(&existing, record);

        self.driver.assign_value(field, &text).await?;
        if !self.driver.set_native_value(field, &text).await? {
            warn!(field = %field.id, tag = %field.tag_name, "native value setter unavailable");
        }
        self.driver.dispatch_field_event(field, FieldEvent::Input).await?;
        self.driver.dispatch_field_event(field, FieldEvent::Change).await?;

        sleep(timing.blur_delay()).await;
        self.driver.dispatch_field_event(field, FieldEvent::Blur).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::GridPosition;
    use crate::event::{KeyPhase, MouseEvent, MouseKind};
    use crate::locator::{BoundingBox, FieldLocator};
    use crate::mock::{DomEvent, MockGrid};
    use crate::result::GridfillError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::protocol::Stride;
    use crate::timing::SpeedPreset;
    use tokio::time::Instant;

    fn request(records: &[&str], stride: Stride, append: AppendConfig) -> ReplayRequest {
        ReplayRequest::new(
            records.iter().map(|s| (*s).to_string()).collect(),
            stride,
            append,
            SpeedPreset::Normal.profile(),
        )
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    mod anchor_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_no_anchor_touches_nothing() {
            let grid = MockGrid::new(2, 2).with_value(0, 0, "keep");
            let response = FormReplayer::new(&grid)
                .run(&request(&["a", "b"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::NoAnchor);
            assert!(grid.events().is_empty());
            assert_eq!(grid.value_at(0, 0), "keep");
        }

        #[tokio::test(start_paused = true)]
        async fn test_selected_row_anchor() {
            let grid = MockGrid::new(3, 1).with_selected_row(1);
            let response = FormReplayer::new(&grid)
                .run(&request(&["first"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 1, count: 1 });
            assert_eq!(grid.value_at(1, 0), "first");
        }

        #[tokio::test(start_paused = true)]
        async fn test_input_anchor() {
            let grid = MockGrid::new(1, 1).with_input_fields().with_focus(0, 0);
            let response = FormReplayer::new(&grid)
                .run(&request(&["x"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 1, count: 1 });
            assert_eq!(grid.value_at(0, 0), "x");
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_two_records_fixed_stride() {
            let grid = MockGrid::new(2, 2).with_focus(0, 0);
            let response = FormReplayer::new(&grid)
                .run(&request(&["a\tb", "c\td"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 2, count: 2 });
            assert_eq!(grid.values(), vec![row(&["a\tb", ""]), row(&["c\td", ""])]);

            let events = grid.events();
            let first_blur = events
                .iter()
                .position(|e| matches!(e, DomEvent::Field { event: FieldEvent::Blur, .. }))
                .unwrap();
            let second_focus = events
                .iter()
                .rposition(|e| matches!(e, DomEvent::Focus(_)))
                .unwrap();
            let phases: Vec<_> = events[first_blur..second_focus]
                .iter()
                .filter_map(|e| match e {
                    DomEvent::Key { event, .. } => Some(event.phase),
                    _ => None,
                })
                .collect();
            assert_eq!(
                phases,
                vec![KeyPhase::Down, KeyPhase::Up, KeyPhase::Down, KeyPhase::Up]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_custom_stride() {
            let grid = MockGrid::new(2, 3).with_focus(0, 0);
            FormReplayer::new(&grid)
                .run(&request(&["r0", "r1"], Stride::Custom(3), AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(grid.value_at(1, 0), "r1");
            assert_eq!(grid.key_events().len(), 6);
        }

        #[tokio::test(start_paused = true)]
        async fn test_injection_event_order() {
            let grid = MockGrid::new(1, 1).with_focus(0, 0);
            FormReplayer::new(&grid)
                .run(&request(&["v"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            let id = "field:0:0".to_string();
            assert_eq!(
                grid.events(),
                vec![
                    DomEvent::Focus(id.clone()),
                    DomEvent::SelectAll(id.clone()),
                    DomEvent::Assign {
                        target: id.clone(),
                        text: "v".to_string()
                    },
                    DomEvent::NativeSet {
                        target: id.clone(),
                        text: "v".to_string()
                    },
                    DomEvent::Field {
                        target: id.clone(),
                        event: FieldEvent::Input
                    },
                    DomEvent::Field {
                        target: id.clone(),
                        event: FieldEvent::Change
                    },
                    DomEvent::Field {
                        target: id,
                        event: FieldEvent::Blur
                    },
                ]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_native_setter_still_counts() {
            let grid = MockGrid::new(1, 1).with_focus(0, 0).without_native_setter();
            let response = FormReplayer::new(&grid)
                .run(&request(&["v"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 1, count: 1 });
            assert_eq!(grid.value_at(0, 0), "v");
        }
    }

    mod append_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_newline_append() {
            let grid = MockGrid::new(1, 1).with_focus(0, 0).with_value(0, 0, " old ");
            FormReplayer::new(&grid)
                .run(&request(&["new"], Stride::Fixed, AppendConfig::newline()))
                .await
                .unwrap();
            assert_eq!(grid.value_at(0, 0), "old\nnew");
            assert!(!grid.events().iter().any(|e| matches!(e, DomEvent::SelectAll(_))));
        }

        #[tokio::test(start_paused = true)]
        async fn test_custom_append() {
            let grid = MockGrid::new(1, 1).with_focus(0, 0).with_value(0, 0, "X");
            FormReplayer::new(&grid)
                .run(&request(&["Y"], Stride::Fixed, AppendConfig::custom(" | ")))
                .await
                .unwrap();
            assert_eq!(grid.value_at(0, 0), "X | Y");
        }

        #[tokio::test(start_paused = true)]
        async fn test_blank_existing_is_replaced() {
            let grid = MockGrid::new(1, 1).with_focus(0, 0).with_value(0, 0, "   ");
            FormReplayer::new(&grid)
                .run(&request(&["Y"], Stride::Fixed, AppendConfig::custom(", ")))
                .await
                .unwrap();
            assert_eq!(grid.value_at(0, 0), "Y");
        }

        #[tokio::test(start_paused = true)]
        async fn test_overwrite_replaces_existing() {
            let grid = MockGrid::new(1, 1).with_focus(0, 0).with_value(0, 0, "X");
            FormReplayer::new(&grid)
                .run(&request(&["Y"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(grid.value_at(0, 0), "Y");
        }
    }

    mod fallback_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_display_cell_is_double_clicked() {
            let grid = MockGrid::new(2, 2).with_focus(0, 0).with_display_cell(1, 0);
            let response = FormReplayer::new(&grid)
                .run(&request(&["a", "b"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 2, count: 2 });
            assert_eq!(grid.value_at(1, 0), "b");

            let kinds: Vec<_> = grid.mouse_events().iter().map(|e| e.kind).collect();
            assert_eq!(kinds.len(), 7);
            assert_eq!(kinds.last(), Some(&MouseKind::DoubleClick));
            assert!(grid.events().contains(&DomEvent::Scroll("row:1".to_string())));
        }

        #[tokio::test(start_paused = true)]
        async fn test_fallback_uses_anchor_row_offset() {
            let grid = MockGrid::new(4, 2).with_focus(1, 1).with_display_cell(2, 1);
            let response = FormReplayer::new(&grid)
                .run(&request(&["a", "b"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 2, count: 2 });
            assert_eq!(grid.value_at(1, 1), "a");
            assert_eq!(grid.value_at(2, 1), "b");
            assert!(grid.events().contains(&DomEvent::Scroll("row:2".to_string())));
        }

        #[tokio::test(start_paused = true)]
        async fn test_target_cell_override() {
            let grid = MockGrid::new(2, 3).with_display_cell(1, 2);
            let replayer = FormReplayer::new(&grid).with_target_cell(Some(2));
            assert_eq!(replayer.target_cell, Some(2));
            let editor = replayer.fallback(1, 2).await.unwrap().unwrap();
            assert_eq!(editor.id, "field:1:2");
        }

        #[tokio::test(start_paused = true)]
        async fn test_unresolved_record_is_skipped() {
            let grid = MockGrid::new(3, 2).with_focus(0, 0).with_dead_cell(1, 0);
            let response = FormReplayer::new(&grid)
                .run(&request(&["r0", "r1", "r2"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 3, count: 2 });
            assert_eq!(
                grid.values(),
                vec![row(&["r0", ""]), row(&["", ""]), row(&["r2", ""])]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_row_is_skipped() {
            let grid = MockGrid::new(1, 1).with_focus(0, 0);
            let response = FormReplayer::new(&grid)
                .run(&request(&["a", "b"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 2, count: 1 });
            assert_eq!(grid.value_at(0, 0), "a");
        }
    }

    /// [`MockGrid`] whose n-th `assign_value` fails as if the field was
    /// re-rendered away
    struct DetachingGrid {
        grid: MockGrid,
        fail_on: usize,
        assigns: AtomicUsize,
    }

    impl DetachingGrid {
        fn new(grid: MockGrid, fail_on: usize) -> Self {
            Self {
                grid,
                fail_on,
                assigns: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FormDriver for DetachingGrid {
        fn label(&self) -> String {
            self.grid.label()
        }
        async fn locate(&self, locator: FieldLocator) -> GridfillResult<Option<ElementHandle>> {
            self.grid.locate(locator).await
        }
        async fn active_element(&self) -> GridfillResult<Option<ElementHandle>> {
            self.grid.active_element().await
        }
        async fn row_at(&self, index: usize) -> GridfillResult<Option<ElementHandle>> {
            self.grid.row_at(index).await
        }
        async fn cell_at(
            &self,
            row: &ElementHandle,
            index: usize,
        ) -> GridfillResult<Option<ElementHandle>> {
            self.grid.cell_at(row, index).await
        }
        async fn editor_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>> {
            self.grid.editor_in(cell).await
        }
        async fn control_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>> {
            self.grid.control_in(cell).await
        }
        async fn grid_position(&self, element: &ElementHandle) -> GridfillResult<GridPosition> {
            self.grid.grid_position(element).await
        }
        async fn dispatch_key(&self, target: &ElementHandle, event: &KeyEvent) -> GridfillResult<()> {
            self.grid.dispatch_key(target, event).await
        }
        async fn dispatch_mouse(
            &self,
            target: &ElementHandle,
            event: &MouseEvent,
        ) -> GridfillResult<()> {
            self.grid.dispatch_mouse(target, event).await
        }
        async fn dispatch_field_event(
            &self,
            target: &ElementHandle,
            event: FieldEvent,
        ) -> GridfillResult<()> {
            self.grid.dispatch_field_event(target, event).await
        }
        async fn bounding_box(&self, element: &ElementHandle) -> GridfillResult<Option<BoundingBox>> {
            self.grid.bounding_box(element).await
        }
        async fn scroll_into_view(&self, element: &ElementHandle) -> GridfillResult<()> {
            self.grid.scroll_into_view(element).await
        }
        async fn focus(&self, field: &ElementHandle) -> GridfillResult<()> {
            self.grid.focus(field).await
        }
        async fn select_all(&self, field: &ElementHandle) -> GridfillResult<()> {
            self.grid.select_all(field).await
        }
        async fn value(&self, field: &ElementHandle) -> GridfillResult<String> {
            self.grid.value(field).await
        }
        async fn assign_value(&self, field: &ElementHandle, text: &str) -> GridfillResult<()> {
            let n = self.assigns.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(GridfillError::page(format!("element {} is gone", field.id)));
            }
            self.grid.assign_value(field, text).await
        }
        async fn set_native_value(&self, field: &ElementHandle, text: &str) -> GridfillResult<bool> {
            self.grid.set_native_value(field, text).await
        }
    }

    mod driver_error_tests {
        use super::*;
        use crate::locator::GridSelectors;
        use crate::protocol::replay_frames;

        #[tokio::test(start_paused = true)]
        async fn test_failed_record_is_skipped_and_replay_continues() {
            let page = DetachingGrid::new(MockGrid::new(3, 2).with_focus(0, 0), 2);
            let response = FormReplayer::new(&page)
                .run(&request(&["r0", "r1", "r2"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 3, count: 2 });
            assert_eq!(
                page.grid.values(),
                vec![row(&["r0", ""]), row(&["", ""]), row(&["r2", ""])]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_failed_record_does_not_turn_into_no_anchor() {
            let frames = vec![
                DetachingGrid::new(MockGrid::new(3, 2), 0),
                DetachingGrid::new(MockGrid::new(3, 2).with_focus(0, 0), 2),
            ];
            let req = request(&["r0", "r1", "r2"], Stride::Fixed, AppendConfig::overwrite());
            let summary = replay_frames(&frames, &req, &GridSelectors::default())
                .await
                .unwrap();
            assert_eq!(summary.response, ReplayResponse::Completed { total: 3, count: 2 });
            assert_eq!(summary.frames_succeeded, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_first_record_failure_still_completes() {
            let page = DetachingGrid::new(MockGrid::new(2, 2).with_focus(0, 0), 1);
            let response = FormReplayer::new(&page)
                .run(&request(&["a", "b"], Stride::Fixed, AppendConfig::overwrite()))
                .await
                .unwrap();
            assert_eq!(response, ReplayResponse::Completed { total: 2, count: 1 });
            assert_eq!(page.grid.value_at(0, 0), "");
            assert_eq!(page.grid.value_at(1, 0), "b");
        }
    }

    mod timing_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_elapsed_matches_estimate() {
            let grid = MockGrid::new(3, 2).with_focus(0, 0);
            let req = request(&["a", "b", "c"], Stride::Fixed, AppendConfig::overwrite());
            let start = Instant::now();
            FormReplayer::new(&grid).run(&req).await.unwrap();
            assert_eq!(start.elapsed(), req.timing.estimate(3, req.stride));
        }

        #[tokio::test(start_paused = true)]
        async fn test_fallback_adds_fixed_waits() {
            let grid = MockGrid::new(2, 2).with_focus(0, 0).with_display_cell(1, 0);
            let req = request(&["a", "b"], Stride::Fixed, AppendConfig::overwrite());
            let start = Instant::now();
            FormReplayer::new(&grid).run(&req).await.unwrap();
            assert_eq!(
                start.elapsed(),
                req.timing.estimate(2, req.stride) + SCROLL_SETTLE + EDIT_MODE_SETTLE
            );
        }
    }
}
