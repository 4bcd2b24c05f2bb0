//! Chrome DevTools Protocol driver.
//!
//! Every [`FormDriver`](crate::FormDriver) primitive is a small script
//! evaluated in the tab's top frame. A discovery pass stores every reachable
//! document (the top one and same-origin iframes) in
//! `window.__gridfillFrames`; scripts then address a frame by its index in
//! that list. Cross-origin iframes cannot be reached this way and are not
//! replayed into.
//!
//! Elements are stamped with a `data-gridfill-id` attribute the first time a
//! script hands them out, and looked up by it afterwards.
//!
//! The script builders below are plain functions so they can be checked
//! without a browser. The live session requires the `browser` feature.

use crate::event::{FieldEvent, KeyEvent, MouseEvent};
use crate::locator::{FieldLocator, GridSelectors};
use serde_json::{json, Value};

/// Attribute used to address elements across evaluations
pub const HANDLE_ATTR: &str = "data-gridfill-id";

/// Collects every reachable document into `window.__gridfillFrames`; yields the count
pub const FRAME_DISCOVERY: &str = r"(() => {
  const docs = [];
  const walk = (win) => {
    let doc;
    try { doc = win.document; } catch (e) { return; }
    if (!doc) return;
    docs.push(doc);
    for (let i = 0; i < win.frames.length; i++) walk(win.frames[i]);
  };
  walk(window);
  window.__gridfillFrames = docs;
  return docs.length;
})()";

const HELPERS: &str = r"
const view = doc.defaultView;
const handle = (el) => {
  if (!el) return null;
  if (!el.dataset.gridfillId) {
    doc.__gridfillSeq = (doc.__gridfillSeq || 0) + 1;
    el.dataset.gridfillId = 'gf' + doc.__gridfillSeq;
  }
  return { id: el.dataset.gridfillId, tag_name: el.tagName };
};
const need = (id) => {
  const el = doc.querySelector('[data-gridfill-id=' + JSON.stringify(id) + ']');
  if (!el) throw new Error('gridfill: element ' + id + ' is gone');
  return el;
};";

/// Wrap `body` so it runs against frame `frame` with `args` in scope.
///
/// The script evaluates to a JSON string `{"value": ...}` holding whatever
/// `body` returns.
#[must_use]
pub fn frame_script(frame: usize, args: &Value, body: &str) -> String {
    format!(
        "(() => {{\nconst args = {args};\nconst doc = (window.__gridfillFrames || [])[{frame}];\nif (!doc) throw new Error('gridfill: frame {frame} is gone');\n{HELPERS}\nconst value = (() => {{\n{body}\n}})();\nreturn JSON.stringify({{ value }});\n}})()"
    )
}

/// Find a field with one locator
#[must_use]
pub fn locate_script(frame: usize, locator: FieldLocator, grid: &GridSelectors) -> String {
    frame_script(frame, &json!({}), &format!("return handle({});", locator.to_query(grid)))
}

/// The document's active element
#[must_use]
pub fn active_element_script(frame: usize) -> String {
    frame_script(frame, &json!({}), "return handle(doc.activeElement);")
}

/// First element matching `css` inside `scope`, or in the whole document
#[must_use]
pub fn query_script(frame: usize, scope: Option<&str>, css: &str) -> String {
    let body = if scope.is_some() {
        "return handle(need(args.scope).querySelector(args.css));"
    } else {
        "return handle(doc.querySelector(args.css));"
    };
    frame_script(frame, &json!({ "scope": scope, "css": css }), body)
}

/// Row and cell indices read from the closest indexed ancestors
#[must_use]
pub fn grid_position_script(frame: usize, id: &str, grid: &GridSelectors) -> String {
    frame_script(
        frame,
        &json!({ "id": id, "rowAttr": grid.row_index_attr, "cellAttr": grid.cell_index_attr }),
        r"const el = need(args.id);
const index = (attr) => {
  const host = el.closest('[' + attr + ']');
  if (!host) return null;
  const n = parseInt(host.getAttribute(attr), 10);
  return Number.isNaN(n) ? null : n;
};
return { row: index(args.rowAttr), cell: index(args.cellAttr) };",
    )
}

/// Dispatch a keyboard event built from the frame's own constructor
#[must_use]
pub fn key_script(frame: usize, id: &str, event: &KeyEvent) -> String {
    frame_script(
        frame,
        &json!({
            "id": id,
            "type": event.dom_type(),
            "init": {
                "key": event.key,
                "code": event.code,
                "keyCode": event.key_code,
                "which": event.key_code,
                "bubbles": true,
                "cancelable": event.cancelable(),
            },
        }),
        "need(args.id).dispatchEvent(new view.KeyboardEvent(args.type, args.init));",
    )
}

/// Dispatch a mouse event at viewport coordinates
#[must_use]
pub fn mouse_script(frame: usize, id: &str, event: &MouseEvent) -> String {
    let mut init = json!({
        "bubbles": true,
        "cancelable": true,
        "clientX": event.x,
        "clientY": event.y,
    });
    if let Some(detail) = event.detail {
        init["detail"] = json!(detail);
    }
    frame_script(
        frame,
        &json!({ "id": id, "type": event.kind.dom_type(), "init": init }),
        "need(args.id).dispatchEvent(new view.MouseEvent(args.type, Object.assign({ view }, args.init)));",
    )
}

/// Dispatch `input`, `change` or `blur`
#[must_use]
pub fn field_event_script(frame: usize, id: &str, event: FieldEvent) -> String {
    let body = match event {
        FieldEvent::Blur => "need(args.id).dispatchEvent(new view.FocusEvent(args.type, { bubbles: true }));",
        FieldEvent::Input | FieldEvent::Change => {
            "need(args.id).dispatchEvent(new view.Event(args.type, { bubbles: true }));"
        }
    };
    frame_script(frame, &json!({ "id": id, "type": event.dom_type() }), body)
}

/// Viewport rectangle of an element
#[must_use]
pub fn bounding_box_script(frame: usize, id: &str) -> String {
    frame_script(
        frame,
        &json!({ "id": id }),
        "const r = need(args.id).getBoundingClientRect();\nreturn { x: r.left, y: r.top, width: r.width, height: r.height };",
    )
}

/// Scroll an element to the vertical centre
#[must_use]
pub fn scroll_script(frame: usize, id: &str) -> String {
    frame_script(
        frame,
        &json!({ "id": id }),
        "need(args.id).scrollIntoView({ behavior: 'auto', block: 'center' });",
    )
}

/// Focus an element
#[must_use]
pub fn focus_script(frame: usize, id: &str) -> String {
    frame_script(frame, &json!({ "id": id }), "need(args.id).focus();")
}

/// Select a field's whole content, when it supports selection
#[must_use]
pub fn select_all_script(frame: usize, id: &str) -> String {
    frame_script(
        frame,
        &json!({ "id": id }),
        "const el = need(args.id);\nif (typeof el.select === 'function') el.select();",
    )
}

/// A field's current value
#[must_use]
pub fn value_script(frame: usize, id: &str) -> String {
    frame_script(frame, &json!({ "id": id }), "return need(args.id).value ?? '';")
}

/// Assign `value` directly
#[must_use]
pub fn assign_value_script(frame: usize, id: &str, text: &str) -> String {
    frame_script(
        frame,
        &json!({ "id": id, "text": text }),
        "need(args.id).value = args.text;",
    )
}

/// Write through the prototype `value` setter; evaluates to whether one existed
#[must_use]
pub fn native_value_script(frame: usize, id: &str, text: &str) -> String {
    frame_script(
        frame,
        &json!({ "id": id, "text": text }),
        r"const el = need(args.id);
const proto = el.tagName === 'TEXTAREA'
  ? view.HTMLTextAreaElement.prototype
  : view.HTMLInputElement.prototype;
const setter = Object.getOwnPropertyDescriptor(proto, 'value')?.set;
if (!setter) return false;
setter.call(el, args.text);
return true;",
    )
}

/// Pull `value` out of a `{"value": ...}` envelope
pub fn unwrap_envelope<T: serde::de::DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    let mut envelope: Value = serde_json::from_str(raw)?;
    let value = envelope
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);
    serde_json::from_value(value)
}

#[cfg(feature = "browser")]
#[allow(
    clippy::missing_errors_doc,
    clippy::items_after_statements,
    clippy::significant_drop_tightening
)]
mod live {
    use super::*;
    use crate::driver::{ElementHandle, FormDriver, GridPosition};
    use crate::locator::BoundingBox;
    use crate::result::{GridfillError, GridfillResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::Browser as CdpBrowser;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::time::Duration;

    /// Time given to the handler to attach existing targets after connecting
    const TARGET_SETTLE: Duration = Duration::from_millis(250);

    /// Connection to a running browser, bound to one tab
    #[derive(Debug)]
    pub struct CdpSession {
        /// Never read; owning it keeps the DevTools connection open
        _browser: CdpBrowser,
        page: CdpPage,
        url: String,
        handle: tokio::task::JoinHandle<()>,
    }

    impl CdpSession {
        /// Attach to the browser behind `ws_url` and pick a tab.
        ///
        /// The first tab whose URL contains `tab_url` is used, or the first
        /// tab when no filter is given.
        pub async fn connect(ws_url: &str, tab_url: Option<&str>) -> GridfillResult<Self> {
            let (mut browser, mut handler) =
                CdpBrowser::connect(ws_url)
                    .await
                    .map_err(|e| GridfillError::ConnectionFailed {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            browser
                .fetch_targets()
                .await
                .map_err(|e| GridfillError::ConnectionFailed {
                    message: e.to_string(),
                })?;
            tokio::time::sleep(TARGET_SETTLE).await;

            let pages = browser
                .pages()
                .await
                .map_err(|e| GridfillError::ConnectionFailed {
                    message: e.to_string(),
                })?;

            let mut seen = Vec::new();
            for page in pages {
                let url = page.url().await.ok().flatten().unwrap_or_default();
                if tab_url.map_or(true, |wanted| url.contains(wanted)) {
                    tracing::info!(url = %url, "attached to tab");
                    return Ok(Self {
                        _browser: browser,
                        page,
                        url,
                        handle,
                    });
                }
                seen.push(url);
            }

            handle.abort();
            Err(GridfillError::TabNotFound {
                message: match tab_url {
                    Some(wanted) => format!("no tab URL contains '{wanted}' (open: {})", seen.join(", ")),
                    None => "the browser has no open tabs".to_string(),
                },
            })
        }

        /// URL of the attached tab
        #[must_use]
        pub fn url(&self) -> &str {
            &self.url
        }

        /// One driver per reachable frame, top frame first
        pub async fn frames(&self, selectors: &GridSelectors) -> GridfillResult<Vec<ChromiumDriver>> {
            let count: usize = self
                .page
                .evaluate(FRAME_DISCOVERY)
                .await
                .map_err(|e| GridfillError::page(e.to_string()))?
                .into_value()
                .map_err(|e| GridfillError::page(e.to_string()))?;
            tracing::debug!(frames = count, "frames discovered");
            Ok((0..count)
                .map(|frame| ChromiumDriver {
                    page: self.page.clone(),
                    frame,
                    selectors: selectors.clone(),
                })
                .collect())
        }

        /// Drop the connection; the browser keeps running
        pub fn detach(self) {
            self.handle.abort();
        }
    }

    /// [`FormDriver`] for one frame of a CDP-controlled tab
    #[derive(Debug, Clone)]
    pub struct ChromiumDriver {
        page: CdpPage,
        frame: usize,
        selectors: GridSelectors,
    }

    impl ChromiumDriver {
        /// Frame index within the tab
        #[must_use]
        pub const fn frame(&self) -> usize {
            self.frame
        }

        async fn eval<T: DeserializeOwned>(&self, script: String) -> GridfillResult<T> {
            let raw: String = self
                .page
                .evaluate(script.as_str())
                .await
                .map_err(|e| GridfillError::page(e.to_string()))?
                .into_value()
                .map_err(|e| GridfillError::page(e.to_string()))?;
            Ok(unwrap_envelope(&raw)?)
        }
    }

    #[async_trait]
    impl FormDriver for ChromiumDriver {
        fn label(&self) -> String {
            format!("frame {}", self.frame)
        }

        async fn locate(&self, locator: FieldLocator) -> GridfillResult<Option<ElementHandle>> {
            self.eval(locate_script(self.frame, locator, &self.selectors))
                .await
        }

        async fn active_element(&self) -> GridfillResult<Option<ElementHandle>> {
            self.eval(active_element_script(self.frame)).await
        }

        async fn row_at(&self, index: usize) -> GridfillResult<Option<ElementHandle>> {
            self.eval(query_script(self.frame, None, &self.selectors.row_css(index)))
                .await
        }

        async fn cell_at(
            &self,
            row: &ElementHandle,
            index: usize,
        ) -> GridfillResult<Option<ElementHandle>> {
            self.eval(query_script(
                self.frame,
                Some(&row.id),
                &self.selectors.cell_css(index),
            ))
            .await
        }

        async fn editor_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>> {
            self.eval(query_script(
                self.frame,
                Some(&cell.id),
                &self.selectors.editor_css(),
            ))
            .await
        }

        async fn control_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>> {
            self.eval(query_script(
                self.frame,
                Some(&cell.id),
                &self.selectors.control_css(),
            ))
            .await
        }

        async fn grid_position(&self, element: &ElementHandle) -> GridfillResult<GridPosition> {
            self.eval(grid_position_script(self.frame, &element.id, &self.selectors))
                .await
        }

        async fn dispatch_key(
            &self,
            target: &ElementHandle,
            event: &KeyEvent,
        ) -> GridfillResult<()> {
            self.eval(key_script(self.frame, &target.id, event)).await
        }

        async fn dispatch_mouse(
            &self,
            target: &ElementHandle,
            event: &MouseEvent,
        ) -> GridfillResult<()> {
            self.eval(mouse_script(self.frame, &target.id, event)).await
        }

        async fn dispatch_field_event(
            &self,
            target: &ElementHandle,
            event: FieldEvent,
        ) -> GridfillResult<()> {
            self.eval(field_event_script(self.frame, &target.id, event))
                .await
        }

        async fn bounding_box(
            &self,
            element: &ElementHandle,
        ) -> GridfillResult<Option<BoundingBox>> {
            self.eval(bounding_box_script(self.frame, &element.id)).await
        }

        async fn scroll_into_view(&self, element: &ElementHandle) -> GridfillResult<()> {
            self.eval(scroll_script(self.frame, &element.id)).await
        }

        async fn focus(&self, field: &ElementHandle) -> GridfillResult<()> {
            self.eval(focus_script(self.frame, &field.id)).await
        }

        async fn select_all(&self, field: &ElementHandle) -> GridfillResult<()> {
            self.eval(select_all_script(self.frame, &field.id)).await
        }

        async fn value(&self, field: &ElementHandle) -> GridfillResult<String> {
            self.eval(value_script(self.frame, &field.id)).await
        }

        async fn assign_value(&self, field: &ElementHandle, text: &str) -> GridfillResult<()> {
            self.eval(assign_value_script(self.frame, &field.id, text))
                .await
        }

        async fn set_native_value(
            &self,
            field: &ElementHandle,
            text: &str,
        ) -> GridfillResult<bool> {
            self.eval(native_value_script(self.frame, &field.id, text))
                .await
        }
    }
}

#[cfg(feature = "browser")]
pub use live::{CdpSession, ChromiumDriver};
