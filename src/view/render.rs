use serde_json::json;

use super::View;
use crate::error::DispatchError;
use crate::response::Response;
use crate::template::TemplateStore;

/// Render `data` through `view`, then wrap the output in `layout`.
///
/// The layout receives exactly `{"content": <inner output>}`, whatever the
/// inner content type. The result keeps the inner status and takes the
/// layout's content type.
pub fn render(
    data: &serde_json::Value,
    view: &dyn View,
    layout: Option<&dyn View>,
    templates: &dyn TemplateStore,
) -> Result<Response, DispatchError> {
    let inner = view.display(data, templates)?;
    let Some(layout) = layout else {
        return Ok(inner);
    };
    let mut outer = layout.display(&json!({ "content": inner.body.to_text() }), templates)?;
    outer.status = inner.status;
    Ok(outer)
}
