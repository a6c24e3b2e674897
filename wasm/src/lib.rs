use multi_timeline::{RenderOptions, merge_options, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    viewport_width: Option<f32>,
    /// Timeline options, same keys as an embedded `options` object.
    timeline: Option<serde_json::Value>,
}

fn build_render_options(options: TimelineRenderOptions) -> Result<RenderOptions, String> {
    let mut render_options = if options.theme.as_deref() == Some("classic") {
        RenderOptions::classic()
    } else {
        RenderOptions::modern()
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(timeline) = options.timeline.as_ref() {
        merge_options(&mut render_options.timeline, timeline).map_err(|error| error.to_string())?;
    }
    if let Some(width) = options.viewport_width {
        render_options.timeline.viewport_width = width.max(1.0);
    }

    Ok(render_options)
}

#[wasm_bindgen]
pub fn render_timeline_svg(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<TimelineRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        TimelineRenderOptions::default()
    };

    let render_options = build_render_options(options).map_err(|error| JsValue::from_str(&error))?;
    render_with_options(input, render_options).map_err(|error| JsValue::from_str(&error.to_string()))
}
