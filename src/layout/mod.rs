mod axis;
mod geometry;
mod layers;
pub(crate) mod types;
pub use axis::*;
pub use geometry::*;
pub use layers::*;
pub use types::*;

use crate::calendar::{
    self, TimeUnit, Timestamp, add_units, diff_seconds, same_unit, truncate_to_unit,
};
use crate::config::TimelineConfig;
use crate::error::TimelineError;
use crate::ir::{Entry, EntryId, Sentinels};
use std::collections::BTreeMap;

/// Distance in px between the axis and layer 0.
pub const LAYER_BASE_OFFSET: f32 = 20.0;
pub const DEFAULT_Z_INDEX: i32 = 10;

pub fn layer_offset(layer: u32, timeline_spacing: f32) -> f32 {
    layer as f32 * timeline_spacing + LAYER_BASE_OFFSET
}

/// Room for the highest on-screen layer plus two spare layers and the marker
/// gutter.
pub fn wrapper_height<I>(layers_on_screen: I, timeline_spacing: f32) -> f32
where
    I: IntoIterator<Item = u32>,
{
    let highest = layers_on_screen.into_iter().fold(1, u32::max);
    highest.saturating_add(2) as f32 * timeline_spacing + 5.0
}

pub(crate) fn plan_wrapper_height(bars: &[BarLayout], timeline_spacing: f32) -> f32 {
    wrapper_height(
        bars.iter()
            .filter(|bar| bar.geometry.visible && bar.geometry.left_percent < 100.0)
            .map(|bar| bar.layer),
        timeline_spacing,
    )
}

pub fn marker_text(date: &crate::ir::EntryDate, format: Option<&str>) -> Option<String> {
    let format = format?;
    date.timestamp()
        .map(|ts| calendar::format_timestamp(ts, format))
}

/// Full layout pass: window, axis, layer packing and per-entry geometry.
/// Pure; the caller decides whether to persist the layer assignment.
pub fn compute_layout(
    entries: &[Entry],
    config: &TimelineConfig,
    now: Timestamp,
) -> Result<RenderPlan, TimelineError> {
    let window = compute_window(
        config.start.as_deref(),
        config.end.as_deref(),
        config.x_axis_unit,
    )?;
    let sentinels = config.sentinels()?;
    let ticks = generate_axis_labels(
        &window,
        config.max_label_count,
        &config.x_axis_date_format,
        now,
    );
    let layers = assign_layers(entries, config.flatten, &sentinels);

    let bars: Vec<BarLayout> = entries
        .iter()
        .map(|entry| {
            let layer = layers.get(&entry.id).copied().unwrap_or(0);
            layout_bar(&window, entry, layer, config, &sentinels)
        })
        .collect();
    let wrapper_height = plan_wrapper_height(&bars, config.timeline_spacing);

    Ok(RenderPlan {
        window,
        ticks,
        bars,
        layers,
        timeline_spacing: config.timeline_spacing,
        wrapper_height,
    })
}

fn layout_bar(
    window: &TimeWindow,
    entry: &Entry,
    layer: u32,
    config: &TimelineConfig,
    sentinels: &Sentinels,
) -> BarLayout {
    let geometry = resolve_geometry(window, entry, sentinels);
    let (start, end) = entry.span(sentinels);
    let has_phases = entry.has_phases();
    let marker_format = config.marker_date_format.as_deref();

    let flags = BarFlags {
        point: start == end,
        has_phases,
        has_color_bars: entry.color.as_ref().is_some_and(|c| !c.bars().is_empty()),
        draggable: !has_phases && entry.draggable.unwrap_or(config.all_draggable),
        resizeable: !has_phases && entry.resizeable.unwrap_or(config.all_resizeable),
        infinite_start: entry.is_infinite_start(),
        infinite_end: entry.is_infinite_end(),
    };

    // A phase parent renders as a bare phase line; its phases carry the text.
    let markers = if has_phases {
        Markers::default()
    } else {
        Markers {
            start: marker_text(&entry.start, marker_format),
            end: marker_text(&entry.end, marker_format),
        }
    };

    let phases = entry
        .phases
        .iter()
        .enumerate()
        .map(|(index, phase)| PhaseLayout {
            index,
            title: phase.title.clone(),
            color: phase.color.clone(),
            geometry: resolve_geometry(window, phase, sentinels),
            markers: Markers {
                start: marker_text(&phase.start, marker_format),
                end: marker_text(&phase.end, marker_format),
            },
        })
        .collect();

    BarLayout {
        id: entry.id,
        layer,
        title: entry.title.clone(),
        color: entry.color.clone(),
        class_name: entry.class_name.clone(),
        z_index: entry.z_index.unwrap_or(DEFAULT_Z_INDEX),
        geometry,
        flags,
        markers,
        phases,
    }
}
