use super::*;

pub fn resolve_geometry(window: &TimeWindow, entry: &Entry, sentinels: &Sentinels) -> Geometry {
    let (start, end) = entry.span(sentinels);
    resolve_span(window, start, end)
}

/// Maps `[start, end]` onto the window. A span that starts before the window
/// is clipped at the left edge; left and width are capped at 100%.
pub fn resolve_span(window: &TimeWindow, start: Timestamp, end: Timestamp) -> Geometry {
    let mut duration_seconds = diff_seconds(end, start);
    let mut start_offset_seconds = diff_seconds(start, window.start);

    let mut overflow_left = false;
    if start_offset_seconds < 0 {
        duration_seconds += start_offset_seconds;
        start_offset_seconds = 0;
        overflow_left = true;
    }

    let duration = window.units(duration_seconds);
    let start_offset = window.units(start_offset_seconds);

    let width_percent = (duration * window.percent_per_unit).min(100.0);
    let overflow_right = start_offset + duration > window.unit_count + 1.0;
    let left_percent = (start_offset * window.percent_per_unit).min(100.0);

    Geometry {
        left_percent,
        width_percent,
        visible: duration_seconds >= 0,
        overflow_left,
        overflow_right,
        start_offset_seconds,
        duration_seconds,
    }
}
