use super::*;

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp, unit: TimeUnit) -> Result<Self, TimelineError> {
        if end <= start {
            return Err(TimelineError::InvalidRange {
                start: calendar::format_storage(start),
                end: calendar::format_storage(end),
            });
        }
        let unit_count = diff_seconds(end, start) as f64 / unit.seconds() as f64;
        Ok(Self {
            start,
            end,
            unit,
            unit_count,
            percent_per_unit: 100.0 / (unit_count + 1.0),
        })
    }

    /// Converts a second count into (fractional) axis units.
    pub fn units(&self, seconds: i64) -> f64 {
        seconds as f64 / self.unit.seconds() as f64
    }
}

pub fn compute_window(
    start: Option<&str>,
    end: Option<&str>,
    unit: TimeUnit,
) -> Result<TimeWindow, TimelineError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(TimelineError::MissingBound);
    };
    let start_ts = calendar::parse_timestamp(start)
        .ok_or_else(|| TimelineError::InvalidDate(start.to_string()))?;
    let end_ts =
        calendar::parse_timestamp(end).ok_or_else(|| TimelineError::InvalidDate(end.to_string()))?;
    TimeWindow::new(start_ts, end_ts, unit)
}

fn label_step(unit_count: f64, max_label_count: u32) -> u32 {
    let max = max_label_count.max(1) as f64;
    ((unit_count / max).round() as u32).max(1)
}

/// One tick per unit from the window start through `end + 1 unit`. Past ten
/// units only every n-th tick keeps its text so the label density stays
/// bounded at any zoom level.
pub fn generate_axis_labels(
    window: &TimeWindow,
    max_label_count: u32,
    date_format: &str,
    now: Timestamp,
) -> Vec<AxisTick> {
    let unit = window.unit;
    let last = add_units(window.end, 1, unit)
        .map(|ts| truncate_to_unit(ts, unit))
        .unwrap_or_else(|| truncate_to_unit(window.end, unit));
    let step = label_step(window.unit_count, max_label_count);
    let thinned = window.unit_count > 10.0;

    let mut ticks = Vec::new();
    let mut current = window.start;
    let mut index: u32 = 0;
    while truncate_to_unit(current, unit) <= last {
        let text = if thinned && index % step != 0 {
            String::new()
        } else {
            calendar::format_timestamp(current, date_format)
        };
        ticks.push(AxisTick {
            position: index,
            left_percent: index as f64 * window.percent_per_unit,
            text,
            is_current_period: same_unit(current, now, unit),
        });
        index += 1;
        match add_units(current, 1, unit) {
            Some(next) => current = next,
            None => break,
        }
    }
    ticks
}

/// Inverse of [`date_to_percent`], quantized to `grid_minutes`.
pub fn percent_to_date(window: &TimeWindow, percent: f64, grid_minutes: u32) -> Timestamp {
    let seconds =
        (percent * (window.unit_count + 1.0) / 100.0 * window.unit.seconds() as f64).trunc() as i64;
    let ts = calendar::add_seconds(window.start, seconds).unwrap_or(window.start);
    calendar::snap_to_grid(ts, grid_minutes)
}

pub fn date_to_percent(window: &TimeWindow, ts: Timestamp) -> f64 {
    window.units(diff_seconds(ts, window.start)) * window.percent_per_unit
}
