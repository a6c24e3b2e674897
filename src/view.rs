//! Zoom and pan over the configured window.
//!
//! Both operations rewrite `TimelineConfig::start`/`end` as whole dates; the
//! caller performs the redraw.

use crate::calendar::{self, TimeUnit, Timestamp, WINDOW_FORMAT};
use crate::config::TimelineConfig;

/// Zoom level of a freshly built instance.
pub const BASE_ZOOM_LEVEL: i32 = 5;
/// A pan moves the window by this fraction of its span (rounded up).
pub const PAN_FRACTION: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAction {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
}

/// Maps one wheel notch. Ctrl selects zoom when zooming is enabled;
/// otherwise the wheel pans.
pub fn wheel_action(
    delta: f64,
    ctrl: bool,
    pan_enabled: bool,
    zoom_enabled: bool,
) -> Option<WheelAction> {
    if delta == 0.0 || delta.is_nan() {
        return None;
    }
    let forward = delta > 0.0;
    if ctrl && zoom_enabled {
        Some(if forward {
            WheelAction::ZoomIn
        } else {
            WheelAction::ZoomOut
        })
    } else if pan_enabled {
        Some(if forward {
            WheelAction::PanLeft
        } else {
            WheelAction::PanRight
        })
    } else {
        None
    }
}

pub fn pan_step(unit_count: f64) -> i64 {
    (unit_count / PAN_FRACTION).ceil() as i64
}

/// Parsed window bounds, truncated to midnight.
fn bounds(config: &TimelineConfig) -> Option<(Timestamp, Timestamp)> {
    let start = calendar::parse_timestamp(config.start.as_deref()?)?;
    let end = calendar::parse_timestamp(config.end.as_deref()?)?;
    Some((calendar::start_of_day(start), calendar::start_of_day(end)))
}

fn store_bounds(config: &mut TimelineConfig, start: Timestamp, end: Timestamp) {
    config.start = Some(calendar::format_timestamp(start, WINDOW_FORMAT));
    config.end = Some(calendar::format_timestamp(end, WINDOW_FORMAT));
}

/// Days moved per side for `levels` zoom steps. `None` for a non-positive
/// step or an overflowing product.
fn zoom_days(config: &TimelineConfig, levels: u32) -> Option<i64> {
    (levels as i64)
        .checked_mul(config.zoom_step)
        .filter(|days| *days > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    level: i32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            level: BASE_ZOOM_LEVEL,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Widens the window by `levels * zoomStep` days per side. Returns the new
    /// level, or `None` when the bounds are unusable.
    pub fn zoom_out(&mut self, config: &mut TimelineConfig, levels: u32) -> Option<i32> {
        let (start, end) = bounds(config)?;
        let days = zoom_days(config, levels)?;
        let start = calendar::add_days(start, -days)?;
        let end = calendar::add_days(end, days)?;
        store_bounds(config, start, end);
        self.level += levels as i32;
        Some(self.level)
    }

    /// Narrows the window by `levels * zoomStep` days per side. Refused when
    /// the result would not leave `start` before `end`.
    pub fn zoom_in(&mut self, config: &mut TimelineConfig, levels: u32) -> Option<i32> {
        let (start, end) = bounds(config)?;
        let days = zoom_days(config, levels)?;
        let start = calendar::add_days(start, days)?;
        let end = calendar::add_days(end, -days)?;
        if start >= end {
            return None;
        }
        store_bounds(config, start, end);
        self.level -= levels as i32;
        Some(self.level)
    }

    /// Signed level difference for [`set_zoom`](crate::Timeline::set_zoom):
    /// positive means zoom in by that many levels.
    pub fn levels_to(&self, target: i32) -> Option<i32> {
        if target < 0 {
            return None;
        }
        Some(self.level - target)
    }
}

/// Shifts both edges by [`pan_step`] units.
pub fn pan(config: &mut TimelineConfig, unit_count: f64, direction: PanDirection) -> bool {
    let Some((start, end)) = bounds(config) else {
        return false;
    };
    let step = match direction {
        PanDirection::Left => -pan_step(unit_count),
        PanDirection::Right => pan_step(unit_count),
    };
    let unit: TimeUnit = config.x_axis_unit;
    match (
        calendar::add_units(start, step, unit),
        calendar::add_units(end, step, unit),
    ) {
        (Some(start), Some(end)) => {
            store_bounds(config, start, end);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(start: &str, end: &str) -> TimelineConfig {
        TimelineConfig::default().with_window(start, end)
    }

    fn window(config: &TimelineConfig) -> (&str, &str) {
        (
            config.start.as_deref().unwrap(),
            config.end.as_deref().unwrap(),
        )
    }

    #[test]
    fn zoom_out_widens_and_raises_level() {
        let mut config = config("2024-01-05", "2024-01-10");
        let mut view = ViewState::new();
        assert_eq!(view.zoom_out(&mut config, 2), Some(7));
        assert_eq!(window(&config), ("2024-01-03", "2024-01-12"));
    }

    #[test]
    fn zoom_in_refuses_to_invert_the_window() {
        let mut config = config("2024-01-05", "2024-01-08");
        let mut view = ViewState::new();
        assert_eq!(view.zoom_in(&mut config, 1), Some(4));
        assert_eq!(window(&config), ("2024-01-06", "2024-01-07"));
        for _ in 0..3 {
            assert_eq!(view.zoom_in(&mut config, 1), None);
        }
        assert_eq!(window(&config), ("2024-01-06", "2024-01-07"));
        assert_eq!(view.level(), 4);
    }

    #[test]
    fn zoom_step_scales_the_change() {
        let mut config = config("2024-01-10", "2024-01-20");
        config.zoom_step = 3;
        let mut view = ViewState::new();
        view.zoom_in(&mut config, 1);
        assert_eq!(window(&config), ("2024-01-13", "2024-01-17"));
    }

    #[test]
    fn unusable_zoom_step_leaves_window_alone() {
        let mut view = ViewState::new();
        let mut config = config("2024-01-05", "2024-01-10");
        config.zoom_step = i64::MAX;
        assert_eq!(view.zoom_out(&mut config, 2), None);
        assert_eq!(view.zoom_in(&mut config, 2), None);

        config.zoom_step = -2;
        assert_eq!(view.zoom_out(&mut config, 1), None);
        config.zoom_step = 0;
        assert_eq!(view.zoom_in(&mut config, 1), None);

        assert_eq!(window(&config), ("2024-01-05", "2024-01-10"));
        assert_eq!(view.level(), BASE_ZOOM_LEVEL);
    }

    #[test]
    fn zoom_normalizes_to_whole_dates() {
        let mut config = config("2024-01-05 13:30", "2024-01-10 08:00");
        let mut view = ViewState::new();
        view.zoom_out(&mut config, 1);
        assert_eq!(window(&config), ("2024-01-04", "2024-01-11"));
    }

    #[test]
    fn set_zoom_target_becomes_one_batched_delta() {
        let view = ViewState::new();
        assert_eq!(view.levels_to(2), Some(3));
        assert_eq!(view.levels_to(8), Some(-3));
        assert_eq!(view.levels_to(-1), None);
    }

    #[test]
    fn pan_moves_by_a_twelfth_of_the_span() {
        assert_eq!(pan_step(9.0), 1);
        assert_eq!(pan_step(24.0), 2);
        assert_eq!(pan_step(25.0), 3);

        let mut config = config("2024-01-01", "2024-01-25");
        assert!(pan(&mut config, 24.0, PanDirection::Right));
        assert_eq!(window(&config), ("2024-01-03", "2024-01-27"));
        assert!(pan(&mut config, 24.0, PanDirection::Left));
        assert_eq!(window(&config), ("2024-01-01", "2024-01-25"));
    }

    #[test]
    fn pan_in_weeks() {
        let mut config = config("2024-01-01", "2024-03-25");
        config.x_axis_unit = TimeUnit::Weeks;
        assert!(pan(&mut config, 12.0, PanDirection::Right));
        assert_eq!(window(&config), ("2024-01-08", "2024-04-01"));
    }

    #[test]
    fn wheel_mapping() {
        assert_eq!(wheel_action(1.0, true, true, true), Some(WheelAction::ZoomIn));
        assert_eq!(wheel_action(-3.0, true, true, true), Some(WheelAction::ZoomOut));
        assert_eq!(wheel_action(1.0, false, true, true), Some(WheelAction::PanLeft));
        assert_eq!(wheel_action(-1.0, false, true, true), Some(WheelAction::PanRight));
        assert_eq!(wheel_action(1.0, true, true, false), Some(WheelAction::PanLeft));
        assert_eq!(wheel_action(1.0, false, false, true), None);
        assert_eq!(wheel_action(0.0, true, true, true), None);
    }
}
