use std::collections::BTreeMap;

use serde::Serialize;

use crate::calendar::{TimeUnit, Timestamp};
use crate::ir::{EntryColor, EntryId};

/// The visible date range mapped onto the 0-100% axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
    pub unit: TimeUnit,
    /// Units spanned between `start` and `end`.
    pub unit_count: f64,
    /// `100 / (unit_count + 1)`
    pub percent_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub position: u32,
    pub left_percent: f64,
    pub text: String,
    pub is_current_period: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Geometry {
    pub left_percent: f64,
    pub width_percent: f64,
    pub visible: bool,
    pub overflow_left: bool,
    pub overflow_right: bool,
    pub start_offset_seconds: i64,
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BarFlags {
    /// Zero-duration entry drawn as a point marker.
    pub point: bool,
    pub has_phases: bool,
    pub has_color_bars: bool,
    pub draggable: bool,
    pub resizeable: bool,
    pub infinite_start: bool,
    pub infinite_end: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Markers {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseLayout {
    pub index: usize,
    pub title: String,
    pub color: Option<EntryColor>,
    pub geometry: Geometry,
    pub markers: Markers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLayout {
    pub id: EntryId,
    pub layer: u32,
    pub title: String,
    pub color: Option<EntryColor>,
    pub class_name: Option<String>,
    pub z_index: i32,
    pub geometry: Geometry,
    pub flags: BarFlags,
    pub markers: Markers,
    pub phases: Vec<PhaseLayout>,
}

/// Everything a renderer needs for one full layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub window: TimeWindow,
    pub ticks: Vec<AxisTick>,
    pub bars: Vec<BarLayout>,
    pub layers: BTreeMap<EntryId, u32>,
    pub timeline_spacing: f32,
    pub wrapper_height: f32,
}

impl RenderPlan {
    pub fn bar(&self, id: EntryId) -> Option<&BarLayout> {
        self.bars.iter().find(|bar| bar.id == id)
    }

    pub fn bar_mut(&mut self, id: EntryId) -> Option<&mut BarLayout> {
        self.bars.iter_mut().find(|bar| bar.id == id)
    }
}
