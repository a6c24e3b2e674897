//! Pointer state machine for moving, resizing and re-layering bars.
//!
//! The controller works on a pixel box that mirrors the dragged bar. Every
//! accepted tick inverts that box into dates through the axis model; the
//! caller applies the resulting [`DragUpdate`] to its data store.

use serde::Serialize;

use crate::calendar::Timestamp;
use crate::ir::{EntryDate, EntryId};
use crate::layout::{BarFlags, TimeWindow, percent_to_date};

/// Cumulative pointer travel (either axis) that turns a press into a drag.
pub const DRAG_THRESHOLD_PX: f32 = 5.0;
/// Narrowest box a resize may produce.
pub const MIN_RESIZE_WIDTH_PX: f32 = 50.0;

/// Part of a bar that received the pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Zone {
    Body,
    StartHandle,
    EndHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

impl EditMode {
    /// Resize wins over move when the entry allows both. A bar pinned at one
    /// end can only be resized at the other, wherever it is grabbed.
    pub fn resolve(flags: &BarFlags, zone: Zone) -> Option<Self> {
        if flags.has_phases || (flags.infinite_start && flags.infinite_end) {
            return None;
        }
        if flags.resizeable {
            if zone == Zone::StartHandle || flags.infinite_end {
                return Some(Self::ResizeStart);
            }
            if zone == Zone::EndHandle || flags.infinite_start {
                return Some(Self::ResizeEnd);
            }
        }
        flags.draggable.then_some(Self::Move)
    }

    pub fn cursor(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::ResizeStart => "w-resize",
            Self::ResizeEnd => "e-resize",
        }
    }

    pub fn is_resize(self) -> bool {
        !matches!(self, Self::Move)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Horizontal extent of a bar in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PixelBox {
    pub left: f32,
    pub width: f32,
}

impl PixelBox {
    pub fn from_percent(left_percent: f64, width_percent: f64, viewport_width: f32) -> Self {
        let scale = viewport_width as f64 / 100.0;
        Self {
            left: (left_percent * scale) as f32,
            width: (width_percent * scale) as f32,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn to_percent(&self, viewport_width: f32) -> (f64, f64) {
        let viewport = viewport_width.max(1.0) as f64;
        (
            100.0 / viewport * self.left as f64,
            100.0 / viewport * self.width as f64,
        )
    }
}

/// What a tick needs from the surrounding instance.
#[derive(Debug, Clone, Copy)]
pub struct DragContext<'a> {
    pub window: &'a TimeWindow,
    pub viewport_width: f32,
    pub timeline_spacing: f32,
    pub grid_precision: u32,
}

impl DragContext<'_> {
    fn date_at(&self, px: f32) -> Timestamp {
        let percent = 100.0 / self.viewport_width.max(1.0) as f64 * px as f64;
        percent_to_date(self.window, percent, self.grid_precision)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub entry: EntryId,
    pub mode: EditMode,
    pub pixel_box: PixelBox,
    pub layer: u32,
    pub infinite_start: bool,
    pub infinite_end: bool,
    origin: Point,
    last: Point,
    anchor_y: f32,
    edited: bool,
}

impl DragSession {
    pub fn new(
        entry: EntryId,
        mode: EditMode,
        flags: &BarFlags,
        pixel_box: PixelBox,
        layer: u32,
        at: Point,
    ) -> Self {
        Self {
            entry,
            mode,
            pixel_box,
            layer,
            infinite_start: flags.infinite_start,
            infinite_end: flags.infinite_end,
            origin: at,
            last: at,
            anchor_y: at.y,
            edited: false,
        }
    }

    fn passes_threshold(&self, at: Point) -> bool {
        (at.x - self.origin.x).abs() >= DRAG_THRESHOLD_PX
            || (at.y - self.origin.y).abs() >= DRAG_THRESHOLD_PX
    }

    fn apply(&mut self, at: Point, ctx: &DragContext<'_>) -> TickOutcome {
        let dx = at.x - self.last.x;
        let mut next = self.pixel_box;
        match self.mode {
            EditMode::Move => next.left += dx,
            EditMode::ResizeStart => {
                if next.width - dx < MIN_RESIZE_WIDTH_PX {
                    return TickOutcome::Rejected;
                }
                next.left += dx;
                next.width -= dx;
            }
            EditMode::ResizeEnd => {
                if next.width + dx < MIN_RESIZE_WIDTH_PX {
                    return TickOutcome::Rejected;
                }
                next.width += dx;
            }
        }

        let previous_layer = self.layer;
        let dy = at.y - self.anchor_y;
        if dy > ctx.timeline_spacing {
            self.layer = self.layer.saturating_add(1);
            self.anchor_y = at.y;
        } else if dy < -ctx.timeline_spacing {
            self.layer = self.layer.saturating_sub(1);
            self.anchor_y = at.y;
        }

        self.pixel_box = next;
        self.last = at;
        self.edited = true;

        let start = if self.infinite_start {
            EntryDate::Dawn
        } else {
            EntryDate::At(ctx.date_at(next.left))
        };
        let end = if self.infinite_end {
            EntryDate::Infinity
        } else {
            EntryDate::At(ctx.date_at(next.right()))
        };

        TickOutcome::Updated(DragUpdate {
            entry: self.entry,
            start,
            end,
            layer: self.layer,
            layer_changed: self.layer != previous_layer,
            pixel_box: next,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    PendingDrag(DragSession),
    Dragging(DragSession),
}

/// Optimistic edit produced by one accepted drag tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate {
    pub entry: EntryId,
    pub start: EntryDate,
    pub end: EntryDate,
    pub layer: u32,
    pub layer_changed: bool,
    pub pixel_box: PixelBox,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No press in progress.
    Ignored,
    /// Still below the drag threshold.
    Pending,
    /// Would shrink the bar below the minimum width.
    Rejected,
    Updated(DragUpdate),
}

/// Result of releasing an active drag, with the box normalized back to
/// percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedDrag {
    pub entry: EntryId,
    pub mode: EditMode,
    pub layer: u32,
    pub left_percent: f64,
    pub width_percent: f64,
    pub edited: bool,
}

#[derive(Debug, Default)]
pub struct EditController {
    state: EditState,
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            EditState::Idle => None,
            EditState::PendingDrag(session) | EditState::Dragging(session) => Some(session),
        }
    }

    /// True between pointer-down and pointer-up.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, EditState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, EditState::Dragging(_))
    }

    pub fn is_dragging_entry(&self, id: EntryId) -> bool {
        matches!(&self.state, EditState::Dragging(session) if session.entry == id)
    }

    /// Arms a drag. Refused while another press is in progress.
    pub fn begin(&mut self, session: DragSession) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = EditState::PendingDrag(session);
        true
    }

    pub fn update(&mut self, at: Point, ctx: &DragContext<'_>) -> TickOutcome {
        let mut session = match std::mem::take(&mut self.state) {
            EditState::Idle => return TickOutcome::Ignored,
            EditState::PendingDrag(session) => {
                if !session.passes_threshold(at) {
                    self.state = EditState::PendingDrag(session);
                    return TickOutcome::Pending;
                }
                session
            }
            EditState::Dragging(session) => session,
        };
        let outcome = session.apply(at, ctx);
        self.state = EditState::Dragging(session);
        outcome
    }

    /// Ends the press. Only a press that became a drag yields a result.
    pub fn finish(&mut self, viewport_width: f32) -> Option<FinishedDrag> {
        match std::mem::take(&mut self.state) {
            EditState::Dragging(session) => {
                let (left_percent, width_percent) = session.pixel_box.to_percent(viewport_width);
                Some(FinishedDrag {
                    entry: session.entry,
                    mode: session.mode,
                    layer: session.layer,
                    left_percent,
                    width_percent,
                    edited: session.edited,
                })
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = EditState::Idle;
    }
}
