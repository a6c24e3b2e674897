use serde::Serialize;

use crate::edit::{EditMode, FinishedDrag, Zone};
use crate::ir::{Entry, EntryId};

/// Pointer position and bar zone of a click that reached a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClickEvent {
    pub x: f32,
    pub y: f32,
    pub zone: Zone,
}

/// Lifecycle callbacks of a [`Timeline`](crate::Timeline). Every method
/// defaults to a no-op.
pub trait TimelineListener {
    fn on_timeline_click(&mut self, _event: &ClickEvent, _entry: &Entry) {}

    fn on_zoom_change(&mut self, _level: i32) {}

    fn on_drag_end(&mut self, _drag: &FinishedDrag, _entry: &Entry) {}

    fn on_resize_end(&mut self, _drag: &FinishedDrag, _entry: &Entry) {}

    /// Follows `on_drag_end`/`on_resize_end` when the drag changed the entry.
    fn on_edit(&mut self, _drag: &FinishedDrag, _entry: &Entry) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl TimelineListener for NoopListener {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TimelineEvent {
    Click { entry: EntryId, zone: Zone },
    ZoomChange { level: i32 },
    DragEnd { entry: EntryId },
    ResizeEnd { entry: EntryId, mode: EditMode },
    Edit { entry: EntryId, layer: u32 },
}

/// Records every callback in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<TimelineEvent>,
}

impl EventLog {
    pub fn take(&mut self) -> Vec<TimelineEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TimelineListener for EventLog {
    fn on_timeline_click(&mut self, event: &ClickEvent, entry: &Entry) {
        self.events.push(TimelineEvent::Click {
            entry: entry.id,
            zone: event.zone,
        });
    }

    fn on_zoom_change(&mut self, level: i32) {
        self.events.push(TimelineEvent::ZoomChange { level });
    }

    fn on_drag_end(&mut self, _drag: &FinishedDrag, entry: &Entry) {
        self.events.push(TimelineEvent::DragEnd { entry: entry.id });
    }

    fn on_resize_end(&mut self, drag: &FinishedDrag, entry: &Entry) {
        self.events.push(TimelineEvent::ResizeEnd {
            entry: entry.id,
            mode: drag.mode,
        });
    }

    fn on_edit(&mut self, drag: &FinishedDrag, entry: &Entry) {
        self.events.push(TimelineEvent::Edit {
            entry: entry.id,
            layer: drag.layer,
        });
    }
}
