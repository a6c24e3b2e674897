use std::time::{Duration, Instant};

use tracing::{debug, error, trace, warn};

use crate::calendar;
use crate::config::TimelineConfig;
use crate::edit::{
    DragContext, DragSession, DragUpdate, EditController, EditMode, PixelBox, Point, TickOutcome,
    Zone,
};
use crate::error::TimelineError;
use crate::ir::{Entry, EntryId, renumber};
use crate::layout::{
    Markers, RenderPlan, compute_layout, compute_window, marker_text, plan_wrapper_height,
    resolve_span,
};
use crate::listener::{ClickEvent, NoopListener, TimelineListener};
use crate::render::{Scene, compose_scene};
use crate::view::{self, BASE_ZOOM_LEVEL, PanDirection, ViewState, WheelAction, wheel_action};

/// Clicks arriving this soon after a drag release are swallowed.
pub const CLICK_GUARD: Duration = Duration::from_millis(40);
pub const HOVER_OUT_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ZoomIn,
    ZoomOut,
    GoLeft,
    GoRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hover {
    entry: EntryId,
    leave_at: Option<Instant>,
}

/// Handlers registered by the last successful redraw.
#[derive(Debug, Clone, Default)]
struct Bindings {
    controls: Vec<(String, Control)>,
    wheel: bool,
}

impl Bindings {
    fn from_config(config: &TimelineConfig) -> Self {
        let controls = [
            (&config.controls.zoom_in, Control::ZoomIn),
            (&config.controls.zoom_out, Control::ZoomOut),
            (&config.controls.go_left, Control::GoLeft),
            (&config.controls.go_right, Control::GoRight),
        ]
        .into_iter()
        .filter_map(|(name, control)| name.clone().map(|name| (name, control)))
        .collect();
        Self {
            controls,
            wheel: config.mousewheel_pan || config.mousewheel_zoom,
        }
    }

    fn control(&self, name: &str) -> Option<Control> {
        self.controls
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, control)| *control)
    }
}

/// One timeline instance: owns the entries, the current plan and all
/// interaction state.
pub struct Timeline<L: TimelineListener = NoopListener> {
    config: TimelineConfig,
    data: Vec<Entry>,
    listener: L,
    plan: Option<RenderPlan>,
    view: ViewState,
    edit: EditController,
    hover: Option<Hover>,
    click_guard: Option<Instant>,
    bindings: Option<Bindings>,
}

impl Timeline<NoopListener> {
    pub fn without_listener(config: TimelineConfig, data: Vec<Entry>) -> Self {
        Self::new(config, data, NoopListener)
    }
}

impl<L: TimelineListener> Timeline<L> {
    /// Builds and lays out the instance. A configured zoom other than the
    /// base level is applied as one batched zoom afterwards. A failed layout
    /// is logged and leaves the instance without a plan.
    pub fn new(config: TimelineConfig, data: Vec<Entry>, listener: L) -> Self {
        let mut timeline = Self::detached(config, data, listener);
        if timeline.initialize().is_ok() {
            timeline.apply_configured_zoom();
        }
        timeline
    }

    pub fn try_new(config: TimelineConfig, data: Vec<Entry>, listener: L) -> Result<Self, TimelineError> {
        let mut timeline = Self::detached(config, data, listener);
        timeline.initialize()?;
        timeline.apply_configured_zoom();
        Ok(timeline)
    }

    fn detached(config: TimelineConfig, mut data: Vec<Entry>, listener: L) -> Self {
        renumber(&mut data);
        Self {
            config,
            data,
            listener,
            plan: None,
            view: ViewState::new(),
            edit: EditController::new(),
            hover: None,
            click_guard: None,
            bindings: None,
        }
    }

    fn apply_configured_zoom(&mut self) {
        if self.config.zoom != BASE_ZOOM_LEVEL {
            self.set_zoom(self.config.zoom);
        }
    }

    pub fn initialize(&mut self) -> Result<(), TimelineError> {
        self.reset();
        self.redraw()
    }

    /// Full layout pass. On failure the previous plan and bindings stay in
    /// place.
    pub fn redraw(&mut self) -> Result<(), TimelineError> {
        let plan = compute_layout(&self.data, &self.config, calendar::now())
            .inspect_err(|err| error!(%err, "timeline layout aborted"))?;

        self.unbind();
        self.edit.cancel();
        self.hover = None;
        self.persist_layers(&plan);
        debug!(
            entries = plan.bars.len(),
            start = %plan.window.start,
            end = %plan.window.end,
            unit_count = plan.window.unit_count,
            "timeline redrawn"
        );
        self.plan = Some(plan);
        self.bind();
        Ok(())
    }

    /// Redraw following a view change. The window stays moved; a failed
    /// layout keeps the previous plan and reports `false`.
    fn redraw_after(&mut self, operation: &'static str) -> bool {
        match self.redraw() {
            Ok(()) => true,
            Err(err) => {
                warn!(operation, %err, "view changed but redraw failed");
                false
            }
        }
    }

    /// Drops the plan and every binding.
    pub fn reset(&mut self) {
        self.unbind();
        self.plan = None;
        self.edit.cancel();
        self.hover = None;
        self.click_guard = None;
    }

    pub fn data(&self) -> &[Entry] {
        &self.data
    }

    /// Replaces the store and relayouts. When the layout fails the new store
    /// is kept but the previous plan stays on screen.
    pub fn set_data(&mut self, mut data: Vec<Entry>) -> Result<(), TimelineError> {
        renumber(&mut data);
        self.data = data;
        self.redraw()
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn plan(&self) -> Option<&RenderPlan> {
        self.plan.as_ref()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn edit(&self) -> &EditController {
        &self.edit
    }

    pub fn zoom_level(&self) -> i32 {
        self.view.level()
    }

    pub fn is_bound(&self) -> bool {
        self.bindings.is_some()
    }

    /// Only affects pixel/percent conversion; no relayout needed.
    pub fn set_viewport_width(&mut self, width: f32) {
        self.config.viewport_width = width.max(1.0);
    }

    pub fn scene(&self) -> Option<Scene> {
        self.scene_at(Instant::now())
    }

    pub fn scene_at(&self, now: Instant) -> Option<Scene> {
        let plan = self.plan.as_ref()?;
        let mut scene = compose_scene(plan, self.config.viewport_width);
        for bar in &mut scene.bars {
            bar.hovered = self.is_hovered_at(bar.id, now);
            bar.dragging = self.edit.is_dragging_entry(bar.id);
        }
        Some(scene)
    }

    /// `false` when the zoom is rejected or the redraw after it fails.
    pub fn zoom_in(&mut self, levels: u32) -> bool {
        match self.view.zoom_in(&mut self.config, levels) {
            Some(level) => {
                debug!(levels, level, "zoom in");
                self.listener.on_zoom_change(level);
                self.redraw_after("zoom in")
            }
            None => {
                trace!(levels, "zoom in rejected");
                false
            }
        }
    }

    pub fn zoom_out(&mut self, levels: u32) -> bool {
        match self.view.zoom_out(&mut self.config, levels) {
            Some(level) => {
                debug!(levels, level, "zoom out");
                self.listener.on_zoom_change(level);
                self.redraw_after("zoom out")
            }
            None => false,
        }
    }

    /// Moves to `target` with a single zoom call. Negative targets are
    /// ignored.
    pub fn set_zoom(&mut self, target: i32) -> bool {
        match self.view.levels_to(target) {
            Some(levels) if levels > 0 => self.zoom_in(levels.unsigned_abs()),
            Some(levels) if levels < 0 => self.zoom_out(levels.unsigned_abs()),
            _ => false,
        }
    }

    pub fn go_left(&mut self) -> bool {
        self.pan(PanDirection::Left)
    }

    pub fn go_right(&mut self) -> bool {
        self.pan(PanDirection::Right)
    }

    fn pan(&mut self, direction: PanDirection) -> bool {
        let unit_count = match &self.plan {
            Some(plan) => plan.window.unit_count,
            None => match compute_window(
                self.config.start.as_deref(),
                self.config.end.as_deref(),
                self.config.x_axis_unit,
            ) {
                Ok(window) => window.unit_count,
                Err(_) => return false,
            },
        };
        if !view::pan(&mut self.config, unit_count, direction) {
            return false;
        }
        debug!(?direction, step = view::pan_step(unit_count), "pan");
        self.redraw_after("pan")
    }

    pub fn wheel(&mut self, delta: f64, ctrl: bool) -> bool {
        if !self.bindings.as_ref().is_some_and(|bindings| bindings.wheel) {
            return false;
        }
        match wheel_action(
            delta,
            ctrl,
            self.config.mousewheel_pan,
            self.config.mousewheel_zoom,
        ) {
            Some(WheelAction::ZoomIn) => self.zoom_in(1),
            Some(WheelAction::ZoomOut) => self.zoom_out(1),
            Some(WheelAction::PanLeft) => self.go_left(),
            Some(WheelAction::PanRight) => self.go_right(),
            None => false,
        }
    }

    /// Runs the operation bound to the host element `name`.
    pub fn activate_control(&mut self, name: &str) -> bool {
        let control = self
            .bindings
            .as_ref()
            .and_then(|bindings| bindings.control(name));
        match control {
            Some(Control::ZoomIn) => self.zoom_in(1),
            Some(Control::ZoomOut) => self.zoom_out(1),
            Some(Control::GoLeft) => self.go_left(),
            Some(Control::GoRight) => self.go_right(),
            None => {
                trace!(name, "no control bound");
                false
            }
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        let Some((id, zone)) = self.scene().and_then(|scene| scene.hit_test(x, y)) else {
            return false;
        };
        self.pointer_down_on(id, zone, Point::new(x, y))
    }

    pub fn pointer_down_on(&mut self, id: EntryId, zone: Zone, at: Point) -> bool {
        if self.edit.is_active() {
            trace!(entry = id.0, "pointer down ignored, drag in progress");
            return false;
        }
        let Some(bar) = self.plan.as_ref().and_then(|plan| plan.bar(id)) else {
            return false;
        };
        let Some(mode) = EditMode::resolve(&bar.flags, zone) else {
            trace!(entry = id.0, ?zone, "bar is not editable");
            return false;
        };
        let pixel_box = PixelBox::from_percent(
            bar.geometry.left_percent,
            bar.geometry.width_percent,
            self.config.viewport_width,
        );
        let session = DragSession::new(id, mode, &bar.flags, pixel_box, bar.layer, at);
        self.edit.begin(session)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let Some(plan) = self.plan.as_ref() else {
            return false;
        };
        let ctx = DragContext {
            window: &plan.window,
            viewport_width: self.config.viewport_width,
            timeline_spacing: self.config.timeline_spacing,
            grid_precision: self.config.grid_precision,
        };
        match self.edit.update(Point::new(x, y), &ctx) {
            TickOutcome::Updated(update) => {
                self.apply_drag_update(update);
                true
            }
            TickOutcome::Rejected => {
                trace!("resize below minimum width rejected");
                false
            }
            TickOutcome::Pending | TickOutcome::Ignored => false,
        }
    }

    fn apply_drag_update(&mut self, update: DragUpdate) {
        if let Some(entry) = self.data.get_mut(update.entry.0) {
            entry.start = update.start;
            entry.end = update.end;
            entry.layer = Some(update.layer);
        }
        self.hover = Some(Hover {
            entry: update.entry,
            leave_at: None,
        });

        let marker_format = self.config.marker_date_format.as_deref();
        let viewport_width = self.config.viewport_width;
        let sentinels = self.config.sentinels().ok();
        let Some(plan) = self.plan.as_mut() else {
            return;
        };
        let window = plan.window;
        if let Some(bar) = plan.bar_mut(update.entry) {
            // Overflow flags and offsets follow the new dates; left and width
            // follow the pointer.
            if let Some(sentinels) = sentinels.as_ref() {
                bar.geometry = resolve_span(
                    &window,
                    update.start.resolve(sentinels),
                    update.end.resolve(sentinels),
                );
            }
            let (left, width) = update.pixel_box.to_percent(viewport_width);
            bar.geometry.left_percent = left;
            bar.geometry.width_percent = width;
            bar.layer = update.layer;
            bar.markers = Markers {
                start: marker_text(&update.start, marker_format),
                end: marker_text(&update.end, marker_format),
            };
        }
        if update.layer_changed {
            plan.layers.insert(update.entry, update.layer);
            plan.wrapper_height = plan_wrapper_height(&plan.bars, plan.timeline_spacing);
        }
    }

    pub fn pointer_up(&mut self) -> bool {
        self.pointer_up_at(Instant::now())
    }

    /// Finishes the press. Only a real drag fires callbacks and arms the
    /// click guard.
    pub fn pointer_up_at(&mut self, now: Instant) -> bool {
        let Some(finished) = self.edit.finish(self.config.viewport_width) else {
            return false;
        };

        if let Some(plan) = self.plan.as_mut() {
            if let Some(bar) = plan.bar_mut(finished.entry) {
                bar.geometry.left_percent = finished.left_percent;
                bar.geometry.width_percent = finished.width_percent;
            }
            plan.wrapper_height = plan_wrapper_height(&plan.bars, plan.timeline_spacing);
        }
        self.hover = None;

        debug!(
            entry = finished.entry.0,
            mode = ?finished.mode,
            layer = finished.layer,
            "drag finished"
        );
        if let Some(entry) = self.data.get(finished.entry.0) {
            match finished.mode {
                EditMode::Move => self.listener.on_drag_end(&finished, entry),
                EditMode::ResizeStart | EditMode::ResizeEnd => {
                    self.listener.on_resize_end(&finished, entry)
                }
            }
            if finished.edited {
                self.listener.on_edit(&finished, entry);
            }
        }
        self.click_guard = Some(now + CLICK_GUARD);
        true
    }

    pub fn click(&mut self, x: f32, y: f32) -> bool {
        let Some((id, zone)) = self.scene().and_then(|scene| scene.hit_test(x, y)) else {
            return false;
        };
        self.click_on_at(id, ClickEvent { x, y, zone }, Instant::now())
    }

    pub fn click_on_at(&mut self, id: EntryId, event: ClickEvent, now: Instant) -> bool {
        if self.edit.is_dragging() {
            return false;
        }
        if self.click_guard.is_some_and(|until| now < until) {
            trace!(entry = id.0, "click after drag suppressed");
            return false;
        }
        self.click_guard = None;
        let Some(entry) = self.data.get(id.0) else {
            return false;
        };
        self.listener.on_timeline_click(&event, entry);
        true
    }

    pub fn pointer_enter(&mut self, id: EntryId) {
        self.hover = Some(Hover {
            entry: id,
            leave_at: None,
        });
    }

    pub fn pointer_leave(&mut self, id: EntryId) {
        self.pointer_leave_at(id, Instant::now());
    }

    /// Starts the hover-out debounce, unless this bar is being dragged.
    pub fn pointer_leave_at(&mut self, id: EntryId, now: Instant) {
        if self.edit.is_dragging_entry(id) {
            return;
        }
        if let Some(hover) = self.hover.as_mut() {
            if hover.entry == id {
                hover.leave_at = Some(now + HOVER_OUT_DELAY);
            }
        }
    }

    pub fn is_hovered(&self, id: EntryId) -> bool {
        self.is_hovered_at(id, Instant::now())
    }

    pub fn is_hovered_at(&self, id: EntryId, now: Instant) -> bool {
        self.hover.is_some_and(|hover| {
            hover.entry == id && hover.leave_at.is_none_or(|deadline| now < deadline)
        })
    }

    /// Writes layers chosen by the packer back into entries that had none,
    /// so later passes keep them in place.
    fn persist_layers(&mut self, plan: &RenderPlan) {
        for entry in self.data.iter_mut().filter(|entry| entry.layer.is_none()) {
            if let Some(layer) = plan.layers.get(&entry.id) {
                entry.layer = Some(*layer);
            }
        }
    }

    fn bind(&mut self) {
        self.bindings = Some(Bindings::from_config(&self.config));
    }

    fn unbind(&mut self) {
        self.bindings = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_timestamp;
    use crate::ir::EntryDate;
    use crate::listener::{EventLog, TimelineEvent};

    fn at(text: &str) -> EntryDate {
        EntryDate::At(parse_timestamp(text).unwrap())
    }

    fn config() -> TimelineConfig {
        let mut config = TimelineConfig::default().with_window("2024-01-01", "2024-01-10");
        config.viewport_width = 1000.0;
        config
    }

    fn timeline(entries: Vec<Entry>) -> Timeline<EventLog> {
        Timeline::new(config(), entries, EventLog::default())
    }

    #[test]
    fn initial_layout_persists_layers() {
        let timeline = timeline(vec![
            Entry::new(0, at("2024-01-02"), at("2024-01-03")),
            Entry::new(0, at("2024-01-05"), at("2024-01-06")),
        ]);
        assert!(timeline.plan().is_some());
        assert!(timeline.is_bound());
        let layers: Vec<_> = timeline.data().iter().map(|entry| entry.layer).collect();
        assert_eq!(layers, vec![Some(0), Some(1)]);
        assert_eq!(timeline.data()[1].id, EntryId(1));
    }

    #[test]
    fn invalid_window_leaves_instance_empty() {
        let config = TimelineConfig::default().with_window("2024-01-10", "2024-01-01");
        let timeline = Timeline::new(config, Vec::new(), EventLog::default());
        assert!(timeline.plan().is_none());
        assert!(!timeline.is_bound());
    }

    #[test]
    fn failed_redraw_keeps_previous_plan() {
        let mut timeline = timeline(vec![Entry::new(0, at("2024-01-02"), at("2024-01-03"))]);
        timeline.config.end = None;
        assert_eq!(timeline.redraw(), Err(TimelineError::MissingBound));
        assert!(timeline.plan().is_some());
        assert!(timeline.is_bound());
    }

    #[test]
    fn failed_set_data_keeps_previous_plan() {
        let mut timeline =
            timeline(vec![Entry::new(0, at("2024-01-02"), at("2024-01-03")).with_title("Old")]);
        timeline.config.end = None;
        let result = timeline.set_data(vec![
            Entry::new(0, at("2024-01-04"), at("2024-01-05")).with_title("New"),
            Entry::new(0, at("2024-01-06"), at("2024-01-07")),
        ]);
        assert_eq!(result, Err(TimelineError::MissingBound));
        let plan = timeline.plan().unwrap();
        assert_eq!(plan.bars.len(), 1);
        assert_eq!(plan.bars[0].title, "Old");
        assert!(timeline.is_bound());
    }

    #[test]
    fn failed_redraw_after_view_change_is_reported() {
        let mut timeline = timeline(vec![Entry::new(0, at("2024-01-02"), at("2024-01-03"))]);
        timeline.config.dawn = "never".to_string();

        assert!(!timeline.zoom_out(1));
        assert_eq!(
            timeline.listener().events,
            vec![TimelineEvent::ZoomChange { level: 6 }]
        );
        assert!(!timeline.go_right());

        let plan = timeline.plan().unwrap();
        assert_eq!(plan.window.start, parse_timestamp("2024-01-01").unwrap());
    }

    #[test]
    fn configured_zoom_is_applied_once() {
        let mut config = config();
        config.zoom = 3;
        let timeline = Timeline::new(config, Vec::new(), EventLog::default());
        assert_eq!(timeline.zoom_level(), 3);
        assert_eq!(timeline.config().start.as_deref(), Some("2024-01-03"));
        assert_eq!(timeline.config().end.as_deref(), Some("2024-01-08"));
        assert_eq!(
            timeline.listener().events,
            vec![TimelineEvent::ZoomChange { level: 3 }]
        );
    }

    #[test]
    fn reset_unbinds_controls() {
        let mut config = config();
        config.controls.zoom_in = Some("zoom-in".to_string());
        let mut timeline = Timeline::new(config, Vec::new(), EventLog::default());
        timeline.reset();
        assert!(!timeline.activate_control("zoom-in"));
        assert!(!timeline.wheel(1.0, true));
        assert_eq!(timeline.zoom_level(), BASE_ZOOM_LEVEL);
    }

    #[test]
    fn hover_out_is_debounced() {
        let mut timeline = timeline(vec![Entry::new(0, at("2024-01-02"), at("2024-01-05"))]);
        let id = EntryId(0);
        let start = Instant::now();
        timeline.pointer_enter(id);
        timeline.pointer_leave_at(id, start);
        assert!(timeline.is_hovered_at(id, start + Duration::from_millis(50)));
        assert!(!timeline.is_hovered_at(id, start + Duration::from_millis(150)));

        timeline.pointer_leave_at(id, start);
        timeline.pointer_enter(id);
        assert!(timeline.is_hovered_at(id, start + Duration::from_millis(150)));
    }
}
