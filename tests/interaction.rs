use std::time::{Duration, Instant};

use multi_timeline::calendar::parse_timestamp;
use multi_timeline::render::AXIS_HEIGHT;
use multi_timeline::{
    ClickEvent, EditMode, Entry, EntryDate, EntryId, EventLog, Timeline, TimelineConfig,
    TimelineEvent, Zone,
};

fn at(text: &str) -> EntryDate {
    EntryDate::At(parse_timestamp(text).unwrap())
}

fn config() -> TimelineConfig {
    let mut config = TimelineConfig::default().with_window("2024-01-01", "2024-01-10");
    config.viewport_width = 1000.0;
    config
}

fn timeline_with(config: TimelineConfig, entries: Vec<Entry>) -> Timeline<EventLog> {
    Timeline::new(config, entries, EventLog::default())
}

/// Design [01-03, 01-05] on layer 0, Build [01-06, 01-08] on layer 1,
/// Review [01-02, 01-04] on layer 2.
fn three_bars() -> Timeline<EventLog> {
    timeline_with(
        config(),
        vec![
            Entry::new(0, at("2024-01-03"), at("2024-01-05")).with_title("Design"),
            Entry::new(0, at("2024-01-06"), at("2024-01-08")).with_title("Build"),
            Entry::new(0, at("2024-01-02"), at("2024-01-04")).with_title("Review"),
        ],
    )
}

/// A y coordinate inside the bar row of `layer`.
fn row_y(layer: u32) -> f32 {
    AXIS_HEIGHT + layer as f32 * 30.0 + 20.0 + 5.0
}

fn click(x: f32, y: f32, zone: Zone) -> ClickEvent {
    ClickEvent { x, y, zone }
}

fn window(timeline: &Timeline<EventLog>) -> (String, String) {
    let config = timeline.config();
    (
        config.start.clone().unwrap_or_default(),
        config.end.clone().unwrap_or_default(),
    )
}

#[test]
fn drag_moves_entry_down_one_layer() {
    let mut timeline = three_bars();
    let y = row_y(0);
    assert!(timeline.pointer_down(300.0, y));
    // Below the threshold: nothing happens yet.
    assert!(!timeline.pointer_move(302.0, y + 2.0));
    assert!(!timeline.edit().is_dragging());

    assert!(timeline.pointer_move(350.0, y + 31.0));
    assert!(timeline.edit().is_dragging());
    let scene = timeline.scene().unwrap();
    let dragged = scene.bar(EntryId(0)).unwrap();
    assert!(dragged.dragging);
    assert_eq!(dragged.layer, 1);

    let released = Instant::now();
    assert!(timeline.pointer_up_at(released));
    assert_eq!(
        timeline.listener_mut().take(),
        vec![
            TimelineEvent::DragEnd { entry: EntryId(0) },
            TimelineEvent::Edit {
                entry: EntryId(0),
                layer: 1
            },
        ]
    );

    let data = timeline.data();
    assert_eq!(data[0].start, at("2024-01-03 12:00"));
    assert_eq!(data[0].end, at("2024-01-05 12:00"));
    assert_eq!(data[0].layer, Some(1));
    assert_eq!(data[1].start, at("2024-01-06"));
    assert_eq!(data[1].layer, Some(1));
    assert_eq!(data[2].start, at("2024-01-02"));
    assert_eq!(data[2].layer, Some(2));

    let plan = timeline.plan().unwrap();
    let bar = plan.bar(EntryId(0)).unwrap();
    assert!((bar.geometry.left_percent - 25.0).abs() < 1e-6);
    assert!((bar.geometry.width_percent - 20.0).abs() < 1e-6);
}

#[test]
fn clicks_right_after_a_drag_are_suppressed() {
    let mut timeline = three_bars();
    let y = row_y(0);
    timeline.pointer_down(300.0, y);
    timeline.pointer_move(320.0, y);
    let released = Instant::now();
    assert!(timeline.pointer_up_at(released));
    timeline.listener_mut().take();

    let event = click(330.0, y, Zone::Body);
    assert!(!timeline.click_on_at(EntryId(0), event, released + Duration::from_millis(10)));
    assert!(timeline.listener().events.is_empty());

    assert!(timeline.click_on_at(EntryId(0), event, released + Duration::from_millis(50)));
    assert_eq!(
        timeline.listener().events,
        vec![TimelineEvent::Click {
            entry: EntryId(0),
            zone: Zone::Body
        }]
    );
}

#[test]
fn release_before_threshold_is_a_plain_click() {
    let mut timeline = three_bars();
    let y = row_y(1);
    assert!(timeline.pointer_down(600.0, y));
    assert!(!timeline.pointer_move(603.0, y - 2.0));

    let released = Instant::now();
    assert!(!timeline.pointer_up_at(released));
    assert!(timeline.listener().events.is_empty());
    assert!(!timeline.edit().is_active());
    assert_eq!(timeline.data()[1].start, at("2024-01-06"));

    // No guard was armed.
    assert!(timeline.click_on_at(EntryId(1), click(600.0, y, Zone::Body), released));
}

#[test]
fn second_press_is_ignored_while_dragging() {
    let mut timeline = three_bars();
    assert!(timeline.pointer_down(300.0, row_y(0)));
    assert!(!timeline.pointer_down(600.0, row_y(1)));
    assert_eq!(timeline.edit().session().map(|session| session.entry), Some(EntryId(0)));
}

#[test]
fn open_ended_entry_resizes_its_start() {
    let mut timeline = timeline_with(
        config(),
        vec![Entry::new(0, at("2024-01-04"), EntryDate::Infinity).with_title("Rollout")],
    );
    let y = row_y(0);
    // Grabbed mid-body, still resizes the start edge.
    assert!(timeline.pointer_down(600.0, y));
    assert!(timeline.pointer_move(550.0, y));
    assert!(timeline.pointer_up_at(Instant::now()));

    let entry = &timeline.data()[0];
    assert_eq!(entry.start, at("2024-01-03 12:00"));
    assert_eq!(entry.end, EntryDate::Infinity);
    assert_eq!(
        timeline.listener().events,
        vec![
            TimelineEvent::ResizeEnd {
                entry: EntryId(0),
                mode: EditMode::ResizeStart
            },
            TimelineEvent::Edit {
                entry: EntryId(0),
                layer: 0
            },
        ]
    );
}

#[test]
fn end_handle_resizes_the_end() {
    let mut timeline = three_bars();
    let y = row_y(0);
    assert!(timeline.pointer_down(397.0, y));
    assert!(timeline.pointer_move(447.0, y));
    assert!(timeline.pointer_up_at(Instant::now()));

    let entry = &timeline.data()[0];
    assert_eq!(entry.start, at("2024-01-03"));
    assert_eq!(entry.end, at("2024-01-05 12:00"));
    assert_eq!(
        timeline.listener().events[0],
        TimelineEvent::ResizeEnd {
            entry: EntryId(0),
            mode: EditMode::ResizeEnd
        }
    );
}

#[test]
fn resize_below_minimum_width_is_rejected() {
    let mut timeline = three_bars();
    let y = row_y(0);
    assert!(timeline.pointer_down(397.0, y));
    // 200 px wide bar shrunk by 160 px would be 40 px.
    assert!(!timeline.pointer_move(237.0, y));
    assert!(timeline.edit().is_dragging());
    assert!(timeline.pointer_up_at(Instant::now()));

    assert_eq!(timeline.data()[0].end, at("2024-01-05"));
    assert_eq!(
        timeline.listener().events,
        vec![TimelineEvent::ResizeEnd {
            entry: EntryId(0),
            mode: EditMode::ResizeEnd
        }]
    );
}

#[test]
fn hover_survives_leaving_during_drag() {
    let mut timeline = three_bars();
    let y = row_y(0);
    let now = Instant::now();
    timeline.pointer_down(300.0, y);
    timeline.pointer_move(320.0, y);
    timeline.pointer_leave_at(EntryId(0), now);
    assert!(timeline.is_hovered_at(EntryId(0), now + Duration::from_millis(500)));
}

#[test]
fn zoom_in_past_the_window_is_rejected() {
    let mut timeline = three_bars();
    assert!(!timeline.zoom_in(5));
    assert_eq!(timeline.zoom_level(), 5);
    assert_eq!(window(&timeline), ("2024-01-01".into(), "2024-01-10".into()));
    assert!(timeline.listener().events.is_empty());

    assert!(timeline.zoom_in(4));
    assert_eq!(timeline.zoom_level(), 1);
    assert_eq!(window(&timeline), ("2024-01-05".into(), "2024-01-06".into()));
}

#[test]
fn zoom_out_always_widens() {
    let mut timeline = three_bars();
    assert!(timeline.zoom_out(10));
    assert_eq!(timeline.zoom_level(), 15);
    assert_eq!(window(&timeline), ("2023-12-22".into(), "2024-01-20".into()));
    assert_eq!(
        timeline.listener().events,
        vec![TimelineEvent::ZoomChange { level: 15 }]
    );
    assert_eq!(timeline.plan().unwrap().window.unit_count, 29.0);
}

#[test]
fn pan_shifts_both_edges() {
    let mut timeline = three_bars();
    assert!(timeline.go_left());
    assert_eq!(window(&timeline), ("2023-12-31".into(), "2024-01-09".into()));
    assert!(timeline.go_right());
    assert!(timeline.go_right());
    assert_eq!(window(&timeline), ("2024-01-02".into(), "2024-01-11".into()));
    // Panning keeps persisted layers.
    let layers: Vec<_> = timeline.data().iter().map(|entry| entry.layer).collect();
    assert_eq!(layers, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn bound_controls_trigger_operations() {
    let mut config = config();
    config.controls.go_right = Some("next".to_string());
    config.controls.zoom_out = Some("wider".to_string());
    let mut timeline = timeline_with(config, Vec::new());

    assert!(timeline.activate_control("next"));
    assert_eq!(window(&timeline), ("2024-01-02".into(), "2024-01-11".into()));
    assert!(timeline.activate_control("wider"));
    assert_eq!(timeline.zoom_level(), 6);
    assert!(!timeline.activate_control("zoom-in"));
}

#[test]
fn wheel_zooms_with_ctrl_and_pans_without() {
    let mut timeline = three_bars();
    assert!(timeline.wheel(1.0, true));
    assert_eq!(timeline.zoom_level(), 4);
    assert_eq!(window(&timeline), ("2024-01-02".into(), "2024-01-09".into()));

    assert!(timeline.wheel(-1.0, false));
    assert_eq!(window(&timeline), ("2024-01-03".into(), "2024-01-10".into()));

    assert!(timeline.wheel(1.0, false));
    assert_eq!(window(&timeline), ("2024-01-02".into(), "2024-01-09".into()));
}

#[test]
fn wheel_pans_when_zoom_is_disabled() {
    let mut config = config();
    config.mousewheel_zoom = false;
    let mut timeline = timeline_with(config, Vec::new());
    assert!(timeline.wheel(1.0, true));
    assert_eq!(timeline.zoom_level(), 5);
    assert_eq!(window(&timeline), ("2023-12-31".into(), "2024-01-09".into()));
}

#[test]
fn pointer_click_reports_zone() {
    let mut timeline = three_bars();
    let y = row_y(2);
    assert!(timeline.click(103.0, y));
    assert_eq!(
        timeline.listener().events,
        vec![TimelineEvent::Click {
            entry: EntryId(2),
            zone: Zone::StartHandle
        }]
    );
    assert!(!timeline.click(950.0, y));
}

#[test]
fn set_data_replaces_store_and_repacks() {
    let mut timeline = three_bars();
    let replacement = vec![
        Entry::new(7, at("2024-01-04"), at("2024-01-06")).with_title("Ship"),
        Entry::new(3, at("2024-01-02"), at("2024-01-03")).with_title("Plan"),
        Entry::new(9, at("2024-01-02"), at("2024-01-09"))
            .with_title("Keep")
            .with_layer(5),
    ];
    assert!(timeline.set_data(replacement).is_ok());

    let data = timeline.data();
    let titles: Vec<_> = data.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, vec!["Ship", "Plan", "Keep"]);
    let ids: Vec<_> = data.iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![EntryId(0), EntryId(1), EntryId(2)]);
    let layers: Vec<_> = data.iter().map(|entry| entry.layer).collect();
    assert_eq!(layers, vec![Some(0), Some(1), Some(5)]);

    let plan = timeline.plan().unwrap();
    assert_eq!(plan.bars.len(), 3);
    assert_eq!(plan.bar(EntryId(1)).map(|bar| bar.title.as_str()), Some("Plan"));
    assert_eq!(plan.layers[&EntryId(2)], 5);
    assert_eq!(plan.wrapper_height, (5 + 2) as f32 * 30.0 + 5.0);
}

#[test]
fn dragging_out_of_the_left_edge_clears_overflow() {
    // Starts two days before the window: clipped to 0..200 px.
    let mut timeline = timeline_with(
        config(),
        vec![Entry::new(0, at("2023-12-30"), at("2024-01-03")).with_title("Carry")],
    );
    let before = timeline.scene().unwrap();
    assert!(before.bar(EntryId(0)).unwrap().classes.contains(&"tl-overflow-left".to_string()));

    let y = row_y(0);
    assert!(timeline.pointer_down(100.0, y));
    assert!(timeline.pointer_move(200.0, y));

    let plan = timeline.plan().unwrap();
    let geometry = plan.bar(EntryId(0)).unwrap().geometry;
    assert!(!geometry.overflow_left);
    assert_eq!(geometry.start_offset_seconds, 86_400);
    assert_eq!(geometry.duration_seconds, 2 * 86_400);
    let scene = timeline.scene().unwrap();
    assert!(!scene.bar(EntryId(0)).unwrap().classes.contains(&"tl-overflow-left".to_string()));
}
