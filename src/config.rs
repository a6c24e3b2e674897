use crate::calendar::{self, TimeUnit, WINDOW_FORMAT};
use crate::error::TimelineError;
use crate::ir::Sentinels;
use crate::theme::Theme;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const DEFAULT_MARKER_FORMAT: &str = "YYYY-MM-DD HH:mm";

/// Host elements that drive the view controller when activated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlBindings {
    pub zoom_in: Option<String>,
    pub zoom_out: Option<String>,
    pub go_left: Option<String>,
    pub go_right: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineConfig {
    pub start: Option<String>,
    pub end: Option<String>,
    pub x_axis_date_format: String,
    pub x_axis_unit: TimeUnit,
    /// `None` disables the date markers on bars.
    pub marker_date_format: Option<String>,
    pub timeline_spacing: f32,
    pub zoom_step: i64,
    pub zoom: i32,
    pub flatten: bool,
    pub max_label_count: u32,
    pub infinity: String,
    pub dawn: String,
    pub mousewheel_pan: bool,
    pub mousewheel_zoom: bool,
    pub all_draggable: bool,
    pub all_resizeable: bool,
    pub grid_precision: u32,
    pub controls: ControlBindings,
    pub viewport_width: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        let today = calendar::start_of_day(calendar::now());
        let around = |days: i64| {
            calendar::add_days(today, days).map(|ts| calendar::format_timestamp(ts, WINDOW_FORMAT))
        };
        Self {
            start: around(-7),
            end: around(7),
            x_axis_date_format: "DD/MM".to_string(),
            x_axis_unit: TimeUnit::Days,
            marker_date_format: Some(DEFAULT_MARKER_FORMAT.to_string()),
            timeline_spacing: 30.0,
            zoom_step: 1,
            zoom: 5,
            flatten: false,
            max_label_count: 20,
            infinity: "9999-12-31".to_string(),
            dawn: "0000-01-01".to_string(),
            mousewheel_pan: true,
            mousewheel_zoom: true,
            all_draggable: true,
            all_resizeable: true,
            grid_precision: 15,
            controls: ControlBindings::default(),
            viewport_width: 1200.0,
        }
    }
}

impl TimelineConfig {
    pub fn with_window(mut self, start: &str, end: &str) -> Self {
        self.start = Some(start.to_string());
        self.end = Some(end.to_string());
        self
    }

    pub fn sentinels(&self) -> Result<Sentinels, TimelineError> {
        let dawn = calendar::parse_timestamp(&self.dawn)
            .ok_or_else(|| TimelineError::Config(format!("dawn `{}` is not a date", self.dawn)))?;
        let infinity = calendar::parse_timestamp(&self.infinity).ok_or_else(|| {
            TimelineError::Config(format!("infinity `{}` is not a date", self.infinity))
        })?;
        Ok(Sentinels { dawn, infinity })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 400.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub timeline: TimelineConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::modern(),
            timeline: TimelineConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MarkerFormatSetting {
    Toggle(bool),
    Format(String),
}

/// Distinguishes an absent key (`None`) from an explicit `null`
/// (`Some(None)`).
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    bar_color: Option<String>,
    bar_border_color: Option<String>,
    bar_text_color: Option<String>,
    marker_text_color: Option<String>,
    phase_line_color: Option<String>,
    handle_color: Option<String>,
    hover_color: Option<String>,
    axis_color: Option<String>,
    axis_text_color: Option<String>,
    grid_line_color: Option<String>,
    today_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TimelineConfigFile {
    #[serde(default, deserialize_with = "nullable")]
    start: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    end: Option<Option<String>>,
    x_axis_date_format: Option<String>,
    x_axis_unit: Option<String>,
    marker_date_format: Option<MarkerFormatSetting>,
    timeline_spacing: Option<f32>,
    zoom_step: Option<i64>,
    zoom: Option<i32>,
    flatten: Option<bool>,
    max_label_count: Option<u32>,
    infinity: Option<String>,
    dawn: Option<String>,
    mousewheel_pan: Option<bool>,
    mousewheel_zoom: Option<bool>,
    all_draggable: Option<bool>,
    all_resizeable: Option<bool>,
    grid_precision: Option<u32>,
    zoom_in_control: Option<String>,
    zoom_out_control: Option<String>,
    go_left_control: Option<String>,
    go_right_control: Option<String>,
    viewport_width: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    timeline: Option<TimelineConfigFile>,
    render_width: Option<f32>,
    render_height: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }

    if let Some(timeline) = parsed.timeline {
        apply_timeline_file(&mut config.timeline, timeline)?;
    }

    if let Some(v) = parsed.render_width {
        config.render.width = v;
        config.timeline.viewport_width = v;
    }
    if let Some(v) = parsed.render_height {
        config.render.height = v;
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}

/// Overlays an `options` object (same keys as the `timeline` section of a
/// config file) onto `config`.
pub fn merge_options(
    config: &mut TimelineConfig,
    options: &serde_json::Value,
) -> Result<(), TimelineError> {
    let file: TimelineConfigFile = serde_json::from_value(options.clone())
        .map_err(|err| TimelineError::Config(err.to_string()))?;
    apply_timeline_file(config, file)
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.font_size {
        theme.font_size = v;
    }
    if let Some(v) = vars.background {
        theme.background = v;
    }
    if let Some(v) = vars.bar_color {
        theme.bar_color = v;
    }
    if let Some(v) = vars.bar_border_color {
        theme.bar_border_color = v;
    }
    if let Some(v) = vars.bar_text_color {
        theme.bar_text_color = v;
    }
    if let Some(v) = vars.marker_text_color {
        theme.marker_text_color = v;
    }
    if let Some(v) = vars.phase_line_color {
        theme.phase_line_color = v;
    }
    if let Some(v) = vars.handle_color {
        theme.handle_color = v;
    }
    if let Some(v) = vars.hover_color {
        theme.hover_color = v;
    }
    if let Some(v) = vars.axis_color {
        theme.axis_color = v;
    }
    if let Some(v) = vars.axis_text_color {
        theme.axis_text_color = v;
    }
    if let Some(v) = vars.grid_line_color {
        theme.grid_line_color = v;
    }
    if let Some(v) = vars.today_color {
        theme.today_color = v;
    }
}

fn apply_timeline_file(
    config: &mut TimelineConfig,
    file: TimelineConfigFile,
) -> Result<(), TimelineError> {
    if let Some(v) = file.start {
        config.start = v;
    }
    if let Some(v) = file.end {
        config.end = v;
    }
    if let Some(v) = file.x_axis_date_format {
        config.x_axis_date_format = v;
    }
    if let Some(v) = file.x_axis_unit {
        config.x_axis_unit = TimeUnit::from_token(&v)
            .ok_or_else(|| TimelineError::Config(format!("unknown xAxisUnit `{v}`")))?;
    }
    match file.marker_date_format {
        Some(MarkerFormatSetting::Toggle(false)) => config.marker_date_format = None,
        Some(MarkerFormatSetting::Toggle(true)) => {
            config.marker_date_format = Some(DEFAULT_MARKER_FORMAT.to_string());
        }
        Some(MarkerFormatSetting::Format(v)) => config.marker_date_format = Some(v),
        None => {}
    }
    if let Some(v) = file.timeline_spacing {
        if v <= 0.0 {
            return Err(TimelineError::Config(
                "timelineSpacing must be positive".to_string(),
            ));
        }
        config.timeline_spacing = v;
    }
    if let Some(v) = file.zoom_step {
        if v <= 0 {
            return Err(TimelineError::Config("zoomStep must be positive".to_string()));
        }
        config.zoom_step = v;
    }
    if let Some(v) = file.zoom {
        config.zoom = v;
    }
    if let Some(v) = file.flatten {
        config.flatten = v;
    }
    if let Some(v) = file.max_label_count {
        config.max_label_count = v;
    }
    if let Some(v) = file.infinity {
        config.infinity = v;
    }
    if let Some(v) = file.dawn {
        config.dawn = v;
    }
    if let Some(v) = file.mousewheel_pan {
        config.mousewheel_pan = v;
    }
    if let Some(v) = file.mousewheel_zoom {
        config.mousewheel_zoom = v;
    }
    if let Some(v) = file.all_draggable {
        config.all_draggable = v;
    }
    if let Some(v) = file.all_resizeable {
        config.all_resizeable = v;
    }
    if let Some(v) = file.grid_precision {
        config.grid_precision = v;
    }
    if file.zoom_in_control.is_some() {
        config.controls.zoom_in = file.zoom_in_control;
    }
    if file.zoom_out_control.is_some() {
        config.controls.zoom_out = file.zoom_out_control;
    }
    if file.go_left_control.is_some() {
        config.controls.go_left = file.go_left_control;
    }
    if file.go_right_control.is_some() {
        config.controls.go_right = file.go_right_control;
    }
    if let Some(v) = file.viewport_width {
        config.viewport_width = v.max(1.0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_widget_defaults() {
        let config = TimelineConfig::default();
        assert_eq!(config.x_axis_unit, TimeUnit::Days);
        assert_eq!(config.timeline_spacing, 30.0);
        assert_eq!(config.zoom, 5);
        assert_eq!(config.grid_precision, 15);
        assert_eq!(config.max_label_count, 20);
        assert!(config.start.is_some() && config.end.is_some());
        let sentinels = config.sentinels().unwrap();
        assert!(sentinels.dawn < sentinels.infinity);
    }

    #[test]
    fn merge_options_overlays_known_keys() {
        let mut config = TimelineConfig::default();
        merge_options(
            &mut config,
            &json!({
                "start": "2024-01-01",
                "end": "2024-02-01",
                "xAxisUnit": "weeks",
                "flatten": true,
                "markerDateFormat": false,
                "zoomInControl": "zoom-in"
            }),
        )
        .unwrap();
        assert_eq!(config.start.as_deref(), Some("2024-01-01"));
        assert_eq!(config.x_axis_unit, TimeUnit::Weeks);
        assert!(config.flatten);
        assert!(config.marker_date_format.is_none());
        assert_eq!(config.controls.zoom_in.as_deref(), Some("zoom-in"));
        assert!(config.controls.zoom_out.is_none());
    }

    #[test]
    fn explicit_null_clears_bound() {
        let mut config = TimelineConfig::default();
        merge_options(&mut config, &json!({ "end": null })).unwrap();
        assert!(config.end.is_none());
        assert!(config.start.is_some());
    }

    #[test]
    fn rejects_unknown_unit() {
        let mut config = TimelineConfig::default();
        let err = merge_options(&mut config, &json!({ "xAxisUnit": "months" })).unwrap_err();
        assert!(matches!(err, TimelineError::Config(_)));
    }

    #[test]
    fn rejects_non_positive_zoom_step() {
        let mut config = TimelineConfig::default();
        for step in [0, -3] {
            let err = merge_options(&mut config, &json!({ "zoomStep": step })).unwrap_err();
            assert!(matches!(err, TimelineError::Config(_)));
        }
        assert_eq!(config.zoom_step, 1);
        merge_options(&mut config, &json!({ "zoomStep": 2 })).unwrap();
        assert_eq!(config.zoom_step, 2);
    }

    #[test]
    fn sentinels_must_parse() {
        let mut config = TimelineConfig::default();
        config.infinity = "forever".to_string();
        assert!(config.sentinels().is_err());
    }
}
