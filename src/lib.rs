pub mod calendar;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod edit;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod listener;
pub mod parser;
pub mod render;
pub mod theme;
pub mod view;
pub mod widget;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, TimelineConfig, load_config, merge_options};
pub use edit::{EditMode, FinishedDrag, Point, Zone};
pub use error::TimelineError;
pub use ir::{Entry, EntryColor, EntryDate, EntryId};
pub use layout::{RenderPlan, compute_layout};
pub use listener::{ClickEvent, EventLog, NoopListener, TimelineEvent, TimelineListener};
pub use parser::{ParseOutput, RawEntry, parse_timeline, resolve_entries};
pub use render::{Scene, compose_scene, render_svg};
pub use theme::Theme;
pub use widget::Timeline;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub timeline: TimelineConfig,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::modern()
    }
}

impl RenderOptions {
    pub fn modern() -> Self {
        Self {
            theme: Theme::modern(),
            timeline: TimelineConfig::default(),
        }
    }

    pub fn classic() -> Self {
        Self {
            theme: Theme::classic(),
            timeline: TimelineConfig::default(),
        }
    }
}

/// Parses `input`, overlays its embedded options onto `timeline` and lays it
/// out.
pub fn build_timeline(input: &str, mut timeline: TimelineConfig) -> anyhow::Result<Timeline> {
    let parsed = parse_timeline(input)?;
    if let Some(options) = parsed.options.as_ref() {
        merge_options(&mut timeline, options)?;
    }
    let entries = resolve_entries(&parsed.entries, &timeline)?;
    Ok(Timeline::try_new(timeline, entries, NoopListener)?)
}

pub fn render_with_options(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let timeline = build_timeline(input, options.timeline)?;
    let scene = timeline
        .scene()
        .ok_or_else(|| anyhow::anyhow!("Timeline has no layout"))?;
    Ok(render_svg(&scene, &options.theme))
}
