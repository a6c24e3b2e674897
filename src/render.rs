use crate::config::RenderConfig;
use crate::edit::Zone;
use crate::ir::EntryId;
use crate::layout::{BarFlags, BarLayout, Markers, RenderPlan, layer_offset};
use crate::theme::Theme;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

/// Height of the axis band above layer 0.
pub const AXIS_HEIGHT: f32 = 32.0;
pub const HANDLE_WIDTH: f32 = 8.0;
/// Bars narrower than this drop their end marker.
pub const END_MARKER_MIN_WIDTH: f32 = 140.0;
pub const POINT_RADIUS: f32 = 5.0;
const MARKER_FONT_SCALE: f32 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickBox {
    pub x: f32,
    pub text: String,
    pub is_current_period: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseBox {
    pub index: usize,
    pub x: f32,
    pub width: f32,
    pub title: String,
    pub fill: Option<String>,
    pub markers: Markers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarBox {
    pub id: EntryId,
    pub layer: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
    pub z_index: i32,
    pub classes: Vec<String>,
    pub title: String,
    pub fill: Option<String>,
    pub color_bars: Vec<String>,
    pub markers: Markers,
    pub phases: Vec<PhaseBox>,
    pub flags: BarFlags,
    pub hovered: bool,
    pub dragging: bool,
}

impl BarBox {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    fn zone_at(&self, x: f32, y: f32) -> Option<Zone> {
        if !self.visible || y < self.y || y > self.y + self.height {
            return None;
        }
        if self.flags.point {
            return ((x - self.x).abs() <= POINT_RADIUS).then_some(Zone::Body);
        }
        if x < self.x || x > self.right() {
            return None;
        }
        if x < self.x + HANDLE_WIDTH {
            Some(Zone::StartHandle)
        } else if x > self.right() - HANDLE_WIDTH {
            Some(Zone::EndHandle)
        } else {
            Some(Zone::Body)
        }
    }
}

/// A plan resolved to pixels for one viewport width. Bars are kept in paint
/// order (ascending z-index, then source order).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub unit_width: f32,
    pub ticks: Vec<TickBox>,
    pub bars: Vec<BarBox>,
}

impl Scene {
    pub fn bar(&self, id: EntryId) -> Option<&BarBox> {
        self.bars.iter().find(|bar| bar.id == id)
    }

    pub fn bar_mut(&mut self, id: EntryId) -> Option<&mut BarBox> {
        self.bars.iter_mut().find(|bar| bar.id == id)
    }

    /// Topmost bar under the pointer and the zone that was hit.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<(EntryId, Zone)> {
        self.bars
            .iter()
            .rev()
            .find_map(|bar| bar.zone_at(x, y).map(|zone| (bar.id, zone)))
    }
}

pub fn bar_height(timeline_spacing: f32) -> f32 {
    (timeline_spacing * 0.7).max(6.0)
}

pub fn compose_scene(plan: &RenderPlan, viewport_width: f32) -> Scene {
    let width = viewport_width.max(1.0);
    let scale = width / 100.0;
    let unit_width = plan.window.percent_per_unit as f32 * scale;

    let ticks = plan
        .ticks
        .iter()
        .map(|tick| TickBox {
            x: tick.left_percent as f32 * scale,
            text: tick.text.clone(),
            is_current_period: tick.is_current_period,
        })
        .collect();

    let mut bars: Vec<BarBox> = plan
        .bars
        .iter()
        .map(|bar| compose_bar(bar, scale, plan.timeline_spacing))
        .collect();
    bars.sort_by_key(|bar| bar.z_index);

    Scene {
        width,
        height: AXIS_HEIGHT + plan.wrapper_height,
        unit_width,
        ticks,
        bars,
    }
}

fn compose_bar(bar: &BarLayout, scale: f32, timeline_spacing: f32) -> BarBox {
    let x = bar.geometry.left_percent as f32 * scale;
    let width = bar.geometry.width_percent as f32 * scale;

    let mut markers = bar.markers.clone();
    if width < END_MARKER_MIN_WIDTH {
        markers.end = None;
    }

    let phases = bar
        .phases
        .iter()
        .filter(|phase| phase.geometry.visible)
        .map(|phase| PhaseBox {
            index: phase.index,
            x: phase.geometry.left_percent as f32 * scale,
            width: phase.geometry.width_percent as f32 * scale,
            title: phase.title.clone(),
            fill: phase.color.as_ref().and_then(|c| c.fill()).map(str::to_string),
            markers: phase.markers.clone(),
        })
        .collect();

    BarBox {
        id: bar.id,
        layer: bar.layer,
        x,
        y: AXIS_HEIGHT + layer_offset(bar.layer, timeline_spacing),
        width,
        height: bar_height(timeline_spacing),
        visible: bar.geometry.visible,
        z_index: bar.z_index,
        classes: bar_classes(bar),
        title: bar.title.clone(),
        fill: bar.color.as_ref().and_then(|c| c.fill()).map(str::to_string),
        color_bars: bar
            .color
            .as_ref()
            .map(|c| c.bars().to_vec())
            .unwrap_or_default(),
        markers,
        phases,
        flags: bar.flags,
        hovered: false,
        dragging: false,
    }
}

fn bar_classes(bar: &BarLayout) -> Vec<String> {
    let flags = &bar.flags;
    let mut classes = Vec::new();
    let mut push = |on: bool, name: &str| {
        if on {
            classes.push(name.to_string());
        }
    };
    push(flags.point, "tl-point");
    push(flags.has_phases, "tl-has-phases");
    push(flags.has_color_bars, "has-color-bars");
    push(bar.geometry.overflow_left, "tl-overflow-left");
    push(bar.geometry.overflow_right, "tl-overflow-right");
    push(flags.draggable, "is-draggable");
    push(flags.resizeable, "is-resizeable");
    push(flags.infinite_start, "is-infinite-start");
    push(flags.infinite_end, "is-infinite-end");
    if let Some(class_name) = &bar.class_name {
        classes.push(class_name.clone());
    }
    classes
}

pub fn render_svg(scene: &Scene, theme: &Theme) -> String {
    let mut svg = String::new();
    let width = scene.width;
    let height = scene.height;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    render_axis(&mut svg, scene, theme);

    for bar in scene.bars.iter().filter(|bar| bar.visible) {
        render_bar(&mut svg, bar, theme);
    }

    svg.push_str("</svg>");
    svg
}

fn render_axis(svg: &mut String, scene: &Scene, theme: &Theme) {
    svg.push_str("<g class=\"tl-axis\">");
    for tick in &scene.ticks {
        if tick.is_current_period {
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{AXIS_HEIGHT:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"0.12\"/>",
                tick.x,
                scene.unit_width,
                scene.height - AXIS_HEIGHT,
                theme.today_color
            ));
        }
        svg.push_str(&format!(
            "<line x1=\"{x:.2}\" y1=\"{AXIS_HEIGHT:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
            scene.height,
            theme.grid_line_color,
            x = tick.x
        ));
        if !tick.text.is_empty() {
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                tick.x + 4.0,
                AXIS_HEIGHT - 10.0,
                theme.font_family,
                theme.font_size,
                theme.axis_text_color,
                escape_xml(&tick.text)
            ));
        }
    }
    svg.push_str(&format!(
        "<line x1=\"0\" y1=\"{AXIS_HEIGHT:.2}\" x2=\"{:.2}\" y2=\"{AXIS_HEIGHT:.2}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        scene.width,
        theme.axis_color
    ));
    svg.push_str("</g>");
}

fn render_bar(svg: &mut String, bar: &BarBox, theme: &Theme) {
    let mut classes = vec!["tl-timeline".to_string()];
    classes.extend(bar.classes.iter().cloned());
    if bar.hovered {
        classes.push("is-hovered".to_string());
    }
    if bar.dragging {
        classes.push("is-dragging".to_string());
    }
    svg.push_str(&format!(
        "<g class=\"{}\" data-tl-identifier=\"{}\" data-tl-layer=\"{}\"><title>{}</title>",
        escape_xml(&classes.join(" ")),
        bar.id.0,
        bar.layer,
        escape_xml(&bar.title)
    ));

    if bar.flags.has_phases {
        render_phases(svg, bar, theme);
        svg.push_str("</g>");
        return;
    }

    let fill = bar.fill.as_deref().unwrap_or(&theme.bar_color);
    let stroke = if bar.hovered {
        theme.hover_color.as_str()
    } else {
        theme.bar_border_color.as_str()
    };
    let mid_y = bar.y + bar.height / 2.0;

    if bar.flags.point {
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{mid_y:.2}\" r=\"{POINT_RADIUS}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"1.2\"/>",
            bar.x
        ));
    } else {
        let radius = 4.0;
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{radius}\" ry=\"{radius}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"1.2\"/>",
            bar.x, bar.y, bar.width, bar.height
        ));
        if !bar.color_bars.is_empty() {
            let strip = bar.height / bar.color_bars.len() as f32;
            for (idx, color) in bar.color_bars.iter().enumerate() {
                svg.push_str(&format!(
                    "<rect class=\"tl-timeline__color-bar\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{strip:.2}\" fill=\"{}\"/>",
                    bar.x,
                    bar.y + strip * idx as f32,
                    bar.width,
                    escape_xml(color)
                ));
            }
        }
        if bar.flags.resizeable && bar.hovered {
            for handle_x in [bar.x, bar.right() - HANDLE_WIDTH] {
                svg.push_str(&format!(
                    "<rect class=\"tl-timeline__resizer\" x=\"{handle_x:.2}\" y=\"{:.2}\" width=\"{HANDLE_WIDTH}\" height=\"{:.2}\" fill=\"{}\"/>",
                    bar.y,
                    bar.height,
                    theme.handle_color
                ));
            }
        }
    }

    if !bar.title.is_empty() {
        let text_x = if bar.flags.point {
            bar.x + POINT_RADIUS + 4.0
        } else {
            bar.x + HANDLE_WIDTH
        };
        let color = if bar.flags.point {
            theme.marker_text_color.as_str()
        } else {
            theme.bar_text_color.as_str()
        };
        svg.push_str(&format!(
            "<text class=\"tl-timeline__title\" x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{color}\">{}</text>",
            mid_y + theme.font_size * 0.35,
            theme.font_family,
            theme.font_size,
            escape_xml(&bar.title)
        ));
    }

    render_markers(svg, &bar.markers, bar.x, bar.right(), bar.y + bar.height, theme);
    svg.push_str("</g>");
}

fn render_phases(svg: &mut String, bar: &BarBox, theme: &Theme) {
    let mid_y = bar.y + bar.height / 2.0;
    svg.push_str(&format!(
        "<line class=\"tl-timeline__phase-line\" x1=\"{:.2}\" y1=\"{mid_y:.2}\" x2=\"{:.2}\" y2=\"{mid_y:.2}\" stroke=\"{}\" stroke-width=\"2\"/>",
        bar.x,
        bar.right(),
        theme.phase_line_color
    ));
    for phase in &bar.phases {
        let fill = phase.fill.as_deref().unwrap_or(&theme.bar_color);
        svg.push_str(&format!(
            "<rect class=\"tl-phase\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"3\" ry=\"3\" fill=\"{fill}\" stroke=\"{}\" stroke-width=\"1\"/>",
            phase.x,
            bar.y,
            phase.width,
            bar.height,
            theme.bar_border_color
        ));
        if !phase.title.is_empty() {
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                phase.x + 4.0,
                mid_y + theme.font_size * 0.35,
                theme.font_family,
                theme.font_size,
                theme.bar_text_color,
                escape_xml(&phase.title)
            ));
        }
        let markers = Markers {
            start: phase.markers.start.clone(),
            end: None,
        };
        render_markers(svg, &markers, phase.x, phase.x + phase.width, bar.y + bar.height, theme);
    }
}

fn render_markers(svg: &mut String, markers: &Markers, left: f32, right: f32, bottom: f32, theme: &Theme) {
    let size = theme.font_size * MARKER_FONT_SCALE;
    let y = bottom + size + 2.0;
    for (text, x, anchor) in [
        (markers.start.as_deref(), left, "start"),
        (markers.end.as_deref(), right, "end"),
    ] {
        let Some(text) = text else { continue };
        svg.push_str(&format!(
            "<text class=\"tl-timeline__date-marker\" x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{size:.1}\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.marker_text_color,
            escape_xml(text)
        ));
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "Inter".to_string());
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid render size {}x{}", render_cfg.width, render_cfg.height))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires the `png` feature"
    ))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
