use crate::calendar;
use crate::ir::Entry;
use crate::layout::RenderPlan;
use crate::render::Scene;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub start: String,
    pub end: String,
    pub unit: String,
    pub unit_count: f64,
    pub percent_per_unit: f64,
    pub wrapper_height: f32,
    pub width: f32,
    pub height: f32,
    pub ticks: Vec<TickDump>,
    pub bars: Vec<BarDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickDump {
    pub position: u32,
    pub left_percent: f64,
    pub text: String,
    pub current: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDump {
    pub id: usize,
    pub title: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub layer: u32,
    pub left_percent: f64,
    pub width_percent: f64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub visible: bool,
    pub classes: Vec<String>,
    pub markers: [Option<String>; 2],
    pub phases: usize,
}

impl LayoutDump {
    pub fn from_plan(plan: &RenderPlan, scene: &Scene, entries: &[Entry]) -> Self {
        let ticks = plan
            .ticks
            .iter()
            .map(|tick| TickDump {
                position: tick.position,
                left_percent: tick.left_percent,
                text: tick.text.clone(),
                current: tick.is_current_period,
            })
            .collect();

        let bars = plan
            .bars
            .iter()
            .filter_map(|bar| {
                let pixel = scene.bar(bar.id)?;
                let entry = entries.get(bar.id.0);
                Some(BarDump {
                    id: bar.id.0,
                    title: bar.title.clone(),
                    start: entry
                        .and_then(|entry| entry.start.timestamp())
                        .map(calendar::format_storage),
                    end: entry
                        .and_then(|entry| entry.end.timestamp())
                        .map(calendar::format_storage),
                    layer: bar.layer,
                    left_percent: bar.geometry.left_percent,
                    width_percent: bar.geometry.width_percent,
                    x: pixel.x,
                    y: pixel.y,
                    width: pixel.width,
                    visible: pixel.visible,
                    classes: pixel.classes.clone(),
                    markers: [pixel.markers.start.clone(), pixel.markers.end.clone()],
                    phases: bar.phases.len(),
                })
            })
            .collect();

        LayoutDump {
            start: calendar::format_storage(plan.window.start),
            end: calendar::format_storage(plan.window.end),
            unit: format!("{:?}", plan.window.unit).to_lowercase(),
            unit_count: plan.window.unit_count,
            percent_per_unit: plan.window.percent_per_unit,
            wrapper_height: plan.wrapper_height,
            width: scene.width,
            height: scene.height,
            ticks,
            bars,
        }
    }
}

pub fn write_layout_dump(path: &Path, plan: &RenderPlan, scene: &Scene, entries: &[Entry]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_plan(plan, scene, entries);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
