use crate::build_timeline;
use crate::config::load_config;
use crate::layout_dump::write_layout_dump;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mtl", version, about = "Multi-layer timeline renderer")]
pub struct Args {
    /// Input file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, timeline options)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Zoom level to apply after the initial layout
    #[arg(short = 'z', long = "zoom")]
    pub zoom: Option<i32>,

    /// Pan steps; negative values pan left
    #[arg(short = 'p', long = "pan", allow_hyphen_values = true, default_value_t = 0)]
    pub pan: i32,

    /// Write the computed layout as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Print the (possibly normalized) entry data as JSON instead of rendering
    #[arg(long = "data")]
    pub data: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
        config.timeline.viewport_width = width.max(1.0);
    }

    let input = read_input(args.input.as_deref())?;
    let mut timeline = build_timeline(&input, config.timeline.clone())?;

    if let Some(zoom) = args.zoom {
        timeline.set_zoom(zoom);
    }
    for _ in 0..args.pan.unsigned_abs() {
        if args.pan < 0 {
            timeline.go_left();
        } else {
            timeline.go_right();
        }
    }

    if args.data {
        let json = serde_json::to_string_pretty(timeline.data())?;
        println!("{json}");
        return Ok(());
    }

    let plan = timeline
        .plan()
        .ok_or_else(|| anyhow::anyhow!("Timeline has no layout"))?;
    let scene = timeline
        .scene()
        .ok_or_else(|| anyhow::anyhow!("Timeline has no layout"))?;
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, plan, &scene, timeline.data())?;
    }

    let svg = render_svg(&scene, &config.theme);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            config.render.height = scene.height;
            write_output_png(&svg, &output, &config.render, &config.theme)?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}
