//! Printviz CLI - batch thumbnail and frame capture for printable models
//!
//! Loads a model from a path or URL, waits for the viewer to frame it,
//! optionally applies rotation, then writes a best-angle thumbnail and/or
//! a raw frame capture. Model dimensions are printed as JSON on stdout.

use clap::{Parser, ValueEnum};
use printviz::{
    Axis, CaptureOptions, ImageCodec, MeshFormat, ThumbnailOptions, Viewer, ViewerConfig,
    READY_TIMEOUT,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Stl,
    Obj,
    #[value(name = "3mf")]
    ThreeMf,
}

impl From<FormatArg> for MeshFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Stl => MeshFormat::Stl,
            FormatArg::Obj => MeshFormat::Obj,
            FormatArg::ThreeMf => MeshFormat::ThreeMf,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AxisArg {
    X,
    Y,
    Z,
}

impl From<AxisArg> for Axis {
    fn from(value: AxisArg) -> Self {
        match value {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
            AxisArg::Z => Axis::Z,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "printviz", about = "Headless viewer for 3D-printable models")]
struct Args {
    /// Model path or http(s) URL.
    source: String,

    /// Mesh format; inferred from the source name when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Write a best-angle JPEG thumbnail to this path.
    #[arg(long)]
    thumbnail: Option<PathBuf>,

    /// Thumbnail width in pixels.
    #[arg(long, default_value_t = 1200)]
    thumb_width: u32,

    /// Thumbnail height in pixels.
    #[arg(long, default_value_t = 675)]
    thumb_height: u32,

    /// JPEG quality factor in 0..1.
    #[arg(long, default_value_t = 0.92)]
    quality: f32,

    /// Write a PNG capture of the live frame to this path.
    #[arg(long)]
    frame: Option<PathBuf>,

    /// Spin the model around this axis before capturing.
    #[arg(long, value_enum)]
    spin: Option<AxisArg>,

    /// Seconds of spin to simulate at 60 ticks per second.
    #[arg(long, default_value_t = 1.0)]
    spin_seconds: f32,

    /// Rotation speed in radians per second.
    #[arg(long)]
    speed: Option<f32>,

    /// Mount the model upside down.
    #[arg(long)]
    flip: bool,

    /// Live surface width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Live surface height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(err) = run(Args::parse()) {
        log::error!("{err}");
        let mut source = err.source();
        while let Some(cause) = source {
            log::error!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut viewer = Viewer::new(ViewerConfig {
        surface_width: args.width,
        surface_height: args.height,
        ..ViewerConfig::default()
    })?;

    viewer.load(&args.source, args.format.map(MeshFormat::from))?;
    if args.flip {
        viewer.set_upside_down(true);
    }
    viewer.wait_until_ready(READY_TIMEOUT);

    if let Some(dims) = viewer.dimensions() {
        println!("{}", serde_json::to_string(dims)?);
    }

    if let Some(axis) = args.spin {
        viewer.set_spin(axis.into(), true, args.speed);
        let ticks = (args.spin_seconds * 60.0).max(0.0).round() as u32;
        for _ in 0..ticks {
            viewer.tick(1.0 / 60.0);
        }
    }

    if let Some(path) = &args.thumbnail {
        let options = ThumbnailOptions {
            width: args.thumb_width,
            height: args.thumb_height,
            quality: args.quality,
        };
        let bytes = viewer.generate_thumbnail(&options)?;
        std::fs::write(path, &bytes)?;
        log::info!("thumbnail written to {} ({} bytes)", path.display(), bytes.len());
    }

    if let Some(path) = &args.frame {
        let options = CaptureOptions {
            codec: ImageCodec::Png,
            quality: args.quality,
        };
        let bytes = viewer.capture_frame(&options)?;
        std::fs::write(path, &bytes)?;
        log::info!("frame written to {} ({} bytes)", path.display(), bytes.len());
    }

    Ok(())
}
