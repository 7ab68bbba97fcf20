//! RenderHost - Offline audio plugin render host
//!
//! Usage:
//!   renderhost process gain -i in.wav -o out.wav -p gain:0.5
//!   renderhost process tone -o tone.wav -t 4 -a sweep.json
//!   renderhost plugins

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use rh_plugin::{builtin_names, create_builtin};
use rh_render::{RenderConfig, Renderer};

#[derive(Parser)]
#[command(name = "renderhost", about = "Offline audio plugin render host", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render audio through a plugin
    Process {
        /// Plugin name (see `renderhost plugins`)
        plugin: String,

        /// Input audio file; repeat to attach several sources
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Sample rate in Hz (defaults to the input file's rate)
        #[arg(short = 'r', long)]
        sample_rate: Option<f64>,

        /// Processing block size in frames
        #[arg(short, long, default_value_t = 512)]
        block_size: usize,

        /// Output bit depth: 16, 24, or 32
        #[arg(short = 'd', long, default_value_t = 32)]
        bit_depth: u32,

        /// Render duration in seconds (instrument mode only)
        #[arg(short = 't', long)]
        duration: Option<f64>,

        /// One-time parameter setting as name:value; repeatable
        #[arg(short, long)]
        param: Vec<String>,

        /// JSON automation document
        #[arg(short, long)]
        automation: Option<PathBuf>,

        /// Replace the output file if it exists
        #[arg(short = 'y', long)]
        overwrite: bool,

        /// Frames between automation updates (default: once per block)
        #[arg(long)]
        automation_interval: Option<usize>,

        /// Validate the setup without rendering
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// List the available plugins
    Plugins,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Process {
            plugin,
            input,
            output,
            sample_rate,
            block_size,
            bit_depth,
            duration,
            param,
            automation,
            overwrite,
            automation_interval,
            dry_run,
        } => {
            let mut config = RenderConfig::new(output)
                .with_block_size(block_size)
                .with_bit_depth(bit_depth)
                .with_overwrite(overwrite);
            for path in input {
                config = config.with_input(path);
            }
            if let Some(rate) = sample_rate {
                config = config.with_sample_rate(rate);
            }
            if let Some(seconds) = duration {
                config = config.with_duration(seconds);
            }
            if let Some(frames) = automation_interval {
                config = config.with_automation_interval(frames);
            }
            for setting in &param {
                match setting.split_once(':') {
                    Some((name, value)) if !name.is_empty() => {
                        config = config.with_setting(name, value);
                    }
                    _ => log::warn!("ignoring malformed parameter setting '{setting}'"),
                }
            }
            if let Some(path) = automation {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read automation file {}", path.display()))?;
                config = config.with_automation_json(json);
            }

            process(&plugin, config, dry_run)
        }
        Commands::Plugins => {
            for name in builtin_names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn process(plugin_name: &str, config: RenderConfig, dry_run: bool) -> Result<()> {
    let Some(mut plugin) = create_builtin(plugin_name) else {
        bail!(
            "unknown plugin '{}' (available: {})",
            plugin_name,
            builtin_names().join(", ")
        );
    };

    let mut renderer = Renderer::new(config);
    if dry_run {
        renderer.dry_run()?;
        println!("configuration valid");
        return Ok(());
    }

    let report = renderer.run(plugin.as_mut())?;
    println!(
        "rendered {} frames in {} blocks ({:.3} s, {:.2}x realtime)",
        report.frames_processed,
        report.blocks_processed,
        report.elapsed.as_secs_f64(),
        report.realtime_factor
    );
    Ok(())
}
