use anyhow::Context;
use clap::{Parser, Subcommand};
use galvocore::contour::ContourStrategy;
use galvocore::daq_interface::{DaqOutput, OutputHandoff, OutputMode};
use galvocore::telemetry::{LogManager, StatusSink};
use generator::polygon::{camera_contour, polygon_handles, GeneratorConfig};
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use output::{run_output_worker, FileOutput};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{RoiSpec, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod output;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Galvo drive-waveform generator and checker")]
struct Args {
    /// Load limits, scan settings and ROIs from YAML instead of flags
    #[arg(long, global = true)]
    workflow: Option<PathBuf>,
    /// Write the resulting drive waveform as JSON
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Synthesize a raster frame and report its timing and dynamics
    Raster {
        #[arg(long, default_value_t = 250_000)]
        sample_rate: u32,
        #[arg(long, default_value_t = 3.0)]
        volt_range: f64,
        #[arg(long, default_value_t = 500)]
        pixels: usize,
        #[arg(long, default_value_t = 0.0)]
        angle: f64,
        /// Bidirectional lines instead of sawtooth fly-back
        #[arg(long, default_value_t = false)]
        triangle: bool,
    },
    /// Generate, validate and assemble contour ROIs into one drive cycle
    Contour {
        #[arg(long, default_value_t = 50_000)]
        sample_rate: u32,
        #[arg(long, default_value_t = 3.0)]
        volt_range: f64,
        #[arg(long, default_value_t = 400)]
        contour_points: usize,
        #[arg(long, default_value = "uniform")]
        strategy: ContourStrategy,
        /// Keep the HTTP bridge alive for incoming contours
        #[arg(long, default_value_t = false)]
        serve: bool,
    },
}

/// Side count for the generated polygon that splits `points` evenly, if a
/// small one exists.
fn demo_side_count(points: usize) -> Option<usize> {
    std::iter::once(4)
        .chain(3..=12)
        .find(|sides| points > 0 && points % sides == 0)
}

/// Fills `config` with a generated polygon and camera contour. Point counts no
/// small polygon divides fall back to the Uniform strategy.
fn add_demo_rois(config: &mut WorkflowConfig) -> anyhow::Result<()> {
    let generator = GeneratorConfig::default();
    let sides = match demo_side_count(config.scan.contour_points) {
        Some(sides) => sides,
        None => {
            config.scan.strategy = ContourStrategy::Uniform;
            4
        }
    };
    let handles = polygon_handles(&GeneratorConfig {
        sides,
        ..generator.clone()
    })?;
    let contour = camera_contour(&GeneratorConfig {
        center: galvocore::Point::new(120.0, 380.0),
        ..generator
    });
    config.rois = vec![
        RoiSpec {
            slot: 1,
            handles: Some(handles),
            contour: None,
        },
        RoiSpec {
            slot: 2,
            handles: None,
            contour: Some(contour),
        },
    ];
    Ok(())
}

fn write_output(path: Option<PathBuf>, waveform: &galvocore::daq_interface::DriveWaveform) -> anyhow::Result<()> {
    if let Some(path) = path {
        let mut output = FileOutput::new(&path);
        if let Some((x, y)) = waveform.first_sample() {
            output.park(x, y)?;
        }
        output
            .start(waveform, OutputMode::SingleShot)
            .with_context(|| format!("writing output {}", path.display()))?;
        output.stop()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let status = LogManager::new();

    let loaded = match &args.workflow {
        Some(path) => Some(WorkflowConfig::load(path)?),
        None => None,
    };

    match args.mode {
        Mode::Raster {
            sample_rate,
            volt_range,
            pixels,
            angle,
            triangle,
        } => {
            let workflow_config = loaded.unwrap_or_else(|| {
                let mut config = WorkflowConfig::default();
                config.raster = galvocore::waveform::RasterConfig {
                    angle_deg: angle,
                    sawtooth: !triangle,
                    ..galvocore::waveform::RasterConfig::square(sample_rate, volt_range, pixels)
                };
                config
            });
            let runner = Runner::new(workflow_config);
            let result = runner.execute_raster()?;
            for message in runner.sink().drain() {
                status.publish(&message);
            }
            println!(
                "Raster frame -> samples {}, line size {}, frame duration {:.4} s, within limits {}",
                result.waveform.len(),
                result.line_size,
                result.frame_duration,
                result.report.passed
            );
            write_output(args.output, &result.waveform)?;
        }
        Mode::Contour {
            sample_rate,
            volt_range,
            contour_points,
            strategy,
            serve,
        } => {
            let mut workflow_config = loaded.unwrap_or_else(|| {
                WorkflowConfig::from_args(sample_rate, volt_range, contour_points, strategy)
            });
            if workflow_config.rois.is_empty() {
                status.publish("No ROIs configured; using a generated polygon and camera contour.");
                add_demo_rois(&mut workflow_config)?;
            }

            let runner = Runner::new(workflow_config);
            let result = runner.execute_contour()?;
            for (slot, report) in &result.reports {
                println!("ROI {} -> {}", slot, report);
            }
            println!(
                "Contour cycle -> points per round {}, frequency {:.4} Hz, time per round {:.3} ms",
                result.scan.points_per_round(),
                result.scan.contour_frequency(),
                result.scan.time_per_round_ms()
            );
            let waveform = result.scan.to_waveform();
            write_output(args.output.clone(), &waveform)?;

            if serve {
                let handoff = Arc::new(OutputHandoff::new());
                let slots = result.session.committed_slots();
                let bridge = Arc::new(GuiBridge::new(result.session, runner.sink(), handoff.clone()));
                bridge.publish(&result.scan, slots)?;

                let runtime = TokioBuilder::new_multi_thread()
                    .enable_all()
                    .build()
                    .context("creating runtime for the HTTP bridge")?;
                runtime.block_on(async {
                    if let Some(path) = args.output {
                        let receiver = handoff.subscribe();
                        tokio::spawn(async move {
                            if let Err(err) = run_output_worker(receiver, FileOutput::new(path)).await {
                                log::error!("output worker failed: {:#}", err);
                            }
                        });
                    }
                    tokio::spawn(GuiBridge::serve(bridge, gui_bind_address()));
                    status.publish(&format!(
                        "HTTP bridge running on {} (Ctrl+C to stop)...",
                        gui_bind_address()
                    ));
                    signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
                    Ok::<(), anyhow::Error>(())
                })?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_polygon_divides_point_count() {
        assert_eq!(demo_side_count(400), Some(4));
        assert_eq!(demo_side_count(300), Some(4));
        assert_eq!(demo_side_count(303), Some(3));
        assert_eq!(demo_side_count(401), None);
    }

    #[test]
    fn indivisible_point_count_switches_to_uniform() {
        let mut config = WorkflowConfig::from_args(50_000, 3.0, 401, ContourStrategy::EvenlyBetween);
        add_demo_rois(&mut config).unwrap();
        assert_eq!(config.scan.strategy, ContourStrategy::Uniform);
        assert_eq!(config.rois[0].handles.as_ref().unwrap().len(), 4);

        let result = Runner::new(config).execute_contour().unwrap();
        assert_eq!(result.scan.points_per_round(), 401 + 200);
    }

    #[test]
    fn divisible_point_count_keeps_strategy() {
        let mut config = WorkflowConfig::from_args(50_000, 3.0, 360, ContourStrategy::EvenlyBetween);
        add_demo_rois(&mut config).unwrap();
        assert_eq!(config.scan.strategy, ContourStrategy::EvenlyBetween);
        let result = Runner::new(config).execute_contour().unwrap();
        assert_eq!(result.scan.points_per_round(), 360 + 200);
    }
}
