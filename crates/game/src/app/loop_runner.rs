use std::process::ExitCode;
use std::time::Duration;

use engine::{run_app, run_headless, InputAction, InputSnapshot, Viewport};
use tracing::error;

use super::bootstrap::{AppWiring, RunMode};

/// Headless runs press confirm on this cadence so menus advance without a player.
const HEADLESS_CONFIRM_EVERY: u64 = 30;
const HEADLESS_FRAME: Duration = Duration::from_micros(16_667);

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        mode,
        config,
        mut engine,
    } = app;
    match mode {
        RunMode::Windowed => {
            if let Err(err) = run_app(config, engine) {
                error!(error = %err, "run_failed");
                return ExitCode::FAILURE;
            }
        }
        RunMode::Headless { frames } => {
            let viewport = Viewport {
                width: config.window_width,
                height: config.window_height,
            };
            let outcome =
                run_headless(&mut engine, frames, HEADLESS_FRAME, viewport, scripted_input);
            let report = match outcome {
                Ok(report) => report,
                Err(err) => {
                    error!(error = %err, "headless_run_failed");
                    return ExitCode::FAILURE;
                }
            };
            match report.to_json() {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    error!(error = %err, "report_encode_failed");
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}

fn scripted_input(frame: u64) -> InputSnapshot {
    if frame % HEADLESS_CONFIRM_EVERY == 0 {
        InputSnapshot::empty().with_action_pressed(InputAction::Confirm)
    } else {
        InputSnapshot::empty()
    }
}
