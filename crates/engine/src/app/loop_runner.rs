use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::geometry::Viewport;
use crate::world::RoomState;

use super::input::ActionStates;
use super::{Engine, EngineError, GameMode, InputAction, InputSnapshot, Renderer};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Tilerun".to_string(),
            window_width: 1280,
            window_height: 720,
            max_frame_delta: Duration::from_millis(250),
            max_render_fps: Some(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
    #[error("engine stopped: {0}")]
    Engine(#[source] EngineError),
}

/// Opens a window and steps `engine` once per redraw until it reaches [`GameMode::Exit`].
pub fn run_app(config: LoopConfig, mut engine: Engine) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();

    info!(
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let engine_failure: Rc<Cell<Option<EngineError>>> = Rc::new(Cell::new(None));
    let failure_in_loop = Rc::clone(&engine_failure);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                    let input_snapshot = input_collector.snapshot_for_tick();
                    if input_snapshot.quit_requested() {
                        window_target.exit();
                        return;
                    }
                    match engine.update(&input_snapshot, frame_dt) {
                        Ok(GameMode::Exit) => {
                            info!(reason = "exit_mode", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            error!(error = %err, "engine_update_failed");
                            failure_in_loop.set(Some(err));
                            window_target.exit();
                            return;
                        }
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let frame = engine.draw(renderer.viewport());
                    if let Err(error) = renderer.render(&frame) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!(mode = ?engine.mode(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)?;

    match engine_failure.take() {
        Some(err) => Err(AppError::Engine(err)),
        None => Ok(()),
    }
}

/// Summary of a windowless run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeadlessReport {
    pub frames_run: u64,
    pub final_mode: String,
    pub mode_changes: u32,
    pub rooms_entered: u32,
    pub level: Option<String>,
    pub room_state: Option<String>,
    pub draw_commands: usize,
}

impl HeadlessReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Steps `engine` for up to `frames` frames without a window, feeding it `script(frame)` as input.
/// Stops early once the engine reaches [`GameMode::Exit`].
pub fn run_headless(
    engine: &mut Engine,
    frames: u64,
    frame_dt: Duration,
    viewport: Viewport,
    mut script: impl FnMut(u64) -> InputSnapshot,
) -> Result<HeadlessReport, EngineError> {
    let mut frames_run = 0;
    let mut mode_changes = 0;
    let mut rooms_entered = 0;
    let mut previous_mode = engine.mode();
    let mut draw_commands = 0;

    while frames_run < frames {
        let input = script(frames_run);
        let mode = engine.update(&input, frame_dt)?;
        frames_run += 1;
        if mode != previous_mode {
            mode_changes += 1;
            if mode == GameMode::Room && previous_mode != GameMode::InGameMenu {
                rooms_entered += 1;
            }
            previous_mode = mode;
        }
        if mode == GameMode::Exit {
            break;
        }
        draw_commands = engine.draw(viewport).draw_list.len();
    }

    let report = HeadlessReport {
        frames_run,
        final_mode: format!("{:?}", engine.mode()),
        mode_changes,
        rooms_entered,
        level: engine.room().map(|room| room.level().name.clone()),
        room_state: engine.room().map(|room| room_state_label(room.state()).to_string()),
        draw_commands,
    };
    info!(
        frames_run = report.frames_run,
        final_mode = report.final_mode.as_str(),
        rooms_entered = report.rooms_entered,
        "headless_run_finished"
    );
    Ok(report)
}

fn room_state_label(state: RoomState) -> &'static str {
    match state {
        RoomState::Active => "active",
        RoomState::Failed => "failed",
        RoomState::Finished => "finished",
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    pressed_edges: ActionStates,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let Some(action) = action_for_key(key) else {
            return;
        };
        if is_pressed && !self.action_states.is_down(action) {
            self.pressed_edges.set(action, true);
        }
        self.action_states.set(action, is_pressed);
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot =
            InputSnapshot::new(self.quit_requested, self.action_states, self.pressed_edges);
        self.pressed_edges.clear();
        snapshot
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::KeyW | KeyCode::ArrowUp | KeyCode::Space => Some(InputAction::Jump),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(InputAction::Confirm),
        KeyCode::Escape => Some(InputAction::Menu),
        KeyCode::KeyR => Some(InputAction::Reset),
        KeyCode::KeyM | KeyCode::Tab => Some(InputAction::Minimap),
        _ => None,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EngineSettings, LevelQueue};
    use crate::content::LevelData;

    const TICK: Duration = Duration::from_millis(16);

    fn viewport() -> Viewport {
        Viewport {
            width: 320,
            height: 240,
        }
    }

    fn quick_engine() -> Engine {
        let level = LevelData::from_ascii(
            "flat",
            32,
            &[
                "..........",
                "..........",
                "..........",
                "..........",
                "..........",
                "..........",
                "..........",
                "##########",
            ],
        )
        .expect("level")
        .with_object(crate::content::LevelObject::PlayerSpawn {
            position: crate::geometry::Vec2::new(100.0, 100.0),
        });
        let settings = EngineSettings {
            intro_duration: Duration::from_millis(32),
            ..EngineSettings::default()
        };
        Engine::new(Box::new(LevelQueue::new([level])), settings)
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn cap_sleep_fills_remaining_frame_budget() {
        let target = target_frame_duration(normalize_render_fps_cap(Some(50)));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(5), target),
            Duration::from_millis(15)
        );
        assert_eq!(compute_cap_sleep(Duration::from_millis(30), target), Duration::ZERO);
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(compute_cap_sleep(Duration::from_millis(5), None), Duration::ZERO);
    }

    #[test]
    fn key_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Enter), true);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.was_pressed(InputAction::Confirm));
        assert!(!second.was_pressed(InputAction::Confirm));
        assert!(second.is_down(InputAction::Confirm));
    }

    #[test]
    fn held_key_does_not_spam_press_edges() {
        let mut input = InputCollector::default();
        let space = PhysicalKey::Code(KeyCode::Space);

        input.update_action_state_from_physical_key(space, true);
        let first = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(space, true);
        let second = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(space, false);
        input.update_action_state_from_physical_key(space, true);
        let third = input.snapshot_for_tick();

        assert!(first.was_pressed(InputAction::Jump));
        assert!(!second.was_pressed(InputAction::Jump));
        assert!(third.was_pressed(InputAction::Jump));
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_actions() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyW), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::Jump));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), false);

        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn escape_maps_to_menu_not_quit() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);
        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.was_pressed(InputAction::Menu));
        assert!(!snapshot.quit_requested());

        input.mark_quit_requested();
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn r_key_maps_to_reset() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyR), true);
        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.was_pressed(InputAction::Reset));
        assert!(!snapshot.was_pressed(InputAction::Menu));

        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Tab), true);
        assert!(input.snapshot_for_tick().was_pressed(InputAction::Minimap));
    }

    #[test]
    fn headless_run_reaches_the_first_room() {
        let mut engine = quick_engine();
        let report = run_headless(&mut engine, 600, TICK, viewport(), |frame| {
            if frame % 20 == 0 {
                InputSnapshot::empty().with_action_pressed(InputAction::Confirm)
            } else {
                InputSnapshot::empty()
            }
        })
        .expect("headless run");

        assert_eq!(report.final_mode, "Room");
        assert_eq!(report.rooms_entered, 1);
        assert_eq!(report.level.as_deref(), Some("flat"));
        assert_eq!(report.room_state.as_deref(), Some("active"));
        assert!(report.draw_commands > 0);
    }

    #[test]
    fn headless_report_serializes_to_json() {
        let mut engine = quick_engine();
        let report = run_headless(&mut engine, 3, TICK, viewport(), |_| InputSnapshot::empty())
            .expect("run");
        assert_eq!(report.frames_run, 3);

        let json = report.to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["frames_run"], 3);
        assert_eq!(value["final_mode"], "Intro");
    }
}
