use std::time::Duration;

use engine::{
    run_headless, Color, Engine, EngineSettings, GameMode, InputAction, InputSnapshot, LevelData,
    LevelObject, LevelQueue, Rect, RoomState, Vec2, Viewport,
};

const FRAME: Duration = Duration::from_millis(16);
const VIEWPORT: Viewport = Viewport {
    width: 320,
    height: 240,
};

fn floor_level(name: &str) -> LevelData {
    LevelData::from_ascii(
        name,
        32,
        &[
            "..........",
            "..........",
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
    .with_object(LevelObject::PlayerSpawn {
        position: Vec2::new(100.0, 200.0),
    })
}

fn level_with_portal(name: &str) -> LevelData {
    floor_level(name).with_object(LevelObject::Portal {
        bounds: Rect::new(96.0, 200.0, 48.0, 64.0),
        tint: Color::WHITE,
    })
}

fn quick_settings() -> EngineSettings {
    EngineSettings {
        intro_duration: Duration::ZERO,
        credits_duration: Duration::ZERO,
        ..EngineSettings::default()
    }
}

fn confirm_every_frame(_: u64) -> InputSnapshot {
    InputSnapshot::empty().with_action_pressed(InputAction::Confirm)
}

#[test]
fn clearing_every_level_rolls_credits_then_exits() {
    let levels = LevelQueue::new([level_with_portal("one"), level_with_portal("two")]);
    let mut engine = Engine::new(Box::new(levels), quick_settings());

    let report = run_headless(&mut engine, 5_000, FRAME, VIEWPORT, confirm_every_frame)
        .expect("headless run");

    assert_eq!(engine.mode(), GameMode::Exit);
    assert_eq!(report.final_mode, "Exit");
    assert_eq!(report.rooms_entered, 1);
    assert!(report.frames_run < 5_000);
    assert!(engine.room().is_none());
}

#[test]
fn falling_into_a_pit_restarts_the_same_level() {
    let pit = LevelData::from_ascii("pit", 32, &["......", "......", "......", "......"])
        .expect("level")
        .with_object(LevelObject::PlayerSpawn {
            position: Vec2::new(40.0, 10.0),
        });
    let mut engine = Engine::new(
        Box::new(LevelQueue::new([pit, level_with_portal("after")])),
        quick_settings(),
    );

    let mut saw_failure = false;
    for frame in 0..2_000u64 {
        engine
            .update(&confirm_every_frame(frame), FRAME)
            .expect("update");
        if engine.room().is_some_and(|room| room.state() == RoomState::Failed) {
            saw_failure = true;
        }
        if saw_failure && engine.room().is_some_and(|room| room.state() == RoomState::Active) {
            break;
        }
    }

    assert!(saw_failure);
    assert_eq!(engine.mode(), GameMode::Room);
    let room = engine.room().expect("room");
    assert_eq!(room.level().name, "pit");
    assert_eq!(room.state(), RoomState::Active);
}

#[test]
fn menu_pauses_the_room_until_resumed() {
    let mut engine = Engine::new(
        Box::new(LevelQueue::new([floor_level("calm")])),
        quick_settings(),
    );
    let report = run_headless(&mut engine, 400, FRAME, VIEWPORT, confirm_every_frame)
        .expect("reach room");
    assert_eq!(report.final_mode, "Room");

    // Let the room fade finish before opening the menu.
    run_headless(&mut engine, 120, FRAME, VIEWPORT, |_| InputSnapshot::empty()).expect("settle");
    let position = engine.room().and_then(|room| room.player()).expect("player").body.position();

    let menu = InputSnapshot::empty().with_action_pressed(InputAction::Menu);
    let mut frames = 0;
    while engine.mode() != GameMode::InGameMenu && frames < 200 {
        engine.update(&menu, FRAME).expect("update");
        frames += 1;
    }
    assert_eq!(engine.mode(), GameMode::InGameMenu);

    while engine.mode() != GameMode::Room && frames < 600 {
        engine.update(&menu, FRAME).expect("update");
        frames += 1;
    }
    assert_eq!(engine.mode(), GameMode::Room);
    let resumed = engine.room().and_then(|room| room.player()).expect("player").body.position();
    assert_eq!(resumed, position);
}

#[test]
fn reset_restarts_the_current_level() {
    let mut engine = Engine::new(
        Box::new(LevelQueue::new([floor_level("retry"), level_with_portal("next")])),
        quick_settings(),
    );
    run_headless(&mut engine, 400, FRAME, VIEWPORT, confirm_every_frame).expect("reach room");
    run_headless(&mut engine, 120, FRAME, VIEWPORT, |_| InputSnapshot::empty()).expect("settle");
    assert_eq!(engine.mode(), GameMode::Room);

    let reset = InputSnapshot::empty().with_action_pressed(InputAction::Reset);
    engine.update(&reset, FRAME).expect("reset");

    let mut saw_failure = false;
    for _ in 0..400 {
        engine.update(&InputSnapshot::empty(), FRAME).expect("update");
        if engine.room().is_some_and(|room| room.failed()) {
            saw_failure = true;
        }
        if saw_failure && engine.room().is_some_and(|room| room.state() == RoomState::Active) {
            break;
        }
    }

    assert!(saw_failure);
    let room = engine.room().expect("room");
    assert_eq!(room.level().name, "retry");
    assert!(room.player().and_then(|player| player.player_state()).expect("player").is_alive());
}
