use std::time::Duration;

use tracing::{debug, info};

use crate::app::{DrawList, InputAction, InputSnapshot};
use crate::geometry::{Color, Rect, Vec2};

use super::body::Body;
use super::collision::{move_body, MoveOutcome};
use super::splatter::Splat;
use super::tile_grid::TileGrid;

pub const PLAYER_SIZE: Vec2 = Vec2::new(32.0, 64.0);
pub const PLAYER_TINT: Color = Color::LIGHT_GREEN;
pub const MAX_SPEED_X: f32 = 10.0;
pub const MAX_SPEED_Y: f32 = 40.0;
pub const MAX_JUMP_SPEED_X: f32 = MAX_SPEED_X - 0.5;
pub const MAX_JUMP_SPEED_Y: f32 = 20.0;
pub const JUMP_SPEED: f32 = 15.0;
pub const PLAYER_ACCELERATION: Vec2 = Vec2::new(1.2, 1.5);
pub const PLAYER_DECELERATION: Vec2 = Vec2::new(3.0, 0.0);
/// Downward speed is divided by this while pressed against a wall.
pub const WALL_SLIDE_FACTOR: f32 = 4.0;
pub const WALL_JUMP_PUSH: f32 = MAX_JUMP_SPEED_X - 2.0;
/// Vertical speed at which the player no longer counts as standing.
pub const MIN_FALL_SPEED: f32 = 2.0;
/// Frames between running out of time and the room failing.
pub const DEATH_FRAMES: u32 = 30;
/// Velocity handed to a sliding player who steers off the wall.
const WALL_RELEASE_SPEED: f32 = 2.0;

/// Frames between footstep splats while running on the ground.
pub const STEP_SPLAT_INTERVAL: u32 = 8;
/// Speed above which a wall impact leaves a splat.
pub const IMPACT_SPLAT_SPEED: f32 = 10.0;
const STEP_SPLAT_SIZE: f32 = 0.6;
const JUMP_SPLAT_SIZE: f32 = 50.0;
const SLIDE_SPLAT_SIZE: f32 = 80.0;
const DEATH_SPLAT_SCALE: f32 = 8.0;
const NEGLIGIBLE_SPLAT_SPEED: f32 = 0.1;

pub const TARGET_SIZE: Vec2 = Vec2::new(32.0, 32.0);
/// Player center distance at which a target is collected.
pub const TARGET_PICKUP_RADIUS: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    lifetime: Duration,
    initial_lifetime: Duration,
    dying: bool,
    death_frames: u32,
    can_jump: bool,
    on_ground: bool,
    sliding: bool,
    facing: Facing,
    step_frames: u32,
}

impl PlayerState {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            initial_lifetime: lifetime,
            dying: false,
            death_frames: 0,
            can_jump: true,
            on_ground: false,
            sliding: false,
            facing: Facing::Right,
            step_frames: 0,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn is_alive(&self) -> bool {
        !self.dying
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn is_sliding(&self) -> bool {
        self.sliding
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Remaining share of the starting lifetime, in `0.0..=1.0`.
    pub fn life_fraction(&self) -> f32 {
        if self.initial_lifetime.is_zero() {
            return 0.0;
        }
        (self.lifetime.as_secs_f32() / self.initial_lifetime.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn restore_life(&mut self) {
        self.lifetime = self.initial_lifetime;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(PlayerState),
    /// Pickup that refills the player's lifetime.
    Target,
    /// Level exit; touching it finishes the room.
    Portal,
    /// Drawn over the solid tiles it stamped at load time.
    Barrier,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Player(_) => "player",
            EntityKind::Target => "target",
            EntityKind::Portal => "portal",
            EntityKind::Barrier => "barrier",
        }
    }
}

/// Side effects an entity asks of its room. The room applies them after the update pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RoomEffect {
    Despawn(EntityId),
    RestorePlayerLife,
    Splat(Splat),
    Fail,
    Finish,
}

pub(crate) struct StepContext<'a> {
    pub grid: &'a TileGrid,
    pub gravity: f32,
    pub input: &'a InputSnapshot,
    pub elapsed: Duration,
    /// Center of the player, supplied only while it is alive.
    pub player_center: Option<Vec2>,
    pub effects: &'a mut Vec<RoomEffect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    pub kind: EntityKind,
}

impl Entity {
    pub fn player(id: EntityId, spawn: Vec2, lifetime: Duration) -> Self {
        let body = Body::new(spawn, PLAYER_SIZE, PLAYER_TINT).with_motion(
            Vec2::new(MAX_JUMP_SPEED_X, MAX_JUMP_SPEED_Y),
            PLAYER_ACCELERATION,
            PLAYER_DECELERATION,
        );
        Self {
            id,
            body,
            kind: EntityKind::Player(PlayerState::new(lifetime)),
        }
    }

    pub fn target(id: EntityId, position: Vec2, tint: Color) -> Self {
        Self {
            id,
            body: Body::new(position, TARGET_SIZE, tint).without_gravity(),
            kind: EntityKind::Target,
        }
    }

    pub fn portal(id: EntityId, bounds: Rect, tint: Color) -> Self {
        Self {
            id,
            body: Body::new(bounds.position(), bounds.size(), tint).without_gravity(),
            kind: EntityKind::Portal,
        }
    }

    pub fn barrier(id: EntityId, bounds: Rect, tint: Color) -> Self {
        Self {
            id,
            body: Body::new(bounds.position(), bounds.size(), tint)
                .without_gravity()
                .non_collidable(),
            kind: EntityKind::Barrier,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn update(&mut self, step: &mut StepContext<'_>) {
        let alive = self.player_state().is_some_and(PlayerState::is_alive);
        if alive && step.input.was_pressed(InputAction::Reset) {
            info!(entity_id = self.id.0, "player_reset");
            self.die(step.effects);
            return;
        }
        match &mut self.kind {
            EntityKind::Player(state) => {
                if state.dying {
                    state.death_frames += 1;
                    if state.death_frames == DEATH_FRAMES {
                        step.effects.push(RoomEffect::Fail);
                    }
                    return;
                }
                let direction = steer_player(&mut self.body, state, step.input, step.effects);
                leave_footstep(&self.body, state, direction, step.gravity, step.effects);
                let outcome = move_body(&mut self.body, step.grid, direction, step.gravity);
                self.react(outcome, step.effects);
                let mut expired = false;
                if let EntityKind::Player(state) = &mut self.kind {
                    if self.body.velocity.y.abs() >= MIN_FALL_SPEED {
                        state.on_ground = false;
                    }
                    state.lifetime = state.lifetime.saturating_sub(step.elapsed);
                    expired = state.lifetime.is_zero();
                }
                if expired {
                    self.die(step.effects);
                }
            }
            EntityKind::Target => {
                let center = self.body.center();
                let collected = step
                    .player_center
                    .is_some_and(|player| player.distance(center) < TARGET_PICKUP_RADIUS);
                if collected {
                    debug!(entity_id = self.id.0, "target_collected");
                    step.effects.push(RoomEffect::Despawn(self.id));
                    step.effects.push(RoomEffect::RestorePlayerLife);
                }
            }
            EntityKind::Portal | EntityKind::Barrier => {}
        }
    }

    fn react(&mut self, outcome: MoveOutcome, effects: &mut Vec<RoomEffect>) {
        if outcome.fell_off_stage {
            debug!(entity_id = self.id.0, kind = self.kind.label(), "fell_off_stage");
            effects.push(RoomEffect::Despawn(self.id));
            return;
        }
        if outcome.hit_wall {
            self.on_wall();
            if !outcome.hit_ceiling {
                self.splat_on_wall(effects);
            }
        }
        if outcome.grounded {
            self.on_ground(outcome.hit_ground);
        }
        if outcome.hit_ceiling {
            self.on_ceiling();
        }
    }

    pub fn on_wall(&mut self) {
        if let EntityKind::Player(state) = &mut self.kind {
            let velocity = self.body.velocity;
            if velocity.y.abs() > 0.0 && !state.on_ground {
                state.sliding = true;
            }
            if velocity.y > 0.0 && !state.on_ground {
                let slowdown = Vec2::new(0.0, velocity.y / WALL_SLIDE_FACTOR);
                self.body.velocity = velocity.push_back(slowdown);
                state.can_jump = true;
            }
        }
    }

    /// Starts the death countdown and leaves a large splat. No effect on a dying player.
    pub(crate) fn die(&mut self, effects: &mut Vec<RoomEffect>) {
        let Some(state) = self.player_state_mut() else {
            return;
        };
        if state.dying {
            return;
        }
        state.dying = true;
        info!(entity_id = self.id.0, "player_died");
        effects.push(RoomEffect::Splat(Splat::new(
            self.body.center(),
            self.body.size() * DEATH_SPLAT_SCALE,
            self.body.tint,
            Vec2::splat(1.0),
        )));
    }

    fn splat_on_wall(&self, effects: &mut Vec<RoomEffect>) {
        let Some(state) = self.player_state() else {
            return;
        };
        let position = self.body.position();
        let size = self.body.size();
        let velocity = self.body.velocity;
        let ink = self.body.tint;

        if state.sliding && velocity.y.abs() > 0.0 {
            let x = if velocity.x > 0.0 {
                position.x + size.x
            } else {
                position.x
            };
            let x = match state.facing {
                Facing::Left => x + 10.0,
                Facing::Right => x - 23.0,
            };
            let at = Vec2::new(x, position.y + size.y / 4.0);
            let splat = Splat::new(at, Vec2::splat(SLIDE_SPLAT_SIZE), ink, velocity);
            effects.push(RoomEffect::Splat(splat));
        }

        if velocity.length() > IMPACT_SPLAT_SPEED {
            let mut at = position;
            if velocity.x > 0.0 {
                at.x += size.x;
            }
            if state.facing == Facing::Left {
                at.y += 30.0;
            }
            let significant = |speed: f32| {
                if speed.abs() > NEGLIGIBLE_SPLAT_SPEED {
                    speed
                } else {
                    0.0
                }
            };
            let impact = Vec2::new(significant(velocity.x), significant(velocity.y));
            let splat = Splat::new(at, size * STEP_SPLAT_SIZE, ink, impact);
            effects.push(RoomEffect::Splat(splat));
        }
    }

    /// `landed` is set only on the frame contact begins.
    pub fn on_ground(&mut self, landed: bool) {
        self.body.velocity.y = 0.0;
        if let EntityKind::Player(state) = &mut self.kind {
            if landed {
                debug!(entity_id = self.id.0, "player_landed");
            }
            self.body.max_speed = Vec2::new(MAX_SPEED_X, MAX_SPEED_Y);
            state.on_ground = true;
            state.can_jump = true;
            state.sliding = false;
        }
    }

    pub fn on_ceiling(&mut self) {
        if let EntityKind::Player(state) = &mut self.kind {
            self.body.velocity.y = self.body.velocity.y.max(0.0);
            state.sliding = false;
        }
    }

    pub(crate) fn on_object(&mut self, other: &EntityKind, effects: &mut Vec<RoomEffect>) {
        match (&self.kind, other) {
            (EntityKind::Portal, EntityKind::Player(state)) if state.is_alive() => {
                effects.push(RoomEffect::Finish);
            }
            (EntityKind::Player(_), _) => {
                debug!(entity_id = self.id.0, other = other.label(), "player_contact");
            }
            _ => {}
        }
    }

    pub fn draw(&self, draw_list: &mut DrawList) {
        draw_list.push_world(self.body.bounds(), self.body.tint, 0.0);
    }
}

fn steer_player(
    body: &mut Body,
    state: &mut PlayerState,
    input: &InputSnapshot,
    effects: &mut Vec<RoomEffect>,
) -> Vec2 {
    if body.velocity.y == 0.0 {
        body.max_speed.y = MAX_SPEED_Y;
    }
    if state.can_jump && input.is_down(InputAction::Jump) {
        body.velocity.y = -JUMP_SPEED;
        if state.sliding {
            body.velocity.x = if state.facing == Facing::Right && body.velocity.x > 0.0 {
                -WALL_JUMP_PUSH
            } else {
                WALL_JUMP_PUSH
            };
        }
        body.max_speed = Vec2::new(MAX_JUMP_SPEED_X, MAX_JUMP_SPEED_Y);
        state.can_jump = false;
        state.on_ground = false;
        state.sliding = false;
        let size = Vec2::splat(JUMP_SPLAT_SIZE);
        let splat = Splat::new(body.center(), size, body.tint, body.velocity);
        effects.push(RoomEffect::Splat(splat));
    }

    let direction = if input.is_down(InputAction::MoveLeft) {
        -1.0
    } else if input.is_down(InputAction::MoveRight) {
        1.0
    } else {
        0.0
    };
    if direction != 0.0 {
        if state.sliding {
            body.velocity.x = WALL_RELEASE_SPEED * direction;
            state.sliding = false;
        }
        state.facing = if direction < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        };
    }
    Vec2::new(direction, 0.0)
}

/// Drops a small mark behind the trailing foot every few frames of running.
fn leave_footstep(
    body: &Body,
    state: &mut PlayerState,
    direction: Vec2,
    gravity: f32,
    effects: &mut Vec<RoomEffect>,
) {
    if !state.on_ground || direction.x == 0.0 {
        state.step_frames = 0;
        return;
    }
    state.step_frames += 1;
    if state.step_frames % STEP_SPLAT_INTERVAL != 1 {
        return;
    }
    let foot = body.bounding_box();
    let at = match state.facing {
        Facing::Right => Vec2::new(foot.x, foot.bottom()),
        Facing::Left => Vec2::new(foot.right(), foot.bottom()),
    };
    let drift = Vec2::splat(gravity * 0.0001);
    let splat = Splat::new(at, Vec2::splat(STEP_SPLAT_SIZE), body.tint, drift);
    effects.push(RoomEffect::Splat(splat));
}
