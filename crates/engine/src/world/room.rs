use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::app::{
    Controller, DrawList, FadeRequest, FadeSpeed, FrameContext, InputAction, ViewTransform,
};
use crate::content::{LevelData, LevelLoadError, LevelObject};
use crate::geometry::{Color, Rect, Vec2, Viewport};

use super::camera::{Camera, CameraTarget};
use super::entity::{Entity, EntityId, EntityIdAllocator, PlayerState, RoomEffect, StepContext};
use super::section::{Section, SectionIndex, DEFAULT_ZOOM};
use super::splatter::Splatter;
use super::tile_grid::{TileGrid, TileKind};

pub const DEFAULT_GRAVITY: f32 = 0.75;
pub const DEFAULT_PLAYER_LIFETIME: Duration = Duration::from_secs(30);
/// One-way platforms are drawn as a strip this fraction of the tile height.
const TOP_SOLID_DRAW_FRACTION: f32 = 0.25;
const HUD_BAR_HEIGHT: f32 = 8.0;
const HUD_MARGIN: f32 = 12.0;
/// Largest extent of the minimap panel in window pixels.
const MINIMAP_EXTENT: f32 = 160.0;
const MINIMAP_BACKDROP: Color = Color::rgba(0, 0, 0, 160);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Active,
    Failed,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomSettings {
    pub gravity: f32,
    pub player_lifetime: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            player_lifetime: DEFAULT_PLAYER_LIFETIME,
        }
    }
}

/// One playable level instance. Failed and finished rooms never become active again.
#[derive(Debug)]
pub struct Room {
    level: Arc<LevelData>,
    settings: RoomSettings,
    grid: TileGrid,
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    player_id: Option<EntityId>,
    sections: SectionIndex,
    current_section: Option<usize>,
    camera: Camera,
    splatter: Splatter,
    state: RoomState,
    menu_requested: bool,
}

impl Room {
    pub fn new(level: Arc<LevelData>, settings: RoomSettings) -> Result<Self, LevelLoadError> {
        let mut grid = level.grid()?;
        let level_size = grid.pixel_size();
        let level_rect = Rect::from_position_size(Vec2::ZERO, level_size);

        let mut sections = Vec::new();
        for object in &level.objects {
            match object {
                LevelObject::Section { bounds, zoom } => {
                    sections.push(Section::new(*bounds, *zoom));
                }
                LevelObject::Barrier { bounds, tint } => {
                    if !bounds.intersects(&level_rect) {
                        return Err(LevelLoadError::BarrierOutsideLevel {
                            x: bounds.x,
                            y: bounds.y,
                        });
                    }
                    let stamped = grid.stamp_solid(*bounds, *tint);
                    debug!(level = %level.name, stamped, "barrier_stamped");
                }
                _ => {}
            }
        }

        let mut room = Self {
            level: Arc::clone(&level),
            settings,
            grid,
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
            player_id: None,
            sections: SectionIndex::new(sections),
            current_section: None,
            camera: Camera::new(level_rect.center(), DEFAULT_ZOOM, level_size),
            splatter: Splatter::default(),
            state: RoomState::Active,
            menu_requested: false,
        };

        for object in &level.objects {
            match object {
                LevelObject::PlayerSpawn { position } => {
                    let lifetime = settings.player_lifetime;
                    let id = room.spawn(|id| Entity::player(id, *position, lifetime));
                    room.player_id = Some(id);
                }
                LevelObject::Barrier { bounds, tint } => {
                    room.spawn(|id| Entity::barrier(id, *bounds, *tint));
                }
                LevelObject::Portal { bounds, tint } => {
                    room.spawn(|id| Entity::portal(id, *bounds, *tint));
                }
                LevelObject::Target { position, tint } => {
                    room.spawn(|id| Entity::target(id, *position, *tint));
                }
                LevelObject::Section { .. } => {}
            }
        }
        room.apply_pending();
        room.place_camera();

        info!(
            level = %room.level.name,
            entities = room.entities.len(),
            sections = room.sections.len(),
            "room_loaded"
        );
        Ok(room)
    }

    pub fn level(&self) -> &Arc<LevelData> {
        &self.level
    }

    pub fn settings(&self) -> RoomSettings {
        self.settings
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn splatter(&self) -> &Splatter {
        &self.splatter
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn failed(&self) -> bool {
        self.state == RoomState::Failed
    }

    pub fn menu_requested(&self) -> bool {
        self.menu_requested
    }

    /// Clears the pause request when returning from the in-game menu.
    pub fn resume(&mut self) {
        self.menu_requested = false;
    }

    pub fn current_section(&self) -> Option<usize> {
        self.current_section
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.find_entity(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let id = self.player_id?;
        self.find_entity_mut(id)
    }

    /// Queues an entity. It becomes visible at the next [`Room::apply_pending`].
    pub fn spawn(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(build(id));
        id
    }

    /// Queues a removal. Returns false when `id` is neither live nor pending.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    /// Spawns land before removals, so an entity added and removed in the same frame
    /// never becomes live.
    pub fn apply_pending(&mut self) {
        self.entities.append(&mut self.pending_spawns);

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_despawns.clear();
        }
    }

    fn fail(&mut self, ctx: &mut FrameContext<'_>) {
        if self.state != RoomState::Active {
            return;
        }
        self.state = RoomState::Failed;
        ctx.request_fade(FadeRequest::Out(Color::BLACK, FadeSpeed::Fast));
        info!(level = %self.level.name, "room_failed");
    }

    fn finish(&mut self, ctx: &mut FrameContext<'_>) {
        if self.state != RoomState::Active {
            return;
        }
        self.state = RoomState::Finished;
        ctx.request_fade(FadeRequest::Out(Color::WHITE, FadeSpeed::Fast));
        info!(level = %self.level.name, "room_finished");
    }

    fn update_entities(&mut self, ctx: &FrameContext<'_>) -> Vec<RoomEffect> {
        let mut effects = Vec::new();
        let player_index = self
            .player_id
            .and_then(|id| self.entities.iter().position(|entity| entity.id == id));

        let mut step = StepContext {
            grid: &self.grid,
            gravity: self.settings.gravity,
            input: ctx.input(),
            elapsed: ctx.elapsed(),
            player_center: None,
            effects: &mut effects,
        };
        if let Some(index) = player_index {
            let player = &mut self.entities[index];
            player.update(&mut step);
            step.player_center = player
                .player_state()
                .is_some_and(PlayerState::is_alive)
                .then(|| player.body.center());
        }
        for (index, entity) in self.entities.iter_mut().enumerate() {
            if Some(index) != player_index {
                entity.update(&mut step);
            }
        }

        if let Some(player_index) = player_index {
            self.resolve_player_contacts(player_index, &mut effects);
        }
        effects
    }

    fn resolve_player_contacts(&mut self, player_index: usize, effects: &mut Vec<RoomEffect>) {
        if !self.entities[player_index].body.collidable {
            return;
        }
        for other_index in 0..self.entities.len() {
            if other_index == player_index {
                continue;
            }
            let (player, other) = pair_mut(&mut self.entities, player_index, other_index);
            if !other.body.collidable || !player.body.touches(&other.body) {
                continue;
            }
            let player_kind = player.kind.clone();
            player.on_object(&other.kind, effects);
            other.on_object(&player_kind, effects);
        }
    }

    fn apply_effects(&mut self, effects: Vec<RoomEffect>, ctx: &mut FrameContext<'_>) {
        for effect in effects {
            match effect {
                RoomEffect::Despawn(id) => {
                    self.despawn(id);
                }
                RoomEffect::RestorePlayerLife => {
                    if let Some(state) = self.player_mut().and_then(Entity::player_state_mut) {
                        state.restore_life();
                    }
                }
                RoomEffect::Splat(splat) => self.splatter.add(splat),
                RoomEffect::Fail => self.fail(ctx),
                RoomEffect::Finish => self.finish(ctx),
            }
        }
    }

    fn update_section(&mut self) {
        let Some(player) = self.player() else {
            return;
        };
        let deepest = self.sections.deepest_containing(&player.body.bounding_box());
        if deepest != self.current_section {
            self.change_section(deepest);
        }
    }

    fn change_section(&mut self, section: Option<usize>) {
        self.current_section = section;
        let Some((player_id, player_center)) = self
            .player()
            .map(|player| (player.id, player.body.center()))
        else {
            return;
        };
        match section.and_then(|index| self.sections.get(index)).copied() {
            None => {
                self.camera.follow(player_id, player_center);
                self.camera.zoom_to(DEFAULT_ZOOM);
            }
            Some(section) if section.centered => {
                self.camera.focus_on(section.center());
                self.camera.zoom_to(DEFAULT_ZOOM);
            }
            Some(section) => {
                self.camera.follow(player_id, player_center);
                if let Some(zoom) = section.zoom {
                    self.camera.zoom_to(zoom);
                }
            }
        }
        debug!(level = %self.level.name, section = ?section, "section_changed");
    }

    /// Puts the camera where the opening section wants it, without panning there.
    fn place_camera(&mut self) {
        let Some((player_id, player_box, player_center)) = self
            .player()
            .map(|player| (player.id, player.body.bounding_box(), player.body.center()))
        else {
            return;
        };
        self.current_section = self.sections.deepest_containing(&player_box);
        let section = self
            .current_section
            .and_then(|index| self.sections.get(index))
            .copied();
        let level_size = self.grid.pixel_size();
        self.camera = match section {
            Some(section) if section.centered => {
                let mut camera = Camera::new(section.center(), DEFAULT_ZOOM, level_size);
                camera.focus_on(section.center());
                camera
            }
            _ => {
                let zoom = section.and_then(|section| section.zoom).unwrap_or(DEFAULT_ZOOM);
                let mut camera = Camera::new(player_center, zoom, level_size);
                camera.follow(player_id, player_center);
                camera
            }
        };
    }

    fn tracked_position(&self) -> Option<Vec2> {
        match self.camera.target() {
            Some(CameraTarget::Follow(id)) => {
                self.find_entity(id).map(|entity| entity.body.center())
            }
            Some(CameraTarget::Point(_)) | None => None,
        }
    }

    fn draw_tiles(&self, draw_list: &mut DrawList, visible: Rect) {
        for (column, row, tile) in self.grid.iter() {
            let bounds = self.grid.tile_rect(column, row);
            if !bounds.intersects(&visible) {
                continue;
            }
            match tile.kind {
                TileKind::Solid => draw_list.push_world(bounds, tile.tint, 0.0),
                TileKind::TopSolid => {
                    let strip = Rect::new(
                        bounds.x,
                        bounds.y,
                        bounds.width,
                        bounds.height * TOP_SOLID_DRAW_FRACTION,
                    );
                    draw_list.push_world(strip, tile.tint, 0.0);
                }
                TileKind::Transparent => {}
            }
        }
    }

    /// Scaled overview of the level in the top-right corner: tiles, entities and the
    /// camera's visible area.
    pub fn draw_minimap(&self, draw_list: &mut DrawList) {
        let level = self.grid.pixel_size();
        if level.x <= 0.0 || level.y <= 0.0 {
            return;
        }
        let scale = MINIMAP_EXTENT / level.x.max(level.y);
        let viewport = draw_list.viewport();
        let origin = Vec2::new(
            viewport.size().x - HUD_MARGIN - level.x * scale,
            HUD_MARGIN * 2.0 + HUD_BAR_HEIGHT,
        );
        let to_map = |rect: Rect| {
            Rect::from_position_size(origin + rect.position() * scale, rect.size() * scale)
        };

        let level_rect = Rect::from_position_size(Vec2::ZERO, level);
        draw_list.push_screen(to_map(level_rect), MINIMAP_BACKDROP);
        for (column, row, tile) in self.grid.iter() {
            if tile.kind != TileKind::Transparent {
                draw_list.push_screen(to_map(self.grid.tile_rect(column, row)), tile.tint);
            }
        }
        for entity in &self.entities {
            draw_list.push_screen(to_map(entity.body.bounds()), entity.body.tint);
        }
        let visible = self.camera.view_transform(viewport).visible_world();
        if let Some(visible) = visible.intersection(&level_rect) {
            draw_list.push_screen(to_map(visible), Color::rgba(255, 255, 255, 48));
        }
    }

    fn draw_hud(&self, draw_list: &mut DrawList) {
        let Some(state) = self.player().and_then(Entity::player_state) else {
            return;
        };
        let width = draw_list.viewport().size().x - HUD_MARGIN * 2.0;
        let filled = width * state.life_fraction();
        let bar = Rect::new(HUD_MARGIN, HUD_MARGIN, filled, HUD_BAR_HEIGHT);
        draw_list.push_screen(bar, Color::LIGHT_GREEN);
    }
}

impl Controller for Room {
    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        self.apply_pending();

        if self.player().is_none() {
            self.fail(ctx);
            return;
        }
        if self.state != RoomState::Active {
            return;
        }
        if ctx.input().was_pressed(InputAction::Menu) {
            self.menu_requested = true;
        }

        self.splatter.update();
        let effects = self.update_entities(ctx);
        self.apply_effects(effects, ctx);
        self.update_section();
        let tracked = self.tracked_position();
        self.camera.update(tracked);
    }

    fn draw(&self, draw_list: &mut DrawList) {
        let visible = self.camera.view_transform(draw_list.viewport()).visible_world();
        self.draw_tiles(draw_list, visible);
        self.splatter.draw(draw_list, visible);
        for entity in &self.entities {
            entity.draw(draw_list);
        }
        self.draw_hud(draw_list);
    }

    fn finished(&self) -> bool {
        self.state != RoomState::Active
    }

    fn view_transform(&self, viewport: Viewport) -> ViewTransform {
        self.camera.view_transform(viewport)
    }
}

fn pair_mut<T>(items: &mut [T], first: usize, second: usize) -> (&mut T, &mut T) {
    if first < second {
        let (head, tail) = items.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{DrawSpace, InputSnapshot};
    use crate::world::entity::{DEATH_FRAMES, PLAYER_SIZE};
    use crate::world::ZoomTag;

    const FRAME: Duration = Duration::from_millis(16);

    fn floor_level() -> LevelData {
        LevelData::from_ascii(
            "floor",
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
    }

    fn room_with(level: LevelData) -> Room {
        Room::new(Arc::new(level), RoomSettings::default()).expect("room")
    }

    fn step(room: &mut Room, input: &InputSnapshot) -> Option<FadeRequest> {
        let mut ctx = FrameContext::new(input, FRAME);
        room.update(&mut ctx);
        ctx.take_fade_request()
    }

    fn spawn_player(level: LevelData, position: Vec2) -> LevelData {
        level.with_object(LevelObject::PlayerSpawn { position })
    }

    #[test]
    fn spawned_entities_appear_only_after_apply_pending() {
        let mut room = room_with(spawn_player(floor_level(), Vec2::new(100.0, 40.0)));
        let before = room.entities().len();
        let id = room.spawn(|id| Entity::target(id, Vec2::new(10.0, 10.0), Color::YELLOW));
        assert_eq!(room.entities().len(), before);
        assert!(room.find_entity(id).is_none());

        room.apply_pending();
        assert!(room.find_entity(id).is_some());

        assert!(room.despawn(id));
        assert!(room.find_entity(id).is_some());
        room.apply_pending();
        assert!(room.find_entity(id).is_none());
        assert!(!room.despawn(id));
    }

    #[test]
    fn same_frame_spawn_and_despawn_never_goes_live() {
        let mut room = room_with(spawn_player(floor_level(), Vec2::new(100.0, 40.0)));
        let id = room.spawn(|id| Entity::target(id, Vec2::ZERO, Color::YELLOW));
        assert!(room.despawn(id));
        room.apply_pending();
        assert!(room.find_entity(id).is_none());
    }

    #[test]
    fn player_lands_on_floor_and_stays_there() {
        let mut room = room_with(spawn_player(floor_level(), Vec2::new(100.0, 40.0)));
        let idle = InputSnapshot::empty();
        for _ in 0..90 {
            assert_eq!(step(&mut room, &idle), None);
        }
        let player = room.player().expect("player");
        let bottom = player.body.position().y + PLAYER_SIZE.y;
        assert!((bottom - 288.0).abs() <= 0.002, "bottom was {bottom}");
        assert_eq!(player.body.velocity.y, 0.0);
        assert!(player.player_state().expect("state").on_ground());
        assert_eq!(room.state(), RoomState::Active);
    }

    #[test]
    fn room_without_player_fails_with_black_fade() {
        let mut room = room_with(floor_level());
        let fade = step(&mut room, &InputSnapshot::empty());
        assert_eq!(fade, Some(FadeRequest::Out(Color::BLACK, FadeSpeed::Fast)));
        assert!(room.failed());
        assert!(room.finished());
        assert_eq!(step(&mut room, &InputSnapshot::empty()), None);
    }

    #[test]
    fn falling_off_stage_fails_the_room_on_the_next_frame() {
        let level = LevelData::from_ascii("pit", 32, &["....", "....", "....", "...."])
            .expect("level");
        let mut room = room_with(spawn_player(level, Vec2::new(40.0, 10.0)));
        let idle = InputSnapshot::empty();
        let mut frames = 0;
        while room.state() == RoomState::Active && frames < 200 {
            step(&mut room, &idle);
            frames += 1;
        }
        assert!(room.failed());
        assert!(room.player().is_none());
    }

    #[test]
    fn touching_the_portal_finishes_with_white_fade() {
        let level =
            spawn_player(floor_level(), Vec2::new(100.0, 200.0)).with_object(LevelObject::Portal {
                bounds: Rect::new(96.0, 200.0, 48.0, 64.0),
                tint: Color::WHITE,
            });
        let mut room = room_with(level);
        let fade = step(&mut room, &InputSnapshot::empty());
        assert_eq!(fade, Some(FadeRequest::Out(Color::WHITE, FadeSpeed::Fast)));
        assert_eq!(room.state(), RoomState::Finished);
        assert!(!room.failed());
    }

    fn level_with_target() -> LevelData {
        spawn_player(floor_level(), Vec2::new(100.0, 200.0)).with_object(LevelObject::Target {
            position: Vec2::new(100.0, 216.0),
            tint: Color::YELLOW,
        })
    }

    fn first_non_player(room: &Room) -> EntityId {
        room.entities()
            .iter()
            .find(|entity| !entity.is_player())
            .map(|entity| entity.id)
            .expect("non-player entity")
    }

    #[test]
    fn collecting_a_target_restores_life_and_removes_it() {
        let mut room = room_with(level_with_target());
        let target_id = first_non_player(&room);
        let full = player_state(&room).lifetime();

        step(&mut room, &InputSnapshot::empty());
        assert_eq!(player_state(&room).lifetime(), full);
        step(&mut room, &InputSnapshot::empty());
        assert!(room.find_entity(target_id).is_none());
    }

    fn player_state(room: &Room) -> &PlayerState {
        room.player()
            .and_then(Entity::player_state)
            .expect("player state")
    }

    #[test]
    fn dying_player_cannot_collect_a_target() {
        let mut room = room_with(level_with_target());
        let target_id = first_non_player(&room);
        let reset = InputSnapshot::empty().with_action_pressed(InputAction::Reset);

        step(&mut room, &reset);
        assert!(!player_state(&room).is_alive());
        for _ in 0..5 {
            step(&mut room, &InputSnapshot::empty());
        }
        assert!(room.find_entity(target_id).is_some());
    }

    #[test]
    fn reset_fails_the_room_after_the_death_countdown() {
        let mut room = room_with(spawn_player(floor_level(), Vec2::new(100.0, 200.0)));
        let reset = InputSnapshot::empty().with_action_pressed(InputAction::Reset);
        assert_eq!(step(&mut room, &reset), None);
        assert_eq!(room.state(), RoomState::Active);

        let mut fade = None;
        let mut frames = 0;
        while fade.is_none() && frames < 100 {
            fade = step(&mut room, &InputSnapshot::empty());
            frames += 1;
        }
        assert_eq!(fade, Some(FadeRequest::Out(Color::BLACK, FadeSpeed::Fast)));
        assert_eq!(frames, DEATH_FRAMES);
        assert!(room.failed());
    }

    #[test]
    fn jump_splat_is_drawn_then_fades_away() {
        let mut room = room_with(spawn_player(floor_level(), Vec2::new(100.0, 200.0)));
        let idle = InputSnapshot::empty();
        for _ in 0..60 {
            step(&mut room, &idle);
        }
        assert!(room.splatter().is_empty());

        let jump = InputSnapshot::empty().with_action_down(InputAction::Jump, true);
        step(&mut room, &jump);
        assert_eq!(room.splatter().len(), 1);
        let splat = room.splatter().splats()[0];

        let mut draw_list = DrawList::new(Viewport {
            width: 320,
            height: 240,
        });
        room.draw(&mut draw_list);
        assert!(draw_list
            .commands()
            .iter()
            .any(|command| command.bounds == splat.bounds && command.tint == splat.color));

        for _ in 0..200 {
            step(&mut room, &idle);
        }
        assert!(room.splatter().is_empty());
    }

    #[test]
    fn camera_retargets_when_the_deepest_section_changes() {
        let level = spawn_player(floor_level(), Vec2::new(20.0, 200.0))
            .with_object(LevelObject::Section {
                bounds: Rect::new(0.0, 0.0, 320.0, 320.0),
                zoom: Some(ZoomTag::VeryFar),
            })
            .with_object(LevelObject::Section {
                bounds: Rect::new(160.0, 0.0, 160.0, 320.0),
                zoom: Some(ZoomTag::Close),
            });
        let mut room = room_with(level);
        assert_eq!(room.current_section(), Some(0));
        assert_eq!(room.camera().zoom(), ZoomTag::VeryFar.zoom_level());

        let right = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        let mut frames = 0;
        while room.current_section() != Some(1) && frames < 120 {
            step(&mut room, &right);
            frames += 1;
        }
        assert_eq!(room.current_section(), Some(1));
        assert_eq!(room.camera().zoom_target(), Some(ZoomTag::Close.zoom_level()));
    }

    #[test]
    fn centered_section_focuses_on_its_center() {
        let level =
            spawn_player(floor_level(), Vec2::new(20.0, 200.0)).with_object(LevelObject::Section {
                bounds: Rect::new(0.0, 0.0, 200.0, 320.0),
                zoom: Some(ZoomTag::Centered),
            });
        let room = room_with(level);
        assert_eq!(room.camera().position(), Vec2::new(100.0, 160.0));
        let center = Vec2::new(100.0, 160.0);
        assert_eq!(room.camera().target(), Some(CameraTarget::Point(center)));
    }

    #[test]
    fn barriers_stamp_solid_tiles_and_reject_outside_regions() {
        let level =
            spawn_player(floor_level(), Vec2::new(20.0, 40.0)).with_object(LevelObject::Barrier {
                bounds: Rect::new(64.0, 0.0, 64.0, 32.0),
                tint: Color::RED,
            });
        let room = room_with(level.clone());
        assert_eq!(room.grid().tile(2, 0).kind, TileKind::Solid);
        assert_eq!(room.grid().tile(3, 0).tint, Color::RED);
        assert_eq!(room.grid().tile(4, 0).kind, TileKind::Transparent);
        assert!(room.entities().iter().any(|entity| !entity.body.collidable));

        let outside = level.with_object(LevelObject::Barrier {
            bounds: Rect::new(900.0, 900.0, 32.0, 32.0),
            tint: Color::RED,
        });
        let error = Room::new(Arc::new(outside), RoomSettings::default()).expect_err("outside");
        assert!(matches!(error, LevelLoadError::BarrierOutsideLevel { .. }));
    }

    #[test]
    fn barriers_on_the_level_edge_stamp_every_covered_cell() {
        let level = spawn_player(floor_level(), Vec2::new(20.0, 200.0))
            .with_object(LevelObject::Barrier {
                bounds: Rect::new(288.0, 0.0, 32.0, 320.0),
                tint: Color::BLUE,
            })
            .with_object(LevelObject::Barrier {
                bounds: Rect::new(256.0, 0.0, 32.0, 320.0),
                tint: Color::RED,
            });
        let room = room_with(level);
        for row in 0..10 {
            assert_eq!(room.grid().tile(9, row).kind, TileKind::Solid);
            assert_eq!(room.grid().tile(9, row).tint, Color::BLUE);
            assert_eq!(room.grid().tile(8, row).tint, Color::RED);
        }
    }

    #[test]
    fn minimap_fits_the_panel_in_the_top_right_corner() {
        let room = room_with(spawn_player(floor_level(), Vec2::new(100.0, 200.0)));
        let viewport = Viewport {
            width: 640,
            height: 480,
        };
        let mut draw_list = DrawList::new(viewport);
        room.draw_minimap(&mut draw_list);

        let commands = draw_list.commands();
        // Backdrop, ten floor tiles, the player and the camera frame.
        assert_eq!(commands.len(), 13);
        let backdrop = commands[0].bounds;
        assert_eq!(backdrop.size(), Vec2::new(MINIMAP_EXTENT, MINIMAP_EXTENT));
        assert_eq!(backdrop.right(), 640.0 - HUD_MARGIN);
        for command in commands {
            assert_eq!(command.space, DrawSpace::Screen);
            assert!(backdrop.contains_rect(&command.bounds));
        }
    }

    #[test]
    fn menu_press_is_latched_until_resume() {
        let mut room = room_with(spawn_player(floor_level(), Vec2::new(100.0, 40.0)));
        step(&mut room, &InputSnapshot::empty().with_action_pressed(InputAction::Menu));
        assert!(room.menu_requested());
        room.resume();
        assert!(!room.menu_requested());
    }
}
