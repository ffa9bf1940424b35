mod body;
mod camera;
mod collision;
mod entity;
mod room;
mod section;
mod splatter;
mod tile_grid;

/// Gap kept between a resolved box and the tile edge that stopped it.
pub const EPSILON: f32 = 0.001;

pub use body::{Body, BOX_INSET_X, BOX_INSET_Y, CONTACT_FORGIVENESS};
pub use camera::{Camera, CameraTarget, MIN_ZOOM, PAN_SPEED, ZOOM_SPEED};
pub use collision::{move_body, movement_bounds, MoveOutcome, MovementBounds};
pub use entity::{
    Entity, EntityId, EntityIdAllocator, EntityKind, Facing, PlayerState, DEATH_FRAMES,
    IMPACT_SPLAT_SPEED, JUMP_SPEED, MAX_SPEED_X, MAX_SPEED_Y, PLAYER_SIZE, STEP_SPLAT_INTERVAL,
    TARGET_PICKUP_RADIUS,
};
pub use room::{Room, RoomSettings, RoomState, DEFAULT_GRAVITY, DEFAULT_PLAYER_LIFETIME};
pub use section::{Section, SectionIndex, ZoomTag, DEFAULT_ZOOM};
pub use splatter::{Splat, Splatter, SPLAT_ALPHA, SPLAT_FADE_STEP};
pub use tile_grid::{Tile, TileGrid, TileGridError, TileKind};
