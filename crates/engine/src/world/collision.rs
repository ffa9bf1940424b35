//! Axis-separated movement against the tile grid.
//!
//! A move integrates gravity and acceleration first, then resolves X against bounds scanned
//! from the pre-move box, then resolves Y against bounds rescanned after the X move.

use crate::geometry::{clamp_bound, Color, Rect, Vec2};

use super::body::Body;
use super::tile_grid::{Tile, TileGrid, TileKind};
use super::EPSILON;

/// Left/top bound used when nothing blocks toward the level origin.
pub const MIN_BOUND_FALLBACK: f32 = 15.0;
/// Margin kept from the far stage edge when nothing blocks toward it.
pub const MAX_BOUND_MARGIN: f32 = 10.0;

/// Allowed range for the collision box's top-left corner this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementBounds {
    pub min: Vec2,
    pub max: Vec2,
    /// A blocking tile exists below the box, so `max.y` is a real floor.
    pub floor_found: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub hit_wall: bool,
    /// Airborne to grounded transition this frame.
    pub hit_ground: bool,
    /// Resting on a floor after this move, landing or not.
    pub grounded: bool,
    pub hit_ceiling: bool,
    pub fell_off_stage: bool,
}

pub fn movement_bounds(
    grid: &TileGrid,
    bounding_box: Rect,
    tint: Color,
    collidable: bool,
) -> MovementBounds {
    let position = bounding_box.position();
    let size = bounding_box.size();
    let stage = grid.stage_bounds();
    let fallback = MovementBounds {
        min: Vec2::splat(MIN_BOUND_FALLBACK),
        max: Vec2::new(
            stage.x - size.x - MAX_BOUND_MARGIN,
            stage.y - size.y - MAX_BOUND_MARGIN,
        ),
        floor_found: false,
    };
    if !collidable || grid.columns() == 0 || grid.rows() == 0 {
        return fallback;
    }

    let tile = grid.tile_size();
    let scan = ScanWindow::new(grid, position, size);
    let mut bounds = fallback;

    if let Some(column) = scan.first_column_left(grid, |t| blocks_sideways(t, tint)) {
        bounds.min.x = (column + 1) as f32 * tile.x + EPSILON;
    }
    if let Some(row) = scan.first_row_up(grid, |t| blocks_sideways(t, tint)) {
        bounds.min.y = (row + 1) as f32 * tile.y + EPSILON;
    }
    if let Some(column) = scan.first_column_right(grid, |t| blocks_sideways(t, tint)) {
        bounds.max.x = column as f32 * tile.x - size.x - EPSILON;
    }
    if let Some(row) = scan.first_row_down(grid, |t, row| blocks_from_above(t, row, &scan, tint)) {
        bounds.max.y = row as f32 * tile.y - size.y - EPSILON;
        bounds.floor_found = true;
    }
    bounds
}

/// Applies gravity and acceleration to `body`, then resolves its displacement against `grid`.
pub fn move_body(body: &mut Body, grid: &TileGrid, direction: Vec2, gravity: f32) -> MoveOutcome {
    let direction = direction.normalized();
    if body.applies_gravity {
        body.velocity.y += gravity;
    }
    accelerate(body, direction);

    let mut outcome = MoveOutcome::default();
    let bounds = movement_bounds(grid, body.bounding_box(), body.tint, body.collidable);
    resolve_x(body, &bounds, &mut outcome);

    let bounds = movement_bounds(grid, body.bounding_box(), body.tint, body.collidable);
    resolve_y(body, grid, &bounds, &mut outcome);
    outcome
}

fn accelerate(body: &mut Body, direction: Vec2) {
    let change = body.acceleration.component_mul(direction);
    if change.x.abs() < f32::EPSILON {
        body.velocity = body.velocity.push_back(body.deceleration);
    }
    body.velocity = (body.velocity + change).clamp_components(-body.max_speed, body.max_speed);
}

fn resolve_x(body: &mut Body, bounds: &MovementBounds, outcome: &mut MoveOutcome) {
    let bounding_box = body.bounding_box();
    let candidate = bounding_box.x + body.velocity.x;
    if candidate < bounds.min.x || candidate > bounds.max.x {
        outcome.hit_wall = true;
    }
    let x = clamp_bound(candidate, bounds.min.x, bounds.max.x);
    body.place_box_at(Vec2::new(x, bounding_box.y));
}

fn resolve_y(body: &mut Body, grid: &TileGrid, bounds: &MovementBounds, outcome: &mut MoveOutcome) {
    let bounding_box = body.bounding_box();
    let candidate = bounding_box.y + body.velocity.y;
    let mut landed = false;

    if candidate < bounds.min.y {
        outcome.hit_ceiling = true;
    } else if candidate > bounds.max.y {
        let below_stage = bounds.max.y + bounding_box.height * 2.0 >= grid.pixel_size().y;
        if !bounds.floor_found && below_stage {
            outcome.fell_off_stage = true;
            body.set_grounded(false);
            return;
        }
        landed = true;
    }

    let y = clamp_bound(candidate, bounds.min.y, bounds.max.y);
    body.place_box_at(Vec2::new(bounding_box.x, y));

    if landed {
        outcome.hit_ground = !body.is_grounded();
        outcome.grounded = true;
        body.velocity.y = 0.0;
    }
    body.set_grounded(landed);
}

fn blocks_sideways(tile: Tile, tint: Color) -> bool {
    tile.kind == TileKind::Solid && !tile.passable_for(tint)
}

fn blocks_from_above(tile: Tile, row: usize, scan: &ScanWindow, tint: Color) -> bool {
    let one_way_below = tile.kind == TileKind::TopSolid && row > scan.last_row;
    (tile.kind == TileKind::Solid || one_way_below) && !tile.passable_for(tint)
}

/// Tile rows and columns the box occupies, clamped to the grid.
#[derive(Debug, Clone, Copy)]
struct ScanWindow {
    first_column: usize,
    last_column: usize,
    first_row: usize,
    last_row: usize,
}

impl ScanWindow {
    fn new(grid: &TileGrid, position: Vec2, size: Vec2) -> Self {
        let (column, row) = grid.tile_index_at(position);
        let (span_columns, span_rows) = grid.tile_span(position, size);
        Self {
            first_column: column,
            last_column: (column + span_columns).min(grid.columns() - 1),
            first_row: row,
            last_row: (row + span_rows).min(grid.rows() - 1),
        }
    }

    fn column_hits(&self, grid: &TileGrid, column: usize, blocks: &impl Fn(Tile) -> bool) -> bool {
        (self.first_row..=self.last_row).any(|row| blocks(grid.tile(column, row)))
    }

    fn first_column_left(&self, grid: &TileGrid, blocks: impl Fn(Tile) -> bool) -> Option<usize> {
        (0..=self.first_column)
            .rev()
            .find(|column| self.column_hits(grid, *column, &blocks))
    }

    fn first_column_right(&self, grid: &TileGrid, blocks: impl Fn(Tile) -> bool) -> Option<usize> {
        (self.first_column..grid.columns()).find(|column| self.column_hits(grid, *column, &blocks))
    }

    fn first_row_up(&self, grid: &TileGrid, blocks: impl Fn(Tile) -> bool) -> Option<usize> {
        (0..=self.first_row).rev().find(|row| {
            (self.first_column..=self.last_column).any(|column| blocks(grid.tile(column, *row)))
        })
    }

    fn first_row_down(
        &self,
        grid: &TileGrid,
        blocks: impl Fn(Tile, usize) -> bool,
    ) -> Option<usize> {
        (self.first_row..grid.rows()).find(|row| {
            (self.first_column..=self.last_column)
                .any(|column| blocks(grid.tile(column, *row), *row))
        })
    }
}
