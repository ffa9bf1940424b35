use thiserror::Error;

use crate::geometry::{Color, Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Solid,
    /// One-way platform: only blocks bodies coming down onto it.
    TopSolid,
    Transparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileKind,
    pub tint: Color,
}

impl Tile {
    pub const EMPTY: Tile = Tile {
        kind: TileKind::Transparent,
        tint: Color::WHITE,
    };

    pub const fn new(kind: TileKind, tint: Color) -> Self {
        Self { kind, tint }
    }

    pub const fn solid() -> Self {
        Self::new(TileKind::Solid, Color::WHITE)
    }

    /// A tinted tile never stops a body carrying the same tint.
    pub fn passable_for(&self, tint: Color) -> bool {
        !self.tint.is_neutral() && self.tint == tint
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileGridError {
    #[error("tile size must be non-zero, got {tile_width}x{tile_height}")]
    ZeroTileSize { tile_width: u32, tile_height: u32 },
    #[error("{pixel_width}x{pixel_height}px level is not whole {tile_width}x{tile_height}px tiles")]
    FractionalTiles {
        pixel_width: u32,
        pixel_height: u32,
        tile_width: u32,
        tile_height: u32,
    },
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("{columns}x{rows} tiles do not fit in memory")]
    TooManyTiles { columns: usize, rows: usize },
}

/// Row-major grid of tiles covering the level, origin at the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    columns: usize,
    rows: usize,
    tile_width: f32,
    tile_height: f32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new(
        pixel_width: u32,
        pixel_height: u32,
        tile_width: u32,
        tile_height: u32,
        tiles: Vec<Tile>,
    ) -> Result<Self, TileGridError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(TileGridError::ZeroTileSize {
                tile_width,
                tile_height,
            });
        }
        if pixel_width % tile_width != 0 || pixel_height % tile_height != 0 {
            return Err(TileGridError::FractionalTiles {
                pixel_width,
                pixel_height,
                tile_width,
                tile_height,
            });
        }
        let columns = (pixel_width / tile_width) as usize;
        let rows = (pixel_height / tile_height) as usize;
        let expected = columns
            .checked_mul(rows)
            .ok_or(TileGridError::TooManyTiles { columns, rows })?;
        let actual = tiles.len();
        if expected != actual {
            return Err(TileGridError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            columns,
            rows,
            tile_width: tile_width as f32,
            tile_height: tile_height as f32,
            tiles,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.columns as f32 * self.tile_width,
            self.rows as f32 * self.tile_height,
        )
    }

    /// Largest position still considered on stage, kept just inside the far edges.
    pub fn stage_bounds(&self) -> Vec2 {
        let size = self.pixel_size();
        Vec2::new(size.x - super::EPSILON * 2.0, size.y - super::EPSILON)
    }

    pub fn get(&self, column: usize, row: usize) -> Option<Tile> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.tiles.get(row * self.columns + column).copied()
    }

    /// Tile at `(column, row)`, clamped onto the grid.
    pub fn tile(&self, column: usize, row: usize) -> Tile {
        let column = column.min(self.columns.saturating_sub(1));
        let row = row.min(self.rows.saturating_sub(1));
        self.get(column, row).unwrap_or(Tile::EMPTY)
    }

    /// `(column, row)` of the tile under `pixel`.
    /// Positions off the grid snap to the nearest edge cell.
    pub fn tile_index_at(&self, pixel: Vec2) -> (usize, usize) {
        (
            clamped_index(pixel.x, self.tile_width, self.columns),
            clamped_index(pixel.y, self.tile_height, self.rows),
        )
    }

    pub fn tile_at(&self, pixel: Vec2) -> Tile {
        let (column, row) = self.tile_index_at(pixel);
        self.tile(column, row)
    }

    pub fn kind_at(&self, pixel: Vec2) -> TileKind {
        self.tile_at(pixel).kind
    }

    pub fn tile_rect(&self, column: usize, row: usize) -> Rect {
        Rect::new(
            column as f32 * self.tile_width,
            row as f32 * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    /// Extra columns and rows a box covers beyond the tile holding its top-left corner.
    pub fn tile_span(&self, position: Vec2, size: Vec2) -> (usize, usize) {
        let stage = self.stage_bounds();
        let start = position.clamp_components(Vec2::ZERO, stage);
        let end = (position + size).clamp_components(Vec2::ZERO, stage);
        let (start_column, start_row) = self.tile_index_at(start);
        let (end_column, end_row) = self.tile_index_at(end);
        (
            end_column.saturating_sub(start_column),
            end_row.saturating_sub(start_row),
        )
    }

    /// Overwrites the tiles under `region` with solid tiles of `tint`.
    /// Returns the number of cells written.
    pub(crate) fn stamp_solid(&mut self, region: Rect, tint: Color) -> usize {
        let (start_column, end_column) =
            covered_range(region.x, region.right(), self.tile_width, self.columns);
        let (start_row, end_row) =
            covered_range(region.y, region.bottom(), self.tile_height, self.rows);
        let mut written = 0;
        for row in start_row..end_row {
            for column in start_column..end_column {
                self.tiles[row * self.columns + column] = Tile::new(TileKind::Solid, tint);
                written += 1;
            }
        }
        written
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            (index % self.columns, index / self.columns, *tile)
        })
    }
}

/// Half-open index range of the cells overlapped by `[start, end)`, clipped to `count`.
fn covered_range(start: f32, end: f32, tile_extent: f32, count: usize) -> (usize, usize) {
    if !start.is_finite() || !end.is_finite() || end <= start {
        return (0, 0);
    }
    let first = (start / tile_extent).floor().max(0.0) as usize;
    let last = ((end / tile_extent).ceil().max(0.0) as usize).min(count);
    (first.min(last), last)
}

fn clamped_index(pixel: f32, tile_extent: f32, count: usize) -> usize {
    if count == 0 || !pixel.is_finite() || pixel <= 0.0 {
        return 0;
    }
    ((pixel / tile_extent) as usize).min(count - 1)
}
