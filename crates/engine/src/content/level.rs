use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::{Color, Rect, Vec2};
use crate::world::{Tile, TileGrid, TileGridError, TileKind, ZoomTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Error)]
pub enum LevelLoadError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "malformed level XML (line={}, column={}): {message}",
        .location.line,
        .location.column
    )]
    Malformed {
        message: String,
        location: SourceLocation,
    },
    #[error("missing <{0}> element")]
    MissingElement(String),
    #[error("<{element}> is missing required {attribute}")]
    MissingAttribute { element: String, attribute: String },
    #[error("<{element}> has invalid {attribute} '{value}'")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },
    #[error("unknown tile type '{0}'")]
    UnknownTileType(String),
    #[error("unknown zoom tag '{0}'")]
    UnknownZoomTag(String),
    #[error("unknown color '{0}'")]
    UnknownColor(String),
    #[error("level '{0}' has no player spawn")]
    MissingPlayer(String),
    #[error("barrier at ({x}, {y}) lies outside the level")]
    BarrierOutsideLevel { x: f32, y: f32 },
    #[error("invalid tile grid: {0}")]
    Grid(#[from] TileGridError),
    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<LevelLoadError>,
    },
}

impl LevelLoadError {
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            LevelLoadError::Read { .. } | LevelLoadError::InFile { .. } => self,
            other => LevelLoadError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Object markers placed in a level. Positions are in level pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelObject {
    PlayerSpawn { position: Vec2 },
    Section { bounds: Rect, zoom: Option<ZoomTag> },
    /// Region stamped with solid tiles of `tint` at load time.
    Barrier { bounds: Rect, tint: Color },
    Portal { bounds: Rect, tint: Color },
    Target { position: Vec2, tint: Color },
}

/// Immutable level description. Rooms are built from it and rebuilt from it after a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub name: String,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tiles: Vec<Tile>,
    pub objects: Vec<LevelObject>,
}

impl LevelData {
    pub fn grid(&self) -> Result<TileGrid, TileGridError> {
        TileGrid::new(
            self.pixel_width,
            self.pixel_height,
            self.tile_width,
            self.tile_height,
            self.tiles.clone(),
        )
    }

    pub fn player_spawn(&self) -> Option<Vec2> {
        self.objects.iter().find_map(|object| match object {
            LevelObject::PlayerSpawn { position } => Some(*position),
            _ => None,
        })
    }

    /// Builds a level from text rows: `#` solid, `=` one-way platform, `R`/`B` red/blue solid,
    /// anything else empty.
    pub fn from_ascii(name: &str, tile_size: u32, rows: &[&str]) -> Result<Self, LevelLoadError> {
        let columns = rows.first().map_or(0, |row| row.chars().count());
        let mut tiles = Vec::with_capacity(columns * rows.len());
        for row in rows {
            for glyph in row.chars() {
                tiles.push(match glyph {
                    '#' => Tile::solid(),
                    '=' => Tile::new(TileKind::TopSolid, Color::WHITE),
                    'R' => Tile::new(TileKind::Solid, Color::RED),
                    'B' => Tile::new(TileKind::Solid, Color::BLUE),
                    _ => Tile::EMPTY,
                });
            }
        }
        let level = Self {
            name: name.to_string(),
            pixel_width: columns as u32 * tile_size,
            pixel_height: rows.len() as u32 * tile_size,
            tile_width: tile_size,
            tile_height: tile_size,
            tiles,
            objects: Vec::new(),
        };
        level.grid()?;
        Ok(level)
    }

    pub fn with_object(mut self, object: LevelObject) -> Self {
        self.objects.push(object);
        self
    }
}

pub fn parse_tile_kind(value: &str) -> Result<TileKind, LevelLoadError> {
    match value {
        "Solid" => Ok(TileKind::Solid),
        "TopSolid" => Ok(TileKind::TopSolid),
        "Transparent" => Ok(TileKind::Transparent),
        other => Err(LevelLoadError::UnknownTileType(other.to_string())),
    }
}

pub fn parse_zoom_tag(value: &str) -> Result<ZoomTag, LevelLoadError> {
    ZoomTag::from_tag(value).ok_or_else(|| LevelLoadError::UnknownZoomTag(value.to_string()))
}

/// Accepts a color name or `#RRGGBB`.
pub fn parse_color(value: &str) -> Result<Color, LevelLoadError> {
    let named = match value {
        "Red" => Some(Color::RED),
        "Green" => Some(Color::GREEN),
        "Blue" => Some(Color::BLUE),
        "Yellow" => Some(Color::YELLOW),
        "Orange" => Some(Color::ORANGE),
        "Purple" => Some(Color::PURPLE),
        "White" => Some(Color::WHITE),
        "Black" => Some(Color::BLACK),
        "LightGreen" => Some(Color::LIGHT_GREEN),
        _ => None,
    };
    if let Some(color) = named {
        return Ok(color);
    }
    parse_hex_color(value).ok_or_else(|| LevelLoadError::UnknownColor(value.to_string()))
}

fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_parse_by_name_and_hex() {
        assert_eq!(parse_color("LightGreen").expect("named"), Color::LIGHT_GREEN);
        assert_eq!(parse_color("#FFA500").expect("hex"), Color::ORANGE);
        assert!(matches!(
            parse_color("#12345"),
            Err(LevelLoadError::UnknownColor(value)) if value == "#12345"
        ));
        assert!(matches!(parse_color("Teal"), Err(LevelLoadError::UnknownColor(_))));
    }

    #[test]
    fn unknown_tile_types_and_zoom_tags_are_rejected() {
        assert_eq!(parse_tile_kind("TopSolid").expect("kind"), TileKind::TopSolid);
        assert!(matches!(
            parse_tile_kind("Lava"),
            Err(LevelLoadError::UnknownTileType(_))
        ));
        assert_eq!(parse_zoom_tag("Close").expect("zoom"), ZoomTag::Close);
        assert!(matches!(
            parse_zoom_tag("Nearby"),
            Err(LevelLoadError::UnknownZoomTag(_))
        ));
    }

    #[test]
    fn ascii_levels_build_a_matching_grid() {
        let level = LevelData::from_ascii("ascii", 16, &["....", "..=.", "#RB#"])
            .expect("level")
            .with_object(LevelObject::PlayerSpawn {
                position: Vec2::new(4.0, 4.0),
            });
        let grid = level.grid().expect("grid");
        assert_eq!((grid.columns(), grid.rows()), (4, 3));
        assert_eq!(grid.tile(2, 1).kind, TileKind::TopSolid);
        assert_eq!(grid.tile(1, 2).tint, Color::RED);
        assert_eq!(level.player_spawn(), Some(Vec2::new(4.0, 4.0)));
    }

    #[test]
    fn ragged_ascii_rows_are_a_grid_error() {
        let error = LevelData::from_ascii("ragged", 16, &["....", "..."]).expect_err("ragged");
        assert!(matches!(
            error,
            LevelLoadError::Grid(TileGridError::TileCountMismatch { expected: 8, actual: 7 })
        ));
    }

    #[test]
    fn file_context_wraps_once() {
        let error = LevelLoadError::MissingPlayer("one".to_string())
            .in_file("levels/one.tmx")
            .in_file("other.tmx");
        let message = error.to_string();
        assert!(message.starts_with("levels/one.tmx: "));
        assert!(message.contains("no player spawn"));
    }
}
