use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::debug;

use crate::geometry::{Color, Rect, Vec2};
use crate::world::{Tile, TileKind};

use super::level::{
    parse_color, parse_tile_kind, parse_zoom_tag, LevelData, LevelLoadError, LevelObject,
    SourceLocation,
};

const TILE_LAYER_NAME: &str = "Tiles";
/// Tiled stores flip/rotation flags in the top bits of each gid.
const GID_FLAG_MASK: u32 = 0x1FFF_FFFF;

pub fn load_tmx_file(path: &Path) -> Result<LevelData, LevelLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let level = parse_tmx(&name, &raw).map_err(|error| error.in_file(path))?;
    debug!(
        level = %level.name,
        path = %path.display(),
        objects = level.objects.len(),
        "level_file_parsed"
    );
    Ok(level)
}

/// Parses the orthogonal-map subset of Tiled's XML format.
pub fn parse_tmx(name: &str, raw: &str) -> Result<LevelData, LevelLoadError> {
    let doc = Document::parse(raw).map_err(|error| LevelLoadError::Malformed {
        message: error.to_string(),
        location: SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        },
    })?;

    let map = doc.root_element();
    if map.tag_name().name() != "map" {
        return Err(LevelLoadError::MissingElement("map".to_string()));
    }
    let columns: u32 = required_attribute(map, "width")?;
    let rows: u32 = required_attribute(map, "height")?;
    let tile_width: u32 = required_attribute(map, "tilewidth")?;
    let tile_height: u32 = required_attribute(map, "tileheight")?;
    let pixel_width = columns
        .checked_mul(tile_width)
        .ok_or_else(|| invalid_attribute(map, "width", &columns.to_string()))?;
    let pixel_height = rows
        .checked_mul(tile_height)
        .ok_or_else(|| invalid_attribute(map, "height", &rows.to_string()))?;

    let tilesets = parse_tilesets(map)?;
    let layer = map
        .children()
        .find(|node| {
            node.has_tag_name("layer") && node.attribute("name") == Some(TILE_LAYER_NAME)
        })
        .ok_or_else(|| {
            LevelLoadError::MissingElement(format!("layer name=\"{TILE_LAYER_NAME}\""))
        })?;
    let tiles = parse_layer_data(layer)?
        .into_iter()
        .map(|gid| tilesets.resolve(gid))
        .collect::<Vec<_>>();

    let mut objects = Vec::new();
    for object in map
        .children()
        .filter(|node| node.has_tag_name("objectgroup"))
        .flat_map(|group| group.children().filter(|node| node.has_tag_name("object")))
    {
        if let Some(parsed) = parse_object(object)? {
            objects.push(parsed);
        }
    }

    let level = LevelData {
        name: name.to_string(),
        pixel_width,
        pixel_height,
        tile_width,
        tile_height,
        tiles,
        objects,
    };
    level.grid()?;
    if level.player_spawn().is_none() {
        return Err(LevelLoadError::MissingPlayer(level.name));
    }
    Ok(level)
}

#[derive(Debug, Default)]
struct Tilesets {
    /// `(firstgid, local id -> tile)`, sorted by firstgid.
    sets: Vec<(u32, HashMap<u32, Tile>)>,
}

impl Tilesets {
    fn resolve(&self, gid: u32) -> Tile {
        let gid = gid & GID_FLAG_MASK;
        if gid == 0 {
            return Tile::EMPTY;
        }
        self.sets
            .iter()
            .rev()
            .find(|(first_gid, _)| *first_gid <= gid)
            .and_then(|(first_gid, tiles)| tiles.get(&(gid - first_gid)).copied())
            .unwrap_or_else(Tile::solid)
    }
}

fn parse_tilesets(map: Node<'_, '_>) -> Result<Tilesets, LevelLoadError> {
    let mut tilesets = Tilesets::default();
    for tileset in map.children().filter(|node| node.has_tag_name("tileset")) {
        let first_gid: u32 = required_attribute(tileset, "firstgid")?;
        let mut tiles = HashMap::new();
        for tile in tileset.children().filter(|node| node.has_tag_name("tile")) {
            let id: u32 = required_attribute(tile, "id")?;
            let kind = property(tile, "Type")
                .map(parse_tile_kind)
                .transpose()?
                .unwrap_or(TileKind::Solid);
            let tint = property(tile, "Color")
                .map(parse_color)
                .transpose()?
                .unwrap_or(Color::WHITE);
            tiles.insert(id, Tile::new(kind, tint));
        }
        tilesets.sets.push((first_gid, tiles));
    }
    tilesets.sets.sort_by_key(|(first_gid, _)| *first_gid);
    Ok(tilesets)
}

fn parse_layer_data(layer: Node<'_, '_>) -> Result<Vec<u32>, LevelLoadError> {
    let data = layer
        .children()
        .find(|node| node.has_tag_name("data"))
        .ok_or_else(|| LevelLoadError::MissingElement("data".to_string()))?;
    let encoding = data.attribute("encoding").unwrap_or_default();
    if encoding != "csv" {
        return Err(invalid_attribute(data, "encoding", encoding));
    }
    data.text()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(|cell| cell.parse::<u32>().map_err(|_| invalid_attribute(data, "cell", cell)))
        .collect()
}

fn parse_object(object: Node<'_, '_>) -> Result<Option<LevelObject>, LevelLoadError> {
    let position = Vec2::new(
        required_attribute(object, "x")?,
        required_attribute(object, "y")?,
    );
    if object.attribute("name") == Some("Player") {
        return Ok(Some(LevelObject::PlayerSpawn { position }));
    }

    // Tiled 1.9 renamed `type` to `class`.
    let Some(kind) = object.attribute("type").or_else(|| object.attribute("class")) else {
        return Ok(None);
    };
    let size = Vec2::new(
        optional_attribute(object, "width")?.unwrap_or(0.0),
        optional_attribute(object, "height")?.unwrap_or(0.0),
    );
    let bounds = Rect::from_position_size(position, size);
    let tint = property(object, "Color").map(parse_color).transpose()?;

    let parsed = match kind {
        "Section" => LevelObject::Section {
            bounds,
            zoom: property(object, "Zoom").map(parse_zoom_tag).transpose()?,
        },
        "Barrier" => LevelObject::Barrier {
            bounds,
            tint: tint.ok_or_else(|| LevelLoadError::MissingAttribute {
                element: "object type=\"Barrier\"".to_string(),
                attribute: "property 'Color'".to_string(),
            })?,
        },
        "Portal" | "Goal" => LevelObject::Portal {
            bounds,
            tint: tint.unwrap_or(Color::WHITE),
        },
        "Target" => LevelObject::Target {
            position,
            tint: tint.unwrap_or(Color::YELLOW),
        },
        other => {
            debug!(object_type = other, "level_object_ignored");
            return Ok(None);
        }
    };
    Ok(Some(parsed))
}

fn property<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .filter(|child| child.has_tag_name("properties"))
        .flat_map(|properties| properties.children())
        .find(|child| child.has_tag_name("property") && child.attribute("name") == Some(name))
        .and_then(|property| property.attribute("value").or_else(|| property.text()))
}

fn required_attribute<T: FromStr>(node: Node<'_, '_>, name: &str) -> Result<T, LevelLoadError> {
    optional_attribute(node, name)?.ok_or_else(|| LevelLoadError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute: format!("attribute '{name}'"),
    })
}

fn optional_attribute<T: FromStr>(
    node: Node<'_, '_>,
    name: &str,
) -> Result<Option<T>, LevelLoadError> {
    node.attribute(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| invalid_attribute(node, name, value))
        })
        .transpose()
}

fn invalid_attribute(node: Node<'_, '_>, name: &str, value: &str) -> LevelLoadError {
    LevelLoadError::InvalidAttribute {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
        value: value.to_string(),
    }
}
