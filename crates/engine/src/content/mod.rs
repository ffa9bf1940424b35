mod level;
mod tmx;

pub use level::{
    parse_color, parse_tile_kind, parse_zoom_tag, LevelData, LevelLoadError, LevelObject,
    SourceLocation,
};
pub use tmx::{load_tmx_file, parse_tmx};
