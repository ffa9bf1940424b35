use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine::{load_tmx_file, LevelData, LevelLoadError, LevelSource};
use tracing::info;

/// Level files played in configured order, parsed lazily as each room starts.
#[derive(Debug, Clone)]
pub(crate) struct LevelCatalog {
    pending: VecDeque<PathBuf>,
}

impl LevelCatalog {
    pub(crate) fn new(levels_dir: &Path, file_names: &[String]) -> Self {
        Self {
            pending: file_names
                .iter()
                .map(|name| levels_dir.join(name))
                .collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Paths that do not point at a readable file.
    pub(crate) fn missing_files(&self) -> Vec<PathBuf> {
        self.pending
            .iter()
            .filter(|path| !path.is_file())
            .cloned()
            .collect()
    }
}

impl LevelSource for LevelCatalog {
    fn has_more(&self) -> bool {
        !self.pending.is_empty()
    }

    fn next_level(&mut self) -> Result<Arc<LevelData>, LevelLoadError> {
        let Some(path) = self.pending.pop_front() else {
            return Err(LevelLoadError::MissingElement("level".to_string()));
        };
        let level = load_tmx_file(&path)?;
        info!(
            level = %level.name,
            remaining = self.pending.len(),
            "level_loaded"
        );
        Ok(Arc::new(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TINY_LEVEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="4" height="3" tilewidth="32" tileheight="32">
 <tileset firstgid="1" name="tiles" tilewidth="32" tileheight="32" tilecount="1" columns="1"/>
 <layer id="1" name="Tiles" width="4" height="3">
  <data encoding="csv">
0,0,0,0,
0,0,0,0,
1,1,1,1
</data>
 </layer>
 <objectgroup id="2" name="Objects">
  <object id="1" name="Player" x="16" y="8"/>
 </objectgroup>
</map>
"#;

    #[test]
    fn levels_are_loaded_in_configured_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("first.tmx"), TINY_LEVEL).expect("write first");
        fs::write(dir.path().join("second.tmx"), TINY_LEVEL).expect("write second");
        let mut catalog = LevelCatalog::new(
            dir.path(),
            &["first.tmx".to_string(), "second.tmx".to_string()],
        );

        assert_eq!(catalog.len(), 2);
        assert!(catalog.missing_files().is_empty());
        assert_eq!(catalog.next_level().expect("first").name, "first");
        assert!(catalog.has_more());
        assert_eq!(catalog.next_level().expect("second").name, "second");
        assert!(!catalog.has_more());
    }

    #[test]
    fn missing_files_are_reported_before_play() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = LevelCatalog::new(dir.path(), &["absent.tmx".to_string()]);
        assert_eq!(catalog.missing_files(), vec![dir.path().join("absent.tmx")]);
    }

    #[test]
    fn unreadable_level_surfaces_load_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut catalog = LevelCatalog::new(dir.path(), &["absent.tmx".to_string()]);
        assert!(catalog.next_level().is_err());
        assert!(!catalog.has_more());
    }
}
