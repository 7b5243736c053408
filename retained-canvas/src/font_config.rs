//! Fonts available to the cosmic-text shaper.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Where font faces are loaded from.
#[derive(Clone, Debug)]
pub enum FontSource {
    /// Installed system fonts (fontconfig on Linux).
    System,
    /// Every font file below a directory.
    Dir(PathBuf),
    /// One TTF/OTF/TTC file held in memory, shared between clones.
    Data(Arc<Vec<u8>>),
}

/// CSS generic font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
}

impl GenericFamily {
    pub const ALL: [GenericFamily; 5] = [
        GenericFamily::Serif,
        GenericFamily::SansSerif,
        GenericFamily::Monospace,
        GenericFamily::Cursive,
        GenericFamily::Fantasy,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Candidate families for each generic family, in priority order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenericFamilyMap {
    candidates: [Vec<String>; 5],
}

impl GenericFamilyMap {
    /// Common desktop faces with Liberation and DejaVu as fallbacks.
    pub fn defaults() -> Self {
        let mut map = Self::default();
        map.set(
            GenericFamily::Serif,
            ["Times New Roman", "Times", "Liberation Serif", "DejaVu Serif"],
        );
        map.set(
            GenericFamily::SansSerif,
            ["Arial", "Helvetica", "Liberation Sans", "DejaVu Sans"],
        );
        map.set(
            GenericFamily::Monospace,
            ["Courier New", "Courier", "Liberation Mono", "DejaVu Sans Mono"],
        );
        map.set(GenericFamily::Cursive, ["Comic Sans MS", "Apple Chancery"]);
        map.set(GenericFamily::Fantasy, ["Impact", "Papyrus"]);
        map
    }

    pub fn get(&self, family: GenericFamily) -> &[String] {
        &self.candidates[family.index()]
    }

    /// Replace the candidates for `family`.
    pub fn set<I, S>(&mut self, family: GenericFamily, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates[family.index()] = names.into_iter().map(Into::into).collect();
    }
}

/// Font sources plus generic-family resolution for text shaping.
///
/// Nothing is read from disk until [`FontConfig::build_database`] runs.
#[derive(Clone, Debug)]
pub struct FontConfig {
    /// Loaded in order; later faces do not replace earlier ones.
    pub sources: Vec<FontSource>,
    pub generic_families: GenericFamilyMap,
    /// Grid-fit glyph outlines.
    pub hinting: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            sources: vec![FontSource::System],
            generic_families: GenericFamilyMap::defaults(),
            hinting: false,
        }
    }
}

impl FontConfig {
    /// Only the given in-memory fonts, no system scan.
    pub fn isolated<I>(fonts: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            sources: fonts
                .into_iter()
                .map(|data| FontSource::Data(Arc::new(data)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sources.push(FontSource::Dir(dir.into()));
        self
    }

    pub fn with_font_data(mut self, data: Vec<u8>) -> Self {
        self.sources.push(FontSource::Data(Arc::new(data)));
        self
    }

    pub fn loads_system_fonts(&self) -> bool {
        self.sources
            .iter()
            .any(|source| matches!(source, FontSource::System))
    }

    /// Load every source into a fresh [`fontdb::Database`] and resolve the
    /// generic families against the faces found.
    ///
    /// Scanning system fonts is slow; build once and share the shaper.
    pub fn build_database(&self) -> fontdb::Database {
        let mut db = fontdb::Database::new();
        for source in &self.sources {
            match source {
                FontSource::System => db.load_system_fonts(),
                FontSource::Dir(dir) => db.load_fonts_dir(dir),
                FontSource::Data(data) => db.load_font_data(Vec::clone(data)),
            }
        }

        let installed: HashSet<&str> = db
            .faces()
            .flat_map(|face| face.families.iter().map(|(name, _)| name.as_str()))
            .collect();
        let resolved: Vec<(GenericFamily, String)> = GenericFamily::ALL
            .into_iter()
            .filter_map(|generic| {
                self.generic_families
                    .get(generic)
                    .iter()
                    .find(|name| installed.contains(name.as_str()))
                    .map(|name| (generic, name.clone()))
            })
            .collect();
        for (generic, name) in resolved {
            log::debug!(target: "text", "{:?} -> {}", generic, name);
            match generic {
                GenericFamily::Serif => db.set_serif_family(name),
                GenericFamily::SansSerif => db.set_sans_serif_family(name),
                GenericFamily::Monospace => db.set_monospace_family(name),
                GenericFamily::Cursive => db.set_cursive_family(name),
                GenericFamily::Fantasy => db.set_fantasy_family(name),
            }
        }

        log::debug!(target: "text", "font database holds {} faces", db.len());
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_scan_system_fonts() {
        let config = FontConfig::default();
        assert!(config.loads_system_fonts());
        assert!(!config.hinting);
        assert_eq!(
            config.generic_families.get(GenericFamily::SansSerif)[0],
            "Arial"
        );
    }

    #[test]
    fn test_isolated_database_is_empty() {
        let config = FontConfig::isolated(Vec::new());
        assert!(!config.loads_system_fonts());
        assert_eq!(config.build_database().len(), 0);
    }

    #[test]
    fn test_garbage_font_data_loads_nothing() {
        let config = FontConfig::isolated([vec![0u8; 64]]);
        assert_eq!(config.build_database().len(), 0);
    }

    #[test]
    fn test_font_data_shared_between_clones() {
        let config = FontConfig::isolated(Vec::new()).with_font_data(vec![1, 2, 3]);
        let cloned = config.clone();
        match (&config.sources[0], &cloned.sources[0]) {
            (FontSource::Data(a), FontSource::Data(b)) => assert!(Arc::ptr_eq(a, b)),
            other => panic!("unexpected sources {other:?}"),
        }
    }

    #[test]
    fn test_generic_family_override() {
        let mut families = GenericFamilyMap::defaults();
        families.set(GenericFamily::Monospace, ["Fira Code"]);
        assert_eq!(families.get(GenericFamily::Monospace), ["Fira Code"]);
        assert_eq!(families.get(GenericFamily::Serif)[0], "Times New Roman");
    }
}
