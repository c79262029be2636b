use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use ab_glyph::FontArc;

/// Font configuration injected at renderer construction: family name to
/// candidate font file paths, tried in order. No module-level globals; the
/// resolved [`FontLibrary`] is passed explicitly to text rendering.
#[derive(Clone, Debug)]
pub struct FontConfig {
    pub families: BTreeMap<String, FontFamilyConfig>,
}

#[derive(Clone, Debug, Default)]
pub struct FontFamilyConfig {
    pub regular: Vec<PathBuf>,
    pub bold: Vec<PathBuf>,
}

pub const DEFAULT_FAMILY: &str = "default";

impl Default for FontConfig {
    /// Built-in fallback chain covering common system font locations.
    fn default() -> Self {
        let regular = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "C:/Windows/Fonts/arial.ttf",
            "/System/Library/Fonts/Helvetica.ttc",
        ];
        let bold = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "C:/Windows/Fonts/arialbd.ttf",
            "/System/Library/Fonts/Helvetica.ttc",
        ];

        let mut families = BTreeMap::new();
        families.insert(
            DEFAULT_FAMILY.to_string(),
            FontFamilyConfig {
                regular: regular.iter().map(PathBuf::from).collect(),
                bold: bold.iter().map(PathBuf::from).collect(),
            },
        );
        Self { families }
    }
}

/// Loaded font faces, resolved once from a [`FontConfig`].
#[derive(Debug)]
pub struct FontLibrary {
    families: BTreeMap<String, LoadedFamily>,
}

#[derive(Debug, Default)]
struct LoadedFamily {
    regular: Option<FontArc>,
    bold: Option<FontArc>,
}

impl FontLibrary {
    /// Tries each candidate path in order; the first file that reads and
    /// parses wins. A family with no usable candidates stays empty and is
    /// reported at `warn` level; the library itself always constructs.
    pub fn load(config: &FontConfig) -> Self {
        let mut families = BTreeMap::new();
        for (name, family) in &config.families {
            let loaded = LoadedFamily {
                regular: load_first(&family.regular),
                bold: load_first(&family.bold),
            };
            if loaded.regular.is_none() && loaded.bold.is_none() {
                tracing::warn!(family = %name, "no usable font file for family");
            }
            families.insert(name.clone(), loaded);
        }
        Self { families }
    }

    /// Resolves a face: requested family/variant, then the family's regular,
    /// then the default family, then any loaded face at all.
    pub fn get(&self, family: &str, bold: bool) -> Option<&FontArc> {
        self.face_of(family, bold)
            .or_else(|| self.face_of(DEFAULT_FAMILY, bold))
            .or_else(|| {
                self.families
                    .values()
                    .find_map(|f| f.regular.as_ref().or(f.bold.as_ref()))
            })
    }

    fn face_of(&self, family: &str, bold: bool) -> Option<&FontArc> {
        let f = self.families.get(family)?;
        if bold {
            f.bold.as_ref().or(f.regular.as_ref())
        } else {
            f.regular.as_ref()
        }
    }
}

fn load_first(candidates: &[PathBuf]) -> Option<FontArc> {
    for path in candidates {
        if let Some(font) = load_font(path) {
            tracing::debug!(path = %path.display(), "loaded font");
            return Some(font);
        }
    }
    None
}

fn load_font(path: &Path) -> Option<FontArc> {
    let bytes = fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}
