use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::Digest;

use crate::foundation::error::{ReelError, ReelResult};

/// Font face bytes resolved from the font database.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    /// First family name recorded for the face.
    pub family: String,
    /// Raw font file bytes (shared; a `.ttc` may hold several faces).
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside `bytes`.
    pub index: u32,
}

impl ResolvedFont {
    /// Lowercase hex SHA-256 of the font bytes, for diagnostics.
    pub fn sha256_hex(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

/// Font weight request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontWeight {
    /// 400.
    Normal,
    /// 700.
    Bold,
}

impl FontWeight {
    fn to_fontdb(self) -> usvg::fontdb::Weight {
        match self {
            Self::Normal => usvg::fontdb::Weight::NORMAL,
            Self::Bold => usvg::fontdb::Weight::BOLD,
        }
    }
}

/// Font database: system fonts plus any `.ttf`/`.otf`/`.ttc` files from extra directories.
pub struct FontBook {
    db: usvg::fontdb::Database,
}

impl FontBook {
    /// Load system fonts (when `system` is set) and every font file found directly inside
    /// `extra_dirs`. Missing directories are skipped.
    #[tracing::instrument(skip_all, fields(extra_dirs = extra_dirs.len()))]
    pub fn load(extra_dirs: &[PathBuf], system: bool) -> Self {
        let mut db = usvg::fontdb::Database::new();
        if system {
            db.load_system_fonts();
        }
        for dir in extra_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        Self::from_database(db)
    }

    /// Wrap `db`, pointing the generic families at installed faces.
    fn from_database(mut db: usvg::fontdb::Database) -> Self {
        let mono = pick_family(&db, MONOSPACE_FAMILIES, |face, _| face.monospaced);
        let sans = pick_family(&db, SANS_SERIF_FAMILIES, |face, name| {
            !face.monospaced && name.to_ascii_lowercase().contains("sans")
        });
        let serif = pick_family(&db, SERIF_FAMILIES, |face, name| {
            let name = name.to_ascii_lowercase();
            !face.monospaced && name.contains("serif") && !name.contains("sans")
        });
        if let Some(name) = &mono {
            db.set_monospace_family(name.as_str());
        }
        if let Some(name) = &sans {
            db.set_sans_serif_family(name.as_str());
        }
        if let Some(name) = &serif {
            db.set_serif_family(name.as_str());
        }
        tracing::debug!(
            faces = db.len(),
            monospace = mono.as_deref().unwrap_or("-"),
            sans_serif = sans.as_deref().unwrap_or("-"),
            serif = serif.as_deref().unwrap_or("-"),
            "font database ready"
        );
        Self { db }
    }

    /// Number of faces known to the database.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Resolve `family` at `weight`.
    ///
    /// `family` is matched case-insensitively against the generic names `monospace`,
    /// `sans-serif`/`sans` and `serif`; anything else is a named family. Generic monospace and
    /// sans-serif act as fallbacks, then the first monospaced face, then any face. The weight is
    /// always matched inside the family that was found, so bold and regular share a family.
    pub fn resolve(&self, family: &str, weight: FontWeight) -> ReelResult<ResolvedFont> {
        let lowered = family.trim().to_ascii_lowercase();
        let requested = match lowered.as_str() {
            "monospace" | "mono" => usvg::fontdb::Family::Monospace,
            "sans-serif" | "sansserif" | "sans" => usvg::fontdb::Family::SansSerif,
            "serif" => usvg::fontdb::Family::Serif,
            _ => usvg::fontdb::Family::Name(family.trim()),
        };
        let families = [
            requested,
            usvg::fontdb::Family::Monospace,
            usvg::fontdb::Family::SansSerif,
        ];

        let query = usvg::fontdb::Query {
            families: &families,
            weight: weight.to_fontdb(),
            stretch: usvg::fontdb::Stretch::Normal,
            style: usvg::fontdb::Style::Normal,
        };

        let id = self
            .db
            .query(&query)
            .or_else(|| self.query_fallback(weight))
            .ok_or_else(|| {
                ReelError::validation(format!(
                    "no font face available for family \"{family}\" (font database is empty)"
                ))
            })?;

        let face_family = self
            .db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_else(|| family.to_owned());

        let (bytes, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| {
                ReelError::validation(format!("font face for \"{face_family}\" is unreadable"))
            })?;

        tracing::debug!(requested = family, resolved = %face_family, ?weight, "resolved font");
        Ok(ResolvedFont {
            family: face_family,
            bytes: Arc::new(bytes),
            index,
        })
    }

    fn query_fallback(&self, weight: FontWeight) -> Option<usvg::fontdb::ID> {
        let face = self
            .db
            .faces()
            .find(|f| f.monospaced)
            .or_else(|| self.db.faces().next())?;
        let (name, _) = face.families.first()?;
        let families = [usvg::fontdb::Family::Name(name.as_str())];
        self.db
            .query(&usvg::fontdb::Query {
                families: &families,
                weight: weight.to_fontdb(),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            })
            .or(Some(face.id))
    }
}

const MONOSPACE_FAMILIES: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Ubuntu Mono",
    "Courier New",
    "Menlo",
    "Consolas",
];

const SANS_SERIF_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Ubuntu",
    "Arial",
    "Helvetica",
];

const SERIF_FAMILIES: &[&str] = &[
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "Times New Roman",
];

/// First installed family from `preferred`, else the alphabetically first family whose faces
/// satisfy `accept`.
fn pick_family(
    db: &usvg::fontdb::Database,
    preferred: &[&str],
    accept: impl Fn(&usvg::fontdb::FaceInfo, &str) -> bool,
) -> Option<String> {
    let installed = |name: &str| db.faces().any(|f| f.families.iter().any(|(n, _)| n == name));
    if let Some(name) = preferred.iter().find(|name| installed(name)) {
        return Some((*name).to_owned());
    }
    db.faces()
        .filter_map(|f| {
            let (name, _) = f.families.first()?;
            accept(f, name).then(|| name.clone())
        })
        .min()
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory not readable, skipping");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), %err, "failed to load font file");
        }
    }
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
