use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::deck::graindata::GRAINDATA;
use crate::deck::pbc::{CORNERS, EDGES, FACE_PAIRS, VERTEX_SETS};

/// Inputs found in an RVE directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RveFiles {
    pub tess: Option<PathBuf>,
    pub stelset: Option<PathBuf>,
    pub stcell: Option<PathBuf>,
    pub mesh: Option<PathBuf>,
}

/// Files this crate writes into an RVE directory; never picked up as inputs.
pub fn is_generated(file_name: &str) -> bool {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    if stem.contains("sections") || stem.contains("materials") || stem.ends_with("_deck") {
        return true;
    }
    file_name == GRAINDATA
        || file_name == EDGES
        || file_name == CORNERS
        || file_name == VERTEX_SETS
        || FACE_PAIRS.iter().any(|p| p.file == file_name)
}

fn pick(slot: &mut Option<PathBuf>, role: &str, path: PathBuf) {
    if let Some(kept) = slot.as_deref() {
        tracing::warn!(role, kept = %kept.display(), ignored = %path.display(), "several candidate files");
    } else {
        *slot = Some(path);
    }
}

/// Non-recursive scan; entries are visited in name order so the pick is stable.
pub fn scan_rve_dir(dir: &Path) -> Result<RveFiles> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("read directory {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    let mut found = RveFiles::default();
    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_generated(name) {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("tess") => pick(&mut found.tess, "tess", path),
            Some("stelset") => pick(&mut found.stelset, "stelset", path),
            Some("stcell") => pick(&mut found.stcell, "stcell", path),
            Some("inp") => pick(&mut found.mesh, "mesh", path),
            _ => {}
        }
    }
    tracing::debug!(dir = %dir.display(), ?found, "scanned rve directory");
    Ok(found)
}
