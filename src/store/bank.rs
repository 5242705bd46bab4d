use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::AssignError;
use crate::mesh::stcell::read_stcell;
use crate::model::{EulerAngles, Ordered, OrientationBank, TargetHierarchy};

/// Load `{group: {subgroup: [{phi1, phi, phi2}, ...]}}`, keeping file order.
pub fn load_bank(path: &Path) -> Result<OrientationBank, AssignError> {
    let f = File::open(path).map_err(|e| AssignError::missing("orientation bank", path, e))?;
    let raw: Ordered<Ordered<Vec<EulerAngles>>> = serde_json::from_reader(BufReader::new(f))
        .map_err(|e| AssignError::missing("orientation bank", path, e))?;
    let bank = OrientationBank::from(raw);
    tracing::info!(
        path = %path.display(),
        groups = bank.len(),
        records = bank.groups().iter().map(|g| g.total_records()).sum::<usize>(),
        "loaded orientation bank"
    );
    Ok(bank)
}

/// Write the bank with keys sorted at both levels.
pub fn save_bank(path: &Path, bank: &OrientationBank) -> Result<()> {
    let mut sorted = bank.clone();
    sorted.sort_by_id();
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, &sorted.to_ordered())
        .with_context(|| format!("write {}", path.display()))?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

/// Load a target hierarchy from `{group: [sizes...]}` JSON, or from a Neper
/// `.stcell` file when the extension says so.
pub fn load_hierarchy(path: &Path) -> Result<TargetHierarchy, AssignError> {
    let is_stcell = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("stcell"));

    let hierarchy = if is_stcell {
        read_stcell(path).map_err(|e| AssignError::missing("target hierarchy", path, format!("{e:#}")))?
    } else {
        let f = File::open(path).map_err(|e| AssignError::missing("target hierarchy", path, e))?;
        let raw: Ordered<Vec<usize>> = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| AssignError::missing("target hierarchy", path, e))?;
        TargetHierarchy::from(raw)
    };

    tracing::info!(
        path = %path.display(),
        groups = hierarchy.groups().len(),
        grains = hierarchy.total_grains(),
        "loaded target hierarchy"
    );
    Ok(hierarchy)
}
