use anyhow::{Context, Result, bail};
use ndarray::{Array, Array1, Array2, Dimension, Ix1, Ix2};
use ndarray_npy::{NpzReader, NpzWriter, ReadableElement};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::model::{AssignedOrientations, EulerAngles};

const GRAIN_IDS: &str = "grain_ids.npy";
const EULER: &str = "euler.npy";

fn read_entry<T: ReadableElement, D: Dimension>(
    npz: &mut NpzReader<File>,
    name: &str,
) -> Result<Array<T, D>> {
    npz.by_name(name)
        .with_context(|| format!("snapshot entry {name} missing or malformed"))
}

/// `<dir>/<stem>_assignment.npz`, next to the hierarchy it was built from.
pub fn default_snapshot_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("rve");
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(format!("{stem}_assignment.npz")),
        _ => PathBuf::from(".").join(format!("{stem}_assignment.npz")),
    }
}

/// Persist an assignment so a randomized extension can be replayed.
pub fn save_assignment(path: &Path, assigned: &AssignedOrientations) -> Result<()> {
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut npz = NpzWriter::new(f);

    let mut ids: Vec<i64> = Vec::with_capacity(assigned.len());
    let mut angles: Vec<f64> = Vec::with_capacity(assigned.len() * 3);
    for (grain, record) in assigned.iter() {
        ids.push(grain as i64);
        angles.extend_from_slice(&record.as_array());
    }
    let euler = Array2::from_shape_vec((ids.len(), 3), angles).context("shape euler array")?;

    npz.add_array(GRAIN_IDS, &Array1::from_vec(ids))?;
    npz.add_array(EULER, &euler)?;
    npz.finish()?;
    tracing::info!(path = %path.display(), grains = assigned.len(), "assignment snapshot saved");
    Ok(())
}

pub fn load_assignment(path: &Path) -> Result<AssignedOrientations> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut npz = NpzReader::new(f).context("read npz")?;

    let ids: Array<i64, Ix1> = read_entry(&mut npz, GRAIN_IDS)?;
    let euler: Array<f64, Ix2> = read_entry(&mut npz, EULER)?;
    if euler.ncols() != 3 || euler.nrows() != ids.len() {
        bail!(
            "{}: euler array is {}x{}, expected {}x3",
            path.display(),
            euler.nrows(),
            euler.ncols(),
            ids.len()
        );
    }

    let mut assigned = AssignedOrientations::new();
    for (row, &grain) in euler.rows().into_iter().zip(ids.iter()) {
        if grain < 1 {
            bail!("{}: invalid grain index {}", path.display(), grain);
        }
        if assigned
            .insert(grain as usize, EulerAngles::new(row[0], row[1], row[2]))
            .is_some()
        {
            bail!("{}: grain {} stored twice", path.display(), grain);
        }
    }
    tracing::info!(path = %path.display(), grains = assigned.len(), "assignment snapshot loaded");
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn snapshot_restores_every_grain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rve_assignment.npz");
        let assigned = AssignedOrientations::from_sequence([
            EulerAngles::new(10.5, 20.25, 30.0),
            EulerAngles::new(-1.0, 0.0, 359.9),
            EulerAngles::new(0.125, 45.0, 90.0),
        ]);
        save_assignment(&path, &assigned).unwrap();
        assert_eq!(load_assignment(&path).unwrap(), assigned);
    }

    #[test]
    fn default_path_sits_next_to_input() {
        assert_eq!(
            default_snapshot_path(Path::new("/data/rve/sheet_05.stcell")),
            PathBuf::from("/data/rve/sheet_05_assignment.npz")
        );
        assert_eq!(
            default_snapshot_path(Path::new("trial.json")),
            PathBuf::from("./trial_assignment.npz")
        );
    }

    #[test]
    fn missing_snapshot_fails() {
        let dir = tempdir().unwrap();
        assert!(load_assignment(&dir.path().join("nope.npz")).is_err());
    }
}
