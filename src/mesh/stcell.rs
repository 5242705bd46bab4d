use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::model::{TargetGroup, TargetHierarchy};

pub fn read_stcell(path: &Path) -> Result<TargetHierarchy> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_stcell(BufReader::new(f)).with_context(|| format!("parse {}", path.display()))
}

/// Parse `pag pck grain` lines of a multiscale Neper tessellation.
///
/// Consecutive lines sharing (pag, pck) form one sub-group whose size is the
/// last grain number of the run; each new pag opens group `PAG_<pag>`.
pub fn parse_stcell<R: BufRead>(reader: R) -> Result<TargetHierarchy> {
    let mut hierarchy = TargetHierarchy::new();
    let mut prev: Option<(String, String, usize)> = None;

    let close = |h: &mut TargetHierarchy, pag: &str, size: usize| {
        if let Some(group) = h.group_mut(&format!("PAG_{pag}")) {
            group.sizes.push(size);
        }
    };

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let (Some(pag), Some(pck), Some(grain)) = (parts.next(), parts.next(), parts.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            bail!("line {}: expected `pag pck grain`", lineno + 1);
        };
        let grain: usize = grain
            .parse()
            .with_context(|| format!("line {}: bad grain number {grain:?}", lineno + 1))?;

        match &prev {
            Some((ppag, ppck, pgrain)) if ppag == pag => {
                if ppck != pck {
                    close(&mut hierarchy, ppag, *pgrain);
                }
            }
            other => {
                if let Some((ppag, _, pgrain)) = other {
                    close(&mut hierarchy, ppag, *pgrain);
                }
                hierarchy.insert(TargetGroup::new(format!("PAG_{pag}"), Vec::new()));
            }
        }
        prev = Some((pag.to_string(), pck.to_string(), grain));
    }

    if let Some((pag, _, grain)) = &prev {
        close(&mut hierarchy, pag, *grain);
    }
    Ok(hierarchy)
}
