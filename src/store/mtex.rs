use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::model::{EulerAngles, OrientationBank};

/// Build an orientation bank from an MTEX grain export.
///
/// Each line is `grain,pag,pck,phi1,Phi,phi2`. Groups become `PAG_<pag>`,
/// sub-groups `PCK_<pck>`. Groups with a single sub-group are dropped, then
/// sub-groups holding a single grain.
pub fn bank_from_mtex_csv(path: &Path) -> Result<OrientationBank> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let bank = parse_mtex_csv(BufReader::new(f)).with_context(|| format!("parse {}", path.display()))?;
    tracing::info!(path = %path.display(), groups = bank.len(), "built bank from MTEX export");
    Ok(bank)
}

pub fn parse_mtex_csv<R: BufRead>(reader: R) -> Result<OrientationBank> {
    let mut bank = OrientationBank::new();
    let mut rows = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(record) = line.split_whitespace().next() else {
            continue;
        };
        let fields: Vec<&str> = record.split(',').map(str::trim).collect();
        if fields.len() < 6 {
            bail!("line {}: expected 6 comma-separated fields, got {}", lineno + 1, fields.len());
        }
        let parsed = fields[3..6]
            .iter()
            .map(|s| s.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>();
        let angles = match parsed {
            Ok(a) => a,
            // column titles
            Err(_) if lineno == 0 => continue,
            Err(e) => bail!("line {}: bad angle ({e})", lineno + 1),
        };

        let group = format!("PAG_{}", fields[1]);
        let subgroup = format!("PCK_{}", fields[2]);
        bank.push_record(&group, &subgroup, EulerAngles::new(angles[0], angles[1], angles[2]));
        rows += 1;
    }

    if rows == 0 {
        bail!("no grain rows found");
    }

    let before = bank.len();
    bank.retain_groups(|g| g.subgroups.len() > 1);
    bank.retain_subgroups(|s| s.records.len() > 1);
    tracing::debug!(rows, groups = before, kept = bank.len(), "pruned MTEX groups");

    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_rows_and_prunes_thin_levels() {
        let csv = "\
grain,pag,pck,phi1,Phi,phi2
1,1,1,10.0,20.0,30.0
2,1,1,11.0,21.0,31.0
3,1,2,12.0,22.0,32.0
4,2,1,13.0,23.0,33.0
5,2,1,14.0,24.0,34.0

6,3,1,1.0,1.0,1.0
7,3,2,2.0,2.0,2.0
8,3,2,3.0,3.0,3.0
";
        let bank = parse_mtex_csv(csv.as_bytes()).unwrap();

        // PAG_2 has one package; dropped.
        let ids: Vec<&str> = bank.groups().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["PAG_1", "PAG_3"]);
        // Single-grain packages dropped inside surviving groups.
        assert!(bank.records("PAG_1", "PCK_2").is_none());
        assert_eq!(
            bank.records("PAG_1", "PCK_1").unwrap(),
            &[EulerAngles::new(10.0, 20.0, 30.0), EulerAngles::new(11.0, 21.0, 31.0)]
        );
        assert_eq!(bank.records("PAG_3", "PCK_2").unwrap().len(), 2);
    }

    #[test]
    fn bad_row_reports_line() {
        let err = parse_mtex_csv("1,1,1,1.0,2.0,3.0\n2,1,1,x,2.0,3.0\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn short_row_rejected() {
        assert!(parse_mtex_csv("1,1,1,1.0\n".as_bytes()).is_err());
    }
}
