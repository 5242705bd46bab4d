use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::model::EulerAngles;

const ORI_MARKER: &str = "euler-bunge";

/// Per-grain Bunge angles from a Neper `.tess` file, grain 1 first.
pub fn read_tess_orientations(path: &Path) -> Result<Vec<EulerAngles>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let oris = parse_tess_orientations(BufReader::new(f))
        .with_context(|| format!("parse {}", path.display()))?;
    tracing::info!(path = %path.display(), grains = oris.len(), "read tess orientations");
    Ok(oris)
}

/// Angle lines follow the `euler-bunge` line and end at the next keyword line.
pub fn parse_tess_orientations<R: BufRead>(reader: R) -> Result<Vec<EulerAngles>> {
    let mut out = Vec::new();
    let mut reading = false;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if !reading {
            reading = trimmed.contains(ORI_MARKER);
            continue;
        }
        if trimmed.starts_with('*') {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        let angles: Vec<f64> = trimmed
            .split_whitespace()
            .take(3)
            .map(str::parse::<f64>)
            .collect::<Result<_, _>>()
            .with_context(|| format!("line {}: bad euler angle", lineno + 1))?;
        if angles.len() < 3 {
            bail!("line {}: expected 3 euler angles", lineno + 1);
        }
        out.push(EulerAngles::new(angles[0], angles[1], angles[2]));
    }

    if !reading {
        bail!("no {ORI_MARKER} section");
    }
    Ok(out)
}

/// Equivalent grain diameters from a Neper `.stelset` file, one per line.
pub fn read_stelset_diameters(path: &Path) -> Result<Vec<f64>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let diameters = parse_stelset(BufReader::new(f)).with_context(|| format!("parse {}", path.display()))?;
    tracing::info!(path = %path.display(), grains = diameters.len(), "read equivalent diameters");
    Ok(diameters)
}

pub fn parse_stelset<R: BufRead>(reader: R) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        let d: f64 = first
            .parse()
            .with_context(|| format!("line {}: bad diameter {first:?}", lineno + 1))?;
        out.push(d);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_euler_block_only() {
        let tess = "\
***tess
 **format
   3.4
 **cell
   3
  *ori
   euler-bunge
  12.5 40.0 -3.25
   1.0  2.0  3.0

 100.0 0.5 270.0
 **vertex
   1 2 3
";
        let oris = parse_tess_orientations(tess.as_bytes()).unwrap();
        assert_eq!(
            oris,
            vec![
                EulerAngles::new(12.5, 40.0, -3.25),
                EulerAngles::new(1.0, 2.0, 3.0),
                EulerAngles::new(100.0, 0.5, 270.0),
            ]
        );
    }

    #[test]
    fn missing_section_is_an_error() {
        assert!(parse_tess_orientations("***tess\n **cell\n".as_bytes()).is_err());
    }

    #[test]
    fn short_angle_line_is_an_error() {
        let err = parse_tess_orientations("euler-bunge\n1.0 2.0\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn stelset_skips_blank_lines() {
        let d = parse_stelset("0.512\n1.25\n\n".as_bytes()).unwrap();
        assert_eq!(d, vec![0.512, 1.25]);
    }
}
