use anyhow::{Result, bail};
use std::fmt::Write;

use crate::model::EulerAngles;

pub const GRAINDATA: &str = "graindata.inp";

const TITLE: &str = "!MMM Crystal Plasticity Input File\n\n";

/// Non-positive angles are written shifted by a full turn.
#[inline]
pub fn wrap_angle(deg: f64) -> f64 {
    if deg > 0.0 { deg } else { deg + 360.0 }
}

/// Per-grain orientation and size table read by the crystal plasticity
/// subroutine. Grain `i` is the `i`th entry of both slices.
pub fn render_graindata(orientations: &[EulerAngles], diameters: &[f64]) -> Result<String> {
    if orientations.len() != diameters.len() {
        bail!(
            "{} orientations but {} grain diameters",
            orientations.len(),
            diameters.len()
        );
    }
    let mut out = String::with_capacity(TITLE.len() + orientations.len() * 48);
    out.push_str(TITLE);
    for (i, (ori, d)) in orientations.iter().zip(diameters).enumerate() {
        let _ = writeln!(
            out,
            "Grain : {} : {:.3} : {:.3} : {:.3} : {:.3}",
            i + 1,
            wrap_angle(ori.phi1),
            wrap_angle(ori.phi),
            wrap_angle(ori.phi2),
            d
        );
    }
    Ok(out)
}

pub fn render_sections(grains: usize) -> String {
    let mut out = String::new();
    for i in 1..=grains {
        let _ = write!(
            out,
            "**Section: Section-{i}\n*Solid Section, elset=poly{i}, material=Grain_Mat{i}\n,\n"
        );
    }
    out
}

pub fn render_materials(grains: usize) -> String {
    let mut out = String::new();
    for i in 1..=grains {
        let _ = write!(
            out,
            "*Material, name=Grain_Mat{i}\n*Depvar\n\t176,\n*User Material, constants=2\n{i}.,3.\n"
        );
    }
    out
}
