//! Solver input deck generation for one RVE directory.

pub mod assemble;
pub mod graindata;
pub mod pbc;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::matching::{Extension, run_assignment};
use crate::mesh::{PbcSets, read_pbc_sets, read_stcell, read_stelset_diameters, read_tess_orientations};
use crate::model::EulerAngles;
use crate::runtime;
use crate::scan::scan_rve_dir;
use crate::store::{default_snapshot_path, load_assignment, load_bank, save_assignment};
use assemble::{DeckIncludes, render_deck};
use graindata::{GRAINDATA, render_graindata, render_materials, render_sections};
use pbc::{CORNERS, EDGES, FACE_PAIRS, VERTEX_SETS};

/// Where grain orientations come from.
#[derive(Debug, Clone)]
pub enum OrientationSource {
    /// The `euler-bunge` block of the directory's `.tess` file.
    Tess,
    /// Match the directory's `.stcell` hierarchy against a bank file.
    Bank(PathBuf),
    /// Replay a saved assignment snapshot.
    Snapshot(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DeckOptions {
    pub source: OrientationSource,
    /// Output directory; the RVE directory when `None`.
    pub out_dir: Option<PathBuf>,
    pub progress: bool,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            source: OrientationSource::Tess,
            out_dir: None,
            progress: false,
        }
    }
}

#[derive(Debug)]
pub struct DeckReport {
    pub deck: PathBuf,
    /// Every file written, the deck last.
    pub written: Vec<PathBuf>,
    pub grains: usize,
    pub extensions: Vec<Extension>,
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Graindata,
    Sections,
    Materials,
    Face(usize),
    Edges,
    Corners,
    VertexSets,
}

struct Inputs<'a> {
    orientations: &'a [EulerAngles],
    diameters: &'a [f64],
    sets: &'a PbcSets,
}

fn render_part(part: Part, inputs: &Inputs<'_>) -> Result<String> {
    match part {
        Part::Graindata => render_graindata(inputs.orientations, inputs.diameters),
        Part::Sections => Ok(render_sections(inputs.diameters.len())),
        Part::Materials => Ok(render_materials(inputs.diameters.len())),
        Part::Face(i) => pbc::render_face_pair(inputs.sets, &FACE_PAIRS[i]),
        Part::Edges => pbc::render_edges(inputs.sets),
        Part::Corners => pbc::render_corners(inputs.sets),
        Part::VertexSets => pbc::render_vertex_sets(inputs.sets),
    }
}

fn write_progress(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} files {msg}") {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

fn orientations_for(
    source: &OrientationSource,
    tess: Option<&Path>,
    stcell: Option<&Path>,
    out_dir: &Path,
) -> Result<(Vec<EulerAngles>, Vec<Extension>, Option<PathBuf>)> {
    match source {
        OrientationSource::Tess => {
            let tess = tess.context("no .tess file in RVE directory")?;
            Ok((read_tess_orientations(tess)?, Vec::new(), None))
        }
        OrientationSource::Bank(bank_path) => {
            let stcell = stcell.context("no .stcell file in RVE directory")?;
            let mut bank = load_bank(bank_path)?;
            let target = read_stcell(stcell)?;
            let mut rng = runtime::sampling_rng();
            let outcome = run_assignment(&mut bank, &target, &mut *rng)?;

            let snapshot = default_snapshot_path(stcell)
                .file_name()
                .map(|name| out_dir.join(name))
                .context("snapshot file name")?;
            save_assignment(&snapshot, &outcome.orientations)?;

            let oris = outcome
                .orientations
                .to_sequence()
                .context("assignment does not cover grains 1..N")?;
            Ok((oris, outcome.extensions, Some(snapshot)))
        }
        OrientationSource::Snapshot(path) => {
            let oris = load_assignment(path)?
                .to_sequence()
                .with_context(|| format!("{}: grains are not numbered 1..N", path.display()))?;
            Ok((oris, Vec::new(), None))
        }
    }
}

/// Scan `dir`, read orientations, diameters and the mesh, then write every
/// include file and the final deck `<mesh stem>_deck.inp`.
pub fn generate_deck(dir: &Path, opts: &DeckOptions) -> Result<DeckReport> {
    let t0 = Instant::now();
    let files = scan_rve_dir(dir)?;
    let mesh = files.mesh.as_deref().context("no mesh .inp file in RVE directory")?;
    let stelset = files
        .stelset
        .as_deref()
        .context("no .stelset file in RVE directory")?;

    let out_dir = opts.out_dir.clone().unwrap_or_else(|| dir.to_path_buf());
    std::fs::create_dir_all(&out_dir).with_context(|| format!("create dir {}", out_dir.display()))?;

    let (orientations, extensions, snapshot) =
        orientations_for(&opts.source, files.tess.as_deref(), files.stcell.as_deref(), &out_dir)?;
    let diameters = read_stelset_diameters(stelset)?;
    if orientations.len() != diameters.len() {
        bail!(
            "{} orientations but {} diameters in {}",
            orientations.len(),
            diameters.len(),
            stelset.display()
        );
    }

    let (_, sets) = read_pbc_sets(mesh)?;
    if !sets.is_complete() {
        bail!("{}: no periodic node information found", mesh.display());
    }
    let mesh_text = std::fs::read_to_string(mesh).with_context(|| format!("read {}", mesh.display()))?;
    let stem = mesh.file_stem().and_then(|s| s.to_str()).unwrap_or("rve");
    let includes = DeckIncludes::for_mesh_stem(stem);

    let mut parts: Vec<(String, Part)> = vec![
        (GRAINDATA.to_string(), Part::Graindata),
        (includes.sections.clone(), Part::Sections),
        (includes.materials.clone(), Part::Materials),
    ];
    parts.extend(FACE_PAIRS.iter().enumerate().map(|(i, p)| (p.file.to_string(), Part::Face(i))));
    parts.push((EDGES.to_string(), Part::Edges));
    parts.push((CORNERS.to_string(), Part::Corners));
    parts.push((VERTEX_SETS.to_string(), Part::VertexSets));

    let inputs = Inputs {
        orientations: &orientations,
        diameters: &diameters,
        sets: &sets,
    };
    let rendered: Vec<(PathBuf, String)> = parts
        .par_iter()
        .map(|(name, part)| {
            render_part(*part, &inputs)
                .with_context(|| format!("render {name}"))
                .map(|text| (out_dir.join(name), text))
        })
        .collect::<Result<_>>()?;

    let deck = out_dir.join(format!("{stem}_deck.inp"));
    let pb = write_progress(rendered.len() + 1, opts.progress);
    let mut written = Vec::with_capacity(rendered.len() + 1);
    for (path, text) in rendered {
        pb.set_message(path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string());
        std::fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
        written.push(path);
        pb.inc(1);
    }
    std::fs::write(&deck, render_deck(&mesh_text, &includes))
        .with_context(|| format!("write {}", deck.display()))?;
    written.push(deck.clone());
    pb.inc(1);
    pb.finish_and_clear();

    tracing::info!(
        dir = %dir.display(),
        deck = %deck.display(),
        grains = orientations.len(),
        files = written.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "deck generated"
    );

    Ok(DeckReport {
        deck,
        written,
        grains: orientations.len(),
        extensions,
        snapshot,
    })
}
