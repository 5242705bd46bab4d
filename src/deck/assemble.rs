use std::fmt::Write;

use super::pbc::{CORNERS, EDGES, FACE_PAIRS, INSTANCE, VERTEX_SETS};

const HEADING: &str = "*Heading\n\
** Job name: Job-1 Model name: multi_scale_rve\n\
** Generated by: Abaqus/CAE 2017\n\
*Preprint, echo=NO, model=NO, history=NO, contact=NO\n\
**\n** PARTS\n**\n";

const BOUNDARY_CONDITIONS: &str = "**\n**BOUNDARY CONDITIONS\n**\n\
** Name: H1 Type: Displacement/Rotation\n*Boundary \nH1, 1, 1 \nH1, 2, 2 \n\
** Name: V1 Type: Displacement/Rotation\n*Boundary \nV1, 1, 1 \nV1, 2, 2 \nV1, 3, 3 \n\
** Name: V2 Type: Displacement/Rotation\n*Boundary \nV2, 2, 2 \nV2, 3, 3 \n\
** Name: V4 Type: Displacement/Rotation\n*Boundary \nV4, 1, 1 \nV4, 3, 3 \n";

const STEP: &str = "** ----------------------------------------------------------------\n\
**\n** STEP: Step-1\n**\n*Step, name=Step-1, nlgeom=YES, inc=10000000\n\
*Static\n0.0002, 4., 1e-20, 0.05\n\
**\n** BOUNDARY CONDITIONS\n** \n** Name: Load Type: Displacement/Rotation \n\
*Boundary\nV2, 1, 1, 5.\n";

const OUTPUT_REQUESTS: &str = "**\n** OUTPUT REQUESTS\n** \n*Restart, write, frequency=0\n\
** \n** FIELD OUTPUT: F-Output-1\n** \n\
*Output, field\n*Node Output\nRF, U\n\
*Element Output, direction=YES\nLE, MISES, PE, PEEQ, S, SDV78, SDV79\n\
** \n** HISTORY OUTPUT: H-Output-1\n** \n*Output, history, variable=PRESELECT\n\
*End Step\n";

const END_PART: &str = "*End Part";

/// File names the final deck pulls in with `*Include`.
#[derive(Debug, Clone)]
pub struct DeckIncludes {
    pub sections: String,
    pub materials: String,
}

impl DeckIncludes {
    /// `<stem>_sections.inp` and `<stem>_materials.inp`.
    pub fn for_mesh_stem(stem: &str) -> Self {
        Self {
            sections: format!("{stem}_sections.inp"),
            materials: format!("{stem}_materials.inp"),
        }
    }
}

/// Full simulation deck around the original mesh text.
///
/// The mesh's `*End Part` lines move below the include block, one for each
/// line removed and at least one.
pub fn render_deck(mesh: &str, includes: &DeckIncludes) -> String {
    let mut out = String::with_capacity(mesh.len() + 4096);
    out.push_str(HEADING);

    let mut end_parts = 0usize;
    for line in mesh.lines() {
        if line.trim() == END_PART {
            end_parts += 1;
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.push('\n');
    let _ = writeln!(out, "*Include, Input = {}", includes.sections);
    for pair in &FACE_PAIRS {
        let _ = writeln!(out, "*Include, Input = {}", pair.file);
    }
    let _ = writeln!(out, "*Include, Input = {EDGES}");
    let _ = writeln!(out, "*Include, Input = {CORNERS}");
    for _ in 0..end_parts.max(1) {
        let _ = writeln!(out, "{END_PART}");
    }

    let _ = write!(
        out,
        "**\n**\n** ASSEMBLY\n**\n*Assembly, name=Assembly\n**\n\
         *Instance, name={INSTANCE}, part=TESS\n*End Instance\n\
         **\n*Include, input={VERTEX_SETS}\n*End Assembly\n"
    );
    let _ = writeln!(out, "**\n**Materials\n*Include, input={}", includes.materials);
    out.push_str(BOUNDARY_CONDITIONS);
    out.push_str(STEP);
    out.push_str(OUTPUT_REQUESTS);
    out
}
