//! Readers for Neper tessellation output and Abaqus meshes.

pub mod nodes;
pub mod stcell;
pub mod tess;

pub use nodes::{NodeId, NodeTable, PbcSets, read_pbc_sets};
pub use stcell::read_stcell;
pub use tess::{read_stelset_diameters, read_tess_orientations};
