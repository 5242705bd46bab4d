//! Builds crystal-plasticity RVE input decks: assigns measured orientations to
//! a hierarchical grain structure and emits the solver include files.

pub mod deck;
pub mod error;
pub mod matching;
pub mod mesh;
pub mod model;
pub mod runtime;
pub mod scan;
pub mod store;

pub use error::AssignError;
