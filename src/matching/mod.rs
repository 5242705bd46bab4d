pub mod assign;
pub mod driver;
pub mod extend;
pub mod flatten;
pub mod solve;
pub mod summary;
pub mod types;

pub use driver::*;
pub use types::*;
