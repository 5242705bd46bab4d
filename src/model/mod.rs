pub mod ordered;
pub mod types;

pub use ordered::Ordered;
pub use types::*;
