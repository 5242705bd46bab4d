pub mod bank;
pub mod mtex;
pub mod snapshot;
pub mod stats;

pub use bank::{load_bank, load_hierarchy, save_bank};
pub use mtex::bank_from_mtex_csv;
pub use snapshot::{default_snapshot_path, load_assignment, save_assignment};
pub use stats::mean_subgroup_count;
