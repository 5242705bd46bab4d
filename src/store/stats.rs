use crate::model::OrientationBank;

/// Average number of sub-groups per bank group. An empty bank gives 0.0.
pub fn mean_subgroup_count(bank: &OrientationBank) -> f64 {
    if bank.is_empty() {
        tracing::warn!("mean sub-group count of an empty bank; reporting 0");
        return 0.0;
    }
    let total: usize = bank.groups().iter().map(|g| g.subgroups.len()).sum();
    total as f64 / bank.len() as f64
}
