use rand::Rng;

use super::extend::extend_records;
use super::solve::pair_by_rank;
use super::types::{BankSummary, Extension, FlatHierarchy, MatchPair};
use crate::error::AssignError;
use crate::model::{AssignedOrientations, OrientationBank};

/// Hand out bank orientations to every grain of every matched target group.
///
/// Target sub-groups (size-ranked) pair with the matched bank group's
/// size-ranked sub-groups by position. A bank sub-group that is too small is
/// grown through [`extend_records`] first; a larger one only gives up its
/// leading records. Grain `first_index + k` receives record `k`.
pub fn assign_orientations<R: Rng + ?Sized>(
    matches: &[MatchPair],
    flat: &FlatHierarchy,
    summary: &BankSummary,
    bank: &mut OrientationBank,
    rng: &mut R,
) -> Result<(AssignedOrientations, Vec<Extension>), AssignError> {
    let mut assigned = AssignedOrientations::new();
    let mut extensions = Vec::new();

    for pair in matches {
        let target = flat.get(&pair.target).ok_or_else(|| {
            AssignError::Configuration(format!("target group {} was never flattened", pair.target))
        })?;
        let bank_subs = summary.get(&pair.bank).ok_or_else(|| {
            AssignError::Configuration(format!("bank group {} is not in the summary", pair.bank))
        })?;

        for (sub, bank_sub) in pair_by_rank(&pair.target, &pair.bank, &target.subgroups, bank_subs)? {
            let (records, extension) =
                extend_records(bank, &pair.bank, &bank_sub.id, sub.count, rng)?;
            if let Some(ext) = extension {
                tracing::debug!(
                    group = %ext.group,
                    subgroup = %ext.subgroup,
                    from = ext.original,
                    to = ext.extended_to,
                    "extended bank sub-group"
                );
                extensions.push(ext);
            }

            for (k, record) in records[..sub.count].iter().enumerate() {
                let previous = assigned.insert(sub.first_index + k, *record);
                debug_assert!(previous.is_none(), "grain {} assigned twice", sub.first_index + k);
            }
        }
    }

    Ok((assigned, extensions))
}
