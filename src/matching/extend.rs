use rand::Rng;

use super::types::Extension;
use crate::error::AssignError;
use crate::model::{EulerAngles, OrientationBank};

/// Grow `group/subgroup` in the bank to at least `needed` records.
///
/// Each missing record is a uniform draw, with replacement, from the list as
/// it currently stands (earlier duplicates included). Existing records are
/// never touched and the growth stays in the bank, so a second call with the
/// same `needed` is a no-op. Returns the full record list and, if anything
/// was appended, what happened.
pub fn extend_records<'b, R: Rng + ?Sized>(
    bank: &'b mut OrientationBank,
    group: &str,
    subgroup: &str,
    needed: usize,
    rng: &mut R,
) -> Result<(&'b [EulerAngles], Option<Extension>), AssignError> {
    let records = bank.records_mut(group, subgroup).ok_or_else(|| {
        AssignError::Configuration(format!("bank has no sub-group {group}/{subgroup}"))
    })?;

    let original = records.len();
    if original >= needed {
        return Ok((records.as_slice(), None));
    }
    if original == 0 {
        return Err(AssignError::ExtensionSourceEmpty {
            group: group.to_string(),
            subgroup: subgroup.to_string(),
        });
    }

    records.reserve(needed - original);
    while records.len() < needed {
        let pick = rng.gen_range(0..records.len());
        let drawn = records[pick];
        records.push(drawn);
    }

    let extension = Extension {
        group: group.to_string(),
        subgroup: subgroup.to_string(),
        original,
        extended_to: needed,
    };
    Ok((records.as_slice(), Some(extension)))
}
