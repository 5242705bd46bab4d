use std::cmp::Reverse;

use super::types::{BankSummary, GroupSignature, RankedSubGroup};
use crate::error::AssignError;
use crate::model::{BankGroup, OrientationBank, TargetHierarchy};

pub fn signature(group: &BankGroup) -> GroupSignature {
    GroupSignature {
        subgroups: group.subgroups.len(),
        records: group.total_records(),
    }
}

/// Sub-groups of one bank group as (id, count), largest first; ties keep bank order.
pub fn ranked_subgroups(group: &BankGroup) -> Vec<RankedSubGroup> {
    let mut ranked: Vec<RankedSubGroup> = group
        .subgroups
        .iter()
        .map(|s| RankedSubGroup {
            id: s.id.clone(),
            count: s.records.len(),
        })
        .collect();
    ranked.sort_by_key(|s| Reverse(s.count));
    ranked
}

/// Keep bank groups with at least as many sub-groups as the largest target
/// group, ranked by (sub-groups, records) descending with stable ties.
pub fn summarize_bank(
    bank: &OrientationBank,
    target: &TargetHierarchy,
) -> Result<BankSummary, AssignError> {
    if target.is_empty() {
        return Err(AssignError::Configuration(
            "target hierarchy has no groups".into(),
        ));
    }
    let max_subgroups = target.max_subgroups();
    if max_subgroups == 0 {
        return Err(AssignError::Configuration(
            "target hierarchy has no sub-groups in any group".into(),
        ));
    }
    if bank.is_empty() {
        return Err(AssignError::Configuration(
            "orientation bank has no groups".into(),
        ));
    }

    let mut survivors: Vec<(GroupSignature, &BankGroup)> = bank
        .groups()
        .iter()
        .map(|g| (signature(g), g))
        .filter(|(sig, _)| sig.subgroups >= max_subgroups)
        .collect();

    if survivors.is_empty() {
        // Bank is readable but nothing in it is deep enough: a fit problem,
        // reported against the target group that needs the most sub-groups.
        let widest = target
            .groups()
            .iter()
            .find(|g| g.sizes.len() == max_subgroups)
            .map(|g| g.id.clone())
            .unwrap_or_default();
        return Err(AssignError::MatchExhaustion {
            target: widest,
            candidates: 0,
        });
    }

    survivors.sort_by_key(|(sig, _)| Reverse(*sig));

    tracing::debug!(
        bank_groups = bank.len(),
        qualifying = survivors.len(),
        max_subgroups,
        "filtered bank groups"
    );

    Ok(BankSummary {
        groups: survivors
            .into_iter()
            .map(|(_, g)| (g.id.clone(), ranked_subgroups(g)))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EulerAngles, SubGroup, TargetGroup};

    fn group(id: &str, sizes: &[usize]) -> BankGroup {
        BankGroup {
            id: id.into(),
            subgroups: sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| SubGroup {
                    id: format!("s{i}"),
                    records: vec![EulerAngles::new(0.0, 0.0, 0.0); n],
                })
                .collect(),
        }
    }

    fn target(groups: &[(&str, &[usize])]) -> TargetHierarchy {
        TargetHierarchy::from_groups(
            groups
                .iter()
                .map(|(id, sizes)| TargetGroup::new(*id, sizes.to_vec())),
        )
    }

    #[test]
    fn filters_and_ranks_by_signature() {
        let bank = OrientationBank::from_groups(vec![
            group("thin", &[9]),
            group("two_small", &[1, 1]),
            group("three", &[1, 1, 1]),
            group("two_big", &[5, 4]),
        ]);
        let summary = summarize_bank(&bank, &target(&[("G", &[2, 2])])).unwrap();
        let ids: Vec<&str> = summary.groups().iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["three", "two_big", "two_small"]);
    }

    #[test]
    fn equal_signatures_keep_bank_order() {
        let bank = OrientationBank::from_groups(vec![group("b", &[2, 3]), group("a", &[3, 2])]);
        let summary = summarize_bank(&bank, &target(&[("G", &[1])])).unwrap();
        assert_eq!(summary.groups()[0].0, "b");
        assert_eq!(summary.groups()[1].0, "a");
    }

    #[test]
    fn subgroups_ranked_largest_first_with_stable_ties() {
        let ranked = ranked_subgroups(&group("g", &[2, 5, 2, 7]));
        let order: Vec<(&str, usize)> = ranked.iter().map(|s| (s.id.as_str(), s.count)).collect();
        assert_eq!(order, [("s3", 7), ("s1", 5), ("s0", 2), ("s2", 2)]);
    }

    #[test]
    fn empty_target_is_configuration_error() {
        let bank = OrientationBank::from_groups(vec![group("b", &[1])]);
        let err = summarize_bank(&bank, &TargetHierarchy::new()).unwrap_err();
        assert!(matches!(err, AssignError::Configuration(_)));
    }

    #[test]
    fn empty_bank_is_configuration_error() {
        let err = summarize_bank(&OrientationBank::new(), &target(&[("G", &[1])])).unwrap_err();
        assert!(matches!(err, AssignError::Configuration(_)));
    }

    #[test]
    fn nothing_deep_enough_names_widest_target() {
        let bank = OrientationBank::from_groups(vec![group("b", &[4, 4])]);
        let err = summarize_bank(&bank, &target(&[("small", &[1]), ("wide", &[1, 1, 1])]))
            .unwrap_err();
        match err {
            AssignError::MatchExhaustion { target, candidates } => {
                assert_eq!(target, "wide");
                assert_eq!(candidates, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
