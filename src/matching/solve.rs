use ahash::AHashSet;
use std::cmp::Reverse;

use super::types::{BankSummary, Candidate, MatchPair, RankedSubGroup};
use crate::error::AssignError;
use crate::model::{TargetGroup, TargetHierarchy};

/// Pair position `i` of `targets` with position `i` of `bank`.
///
/// Both lists must already be ranked the same way (size, largest first). The
/// bank side may be longer; surplus bank entries are left unpaired.
pub fn pair_by_rank<'a, T, B>(
    target_id: &str,
    bank_id: &str,
    targets: &'a [T],
    bank: &'a [B],
) -> Result<Vec<(&'a T, &'a B)>, AssignError> {
    if bank.len() < targets.len() {
        return Err(AssignError::IndexRange {
            target: target_id.to_string(),
            bank: bank_id.to_string(),
            needed: targets.len(),
            available: bank.len(),
        });
    }
    Ok(targets.iter().zip(bank.iter()).collect())
}

/// Target sub-group sizes, largest first.
pub fn sorted_sizes(group: &TargetGroup) -> Vec<usize> {
    let mut sizes = group.sizes.clone();
    sizes.sort_unstable_by_key(|&n| Reverse(n));
    sizes
}

/// Sum over rank-paired sub-groups of (bank records - target grains).
pub fn match_score(
    target_id: &str,
    sorted_sizes: &[usize],
    bank_id: &str,
    bank_subgroups: &[RankedSubGroup],
) -> Result<i64, AssignError> {
    let pairs = pair_by_rank(target_id, bank_id, sorted_sizes, bank_subgroups)?;
    Ok(pairs
        .into_iter()
        .map(|(&need, have)| have.count as i64 - need as i64)
        .sum())
}

/// Every summarized bank group scored against `group`, best first.
/// Equal scores keep summary order.
pub fn rank_candidates(
    group: &TargetGroup,
    summary: &BankSummary,
) -> Result<Vec<Candidate>, AssignError> {
    let sizes = sorted_sizes(group);
    let mut candidates = summary
        .groups()
        .iter()
        .map(|(bank_id, subs)| {
            match_score(&group.id, &sizes, bank_id, subs).map(|score| Candidate {
                bank_group: bank_id.clone(),
                score,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    candidates.sort_by_key(|c| Reverse(c.score));
    Ok(candidates)
}

/// Target groups by total grain count, largest first; ties keep hierarchy order.
pub fn priority_order(target: &TargetHierarchy) -> Vec<&TargetGroup> {
    let mut order: Vec<&TargetGroup> = target.groups().iter().collect();
    order.sort_by_key(|g| Reverse(g.total()));
    order
}

/// One greedy pass in priority order: each target group takes its best
/// candidate not already claimed by an earlier group.
pub fn greedy_match(
    target: &TargetHierarchy,
    summary: &BankSummary,
) -> Result<Vec<MatchPair>, AssignError> {
    let mut claimed: AHashSet<String> = AHashSet::with_capacity(target.groups().len());
    let mut matches = Vec::with_capacity(target.groups().len());

    for group in priority_order(target) {
        let candidates = rank_candidates(group, summary)?;
        let Some(pick) = candidates.iter().find(|c| !claimed.contains(&c.bank_group)) else {
            return Err(AssignError::MatchExhaustion {
                target: group.id.clone(),
                candidates: candidates.len(),
            });
        };
        tracing::debug!(
            target = %group.id,
            bank = %pick.bank_group,
            score = pick.score,
            grains = group.total(),
            "matched group"
        );
        claimed.insert(pick.bank_group.clone());
        matches.push(MatchPair {
            target: group.id.clone(),
            bank: pick.bank_group.clone(),
        });
    }

    Ok(matches)
}
