use std::cmp::Reverse;

use super::types::{FlatGroup, FlatHierarchy, FlatSubGroup};
use crate::model::TargetHierarchy;

/// Give every target sub-group the global index of its first grain, then
/// re-rank each group's sub-groups by size (largest first).
///
/// Indices follow the original group and sub-group order, starting at 1, so
/// the groups tile `1..=total_grains` without gaps. Labels `pck{i}` keep the
/// original position after the re-rank.
pub fn flatten_hierarchy(target: &TargetHierarchy) -> FlatHierarchy {
    let mut groups = Vec::with_capacity(target.groups().len());
    let mut group_offset = 0usize;

    for group in target.groups() {
        let mut local = 1usize;
        let mut subgroups: Vec<FlatSubGroup> = group
            .sizes
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let first_index = group_offset + local;
                local += count;
                FlatSubGroup {
                    label: format!("pck{i}"),
                    count,
                    first_index,
                }
            })
            .collect();
        subgroups.sort_by_key(|s| Reverse(s.count));

        groups.push(FlatGroup {
            target: group.id.clone(),
            subgroups,
        });
        group_offset += group.total();
    }

    FlatHierarchy { groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetGroup;

    #[test]
    fn offsets_run_across_groups_in_original_order() {
        let target = TargetHierarchy::from_groups([
            TargetGroup::new("G1", vec![2, 3]),
            TargetGroup::new("G2", vec![1, 4, 2]),
        ]);
        let flat = flatten_hierarchy(&target);

        let g1: Vec<(&str, usize, usize)> = flat.groups()[0]
            .subgroups
            .iter()
            .map(|s| (s.label.as_str(), s.count, s.first_index))
            .collect();
        assert_eq!(g1, [("pck1", 3, 3), ("pck0", 2, 1)]);

        let g2: Vec<(&str, usize, usize)> = flat.get("G2").unwrap()
            .subgroups
            .iter()
            .map(|s| (s.label.as_str(), s.count, s.first_index))
            .collect();
        assert_eq!(g2, [("pck1", 4, 7), ("pck2", 2, 11), ("pck0", 1, 6)]);
    }

    #[test]
    fn sub_groups_tile_the_whole_range() {
        let target = TargetHierarchy::from_groups([
            TargetGroup::new("a", vec![5, 1, 3]),
            TargetGroup::new("b", vec![2]),
            TargetGroup::new("c", vec![4, 4]),
        ]);
        let flat = flatten_hierarchy(&target);
        let mut covered: Vec<usize> = flat
            .groups()
            .iter()
            .flat_map(|g| g.subgroups.iter())
            .flat_map(|s| s.first_index..s.first_index + s.count)
            .collect();
        covered.sort_unstable();
        assert_eq!(covered, (1..=target.total_grains()).collect::<Vec<_>>());
    }
}
