use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ordered::Ordered;

/// Bunge Euler angles in degrees. Carried through untouched; never validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub phi1: f64,
    pub phi: f64,
    pub phi2: f64,
}

impl EulerAngles {
    #[inline]
    pub fn new(phi1: f64, phi: f64, phi2: f64) -> Self {
        Self { phi1, phi, phi2 }
    }

    #[inline]
    pub fn as_array(&self) -> [f64; 3] {
        [self.phi1, self.phi, self.phi2]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubGroup {
    pub id: String,
    pub records: Vec<EulerAngles>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankGroup {
    pub id: String,
    pub subgroups: Vec<SubGroup>,
}

impl BankGroup {
    #[inline]
    pub fn total_records(&self) -> usize {
        self.subgroups.iter().map(|s| s.records.len()).sum()
    }
}

/// Measured orientations keyed group -> sub-group -> records, in load order.
///
/// Exclusively owned by one assignment run. Record lists only ever grow, and
/// only through `matching::extend`.
#[derive(Debug, Clone, Default)]
pub struct OrientationBank {
    groups: Vec<BankGroup>,
    index: AHashMap<String, usize>,
}

impl OrientationBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later groups with an already-seen id replace the earlier one in place.
    pub fn from_groups(groups: Vec<BankGroup>) -> Self {
        let mut bank = Self::new();
        for group in groups {
            bank.upsert_group(group);
        }
        bank
    }

    fn upsert_group(&mut self, group: BankGroup) {
        match self.index.get(&group.id) {
            Some(&slot) => self.groups[slot] = group,
            None => {
                self.index.insert(group.id.clone(), self.groups.len());
                self.groups.push(group);
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .groups
            .iter()
            .enumerate()
            .map(|(slot, g)| (g.id.clone(), slot))
            .collect();
    }

    #[inline]
    pub fn groups(&self) -> &[BankGroup] {
        &self.groups
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, id: &str) -> Option<&BankGroup> {
        self.index.get(id).map(|&slot| &self.groups[slot])
    }

    pub fn records(&self, group: &str, subgroup: &str) -> Option<&[EulerAngles]> {
        self.group(group)?
            .subgroups
            .iter()
            .find(|s| s.id == subgroup)
            .map(|s| s.records.as_slice())
    }

    pub(crate) fn records_mut(&mut self, group: &str, subgroup: &str) -> Option<&mut Vec<EulerAngles>> {
        let slot = *self.index.get(group)?;
        self.groups[slot]
            .subgroups
            .iter_mut()
            .find(|s| s.id == subgroup)
            .map(|s| &mut s.records)
    }

    /// Append one record while building a bank, creating the group and
    /// sub-group on first sight.
    pub fn push_record(&mut self, group: &str, subgroup: &str, record: EulerAngles) {
        let slot = match self.index.get(group) {
            Some(&slot) => slot,
            None => {
                self.upsert_group(BankGroup {
                    id: group.to_string(),
                    subgroups: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        let subs = &mut self.groups[slot].subgroups;
        match subs.iter_mut().find(|s| s.id == subgroup) {
            Some(sub) => sub.records.push(record),
            None => subs.push(SubGroup {
                id: subgroup.to_string(),
                records: vec![record],
            }),
        }
    }

    /// Keep only groups for which `keep` holds.
    pub fn retain_groups(&mut self, keep: impl FnMut(&BankGroup) -> bool) {
        self.groups.retain(keep);
        self.rebuild_index();
    }

    /// Keep only sub-groups for which `keep` holds, in every group.
    pub fn retain_subgroups(&mut self, mut keep: impl FnMut(&SubGroup) -> bool) {
        for group in &mut self.groups {
            group.subgroups.retain(&mut keep);
        }
    }

    /// Order groups and sub-groups by id, the layout used when a bank is saved.
    pub fn sort_by_id(&mut self) {
        self.groups.sort_by(|a, b| a.id.cmp(&b.id));
        for group in &mut self.groups {
            group.subgroups.sort_by(|a, b| a.id.cmp(&b.id));
        }
        self.rebuild_index();
    }

    pub fn to_ordered(&self) -> Ordered<Ordered<Vec<EulerAngles>>> {
        Ordered(
            self.groups
                .iter()
                .map(|g| {
                    let subs = g
                        .subgroups
                        .iter()
                        .map(|s| (s.id.clone(), s.records.clone()))
                        .collect();
                    (g.id.clone(), Ordered(subs))
                })
                .collect(),
        )
    }
}

impl From<Ordered<Ordered<Vec<EulerAngles>>>> for OrientationBank {
    fn from(raw: Ordered<Ordered<Vec<EulerAngles>>>) -> Self {
        let groups = raw
            .into_entries()
            .into_iter()
            .map(|(id, subs)| BankGroup {
                id,
                subgroups: subs
                    .into_entries()
                    .into_iter()
                    .map(|(id, records)| SubGroup { id, records })
                    .collect(),
            })
            .collect();
        Self::from_groups(groups)
    }
}

/// One RVE grain group: grain counts of its sub-groups in encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    pub id: String,
    pub sizes: Vec<usize>,
}

impl TargetGroup {
    pub fn new(id: impl Into<String>, sizes: Vec<usize>) -> Self {
        Self {
            id: id.into(),
            sizes,
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetHierarchy {
    groups: Vec<TargetGroup>,
}

impl TargetHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups(groups: impl IntoIterator<Item = TargetGroup>) -> Self {
        let mut hierarchy = Self::new();
        for group in groups {
            hierarchy.insert(group);
        }
        hierarchy
    }

    /// Insert a group; an existing id keeps its position and takes the new sizes.
    pub fn insert(&mut self, group: TargetGroup) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(slot) => slot.sizes = group.sizes,
            None => self.groups.push(group),
        }
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut TargetGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    #[inline]
    pub fn groups(&self) -> &[TargetGroup] {
        &self.groups
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_grains(&self) -> usize {
        self.groups.iter().map(TargetGroup::total).sum()
    }

    pub fn max_subgroups(&self) -> usize {
        self.groups.iter().map(|g| g.sizes.len()).max().unwrap_or(0)
    }
}

impl From<Ordered<Vec<usize>>> for TargetHierarchy {
    fn from(raw: Ordered<Vec<usize>>) -> Self {
        Self::from_groups(
            raw.into_entries()
                .into_iter()
                .map(|(id, sizes)| TargetGroup { id, sizes }),
        )
    }
}

/// Final grain index (1-based) -> orientation mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignedOrientations(BTreeMap<usize, EulerAngles>);

impl AssignedOrientations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grains 1..=n taken from `records` in order.
    pub fn from_sequence(records: impl IntoIterator<Item = EulerAngles>) -> Self {
        Self(
            records
                .into_iter()
                .enumerate()
                .map(|(i, r)| (i + 1, r))
                .collect(),
        )
    }

    /// Returns the previous record if `grain` was already assigned.
    pub fn insert(&mut self, grain: usize, record: EulerAngles) -> Option<EulerAngles> {
        self.0.insert(grain, record)
    }

    #[inline]
    pub fn get(&self, grain: usize) -> Option<&EulerAngles> {
        self.0.get(&grain)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &EulerAngles)> + '_ {
        self.0.iter().map(|(&k, v)| (k, v))
    }

    /// True when the keys are exactly 1..=len.
    pub fn is_contiguous(&self) -> bool {
        self.0.keys().copied().eq(1..=self.0.len())
    }

    /// Records ordered by grain index, or `None` if there is a gap.
    pub fn to_sequence(&self) -> Option<Vec<EulerAngles>> {
        self.is_contiguous().then(|| self.0.values().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(v: f64) -> EulerAngles {
        EulerAngles::new(v, v, v)
    }

    #[test]
    fn push_record_builds_groups_in_order() {
        let mut bank = OrientationBank::new();
        bank.push_record("PAG_2", "PCK_1", e(1.0));
        bank.push_record("PAG_1", "PCK_1", e(2.0));
        bank.push_record("PAG_2", "PCK_1", e(3.0));
        bank.push_record("PAG_2", "PCK_0", e(4.0));

        let ids: Vec<&str> = bank.groups().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["PAG_2", "PAG_1"]);
        assert_eq!(bank.records("PAG_2", "PCK_1").unwrap(), &[e(1.0), e(3.0)]);
        assert_eq!(bank.group("PAG_2").unwrap().total_records(), 3);

        bank.sort_by_id();
        assert_eq!(bank.groups()[0].id, "PAG_1");
        assert_eq!(bank.group("PAG_2").unwrap().subgroups[0].id, "PCK_0");
    }

    #[test]
    fn retain_groups_keeps_lookup_consistent() {
        let mut bank = OrientationBank::new();
        bank.push_record("a", "s", e(1.0));
        bank.push_record("b", "s", e(2.0));
        bank.retain_groups(|g| g.id == "b");
        assert!(bank.group("a").is_none());
        assert_eq!(bank.records("b", "s").unwrap(), &[e(2.0)]);
    }

    #[test]
    fn hierarchy_totals() {
        let h = TargetHierarchy::from_groups([
            TargetGroup::new("G1", vec![3, 2]),
            TargetGroup::new("G2", vec![1, 1, 1]),
        ]);
        assert_eq!(h.total_grains(), 8);
        assert_eq!(h.max_subgroups(), 3);
        assert_eq!(TargetHierarchy::new().max_subgroups(), 0);
    }

    #[test]
    fn contiguity_detects_gaps() {
        let mut map = AssignedOrientations::from_sequence([e(1.0), e(2.0)]);
        assert!(map.is_contiguous());
        assert_eq!(map.to_sequence().unwrap(), vec![e(1.0), e(2.0)]);
        map.insert(4, e(4.0));
        assert!(!map.is_contiguous());
        assert!(map.to_sequence().is_none());
    }
}
