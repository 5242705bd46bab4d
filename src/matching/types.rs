/// A bank sub-group reduced to its size; position in the list is its rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedSubGroup {
    pub id: String,
    pub count: usize,
}

/// Structural signature of a bank group: (sub-group count, total records).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupSignature {
    pub subgroups: usize,
    pub records: usize,
}

/// Bank groups that survived the structural filter, best signature first,
/// each with its sub-groups ranked by record count (largest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankSummary {
    pub(crate) groups: Vec<(String, Vec<RankedSubGroup>)>,
}

impl BankSummary {
    #[inline]
    pub fn groups(&self) -> &[(String, Vec<RankedSubGroup>)] {
        &self.groups
    }

    pub fn get(&self, bank_group: &str) -> Option<&[RankedSubGroup]> {
        self.groups
            .iter()
            .find(|(id, _)| id == bank_group)
            .map(|(_, subs)| subs.as_slice())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Bank group scored against one target group; higher score = more surplus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub bank_group: String,
    pub score: i64,
}

/// One (target group -> bank group) decision. A run's list of these never
/// names the same bank group twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPair {
    pub target: String,
    pub bank: String,
}

/// Target sub-group with its synthetic label and the global index of its
/// first grain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatSubGroup {
    pub label: String,
    pub count: usize,
    pub first_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatGroup {
    pub target: String,
    /// Sorted by `count`, largest first.
    pub subgroups: Vec<FlatSubGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatHierarchy {
    pub(crate) groups: Vec<FlatGroup>,
}

impl FlatHierarchy {
    #[inline]
    pub fn groups(&self) -> &[FlatGroup] {
        &self.groups
    }

    pub fn get(&self, target: &str) -> Option<&FlatGroup> {
        self.groups.iter().find(|g| g.target == target)
    }
}

/// Record of one bank sub-group grown by resampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub group: String,
    pub subgroup: String,
    pub original: usize,
    pub extended_to: usize,
}

impl Extension {
    /// How many records exist per distinct measured record after extension.
    #[inline]
    pub fn duplication_ratio(&self) -> f64 {
        self.extended_to as f64 / self.original as f64
    }
}
