use rand::Rng;
use std::time::Instant;

use super::assign::assign_orientations;
use super::flatten::flatten_hierarchy;
use super::solve::greedy_match;
use super::summary::summarize_bank;
use super::types::{Extension, MatchPair};
use crate::error::AssignError;
use crate::model::{AssignedOrientations, OrientationBank, TargetHierarchy};
use crate::runtime;

#[derive(Debug)]
pub struct AssignmentOutcome {
    /// In processing (priority) order.
    pub matches: Vec<MatchPair>,
    pub orientations: AssignedOrientations,
    pub extensions: Vec<Extension>,
}

impl AssignmentOutcome {
    /// Extensions whose duplication ratio exceeds `threshold`.
    pub fn heavy_extensions(&self, threshold: f64) -> impl Iterator<Item = &Extension> + '_ {
        self.extensions
            .iter()
            .filter(move |e| e.duplication_ratio() > threshold)
    }
}

/// Match `target` against `bank` and assign one bank orientation per grain.
///
/// The bank is grown in place where a matched sub-group is too small; the
/// caller keeps that growth for the rest of the run.
pub fn run_assignment<R: Rng + ?Sized>(
    bank: &mut OrientationBank,
    target: &TargetHierarchy,
    rng: &mut R,
) -> Result<AssignmentOutcome, AssignError> {
    let t0 = Instant::now();

    let summary = summarize_bank(bank, target)?;
    let matches = greedy_match(target, &summary)?;
    let flat = flatten_hierarchy(target);
    let (orientations, extensions) = assign_orientations(&matches, &flat, &summary, bank, rng)?;

    if orientations.len() != target.total_grains() || !orientations.is_contiguous() {
        return Err(AssignError::Configuration(format!(
            "assigned {} orientations for {} grains",
            orientations.len(),
            target.total_grains()
        )));
    }

    let outcome = AssignmentOutcome {
        matches,
        orientations,
        extensions,
    };

    let threshold = runtime::duplication_warn_ratio();
    for ext in outcome.heavy_extensions(threshold) {
        tracing::warn!(
            group = %ext.group,
            subgroup = %ext.subgroup,
            measured = ext.original,
            extended_to = ext.extended_to,
            ratio = format_args!("{:.2}", ext.duplication_ratio()),
            "heavily duplicated orientation set"
        );
    }

    tracing::info!(
        target_groups = target.groups().len(),
        qualifying_bank_groups = summary.len(),
        grains = outcome.orientations.len(),
        extensions = outcome.extensions.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "orientation assignment done"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EulerAngles, TargetGroup};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn o(n: u32) -> EulerAngles {
        EulerAngles::new(n as f64, 2.0 * n as f64, 3.0 * n as f64)
    }

    fn scenario_bank() -> OrientationBank {
        let mut bank = OrientationBank::new();
        for n in 1..=4 {
            bank.push_record("B1", "s1", o(n));
        }
        for n in 5..=6 {
            bank.push_record("B1", "s2", o(n));
        }
        bank
    }

    fn target(groups: &[(&str, &[usize])]) -> TargetHierarchy {
        TargetHierarchy::from_groups(
            groups
                .iter()
                .map(|(id, sizes)| TargetGroup::new(*id, sizes.to_vec())),
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn fitting_bank_assigns_in_rank_order() {
        let mut bank = scenario_bank();
        let outcome = run_assignment(&mut bank, &target(&[("G1", &[3, 2])]), &mut rng()).unwrap();

        assert_eq!(outcome.matches, vec![MatchPair { target: "G1".into(), bank: "B1".into() }]);
        let got: Vec<(usize, EulerAngles)> =
            outcome.orientations.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(got, vec![(1, o(1)), (2, o(2)), (3, o(3)), (4, o(5)), (5, o(6))]);
        assert!(outcome.extensions.is_empty());
    }

    #[test]
    fn short_bank_subgroup_is_extended() {
        let mut bank = scenario_bank();
        let outcome = run_assignment(&mut bank, &target(&[("G1", &[3, 3])]), &mut rng()).unwrap();

        assert_eq!(outcome.orientations.len(), 6);
        assert!(outcome.orientations.is_contiguous());
        for grain in 1..=3 {
            assert_eq!(outcome.orientations.get(grain), Some(&o(grain as u32)));
        }
        assert_eq!(outcome.orientations.get(4), Some(&o(5)));
        assert_eq!(outcome.orientations.get(5), Some(&o(6)));
        let dup = *outcome.orientations.get(6).unwrap();
        assert!(dup == o(5) || dup == o(6));

        assert_eq!(outcome.extensions.len(), 1);
        assert_eq!(outcome.extensions[0].subgroup, "s2");
        assert_eq!(bank.records("B1", "s2").unwrap().len(), 3);
        assert_eq!(outcome.heavy_extensions(1.2).count(), 1);
        assert_eq!(outcome.heavy_extensions(2.0).count(), 0);
    }

    #[test]
    fn tied_groups_resolve_in_declaration_order() {
        let mut bank = OrientationBank::new();
        for b in ["B1", "B2"] {
            for n in 1..=3 {
                bank.push_record(b, "s1", o(n));
                bank.push_record(b, "s2", o(n + 10));
            }
        }
        let outcome =
            run_assignment(&mut bank, &target(&[("Ga", &[2, 2]), ("Gb", &[2, 2])]), &mut rng())
                .unwrap();
        assert_eq!(outcome.matches[0], MatchPair { target: "Ga".into(), bank: "B1".into() });
        assert_eq!(outcome.matches[1], MatchPair { target: "Gb".into(), bank: "B2".into() });
        assert_eq!(outcome.orientations.len(), 8);
    }

    #[test]
    fn empty_hierarchy_produces_nothing() {
        let mut bank = scenario_bank();
        let err = run_assignment(&mut bank, &TargetHierarchy::new(), &mut rng()).unwrap_err();
        assert!(matches!(err, AssignError::Configuration(_)));
        assert_eq!(bank.records("B1", "s2").unwrap().len(), 2);
    }

    #[test]
    fn too_many_subgroups_exhausts_with_group_id() {
        let mut bank = scenario_bank();
        let err = run_assignment(&mut bank, &target(&[("G1", &[1, 1, 1])]), &mut rng()).unwrap_err();
        match err {
            AssignError::MatchExhaustion { target, .. } => assert_eq!(target, "G1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn coverage_spans_every_grain_across_groups() {
        let mut bank = OrientationBank::new();
        for (g, sizes) in [("P1", [5usize, 3, 2]), ("P2", [2, 2, 2]), ("P3", [4, 1, 1])] {
            for (s, &n) in sizes.iter().enumerate() {
                for k in 0..n {
                    bank.push_record(g, &format!("c{s}"), o(k as u32));
                }
            }
        }
        let tgt = target(&[("A", &[2, 6]), ("B", &[1, 1, 1]), ("C", &[3, 3, 3])]);
        let outcome = run_assignment(&mut bank, &tgt, &mut rng()).unwrap();
        assert_eq!(outcome.orientations.len(), tgt.total_grains());
        assert!(outcome.orientations.is_contiguous());

        let chosen: std::collections::HashSet<&str> =
            outcome.matches.iter().map(|m| m.bank.as_str()).collect();
        assert_eq!(chosen.len(), 3);
    }
}
