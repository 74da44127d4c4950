use std::collections::HashMap;

use super::model::{CompoundSummary, GroupSummary, SummaryTable};
use crate::error::{ReportError, Result};

/// Join per-compound group statistics into the wide Summary table.
///
/// The first compound fixes the Sample ID rows and their order. Every other
/// compound must report exactly the same Sample IDs in the same order;
/// values are still looked up by Sample ID, never by position.
pub fn assemble(summaries: &[CompoundSummary]) -> Result<SummaryTable> {
    let Some(reference) = summaries.first() else {
        return Ok(SummaryTable {
            sample_ids: Vec::new(),
            compounds: Vec::new(),
            values: Vec::new(),
        });
    };
    let sample_ids: Vec<String> = reference.groups.iter().map(|g| g.sample_id.clone()).collect();

    let mut by_compound: Vec<HashMap<&str, &GroupSummary>> = Vec::with_capacity(summaries.len());
    for summary in summaries {
        check_alignment(reference, summary)?;
        by_compound.push(
            summary
                .groups
                .iter()
                .map(|g| (g.sample_id.as_str(), g))
                .collect(),
        );
    }

    let values = sample_ids
        .iter()
        .map(|id| {
            by_compound
                .iter()
                .map(|groups| {
                    groups
                        .get(id.as_str())
                        .map(|g| (g.mean, g.std))
                        .unwrap_or((f64::NAN, f64::NAN))
                })
                .collect()
        })
        .collect();

    Ok(SummaryTable {
        sample_ids,
        compounds: summaries.iter().map(|s| s.compound.clone()).collect(),
        values,
    })
}

fn check_alignment(reference: &CompoundSummary, other: &CompoundSummary) -> Result<()> {
    let fail = |detail: String| ReportError::Alignment {
        compound: other.compound.clone(),
        reference: reference.compound.clone(),
        detail,
    };

    let ref_ids: Vec<&str> = reference.groups.iter().map(|g| g.sample_id.as_str()).collect();
    let ids: Vec<&str> = other.groups.iter().map(|g| g.sample_id.as_str()).collect();

    let missing: Vec<&str> = ref_ids.iter().filter(|id| !ids.contains(*id)).copied().collect();
    let extra: Vec<&str> = ids.iter().filter(|id| !ref_ids.contains(*id)).copied().collect();
    if !missing.is_empty() || !extra.is_empty() {
        return Err(fail(format!(
            "missing Sample IDs {missing:?}, unexpected Sample IDs {extra:?}"
        )));
    }
    if ids != ref_ids {
        return Err(fail(format!(
            "Sample IDs appear in order {ids:?}, expected {ref_ids:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(compound: &str, groups: &[(&str, f64, f64)]) -> CompoundSummary {
        CompoundSummary {
            compound: compound.to_string(),
            groups: groups
                .iter()
                .map(|&(id, mean, std)| GroupSummary {
                    sample_id: id.to_string(),
                    mean,
                    std,
                    count: 2,
                })
                .collect(),
        }
    }

    #[test]
    fn wide_table_has_a_pair_per_compound() {
        let table = assemble(&[
            summary("Caffeine", &[("Ctrl", 1.0, 0.1), ("Dose", 2.0, 0.2)]),
            summary("Theobromine", &[("Ctrl", 3.0, 0.3), ("Dose", 4.0, f64::NAN)]),
        ])
        .unwrap();
        assert_eq!(table.sample_ids, vec!["Ctrl", "Dose"]);
        assert_eq!(table.compounds, vec!["Caffeine", "Theobromine"]);
        assert_eq!(table.n_groups(), 2);
        assert_eq!(table.stats(0, 1), (3.0, 0.3));
        assert_eq!(table.stats(1, 0), (2.0, 0.2));
        assert!(table.stats(1, 1).1.is_nan());
    }

    #[test]
    fn differing_sample_sets_are_an_alignment_error() {
        let err = assemble(&[
            summary("Caffeine", &[("Ctrl", 1.0, 0.1), ("Dose", 2.0, 0.2)]),
            summary("Theobromine", &[("Ctrl", 3.0, 0.3), ("High", 4.0, 0.4)]),
        ])
        .unwrap_err();
        match err {
            ReportError::Alignment { compound, reference, detail } => {
                assert_eq!(compound, "Theobromine");
                assert_eq!(reference, "Caffeine");
                assert!(detail.contains("Dose"));
                assert!(detail.contains("High"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn differing_order_is_an_alignment_error() {
        let err = assemble(&[
            summary("Caffeine", &[("Ctrl", 1.0, 0.1), ("Dose", 2.0, 0.2)]),
            summary("Theobromine", &[("Dose", 4.0, 0.4), ("Ctrl", 3.0, 0.3)]),
        ])
        .unwrap_err();
        assert!(matches!(err, ReportError::Alignment { .. }));
    }

    #[test]
    fn no_compounds_gives_empty_table() {
        let table = assemble(&[]).unwrap();
        assert_eq!(table.n_groups(), 0);
        assert_eq!(table.n_compounds(), 0);
    }
}
