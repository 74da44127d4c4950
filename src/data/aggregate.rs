use std::collections::HashMap;

use super::model::{CompoundSummary, GroupSummary, MergedTable};

/// Group the normalized values of a merged table by Sample ID.
///
/// Groups come out in order of first appearance. Rows without a Sample ID
/// are left out; null and non-finite normalized values are skipped inside
/// a group. A group keeps its place even if none of its values are usable,
/// in which case both statistics are NaN.
pub fn aggregate(table: &MergedTable) -> CompoundSummary {
    let groups = group_values(table)
        .into_iter()
        .map(|(sample_id, vals)| {
            if vals.len() < 2 {
                log::debug!(
                    "'{}': group '{sample_id}' has {} usable value(s), std is undefined",
                    table.compound,
                    vals.len()
                );
            }
            GroupSummary {
                mean: mean(&vals),
                std: sample_std(&vals),
                count: vals.len(),
                sample_id,
            }
        })
        .collect();

    CompoundSummary {
        compound: table.compound.clone(),
        groups,
    }
}

/// Finite normalized values per Sample ID, groups in first-seen order.
pub fn group_values(table: &MergedTable) -> Vec<(String, Vec<f64>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();

    for row in &table.rows {
        let key = row.measurement.sample_id.as_str();
        if key.is_empty() {
            continue;
        }
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), Vec::new()));
            groups.len() - 1
        });
        if let Some(v) = row.normalized.filter(|v| v.is_finite()) {
            groups[slot].1.push(v);
        }
    }
    groups
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator); NaN below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{MeasurementRow, MergedRow};

    fn merged(rows: &[(&str, Option<f64>)]) -> MergedTable {
        MergedTable {
            compound: "Caffeine".into(),
            columns: vec![],
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, (id, v))| MergedRow {
                    measurement: MeasurementRow {
                        filename: format!("{i}.raw"),
                        sample_id: id.to_string(),
                        area_ratio: *v,
                        cells: vec![],
                    },
                    sample_wt: Some(1.0),
                    normalized: *v,
                })
                .collect(),
            unmatched: 0,
        }
    }

    fn ids(summary: &CompoundSummary) -> Vec<&str> {
        summary.groups.iter().map(|g| g.sample_id.as_str()).collect()
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let s = aggregate(&merged(&[
            ("Zeta", Some(1.0)),
            ("Alpha", Some(2.0)),
            ("Zeta", Some(3.0)),
            ("Mid", Some(4.0)),
            ("Alpha", Some(6.0)),
        ]));
        assert_eq!(ids(&s), vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(s.groups[0].mean, 2.0);
        assert_eq!(s.groups[1].mean, 4.0);
    }

    #[test]
    fn order_follows_every_permutation_of_rows() {
        let rows = [("B", Some(1.0)), ("A", Some(2.0)), ("C", Some(3.0))];
        let perms = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for p in perms {
            let permuted: Vec<_> = p.iter().map(|&i| rows[i]).collect();
            let expected: Vec<&str> = permuted.iter().map(|(id, _)| *id).collect();
            assert_eq!(ids(&aggregate(&merged(&permuted))), expected);
        }
    }

    #[test]
    fn sample_standard_deviation_uses_n_minus_one() {
        let s = aggregate(&merged(&[("A", Some(2.0)), ("A", Some(4.0)), ("A", Some(6.0))]));
        assert_eq!(s.groups[0].mean, 4.0);
        assert!((s.groups[0].std - 2.0).abs() < 1e-12);
        assert_eq!(s.groups[0].count, 3);
    }

    #[test]
    fn single_member_group_has_nan_std_unlike_zero_variance() {
        let s = aggregate(&merged(&[("One", Some(5.0)), ("Flat", Some(3.0)), ("Flat", Some(3.0))]));
        let one = &s.groups[0];
        let flat = &s.groups[1];
        assert_eq!(one.mean, 5.0);
        assert!(one.std.is_nan());
        assert_eq!(one.count, 1);
        assert_eq!(flat.std, 0.0);
        assert_eq!(flat.count, 2);
    }

    #[test]
    fn null_values_are_skipped_but_group_survives() {
        let s = aggregate(&merged(&[
            ("A", None),
            ("B", Some(1.0)),
            ("A", Some(f64::INFINITY)),
            ("", Some(9.0)),
        ]));
        assert_eq!(ids(&s), vec!["A", "B"]);
        assert!(s.groups[0].mean.is_nan());
        assert_eq!(s.groups[0].count, 0);
    }
}
