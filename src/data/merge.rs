use std::collections::HashMap;

use super::model::{CompoundTable, MergedRow, MergedTable, WeightRow};
use crate::config::NormalizationParams;
use crate::error::{ReportError, Result};

/// Filename → Sample wt lookup with the uniqueness of Filename enforced.
#[derive(Debug, Clone)]
pub struct WeightIndex {
    weights: HashMap<String, Option<f64>>,
}

impl WeightIndex {
    /// Index the weight table by Filename.
    ///
    /// A Filename listed more than once makes the join ambiguous and is
    /// rejected, even when the repeated weights agree.
    pub fn build(rows: &[WeightRow]) -> Result<Self> {
        let mut counts: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
        for row in rows {
            *counts.entry(row.filename.as_str()).or_default() += 1;
        }
        // Report the first duplicate in table order so the message is stable.
        if let Some(dup) = rows.iter().find(|r| counts[r.filename.as_str()] > 1) {
            return Err(ReportError::Join {
                filename: dup.filename.clone(),
                count: counts[dup.filename.as_str()],
            });
        }

        let weights = rows
            .iter()
            .map(|r| (r.filename.clone(), r.sample_wt))
            .collect();
        Ok(Self { weights })
    }

    /// `None` when the Filename is absent; `Some(None)` when present with no weight.
    pub fn get(&self, filename: &str) -> Option<Option<f64>> {
        self.weights.get(filename).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Inner-join one compound table with the weight table on Filename and
/// compute the normalized value per row.
///
/// Row order of the compound table is preserved. Rows whose Filename has
/// no weight are dropped and counted in [`MergedTable::unmatched`].
pub fn merge(table: &CompoundTable, weights: &WeightIndex, params: &NormalizationParams) -> MergedTable {
    let mut rows = Vec::with_capacity(table.len());
    let mut unmatched = 0;

    for row in &table.rows {
        let Some(sample_wt) = weights.get(&row.filename) else {
            unmatched += 1;
            continue;
        };
        let normalized = match (row.area_ratio, sample_wt) {
            (Some(ratio), Some(wt)) => Some(params.normalize(ratio, wt)),
            _ => None,
        };
        rows.push(MergedRow {
            measurement: row.clone(),
            sample_wt,
            normalized,
        });
    }

    if unmatched > 0 {
        log::warn!(
            "'{}': {unmatched} of {} rows have no matching weight and were dropped",
            table.name,
            table.len()
        );
    }

    MergedTable {
        compound: table.name.clone(),
        columns: table.columns.clone(),
        rows,
        unmatched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, MeasurementRow};

    fn measurement(filename: &str, sample_id: &str, ratio: Option<f64>) -> MeasurementRow {
        MeasurementRow {
            filename: filename.to_string(),
            sample_id: sample_id.to_string(),
            area_ratio: ratio,
            cells: vec![
                CellValue::String(filename.to_string()),
                CellValue::String(sample_id.to_string()),
                ratio.map(CellValue::Float).unwrap_or(CellValue::Null),
            ],
        }
    }

    fn table(rows: Vec<MeasurementRow>) -> CompoundTable {
        CompoundTable {
            name: "Caffeine".into(),
            columns: vec!["Filename".into(), "Sample ID".into(), "Area Ratio".into()],
            rows,
        }
    }

    fn weight(filename: &str, wt: f64) -> WeightRow {
        WeightRow {
            filename: filename.to_string(),
            sample_wt: Some(wt),
        }
    }

    #[test]
    fn ratio_formula() {
        let idx = WeightIndex::build(&[weight("a.raw", 2.0)]).unwrap();
        let merged = merge(
            &table(vec![measurement("a.raw", "Ctrl", Some(10.0))]),
            &idx,
            &NormalizationParams::ratio(),
        );
        assert_eq!(merged.rows[0].normalized, Some(5.0));
        assert_eq!(merged.rows[0].sample_wt, Some(2.0));
    }

    #[test]
    fn scaled_formula() {
        let idx = WeightIndex::build(&[weight("a.raw", 2.0)]).unwrap();
        let merged = merge(
            &table(vec![measurement("a.raw", "Ctrl", Some(10.0))]),
            &idx,
            &NormalizationParams::scaled(100.0),
        );
        assert_eq!(merged.rows[0].normalized, Some(500_000.0));
    }

    #[test]
    fn inner_join_drops_and_counts_unmatched_rows() {
        let idx = WeightIndex::build(&[weight("a.raw", 1.0), weight("c.raw", 4.0), weight("z.raw", 9.0)])
            .unwrap();
        let merged = merge(
            &table(vec![
                measurement("a.raw", "Ctrl", Some(1.0)),
                measurement("b.raw", "Ctrl", Some(1.0)),
                measurement("c.raw", "Dose", Some(8.0)),
                measurement("d.raw", "Dose", Some(1.0)),
            ]),
            &idx,
            &NormalizationParams::ratio(),
        );
        let names: Vec<_> = merged.rows.iter().map(|r| r.measurement.filename.as_str()).collect();
        assert_eq!(names, vec!["a.raw", "c.raw"]);
        assert_eq!(merged.unmatched, 2);
        assert_eq!(merged.rows[1].normalized, Some(2.0));
    }

    #[test]
    fn duplicate_filename_in_weights_is_a_join_error() {
        let err = WeightIndex::build(&[weight("a.raw", 1.0), weight("b.raw", 2.0), weight("a.raw", 3.0)])
            .unwrap_err();
        match err {
            ReportError::Join { filename, count } => {
                assert_eq!(filename, "a.raw");
                assert_eq!(count, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_operands_give_null_normalized_value() {
        let idx = WeightIndex::build(&[
            weight("a.raw", 2.0),
            WeightRow {
                filename: "b.raw".into(),
                sample_wt: None,
            },
        ])
        .unwrap();
        let merged = merge(
            &table(vec![measurement("a.raw", "Ctrl", None), measurement("b.raw", "Ctrl", Some(1.0))]),
            &idx,
            &NormalizationParams::ratio(),
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.unmatched, 0);
        assert!(merged.rows.iter().all(|r| r.normalized.is_none()));
    }
}
