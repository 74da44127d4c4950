use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value covering what the instrument exports hold.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Date/time kept as the text the reader produced.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // Integral floats print without a fraction so "101.0" keys match "101".
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Numeric text is accepted too.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text view used for join and grouping keys. `None` for null cells.
    pub fn as_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// One instrument row of a compound sheet.
#[derive(Debug, Clone)]
pub struct MeasurementRow {
    pub filename: String,
    pub sample_id: String,
    /// `None` when the instrument reported the not-found sentinel or left it blank.
    pub area_ratio: Option<f64>,
    /// Every input cell in column order, including the three above.
    pub cells: Vec<CellValue>,
}

/// One compound sheet of the measurement workbook.
#[derive(Debug, Clone)]
pub struct CompoundTable {
    pub name: String,
    /// Header row of the sheet, in order.
    pub columns: Vec<String>,
    pub rows: Vec<MeasurementRow>,
}

impl CompoundTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Dry weight of one physical sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRow {
    pub filename: String,
    pub sample_wt: Option<f64>,
}

// ---------------------------------------------------------------------------
// Derived tables
// ---------------------------------------------------------------------------

/// A measurement row joined with its sample weight.
#[derive(Debug, Clone)]
pub struct MergedRow {
    pub measurement: MeasurementRow,
    pub sample_wt: Option<f64>,
    /// Weight-normalized value; `None` when either operand is missing.
    pub normalized: Option<f64>,
}

/// Result of joining one compound table against the weight table.
#[derive(Debug, Clone)]
pub struct MergedTable {
    pub compound: String,
    /// Input columns of the compound sheet (the weight and normalized
    /// columns are appended on output).
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
    /// Measurement rows dropped because their Filename had no weight.
    pub unmatched: usize,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mean and sample standard deviation of the normalized value for one
/// Sample ID within one compound.
///
/// `std` is NaN for a group with fewer than two usable values; `count`
/// tells that apart from a genuine NaN-free zero-variance group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub sample_id: String,
    pub mean: f64,
    pub std: f64,
    /// Number of finite normalized values that contributed.
    pub count: usize,
}

/// Ordered group statistics for one compound.
#[derive(Debug, Clone)]
pub struct CompoundSummary {
    pub compound: String,
    pub groups: Vec<GroupSummary>,
}

/// The wide Summary table: one row per Sample ID, a (mean, std) pair per compound.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub sample_ids: Vec<String>,
    pub compounds: Vec<String>,
    /// `values[row][compound] = (mean, std)`.
    pub values: Vec<Vec<(f64, f64)>>,
}

impl SummaryTable {
    /// Number of Sample ID rows.
    pub fn n_groups(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn n_compounds(&self) -> usize {
        self.compounds.len()
    }

    pub fn stats(&self, row: usize, compound: usize) -> (f64, f64) {
        self.values[row][compound]
    }
}
