//! Dataset loading and cleaning using Polars (CSV) and Calamine (xlsx)

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::category::{categorize_value, PerformanceCategory};
use crate::error::PipelineError;

/// Name of the derived label column.
pub const PERFORMANCE_COLUMN: &str = "Performance_Category";
/// Name of the derived cluster id column.
pub const CLUSTER_COLUMN: &str = "Cluster";

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Numeric reading of the cell. Text is parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<PerformanceCategory> {
        self.as_str().and_then(PerformanceCategory::from_label)
    }

    /// Loose boolean reading used by flag-style columns (`co_curricular`).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "y" | "1"
            ),
            Value::Missing => false,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Total order used for mode selection: numbers before text.
    fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Number(_), _) => Ordering::Less,
            (_, Value::Number(_)) => Ordering::Greater,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), Value::Missing) => Ordering::Less,
            (Value::Missing, Value::Text(_)) => Ordering::Greater,
            (Value::Missing, Value::Missing) => Ordering::Equal,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Missing => f.write_str(""),
        }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor for fully numeric columns.
    pub fn numeric(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(Value::Number).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most frequent non-missing value. Ties resolve to the smallest value.
    pub fn mode(&self) -> Option<Value> {
        let mut present: Vec<&Value> = self.values.iter().filter(|v| !v.is_missing()).collect();
        present.sort_by(|a, b| a.total_cmp(b));

        let mut best: Option<(&Value, usize)> = None;
        let mut idx = 0;
        while idx < present.len() {
            let run_start = idx;
            while idx < present.len() && present[idx].total_cmp(present[run_start]) == Ordering::Equal {
                idx += 1;
            }
            let run = idx - run_start;
            if best.map_or(true, |(_, count)| run > count) {
                best = Some((present[run_start], run));
            }
        }
        best.map(|(value, _)| value.clone())
    }

    fn fill_missing(&mut self, fill: &Value) -> usize {
        let mut filled = 0;
        for value in self.values.iter_mut().filter(|v| v.is_missing()) {
            *value = fill.clone();
            filled += 1;
        }
        filled
    }
}

/// Columns the pipeline knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Age,
    CurrentSemester,
    Attendance,
    CreditsCompleted,
    CurrentCgpa,
    StudyHours,
    CoCurricular,
    PerformanceCategory,
    Cluster,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Age,
        Field::CurrentSemester,
        Field::Attendance,
        Field::CreditsCompleted,
        Field::CurrentCgpa,
        Field::StudyHours,
        Field::CoCurricular,
        Field::PerformanceCategory,
        Field::Cluster,
    ];

    /// Column header this field is read from.
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::CurrentSemester => "current_semester",
            Field::Attendance => "attendance",
            Field::CreditsCompleted => "credits_completed",
            Field::CurrentCgpa => "current_cgpa",
            Field::StudyHours => "study_hours",
            Field::CoCurricular => "co_curricular",
            Field::PerformanceCategory => PERFORMANCE_COLUMN,
            Field::Cluster => CLUSTER_COLUMN,
        }
    }

    pub fn from_column_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Which known fields a dataset supplies. Rebuilt whenever columns change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeSet<Field>,
}

impl Schema {
    fn from_columns(columns: &[Column]) -> Self {
        Self {
            fields: columns
                .iter()
                .filter_map(|c| Field::from_column_name(c.name()))
                .collect(),
        }
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// The subset of `wanted` present in the dataset, keeping `wanted`'s order.
    pub fn available(&self, wanted: &[Field]) -> Vec<Field> {
        wanted.iter().copied().filter(|f| self.has(*f)).collect()
    }
}

/// Supported tabular source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" | "xls" => Some(SourceFormat::Xlsx),
            _ => None,
        }
    }
}

/// Cleaned, rectangular student table.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
    schema: Schema,
}

impl Dataset {
    /// Build a dataset from raw columns, validating that the table is rectangular.
    ///
    /// No cleaning happens here; see [`Dataset::clean`].
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, PipelineError> {
        Self::validated(columns, Path::new("<memory>"))
    }

    fn validated(columns: Vec<Column>, origin: &Path) -> Result<Self, PipelineError> {
        if columns.is_empty() {
            return Err(PipelineError::data_load(origin, "source has no columns"));
        }
        let n_rows = columns[0].len();
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.len() != n_rows {
                return Err(PipelineError::data_load(
                    origin,
                    format!(
                        "column '{}' has {} rows, expected {}",
                        column.name(),
                        column.len(),
                        n_rows
                    ),
                ));
            }
            if !seen.insert(column.name().to_string()) {
                return Err(PipelineError::data_load(
                    origin,
                    format!("duplicate column '{}'", column.name()),
                ));
            }
        }
        let schema = Schema::from_columns(&columns);
        Ok(Self {
            columns,
            n_rows,
            schema,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn field(&self, field: Field) -> Option<&Column> {
        self.column(field.column_name())
    }

    pub fn last_column(&self) -> Option<&Column> {
        self.columns.last()
    }

    /// Replace the column with the same name, or append it.
    pub(crate) fn set_column(&mut self, column: Column) {
        debug_assert_eq!(column.len(), self.n_rows);
        match self.columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self.schema = Schema::from_columns(&self.columns);
    }

    /// Numeric matrix of `fields` (rows x fields). Cells without a numeric
    /// reading are filled with their column's median, or 0 when the column
    /// has no numeric cells at all. Also returns the medians used.
    pub fn median_filled(&self, fields: &[Field]) -> (Array2<f64>, Vec<f64>) {
        let mut matrix = Array2::zeros((self.n_rows, fields.len()));
        let mut medians = Vec::with_capacity(fields.len());

        for (j, field) in fields.iter().enumerate() {
            let cells: Vec<Option<f64>> = match self.field(*field) {
                Some(column) => column.values().iter().map(Value::as_f64).collect(),
                None => vec![None; self.n_rows],
            };
            let mut present: Vec<f64> = cells.iter().flatten().copied().collect();
            let fill = median(&mut present).unwrap_or(0.0);
            for (i, cell) in cells.iter().enumerate() {
                matrix[[i, j]] = cell.unwrap_or(fill);
            }
            medians.push(fill);
        }
        (matrix, medians)
    }

    /// Fill each column's missing cells with its mode (numeric 0 when no
    /// mode exists), then derive `Performance_Category` from `current_cgpa`.
    pub fn clean(mut self) -> Self {
        for column in &mut self.columns {
            let fill = column.mode().unwrap_or(Value::Number(0.0));
            let filled = column.fill_missing(&fill);
            if filled > 0 {
                debug!("Filled {} missing cells in '{}' with {}", filled, column.name, fill);
            }
        }

        if let Some(gpa) = self.field(Field::CurrentCgpa) {
            let labels = gpa
                .values()
                .iter()
                .map(|v| Value::Text(categorize_value(v).as_str().to_string()))
                .collect();
            self.set_column(Column::new(PERFORMANCE_COLUMN, labels));
        }
        self
    }
}

/// Median of `values`; the mean of the two middle values for even lengths.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Load a tabular file and clean it.
///
/// # Arguments
/// * `path` - CSV or xlsx file
/// * `format` - Force a format; inferred from the extension when `None`
///
/// # Returns
/// * Cleaned `Dataset` with the derived `Performance_Category` column when
///   `current_cgpa` is present
pub fn load(path: impl AsRef<Path>, format: Option<SourceFormat>) -> Result<Dataset, PipelineError> {
    let path = path.as_ref();
    let format = format
        .or_else(|| SourceFormat::from_path(path))
        .ok_or_else(|| PipelineError::data_load(path, "unsupported file format (expected .csv or .xlsx)"))?;

    let columns = match format {
        SourceFormat::Csv => read_csv(path)?,
        SourceFormat::Xlsx => read_xlsx(path)?,
    };
    let dataset = Dataset::validated(columns, path)?.clean();

    info!(
        "Loaded {} rows x {} columns from {}",
        dataset.n_rows(),
        dataset.n_columns(),
        path.display()
    );
    Ok(dataset)
}

fn read_csv(path: &Path) -> Result<Vec<Column>, PipelineError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .and_then(|reader| reader.finish())
        .map_err(|e| PipelineError::data_load(path, e))?;

    df.get_columns()
        .iter()
        .map(|series| {
            series_to_values(series)
                .map(|values| Column::new(series.name(), values))
                .map_err(|e| PipelineError::data_load(path, e))
        })
        .collect()
}

/// Convert a Polars series into cells; NaN and nulls become `Missing`.
fn series_to_values(series: &Series) -> PolarsResult<Vec<Value>> {
    if series.dtype().is_numeric() {
        let floats = series.cast(&DataType::Float64)?;
        Ok(floats
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(n) if !n.is_nan() => Value::Number(n),
                _ => Value::Missing,
            })
            .collect())
    } else {
        let text = series.cast(&DataType::String)?;
        Ok(text
            .str()?
            .into_iter()
            .map(|v| match v {
                Some(s) if !s.trim().is_empty() => Value::Text(s.to_string()),
                _ => Value::Missing,
            })
            .collect())
    }
}

fn read_xlsx(path: &Path) -> Result<Vec<Column>, PipelineError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| PipelineError::data_load(path, e))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PipelineError::data_load(path, "workbook has no worksheets"))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| PipelineError::data_load(path, e))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) if !range.is_empty() => header,
        _ => return Err(PipelineError::data_load(path, "worksheet is empty")),
    };
    let mut columns: Vec<Column> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| Column::new(header_name(idx, cell), Vec::new()))
        .collect();

    for row in rows {
        for (idx, column) in columns.iter_mut().enumerate() {
            let value = row.get(idx).map(cell_to_value).unwrap_or(Value::Missing);
            column.values.push(value);
        }
    }
    Ok(columns)
}

/// Header text of a cell; blank headers are named by position.
fn header_name(idx: usize, cell: &Data) -> String {
    let name = cell.to_string();
    let name = name.trim();
    if name.is_empty() {
        format!("column_{}", idx)
    } else {
        name.to_string()
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) if !f.is_nan() => Value::Number(*f),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::String(s) if !s.trim().is_empty() => Value::Text(s.clone()),
        Data::Empty | Data::Error(_) | Data::Float(_) | Data::String(_) => Value::Missing,
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "student_id,age,attendance,current_cgpa,gender").unwrap();
        writeln!(file, "1,20,90,3.6,F").unwrap();
        writeln!(file, "2,21,,3.1,M").unwrap();
        writeln!(file, "3,,75,2.7,").unwrap();
        writeln!(file, "4,20,75,abc,F").unwrap();
        writeln!(file, "5,22,60,,F").unwrap();
        file
    }

    #[test]
    fn test_load_fills_with_mode() {
        let test_file = create_test_csv();
        let dataset = load(test_file.path(), None).unwrap();

        assert_eq!(dataset.n_rows(), 5);
        let attendance = dataset.field(Field::Attendance).unwrap();
        assert_eq!(attendance.values()[1], Value::Number(75.0));
        let age = dataset.field(Field::Age).unwrap();
        assert_eq!(age.values()[2], Value::Number(20.0));
        let gender = dataset.column("gender").unwrap();
        assert_eq!(gender.values()[2], Value::Text("F".to_string()));
        assert!(dataset.columns().iter().all(|c| c.values().iter().all(|v| !v.is_missing())));
    }

    #[test]
    fn test_load_derives_performance_category() {
        let test_file = create_test_csv();
        let dataset = load(test_file.path(), None).unwrap();

        assert!(dataset.schema().has(Field::PerformanceCategory));
        let labels: Vec<_> = dataset
            .field(Field::PerformanceCategory)
            .unwrap()
            .values()
            .iter()
            .map(|v| v.as_category().unwrap())
            .collect();
        assert_eq!(labels[0], PerformanceCategory::Distinction);
        assert_eq!(labels[1], PerformanceCategory::FirstClass);
        assert_eq!(labels[2], PerformanceCategory::SecondClass);
        assert_eq!(labels[3], PerformanceCategory::Pass);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let err = load(file.path(), None).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }

    #[test]
    fn test_load_rejects_missing_file() {
        let err = load("/nonexistent/students.csv", None).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }

    #[test]
    fn test_mode_tie_prefers_smallest() {
        let column = Column::numeric("x", &[3.0, 1.0, 3.0, 1.0, 2.0]);
        assert_eq!(column.mode(), Some(Value::Number(1.0)));

        let empty = Column::new("y", vec![Value::Missing, Value::Missing]);
        assert_eq!(empty.mode(), None);
    }

    #[test]
    fn test_clean_without_mode_fills_zero() {
        let dataset = Dataset::from_columns(vec![
            Column::numeric("attendance", &[80.0, 90.0]),
            Column::new("notes", vec![Value::Missing, Value::Missing]),
        ])
        .unwrap()
        .clean();
        assert_eq!(dataset.column("notes").unwrap().values()[0], Value::Number(0.0));
        assert!(!dataset.schema().has(Field::PerformanceCategory));
    }

    #[test]
    fn test_from_columns_rejects_ragged_table() {
        let result = Dataset::from_columns(vec![
            Column::numeric("a", &[1.0, 2.0]),
            Column::numeric("b", &[1.0]),
        ]);
        assert!(result.is_err());
        assert!(Dataset::from_columns(Vec::new()).is_err());
    }

    #[test]
    fn test_schema_available_keeps_order() {
        let dataset = Dataset::from_columns(vec![
            Column::numeric("attendance", &[1.0]),
            Column::numeric("age", &[1.0]),
        ])
        .unwrap();
        let available = dataset
            .schema()
            .available(&[Field::Age, Field::CurrentSemester, Field::Attendance]);
        assert_eq!(available, vec![Field::Age, Field::Attendance]);
    }

    #[test]
    fn test_median_filled_matrix() {
        let dataset = Dataset::from_columns(vec![
            Column::new(
                "age",
                vec![
                    Value::Number(20.0),
                    Value::Text("n/a".to_string()),
                    Value::Number(24.0),
                    Value::Number(21.0),
                ],
            ),
            Column::numeric("attendance", &[80.0, 90.0, 70.0, 60.0]),
        ])
        .unwrap();
        let (matrix, medians) = dataset.median_filled(&[Field::Attendance, Field::Age]);

        assert_eq!(matrix.shape(), &[4, 2]);
        assert_eq!(medians, vec![75.0, 21.0]);
        assert_eq!(matrix[[1, 1]], 21.0);
        assert_eq!(matrix[[3, 0]], 60.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    fn create_test_xlsx(write: impl FnOnce(&mut Worksheet) -> Result<(), XlsxError>) -> NamedTempFile {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = Workbook::new();
        write(workbook.add_worksheet()).unwrap();
        workbook.save(file.path()).unwrap();
        file
    }

    #[test]
    fn test_load_xlsx() {
        let test_file = create_test_xlsx(|sheet| {
            for (col, name) in ["age", "attendance", "current_cgpa", "co_curricular"].iter().enumerate() {
                sheet.write_string(0, col as u16, *name)?;
            }
            let rows: [(f64, Option<f64>, f64, bool); 4] = [
                (20.0, Some(90.0), 3.6, true),
                (21.0, None, 3.1, false),
                (22.0, Some(75.0), 2.7, true),
                (20.0, Some(75.0), 2.0, true),
            ];
            for (i, (age, attendance, cgpa, flag)) in rows.iter().enumerate() {
                let row = i as u32 + 1;
                sheet.write_number(row, 0, *age)?;
                if let Some(attendance) = attendance {
                    sheet.write_number(row, 1, *attendance)?;
                }
                sheet.write_number(row, 2, *cgpa)?;
                sheet.write_boolean(row, 3, *flag)?;
            }
            // Short final row: only age is present.
            sheet.write_number(5, 0, 23.0)?;
            Ok(())
        });

        let dataset = load(test_file.path(), None).unwrap();
        assert_eq!(dataset.n_rows(), 5);
        assert_eq!(
            dataset.column_names(),
            vec!["age", "attendance", "current_cgpa", "co_curricular", PERFORMANCE_COLUMN]
        );

        let attendance = dataset.field(Field::Attendance).unwrap();
        assert_eq!(attendance.values()[1], Value::Number(75.0));
        assert_eq!(attendance.values()[4], Value::Number(75.0));

        let flags = dataset.field(Field::CoCurricular).unwrap();
        assert_eq!(flags.values()[0], Value::Text("true".to_string()));
        assert!(flags.values()[0].is_truthy());
        assert!(!flags.values()[1].is_truthy());
        // Missing flag filled with the mode.
        assert_eq!(flags.values()[4], Value::Text("true".to_string()));

        let labels: Vec<_> = dataset
            .field(Field::PerformanceCategory)
            .unwrap()
            .values()
            .iter()
            .map(|v| v.as_category().unwrap())
            .collect();
        assert_eq!(
            labels,
            vec![
                PerformanceCategory::Distinction,
                PerformanceCategory::FirstClass,
                PerformanceCategory::SecondClass,
                PerformanceCategory::Pass,
                // Missing GPA filled with the smallest of the tied modes.
                PerformanceCategory::Pass,
            ]
        );
    }

    #[test]
    fn test_load_xlsx_names_blank_headers() {
        let test_file = create_test_xlsx(|sheet| {
            sheet.write_string(0, 0, "attendance")?;
            for row in 1..3u32 {
                for col in 0..3u16 {
                    sheet.write_number(row, col, f64::from(row) * 10.0 + f64::from(col))?;
                }
            }
            Ok(())
        });

        let dataset = load(test_file.path(), Some(SourceFormat::Xlsx)).unwrap();
        assert_eq!(dataset.column_names(), vec!["attendance", "column_1", "column_2"]);
        assert_eq!(dataset.column("column_2").unwrap().values()[1], Value::Number(22.0));
    }

    #[test]
    fn test_load_empty_xlsx() {
        let test_file = create_test_xlsx(|_| Ok(()));
        let err = load(test_file.path(), None).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
        assert!(err.to_string().contains("worksheet is empty"));
    }

    #[test]
    fn test_cell_to_value() {
        assert_eq!(cell_to_value(&Data::Int(3)), Value::Number(3.0));
        assert_eq!(cell_to_value(&Data::Float(2.5)), Value::Number(2.5));
        assert_eq!(cell_to_value(&Data::Float(f64::NAN)), Value::Missing);
        assert_eq!(cell_to_value(&Data::Bool(false)), Value::Text("false".to_string()));
        assert_eq!(cell_to_value(&Data::String("  ".to_string())), Value::Missing);
        assert_eq!(cell_to_value(&Data::Empty), Value::Missing);
        assert_eq!(
            cell_to_value(&Data::Error(calamine::CellErrorType::Div0)),
            Value::Missing
        );
        assert_eq!(header_name(4, &Data::Empty), "column_4");
        assert_eq!(header_name(0, &Data::String(" age ".to_string())), "age");
    }

    #[test]
    fn test_truthy_values() {
        assert!(Value::Text("Yes".to_string()).is_truthy());
        assert!(Value::Number(1.0).is_truthy());
        assert!(!Value::Text("no".to_string()).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
    }
}
