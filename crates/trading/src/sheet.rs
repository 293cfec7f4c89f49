//! Spreadsheet import/export.
//!
//! Uploads arrive as CSV or Excel bytes. Both are read into [`Row`]s keyed by
//! a normalized header (`"Lot No"` becomes `lot_no`), then each row is turned
//! into record details via [`FromRow`]. Every bad row is reported, not just
//! the first.

use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::catalog::{CatalogDetails, TeaCategory};
use crate::stock::{Stock, StockDetails};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("could not read CSV: {0}")]
    Csv(String),

    #[error("could not read spreadsheet: {0}")]
    Excel(String),

    #[error("file contains no data rows")]
    Empty,

    #[error("{}", .0.join(", "))]
    Rows(Vec<String>),
}

impl From<csv::Error> for SheetError {
    fn from(e: csv::Error) -> Self {
        SheetError::Csv(e.to_string())
    }
}

/// Accepted upload flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Excel,
}

impl SheetFormat {
    pub const CONTENT_TYPES: &'static [&'static str] = &[
        "text/csv",
        "application/csv",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ];

    /// Map an upload's content type (parameters ignored) to a format.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/csv" | "application/csv" => Some(Self::Csv),
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// One data row. `line` is 1-based and counts the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    cells: BTreeMap<String, String>,
}

impl Row {
    pub fn new(line: usize, cells: BTreeMap<String, String>) -> Self {
        Self { line, cells }
    }

    /// Trimmed, non-empty cell value.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn text(&self, column: &str) -> Result<String, String> {
        self.get(column)
            .map(str::to_string)
            .ok_or_else(|| format!("{column} is required"))
    }

    fn parse<T: std::str::FromStr>(&self, column: &str, what: &str) -> Result<T, String> {
        let raw = self.get(column).ok_or_else(|| format!("{column} is required"))?;
        raw.parse()
            .map_err(|_| format!("{column} must be {what}"))
    }

    fn parse_opt<T: std::str::FromStr>(&self, column: &str, what: &str) -> Result<Option<T>, String> {
        match self.get(column) {
            None => Ok(None),
            Some(_) => self.parse(column, what).map(Some),
        }
    }

    fn date(&self, column: &str) -> Result<NaiveDate, String> {
        let raw = self.get(column).ok_or_else(|| format!("{column} is required"))?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| format!("{column} must be a date (YYYY-MM-DD)"))
    }
}

/// Build record details from one spreadsheet row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, String>;
}

/// Read every data row from an upload.
pub fn read_rows(format: SheetFormat, bytes: &[u8]) -> Result<Vec<Row>, SheetError> {
    let rows = match format {
        SheetFormat::Csv => read_csv(bytes)?,
        SheetFormat::Excel => read_excel(bytes)?,
    };
    if rows.is_empty() {
        return Err(SheetError::Empty);
    }
    Ok(rows)
}

/// Convert rows, collecting one message per bad row.
pub fn parse_rows<T: FromRow>(rows: &[Row]) -> Result<Vec<T>, SheetError> {
    let mut parsed = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for row in rows {
        match T::from_row(row) {
            Ok(item) => parsed.push(item),
            Err(msg) => errors.push(format!("row {}: {msg}", row.line)),
        }
    }
    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(SheetError::Rows(errors))
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn to_row(line: usize, headers: &[String], values: impl Iterator<Item = String>) -> Option<Row> {
    let cells: BTreeMap<String, String> = headers.iter().cloned().zip(values).collect();
    if cells.values().all(|v| v.trim().is_empty()) {
        return None;
    }
    Some(Row::new(line, cells))
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Row>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if let Some(row) = to_row(idx + 2, &headers, record.iter().map(str::to_string)) {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn read_excel(bytes: &[u8]) -> Result<Vec<Row>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| SheetError::Excel(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::Empty)?
        .map_err(|e| SheetError::Excel(e.to_string()))?;

    let mut lines = range.rows();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(|c| normalize_header(&cell_text(c))).collect();

    Ok(lines
        .enumerate()
        .filter_map(|(idx, cells)| to_row(idx + 2, &headers, cells.iter().map(cell_text)))
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        // Serial day count from 1899-12-30.
        Data::DateTime(dt) => NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|epoch| epoch.checked_add_signed(Duration::days(dt.as_f64().trunc() as i64)))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::Error(e) => format!("#ERROR: {e:?}"),
    }
}

impl FromRow for CatalogDetails {
    fn from_row(row: &Row) -> Result<Self, String> {
        let category = row.text("category")?;
        let details = CatalogDetails {
            sale_code: row.text("sale_code")?,
            lot_no: row.text("lot_no")?,
            broker: row.text("broker")?,
            garden: row.text("garden")?,
            grade: row.text("grade")?,
            invoice_no: row.text("invoice_no")?,
            packages: row.parse("packages", "a whole number")?,
            net_weight_kg: row.parse("net_weight_kg", "a number")?,
            category: TeaCategory::parse(&category)
                .ok_or_else(|| format!("category must be one of: {}", TeaCategory::ALL.join(", ")))?,
            sale_date: row.date("sale_date")?,
            valuation_per_kg: row.parse_opt("valuation_per_kg", "a number")?,
        };
        details.validate().map_err(|e| e.to_string())?;
        Ok(details)
    }
}

impl FromRow for StockDetails {
    fn from_row(row: &Row) -> Result<Self, String> {
        let catalog_id = match row.get("catalog_id") {
            None => None,
            Some(raw) => Some(raw.parse().map_err(|_| "catalog_id must be a valid UUID".to_string())?),
        };
        let details = StockDetails {
            lot_no: row.text("lot_no")?,
            invoice_no: row.text("invoice_no")?,
            garden: row.text("garden")?,
            grade: row.text("grade")?,
            packages: row.parse("packages", "a whole number")?,
            net_weight_kg: row.parse("net_weight_kg", "a number")?,
            purchase_price_per_kg: row.parse("purchase_price_per_kg", "a number")?,
            warehouse: row.text("warehouse")?,
            purchased_on: row.date("purchased_on")?,
            catalog_id,
        };
        details.validate().map_err(|e| e.to_string())?;
        Ok(details)
    }
}

const STOCK_COLUMNS: &[&str] = &[
    "id",
    "lot_no",
    "invoice_no",
    "garden",
    "grade",
    "packages",
    "net_weight_kg",
    "purchase_price_per_kg",
    "warehouse",
    "purchased_on",
    "catalog_id",
];

/// Render stock lots as CSV with a header row. Columns match the import format
/// plus a leading `id`.
pub fn write_stock_csv(stocks: &[Stock]) -> Result<Vec<u8>, SheetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(STOCK_COLUMNS)?;
    for stock in stocks {
        let d = &stock.details;
        writer.write_record([
            stock.id.to_string(),
            d.lot_no.clone(),
            d.invoice_no.clone(),
            d.garden.clone(),
            d.grade.clone(),
            d.packages.to_string(),
            d.net_weight_kg.to_string(),
            d.purchase_price_per_kg.to_string(),
            d.warehouse.clone(),
            d.purchased_on.format("%Y-%m-%d").to_string(),
            d.catalog_id.map(|id| id.to_string()).unwrap_or_default(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| SheetError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::tests::stock_with;

    const CATALOG_CSV: &str = "\
Sale Code,Lot No,Broker,Garden,Grade,Invoice No,Packages,Net Weight Kg,Category,Sale Date,Valuation Per Kg
S-12,L-1,Forbes,Halmari,BOP,INV-1,20,1000,leaf,2024-03-04,
,,,,,,,,,,
S-12,L-2,Forbes,Halmari,PD,INV-2,10,500.5,Dust,2024-03-04,290
";

    #[test]
    fn content_type_mapping() {
        assert_eq!(SheetFormat::from_content_type("text/csv; charset=utf-8"), Some(SheetFormat::Csv));
        assert_eq!(
            SheetFormat::from_content_type(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            Some(SheetFormat::Excel)
        );
        assert_eq!(SheetFormat::from_content_type("application/pdf"), None);
    }

    #[test]
    fn csv_headers_are_normalized_and_blank_rows_skipped() {
        let rows = read_rows(SheetFormat::Csv, CATALOG_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 4);
        assert_eq!(rows[1].get("net_weight_kg"), Some("500.5"));
        assert_eq!(rows[0].get("valuation_per_kg"), None);
    }

    #[test]
    fn catalog_rows_parse() {
        let rows = read_rows(SheetFormat::Csv, CATALOG_CSV.as_bytes()).unwrap();
        let details: Vec<CatalogDetails> = parse_rows(&rows).unwrap();
        assert_eq!(details[1].category, TeaCategory::Dust);
        assert_eq!(details[1].valuation_per_kg, Some(290.0));
        assert_eq!(details[0].packages, 20);
    }

    #[test]
    fn every_bad_row_is_reported() {
        let csv = "\
lot_no,invoice_no,garden,grade,packages,net_weight_kg,purchase_price_per_kg,warehouse,purchased_on
L-1,INV-1,Doomni,PD,ten,500,280,K-2,2024-05-01
L-2,INV-2,Doomni,PD,10,500,280,K-2,2024-05-01
L-3,,Doomni,PD,10,500,280,K-2,01/05/2024
";
        let rows = read_rows(SheetFormat::Csv, csv.as_bytes()).unwrap();
        let err = parse_rows::<StockDetails>(&rows).unwrap_err();
        assert_eq!(
            err.to_string(),
            "row 2: packages must be a whole number, row 4: invoice_no is required"
        );
    }

    #[test]
    fn header_only_file_is_empty() {
        let err = read_rows(SheetFormat::Csv, b"lot_no,invoice_no\n").unwrap_err();
        assert_eq!(err, SheetError::Empty);
    }

    #[test]
    fn garbage_excel_is_an_error() {
        let err = read_rows(SheetFormat::Excel, b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, SheetError::Excel(_)));
    }

    #[test]
    fn exported_stock_reads_back_as_import_rows() {
        let stocks = vec![stock_with(4), stock_with(9)];
        let bytes = write_stock_csv(&stocks).unwrap();
        let rows = read_rows(SheetFormat::Csv, &bytes).unwrap();
        let details: Vec<StockDetails> = parse_rows(&rows).unwrap();

        assert_eq!(rows[0].get("id"), Some(stocks[0].id.to_string().as_str()));
        assert_eq!(details[1], stocks[1].details);
    }
}
