//! Input loading: read a spreadsheet file (or buffer) into a [`Sheet`].
//!
//! ## Supported formats
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are decoded with
//! calamine, `.csv` with the csv crate. The format is picked from the file
//! extension. Binary workbooks are checked against their magic bytes first so
//! a renamed text file is reported as unreadable instead of surfacing a zip
//! or CFB parser message.
//!
//! Decoding is synchronous; the async entry points run it inside
//! `spawn_blocking`.

use crate::config::SheetSelection;
use crate::error::ReceiptError;
use crate::record::Cell;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Spreadsheet container formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Xlsx,
    Xlsm,
    Xlsb,
    Xls,
    Ods,
    Csv,
}

impl InputFormat {
    /// Map a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            "xlsb" => Some(Self::Xlsb),
            "xls" => Some(Self::Xls),
            "ods" => Some(Self::Ods),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Detect the format of `path` from its extension.
    pub fn from_path(path: &Path) -> Result<Self, ReceiptError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_extension(&ext).ok_or_else(|| ReceiptError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: if ext.is_empty() {
                "(none)".to_string()
            } else {
                ext
            },
        })
    }

    fn magic(&self) -> Option<&'static [u8]> {
        match self {
            Self::Xlsx | Self::Xlsm | Self::Xlsb | Self::Ods => Some(ZIP_MAGIC),
            Self::Xls => Some(CFB_MAGIC),
            Self::Csv => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xlsm => "xlsm",
            Self::Xlsb => "xlsb",
            Self::Xls => "xls",
            Self::Ods => "ods",
            Self::Csv => "csv",
        }
    }
}

/// One worksheet: the header row plus the data rows beneath it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// Worksheet name (`"csv"` for CSV input).
    pub name: String,
    /// 1-based spreadsheet row of the header.
    pub header_row: usize,
    /// Header cells as text, untrimmed.
    pub header: Vec<String>,
    /// Data rows in sheet order. Rows may be shorter than the header.
    pub rows: Vec<Vec<Cell>>,
}

/// Read the selected worksheet of a spreadsheet file.
pub fn load_sheet(path: &Path, selection: &SheetSelection) -> Result<Sheet, ReceiptError> {
    let format = InputFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| map_read_error(path, e))?;
    debug!(
        "Read {} bytes from {} ({})",
        bytes.len(),
        path.display(),
        format.as_str()
    );
    decode(bytes, format, selection, path)
}

/// Read the selected worksheet from an in-memory buffer.
///
/// `label` only appears in error messages.
pub fn load_sheet_from_bytes(
    bytes: Vec<u8>,
    format: InputFormat,
    selection: &SheetSelection,
    label: &str,
) -> Result<Sheet, ReceiptError> {
    decode(bytes, format, selection, Path::new(label))
}

fn map_read_error(path: &Path, e: std::io::Error) -> ReceiptError {
    match e.kind() {
        ErrorKind::NotFound => ReceiptError::InputNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ReceiptError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ReceiptError::SpreadsheetUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    }
}

fn decode(
    bytes: Vec<u8>,
    format: InputFormat,
    selection: &SheetSelection,
    path: &Path,
) -> Result<Sheet, ReceiptError> {
    if let Some(magic) = format.magic() {
        if !bytes.starts_with(magic) {
            return Err(ReceiptError::SpreadsheetUnreadable {
                path: path.to_path_buf(),
                detail: format!("content is not a valid .{} file", format.as_str()),
            });
        }
    }

    match format {
        InputFormat::Csv => decode_csv(&bytes, selection, path),
        _ => decode_workbook(bytes, selection, path),
    }
}

fn decode_workbook(
    bytes: Vec<u8>,
    selection: &SheetSelection,
    path: &Path,
) -> Result<Sheet, ReceiptError> {
    let unreadable = |detail: String| ReceiptError::SpreadsheetUnreadable {
        path: path.to_path_buf(),
        detail,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| unreadable(e.to_string()))?;
    let names = workbook.sheet_names();
    let name = select_sheet(&names, selection)?;

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| unreadable(e.to_string()))?;

    let header_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let mut rows = range.rows();
    let header = rows
        .next()
        .map(|cells| cells.iter().map(data_to_text).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|cells| cells.iter().map(data_to_cell).collect())
        .collect();

    Ok(Sheet {
        name,
        header_row,
        header,
        rows,
    })
}

fn decode_csv(
    bytes: &[u8],
    selection: &SheetSelection,
    path: &Path,
) -> Result<Sheet, ReceiptError> {
    match selection {
        SheetSelection::First | SheetSelection::Index(0) => {}
        SheetSelection::Named(name) if name == "csv" => {}
        other => {
            return Err(ReceiptError::SheetNotFound {
                sheet: describe_selection(other),
                available: vec!["csv".to_string()],
            })
        }
    }

    // A UTF-8 BOM from spreadsheet exports would otherwise stick to the
    // first header name.
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(rec) => rec
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for rec in records {
        let rec = rec.map_err(|e| csv_error(path, e))?;
        rows.push(rec.iter().map(Cell::from).collect());
    }

    Ok(Sheet {
        name: "csv".to_string(),
        header_row: 1,
        header,
        rows,
    })
}

fn csv_error(path: &Path, e: csv::Error) -> ReceiptError {
    ReceiptError::SpreadsheetUnreadable {
        path: PathBuf::from(path),
        detail: e.to_string(),
    }
}

fn select_sheet(names: &[String], selection: &SheetSelection) -> Result<String, ReceiptError> {
    let found = match selection {
        SheetSelection::First => names.first(),
        SheetSelection::Index(i) => names.get(*i),
        SheetSelection::Named(n) => names.iter().find(|s| *s == n),
    };
    found.cloned().ok_or_else(|| ReceiptError::SheetNotFound {
        sheet: describe_selection(selection),
        available: names.to_vec(),
    })
}

fn describe_selection(selection: &SheetSelection) -> String {
    match selection {
        SheetSelection::First => "#0".to_string(),
        SheetSelection::Index(i) => format!("#{i}"),
        SheetSelection::Named(n) => n.clone(),
    }
}

fn data_to_text(d: &Data) -> String {
    data_to_cell(d).to_string()
}

fn data_to_cell(d: &Data) -> Cell {
    match d {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Int(*i),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Error(e.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
            Cell::Text(d.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_extension("XLSX"), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_extension("ods"), Some(InputFormat::Ods));
        assert_eq!(InputFormat::from_extension("pdf"), None);
    }

    #[test]
    fn unsupported_extension_is_reported() {
        let err = InputFormat::from_path(Path::new("payees.txt")).unwrap_err();
        assert!(matches!(
            err,
            ReceiptError::UnsupportedFormat { ref extension, .. } if extension == "txt"
        ));
        let err = InputFormat::from_path(Path::new("payees")).unwrap_err();
        assert!(err.to_string().contains("(none)"));
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let err = load_sheet(Path::new("/nonexistent/payees.xlsx"), &SheetSelection::First)
            .unwrap_err();
        assert!(matches!(err, ReceiptError::InputNotFound { .. }));
    }

    #[test]
    fn mislabelled_workbook_is_unreadable() {
        let err = load_sheet_from_bytes(
            b"Payee Name,Amount,Work\n".to_vec(),
            InputFormat::Xlsx,
            &SheetSelection::First,
            "upload.xlsx",
        )
        .unwrap_err();
        assert!(matches!(err, ReceiptError::SpreadsheetUnreadable { .. }));
        assert!(err.to_string().contains("not a valid .xlsx file"));
    }

    #[test]
    fn corrupt_zip_is_unreadable() {
        let err = load_sheet_from_bytes(
            b"PK\x03\x04garbage".to_vec(),
            InputFormat::Xlsx,
            &SheetSelection::First,
            "upload.xlsx",
        )
        .unwrap_err();
        assert!(matches!(err, ReceiptError::SpreadsheetUnreadable { .. }));
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn xlsx_cells_keep_their_types() {
        let sheet = load_sheet(&fixture("payees.xlsx"), &SheetSelection::First).unwrap();
        assert_eq!(sheet.name, "Payees");
        assert_eq!(sheet.header_row, 1);
        assert_eq!(sheet.header, vec!["Payee Name", "Amount", "Work"]);
        assert_eq!(
            sheet.rows[0],
            vec![
                Cell::from("Alpha Electricals"),
                Cell::Number(1234.5),
                Cell::Number(42.0)
            ]
        );
        assert_eq!(sheet.rows[1][1], Cell::from("abc"));
        assert!(sheet.rows[2].iter().all(Cell::is_blank));
        assert_eq!(sheet.rows[3][1], Cell::Number(1001.0));
    }

    #[test]
    fn xlsx_sheet_by_name_and_index() {
        let path = fixture("payees.xlsx");
        assert!(load_sheet(&path, &SheetSelection::Named("Payees".into())).is_ok());
        let err = load_sheet(&path, &SheetSelection::Index(3)).unwrap_err();
        match err {
            ReceiptError::SheetNotFound { available, .. } => {
                assert_eq!(available, vec!["Payees".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_header_and_rows() {
        let f = csv_file("\u{feff}Payee Name,Amount,Work\nA,100,Wiring\nB,,\n");
        let sheet = load_sheet(f.path(), &SheetSelection::First).unwrap();
        assert_eq!(sheet.header, vec!["Payee Name", "Amount", "Work"]);
        assert_eq!(sheet.header_row, 1);
        assert_eq!(
            sheet.rows,
            vec![
                vec![Cell::from("A"), Cell::from("100"), Cell::from("Wiring")],
                vec![Cell::from("B"), Cell::Empty, Cell::Empty],
            ]
        );
    }

    #[test]
    fn csv_ragged_rows_are_accepted() {
        let f = csv_file("Payee Name,Amount,Work\nA,100\n");
        let sheet = load_sheet(f.path(), &SheetSelection::First).unwrap();
        assert_eq!(sheet.rows[0].len(), 2);
    }

    #[test]
    fn csv_has_a_single_sheet() {
        let f = csv_file("Payee Name,Amount,Work\n");
        let err = load_sheet(f.path(), &SheetSelection::Named("Payees".into())).unwrap_err();
        assert!(matches!(err, ReceiptError::SheetNotFound { .. }));
        assert!(load_sheet(f.path(), &SheetSelection::Index(0)).is_ok());
    }

    #[test]
    fn sheet_selection_by_name_and_index() {
        let names = vec!["Summary".to_string(), "Payees".to_string()];
        assert_eq!(select_sheet(&names, &SheetSelection::First).unwrap(), "Summary");
        assert_eq!(select_sheet(&names, &SheetSelection::Index(1)).unwrap(), "Payees");
        assert_eq!(
            select_sheet(&names, &SheetSelection::Named("Payees".into())).unwrap(),
            "Payees"
        );
        let err = select_sheet(&names, &SheetSelection::Index(5)).unwrap_err();
        assert!(err.to_string().contains("Summary, Payees"));
    }

    #[test]
    fn calamine_values_map_to_cells() {
        assert_eq!(data_to_cell(&Data::Float(12.5)), Cell::Number(12.5));
        assert_eq!(data_to_cell(&Data::Int(3)), Cell::Int(3));
        assert_eq!(data_to_cell(&Data::String(String::new())), Cell::Empty);
        assert_eq!(data_to_cell(&Data::Bool(true)), Cell::Bool(true));
        assert_eq!(data_to_text(&Data::String(" Amount ".into())), " Amount ");
    }
}
