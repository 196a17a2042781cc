use crate::config::is_accepted_extension;
use crate::error::{AppError, Result};
use crate::record::{RowRecord, Sheet};
use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};
use chrono::Timelike;
use log::{debug, info, warn};
use std::io::Cursor;
use std::path::Path;

/// A file picked by the user: its name (for the type check) and raw bytes
#[derive(Clone, Debug)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        SelectedFile {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a spreadsheet from disk
    ///
    /// # Arguments
    /// * `path` - Path to the file to load
    ///
    /// # Returns
    /// * `Result<SelectedFile>` - The file contents, or `UnreadableFile` if it
    ///   cannot be read
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::UnreadableFile(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(SelectedFile { name, bytes })
    }

    /// Lower-cased extension of the file name, empty when there is none
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default()
    }
}

/// Decode a selected file into rows and a column list
///
/// Checks the file type, then reads the first worksheet of the workbook.
/// The first row of the used range is the header row; every following
/// non-blank row becomes a [`RowRecord`].
///
/// # Arguments
/// * `file` - The selected file
///
/// # Returns
/// * `Result<Sheet>` - The decoded sheet, or an error
///
/// # Errors
/// * `UnsupportedFormat` when the extension is not `.xlsx` or `.xls`
/// * `UnreadableFile` when the bytes are not a readable workbook
/// * `EmptySheet` when the first worksheet has no data rows
pub fn decode(file: &SelectedFile) -> Result<Sheet> {
    let extension = file.extension();
    if !is_accepted_extension(&extension) {
        return Err(AppError::UnsupportedFormat { extension });
    }

    let rows = read_first_sheet(&file.bytes)?;
    if rows.is_empty() {
        return Err(AppError::EmptySheet);
    }

    let sheet = Sheet::from_rows(rows);
    let divergent = sheet.divergent_rows();
    if divergent > 0 {
        warn!(
            "{}: {} of {} rows do not match the header of the first row; missing cells render empty",
            file.name,
            divergent,
            sheet.rows.len()
        );
    }

    info!(
        "decoded {}: {} rows, {} columns",
        file.name,
        sheet.rows.len(),
        sheet.columns.len()
    );
    Ok(sheet)
}

fn read_first_sheet(bytes: &[u8]) -> Result<Vec<RowRecord>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::UnreadableFile(e.to_string()))?;

    // Get the first worksheet
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(AppError::EmptySheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::UnreadableFile(e.to_string()))?;

    debug!(
        "worksheet {:?}: {} x {} cells",
        sheet_name,
        range.height(),
        range.width()
    );

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(header_row) => header_names(header_row),
        None => return Ok(Vec::new()),
    };

    let rows = sheet_rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .filter_map(|(header, cell)| cell_text(cell).map(|text| (header.clone(), text)))
                .collect::<RowRecord>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows)
}

/// Names the header cells, keeping every key distinct
///
/// Empty headers become `__EMPTY`, `__EMPTY_1`, ... and repeats of a name
/// `X` become `X_1`, `X_2`, ...
fn header_names(cells: &[Data]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(cells.len());

    for cell in cells {
        let base = cell_text(cell).unwrap_or_else(|| "__EMPTY".to_string());
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }

    names
}

/// Text of a cell, or `None` for empty cells
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    };

    if text.is_empty() { None } else { Some(text) }
}
