#![allow(dead_code)]

use qrsheet::SelectedFile;
use rust_xlsxwriter::{ExcelDateTime, Format, Formula, Workbook, Worksheet};

/// A fixture cell
pub enum Value<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
    /// Date or datetime shown with the given number format
    Date(ExcelDateTime, &'a str),
    /// Formula with its cached result
    Formula(&'a str, &'a str),
    Blank,
}

/// Builds an XLSX workbook in memory with one worksheet holding `rows`
pub fn workbook(rows: &[Vec<Value>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match value {
                Value::Text(s) => {
                    worksheet.write_string(r, c, *s).unwrap();
                }
                Value::Number(n) => {
                    worksheet.write_number(r, c, *n).unwrap();
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(r, c, *b).unwrap();
                }
                Value::Date(datetime, num_format) => {
                    let format = Format::new().set_num_format(*num_format);
                    worksheet
                        .write_datetime_with_format(r, c, datetime, &format)
                        .unwrap();
                }
                Value::Formula(formula, result) => {
                    worksheet
                        .write_formula(r, c, Formula::new(*formula).set_result(*result))
                        .unwrap();
                }
                Value::Blank => {}
            }
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer().unwrap()
}

/// Workbook of text cells; empty strings are left blank
pub fn text_workbook(rows: &[&[&str]]) -> Vec<u8> {
    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|s| if s.is_empty() { Value::Blank } else { Value::Text(*s) })
                .collect()
        })
        .collect();
    workbook(&rows)
}

/// The `[ID, Name]` sheet with rows A1/X and A2/Y
pub fn id_name_file() -> SelectedFile {
    SelectedFile::new(
        "items.xlsx",
        text_workbook(&[&["ID", "Name"], &["A1", "X"], &["A2", "Y"]]),
    )
}
