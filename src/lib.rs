/*!
# Spreadsheet QR Code Lister

Reads a spreadsheet, shows its rows in a table with one QR code per row, and
exports the table as a PNG image.

## Overview

The user picks an Excel file. Its first worksheet is decoded into row records
keyed by the header row; the table lists every column plus a code column. The
code payload of each row is the value of a configurable column, the
*identifier field*. The finished table can be downloaded as
`qrcode-list.png`, rendered at twice the on-screen size on white.

## Architecture

Components, leaf first:

- **decoder**: spreadsheet bytes to rows and a column list (calamine)
- **code**: payload text to a fixed-size QR code, raster or SVG (qrcode)
- **settings**: draft state of the identifier field dialog
- **table**: pure layout of columns, cells and payloads; renders to HTML
- **font**: embedded sans-serif faces for measuring and drawing text
  (ab_glyph)
- **export**: rasterizes a table to PNG (plotters, image) behind a busy flag
- **controller**: owns all application state; every user action is one of
  its handler methods

Two front ends drive the controller:

- a browser page (`static/index.html`) over the `wasm` feature's
  `wasm-bindgen` facade
- the `qrsheet` command-line binary (`cli` feature)

## Error handling

All failures are [`AppError`] values. Each one carries a user-facing
[`Notice`]; the controller stores the notice of the last action so front ends
can show it. A file that cannot be read keeps the previous table.
*/

pub mod code;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod export;
pub mod font;
pub mod record;
pub mod settings;
pub mod table;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use code::CodeRenderer;
pub use config::AppConfig;
pub use controller::{AppState, Controller};
pub use decoder::{SelectedFile, decode};
pub use error::{AppError, Notice, NoticeLevel};
pub use export::{
    DirectorySink, DownloadSink, ExportLock, ExportedImage, Layout, MAX_SIDE, PendingExport,
    Rasterizer,
};
pub use font::{Typeface, Weight};
pub use record::{RowRecord, Sheet};
pub use settings::SettingsDialog;
pub use table::{TableRow, TableView, code_payload};
