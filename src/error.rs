use thiserror::Error;

/// Every failure the application can report
///
/// Each kind maps to a user-visible [`Notice`] through [`AppError::notice`],
/// so the front ends never have to interpret error internals themselves.
#[derive(Debug, Error)]
pub enum AppError {
    /// The selected file is not one of the accepted spreadsheet types
    #[error("unsupported file type: {extension:?} (expected .xlsx or .xls)")]
    UnsupportedFormat { extension: String },

    /// The file could not be parsed as a workbook
    #[error("unreadable spreadsheet: {0}")]
    UnreadableFile(String),

    /// The first worksheet holds no data rows
    #[error("the first worksheet contains no data rows")]
    EmptySheet,

    /// Export was requested while no rows are loaded
    #[error("there is no table to export")]
    NothingToExport,

    /// Another export is still pending
    #[error("an export is already in progress")]
    ExportBusy,

    /// The table image would exceed the largest drawable surface
    #[error("table image of {width}x{height} px exceeds the {limit} px limit", limit = crate::export::MAX_SIDE)]
    TooLarge {
        width: u64,
        height: u64,
        /// Rows that would fit with the same settings
        max_rows: usize,
    },

    /// Drawing or encoding the table image failed
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    /// The finished image could not be handed to its destination
    #[error("failed to save {file_name}: {source}")]
    Save {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Wraps any displayable rasterization failure
    pub fn raster(err: impl std::fmt::Display) -> Self {
        AppError::Rasterization(err.to_string())
    }

    /// The message shown to the user for this error
    ///
    /// # Returns
    /// * `Notice` - Error-level notice with a short, non-technical message
    pub fn notice(&self) -> Notice {
        let message = match self {
            AppError::UnsupportedFormat { .. } => {
                "Please choose an Excel file (.xlsx or .xls).".to_string()
            }
            AppError::UnreadableFile(_) => {
                "The file could not be read as a spreadsheet. The current table was kept."
                    .to_string()
            }
            AppError::EmptySheet => {
                "The spreadsheet has no data rows. The current table was kept.".to_string()
            }
            AppError::NothingToExport => "Load a spreadsheet before exporting.".to_string(),
            AppError::ExportBusy => "An export is already running, please wait.".to_string(),
            AppError::TooLarge { max_rows: 0, .. } => format!(
                "The table is too wide to export as one image (at most {} px per side). \
                 Try a smaller code size.",
                crate::export::MAX_SIDE
            ),
            AppError::TooLarge { max_rows, .. } => format!(
                "The table is too large to export as one image (at most {} px per side). \
                 Up to {} rows fit with the current settings.",
                crate::export::MAX_SIDE,
                max_rows
            ),
            AppError::Rasterization(_) | AppError::Save { .. } => {
                "The image could not be created. Please try again.".to_string()
            }
        };

        Notice {
            level: NoticeLevel::Error,
            message,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A status line the front ends display after each user action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
