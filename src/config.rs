/// Column name used as the code payload until the user picks another one
pub const DEFAULT_IDENTIFIER_FIELD: &str = "識別コード";

/// Name of the downloaded image
pub const DEFAULT_EXPORT_FILE_NAME: &str = "qrcode-list.png";

/// Header of the trailing code column
pub const DEFAULT_CODE_HEADER: &str = "QR Code";

/// Largest code edge accepted from the command line
pub const MAX_CODE_SIZE: u32 = 1024;

/// Largest export scale accepted from the command line
pub const MAX_EXPORT_SCALE: u32 = 8;

/// File extensions offered by the file picker
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Configuration options for the whole application
///
/// Every field has a fixed default; front ends
/// override individual fields (the CLI maps its flags onto them). Nothing
/// here is persisted.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Initial identifier field
    pub identifier_field: String,

    /// Edge length of every code image, in logical pixels
    pub code_size: u32,

    /// Pixel density multiplier applied when exporting
    pub export_scale: u32,

    /// File name of the exported PNG
    pub export_file_name: String,

    /// Header label of the code column
    pub code_header: String,
}

impl Default for AppConfig {
    /// Creates the default configuration
    ///
    /// # Returns
    /// * `AppConfig` - Default configuration with:
    ///   - `識別コード` as identifier field
    ///   - 100 px codes
    ///   - 2x export scale to `qrcode-list.png`
    fn default() -> Self {
        Self {
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
            code_size: 100,
            export_scale: 2,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            code_header: DEFAULT_CODE_HEADER.to_string(),
        }
    }
}

/// Whether a file name carries one of the accepted spreadsheet extensions
pub fn is_accepted_extension(extension: &str) -> bool {
    let extension = extension.to_lowercase();
    ACCEPTED_EXTENSIONS.contains(&extension.as_str())
}
