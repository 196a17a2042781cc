use crate::code::CodeRenderer;
use crate::config::AppConfig;
use crate::decoder::{self, SelectedFile};
use crate::error::{AppError, Notice, Result};
use crate::export::{DownloadSink, ExportLock, ExportedImage, PendingExport, Rasterizer};
use crate::record::{RowRecord, Sheet};
use crate::settings::SettingsDialog;
use crate::table::TableView;
use log::{error, info, warn};

/// Everything the screen shows, owned by the [`Controller`]
#[derive(Clone, Debug)]
pub struct AppState {
    pub rows: Vec<RowRecord>,
    pub columns: Vec<String>,
    pub identifier_field: String,
    pub settings_open: bool,
}

impl AppState {
    fn new(identifier_field: String) -> Self {
        AppState {
            rows: Vec::new(),
            columns: Vec::new(),
            identifier_field,
            settings_open: false,
        }
    }
}

/// Root controller: the only place application state changes
///
/// Front ends forward user actions to the `on_*` handlers and read back
/// [`Controller::state`], [`Controller::table_view`] and
/// [`Controller::notice`]. Each handler leaves a [`Notice`] describing its
/// outcome; failures are also logged.
#[derive(Debug)]
pub struct Controller {
    state: AppState,
    dialog: SettingsDialog,
    config: AppConfig,
    codes: CodeRenderer,
    export_lock: ExportLock,
    notice: Option<Notice>,
}

impl Controller {
    pub fn new(config: AppConfig) -> Self {
        Controller {
            state: AppState::new(config.identifier_field.clone()),
            dialog: SettingsDialog::new(),
            codes: CodeRenderer::new(config.code_size),
            config,
            export_lock: ExportLock::new(),
            notice: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Loads a spreadsheet, replacing the current rows and columns
    ///
    /// Nothing changes unless decoding yields at least one row, so a bad or
    /// empty file keeps the previous table on screen.
    ///
    /// # Arguments
    /// * `file` - The file chosen in the picker
    ///
    /// # Returns
    /// * `Result<usize>` - Number of rows now loaded
    pub fn on_file_selected(&mut self, file: SelectedFile) -> Result<usize> {
        match decoder::decode(&file) {
            Ok(Sheet { columns, rows }) => {
                let count = rows.len();
                self.state.columns = columns;
                self.state.rows = rows;
                self.notice = Some(Notice::info(format!(
                    "Loaded {} rows from {}.",
                    count, file.name
                )));
                Ok(count)
            }
            Err(err) => {
                warn!("rejected {}: {}", file.name, err);
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }

    /// Opens the settings dialog with a draft of the current field
    pub fn open_settings(&mut self) {
        self.dialog.seed(&self.state.identifier_field);
        self.state.settings_open = true;
    }

    pub fn settings_draft(&self) -> &str {
        self.dialog.draft()
    }

    pub fn edit_settings_draft(&mut self, value: impl Into<String>) {
        self.dialog.edit(value);
    }

    /// Sets the identifier field and closes the dialog
    pub fn on_settings_save(&mut self, new_field: impl Into<String>) {
        let new_field = new_field.into();
        info!("identifier field set to {:?}", new_field);

        self.notice = Some(Notice::info(format!("Codes now use column \"{}\".", new_field)));
        self.state.identifier_field = new_field;
        self.state.settings_open = false;
        self.dialog.discard();
    }

    /// Saves whatever is in the dialog's draft
    pub fn save_settings_draft(&mut self) {
        let draft = self.dialog.commit();
        self.on_settings_save(draft);
    }

    /// Closes the dialog without changing the identifier field
    pub fn on_settings_cancel(&mut self) {
        self.dialog.discard();
        self.state.settings_open = false;
    }

    /// Whether the export action is offered (only with rows loaded)
    pub fn can_export(&self) -> bool {
        !self.state.rows.is_empty()
    }

    pub fn export_busy(&self) -> bool {
        self.export_lock.is_busy()
    }

    /// The table as currently shown
    pub fn table_view(&self) -> TableView {
        let sheet = Sheet {
            columns: self.state.columns.clone(),
            rows: self.state.rows.clone(),
        };
        TableView::build(&sheet, &self.state.identifier_field, &self.config.code_header)
    }

    pub fn table_html(&self) -> String {
        self.table_view().to_html(&self.codes)
    }

    /// Starts an export: takes the busy flag and snapshots the table
    ///
    /// The returned [`PendingExport`] can be run later; until it finishes
    /// or is dropped, further calls fail with `ExportBusy`.
    ///
    /// # Errors
    /// * `NothingToExport` when no rows are loaded
    /// * `ExportBusy` while another export is pending
    pub fn begin_export(&mut self) -> Result<PendingExport> {
        let pending = self.try_begin_export();
        if let Err(err) = &pending {
            warn!("export not started: {}", err);
            self.notice = Some(err.notice());
        }
        pending
    }

    fn try_begin_export(&self) -> Result<PendingExport> {
        if !self.can_export() {
            return Err(AppError::NothingToExport);
        }

        let guard = self.export_lock.try_acquire()?;
        let rasterizer = Rasterizer::new(self.codes, self.config.export_scale);

        Ok(PendingExport::new(
            self.table_view(),
            rasterizer,
            self.config.export_file_name.clone(),
            guard,
        ))
    }

    /// Records the result of a pending export that was run elsewhere
    pub fn finish_export(&mut self, result: &Result<ExportedImage>) {
        self.notice = Some(match result {
            Ok(image) => Notice::info(format!("Saved {}.", image.file_name)),
            Err(err) => {
                error!("export failed: {}", err);
                err.notice()
            }
        });
    }

    /// Exports the table and hands the PNG to `sink`
    ///
    /// Failures are logged and reported through the notice; application
    /// state is left unchanged either way.
    ///
    /// # Arguments
    /// * `sink` - Where the finished image goes
    ///
    /// # Returns
    /// * `Result<ExportedImage>` - The delivered image, or the failure
    pub fn on_export(&mut self, sink: &mut dyn DownloadSink) -> Result<ExportedImage> {
        let pending = self.begin_export()?;
        let result = pending
            .run()
            .and_then(|image| sink.deliver(&image).map(|_| image));

        self.finish_export(&result);
        result
    }
}

impl Default for Controller {
    fn default() -> Self {
        Controller::new(AppConfig::default())
    }
}
