#![cfg(not(tarpaulin_include))]

//! Browser bindings used by `static/index.html`
//!
//! The page keeps only DOM glue; every user action is forwarded to a
//! [`Controller`] living inside [`WebApp`].

use crate::config::AppConfig;
use crate::controller::Controller;
use crate::decoder::SelectedFile;
use crate::export::PendingExport;
use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WebApp {
    controller: Controller,
}

#[wasm_bindgen]
impl WebApp {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebApp {
        WebApp {
            controller: Controller::new(AppConfig::default()),
        }
    }

    /// Decodes the picked file; returns the number of rows loaded
    #[wasm_bindgen(js_name = selectFile)]
    pub fn select_file(&mut self, name: String, bytes: Vec<u8>) -> Result<usize, JsError> {
        self.controller
            .on_file_selected(SelectedFile::new(name, bytes))
            .map_err(|e| JsError::new(&e.notice().message))
    }

    /// Opens the dialog and returns the seeded draft
    #[wasm_bindgen(js_name = openSettings)]
    pub fn open_settings(&mut self) -> String {
        self.controller.open_settings();
        self.controller.settings_draft().to_string()
    }

    #[wasm_bindgen(js_name = editSettings)]
    pub fn edit_settings(&mut self, value: String) {
        self.controller.edit_settings_draft(value);
    }

    #[wasm_bindgen(js_name = saveSettings)]
    pub fn save_settings(&mut self) {
        self.controller.save_settings_draft();
    }

    #[wasm_bindgen(js_name = cancelSettings)]
    pub fn cancel_settings(&mut self) {
        self.controller.on_settings_cancel();
    }

    #[wasm_bindgen(getter, js_name = settingsOpen)]
    pub fn settings_open(&self) -> bool {
        self.controller.state().settings_open
    }

    #[wasm_bindgen(getter, js_name = identifierField)]
    pub fn identifier_field(&self) -> String {
        self.controller.state().identifier_field.clone()
    }

    #[wasm_bindgen(getter, js_name = canExport)]
    pub fn can_export(&self) -> bool {
        self.controller.can_export()
    }

    #[wasm_bindgen(js_name = tableHtml)]
    pub fn table_html(&self) -> String {
        self.controller.table_html()
    }

    /// Snapshots the table; the page runs the returned job on a later tick
    #[wasm_bindgen(js_name = beginExport)]
    pub fn begin_export(&mut self) -> Result<WebExport, JsError> {
        self.controller
            .begin_export()
            .map(|pending| WebExport {
                pending: Some(pending),
                result: None,
            })
            .map_err(|e| JsError::new(&e.notice().message))
    }

    /// Records the outcome of a finished job for the status line
    #[wasm_bindgen(js_name = finishExport)]
    pub fn finish_export(&mut self, job: &mut WebExport) {
        if let Some(result) = job.result.take() {
            self.controller.finish_export(&result);
        }
    }

    /// Message of the last action, if any
    #[wasm_bindgen(getter)]
    pub fn notice(&self) -> Option<String> {
        self.controller.notice().map(|n| n.message.clone())
    }

    #[wasm_bindgen(getter, js_name = noticeIsError)]
    pub fn notice_is_error(&self) -> bool {
        self.controller.notice().is_some_and(|n| n.is_error())
    }
}

impl Default for WebApp {
    fn default() -> Self {
        WebApp::new()
    }
}

/// A started export; holds the busy flag until run or freed
#[wasm_bindgen]
pub struct WebExport {
    pending: Option<PendingExport>,
    result: Option<crate::error::Result<crate::export::ExportedImage>>,
}

#[wasm_bindgen]
impl WebExport {
    /// Rasterizes the snapshot; returns PNG bytes and the file name
    pub fn run(&mut self) -> Result<ExportPayload, JsError> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| JsError::new("export already ran"))?;

        let result = pending.run();
        let payload = match &result {
            Ok(image) => Ok(ExportPayload {
                file_name: image.file_name.clone(),
                png: image.png.clone(),
            }),
            Err(e) => Err(JsError::new(&e.notice().message)),
        };
        self.result = Some(result);
        payload
    }
}

#[wasm_bindgen]
pub struct ExportPayload {
    file_name: String,
    png: Vec<u8>,
}

#[wasm_bindgen]
impl ExportPayload {
    #[wasm_bindgen(getter, js_name = fileName)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn png(&self) -> Uint8Array {
        Uint8Array::from(self.png.as_slice())
    }
}
