use crate::code::CodeRenderer;
use crate::error::{AppError, Result};
use crate::font::{Typeface, Weight};
use crate::table::TableView;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, imageops};
use log::{debug, info};
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const FONT_SIZE: u32 = 14;
const CELL_PADDING: u32 = 16;
const MIN_TABLE_WIDTH: u32 = 650;

/// Longest side of an exported image, in device pixels
pub const MAX_SIDE: u32 = 32_768;

const TEXT_COLOR: Rgb<u8> = Rgb([33, 33, 33]);
const HEADER_FILL: RGBColor = RGBColor(245, 245, 245);
const GRID_COLOR: RGBColor = RGBColor(224, 224, 224);

/// A finished export: PNG bytes plus the name to save them under
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub file_name: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Column widths and row heights of a table, in logical pixels
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub column_widths: Vec<u32>,
    pub header_height: u32,
    pub row_height: u32,
    pub width: u32,
    pub height: u32,
}

fn overflow() -> AppError {
    AppError::raster("table dimensions overflow")
}

impl Layout {
    /// Measures every label and cell of `view`
    ///
    /// The last entry of `column_widths` is the code column. Tables narrower
    /// than 650 px are widened evenly.
    ///
    /// # Errors
    /// * `Rasterization` when a dimension does not fit in `u32`
    pub fn measure(view: &TableView, code_size: u32) -> Result<Self> {
        Self::measure_with(&Typeface::embedded()?, view, code_size)
    }

    fn measure_with(face: &Typeface, view: &TableView, code_size: u32) -> Result<Self> {
        let px = FONT_SIZE as f32;
        let mut column_widths: Vec<u32> = Vec::with_capacity(view.columns.len() + 1);
        let mut text_height = FONT_SIZE;

        for (i, column) in view.columns.iter().enumerate() {
            let (mut widest, h) = face.measure(column, px, Weight::Bold);
            text_height = text_height.max(h);
            for row in &view.rows {
                let (w, h) = face.measure(&row.cells[i], px, Weight::Regular);
                widest = widest.max(w);
                text_height = text_height.max(h);
            }
            column_widths.push(widest.checked_add(2 * CELL_PADDING).ok_or_else(overflow)?);
        }

        let (label_width, h) = face.measure(&view.code_header, px, Weight::Bold);
        text_height = text_height.max(h);
        column_widths.push(
            label_width
                .max(code_size)
                .checked_add(2 * CELL_PADDING)
                .ok_or_else(overflow)?,
        );

        let natural = column_widths
            .iter()
            .try_fold(0u32, |sum, w| sum.checked_add(*w))
            .ok_or_else(overflow)?;
        if natural < MIN_TABLE_WIDTH {
            let extra = MIN_TABLE_WIDTH - natural;
            let count = column_widths.len() as u32;
            for (i, width) in column_widths.iter_mut().enumerate() {
                *width += extra / count;
                if i as u32 == count - 1 {
                    *width += extra % count;
                }
            }
        }

        let header_height = text_height + 2 * CELL_PADDING;
        let row_height = code_size
            .max(text_height)
            .checked_add(2 * CELL_PADDING)
            .ok_or_else(overflow)?;
        let width = natural.max(MIN_TABLE_WIDTH);
        let height = u32::try_from(view.rows.len())
            .ok()
            .and_then(|rows| row_height.checked_mul(rows))
            .and_then(|body| body.checked_add(header_height))
            .ok_or_else(overflow)?;

        Ok(Layout {
            column_widths,
            header_height,
            row_height,
            width,
            height,
        })
    }

    /// Left edge of every column, followed by the right edge of the table
    fn column_edges(&self) -> Vec<u32> {
        let mut edges = Vec::with_capacity(self.column_widths.len() + 1);
        let mut x = 0;
        edges.push(x);
        for width in &self.column_widths {
            x += width;
            edges.push(x);
        }
        edges
    }

    /// Number of body rows that fit under [`MAX_SIDE`] at `scale`
    pub fn max_rows(&self, scale: u32) -> usize {
        let limit = MAX_SIDE / scale.max(1);
        if self.width > limit || self.header_height > limit {
            return 0;
        }
        ((limit - self.header_height) / self.row_height.max(1)) as usize
    }
}

/// Draws a [`TableView`] into a PNG at a fixed scale on white
#[derive(Clone, Copy, Debug)]
pub struct Rasterizer {
    codes: CodeRenderer,
    scale: u32,
}

impl Rasterizer {
    pub fn new(codes: CodeRenderer, scale: u32) -> Self {
        Rasterizer {
            codes,
            scale: scale.max(1),
        }
    }

    /// Rasterizes the table
    ///
    /// Background and grid are drawn with plotters, then text is set with
    /// the embedded typeface and codes rendered at the scaled size are
    /// copied onto the canvas.
    ///
    /// # Arguments
    /// * `view` - The table surface to capture
    ///
    /// # Returns
    /// * `Result<RgbImage>` - The snapshot, `scale` times the logical size
    ///
    /// # Errors
    /// * `NothingToExport` for a table without rows
    /// * `TooLarge` when a side would exceed [`MAX_SIDE`]
    /// * `Rasterization` when drawing fails
    pub fn rasterize(&self, view: &TableView) -> Result<RgbImage> {
        if view.is_empty() {
            return Err(AppError::NothingToExport);
        }

        let face = Typeface::embedded()?;
        let layout = Layout::measure_with(&face, view, self.codes.size())?;
        let scale = self.scale;
        let full_width = u64::from(layout.width) * u64::from(scale);
        let full_height = u64::from(layout.height) * u64::from(scale);
        if full_width > u64::from(MAX_SIDE) || full_height > u64::from(MAX_SIDE) {
            return Err(AppError::TooLarge {
                width: full_width,
                height: full_height,
                max_rows: layout.max_rows(scale),
            });
        }
        let (width, height) = (full_width as u32, full_height as u32);
        debug!(
            "rasterizing {} rows into {}x{} px",
            view.rows.len(),
            width,
            height
        );

        let edges: Vec<i32> = layout
            .column_edges()
            .iter()
            .map(|x| (x * scale) as i32)
            .collect();
        let header_height = (layout.header_height * scale) as i32;
        let row_height = (layout.row_height * scale) as i32;
        let line = scale as i32;

        let mut buffer = vec![0xFF; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(AppError::raster)?;

            root.draw(&Rectangle::new(
                [(0, 0), (width as i32, header_height)],
                HEADER_FILL.filled(),
            ))
            .map_err(AppError::raster)?;

            for r in 0..=view.rows.len() {
                let bottom = header_height + row_height * r as i32;
                root.draw(&Rectangle::new(
                    [(0, bottom - line), (width as i32, bottom)],
                    GRID_COLOR.filled(),
                ))
                .map_err(AppError::raster)?;
            }

            root.present().map_err(AppError::raster)?;
        }

        let mut canvas = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| AppError::raster("canvas buffer has the wrong size"))?;

        let px = (FONT_SIZE * scale) as f32;
        for (i, label) in view.header_labels().enumerate() {
            let center = ((edges[i] + edges[i + 1]) / 2, header_height / 2);
            face.draw_centered(&mut canvas, label, center, px, Weight::Bold, TEXT_COLOR);
        }

        for (r, row) in view.rows.iter().enumerate() {
            let middle = header_height + row_height * r as i32 + row_height / 2;
            for (i, cell) in row.cells.iter().enumerate() {
                let center = ((edges[i] + edges[i + 1]) / 2, middle);
                face.draw_centered(&mut canvas, cell, center, px, Weight::Regular, TEXT_COLOR);
            }
        }

        let codes = self.codes.scaled(scale);
        let code_size = codes.size() as i32;
        let code_column = view.columns.len();
        let code_x = (edges[code_column] + edges[code_column + 1] - code_size) / 2;
        for (r, row) in view.rows.iter().enumerate() {
            let code = DynamicImage::ImageLuma8(codes.render(&row.payload)).to_rgb8();
            let code_y = header_height + row_height * r as i32 + (row_height - code_size) / 2;
            imageops::overlay(&mut canvas, &code, code_x as i64, code_y as i64);
        }

        Ok(canvas)
    }

    /// Rasterizes the table and encodes it as PNG
    pub fn export(&self, view: &TableView, file_name: &str) -> Result<ExportedImage> {
        let canvas = self.rasterize(view)?;
        let (width, height) = canvas.dimensions();

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(AppError::raster)?;

        info!(
            "exported {} rows as {} ({}x{} px, {} bytes)",
            view.rows.len(),
            file_name,
            width,
            height,
            png.len()
        );

        Ok(ExportedImage {
            file_name: file_name.to_string(),
            png,
            width,
            height,
        })
    }
}

/// Busy flag serializing exports
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct ExportLock {
    busy: Arc<AtomicBool>,
}

impl ExportLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the flag, or fails with `ExportBusy` if it is already held
    pub fn try_acquire(&self) -> Result<ExportGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::ExportBusy)?;

        Ok(ExportGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Holds the busy flag until dropped
#[derive(Debug)]
pub struct ExportGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// An export that has been started but not yet rasterized
///
/// Owns a snapshot of the table, so the controller may keep changing while
/// this is pending. The busy flag is released when this value is consumed
/// by [`PendingExport::run`] or dropped.
#[derive(Debug)]
pub struct PendingExport {
    view: TableView,
    rasterizer: Rasterizer,
    file_name: String,
    _guard: ExportGuard,
}

impl PendingExport {
    pub(crate) fn new(
        view: TableView,
        rasterizer: Rasterizer,
        file_name: String,
        guard: ExportGuard,
    ) -> Self {
        PendingExport {
            view,
            rasterizer,
            file_name,
            _guard: guard,
        }
    }

    /// The captured table
    pub fn view(&self) -> &TableView {
        &self.view
    }

    pub fn run(self) -> Result<ExportedImage> {
        self.rasterizer.export(&self.view, &self.file_name)
    }
}

/// Destination of a finished export
pub trait DownloadSink {
    fn deliver(&mut self, image: &ExportedImage) -> Result<()>;
}

/// Saves exports as files in a directory
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        DirectorySink {
            dir: dir.as_ref().to_path_buf(),
            saved: Vec::new(),
        }
    }

    /// Paths written so far, oldest first
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, image: &ExportedImage) -> Result<()> {
        let path = self.dir.join(&image.file_name);
        std::fs::write(&path, &image.png).map_err(|source| AppError::Save {
            file_name: image.file_name.clone(),
            source,
        })?;

        info!("saved {}", path.display());
        self.saved.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RowRecord, Sheet};

    fn sample_view() -> TableView {
        let sheet = Sheet::from_rows(vec![
            [("ID", "A1"), ("Name", "X")].into_iter().collect(),
            [("ID", "A2"), ("Name", "Y")].into_iter().collect(),
        ]);
        TableView::build(&sheet, "ID", "QR Code")
    }

    #[test]
    fn layout_respects_minimum_width() {
        let layout = Layout::measure(&sample_view(), 100).unwrap();

        assert_eq!(layout.width, MIN_TABLE_WIDTH);
        assert_eq!(layout.column_widths.len(), 3);
        assert_eq!(layout.column_widths.iter().sum::<u32>(), layout.width);
        assert_eq!(layout.row_height, 100 + 2 * CELL_PADDING);
        assert_eq!(
            layout.height,
            layout.header_height + 2 * layout.row_height
        );
    }

    #[test]
    fn code_column_fits_the_code() {
        let layout = Layout::measure(&sample_view(), 300).unwrap();
        let code_column = layout.column_widths[2];
        assert!(code_column >= 300 + 2 * CELL_PADDING);
    }

    #[test]
    fn lock_allows_one_holder_at_a_time() {
        let lock = ExportLock::new();
        let guard = lock.try_acquire().unwrap();

        assert!(lock.is_busy());
        assert!(matches!(lock.clone().try_acquire(), Err(AppError::ExportBusy)));

        drop(guard);
        assert!(!lock.is_busy());
        assert!(lock.try_acquire().is_ok());
    }

    #[test]
    fn empty_table_is_not_rasterized() {
        let view = TableView::build(&Sheet::default(), "ID", "QR Code");
        let rasterizer = Rasterizer::new(CodeRenderer::default(), 2);
        assert!(matches!(
            rasterizer.rasterize(&view),
            Err(AppError::NothingToExport)
        ));
    }

    #[test]
    fn oversized_surface_is_rejected() {
        let rows: Vec<RowRecord> = (0..400)
            .map(|i| [("ID", format!("row-{i}"))].into_iter().collect::<RowRecord>())
            .collect();
        let view = TableView::build(&Sheet::from_rows(rows), "ID", "QR Code");
        let rasterizer = Rasterizer::new(CodeRenderer::default(), 2);

        match rasterizer.rasterize(&view) {
            Err(AppError::TooLarge {
                height, max_rows, ..
            }) => {
                assert!(height > u64::from(MAX_SIDE));
                assert!(max_rows > 100 && max_rows < 400, "max_rows = {max_rows}");
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn max_rows_fit_under_the_limit() {
        let layout = Layout::measure(&sample_view(), 100).unwrap();
        let rows = layout.max_rows(2) as u32;

        assert!((layout.header_height + layout.row_height * rows) * 2 <= MAX_SIDE);
        assert!((layout.header_height + layout.row_height * (rows + 1)) * 2 > MAX_SIDE);
    }

    #[test]
    fn huge_scale_is_an_error_not_a_panic() {
        let rasterizer = Rasterizer::new(CodeRenderer::default(), 10_000_000);
        assert!(matches!(
            rasterizer.rasterize(&sample_view()),
            Err(AppError::TooLarge { max_rows: 0, .. })
        ));
    }

    #[test]
    fn huge_code_size_is_an_error_not_a_panic() {
        assert!(matches!(
            Layout::measure(&sample_view(), u32::MAX),
            Err(AppError::Rasterization(_))
        ));

        let rasterizer = Rasterizer::new(CodeRenderer::new(u32::MAX), 2);
        assert!(matches!(
            rasterizer.rasterize(&sample_view()),
            Err(AppError::Rasterization(_))
        ));
    }

    #[test]
    fn header_text_is_drawn() {
        let rasterizer = Rasterizer::new(CodeRenderer::default(), 1);
        let view = sample_view();
        let layout = Layout::measure(&view, 100).unwrap();
        let image = rasterizer.rasterize(&view).unwrap();

        let header_ink = (0..layout.column_widths[0])
            .flat_map(|x| (0..layout.header_height).map(move |y| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y).0[0] < 0x80)
            .count();
        assert!(header_ink > 0);
    }
}
