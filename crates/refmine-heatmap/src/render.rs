//! PNG heatmap rendering.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use refmine_core::{LabeledMatrix, RefmineError};
use tracing::debug;

use crate::colormap::Colormap;

const BACKGROUND: [u8; 3] = [0xff, 0xff, 0xff];
const MISSING: [u8; 3] = [0xd0, 0xd0, 0xd0];

/// Everything a renderer needs to draw one matrix.
pub struct HeatmapRequest<'a> {
    /// Values to draw; row labels travel with the rows.
    pub matrix: &'a LabeledMatrix,
    pub title: &'a str,
    /// Caption of the color bar, e.g. `Co-occurrence [likelihood]`.
    pub colorbar_label: &'a str,
    pub colormap: Colormap,
}

/// Turns a labeled matrix into an image file.
pub trait HeatmapRenderer {
    /// Render `request` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Render`] for an empty matrix or an encoder
    /// failure, and [`RefmineError::Io`] if the file cannot be written.
    fn render(&self, request: &HeatmapRequest<'_>, path: &Path) -> Result<(), RefmineError>;
}

/// Renders one square cell per value plus a vertical color bar.
///
/// The image grows with the matrix. No text is drawn on the image: title,
/// row and column labels and the color bar caption exist only as PNG `tEXt`
/// chunks (`Title`, `Rows`, `Columns`, `Description`, one label per line).
/// Read them with a metadata tool such as `exiftool` or `pngcheck -t`, or
/// from the `*.csv` artifact of the same threshold, whose rows and columns
/// are in the same order as the cells.
///
/// # Examples
///
/// ```
/// use refmine_heatmap::render::PngRenderer;
///
/// let renderer = PngRenderer::new(10);
/// assert_eq!(renderer.canvas_size(2, 3).unwrap(), (5 + 30 + 10 + 3 + 5, 5 + 20 + 5));
/// ```
#[derive(Debug, Clone)]
pub struct PngRenderer {
    cell_size: u32,
}

impl PngRenderer {
    /// `cell_size` is clamped to at least one pixel.
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size: cell_size.max(1),
        }
    }

    fn margin(&self) -> u32 {
        (self.cell_size / 2).max(1)
    }

    fn bar_width(&self) -> u32 {
        (self.cell_size / 3).max(1)
    }

    /// Image `(width, height)` in pixels for a `rows` × `cols` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Render`] if the image would not fit in `u32`.
    pub fn canvas_size(&self, rows: usize, cols: usize) -> Result<(u32, u32), RefmineError> {
        let too_large = || RefmineError::Render(format!("a {rows}x{cols} heatmap is too large"));
        let rows = u32::try_from(rows).map_err(|_| too_large())?;
        let cols = u32::try_from(cols).map_err(|_| too_large())?;
        let m = self.margin();
        let grid_w = cols.checked_mul(self.cell_size).ok_or_else(too_large)?;
        let grid_h = rows.checked_mul(self.cell_size).ok_or_else(too_large)?;
        let width = grid_w
            .checked_add(4 * m + self.bar_width())
            .ok_or_else(too_large)?;
        let height = grid_h.checked_add(2 * m).ok_or_else(too_large)?;
        Ok((width, height))
    }

    fn draw(&self, request: &HeatmapRequest<'_>, width: u32, height: u32) -> Vec<u8> {
        let matrix = request.matrix;
        let (rows, cols) = matrix.shape();
        let cell = self.cell_size;
        let m = self.margin();
        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        for px in pixels.chunks_exact_mut(3) {
            px.copy_from_slice(&BACKGROUND);
        }

        let (lo, hi) = matrix.value_range().unwrap_or((0.0, 1.0));
        let normalize = |v: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 };
        let mut put = |x: u32, y: u32, color: [u8; 3]| {
            let idx = (y as usize * width as usize + x as usize) * 3;
            pixels[idx..idx + 3].copy_from_slice(&color);
        };

        let separators = cell >= 8;
        for (r, row) in matrix.rows().iter().enumerate() {
            for (c, &v) in row.values.iter().enumerate() {
                let color = if v.is_finite() {
                    request.colormap.color_at(normalize(v))
                } else {
                    MISSING
                };
                let x0 = m + c as u32 * cell;
                let y0 = m + r as u32 * cell;
                for dy in 0..cell {
                    for dx in 0..cell {
                        let edge = separators && (dx == cell - 1 || dy == cell - 1);
                        put(x0 + dx, y0 + dy, if edge { BACKGROUND } else { color });
                    }
                }
            }
        }

        // color bar: maximum at the top
        let grid_h = rows as u32 * cell;
        let bar_x = m + cols as u32 * cell + 2 * m;
        for dy in 0..grid_h {
            let t = if grid_h > 1 {
                1.0 - f64::from(dy) / f64::from(grid_h - 1)
            } else {
                1.0
            };
            let color = request.colormap.color_at(t);
            for dx in 0..self.bar_width() {
                put(bar_x + dx, m + dy, color);
            }
        }
        pixels
    }
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self::new(48)
    }
}

impl HeatmapRenderer for PngRenderer {
    fn render(&self, request: &HeatmapRequest<'_>, path: &Path) -> Result<(), RefmineError> {
        let matrix = request.matrix;
        if matrix.is_empty() {
            return Err(RefmineError::Render(format!(
                "cannot render an empty matrix to {}",
                path.display()
            )));
        }
        let (rows, cols) = matrix.shape();
        let (width, height) = self.canvas_size(rows, cols)?;
        let pixels = self.draw(request, width, height);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let texts = [
            ("Title", request.title.to_string()),
            ("Description", request.colorbar_label.to_string()),
            ("Rows", matrix.row_labels().join("\n")),
            ("Columns", matrix.columns().join("\n")),
            ("Software", "refmine".to_string()),
        ];
        for (keyword, text) in texts {
            encoder
                .add_text_chunk(keyword.to_string(), text)
                .map_err(|e| RefmineError::Render(format!("failed to add {keyword} chunk: {e}")))?;
        }

        let mut writer = encoder
            .write_header()
            .map_err(|e| RefmineError::Render(format!("failed to write PNG header: {e}")))?;
        writer
            .write_image_data(&pixels)
            .map_err(|e| RefmineError::Render(format!("failed to write PNG data: {e}")))?;
        writer
            .finish()
            .map_err(|e| RefmineError::Render(format!("failed to finish PNG: {e}")))?;

        debug!(path = %path.display(), width, height, "heatmap written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> LabeledMatrix {
        let mut m = LabeledMatrix::new(vec!["A".into(), "B".into()]);
        m.push_row("A", vec![0.0, 1.0]).unwrap();
        m.push_row("B", vec![0.5, 0.0]).unwrap();
        m
    }

    fn decode(path: &Path) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(std::io::BufReader::new(File::open(path).unwrap()));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * width as usize + x as usize) * 3;
        [buf[idx], buf[idx + 1], buf[idx + 2]]
    }

    #[test]
    fn image_size_is_proportional_to_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("map.png");
        let matrix = two_by_two();
        let renderer = PngRenderer::new(10);
        let request = HeatmapRequest {
            matrix: &matrix,
            title: "t",
            colorbar_label: "Co-occurrence [P/ Commit]",
            colormap: Colormap::YlGn,
        };
        renderer.render(&request, &path).unwrap();

        let (w, h, _) = decode(&path);
        assert_eq!((w, h), renderer.canvas_size(2, 2).unwrap());
    }

    #[test]
    fn cells_use_min_max_normalized_colors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        let matrix = two_by_two();
        let renderer = PngRenderer::new(10);
        let request = HeatmapRequest {
            matrix: &matrix,
            title: "t",
            colorbar_label: "c",
            colormap: Colormap::YlGn,
        };
        renderer.render(&request, &path).unwrap();

        let (w, _, buf) = decode(&path);
        // margin 5, cell 10: centre of (row 0, col 1) is (20, 10)
        assert_eq!(pixel(&buf, w, 20, 10), Colormap::YlGn.color_at(1.0));
        assert_eq!(pixel(&buf, w, 10, 10), Colormap::YlGn.color_at(0.0));
        assert_eq!(pixel(&buf, w, 10, 20), Colormap::YlGn.color_at(0.5));
    }

    #[test]
    fn labels_are_stored_as_text_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        let mut matrix = LabeledMatrix::new(vec!["Extract Method".into(), "Move Class".into()]);
        matrix.push_row("Rename Class", vec![0.2, 0.4]).unwrap();
        let request = HeatmapRequest {
            matrix: &matrix,
            title: "Co-occurrence on the same commit",
            colorbar_label: "Co-occurrence [P/ Commit]",
            colormap: Colormap::Blues,
        };
        PngRenderer::new(8).render(&request, &path).unwrap();

        let decoder = png::Decoder::new(std::io::BufReader::new(File::open(&path).unwrap()));
        let reader = decoder.read_info().unwrap();
        let text = |keyword: &str| {
            reader
                .info()
                .uncompressed_latin1_text
                .iter()
                .find(|chunk| chunk.keyword == keyword)
                .map(|chunk| chunk.text.clone())
        };
        assert_eq!(text("Title").as_deref(), Some("Co-occurrence on the same commit"));
        assert_eq!(text("Description").as_deref(), Some("Co-occurrence [P/ Commit]"));
        assert_eq!(text("Rows").as_deref(), Some("Rename Class"));
        assert_eq!(text("Columns").as_deref(), Some("Extract Method\nMove Class"));
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        let matrix = LabeledMatrix::new(vec!["A".into()]);
        let request = HeatmapRequest {
            matrix: &matrix,
            title: "t",
            colorbar_label: "c",
            colormap: Colormap::default(),
        };
        let err = PngRenderer::default().render(&request, &path).unwrap_err();
        assert!(matches!(err, RefmineError::Render(_)));
        assert!(!path.exists());
    }
}
