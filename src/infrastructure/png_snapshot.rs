// PNG thumbnail renderer for dashboard snapshots
use crate::application::snapshot::{SnapshotError, SnapshotRenderer};
use crate::domain::dashboard::CellRect;
use crate::domain::widget::WidgetKind;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;

const GAP: u32 = 4;
const MAX_DIMENSION: u32 = 4096;
const BACKGROUND: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const ACCENT: Rgba<u8> = Rgba([0x00, 0x77, 0xe6, 0xff]);
const UNKNOWN_FILL: Rgba<u8> = Rgba([0xf3, 0xf4, 0xf6, 0xff]);

#[derive(Debug, Clone, Copy)]
pub struct PngSnapshotRenderer {
    cell_width: u32,
    cell_height: u32,
}

impl PngSnapshotRenderer {
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
        }
    }

    /// Pixel extent of a span of `units` grid cells of size `cell`, or `None` on overflow.
    fn span(units: u32, cell: u32) -> Option<u32> {
        let gaps = units.saturating_sub(1).checked_mul(GAP)?;
        units.checked_mul(cell)?.checked_add(gaps)
    }

    fn render(&self, layout: &[CellRect], columns: u32) -> Result<RgbaImage, SnapshotError> {
        let unit = |v: i32| v.max(0) as u32;
        // two non-negative i32 values always fit in a u32
        let cols = layout
            .iter()
            .map(|cell| unit(cell.x) + unit(cell.w))
            .fold(columns.max(1), u32::max);
        let rows = layout
            .iter()
            .map(|cell| unit(cell.y) + unit(cell.h))
            .fold(1, u32::max);

        let too_large = || {
            SnapshotError::Render(format!(
                "grid of {cols}x{rows} cells exceeds {MAX_DIMENSION}px"
            ))
        };
        let width = Self::span(cols, self.cell_width)
            .and_then(|span| span.checked_add(2 * GAP))
            .filter(|&width| width <= MAX_DIMENSION)
            .ok_or_else(too_large)?;
        let height = Self::span(rows, self.cell_height)
            .and_then(|span| span.checked_add(2 * GAP))
            .filter(|&height| height <= MAX_DIMENSION)
            .ok_or_else(too_large)?;

        // every cell lies inside the bounded grid, so the offsets below cannot overflow
        let mut img = RgbaImage::from_pixel(width, height, BACKGROUND);
        for cell in layout {
            let (w, h) = (unit(cell.w), unit(cell.h));
            if w == 0 || h == 0 {
                continue;
            }
            let left = GAP + unit(cell.x) * (self.cell_width + GAP);
            let top = GAP + unit(cell.y) * (self.cell_height + GAP);
            let right = left + w * self.cell_width + (w - 1) * GAP;
            let bottom = top + h * self.cell_height + (h - 1) * GAP;
            let fill = WidgetKind::from_cell_id(&cell.id)
                .map(|kind| Rgba(kind.tint()))
                .unwrap_or(UNKNOWN_FILL);

            for y in top..bottom {
                for x in left..right {
                    let edge = x == left || x + 1 == right || y == top || y + 1 == bottom;
                    img.put_pixel(x, y, if edge { ACCENT } else { fill });
                }
            }
        }
        Ok(img)
    }
}

#[async_trait]
impl SnapshotRenderer for PngSnapshotRenderer {
    async fn capture(&self, layout: &[CellRect], columns: u32) -> Result<String, SnapshotError> {
        let renderer = *self;
        let cells = layout.to_vec();
        tokio::task::spawn_blocking(move || {
            let img = renderer.render(&cells, columns)?;
            let mut png = Vec::new();
            DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
                .map_err(|e| SnapshotError::Render(e.to_string()))?;
            tracing::debug!("Rendered {} byte snapshot for {} cells", png.len(), cells.len());
            Ok(format!(
                "data:image/png;base64,{}",
                general_purpose::STANDARD.encode(png)
            ))
        })
        .await
        .map_err(|e| SnapshotError::Worker(e.to_string()))?
    }
}
