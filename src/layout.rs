use crate::{
    foundation::core::NaturalSize,
    foundation::error::{SheetError, SheetResult},
};

/// Largest sheet edge, in pixels, the planner will ever produce.
pub const MAX_DIMENSION: u32 = 16384;

/// Row hint meaning "pick a near-square grid".
pub const AUTO_ROWS: i32 = -1;

/// Record of a planner clamp: the sheet that was asked for did not fit.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct GeometryClamp {
    pub requested_cell_width: u32,
    pub requested_cell_height: u32,
    pub requested_scale: f64,
    pub max_dimension: u32,
}

/// Grid of cells making up one sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SheetGeometry {
    pub rows: u32,
    pub columns: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub effective_scale: f64,
    pub clamp: Option<GeometryClamp>,
}

impl SheetGeometry {
    pub fn sheet_width(&self) -> u32 {
        self.cell_width * self.columns
    }

    pub fn sheet_height(&self) -> u32 {
        self.cell_height * self.rows
    }

    pub fn cell_count(&self) -> u32 {
        self.rows * self.columns
    }

    /// `(row, column)` of the cell holding sample `index`.
    pub fn cell_position(&self, index: u32) -> (u32, u32) {
        (index / self.columns, index % self.columns)
    }

    /// Top-left pixel of the cell holding sample `index`.
    pub fn cell_origin(&self, index: u32) -> (u32, u32) {
        let (row, column) = self.cell_position(index);
        (column * self.cell_width, row * self.cell_height)
    }
}

/// Lay out `frame_count` cells of the scaled animation on a grid no larger
/// than `max_dimension` on either edge.
///
/// A negative (or zero) `rows_hint` picks `ceil(sqrt(frame_count))` rows.
/// When the requested cells do not fit, they are shrunk per axis and the
/// reduced scale is reported in [`SheetGeometry::effective_scale`].
pub fn plan_sheet(
    frame_count: u32,
    rows_hint: i32,
    scale: f64,
    origin: NaturalSize,
    max_dimension: u32,
) -> SheetResult<SheetGeometry> {
    if frame_count == 0 {
        return Err(SheetError::validation("frame_count must be >= 1"));
    }
    if !(scale.is_finite() && scale > 0.0) {
        return Err(SheetError::validation(format!(
            "scale must be finite and > 0 (got {scale})"
        )));
    }

    let rows = if rows_hint <= 0 {
        (f64::from(frame_count)).sqrt().ceil() as u32
    } else {
        (rows_hint as u32).min(frame_count)
    };
    let columns = frame_count.div_ceil(rows);

    if rows > max_dimension || columns > max_dimension {
        return Err(SheetError::validation(format!(
            "{rows} rows x {columns} columns cannot fit in {max_dimension}x{max_dimension} pixels"
        )));
    }

    let (mut cell_width, mut cell_height) = origin.scaled_px(scale);
    let mut effective_scale = scale;
    let mut clamp = None;

    let too_wide = u64::from(cell_width) * u64::from(columns) > u64::from(max_dimension);
    let too_tall = u64::from(cell_height) * u64::from(rows) > u64::from(max_dimension);
    if too_wide || too_tall {
        tracing::warn!(
            requested_width = cell_width,
            requested_height = cell_height,
            scale,
            rows,
            columns,
            max_dimension,
            "target canvas exceeds the max supported dimensions; scaling down"
        );
        clamp = Some(GeometryClamp {
            requested_cell_width: cell_width,
            requested_cell_height: cell_height,
            requested_scale: scale,
            max_dimension,
        });
        cell_width = cell_width.min(max_dimension / columns);
        cell_height = cell_height.min(max_dimension / rows);
        effective_scale = (f64::from(cell_width) / origin.width)
            .min(f64::from(cell_height) / origin.height);
    }

    Ok(SheetGeometry {
        rows,
        columns,
        cell_width,
        cell_height,
        effective_scale,
        clamp,
    })
}
