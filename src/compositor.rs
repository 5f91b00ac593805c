use image::RgbaImage;

use crate::{
    engine::{SeekStatus, VectorEngine},
    foundation::error::{RasterStage, SheetError, SheetResult},
    layout::SheetGeometry,
    pixel::{PixelLayout, to_straight_rgba},
    sampler::FrameSamples,
};

/// An attached engine surface plus the cell buffer it syncs into.
///
/// Dropping the lease detaches the surface, so every exit path from a bake
/// leaves the engine without a target.
struct SurfaceLease<'a> {
    engine: &'a mut dyn VectorEngine,
    buffer: Vec<u32>,
    width: u32,
    height: u32,
}

impl<'a> SurfaceLease<'a> {
    fn attach(engine: &'a mut dyn VectorEngine, width: u32, height: u32) -> SheetResult<Self> {
        let mut lease = Self {
            engine,
            buffer: vec![0; width as usize * height as usize],
            width,
            height,
        };
        lease
            .engine
            .attach_surface(width, height)
            .map_err(|e| lease.fail(RasterStage::Attach, e))?;
        Ok(lease)
    }

    fn fail(&self, stage: RasterStage, err: impl std::fmt::Display) -> SheetError {
        SheetError::rasterization(stage, (self.width, self.height), err.to_string())
    }

    fn render(&mut self) -> SheetResult<()> {
        if let Err(e) = self.engine.draw() {
            return Err(self.fail(RasterStage::Draw, e));
        }
        if let Err(e) = self.engine.sync(&mut self.buffer) {
            return Err(self.fail(RasterStage::Sync, e));
        }
        Ok(())
    }
}

impl Drop for SurfaceLease<'_> {
    fn drop(&mut self) {
        self.engine.clear_surface(false);
    }
}

/// Rasterize every sample into its grid cell and return the finished sheet.
///
/// The engine must already hold the animation. Nothing is returned on
/// failure; the partially written sheet is dropped.
#[tracing::instrument(skip(engine, samples), fields(samples = samples.len()))]
pub fn composite_sheet(
    engine: &mut dyn VectorEngine,
    geometry: &SheetGeometry,
    samples: FrameSamples,
) -> SheetResult<RgbaImage> {
    let mut sheet = RgbaImage::new(geometry.sheet_width(), geometry.sheet_height());
    let layout = engine.pixel_layout();
    let mut lease = SurfaceLease::attach(engine, geometry.cell_width, geometry.cell_height)?;

    for (index, frame) in (0u32..).zip(samples) {
        if index >= geometry.cell_count() {
            break;
        }
        match lease.engine.seek(frame) {
            SeekStatus::Updated => lease.engine.update(),
            // The surface has never been drawn, so the first cell always refreshes.
            SeekStatus::Unchanged if index == 0 => lease.engine.update(),
            SeekStatus::Unchanged => {}
            SeekStatus::Failed(reason) if index == 0 => {
                tracing::warn!(frame, %reason, "seek to first sample failed; drawing anyway");
                lease.engine.update();
            }
            SeekStatus::Failed(reason) => {
                return Err(lease.fail(
                    RasterStage::Seek,
                    format!("seek to frame {frame} failed: {reason}"),
                ));
            }
        }

        lease.render()?;
        let (x0, y0) = geometry.cell_origin(index);
        blit_cell(&mut sheet, &lease.buffer, lease.width, (x0, y0), layout);
        lease.engine.clear_surface(true);
    }

    Ok(sheet)
}

fn blit_cell(
    sheet: &mut RgbaImage,
    cell: &[u32],
    cell_width: u32,
    (x0, y0): (u32, u32),
    layout: PixelLayout,
) {
    for (i, &px) in cell.iter().enumerate() {
        let i = i as u32;
        let (x, y) = (i % cell_width, i / cell_width);
        sheet.put_pixel(x0 + x, y0 + y, image::Rgba(to_straight_rgba(px, layout)));
    }
}
