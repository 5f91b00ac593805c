use std::{cell::Cell, sync::Arc};

use image::RgbaImage;

use crate::{
    compositor::composite_sheet,
    document::AnimationDocument,
    engine::VectorEngine,
    foundation::core::NaturalSize,
    foundation::error::{SheetError, SheetResult},
    layout::{AUTO_ROWS, SheetGeometry, plan_sheet},
    sampler::sample_frames,
    settings::SheetSettings,
    texture::{TextureHandle, TextureServer},
};

/// The knobs that decide what a sheet looks like.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BakeParameters {
    pub scale: f64,
    pub frame_begin: f64,
    pub frame_end: f64,
    pub frame_count: u32,
    /// Fixed row count, or [`AUTO_ROWS`].
    pub rows: i32,
}

impl Default for BakeParameters {
    fn default() -> Self {
        Self {
            scale: 1.0,
            frame_begin: 0.0,
            frame_end: 0.0,
            frame_count: 1,
            rows: AUTO_ROWS,
        }
    }
}

impl BakeParameters {
    pub fn validate(&self) -> SheetResult<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(SheetError::validation(format!(
                "scale must be finite and > 0 (got {})",
                self.scale
            )));
        }
        if !(self.frame_begin.is_finite() && self.frame_end.is_finite()) {
            return Err(SheetError::validation("frame range must be finite"));
        }
        Ok(())
    }
}

/// A Lottie animation baked into a sprite-sheet texture.
///
/// Every parameter change re-runs the full bake on the calling thread. A
/// failed bake returns its error and leaves the previously installed image,
/// texture, document and parameters in place.
pub struct LottieTexture {
    engine: Box<dyn VectorEngine>,
    textures: Arc<dyn TextureServer>,
    settings: SheetSettings,
    document: Option<AnimationDocument>,
    params: BakeParameters,
    geometry: Option<SheetGeometry>,
    image: Option<Arc<RgbaImage>>,
    texture: Cell<Option<TextureHandle>>,
    bakes: u64,
}

impl LottieTexture {
    /// Empty resource: no document, default parameters, no image.
    pub fn new(engine: Box<dyn VectorEngine>, textures: Arc<dyn TextureServer>) -> Self {
        Self {
            engine,
            textures,
            settings: SheetSettings::default(),
            document: None,
            params: BakeParameters::default(),
            geometry: None,
            image: None,
            texture: Cell::new(None),
            bakes: 0,
        }
    }

    pub fn with_settings(mut self, settings: SheetSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn create_from_document(
        engine: Box<dyn VectorEngine>,
        textures: Arc<dyn TextureServer>,
        document: AnimationDocument,
        params: BakeParameters,
    ) -> SheetResult<Self> {
        let mut tex = Self::new(engine, textures);
        tex.update(document, params)?;
        Ok(tex)
    }

    pub fn create_from_text(
        engine: Box<dyn VectorEngine>,
        textures: Arc<dyn TextureServer>,
        text: &str,
        params: BakeParameters,
    ) -> SheetResult<Self> {
        let document = AnimationDocument::parse(text)?;
        Self::create_from_document(engine, textures, document, params)
    }

    /// Replace the document and every parameter, reload, and re-bake.
    pub fn update(
        &mut self,
        document: AnimationDocument,
        params: BakeParameters,
    ) -> SheetResult<()> {
        params.validate()?;
        self.load_document(&document)?;
        let previous_document = self.document.replace(document);
        let previous_params = std::mem::replace(&mut self.params, params);
        if let Err(err) = self.rebake() {
            self.params = previous_params;
            self.restore_document(previous_document);
            return Err(err);
        }
        Ok(())
    }

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    pub fn document(&self) -> Option<&AnimationDocument> {
        self.document.as_ref()
    }

    pub fn set_document(&mut self, document: AnimationDocument) -> SheetResult<()> {
        if self.document.as_ref() == Some(&document) {
            return Ok(());
        }
        self.load_document(&document)?;
        let previous = self.document.replace(document);
        if let Err(err) = self.rebake() {
            self.restore_document(previous);
            return Err(err);
        }
        Ok(())
    }

    pub fn params(&self) -> BakeParameters {
        self.params
    }

    pub fn scale(&self) -> f64 {
        self.params.scale
    }

    pub fn set_scale(&mut self, scale: f64) -> SheetResult<()> {
        if scale == self.params.scale {
            return Ok(());
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SheetError::validation(format!(
                "scale must be finite and > 0 (got {scale})"
            )));
        }
        self.apply(BakeParameters {
            scale,
            ..self.params
        })
    }

    pub fn frame_begin(&self) -> f64 {
        self.params.frame_begin
    }

    /// Clamped into `[0, total_frame_count]`; pushes `frame_end` forward
    /// when needed.
    pub fn set_frame_begin(&mut self, frame_begin: f64) -> SheetResult<()> {
        if frame_begin == self.params.frame_begin {
            return Ok(());
        }
        let total = self.total_frame_count();
        let frame_begin = frame_begin.max(0.0).min(total);
        self.apply(BakeParameters {
            frame_begin,
            frame_end: self.params.frame_end.max(frame_begin),
            ..self.params
        })
    }

    pub fn frame_end(&self) -> f64 {
        self.params.frame_end
    }

    /// Clamped into `[frame_begin, total_frame_count]`.
    pub fn set_frame_end(&mut self, frame_end: f64) -> SheetResult<()> {
        if frame_end == self.params.frame_end {
            return Ok(());
        }
        let total = self.total_frame_count();
        self.apply(BakeParameters {
            frame_end: frame_end.min(total).max(self.params.frame_begin),
            ..self.params
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.params.frame_count
    }

    pub fn set_frame_count(&mut self, frame_count: u32) -> SheetResult<()> {
        if frame_count == self.params.frame_count {
            return Ok(());
        }
        self.apply(BakeParameters {
            frame_count,
            ..self.params
        })
    }

    pub fn rows(&self) -> i32 {
        self.params.rows
    }

    /// Values `<= 0` select automatic rows; others are capped at `frame_count`.
    pub fn set_rows(&mut self, rows: i32) -> SheetResult<()> {
        if rows == self.params.rows {
            return Ok(());
        }
        let cap = i32::try_from(self.params.frame_count).unwrap_or(i32::MAX);
        let rows = if rows <= 0 {
            AUTO_ROWS
        } else {
            rows.min(cap.max(1))
        };
        self.apply(BakeParameters { rows, ..self.params })
    }

    /// Unscaled animation size as reported by the engine.
    pub fn natural_size(&self) -> NaturalSize {
        self.engine.natural_size()
    }

    pub fn total_frame_count(&self) -> f64 {
        self.engine.total_frame_count()
    }

    /// Animation duration in seconds as reported by the engine.
    pub fn duration(&self) -> f64 {
        self.engine.duration()
    }

    /// Geometry of the installed sheet.
    pub fn geometry(&self) -> Option<&SheetGeometry> {
        self.geometry.as_ref()
    }

    pub fn effective_scale(&self) -> Option<f64> {
        self.geometry.map(|g| g.effective_scale)
    }

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.image.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.image.as_ref().map_or(0, |img| img.width())
    }

    pub fn height(&self) -> u32 {
        self.image.as_ref().map_or(0, |img| img.height())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn has_alpha(&self) -> bool {
        true
    }

    /// Whether the sheet pixel is visibly opaque. Out-of-range pixels and a
    /// missing image count as opaque.
    pub fn is_pixel_opaque(&self, x: u32, y: u32) -> bool {
        match &self.image {
            Some(img) => img
                .get_pixel_checked(x, y)
                .is_none_or(|px| f32::from(px.0[3]) / 255.0 > 0.1),
            None => true,
        }
    }

    /// Number of successful bakes so far.
    pub fn bake_count(&self) -> u64 {
        self.bakes
    }

    /// Handle of the host texture showing this sheet.
    ///
    /// Created as a placeholder on first access when nothing has been baked
    /// yet. The handle stays the same across re-bakes; only its content is
    /// replaced.
    pub fn texture(&self) -> TextureHandle {
        if let Some(handle) = self.texture.get() {
            return handle;
        }
        let handle = self.textures.create_placeholder();
        self.texture.set(Some(handle));
        handle
    }

    fn load_document(&mut self, document: &AnimationDocument) -> SheetResult<()> {
        let text = document.engine_text()?;
        self.engine
            .check(&text)
            .map_err(|e| SheetError::unrecognized(e.to_string()))?;
        self.engine.load(&text).map_err(|e| SheetError::EngineLoad {
            kind: e.kind,
            message: e.message,
        })
    }

    /// Bake with `params`; the previous parameters come back if the bake fails.
    fn apply(&mut self, params: BakeParameters) -> SheetResult<()> {
        let previous = std::mem::replace(&mut self.params, params);
        if let Err(err) = self.rebake() {
            self.params = previous;
            return Err(err);
        }
        Ok(())
    }

    fn restore_document(&mut self, previous: Option<AnimationDocument>) {
        if let Some(doc) = &previous
            && let Err(err) = self.load_document(doc)
        {
            tracing::warn!(%err, "failed to reload the previous document");
        }
        self.document = previous;
    }

    #[tracing::instrument(skip(self), fields(params = ?self.params))]
    fn rebake(&mut self) -> SheetResult<()> {
        if self.document.is_none() || self.params.frame_count == 0 {
            return Ok(());
        }

        let geometry = plan_sheet(
            self.params.frame_count,
            self.params.rows,
            self.params.scale,
            self.engine.natural_size(),
            self.settings.max_dimension,
        )?;
        let samples = sample_frames(
            self.params.frame_begin,
            self.params.frame_end,
            self.params.frame_count,
        );
        let sheet = composite_sheet(self.engine.as_mut(), &geometry, samples)?;
        self.install(sheet, geometry)
    }

    fn install(&mut self, sheet: RgbaImage, geometry: SheetGeometry) -> SheetResult<()> {
        let sheet = Arc::new(sheet);
        let fresh = self.textures.create_from_image(Arc::clone(&sheet));
        let handle = match self.texture.get() {
            Some(current) => {
                if let Err(e) = self.textures.replace(current, fresh) {
                    self.textures.release(fresh);
                    return Err(e);
                }
                current
            }
            None => {
                self.texture.set(Some(fresh));
                fresh
            }
        };

        self.image = Some(sheet);
        self.geometry = Some(geometry);
        self.bakes += 1;
        tracing::debug!(
            texture = handle.0,
            bake = self.bakes,
            width = geometry.sheet_width(),
            height = geometry.sheet_height(),
            rows = geometry.rows,
            columns = geometry.columns,
            "installed sprite sheet"
        );
        Ok(())
    }
}

impl Drop for LottieTexture {
    fn drop(&mut self) {
        if let Some(handle) = self.texture.take() {
            self.textures.release(handle);
        }
    }
}

impl std::fmt::Debug for LottieTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LottieTexture")
            .field("params", &self.params)
            .field("geometry", &self.geometry)
            .field("texture", &self.texture.get())
            .field("bakes", &self.bakes)
            .finish_non_exhaustive()
    }
}
