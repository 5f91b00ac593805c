use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use image::RgbaImage;

use crate::foundation::error::{SheetError, SheetResult};

/// Stable identifier of a host texture. Content behind a handle can be
/// swapped without the handle changing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureHandle(pub u64);

/// What a host texture currently shows.
#[derive(Clone, Debug)]
pub enum TextureContent {
    Placeholder,
    Image(Arc<RgbaImage>),
}

/// Host-side texture table the sheet is uploaded into.
pub trait TextureServer: Send + Sync {
    fn create_from_image(&self, image: Arc<RgbaImage>) -> TextureHandle;

    fn create_placeholder(&self) -> TextureHandle;

    /// Move the content of `source` into `target` and invalidate `source`.
    fn replace(&self, target: TextureHandle, source: TextureHandle) -> SheetResult<()>;

    fn release(&self, handle: TextureHandle);
}

#[derive(Clone, Debug)]
pub struct TextureSlot {
    pub content: TextureContent,
    /// Bumped every time the content is replaced in place.
    pub version: u64,
}

/// In-process [`TextureServer`]: handles map to swappable slots.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    slots: HashMap<TextureHandle, TextureSlot>,
}

impl RegistryState {
    fn insert(&mut self, content: TextureContent) -> TextureHandle {
        self.next_id += 1;
        let handle = TextureHandle(self.next_id);
        self.slots.insert(
            handle,
            TextureSlot {
                content,
                version: 0,
            },
        );
        handle
    }
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, handle: TextureHandle) -> Option<TextureSlot> {
        self.lock().slots.get(&handle).cloned()
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.lock().slots.contains_key(&handle)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TextureServer for TextureRegistry {
    fn create_from_image(&self, image: Arc<RgbaImage>) -> TextureHandle {
        self.lock().insert(TextureContent::Image(image))
    }

    fn create_placeholder(&self) -> TextureHandle {
        self.lock().insert(TextureContent::Placeholder)
    }

    fn replace(&self, target: TextureHandle, source: TextureHandle) -> SheetResult<()> {
        let mut state = self.lock();
        if target == source {
            return Ok(());
        }
        if !state.slots.contains_key(&target) {
            return Err(SheetError::validation(format!(
                "replace target texture {target:?} is not live"
            )));
        }
        let incoming = state.slots.remove(&source).ok_or_else(|| {
            SheetError::validation(format!("replace source texture {source:?} is not live"))
        })?;
        if let Some(slot) = state.slots.get_mut(&target) {
            slot.content = incoming.content;
            slot.version += 1;
        }
        Ok(())
    }

    fn release(&self, handle: TextureHandle) {
        self.lock().slots.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(w, h))
    }

    #[test]
    fn replace_keeps_target_handle_and_drops_source() {
        let reg = TextureRegistry::new();
        let target = reg.create_placeholder();
        let source = reg.create_from_image(image(4, 2));

        reg.replace(target, source).unwrap();

        assert!(!reg.contains(source));
        assert_eq!(reg.len(), 1);
        let slot = reg.get(target).unwrap();
        assert_eq!(slot.version, 1);
        let TextureContent::Image(img) = slot.content else {
            panic!("expected image content");
        };
        assert_eq!(img.dimensions(), (4, 2));
    }

    #[test]
    fn replace_rejects_dead_handles() {
        let reg = TextureRegistry::new();
        let live = reg.create_placeholder();
        assert!(reg.replace(live, TextureHandle(999)).is_err());
        assert!(reg.replace(TextureHandle(999), live).is_err());
        assert!(reg.contains(live));
    }

    #[test]
    fn handles_are_unique_and_released() {
        let reg = TextureRegistry::new();
        let a = reg.create_placeholder();
        let b = reg.create_placeholder();
        assert_ne!(a, b);
        reg.release(a);
        assert!(!reg.contains(a));
        assert!(reg.contains(b));
    }
}
