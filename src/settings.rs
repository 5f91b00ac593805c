use crate::layout::MAX_DIMENSION;

/// Environment override for [`SheetSettings::max_dimension`].
pub const MAX_DIMENSION_ENV: &str = "LOTTIE_SHEET_MAX_DIMENSION";

/// Host-level limits for baking.
///
/// `max_dimension` defaults to the fixed [`MAX_DIMENSION`] (16384 px). Hosts
/// may move that limit through [`MAX_DIMENSION_ENV`] or the CLI's
/// `--max-dimension`; nothing else about planning changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetSettings {
    /// Largest sheet edge in pixels.
    pub max_dimension: u32,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl SheetSettings {
    /// Defaults, with `LOTTIE_SHEET_MAX_DIMENSION` applied when it holds a
    /// positive integer.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_dimension = lookup(MAX_DIMENSION_ENV)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(MAX_DIMENSION);
        Self { max_dimension }
    }
}
