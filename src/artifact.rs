//! Lottie JSON files carrying their own bake parameters.
//!
//! Lottie objects tolerate extra top-level keys, so the parameters ride along
//! in the animation document under `gd_*` keys.

use std::{path::Path, sync::Arc};

use serde_json::Value;

use crate::{
    document::AnimationDocument,
    engine::VectorEngine,
    foundation::error::{SheetError, SheetResult},
    resource::{BakeParameters, LottieTexture},
    settings::SheetSettings,
    texture::TextureServer,
};

pub const KEY_SCALE: &str = "gd_scale";
pub const KEY_FRAME_BEGIN: &str = "gd_frame_begin";
pub const KEY_FRAME_END: &str = "gd_frame_end";
pub const KEY_FRAME_COUNT: &str = "gd_frame_count";
pub const KEY_ROWS: &str = "gd_rows";

pub const RECOGNIZED_EXTENSIONS: &[&str] = &["json"];

/// Bake parameters stored in `doc`, with defaults for missing keys.
pub fn read_bake_parameters(doc: &AnimationDocument) -> BakeParameters {
    let defaults = BakeParameters::default();
    let float = |key: &str, default: f64| doc.get(key).and_then(Value::as_f64).unwrap_or(default);
    let int = |key: &str| {
        doc.get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
    };

    BakeParameters {
        scale: float(KEY_SCALE, defaults.scale),
        frame_begin: float(KEY_FRAME_BEGIN, defaults.frame_begin),
        frame_end: float(KEY_FRAME_END, defaults.frame_end),
        frame_count: int(KEY_FRAME_COUNT)
            .map_or(defaults.frame_count, |n| n.clamp(0, i64::from(u32::MAX)) as u32),
        rows: int(KEY_ROWS).map_or(defaults.rows, |n| {
            n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        }),
    }
}

/// `doc` with `params` written over any previous `gd_*` values.
pub fn write_bake_parameters(
    doc: &AnimationDocument,
    params: &BakeParameters,
) -> AnimationDocument {
    doc.with_entries([
        (KEY_SCALE, Value::from(params.scale)),
        (KEY_FRAME_BEGIN, Value::from(params.frame_begin)),
        (KEY_FRAME_END, Value::from(params.frame_end)),
        (KEY_FRAME_COUNT, Value::from(params.frame_count)),
        (KEY_ROWS, Value::from(params.rows)),
    ])
}

/// Parse a stored artifact and bake it.
///
/// The document is checked by `engine` first; one the engine does not
/// recognize yields [`SheetError::UnrecognizedFormat`] and no texture.
pub fn load_artifact(
    text: &str,
    engine: Box<dyn VectorEngine>,
    textures: Arc<dyn TextureServer>,
    settings: SheetSettings,
) -> SheetResult<LottieTexture> {
    let doc = AnimationDocument::parse(text)?;
    engine
        .check(&doc.engine_text()?)
        .map_err(|e| SheetError::unrecognized(format!("not a valid Lottie: {e}")))?;

    let params = read_bake_parameters(&doc);
    let mut tex = LottieTexture::new(engine, textures).with_settings(settings);
    tex.update(doc, params)?;
    Ok(tex)
}

/// Serialize `tex` as its document plus current bake parameters.
pub fn save_artifact(tex: &LottieTexture) -> SheetResult<String> {
    let base = tex
        .document()
        .cloned()
        .unwrap_or_else(|| AnimationDocument::from_map(serde_json::Map::new()));
    write_bake_parameters(&base, &tex.params()).to_text()
}

pub fn is_recognized_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            RECOGNIZED_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
}

pub fn load_artifact_file(
    path: impl AsRef<Path>,
    engine: Box<dyn VectorEngine>,
    textures: Arc<dyn TextureServer>,
    settings: SheetSettings,
) -> SheetResult<LottieTexture> {
    let path = path.as_ref();
    if !is_recognized_path(path) {
        return Err(SheetError::unrecognized(format!(
            "'{}' does not have a recognized extension",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path).map_err(|e| SheetError::io(path, e))?;
    load_artifact(&text, engine, textures, settings)
}

pub fn save_artifact_file(path: impl AsRef<Path>, tex: &LottieTexture) -> SheetResult<()> {
    let path = path.as_ref();
    let text = save_artifact(tex)?;
    std::fs::write(path, text).map_err(|e| SheetError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let doc = AnimationDocument::parse(r#"{"v":"5.7.0"}"#).unwrap();
        assert_eq!(read_bake_parameters(&doc), BakeParameters::default());
    }

    #[test]
    fn keys_are_read_independently() {
        let doc = AnimationDocument::parse(
            r#"{"gd_scale":2.5,"gd_frame_end":30,"gd_frame_count":8.0,"gd_rows":"x"}"#,
        )
        .unwrap();
        let p = read_bake_parameters(&doc);
        assert_eq!(p.scale, 2.5);
        assert_eq!(p.frame_begin, 0.0);
        assert_eq!(p.frame_end, 30.0);
        assert_eq!(p.frame_count, 8);
        assert_eq!(p.rows, -1);
    }

    #[test]
    fn negative_frame_count_reads_as_empty() {
        let doc = AnimationDocument::parse(r#"{"gd_frame_count":-3}"#).unwrap();
        assert_eq!(read_bake_parameters(&doc).frame_count, 0);
    }

    #[test]
    fn written_keys_append_after_animation_data() {
        let doc = AnimationDocument::parse(r#"{"v":"5.7.0","gd_rows":4,"w":64}"#).unwrap();
        let params = BakeParameters {
            scale: 0.5,
            frame_begin: 1.0,
            frame_end: 9.0,
            frame_count: 4,
            rows: 2,
        };
        let out = write_bake_parameters(&doc, &params);
        let keys: Vec<&str> = out.as_map().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "v",
                "gd_rows",
                "w",
                "gd_scale",
                "gd_frame_begin",
                "gd_frame_end",
                "gd_frame_count"
            ]
        );
        assert_eq!(read_bake_parameters(&out), params);
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_recognized_path(Path::new("anim.json")));
        assert!(is_recognized_path(Path::new("dir/ANIM.JSON")));
        assert!(!is_recognized_path(Path::new("anim.lottie")));
        assert!(!is_recognized_path(Path::new("anim")));
    }
}
