use std::path::PathBuf;

use lottie_sheet::{
    BakeParameters, CpuLottieEngine, LottieTexture, SheetError, SheetSettings, TextureRegistry,
    artifact, load_artifact, load_artifact_file, save_artifact, save_artifact_file,
};

fn temp_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("artifact_tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn square_text() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/square.json");
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn saved_artifact_reloads_with_same_parameters() {
    let params = BakeParameters {
        scale: 0.5,
        frame_begin: 5.0,
        frame_end: 45.0,
        frame_count: 6,
        rows: 2,
    };
    let tex = LottieTexture::create_from_text(
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        &square_text(),
        params,
    )
    .unwrap();

    let text = save_artifact(&tex).unwrap();
    let reloaded = load_artifact(
        &text,
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        SheetSettings::default(),
    )
    .unwrap();

    assert_eq!(reloaded.params(), params);
    assert_eq!(reloaded.size(), tex.size());
    assert_eq!(reloaded.image().unwrap().as_raw(), tex.image().unwrap().as_raw());
}

#[test]
fn saved_text_keeps_animation_keys_first() {
    let tex = LottieTexture::create_from_text(
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        &square_text(),
        BakeParameters::default(),
    )
    .unwrap();

    let text = save_artifact(&tex).unwrap();
    let v = text.find("\"v\"").unwrap();
    let layers = text.find("\"layers\"").unwrap();
    let scale = text.find(artifact::KEY_SCALE).unwrap();
    assert!(v < layers && layers < scale);
}

#[test]
fn file_round_trip() {
    let dir = temp_dir("file_round_trip");
    let path = dir.join("anim.json");
    let mut tex = LottieTexture::create_from_text(
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        &square_text(),
        BakeParameters::default(),
    )
    .unwrap();
    tex.set_frame_count(4).unwrap();
    save_artifact_file(&path, &tex).unwrap();

    let loaded = load_artifact_file(
        &path,
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        SheetSettings::default(),
    )
    .unwrap();
    assert_eq!(loaded.frame_count(), 4);
    assert_eq!(loaded.size(), (200, 200));
}

#[test]
fn non_lottie_json_is_unrecognized() {
    let registry = TextureRegistry::shared();
    let err = load_artifact(
        r#"{"name": "not an animation"}"#,
        Box::new(CpuLottieEngine::new()),
        registry.clone(),
        SheetSettings::default(),
    )
    .unwrap_err();

    let SheetError::UnrecognizedFormat { reason } = err else {
        panic!("expected unrecognized format");
    };
    assert!(reason.starts_with("not a valid Lottie"));
    assert!(registry.is_empty());
}

#[test]
fn unknown_extension_and_missing_file() {
    let dir = temp_dir("unknown_extension");
    let err = load_artifact_file(
        dir.join("anim.lottie"),
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        SheetSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SheetError::UnrecognizedFormat { .. }));

    let missing = dir.join("missing.json");
    let err = load_artifact_file(
        &missing,
        Box::new(CpuLottieEngine::new()),
        TextureRegistry::shared(),
        SheetSettings::default(),
    )
    .unwrap_err();
    let SheetError::Io { path, .. } = err else {
        panic!("expected io error");
    };
    assert_eq!(path, missing);
}
