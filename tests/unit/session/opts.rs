use super::*;

fn write_tmp(name: &str, body: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "defectpaste_opts_{name}_{}_{nanos}.json",
        std::process::id()
    ));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn defaults_match_editor_defaults() {
    let opts = SessionOpts::default();
    assert_eq!(opts.defect_opacity, 0.7);
    assert_eq!(opts.region_opacity, 0.8);
    assert_eq!(opts.min_selection_extent, 5);
    assert_eq!(opts.crop_margin, 5);
    assert_eq!(opts.mask_threshold, 128);
    assert_eq!(opts.export_base_name, "augmented");
    opts.validate().unwrap();
}

#[test]
fn partial_json_keeps_other_defaults() {
    let path = write_tmp("partial", r#"{ "defect_opacity": 0.5, "export_base_name": "aug" }"#);
    let opts = SessionOpts::from_json_file(&path).unwrap();
    assert_eq!(opts.defect_opacity, 0.5);
    assert_eq!(opts.export_base_name, "aug");
    assert_eq!(opts.region_opacity, 0.8);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn unknown_fields_are_rejected() {
    let path = write_tmp("unknown", r#"{ "defect_opacty": 0.5 }"#);
    let err = SessionOpts::from_json_file(&path).unwrap_err();
    assert!(matches!(err, DefectPasteError::Serde(_)));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn out_of_range_values_are_rejected() {
    let path = write_tmp("range", r#"{ "region_opacity": 1.2 }"#);
    assert!(matches!(
        SessionOpts::from_json_file(&path),
        Err(DefectPasteError::Validation(_))
    ));
    std::fs::remove_file(&path).unwrap();

    let opts = SessionOpts {
        export_base_name: "a/b".to_owned(),
        ..SessionOpts::default()
    };
    assert!(opts.validate().is_err());
}
