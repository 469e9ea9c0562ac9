use super::*;

#[test]
fn json_keeps_defaults_for_missing_fields() {
    let cfg = EditorConfig::from_json_str(r#"{ "history_limit": 5 }"#).unwrap();
    assert_eq!(cfg.history_limit, 5);
    assert_eq!(cfg.max_scale, 50.0);
    assert_eq!(cfg.default_interpolation, InterpolationAlgorithm::Linear);
}

#[test]
fn json_rejects_unknown_and_invalid_fields() {
    assert!(EditorConfig::from_json_str(r#"{ "histroy_limit": 5 }"#).is_err());
    assert!(EditorConfig::from_json_str(r#"{ "history_limit": 0 }"#).is_err());
    assert!(EditorConfig::from_json_str(r#"{ "zoom_step": 0.5 }"#).is_err());
}

#[test]
fn env_overrides_apply() {
    let cfg = EditorConfig::default()
        .with_overrides_from(|key| match key {
            "CANVASMARK_HISTORY_LIMIT" => Some("7".to_string()),
            "CANVASMARK_SHOW_MEASURES" => Some(" false ".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(cfg.history_limit, 7);
    assert_eq!(cfg.max_scale, 50.0);
    assert!(!cfg.show_measures);
}

#[test]
fn malformed_env_override_is_rejected() {
    let err = EditorConfig::default()
        .with_overrides_from(|key| {
            (key == "CANVASMARK_MAX_SCALE").then(|| "not-a-number".to_string())
        })
        .unwrap_err();
    assert!(matches!(err, CanvasmarkError::Validation(_)));
    assert!(err.to_string().contains("CANVASMARK_MAX_SCALE"));
}

#[test]
fn zero_history_limit_override_is_rejected() {
    let err = EditorConfig::default()
        .with_overrides_from(|key| (key == "CANVASMARK_HISTORY_LIMIT").then(|| "0".to_string()))
        .unwrap_err();
    assert!(matches!(err, CanvasmarkError::Validation(_)));
}
