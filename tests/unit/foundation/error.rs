use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CanvasmarkError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        CanvasmarkError::precondition("x")
            .to_string()
            .contains("precondition failed:")
    );
    assert!(
        CanvasmarkError::persistence("x")
            .to_string()
            .contains("persistence error:")
    );
    assert!(
        CanvasmarkError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        CanvasmarkError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CanvasmarkError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: CanvasmarkError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, CanvasmarkError::Serde(_)));
}
