/// Auxiliary data attached to an annotation (or to one video frame of it).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubAnnotations {
    /// Free-form text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Instance id shared by annotations of the same object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u64>,
    /// Attribute tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

impl SubAnnotations {
    /// Return `true` when nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.instance_id.is_none() && self.attributes.is_empty()
    }
}
