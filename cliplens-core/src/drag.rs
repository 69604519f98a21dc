//! The payload carried on the platform drag-and-drop channel.

use serde::{Deserialize, Serialize};

use crate::error::{CliplensError, Result};
use crate::filter::KeyframeId;

/// JSON payload set on `DataTransfer` when a result thumbnail drag starts.
/// The keyframe id may be absent; such a payload still carries the image
/// reference but cannot compose a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    pub src: String,
    #[serde(
        rename = "keyframeId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub keyframe_id: Option<KeyframeId>,
}

impl DragPayload {
    pub fn new(src: impl Into<String>, keyframe_id: Option<KeyframeId>) -> Self {
        Self {
            src: src.into(),
            keyframe_id,
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing this struct cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| CliplensError::MalformedDragPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let payload = DragPayload::new("/thumbs/7.jpg", Some(7));
        let parsed = DragPayload::from_json(&payload.to_json()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn keyframe_id_is_optional() {
        let parsed = DragPayload::from_json(r#"{"src":"/thumbs/7.jpg"}"#).unwrap();
        assert_eq!(parsed.keyframe_id, None);
        assert_eq!(parsed.src, "/thumbs/7.jpg");
        assert!(!parsed.to_json().contains("keyframeId"));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = DragPayload::from_json("not json").unwrap_err();
        assert!(matches!(err, CliplensError::MalformedDragPayload(_)));
    }
}
