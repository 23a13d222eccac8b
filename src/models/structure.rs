use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Input rule violations. The display text is sent to clients as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("raw_text is required")]
    MissingRawText,

    #[error("structured data is required")]
    MissingData,

    #[error("structured data must contain at least one field")]
    EmptyData,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StructureRequest {
    /// The free-form text to structure. Absent and `null` decode to empty so
    /// they are reported by `validate` rather than as a malformed body.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub raw_text: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl StructureRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    /// Only literal emptiness is rejected, whitespace is left to the model.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.raw_text.is_empty() {
            return Err(ValidationError::MissingRawText);
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StructureResponse {
    /// Fields extracted by the model, keyed by their snake_case name
    pub data: Option<Map<String, Value>>,
}

impl StructureResponse {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data: Some(data) }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.data {
            None => Err(ValidationError::MissingData),
            Some(data) if data.is_empty() => Err(ValidationError::EmptyData),
            Some(_) => Ok(()),
        }
    }

    /// Looks up a top-level field of the extracted data.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_with_text_is_valid() {
        let request = StructureRequest::new("some text to structure");
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn request_with_whitespace_only_is_valid() {
        let request = StructureRequest::new("   ");
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn request_without_text_is_rejected() {
        let err = StructureRequest::new("").validate().unwrap_err();
        assert_eq!(err.to_string(), "raw_text is required");
    }

    #[test]
    fn request_missing_or_null_text_decodes_as_empty() {
        for body in [r#"{}"#, r#"{"raw_text":null}"#] {
            let request: StructureRequest = serde_json::from_str(body).unwrap();
            assert_eq!(request.raw_text, "");
            assert_eq!(request.validate(), Err(ValidationError::MissingRawText));
        }
    }

    #[test]
    fn request_with_wrong_type_does_not_decode() {
        assert!(serde_json::from_str::<StructureRequest>(r#"{"raw_text":42}"#).is_err());
    }

    #[test]
    fn response_with_fields_is_valid() {
        let data = json!({"key": "value"}).as_object().unwrap().clone();
        assert_eq!(StructureResponse::new(data).validate(), Ok(()));
    }

    #[test]
    fn response_without_data_is_rejected() {
        let response = StructureResponse { data: None };
        assert_eq!(response.validate(), Err(ValidationError::MissingData));
    }

    #[test]
    fn response_with_empty_map_is_rejected() {
        let response = StructureResponse::new(Map::new());
        assert_eq!(response.validate(), Err(ValidationError::EmptyData));
    }

    #[test]
    fn response_serializes_under_data_key() {
        let data = json!({"city": "Rome"}).as_object().unwrap().clone();
        let body = serde_json::to_value(StructureResponse::new(data)).unwrap();
        assert_eq!(body, json!({"data": {"city": "Rome"}}));
    }
}
