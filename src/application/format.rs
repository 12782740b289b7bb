//! Text encodings a subtree can be read or written in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{properties, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
    Toml,
    /// Flat dotted keys (`a.b = 1`)
    Prop,
    /// A single scalar as plain text
    Value,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Json,
        Format::Yaml,
        Format::Toml,
        Format::Prop,
        Format::Value,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
            Format::Prop => "prop",
            Format::Value => "value",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Yaml => "application/yaml",
            Format::Toml => "application/toml",
            Format::Prop => "application/properties",
            Format::Value => "text/plain",
        }
    }

    /// Format for a content type; parameters such as `charset` are ignored.
    pub fn from_mime(mime: &str) -> ApplicationResult<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|format| format.mime().eq_ignore_ascii_case(essence))
            .ok_or_else(|| ApplicationError::UnknownFormat(mime.to_string()))
    }

    pub fn encode(&self, value: &Value) -> ApplicationResult<String> {
        match self {
            Format::Json => serde_json::to_string_pretty(value).map_err(|e| self.encode_err(e)),
            Format::Yaml => serde_yaml::to_string(value).map_err(|e| self.encode_err(e)),
            Format::Toml => toml::to_string_pretty(value).map_err(|e| self.encode_err(e)),
            Format::Prop => Ok(properties::dump_text(value)),
            Format::Value => scalar_text(value),
        }
    }

    pub fn decode(&self, text: &str) -> ApplicationResult<Value> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|e| self.decode_err(e)),
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| self.decode_err(e)),
            Format::Toml => toml::from_str(text).map_err(|e| self.decode_err(e)),
            Format::Prop => Ok(properties::load_text(text)),
            Format::Value => Ok(properties::cast(text)),
        }
    }

    fn encode_err(&self, e: impl fmt::Display) -> ApplicationError {
        ApplicationError::Encode {
            format: self.name().to_string(),
            message: e.to_string(),
        }
    }

    fn decode_err(&self, e: impl fmt::Display) -> ApplicationError {
        ApplicationError::Decode {
            format: self.name().to_string(),
            message: e.to_string(),
        }
    }
}

fn scalar_text(value: &Value) -> ApplicationResult<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(format!("{:?}", f)),
        Value::String(s) => Ok(s.clone()),
        Value::List(_) | Value::Map(_) => Err(ApplicationError::TypeMismatch {
            expected: "a leaf".to_string(),
            found: format!("a {}", value.kind_name()),
        }),
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Format {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            "prop" | "props" | "properties" => Ok(Format::Prop),
            "value" | "text" => Ok(Format::Value),
            _ => Err(ApplicationError::UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Value {
        [
            ("name", Value::from("db")),
            ("port", Value::Int(5432)),
            ("tags", Value::from(vec!["a", "b"])),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    #[case(Format::Json)]
    #[case(Format::Yaml)]
    #[case(Format::Toml)]
    #[case(Format::Prop)]
    fn given_structured_value_when_encoded_and_decoded_then_matches(#[case] format: Format) {
        let text = format.encode(&sample()).unwrap();

        assert_eq!(format.decode(&text).unwrap(), sample());
    }

    #[rstest]
    #[case("application/json", Format::Json)]
    #[case("application/yaml", Format::Yaml)]
    #[case("application/properties", Format::Prop)]
    #[case("text/plain; charset=utf-8", Format::Value)]
    #[case("Application/TOML", Format::Toml)]
    fn given_mime_when_parsing_then_maps_to_format(#[case] mime: &str, #[case] expected: Format) {
        assert_eq!(Format::from_mime(mime).unwrap(), expected);
    }

    #[test]
    fn given_unknown_mime_or_name_when_parsing_then_fails() {
        assert!(matches!(
            Format::from_mime("application/xml"),
            Err(ApplicationError::UnknownFormat(_))
        ));
        assert!(matches!(
            "ini".parse::<Format>(),
            Err(ApplicationError::UnknownFormat(_))
        ));
    }

    #[test]
    fn given_invalid_json_when_decoding_then_reports_decode_error() {
        let err = Format::Json.decode("{not json").unwrap_err();

        assert!(matches!(err, ApplicationError::Decode { ref format, .. } if format == "json"));
    }

    #[test]
    fn given_yaml_with_numeric_keys_when_decoding_then_keys_become_labels() {
        let value = Format::Yaml
            .decode("codes:\n  404: not found\n  500: error\n")
            .unwrap();

        let codes: Value = [
            ("404", Value::from("not found")),
            ("500", Value::from("error")),
        ]
        .into_iter()
        .collect();
        let expected: Value = [("codes", codes)].into_iter().collect();
        assert_eq!(value, expected);
    }

    #[test]
    fn given_branch_when_encoding_as_value_then_type_mismatch() {
        assert!(matches!(
            Format::Value.encode(&sample()),
            Err(ApplicationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn given_plain_text_when_decoding_as_value_then_casts_scalar() {
        assert_eq!(Format::Value.decode("42\n").unwrap(), Value::Int(42));
        assert_eq!(Format::Value.decode("yes").unwrap(), Value::Bool(true));
        assert_eq!(Format::Value.encode(&Value::Float(2.0)).unwrap(), "2.0");
    }

    #[test]
    fn given_null_when_encoding_as_toml_then_reports_encode_error() {
        let value: Value = [("gone", Value::Null)].into_iter().collect();

        assert!(matches!(
            Format::Toml.encode(&value),
            Err(ApplicationError::Encode { .. })
        ));
    }
}
