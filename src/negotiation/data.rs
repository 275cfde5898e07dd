use multimap::MultiMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::http::errors::ParseError;

/// Decoded request body.
///
/// Form bodies arrive as fields, every other format is handed over as the
/// raw text for the action to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestData {
    Form(MultiMap<String, String>),
    Raw(String),
}

impl Default for RequestData {
    fn default() -> Self {
        RequestData::Raw(String::new())
    }
}

impl RequestData {
    pub fn as_form(&self) -> Option<&MultiMap<String, String>> {
        match self {
            RequestData::Form(fields) => Some(fields),
            RequestData::Raw(_) => None,
        }
    }
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            RequestData::Raw(raw) => Some(raw),
            RequestData::Form(_) => None,
        }
    }
    pub fn is_empty(&self) -> bool {
        match self {
            RequestData::Form(fields) => fields.is_empty(),
            RequestData::Raw(raw) => raw.is_empty(),
        }
    }
    /// First value of a form field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.as_form()
            .and_then(|fields| fields.get(key))
            .map(|v| v.as_str())
    }

    /// Form fields become an object of strings, repeated fields an array.
    pub fn to_json_value(&self) -> Result<Value, ParseError> {
        match self {
            RequestData::Raw(raw) => {
                if raw.trim().is_empty() {
                    return Err(ParseError::EmptyBody);
                }
                Ok(serde_json::from_str(raw)?)
            }
            RequestData::Form(fields) => {
                let mut map = Map::new();
                for (key, values) in fields.iter_all() {
                    let value = if values.len() == 1 {
                        Value::String(values[0].clone())
                    } else {
                        Value::Array(values.iter().cloned().map(Value::String).collect())
                    };
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }
        }
    }

    pub fn parse_json<T>(&self) -> Result<T, ParseError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(self.to_json_value()?)?)
    }

    /// Deserializes form fields, or a raw body holding an urlencoded string.
    pub fn parse_form<T>(&self) -> Result<T, ParseError>
    where
        T: DeserializeOwned,
    {
        let encoded = match self {
            RequestData::Raw(raw) => raw.clone(),
            RequestData::Form(fields) => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (key, values) in fields.iter_all() {
                    for value in values {
                        serializer.append_pair(key, value);
                    }
                }
                serializer.finish()
            }
        };
        serde_urlencoded::from_str(&encoded).map_err(ParseError::from)
    }
}

impl From<MultiMap<String, String>> for RequestData {
    fn from(fields: MultiMap<String, String>) -> Self {
        RequestData::Form(fields)
    }
}

impl From<String> for RequestData {
    fn from(raw: String) -> Self {
        RequestData::Raw(raw)
    }
}
