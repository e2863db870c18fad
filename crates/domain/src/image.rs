use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::DomainError;

const DATA_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// An image carried inline as `data:<mime>;base64,<payload>`.
///
/// The string is the identity of the image: two uploads of the same file
/// produce equal values, and the stored form is exactly the displayed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri(String);

impl DataUri {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let Some(rest) = value.strip_prefix(DATA_SCHEME) else {
            return Err(DomainError::InvalidDataUri(
                "missing data: scheme".to_string(),
            ));
        };
        let Some((mime, payload)) = rest.split_once(BASE64_MARKER) else {
            return Err(DomainError::InvalidDataUri(
                "missing ;base64, marker".to_string(),
            ));
        };
        if !mime.starts_with("image/") {
            return Err(DomainError::InvalidDataUri(format!(
                "expected an image mime type, got {mime:?}"
            )));
        }
        if payload.is_empty() {
            return Err(DomainError::InvalidDataUri("empty payload".to_string()));
        }
        Ok(Self(value))
    }

    /// Builds a data URI from an already base64-encoded payload.
    pub fn from_parts(mime_type: &str, base64_payload: &str) -> Result<Self, DomainError> {
        Self::parse(format!("{DATA_SCHEME}{mime_type}{BASE64_MARKER}{base64_payload}"))
    }

    pub fn mime_type(&self) -> &str {
        self.split().0
    }

    pub fn payload(&self) -> &str {
        self.split().1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn split(&self) -> (&str, &str) {
        self.0[DATA_SCHEME.len()..]
            .split_once(BASE64_MARKER)
            .unwrap_or(("", ""))
    }
}

impl TryFrom<String> for DataUri {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DataUri> for String {
    fn from(value: DataUri) -> Self {
        value.0
    }
}

impl Display for DataUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub rgba: Vec<u8>,
}
