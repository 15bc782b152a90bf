//! `multipart/form-data` body encoder (RFC 7578).

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("failed to encode part '{name}': {message}")]
    Encode { name: String, message: String },

    #[error("invalid content type '{0}'")]
    InvalidContentType(String),
}

/// Parts are written in the order they are appended.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    body: BytesMut,
    parts: usize,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("----RevupFormBoundary{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: BytesMut::new(),
            parts: 0,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn part_count(&self) -> usize {
        self.parts
    }

    /// Serialises `value` as an `application/json` part. Browsers send a Blob
    /// part like this with filename `blob`, which servers expecting a file accept.
    pub fn json_part<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), MultipartError> {
        let json = serde_json::to_vec(value).map_err(|e| MultipartError::Encode {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        self.file_part(name, "blob", "application/json", &json)
    }

    pub fn file_part(
        &mut self,
        name: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), MultipartError> {
        if content_type.is_empty() || content_type.chars().any(|c| c.is_control()) {
            return Err(MultipartError::InvalidContentType(content_type.escape_default().to_string()));
        }

        self.body.reserve(data.len() + 256);
        self.put_str(&format!("--{}\r\n", self.boundary));
        self.put_str(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            escape_quoted(name),
            escape_quoted(file_name)
        ));
        self.put_str(&format!("Content-Type: {content_type}\r\n\r\n"));
        self.body.put_slice(data);
        self.put_str("\r\n");
        self.parts += 1;
        Ok(())
    }

    /// Closes the body with the terminating boundary.
    pub fn finish(mut self) -> Bytes {
        let closing = format!("--{}--\r\n", self.boundary);
        self.put_str(&closing);
        self.body.freeze()
    }

    fn put_str(&mut self, s: &str) {
        self.body.put_slice(s.as_bytes());
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-escapes `"`, CR and LF the way browsers do in disposition parameters.
fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            other => out.push(other),
        }
    }
    out
}
