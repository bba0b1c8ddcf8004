//! JSON test vector loader shared by inbound frame tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    pub frame: FrameData,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct FrameData {
    pub encoding: String,
    pub data: serde_json::Value,
}

impl FrameData {
    /// Text frame exactly as a client would send it.
    pub fn decode(&self) -> String {
        match self.encoding.as_str() {
            "json" => self.data.to_string(),
            "text" => self.data.as_str().expect("text vector must be a string").to_string(),
            other => panic!("unsupported encoding: {other}"),
        }
    }
}
