use serde::{Deserialize, Serialize};

/// One record as returned by the remote API. The shape is entirely
/// API-defined; the only contract is that it is a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { data }
    }
}

/// Everything the load phase needs: the accumulated records plus their
/// rendered JSON/CSV text and the target filenames.
#[derive(Debug, Clone)]
pub struct OutputBundle {
    pub records: Vec<Record>,
    pub json_output: String,
    pub csv_output: String,
    pub json_filename: String,
    pub csv_filename: String,
}
