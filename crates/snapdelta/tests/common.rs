#![allow(missing_docs, dead_code)]

use std::io::Write;

use serde_json::Value;

/// Writes a snapshot file in the producer's format: one JSON array of
/// records followed by the trailing sentinel object.
pub fn write_snapshot(records: &[Value]) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    let mut body: Vec<String> = records.iter().map(ToString::to_string).collect();
    body.push(r#"{"done":true}"#.to_string());
    write!(tmp, "[{}]", body.join(",")).unwrap();
    tmp.flush().unwrap();
    tmp
}
