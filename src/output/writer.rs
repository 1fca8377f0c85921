use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write `lines` newline-joined, without a trailing newline. An empty slice
/// produces an empty file.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> std::io::Result<()> {
    let body = lines.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n");
    fs::write(path, body)
}

/// Pretty-printed JSON document.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, body)
}
