use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{AppError, Result};
use crate::stream::DATA_PREFIX;

/// Filename hint the backend sends when it could not determine a real path.
pub const UNKNOWN_FILE_HINT: &str = "typescript";

/// Reserved file carrying generation progress instead of code.
pub const STATUS_FILE: &str = "status.log";

/// One decoded protocol record.
#[derive(Clone, Debug, Deserialize)]
pub struct ChunkEvent {
    pub code: String,
    pub file: String,
}

/// A generated file as consumers see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub filename: String,
    pub content: String,
}

/// Point-in-time copy of the file table, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    files: Vec<GeneratedFile>,
}

impl Snapshot {
    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.filename == filename)
            .map(|f| f.content.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files that hold generated code, i.e. everything except `status.log`.
    pub fn code_files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter().filter(|f| f.filename != STATUS_FILE)
    }
}

impl FromIterator<GeneratedFile> for Snapshot {
    fn from_iter<I: IntoIterator<Item = GeneratedFile>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Owns the filename → content table for a single generation request.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    table: IndexMap<String, String>,
    applied: usize,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one `data: ` line.
    ///
    /// Returns `Ok(None)` when the line carried nothing to accumulate (empty
    /// payload, or a chunk whose file cannot be determined). A payload that
    /// is not a valid chunk record is a protocol error and must end the stream.
    pub fn apply(&mut self, raw_line: &str) -> Result<Option<Snapshot>> {
        let payload = raw_line.strip_prefix(DATA_PREFIX).unwrap_or(raw_line).trim();
        if payload.is_empty() {
            return Ok(None);
        }

        let event: ChunkEvent = serde_json::from_str(payload).map_err(|source| {
            error!(line = raw_line, error = %source, "failed to parse stream payload");
            AppError::Protocol {
                line: raw_line.to_string(),
                source,
            }
        })?;

        let Some((filename, content)) = resolve_target(&event) else {
            debug!(hint = %event.file, "discarding chunk with no resolvable filename");
            return Ok(None);
        };

        let filename = normalize_filename(filename);
        debug!(file = filename, bytes = content.len(), "accumulating chunk");
        self.table
            .entry(filename.to_string())
            .or_default()
            .push_str(content);
        self.applied += 1;

        Ok(Some(self.snapshot()))
    }

    /// Materialize the current table.
    pub fn snapshot(&self) -> Snapshot {
        self.table
            .iter()
            .map(|(filename, content)| GeneratedFile {
                filename: filename.clone(),
                content: content.clone(),
            })
            .collect()
    }

    /// Number of chunks that changed the table.
    pub fn applied(&self) -> usize {
        self.applied
    }
}

/// Work out which file a chunk belongs to and what text to append.
///
/// A first line starting with `// path/to/file` names the real target and is
/// not part of the content; an indented comment is ordinary code. Without a
/// marker the `file` hint is used and the whole body is appended, unless the
/// hint is the unknown-file sentinel.
pub fn resolve_target(event: &ChunkEvent) -> Option<(&str, &str)> {
    let (first_line, rest) = match event.code.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (event.code.as_str(), ""),
    };

    if let Some(marker) = first_line.strip_prefix("//") {
        let name = marker.trim();
        if !name.is_empty() {
            return Some((name, rest));
        }
    }

    if event.file == UNKNOWN_FILE_HINT {
        return None;
    }
    Some((event.file.as_str(), event.code.as_str()))
}

/// Strip leading slashes so `/src/App.tsx` and `src/App.tsx` share an entry.
pub fn normalize_filename(filename: &str) -> &str {
    filename.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, file: &str) -> String {
        format!(
            "data: {}",
            serde_json::json!({ "code": code, "file": file })
        )
    }

    #[test]
    fn test_marker_line_names_file_and_is_stripped() {
        let mut acc = ChunkAccumulator::new();
        let snapshot = acc
            .apply(&line("// App.tsx\nconst x=1;", "typescript"))
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.get("App.tsx"), Some("const x=1;"));
    }

    #[test]
    fn test_sentinel_without_marker_is_discarded() {
        let mut acc = ChunkAccumulator::new();
        acc.apply(&line("// App.tsx\nconst x=1;", "typescript")).unwrap();
        let result = acc.apply(&line("const y=2;", "typescript")).unwrap();

        assert!(result.is_none());
        assert_eq!(acc.applied(), 1);
        let snapshot = acc.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("App.tsx"), Some("const x=1;"));
    }

    #[test]
    fn test_file_hint_keeps_entire_code() {
        let mut acc = ChunkAccumulator::new();
        acc.apply(&line("import React from 'react';\nexport {}", "src/main.tsx"))
            .unwrap();
        assert_eq!(
            acc.snapshot().get("src/main.tsx"),
            Some("import React from 'react';\nexport {}")
        );
    }

    #[test]
    fn test_chunks_concatenate_in_arrival_order() {
        let mut acc = ChunkAccumulator::new();
        acc.apply(&line("// a.ts\nfirst;", "typescript")).unwrap();
        acc.apply(&line("// b.ts\nother;", "typescript")).unwrap();
        acc.apply(&line("// a.ts\nsecond;", "typescript")).unwrap();
        acc.apply(&line("third;", "a.ts")).unwrap();

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.get("a.ts"), Some("first;second;third;"));
        assert_eq!(snapshot.get("b.ts"), Some("other;"));
        let names: Vec<_> = snapshot.files().iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_leading_slash_is_stripped() {
        let mut acc = ChunkAccumulator::new();
        acc.apply(&line("// /src/App.tsx\nA", "typescript")).unwrap();
        acc.apply(&line("B", "src/App.tsx")).unwrap();
        let snapshot = acc.apply(&line("C", "/src/App.tsx")).unwrap().unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("src/App.tsx"), Some("ABC"));
    }

    #[test]
    fn test_marker_only_chunk_creates_empty_file() {
        let mut acc = ChunkAccumulator::new();
        let snapshot = acc.apply(&line("// index.css", "typescript")).unwrap().unwrap();
        assert_eq!(snapshot.get("index.css"), Some(""));
    }

    #[test]
    fn test_indented_comment_is_not_a_marker() {
        let mut acc = ChunkAccumulator::new();
        acc.apply(&line("function App() {\n", "src/App.tsx")).unwrap();
        let snapshot = acc
            .apply(&line("  // increment the counter\n  setCount(c + 1);\n", "src/App.tsx"))
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get("src/App.tsx"),
            Some("function App() {\n  // increment the counter\n  setCount(c + 1);\n")
        );
    }

    #[test]
    fn test_empty_marker_falls_back_to_hint() {
        let event = ChunkEvent {
            code: "//\nbody".into(),
            file: "notes.ts".into(),
        };
        assert_eq!(resolve_target(&event), Some(("notes.ts", "//\nbody")));
    }

    #[test]
    fn test_empty_payload_is_noop() {
        let mut acc = ChunkAccumulator::new();
        assert!(acc.apply("data:    ").unwrap().is_none());
        assert!(acc.snapshot().is_empty());
    }

    #[test]
    fn test_malformed_payload_is_protocol_error() {
        let mut acc = ChunkAccumulator::new();
        let err = acc.apply("data: {not json").unwrap_err();
        assert!(matches!(err, AppError::Protocol { ref line, .. } if line == "data: {not json"));

        let err = acc.apply("data: {\"code\":\"x\"}").unwrap_err();
        assert!(matches!(err, AppError::Protocol { .. }));
        assert!(acc.snapshot().is_empty());
    }

    #[test]
    fn test_code_files_skip_status_log() {
        let mut acc = ChunkAccumulator::new();
        acc.apply(&line("working", STATUS_FILE)).unwrap();
        acc.apply(&line("x", "a.ts")).unwrap();
        let snapshot = acc.snapshot();
        let code: Vec<_> = snapshot.code_files().map(|f| f.filename.as_str()).collect();
        assert_eq!(code, vec!["a.ts"]);
    }
}
