use crate::accumulator::{Snapshot, STATUS_FILE};

/// Progress lines the backend reports through the reserved `status.log` file.
#[derive(Debug, Default)]
pub struct StatusFeed {
    lines: Vec<String>,
    last_seen: Option<String>,
}

impl StatusFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look at the snapshot's `status.log` and fold any change into the feed.
    /// Returns true when the visible log changed.
    pub fn observe(&mut self, snapshot: &Snapshot) -> bool {
        let Some(content) = snapshot.get(STATUS_FILE) else {
            return false;
        };
        if self.last_seen.as_deref() == Some(content) {
            return false;
        }
        self.last_seen = Some(content.to_string());
        self.apply(content)
    }

    /// A JSON object with a string `code` adds one line; anything else is the
    /// full current log, one entry per non-empty line.
    fn apply(&mut self, content: &str) -> bool {
        if let Ok(serde_json::Value::Object(record)) = serde_json::from_str(content) {
            if let Some(code) = record.get("code").and_then(|c| c.as_str()) {
                self.lines.push(code.to_string());
                return true;
            }
        }

        let lines: Vec<String> = content
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect();
        if lines == self.lines {
            return false;
        }
        self.lines = lines;
        true
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::GeneratedFile;

    fn snapshot_with_status(content: &str) -> Snapshot {
        [
            GeneratedFile {
                filename: "App.tsx".into(),
                content: "x".into(),
            },
            GeneratedFile {
                filename: STATUS_FILE.into(),
                content: content.into(),
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_json_record_appends_one_line() {
        let mut feed = StatusFeed::new();
        assert!(feed.observe(&snapshot_with_status(r#"{"code":"Planning files"}"#)));
        assert!(feed.observe(&snapshot_with_status(r#"{"code":"Writing App.tsx"}"#)));
        assert_eq!(feed.lines(), ["Planning files", "Writing App.tsx"]);
    }

    #[test]
    fn test_unchanged_content_is_not_appended_twice() {
        let mut feed = StatusFeed::new();
        let snapshot = snapshot_with_status(r#"{"code":"Planning files"}"#);
        assert!(feed.observe(&snapshot));
        assert!(!feed.observe(&snapshot));
        assert_eq!(feed.lines().len(), 1);
    }

    #[test]
    fn test_plain_text_replaces_the_log() {
        let mut feed = StatusFeed::new();
        feed.observe(&snapshot_with_status(r#"{"code":"ignored later"}"#));
        assert!(feed.observe(&snapshot_with_status("step one\n\nstep two\n")));
        assert_eq!(feed.lines(), ["step one", "step two"]);
    }

    #[test]
    fn test_no_status_file() {
        let mut feed = StatusFeed::new();
        let snapshot: Snapshot = std::iter::empty().collect();
        assert!(!feed.observe(&snapshot));
        assert!(feed.lines().is_empty());
    }
}
