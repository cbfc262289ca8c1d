//! Sync progress rendering.
//!
//! Renders [`SyncProgressEvent`]s from the ingestion engine and attributor
//! so users see which collection is being read and how much is left.
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

use tacofancy_core::progress::{NoProgress, SyncProgressEvent, SyncProgressReporter};

/// Human-friendly progress on stderr: "sync condiments  ingesting  12 / 140 documents".
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = match &event {
            SyncProgressEvent::Discovering => "sync  discovering...\n".to_string(),
            SyncProgressEvent::Ingesting {
                collection,
                n,
                total,
            } => format!(
                "sync {}  ingesting  {} / {} documents\n",
                collection,
                format_number(*n),
                format_number(*total)
            ),
            SyncProgressEvent::Linking { n, total } => format!(
                "sync full_tacos  linking  {} / {}\n",
                format_number(*n),
                format_number(*total)
            ),
            SyncProgressEvent::Attributing { commits } => {
                format!("contributors  {} commits\n", format_number(*commits))
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl SyncProgressReporter for JsonProgress {
    fn report(&self, event: SyncProgressEvent) {
        let obj = match &event {
            SyncProgressEvent::Discovering => serde_json::json!({
                "event": "progress",
                "phase": "discovering"
            }),
            SyncProgressEvent::Ingesting {
                collection,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "ingesting",
                "collection": collection.as_str(),
                "n": n,
                "total": total
            }),
            SyncProgressEvent::Linking { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "linking",
                "n": n,
                "total": total
            }),
            SyncProgressEvent::Attributing { commits } => serde_json::json!({
                "event": "progress",
                "phase": "attributing",
                "commits": commits
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" | "none" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn parse_modes() {
        assert_eq!(ProgressMode::parse("json"), Some(ProgressMode::Json));
        assert_eq!(ProgressMode::parse("none"), Some(ProgressMode::Off));
        assert_eq!(ProgressMode::parse("loud"), None);
    }
}
