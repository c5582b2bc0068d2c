// src/hooks/parse.rs

use std::path::PathBuf;

/// A parsed post-build hook.
///
/// `watch_files` empty means "global": the hook runs after every full
/// scan and every build update. Non-empty means the hook runs only when
/// one of those specific files changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub command: String,
    pub watch_files: Vec<PathBuf>,
}

impl Hook {
    pub fn is_global(&self) -> bool {
        self.watch_files.is_empty()
    }
}

const WATCH_DELIMITER: &str = "#watch:";

/// Parse a hook source string.
///
/// The last `#watch:` not escaped by an immediately preceding backslash
/// splits the string into command and trigger-file list; an escaped
/// delimiter is literal and stays part of the command. Everything before
/// the split point, including earlier escaped or literal occurrences, is
/// the command.
pub fn parse_hook(raw: &str) -> Hook {
    let mut split_at = None;
    let mut from = 0;
    while let Some(pos) = raw[from..].find(WATCH_DELIMITER) {
        let idx = from + pos;
        let escaped = idx > 0 && raw.as_bytes()[idx - 1] == b'\\';
        if !escaped {
            split_at = Some(idx);
        }
        from = idx + WATCH_DELIMITER.len();
    }

    match split_at {
        Some(idx) => {
            let command = raw[..idx].to_string();
            let watch_files = raw[idx + WATCH_DELIMITER.len()..]
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
            Hook {
                command,
                watch_files,
            }
        }
        None => Hook {
            command: raw.to_string(),
            watch_files: Vec::new(),
        },
    }
}
