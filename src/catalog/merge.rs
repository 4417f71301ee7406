use std::collections::HashSet;

use super::{Line, State, TranslationMap, classify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutput {
    pub text: String,
    /// Template entries with no existing translation.
    pub added: usize,
    /// Existing translations whose msgid is gone from the template.
    pub removed: usize,
    pub preserved: usize,
}

impl MergeOutput {
    pub fn summary(&self) -> String {
        format!(
            "Added {} new strings, removed {} strings",
            self.added, self.removed
        )
    }
}

/// Replays `template` line by line, filling each msgstr block from `old`
/// when its msgid is known. Everything else is copied as-is.
pub fn merge(old: &TranslationMap, template: &str) -> MergeOutput {
    let lines = template.split('\n').collect::<Vec<_>>();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut seen: HashSet<&str> = HashSet::new();
    let mut state = State::Idle;
    let mut id = String::new();
    let mut added = 0;
    let mut preserved = 0;

    let mut index = 0;
    while index < lines.len() {
        let line = lines[index];
        match (classify(line), state) {
            (Line::Id(payload), _) => {
                id.clear();
                id.push_str(payload);
                state = State::ReadingId;
                out.push(line.to_string());
                index += 1;
            }
            (Line::Continuation(payload), State::ReadingId) => {
                id.push_str(payload);
                out.push(line.to_string());
                index += 1;
            }
            (Line::Str(payload), State::ReadingId) => {
                let (end, value) = string_block(&lines, index, payload);
                let block = &lines[index..end];
                match old.get_key_value(id.as_str()) {
                    Some((key, stored)) => {
                        preserved += 1;
                        seen.insert(key.as_str());
                        if *stored == value {
                            out.extend(block.iter().map(|line| line.to_string()));
                        } else {
                            out.extend(render_msgstr(stored, line_ending(line)));
                        }
                    }
                    None => {
                        added += 1;
                        out.extend(block.iter().map(|line| line.to_string()));
                    }
                }
                state = State::Idle;
                index = end;
            }
            _ => {
                state = State::Idle;
                out.push(line.to_string());
                index += 1;
            }
        }
    }

    let removed = old.keys().filter(|key| !seen.contains(key.as_str())).count();
    MergeOutput {
        text: out.join("\n"),
        added,
        removed,
        preserved,
    }
}

// Returns the index just past the block and the concatenated payload.
fn string_block(lines: &[&str], start: usize, first: &str) -> (usize, String) {
    let mut value = first.to_string();
    let mut end = start + 1;
    while let Some(line) = lines.get(end) {
        let Line::Continuation(payload) = classify(line) else {
            break;
        };
        value.push_str(payload);
        end += 1;
    }
    (end, value)
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with('\r') { "\r" } else { "" }
}

fn render_msgstr(value: &str, ending: &str) -> Vec<String> {
    let segments = escaped_line_segments(value);
    if segments.len() <= 1 {
        return vec![format!("msgstr \"{}\"{}", value, ending)];
    }
    let mut lines = Vec::with_capacity(segments.len() + 1);
    lines.push(format!("msgstr \"\"{}", ending));
    lines.extend(
        segments
            .into_iter()
            .map(|segment| format!("\"{}\"{}", segment, ending)),
    );
    lines
}

// Splits after every escaped `\n`, the way gettext lays out headers.
fn escaped_line_segments(value: &str) -> Vec<&str> {
    let bytes = value.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'\\' && index + 1 < bytes.len() {
            if bytes[index + 1] == b'n' {
                segments.push(&value[start..index + 2]);
                start = index + 2;
            }
            index += 2;
            continue;
        }
        index += 1;
    }
    if start < value.len() {
        segments.push(&value[start..]);
    }
    segments
}
