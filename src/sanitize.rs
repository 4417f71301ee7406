// The translation service sometimes returns a fullwidth percent sign in
// front of `s`; the second pair is the same bytes read as Windows-1252.
const PERCENT_FIXES: &[(&str, &str)] = &[("\u{FF05}s", "%s"), ("\u{EF}\u{BC}\u{2026}s", "%s")];

pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for &(broken, fixed) in PERCENT_FIXES {
        if out.contains(broken) {
            out = out.replace(broken, fixed);
        }
    }
    out
}

const ESCAPE_LETTERS: &[char] = &['n', 't', 'r', '"', '\\', 'a', 'b', 'f', 'v'];

/// Makes machine output safe to place between the quotes of a msgstr line.
/// Existing escapes are left untouched; any other backslash is doubled.
pub fn escape_for_catalog(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&next) if ESCAPE_LETTERS.contains(&next) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}
