use indexmap::IndexMap;

mod merge;

pub use merge::{MergeOutput, merge};

/// msgid -> msgstr, in first-seen order. Payloads are kept exactly as they
/// appear between the quotes; escapes are not interpreted.
pub type TranslationMap = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    Id(&'a str),
    Str(&'a str),
    Continuation(&'a str),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum State {
    #[default]
    Idle,
    ReadingId,
    ReadingStr,
}

pub(crate) fn classify(line: &str) -> Line<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if let Some(payload) = keyword_payload(line, "msgid ") {
        return Line::Id(payload);
    }
    if let Some(payload) = keyword_payload(line, "msgstr ") {
        return Line::Str(payload);
    }
    if let Some(payload) = quoted(line) {
        return Line::Continuation(payload);
    }
    Line::Other
}

fn keyword_payload<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    quoted(line.strip_prefix(keyword)?)
}

fn quoted(value: &str) -> Option<&str> {
    value.strip_prefix('"')?.strip_suffix('"')
}

#[derive(Debug, Default)]
struct Parser {
    state: State,
    id: String,
    value: String,
    map: TranslationMap,
}

impl Parser {
    fn feed(&mut self, line: Line<'_>) {
        match (line, self.state) {
            (Line::Id(payload), _) => {
                self.commit();
                self.id.clear();
                self.id.push_str(payload);
                self.state = State::ReadingId;
            }
            (Line::Str(payload), State::ReadingId) => {
                self.value.clear();
                self.value.push_str(payload);
                self.state = State::ReadingStr;
            }
            (Line::Continuation(payload), State::ReadingId) => self.id.push_str(payload),
            (Line::Continuation(payload), State::ReadingStr) => self.value.push_str(payload),
            (Line::Continuation(_), State::Idle) => {}
            (Line::Str(_) | Line::Other, _) => {
                self.commit();
                self.state = State::Idle;
            }
        }
    }

    // Only a string block in progress carries a complete pair; an id that
    // never reached its msgstr is dropped.
    fn commit(&mut self) {
        if self.state == State::ReadingStr {
            let id = std::mem::take(&mut self.id);
            let value = std::mem::take(&mut self.value);
            self.map.insert(id, value);
            self.state = State::Idle;
        }
    }

    fn finish(mut self) -> TranslationMap {
        self.commit();
        self.map
    }
}

pub fn parse(text: &str) -> TranslationMap {
    let mut parser = Parser::default();
    for line in text.split('\n') {
        parser.feed(classify(line));
    }
    parser.finish()
}

/// Ids whose msgstr is empty, in catalog order. The header entry (empty
/// msgid) is metadata and never counts as untranslated.
pub fn untranslated_ids(map: &TranslationMap) -> Vec<String> {
    map.iter()
        .filter(|(id, value)| !id.is_empty() && value.is_empty())
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"# French translations
msgid ""
msgstr ""
"Project-Id-Version: demo\n"
"Content-Type: text/plain; charset=UTF-8\n"

#: app.py:3
msgid "Hello"
msgstr "Bonjour"

msgid ""
"A long message "
"split in two"
msgstr ""
"Un long message "
"en deux"

msgid "Bye"
msgstr ""
"#;

    #[test]
    fn classify_recognizes_line_kinds() {
        assert_eq!(classify(r#"msgid "a b""#), Line::Id("a b"));
        assert_eq!(classify(r#"msgstr """#), Line::Str(""));
        assert_eq!(classify(r#""more""#), Line::Continuation("more"));
        assert_eq!(classify("msgstr \"x\"\r"), Line::Str("x"));
        assert_eq!(classify("#: file.py:1"), Line::Other);
        assert_eq!(classify(r#"msgid_plural "apples""#), Line::Other);
        assert_eq!(classify(r#"""#), Line::Other);
        assert_eq!(classify(""), Line::Other);
    }

    #[test]
    fn parse_reads_single_and_multi_line_entries() {
        let map = parse(CATALOG);
        let keys = map.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec!["", "Hello", "A long message split in two", "Bye"]
        );
        assert_eq!(
            map[""],
            r"Project-Id-Version: demo\nContent-Type: text/plain; charset=UTF-8\n"
        );
        assert_eq!(map["Hello"], "Bonjour");
        assert_eq!(map["A long message split in two"], "Un long message en deux");
        assert_eq!(map["Bye"], "");
    }

    #[test]
    fn parse_keeps_escapes_raw() {
        let map = parse("msgid \"Say \\\"hi\\\"\\n\"\nmsgstr \"Dis \\\"salut\\\"\"\n");
        assert_eq!(map[r#"Say \"hi\"\n"#], r#"Dis \"salut\""#);
    }

    #[test]
    fn parse_commits_entry_at_end_of_input() {
        let map = parse("msgid \"a\"\nmsgstr \"b\"");
        assert_eq!(map["a"], "b");
    }

    #[test]
    fn parse_commits_when_next_msgid_follows_directly() {
        let map = parse("msgid \"a\"\nmsgstr \"1\"\nmsgid \"b\"\nmsgstr \"2\"\n");
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "2");
    }

    #[test]
    fn parse_duplicate_ids_last_string_wins() {
        let map = parse("msgid \"a\"\nmsgstr \"1\"\n\nmsgid \"b\"\nmsgstr \"\"\n\nmsgid \"a\"\nmsgstr \"2\"\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_index(0), Some((&"a".to_string(), &"2".to_string())));
    }

    #[test]
    fn parse_drops_id_without_msgstr() {
        let map = parse("msgid \"orphan\"\n\nmsgid \"a\"\nmsgstr \"b\"\n");
        assert!(!map.contains_key("orphan"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn parse_ignores_stray_lines() {
        let map = parse("\"floating\"\nmsgstr \"no id\"\nmsgid \"a\"\nmsgstr \"b\"\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], "b");
    }

    #[test]
    fn parse_empty_text_is_empty_map() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn untranslated_ids_skips_header_and_translated() {
        let map = parse(CATALOG);
        assert_eq!(untranslated_ids(&map), vec!["Bye".to_string()]);

        let header_only = parse("msgid \"\"\nmsgstr \"\"\n");
        assert!(untranslated_ids(&header_only).is_empty());
    }
}
