//! Flat dotted-key text format (`a.b.c = value`).
//!
//! Nesting, list-ness and scalar types are inferred from the text, so a
//! dump followed by a load reproduces any value made of booleans, numbers,
//! quote-free strings, lists and maps with dot-free keys.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{instrument, trace};

use crate::domain::value::Value;

/// `key <sep> value`, where a key stops at the first comment marker or separator.
const LINE_PATTERN: &str = r"^\s*([^#!:=]+)(?:\s*[\s=:]\s*)(.+)$";

/// Backslash-newline plus the continuation line's indentation. Unlike a
/// plain backslash-newline replacement, the indentation is dropped too, so
/// the joined parts are separated by exactly one space.
const CONTINUATION_PATTERN: &str = r"\\\r?\n[ \t]*";

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| Regex::new(LINE_PATTERN).expect("property line pattern compiles"))
}

fn continuation_regex() -> &'static Regex {
    static CONTINUATION: OnceLock<Regex> = OnceLock::new();
    CONTINUATION.get_or_init(|| {
        Regex::new(CONTINUATION_PATTERN).expect("continuation pattern compiles")
    })
}

/// Parse flat-key text into a nested value.
///
/// Lines that do not look like `key = value` are skipped, never rejected.
#[instrument(level = "debug", skip(text))]
pub fn load_text(text: &str) -> Value {
    let joined = continuation_regex().replace_all(text, " ");
    let mut root = BTreeMap::new();

    for line in joined.lines() {
        let line = line.trim();
        let Some(caps) = line_regex().captures(line) else {
            if !line.is_empty() {
                trace!("skipping line: {}", line);
            }
            continue;
        };
        let key = caps[1].trim();
        if !is_valid_key(key) {
            trace!("skipping key: {}", key);
            continue;
        }
        let value = cast(&caps[2]);
        assign(&mut root, key, value);
    }

    make_lists(Value::Map(root))
}

/// Every dotted segment must be usable as a node label.
fn is_valid_key(key: &str) -> bool {
    key.split('.')
        .all(|segment| !segment.is_empty() && !segment.contains('/'))
}

/// Place `value` at the dotted `key`, replacing any scalar that sits where
/// an intermediate mapping is needed.
fn assign(root: &mut BTreeMap<String, Value>, key: &str, value: Value) {
    let (parents, last) = match key.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, key),
    };

    let mut node = root;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        let slot = node
            .entry(segment.to_string())
            .or_insert_with(Value::empty_map);
        if !matches!(slot, Value::Map(_)) {
            *slot = Value::empty_map();
        }
        node = match slot {
            Value::Map(map) => map,
            _ => return,
        };
    }
    node.insert(last.to_string(), value);
}

/// Turn every mapping that has a `"0"` key and only non-negative integer
/// keys into a list ordered by index.
///
/// A genuine dictionary with all-numeric keys is indistinguishable from a
/// list here and is converted as well.
fn make_lists(value: Value) -> Value {
    match value {
        Value::Map(map) if is_list_like(&map) => {
            let mut indexed: Vec<(u64, Value)> = map
                .into_iter()
                .filter_map(|(key, item)| key.parse::<u64>().ok().map(|index| (index, item)))
                .collect();
            indexed.sort_by_key(|(index, _)| *index);
            Value::List(indexed.into_iter().map(|(_, item)| make_lists(item)).collect())
        }
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(key, item)| (key, make_lists(item)))
                .collect(),
        ),
        Value::List(items) => Value::List(items.into_iter().map(make_lists).collect()),
        scalar => scalar,
    }
}

fn is_list_like(map: &BTreeMap<String, Value>) -> bool {
    map.contains_key("0") && map.keys().all(|key| key.parse::<u64>().is_ok())
}

/// Infer the scalar type of a raw value: bool, then int, then float,
/// otherwise a string with one layer of matching quotes removed.
pub fn cast(raw: &str) -> Value {
    let value = raw.trim();
    match value.to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" => return Value::Bool(true),
        "f" | "false" | "n" | "no" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = value.parse::<i64>() {
        return Value::Int(int);
    }
    if let Ok(float) = value.parse::<f64>() {
        return Value::Float(float);
    }
    Value::String(strip_quotes(value).to_string())
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last))
            if bytes.len() >= 2 && first == last && (first == b'"' || first == b'\'') =>
        {
            &value[1..value.len() - 1]
        }
        _ => value,
    }
}

/// Render a value as `key = value` lines, map keys in sorted order and list
/// elements by index. Strings are written in double quotes without escaping.
pub fn dump_text(value: &Value) -> String {
    let mut lines = Vec::new();
    visit("", value, &mut lines);
    lines.join("\n")
}

fn visit(prefix: &str, value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Map(map) => {
            for (key, item) in map {
                visit(&join_key(prefix, key), item, lines);
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                visit(&join_key(prefix, &index.to_string()), item, lines);
            }
        }
        Value::Bool(b) => lines.push(format!("{} = {}", prefix, b)),
        Value::Int(i) => lines.push(format!("{} = {}", prefix, i)),
        // Debug keeps a fractional part on whole floats, so they reload as floats
        Value::Float(f) => lines.push(format!("{} = {:?}", prefix, f)),
        Value::String(s) => lines.push(format!("{} = \"{}\"", prefix, s)),
        Value::Null => lines.push(format!("{} = \"\"", prefix)),
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    match (prefix.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}.{}", prefix, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        entries.into_iter().collect()
    }

    #[rstest]
    #[case("Yes", Value::Bool(true))]
    #[case("t", Value::Bool(true))]
    #[case("TRUE", Value::Bool(true))]
    #[case("no", Value::Bool(false))]
    #[case("F", Value::Bool(false))]
    #[case("007", Value::Int(7))]
    #[case("-12", Value::Int(-12))]
    #[case("3.141", Value::Float(3.141))]
    #[case("1e3", Value::Float(1000.0))]
    #[case("\"quoted\"", Value::String("quoted".into()))]
    #[case("'single'", Value::String("single".into()))]
    #[case("\"42\"", Value::String("42".into()))]
    #[case("\"half", Value::String("\"half".into()))]
    #[case("plain text", Value::String("plain text".into()))]
    #[case("  padded  ", Value::String("padded".into()))]
    fn given_raw_value_when_cast_then_infers_type(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(cast(raw), expected);
    }

    #[test]
    fn given_sample_properties_when_loaded_then_builds_nested_value() {
        let text = r#"
    foo.bar = 42
    nested.array.0 = "a0"
    nested.array.1 = "a1"
    nested.array.2 = "a3"
    pi = 3.141
    a = "the beginning \
        is here"
    "#;

        let value = load_text(text);

        let expected = map(vec![
            ("foo", map(vec![("bar", Value::Int(42))])),
            (
                "nested",
                map(vec![("array", Value::from(vec!["a0", "a1", "a3"]))]),
            ),
            ("pi", Value::Float(3.141)),
            // the space before the backslash is content, the continuation adds one more
            ("a", Value::from("the beginning  is here")),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn given_nested_value_when_dumped_then_emits_sorted_dotted_lines() {
        let value = map(vec![
            ("pi", Value::Float(3.141)),
            ("foo", map(vec![("bar", Value::Int(42))])),
            ("flag", Value::Bool(false)),
            ("tags", Value::from(vec!["x", "y"])),
        ]);

        let text = dump_text(&value);

        assert_eq!(
            text,
            "flag = false\nfoo.bar = 42\npi = 3.141\ntags.0 = \"x\"\ntags.1 = \"y\""
        );
    }

    #[test]
    fn given_value_when_dumped_and_loaded_then_round_trips() {
        let value = map(vec![
            ("foo", map(vec![("bar", Value::Int(42))])),
            ("pi", Value::Float(3.141)),
            (
                "nested",
                map(vec![("array", Value::from(vec!["a0", "a1", "a3"]))]),
            ),
        ]);

        assert_eq!(load_text(&dump_text(&value)), value);
    }

    #[test]
    fn given_tricky_scalars_when_dumped_and_loaded_then_types_survive() {
        let value = map(vec![
            ("whole", Value::Float(2.0)),
            ("word", Value::from("true")),
            ("digits", Value::from("007")),
            ("yes", Value::Bool(true)),
            (
                "deep",
                Value::List(vec![
                    Value::from(vec![1, 2]),
                    map(vec![("k", Value::from("v"))]),
                ]),
            ),
        ]);

        assert_eq!(load_text(&dump_text(&value)), value);
    }

    #[test]
    fn given_comment_and_garbage_lines_when_loaded_then_they_are_skipped() {
        let text = "# comment = 1\n! bang = 2\nlonely\nkey#x = 3\nreal: value\nspaced   7\n";

        let value = load_text(text);

        assert_eq!(
            value,
            map(vec![("real", Value::from("value")), ("spaced", Value::Int(7))])
        );
    }

    #[test]
    fn given_scalar_then_nested_key_when_loaded_then_scalar_is_replaced_by_mapping() {
        let value = load_text("a = 1\na.b = 2");

        assert_eq!(value, map(vec![("a", map(vec![("b", Value::Int(2))]))]));
    }

    #[test]
    fn given_keys_with_empty_or_slashed_segments_when_loaded_then_they_are_skipped() {
        let value = load_text("a..b = 1\na. = 2\n.c = 3\nd/e = 4\nok.f = 5\n");

        let expected: Value = [("ok", [("f", Value::Int(5))].into_iter().collect::<Value>())]
            .into_iter()
            .collect();
        assert_eq!(value, expected);
    }

    #[test]
    fn given_numeric_keys_without_zero_when_loaded_then_stays_mapping() {
        let value = load_text("ports.1 = 80\nports.2 = 443");

        assert_eq!(
            value,
            map(vec![(
                "ports",
                map(vec![("1", Value::Int(80)), ("2", Value::Int(443))])
            )])
        );
    }

    #[test]
    fn given_sparse_indices_when_loaded_then_list_is_ordered_numerically() {
        let value = load_text("l.10 = \"ten\"\nl.0 = \"zero\"\nl.2 = \"two\"");

        assert_eq!(
            value,
            map(vec![("l", Value::from(vec!["zero", "two", "ten"]))])
        );
    }

    #[test]
    fn given_mixed_keys_with_zero_when_loaded_then_stays_mapping() {
        let value = load_text("m.0 = 1\nm.x = 2");

        assert_eq!(
            value,
            map(vec![(
                "m",
                map(vec![("0", Value::Int(1)), ("x", Value::Int(2))])
            )])
        );
    }
}
