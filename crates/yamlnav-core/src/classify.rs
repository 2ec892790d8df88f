//! Per-line lexical recognition.
//!
//! The scanner never looks at more than one line at a time. Everything it
//! knows about structure comes from the leading whitespace, an optional `-`
//! sequence marker and the first `:` on the line.

/// A `key: value` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingLine<'a> {
    pub indent: usize,
    pub key: &'a str,
    /// Inline scalar after the colon. `None` when the value is nested below.
    pub value: Option<&'a str>,
}

/// A `- ...` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLine<'a> {
    /// Column of the `-` marker.
    pub indent: usize,
    /// Inline mapping key of `- key: value` items.
    pub key: Option<&'a str>,
    /// Column where the inline key starts.
    pub key_indent: usize,
    pub value: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Mapping(MappingLine<'a>),
    Sequence(SequenceLine<'a>),
    /// Neither a key nor a sequence marker (continuation lines, block
    /// scalar bodies, ...).
    Unparsed,
}

impl Line<'_> {
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Line::Mapping(_) | Line::Sequence(_))
    }

    /// The local key carried by this line, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Line::Mapping(m) => Some(m.key),
            Line::Sequence(s) => s.key,
            Line::Blank | Line::Unparsed => None,
        }
    }
}

/// Number of leading whitespace characters.
#[must_use]
pub fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

#[must_use]
pub fn is_blank_or_comment(line: &str) -> bool {
    let rest = line.trim_start();
    rest.is_empty() || rest.starts_with('#')
}

#[must_use]
pub fn classify(line: &str) -> Line<'_> {
    if is_blank_or_comment(line) {
        return Line::Blank;
    }
    let indent = indent_of(line);
    let rest = line.trim_start();

    if let Some(after_dash) = strip_sequence_marker(rest) {
        let item = after_dash.trim_start();
        let key_indent = indent + 1 + after_dash.chars().count() - item.chars().count();
        if item.is_empty() {
            return Line::Sequence(SequenceLine {
                indent,
                key: None,
                key_indent,
                value: None,
            });
        }
        return Line::Sequence(match split_key(item) {
            Some((key, value)) => SequenceLine {
                indent,
                key: Some(key),
                key_indent,
                value,
            },
            None => SequenceLine {
                indent,
                key: None,
                key_indent,
                value: non_empty_value(item),
            },
        });
    }

    match split_key(rest) {
        Some((key, value)) => Line::Mapping(MappingLine { indent, key, value }),
        None => Line::Unparsed,
    }
}

/// Split a single line at its key colon, for in-place value replacement.
///
/// Returns `(prefix, value)` where `prefix` runs up to and including the colon
/// (indentation and any `- ` marker included) and `value` is the trimmed text
/// after it. Lines without a `key:` shape yield `None`.
#[must_use]
pub fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start();
    let body = match strip_sequence_marker(rest) {
        Some(after_dash) => after_dash.trim_start(),
        None => rest,
    };
    let (key, _) = split_key(body)?;
    debug_assert!(!key.is_empty());
    let body_start = line.len() - body.len();
    let colon = body_start + body.find(':')?;
    Some((&line[..=colon], line[colon + 1..].trim()))
}

fn strip_sequence_marker(rest: &str) -> Option<&str> {
    let after = rest.strip_prefix('-')?;
    if after.is_empty() || after.starts_with(char::is_whitespace) {
        Some(after)
    } else {
        None
    }
}

/// Key is everything up to the first colon, trimmed and unquoted.
fn split_key(text: &str) -> Option<(&str, Option<&str>)> {
    let colon = text.find(':')?;
    let key = unquote(text[..colon].trim());
    if key.is_empty() {
        return None;
    }
    Some((key, non_empty_value(&text[colon + 1..])))
}

fn unquote(key: &str) -> &str {
    key.trim_matches('"').trim_matches('\'')
}

fn non_empty_value(raw: &str) -> Option<&str> {
    let value = raw.trim();
    // `key: # note` carries no scalar
    if value.is_empty() || value.starts_with('#') {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(classify(""), Line::Blank);
        assert_eq!(classify("   "), Line::Blank);
        assert_eq!(classify("# comment"), Line::Blank);
        assert_eq!(classify("    # indented comment: with colon"), Line::Blank);
    }

    #[test]
    fn mapping_lines() {
        assert_eq!(
            classify("  name: nginx-deployment"),
            Line::Mapping(MappingLine {
                indent: 2,
                key: "name",
                value: Some("nginx-deployment"),
            })
        );
        assert_eq!(
            classify("metadata:"),
            Line::Mapping(MappingLine {
                indent: 0,
                key: "metadata",
                value: None,
            })
        );
    }

    #[test]
    fn key_stops_at_first_colon() {
        let Line::Mapping(m) = classify("image: nginx:1.14.2") else {
            panic!("expected mapping line");
        };
        assert_eq!(m.key, "image");
        assert_eq!(m.value, Some("nginx:1.14.2"));
    }

    #[test]
    fn quoted_keys_are_unquoted() {
        let Line::Mapping(m) = classify(r#"  "app.kubernetes.io/name": web"#) else {
            panic!("expected mapping line");
        };
        assert_eq!(m.key, "app.kubernetes.io/name");
    }

    #[test]
    fn sequence_lines() {
        assert_eq!(
            classify("  - name: nginx"),
            Line::Sequence(SequenceLine {
                indent: 2,
                key: Some("name"),
                key_indent: 4,
                value: Some("nginx"),
            })
        );
        assert_eq!(
            classify("- 80"),
            Line::Sequence(SequenceLine {
                indent: 0,
                key: None,
                key_indent: 2,
                value: Some("80"),
            })
        );
        assert_eq!(
            classify("  -"),
            Line::Sequence(SequenceLine {
                indent: 2,
                key: None,
                key_indent: 3,
                value: None,
            })
        );
    }

    #[test]
    fn dash_without_space_is_not_a_sequence() {
        assert_eq!(classify("-foo"), Line::Unparsed);
        let Line::Mapping(m) = classify("-x: 1") else {
            panic!("expected mapping line");
        };
        assert_eq!(m.key, "-x");
    }

    #[test]
    fn lines_without_structure_are_unparsed() {
        assert_eq!(classify("  just some text"), Line::Unparsed);
        assert_eq!(classify(": orphan"), Line::Unparsed);
    }

    #[test]
    fn comment_only_value_is_empty() {
        let Line::Mapping(m) = classify("spec: # rollout settings") else {
            panic!("expected mapping line");
        };
        assert_eq!(m.value, None);
    }

    #[test]
    fn splits_assignments() {
        assert_eq!(
            split_assignment("  name: nginx-deployment"),
            Some(("  name:", "nginx-deployment"))
        );
        assert_eq!(
            split_assignment("  - image: nginx:1.14"),
            Some(("  - image:", "nginx:1.14"))
        );
        assert_eq!(split_assignment("spec:"), Some(("spec:", "")));
        assert_eq!(split_assignment("  - nginx"), None);
        assert_eq!(split_assignment("plain text"), None);
    }
}
