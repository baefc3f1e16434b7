//! Tolerant scanner for policy documents
//!
//! Policy files use a small indentation-based subset of YAML, and this
//! scanner is scoped to exactly the shapes a policy needs:
//! - `key: value` (strings, quoted strings, integers)
//! - nested mappings by indentation
//! - sequences of scalars (`- value`)
//! - sequences of mappings (`- key: value` plus follow-on keys)
//! - folded strings (`key: >`, continuation lines joined with spaces)
//! - `#` comments, full-line or inline (outside quotes)
//!
//! Input is normalized before parsing: CRLF/CR become LF and tabs become two
//! spaces. The scanner never panics and never surfaces an error; anything it
//! cannot make sense of resolves to an empty document, which downstream code
//! treats as "no policy".

use thiserror::Error;

/// A parsed document node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A key declared with no value and no indented children.
    Null,
    Str(String),
    Int(i64),
    Seq(Vec<Value>),
    /// Key-value pairs in declaration order.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Look up a key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn entries(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
enum ScanError {
    #[error("empty key on line {0}")]
    EmptyKey(usize),
}

/// A preprocessed line: indent width plus content with indentation removed.
struct Line {
    indent: usize,
    text: String,
}

fn preprocess(text: &str) -> Vec<Line> {
    let normalized = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "  ");

    normalized
        .lines()
        .filter_map(|raw| {
            let stripped = raw.trim_start();
            if stripped.is_empty() || stripped.starts_with('#') {
                return None;
            }
            Some(Line {
                indent: raw.len() - stripped.len(),
                text: stripped.to_string(),
            })
        })
        .collect()
}

/// Cut an inline `#` comment, respecting quoted strings. A `#` only starts a
/// comment when preceded by whitespace.
fn strip_inline_comment(value: &str) -> &str {
    let mut in_quote: Option<char> = None;
    let mut prev: Option<char> = None;
    for (i, ch) in value.char_indices() {
        match ch {
            '"' | '\'' => {
                if in_quote == Some(ch) {
                    in_quote = None;
                } else if in_quote.is_none() {
                    in_quote = Some(ch);
                }
            }
            '#' if in_quote.is_none() && matches!(prev, Some(' ')) => {
                return value[..i].trim_end();
            }
            _ => {}
        }
        prev = Some(ch);
    }
    value
}

/// Parse a scalar: quoted string, integer, or bare string.
fn parse_scalar(value: &str) -> Value {
    let v = value.trim();
    if v.is_empty() {
        return Value::Str(String::new());
    }
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')))
    {
        return Value::Str(v[1..v.len() - 1].to_string());
    }
    if let Ok(n) = v.parse::<i64>() {
        return Value::Int(n);
    }
    Value::Str(v.to_string())
}

fn parse_folded(lines: &[Line], mut idx: usize, min_indent: usize) -> (String, usize) {
    let mut parts = Vec::new();
    while idx < lines.len() {
        let line = &lines[idx];
        if line.indent < min_indent {
            break;
        }
        parts.push(line.text.clone());
        idx += 1;
    }
    (parts.join(" "), idx)
}

fn parse_mapping(
    lines: &[Line],
    mut idx: usize,
    min_indent: usize,
) -> Result<(Value, usize), ScanError> {
    let mut entries: Vec<(String, Value)> = Vec::new();
    while idx < lines.len() {
        let line = &lines[idx];
        if line.indent < min_indent {
            break;
        }
        // A mapping line must contain ':' and not introduce a sequence item
        if !line.text.contains(':') || line.text.starts_with("- ") {
            break;
        }
        let colon = line.text.find(':').unwrap();
        let key = line.text[..colon].trim().to_string();
        if key.is_empty() {
            return Err(ScanError::EmptyKey(idx + 1));
        }
        let rest = strip_inline_comment(line.text[colon + 1..].trim()).to_string();

        if rest == ">" {
            let (folded, next) = parse_folded(lines, idx + 1, line.indent + 1);
            entries.push((key, Value::Str(folded)));
            idx = next;
        } else if !rest.is_empty() {
            entries.push((key, parse_scalar(&rest)));
            idx += 1;
        } else {
            // No value: peek at the next line to decide mapping vs sequence
            idx += 1;
            if idx < lines.len() && lines[idx].indent > line.indent {
                let child_indent = lines[idx].indent;
                let (value, next) = if lines[idx].text.starts_with("- ") {
                    parse_sequence(lines, idx, child_indent)?
                } else {
                    parse_mapping(lines, idx, child_indent)?
                };
                entries.push((key, value));
                idx = next;
            } else {
                entries.push((key, Value::Null));
            }
        }
    }
    Ok((Value::Map(entries), idx))
}

fn parse_sequence(
    lines: &[Line],
    mut idx: usize,
    min_indent: usize,
) -> Result<(Value, usize), ScanError> {
    let mut items = Vec::new();
    while idx < lines.len() {
        let line = &lines[idx];
        if line.indent < min_indent || !line.text.starts_with("- ") {
            break;
        }
        let content = line.text[2..].trim().to_string();
        // Children of this item sit two columns past the dash
        let item_indent = line.indent + 2;

        if content.contains(':') && !content.starts_with('"') && !content.starts_with('\'') {
            // Mapping item: first key on the dash line, more keys below
            let colon = content.find(':').unwrap();
            let first_key = content[..colon].trim().to_string();
            let first_val = strip_inline_comment(content[colon + 1..].trim()).to_string();
            let mut obj = vec![(first_key, parse_scalar(&first_val))];
            idx += 1;

            while idx < lines.len() {
                let l = &lines[idx];
                if l.indent < item_indent || l.text.starts_with("- ") || !l.text.contains(':') {
                    break;
                }
                let cp = l.text.find(':').unwrap();
                let key = l.text[..cp].trim().to_string();
                let rest = strip_inline_comment(l.text[cp + 1..].trim()).to_string();

                if rest == ">" {
                    let (folded, next) = parse_folded(lines, idx + 1, l.indent + 1);
                    obj.push((key, Value::Str(folded)));
                    idx = next;
                } else if !rest.is_empty() {
                    obj.push((key, parse_scalar(&rest)));
                    idx += 1;
                } else {
                    idx += 1;
                    if idx < lines.len() && lines[idx].indent > l.indent {
                        let ci = lines[idx].indent;
                        let (value, next) = if lines[idx].text.starts_with("- ") {
                            parse_sequence(lines, idx, ci)?
                        } else {
                            parse_mapping(lines, idx, ci)?
                        };
                        obj.push((key, value));
                        idx = next;
                    } else {
                        obj.push((key, Value::Null));
                    }
                }
            }
            items.push(Value::Map(obj));
        } else {
            items.push(parse_scalar(&content));
            idx += 1;
        }
    }
    Ok((Value::Seq(items), idx))
}

/// Parse a policy document. Malformed or empty input yields an empty mapping.
pub fn parse_document(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Map(Vec::new());
    }
    let lines = preprocess(text);
    if lines.is_empty() {
        return Value::Map(Vec::new());
    }
    match parse_mapping(&lines, 0, 0) {
        Ok((value, _)) => value,
        Err(err) => {
            tracing::debug!(error = %err, "policy document rejected by scanner");
            Value::Map(Vec::new())
        }
    }
}
