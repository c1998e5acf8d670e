//! Dotted/bracketed addresses into JSON documents: `items[0].name`.

use std::fmt;

use serde_json::Value;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath(pub Vec<PathSegment>);

impl JsonPath {
    pub fn child_key(&self, key: &str) -> JsonPath {
        let mut segs = self.0.clone();
        segs.push(PathSegment::Key(key.to_string()));
        JsonPath(segs)
    }

    pub fn child_index(&self, index: usize) -> JsonPath {
        let mut segs = self.0.clone();
        segs.push(PathSegment::Index(index));
        JsonPath(segs)
    }

    /// Inverse of `Display`. Bracketed or dotted digits become indices;
    /// `set` still treats them as keys when the node is an object.
    /// `["..."]` holds a key verbatim, with `\\` and `\"` escapes.
    pub fn parse(s: &str) -> JsonPath {
        let mut segs = Vec::new();
        let mut plain = String::new();
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => push_plain(&mut plain, &mut segs),
                '[' => {
                    push_plain(&mut plain, &mut segs);
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        let mut key = String::new();
                        while let Some(c) = chars.next() {
                            match c {
                                '\\' => key.extend(chars.next()),
                                '"' => break,
                                _ => key.push(c),
                            }
                        }
                        chars.by_ref().find(|&c| c == ']');
                        segs.push(PathSegment::Key(key));
                    } else {
                        let mut inner: String = chars.by_ref().take_while(|&c| c != ']').collect();
                        push_plain(&mut inner, &mut segs);
                    }
                }
                _ => plain.push(c),
            }
        }
        push_plain(&mut plain, &mut segs);

        JsonPath(segs)
    }

    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |node, seg| match (seg, node) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k),
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i),
            (PathSegment::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            _ => None,
        })
    }

    /// Replaces the value at this path. Every parent must already exist;
    /// the last key may be new on an object.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<()> {
        let Some((last, parents)) = self.0.split_last() else {
            return Err(self.error("empty path"));
        };

        let mut node = root;
        for seg in parents {
            node = match (seg, node) {
                (PathSegment::Key(k), Value::Object(map)) => map.get_mut(k),
                (PathSegment::Index(i), Value::Array(arr)) => arr.get_mut(*i),
                (PathSegment::Index(i), Value::Object(map)) => map.get_mut(&i.to_string()),
                _ => None,
            }
            .ok_or_else(|| self.error(&format!("missing parent `{}`", seg_label(seg))))?;
        }

        match (last, node) {
            (PathSegment::Key(k), Value::Object(map)) => {
                map.insert(k.clone(), value);
                Ok(())
            }
            (PathSegment::Index(i), Value::Object(map)) => {
                map.insert(i.to_string(), value);
                Ok(())
            }
            (PathSegment::Index(i), Value::Array(arr)) => match arr.get_mut(*i) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(self.error(&format!("index {i} out of bounds"))),
            },
            (seg, _) => Err(self.error(&format!("`{}` does not address a container", seg_label(seg)))),
        }
    }

    fn error(&self, reason: &str) -> CoreError {
        CoreError::JsonPath {
            path: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn push_plain(part: &mut String, segs: &mut Vec<PathSegment>) {
    if part.is_empty() {
        return;
    }
    let seg = match part.parse::<usize>() {
        Ok(i) if part.chars().all(|c| c.is_ascii_digit()) => PathSegment::Index(i),
        _ => PathSegment::Key(part.clone()),
    };
    segs.push(seg);
    part.clear();
}

/// Keys that would not survive a plain dotted rendering.
fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"', '\\'])
}

fn seg_label(seg: &PathSegment) -> String {
    match seg {
        PathSegment::Key(k) => k.clone(),
        PathSegment::Index(i) => format!("[{i}]"),
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, seg) in self.0.iter().enumerate() {
            match seg {
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Key(k) if needs_quoting(k) => {
                    let escaped = k.replace('\\', "\\\\").replace('"', "\\\"");
                    write!(f, "[\"{escaped}\"]")?
                }
                PathSegment::Key(k) if n == 0 => write!(f, "{k}")?,
                PathSegment::Key(k) => write!(f, ".{k}")?,
            }
        }
        Ok(())
    }
}

/// All string values stored under one of `field_names` (compared
/// lowercase), found depth-first in document order. A matching field whose
/// value is not a string is searched like any other value.
pub fn find_text_fields<'a>(root: &'a Value, field_names: &[&str]) -> Vec<(JsonPath, &'a str)> {
    let mut out = Vec::new();
    walk(root, &JsonPath::default(), field_names, &mut out);
    out
}

fn walk<'a>(value: &'a Value, path: &JsonPath, names: &[&str], out: &mut Vec<(JsonPath, &'a str)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                match v {
                    Value::String(s) if names.contains(&k.to_lowercase().as_str()) => {
                        out.push((path.child_key(k), s.as_str()));
                    }
                    _ => walk(v, &path.child_key(k), names, out),
                }
            }
        }
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                walk(v, &path.child_index(i), names, out);
            }
        }
        _ => {}
    }
}
