//! Read yarn.lock (classic v1 text format; the `key: value` form of newer files is tolerated).
//!
//! A header line lists one or more `name@range` keys sharing a body:
//!
//! ```text
//! "@babel/code-frame@^7.0.0", "@babel/code-frame@^7.10.4":
//!   version "7.12.13"
//!   resolved "https://registry.yarnpkg.com/@babel/code-frame/-/code-frame-7.12.13.tgz"
//!   dependencies:
//!     "@babel/highlight" "^7.12.13"
//! ```
//!
//! Each key becomes its own [`ClassicLockEntry`], in file order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error_handling::utils::{unparseable, unreadable};
use crate::error_handling::ResolveError;

/// One `name@range` key and the body it resolved to.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClassicLockEntry {
    pub key: String,
    pub version: String,
    /// Absent for `file:` and workspace-linked packages.
    pub resolved: Option<String>,
    pub dependencies: BTreeMap<String, String>,
}

/// Flat-keyed lockfile: entries in the order they appear in the file.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClassicLockfile {
    pub entries: Vec<ClassicLockEntry>,
}

impl ClassicLockfile {
    /// Entries whose key belongs to `name` (`name@...`) and whose version equals `version`.
    pub fn matching<'a>(
        &'a self,
        name: &'a str,
        version: &'a str,
    ) -> impl Iterator<Item = &'a ClassicLockEntry> + 'a {
        self.entries.iter().filter(move |e| {
            e.key
                .strip_prefix(name)
                .map(|rest| rest.starts_with('@'))
                .unwrap_or(false)
                && e.version == version
        })
    }
}

/// Read and parse a yarn.lock file.
pub fn read_yarn_lock(path: &Path) -> Result<ClassicLockfile, ResolveError> {
    let s = std::fs::read_to_string(path).map_err(|e| unreadable(path, e))?;
    parse_yarn_lock(&s, path)
}

#[derive(Default)]
struct Block {
    keys: Vec<String>,
    fields: BTreeMap<String, String>,
    maps: BTreeMap<String, BTreeMap<String, String>>,
    open_map: Option<String>,
}

impl Block {
    fn into_entries(mut self, out: &mut Vec<ClassicLockEntry>) {
        let dependencies = self.maps.remove("dependencies").unwrap_or_default();
        for key in self.keys {
            out.push(ClassicLockEntry {
                key,
                version: self.fields.get("version").cloned().unwrap_or_default(),
                resolved: self.fields.get("resolved").cloned(),
                dependencies: dependencies.clone(),
            });
        }
    }
}

/// Parse yarn.lock content. `path` is only used for error messages.
pub fn parse_yarn_lock(content: &str, path: &Path) -> Result<ClassicLockfile, ResolveError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut entries = Vec::new();
    let mut block: Option<Block> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if ["<<<<<<<", "=======", ">>>>>>>"].iter().any(|m| line.starts_with(m)) {
            return Err(unparseable(path, Some(line_no), "merge conflict marker"));
        }

        let indent = line.len() - line.trim_start_matches(' ').len();
        if line[indent..].starts_with('\t') || indent % 2 != 0 {
            return Err(unparseable(path, Some(line_no), "unexpected indentation"));
        }

        match indent / 2 {
            0 => {
                let header = trimmed
                    .strip_suffix(':')
                    .ok_or_else(|| unparseable(path, Some(line_no), "expected `:` after entry keys"))?;
                if let Some(done) = block.take() {
                    done.into_entries(&mut entries);
                }
                let keys = parse_header_keys(header);
                if keys.is_empty() {
                    return Err(unparseable(path, Some(line_no), "entry without keys"));
                }
                block = Some(Block { keys, ..Block::default() });
            }
            1 => {
                let b = block
                    .as_mut()
                    .ok_or_else(|| unparseable(path, Some(line_no), "field outside of an entry"))?;
                let (key, value) = split_key_value(trimmed)
                    .ok_or_else(|| unparseable(path, Some(line_no), "unterminated string"))?;
                match value {
                    Some(v) => {
                        b.fields.insert(key, v);
                        b.open_map = None;
                    }
                    None => {
                        b.maps.entry(key.clone()).or_default();
                        b.open_map = Some(key);
                    }
                }
            }
            2 => {
                let b = block
                    .as_mut()
                    .ok_or_else(|| unparseable(path, Some(line_no), "field outside of an entry"))?;
                let map_name = b
                    .open_map
                    .clone()
                    .ok_or_else(|| unparseable(path, Some(line_no), "unexpected indentation"))?;
                let (key, value) = split_key_value(trimmed)
                    .ok_or_else(|| unparseable(path, Some(line_no), "unterminated string"))?;
                b.maps
                    .entry(map_name)
                    .or_default()
                    .insert(key, value.unwrap_or_default());
            }
            // deeper maps (e.g. dependenciesMeta) carry nothing used for resolution
            _ => {
                if block.as_ref().and_then(|b| b.open_map.as_ref()).is_none() {
                    return Err(unparseable(path, Some(line_no), "unexpected indentation"));
                }
            }
        }
    }
    if let Some(done) = block.take() {
        done.into_entries(&mut entries);
    }
    Ok(ClassicLockfile { entries })
}

/// `"a@^1", a@~1.2` -> ["a@^1", "a@~1.2"]. A quoted key may itself hold a comma-joined list.
fn parse_header_keys(header: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for c in header.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                keys.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    keys.push(current);

    keys.iter()
        .flat_map(|k| {
            unquote(k.trim())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|k| !k.is_empty())
        .collect()
}

/// Split `key value`, `key: value`, `"key" "value"` or `key:`. Value is None when the line opens a map.
fn split_key_value(s: &str) -> Option<(String, Option<String>)> {
    let (key, rest) = if s.starts_with('"') {
        let end = closing_quote(s)?;
        let key = unquote(&s[..=end]);
        let rest = s[end + 1..].trim_start();
        (key, rest.strip_prefix(':').unwrap_or(rest))
    } else {
        let end = s.find(char::is_whitespace).unwrap_or(s.len());
        let token = &s[..end];
        let rest = &s[end..];
        match token.strip_suffix(':') {
            Some(k) => (k.to_string(), rest),
            None => (token.to_string(), rest),
        }
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return Some((key, None));
    }
    if rest.starts_with('"') && closing_quote(rest)? != rest.len() - 1 {
        return None;
    }
    Some((key, Some(unquote(rest))))
}

/// Byte index of the quote closing the string that opens at index 0.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some(i);
        }
    }
    None
}

fn unquote(s: &str) -> String {
    if s.len() < 2 || !s.starts_with('"') || !s.ends_with('"') {
        return s.to_string();
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
