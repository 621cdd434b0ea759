//! Ordered query-string parameters.
//!
//! The thumbnail generator receives its options as a single query string, and
//! callers hand extra options to the resolver in the same shape. The rules here
//! match what CMS-side code expects from those strings:
//!
//! | Operation | Behavior |
//! |---|---|
//! | [`QueryParams::parse`] | `&`-separated pairs, `+` is a space, keys have `.` and ` ` mangled to `_`, `key[]` collects a list |
//! | [`QueryParams::merge`] | same-named keys override in place, new keys are appended |
//! | [`QueryParams::retain_non_empty`] | drops values that are `""` or `"0"` |
//! | [`QueryParams::to_query_string`] | percent-encoded `key=value` joined by `&`, space as `+`, lists as `key[0]`, `key[1]`, … |
//!
//! Insertion order is preserved throughout, so `sx=1&sy=2` never comes back
//! as `sy=2&sx=1`. Stacked options such as phpThumb filters keep every value:
//!
//! ```text
//! fltr[]=gam|1.2&fltr[]=usm|80|0.5|3
//! → fltr%5B0%5D=gam%7C1.2&fltr%5B1%5D=usm%7C80%7C0.5%7C3
//! ```

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Single(String),
    List(Vec<String>),
}

/// An insertion-ordered list of unique query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, Value)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string such as `q=80&fltr[]=gam|1.2&zc=`.
    ///
    /// - A pair without `=` gets an empty value (`zc` → `zc=""`).
    /// - A repeated key keeps its first position and takes the last value.
    /// - A key ending in `[]` appends to the list named by the rest of the
    ///   key (`fltr[]` → `fltr`).
    /// - Pairs with an empty key are skipped.
    /// - A leading `?` is ignored.
    pub fn parse(input: &str) -> Self {
        let mut params = Self::new();
        let input = input.strip_prefix('?').unwrap_or(input);
        for pair in input.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = mangle_key(&decode_component(raw_key));
            if key.is_empty() || key == "[]" {
                continue;
            }
            let value = decode_component(raw_value);
            if let Some(name) = key.strip_suffix("[]") {
                params.append(name, value);
            } else {
                params.insert(key, value);
            }
        }
        params
    }

    /// Set `key` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key.into(), Value::Single(value.into()));
    }

    /// Add `value` to the list `key`. A single value under the same key is
    /// replaced by a new list.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, Value::List(values))) => values.push(value),
            Some((_, slot)) => *slot = Value::List(vec![value]),
            None => self.pairs.push((key, Value::List(vec![value]))),
        }
    }

    fn set(&mut self, key: String, value: Value) {
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Value of a single-valued parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).and_then(|(_, v)| match v {
            Value::Single(value) => Some(value.as_str()),
            Value::List(_) => None,
        })
    }

    /// Values of a list parameter (`key[]` on input).
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.pairs.iter().find(|(k, _)| k == key).and_then(|(_, v)| match v {
            Value::List(values) => Some(values.as_slice()),
            Value::Single(_) => None,
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Flattened `(key, value)` pairs in output order; list entries are
    /// keyed `name[0]`, `name[1]`, ….
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> {
        self.pairs.iter().flat_map(|(key, value)| {
            let flat: Vec<(String, &str)> = match value {
                Value::Single(v) => vec![(key.clone(), v.as_str())],
                Value::List(values) => values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (format!("{key}[{i}]"), v.as_str()))
                    .collect(),
            };
            flat
        })
    }

    /// Overlay `other` on top of `self`.
    ///
    /// Keys already present keep their position and take `other`'s value;
    /// keys only in `other` are appended in `other`'s order.
    pub fn merge(mut self, other: QueryParams) -> Self {
        for (key, value) in other.pairs {
            self.set(key, value);
        }
        self
    }

    /// Drop every single value that counts as empty (`""` or `"0"`) and every
    /// empty list. Lists with entries are kept whole.
    pub fn retain_non_empty(&mut self) {
        self.pairs.retain(|(_, v)| match v {
            Value::Single(value) => !is_empty_value(value),
            Value::List(values) => !values.is_empty(),
        });
    }

    pub fn to_query_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", encode_component(&key), encode_component(value))?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

fn is_empty_value(value: &str) -> bool {
    value.is_empty() || value == "0"
}

/// Keys may not contain `.` or spaces; both become `_`, and leading spaces
/// are dropped.
fn mangle_key(key: &str) -> String {
    key.trim_start_matches(' ')
        .chars()
        .map(|c| if c == '.' || c == ' ' { '_' } else { c })
        .collect()
}

/// Form-style decoding. Sequences that do not decode to UTF-8 are kept as-is.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Form-style encoding: unreserved characters pass through (except `~`), space
/// is `+`, everything else is percent-encoded.
fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw)
        .replace("%20", "+")
        .replace('~', "%7E")
}
