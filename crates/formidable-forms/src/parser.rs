//! The bracket key-path parser.
//!
//! HTML forms and query strings encode nested structure in flat keys:
//! `address[street]`, `friends[]`, `skills[0][name]`. [`KeyPathParser`] turns
//! a [`MultiValueDict`] of such keys into a [`RequestTree`] of mappings,
//! sequences, and raw string leaves.
//!
//! ## Grammar
//!
//! A key is a root segment followed by zero or more bracket segments:
//!
//! - `name[child]` addresses a mapping entry,
//! - `name[3]` (all digits) addresses a sequence slot. Sequences are sparse,
//!   so `name[1500]` holds one entry and not 1501,
//! - `name[]` (only as the last segment) attaches the whole value list as a
//!   sequence of raw leaves.
//!
//! Any other terminal segment takes the **first** value of the list.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use formidable_core::error::ParseError;
use formidable_core::settings::SETTINGS;
use formidable_core::utils::MultiValueDict;
use formidable_core::value::Value;

static ABSENT: RequestTree = RequestTree::Absent;

/// The nested request data produced by [`KeyPathParser`].
///
/// Leaves are always raw strings; missing sequence slots and missing keys
/// are [`Absent`](RequestTree::Absent).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestTree {
    /// A mapping node, in the order keys were first seen.
    Map(IndexMap<String, RequestTree>),
    /// A sequence node keyed by index, iterated in index order. Indexes that
    /// were never addressed are gaps and have no entry.
    List(BTreeMap<usize, RequestTree>),
    /// A raw string leaf.
    Str(String),
    /// No data.
    #[default]
    Absent,
}

impl RequestTree {
    /// Returns the child at `key`, or `Absent`.
    ///
    /// Sequence nodes are indexed with the decimal form of the position.
    pub fn get(&self, key: &str) -> &Self {
        match self {
            Self::Map(map) => map.get(key).unwrap_or(&ABSENT),
            Self::List(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(&i))
                .unwrap_or(&ABSENT),
            Self::Str(_) | Self::Absent => &ABSENT,
        }
    }

    /// Returns `true` if this mapping node has an entry for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self, Self::Map(map) if map.contains_key(key))
    }

    /// Returns `true` for `Absent`.
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the string of a leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the entries of a mapping node.
    pub const fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the entries of a sequence node.
    pub const fn as_list(&self) -> Option<&BTreeMap<usize, Self>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts the tree into a raw [`Value`]: strings stay strings,
    /// `Absent` becomes `None`, and absent sequence slots are dropped.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Str(s) => Some(Value::String(s.clone())),
            Self::List(items) => Some(Value::List(
                items.values().filter_map(Self::to_value).collect(),
            )),
            Self::Map(map) => Some(Value::Map(
                map.iter()
                    .filter_map(|(k, v)| v.to_value().map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Builds a tree from a value tree, such as the output of a form save.
    ///
    /// Scalars are rendered to the strings a browser would submit for them.
    /// `Null` becomes `Absent`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::List(items) => {
                Self::List(items.iter().map(Self::from_value).enumerate().collect())
            }
            Value::Map(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect(),
            ),
            Value::DateTime(dt) => Self::Str(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            other => Self::Str(other.to_string()),
        }
    }

    /// Flattens the tree back into bracket keys.
    ///
    /// This is the inverse of [`KeyPathParser::parse`]: gap-free sequences
    /// made only of leaves use the `name[]` form, every other sequence is
    /// indexed.
    /// Empty sequences and absent nodes produce no keys, so they do not
    /// survive a round-trip.
    pub fn flatten(&self) -> MultiValueDict<String, String> {
        let mut out = MultiValueDict::new();
        if let Self::Map(map) = self {
            for (key, child) in map {
                flatten_into(child, key.clone(), &mut out);
            }
        }
        out
    }
}

fn flatten_into(node: &RequestTree, path: String, out: &mut MultiValueDict<String, String>) {
    match node {
        RequestTree::Absent => {}
        RequestTree::Str(s) => out.append(path, s.clone()),
        RequestTree::Map(map) => {
            for (key, child) in map {
                flatten_into(child, format!("{path}[{key}]"), out);
            }
        }
        RequestTree::List(items) => {
            let dense = items.keys().enumerate().all(|(pos, i)| pos == *i);
            if dense && items.values().all(|item| matches!(item, RequestTree::Str(_))) {
                for item in items.values() {
                    if let RequestTree::Str(s) = item {
                        out.append(format!("{path}[]"), s.clone());
                    }
                }
            } else {
                for (i, item) in items {
                    flatten_into(item, format!("{path}[{i}]"), out);
                }
            }
        }
    }
}

/// One segment of a bracket key.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Append,
}

/// Parses flat bracket-encoded keys into a [`RequestTree`].
///
/// # Examples
///
/// ```
/// use formidable_core::utils::MultiValueDict;
/// use formidable_forms::parser::{KeyPathParser, RequestTree};
///
/// let data = MultiValueDict::from_pairs([
///     ("a[0][x]", vec!["1"]),
///     ("a[1][x]", vec!["2"]),
/// ]);
/// let tree = KeyPathParser::new().parse(&data).unwrap();
/// assert_eq!(tree.get("a").get("1").get("x").as_str(), Some("2"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPathParser {
    max_index: Option<usize>,
}

impl Default for KeyPathParser {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyPathParser {
    /// Creates a parser using the configured `max_index` setting, which
    /// accepts every index unless it was set.
    pub fn new() -> Self {
        Self {
            max_index: SETTINGS.get_or_default().max_index,
        }
    }

    /// Sets the largest sequence index accepted.
    #[must_use]
    pub const fn with_max_index(mut self, max_index: usize) -> Self {
        self.max_index = Some(max_index);
        self
    }

    /// Returns the largest sequence index accepted, if one is set.
    pub const fn max_index(&self) -> Option<usize> {
        self.max_index
    }

    /// Parses every key of `data` into one tree rooted at a mapping node.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed keys, for paths addressed
    /// with conflicting shapes, for indexes that do not fit in a `usize`, and
    /// for indexes above `max_index` when one is set.
    pub fn parse(&self, data: &MultiValueDict<String, String>) -> Result<RequestTree, ParseError> {
        let mut root = RequestTree::Map(IndexMap::new());
        for (key, values) in data {
            if values.is_empty() {
                continue;
            }
            let segments = self.split_key(key)?;
            tracing::trace!(key = %key, segments = segments.len(), "parsing key");
            insert(&mut root, &segments, values, String::new(), key)?;
        }
        Ok(root)
    }

    fn split_key(&self, key: &str) -> Result<Vec<Segment>, ParseError> {
        let (root, mut rest) = key.find('[').map_or((key, ""), |pos| key.split_at(pos));
        if root.contains(']') {
            return Err(ParseError::UnbalancedBrackets(key.to_string()));
        }
        if root.is_empty() {
            return Err(ParseError::EmptyRoot(key.to_string()));
        }

        let mut segments = vec![Segment::Key(root.to_string())];
        while !rest.is_empty() {
            let Some(inner) = rest.strip_prefix('[') else {
                return Err(ParseError::UnbalancedBrackets(key.to_string()));
            };
            let Some(close) = inner.find(']') else {
                return Err(ParseError::UnbalancedBrackets(key.to_string()));
            };
            let segment = &inner[..close];
            if segment.contains('[') {
                return Err(ParseError::UnbalancedBrackets(key.to_string()));
            }
            if segments.last() == Some(&Segment::Append) {
                return Err(ParseError::EmptyBracketNotLast(key.to_string()));
            }
            segments.push(self.classify(segment, key)?);
            rest = &inner[close + 1..];
        }
        Ok(segments)
    }

    fn classify(&self, segment: &str, key: &str) -> Result<Segment, ParseError> {
        if segment.is_empty() {
            return Ok(Segment::Append);
        }
        if !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Segment::Key(segment.to_string()));
        }
        let index = segment
            .parse::<usize>()
            .map_err(|_| ParseError::IndexOverflow(key.to_string()))?;
        match self.max_index {
            Some(max) if index > max => Err(ParseError::IndexTooLarge {
                index,
                max,
                key: key.to_string(),
            }),
            _ => Ok(Segment::Index(index)),
        }
    }
}

/// Parses `data` with a default [`KeyPathParser`].
///
/// # Errors
///
/// See [`KeyPathParser::parse`].
pub fn parse(data: &MultiValueDict<String, String>) -> Result<RequestTree, ParseError> {
    KeyPathParser::new().parse(data)
}

fn conflict(path: &str, key: &str) -> ParseError {
    ParseError::ShapeConflict {
        path: path.to_string(),
        key: key.to_string(),
    }
}

fn child_path(path: &str, segment: &Segment) -> String {
    match segment {
        Segment::Key(name) if path.is_empty() => name.clone(),
        Segment::Key(name) => format!("{path}[{name}]"),
        Segment::Index(i) => format!("{path}[{i}]"),
        Segment::Append => format!("{path}[]"),
    }
}

/// Walks `node` along `segments`, creating nodes on the way, and attaches
/// the leaf for `values` at the end of the path.
fn insert(
    node: &mut RequestTree,
    segments: &[Segment],
    values: &[String],
    path: String,
    key: &str,
) -> Result<(), ParseError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(());
    };
    let path = child_path(&path, segment);

    let slot = match segment {
        Segment::Key(name) => {
            if node.is_absent() {
                *node = RequestTree::Map(IndexMap::new());
            }
            let RequestTree::Map(map) = node else {
                return Err(conflict(&path, key));
            };
            map.entry(name.clone()).or_default()
        }
        Segment::Index(index) => {
            if node.is_absent() {
                *node = RequestTree::List(BTreeMap::new());
            }
            let RequestTree::List(items) = node else {
                return Err(conflict(&path, key));
            };
            items.entry(*index).or_default()
        }
        // `[]` is split off by the segment before it.
        Segment::Append => return Err(ParseError::EmptyBracketNotLast(key.to_string())),
    };

    match rest {
        [] => match *slot {
            RequestTree::Absent => {
                *slot = RequestTree::Str(values[0].clone());
                Ok(())
            }
            // Two keys naming the same slot (`a[1]` and `a[01]`): first wins.
            RequestTree::Str(_) => Ok(()),
            _ => Err(conflict(&path, key)),
        },
        [Segment::Append] => {
            if !slot.is_absent() {
                return Err(conflict(&path, key));
            }
            *slot = RequestTree::List(
                values.iter().cloned().map(RequestTree::Str).enumerate().collect(),
            );
            Ok(())
        }
        _ => {
            if matches!(*slot, RequestTree::Str(_)) {
                return Err(conflict(&path, key));
            }
            insert(slot, rest, values, path, key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(pairs: &[(&str, Vec<&str>)]) -> MultiValueDict<String, String> {
        MultiValueDict::from_pairs(pairs.iter().map(|(k, vs)| (*k, vs.clone())))
    }

    fn leaf(s: &str) -> RequestTree {
        RequestTree::Str(s.to_string())
    }

    fn map(pairs: Vec<(&str, RequestTree)>) -> RequestTree {
        RequestTree::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn list(items: Vec<RequestTree>) -> RequestTree {
        RequestTree::List(items.into_iter().enumerate().collect())
    }

    #[test]
    fn test_parse_flat_keys() {
        let tree = parse(&dict(&[("name", vec!["Ann"]), ("age", vec!["30"])])).unwrap();
        assert_eq!(tree, map(vec![("name", leaf("Ann")), ("age", leaf("30"))]));
    }

    #[test]
    fn test_parse_name_segments_nest_per_depth() {
        let tree = parse(&dict(&[
            ("address[street]", vec!["Main"]),
            ("address[geo][lat]", vec!["1.5"]),
            ("address[geo][lng]", vec!["2.5"]),
            ("title", vec!["x"]),
        ]))
        .unwrap();
        let expected = map(vec![
            (
                "address",
                map(vec![
                    ("street", leaf("Main")),
                    ("geo", map(vec![("lat", leaf("1.5")), ("lng", leaf("2.5"))])),
                ]),
            ),
            ("title", leaf("x")),
        ]);
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_parse_indexed_children() {
        let tree = parse(&dict(&[("a[0][x]", vec!["1"]), ("a[1][x]", vec!["2"])])).unwrap();
        let expected = map(vec![(
            "a",
            list(vec![map(vec![("x", leaf("1"))]), map(vec![("x", leaf("2"))])]),
        )]);
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_parse_append_keeps_raw_leaves() {
        let tree = parse(&dict(&[("tags[]", vec!["p", "q"])])).unwrap();
        assert_eq!(
            tree,
            map(vec![("tags", list(vec![leaf("p"), leaf("q")]))])
        );
    }

    #[test]
    fn test_parse_first_value_wins() {
        let tree = parse(&dict(&[("name", vec!["first", "second"])])).unwrap();
        assert_eq!(tree.get("name").as_str(), Some("first"));
    }

    #[test]
    fn test_parse_gaps_are_absent() {
        let tree = parse(&dict(&[("a[2]", vec!["z"])])).unwrap();
        let items = tree.get("a").as_list().unwrap();
        assert_eq!(items.len(), 1);
        assert!(tree.get("a").get("0").is_absent());
        assert!(tree.get("a").get("1").is_absent());
        assert_eq!(items[&2], leaf("z"));
    }

    #[test]
    fn test_parse_large_index_is_sparse() {
        let tree = parse(&dict(&[
            ("a[1500][x]", vec!["late"]),
            ("a[3][x]", vec!["early"]),
        ]))
        .unwrap();
        let items = tree.get("a").as_list().unwrap();
        assert_eq!(items.keys().copied().collect::<Vec<_>>(), vec![3, 1500]);
        assert_eq!(tree.get("a").get("1500").get("x").as_str(), Some("late"));

        let raw = tree.get("a").to_value().unwrap();
        assert_eq!(raw.as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_unbalanced_brackets() {
        for key in ["a[b", "a]b", "a[b]c", "a[b[c]]"] {
            let err = parse(&dict(&[(key, vec!["1"])])).unwrap_err();
            assert_eq!(err, ParseError::UnbalancedBrackets(key.to_string()), "{key}");
        }
    }

    #[test]
    fn test_parse_empty_root() {
        let err = parse(&dict(&[("[a]", vec!["1"])])).unwrap_err();
        assert_eq!(err, ParseError::EmptyRoot("[a]".to_string()));
    }

    #[test]
    fn test_parse_append_not_last() {
        let err = parse(&dict(&[("a[][b]", vec!["1"])])).unwrap_err();
        assert_eq!(err, ParseError::EmptyBracketNotLast("a[][b]".to_string()));
    }

    #[test]
    fn test_parse_shape_conflict_index_and_name() {
        let err = parse(&dict(&[("x[0]", vec!["1"]), ("x[foo]", vec!["2"])])).unwrap_err();
        assert_eq!(
            err,
            ParseError::ShapeConflict {
                path: "x[foo]".to_string(),
                key: "x[foo]".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_shape_conflict_leaf_and_map() {
        let err = parse(&dict(&[("x", vec!["1"]), ("x[a]", vec!["2"])])).unwrap_err();
        assert!(matches!(err, ParseError::ShapeConflict { .. }));

        let err = parse(&dict(&[("x[a]", vec!["2"]), ("x", vec!["1"])])).unwrap_err();
        assert!(matches!(err, ParseError::ShapeConflict { .. }));
    }

    #[test]
    fn test_parse_index_too_large() {
        let parser = KeyPathParser::new().with_max_index(10);
        let err = parser.parse(&dict(&[("a[11]", vec!["1"])])).unwrap_err();
        assert_eq!(
            err,
            ParseError::IndexTooLarge {
                index: 11,
                max: 10,
                key: "a[11]".to_string(),
            }
        );
        assert!(parser.parse(&dict(&[("a[10]", vec!["1"])])).is_ok());
    }

    #[test]
    fn test_parse_index_overflow() {
        let key = "a[99999999999999999999999]";
        let err = parse(&dict(&[(key, vec!["1"])])).unwrap_err();
        assert_eq!(err, ParseError::IndexOverflow(key.to_string()));
    }

    #[test]
    fn test_parser_has_no_limit_by_default() {
        assert_eq!(KeyPathParser::new().max_index(), None);
        assert!(parse(&dict(&[("a[1000000]", vec!["1"])])).is_ok());
    }

    #[test]
    fn test_get_on_list_and_missing() {
        let tree = parse(&dict(&[("a[0]", vec!["x"])])).unwrap();
        assert_eq!(tree.get("a").get("0").as_str(), Some("x"));
        assert!(tree.get("a").get("1").is_absent());
        assert!(tree.get("b").get("c").is_absent());
        assert!(tree.contains_key("a"));
    }

    #[test]
    fn test_flatten_reparses_to_same_tree() {
        let data = dict(&[
            ("name", vec!["Ann"]),
            ("tags[]", vec!["a", "b"]),
            ("skills[0][name]", vec!["Rust"]),
            ("skills[1][name]", vec!["Go"]),
            ("address[city]", vec!["Lima"]),
        ]);
        let tree = parse(&data).unwrap();
        let again = parse(&tree.flatten()).unwrap();
        assert_eq!(tree, again);
    }

    #[test]
    fn test_flatten_keeps_gaps_indexed() {
        let data = dict(&[("a[2]", vec!["z"]), ("a[0]", vec!["x"])]);
        let tree = parse(&data).unwrap();
        let flat = tree.flatten();
        assert_eq!(flat.get(&"a[0]".to_string()), Some(&"x".to_string()));
        assert_eq!(flat.get(&"a[2]".to_string()), Some(&"z".to_string()));
        assert_eq!(parse(&flat).unwrap(), tree);
    }

    #[test]
    fn test_from_value_and_to_value() {
        let value = Value::map([
            ("name", Value::from("Ann")),
            ("age", Value::from(30)),
            ("tags", Value::List(vec!["a".into(), "b".into()])),
            ("nothing", Value::Null),
        ]);
        let tree = RequestTree::from_value(&value);
        assert_eq!(tree.get("age").as_str(), Some("30"));
        assert!(tree.get("nothing").is_absent());

        let raw = tree.to_value().unwrap();
        assert_eq!(raw.get("name"), Some(&Value::from("Ann")));
        assert_eq!(raw.get("nothing"), None);
    }
}
