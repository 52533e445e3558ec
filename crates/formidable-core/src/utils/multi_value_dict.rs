//! A dictionary that can hold multiple values per key.
//!
//! [`MultiValueDict`] is the shape of flat request payloads: form bodies and
//! query strings where a single key may appear multiple times. Keys keep the
//! order in which they were first inserted, so anything derived from a
//! dictionary (like the parsed request tree) is deterministic.

use std::hash::Hash;

use indexmap::{map, IndexMap};
use percent_encoding::percent_decode_str;

/// An insertion-ordered dictionary that maps keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **first** value for a key, which
/// is the value a single-valued form input is bound from;
/// [`get_last`](MultiValueDict::get_last) and
/// [`get_list`](MultiValueDict::get_list) expose the rest.
///
/// # Examples
///
/// ```
/// use formidable_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get(&"color".to_string()), Some(&"red"));
/// assert_eq!(d.get_last(&"color".to_string()), Some(&"blue"));
/// assert_eq!(d.get_list(&"color".to_string()), Some(&vec!["red", "blue"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiValueDict<K: Eq + Hash, V> {
    inner: IndexMap<K, Vec<V>>,
}

impl<K: Eq + Hash, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }

    /// Returns a reference to the **first** value associated with the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key).and_then(|v| v.first())
    }

    /// Returns a reference to the **last** value associated with the key.
    pub fn get_last(&self, key: &K) -> Option<&V> {
        self.inner.get(key).and_then(|v| v.last())
    }

    /// Returns a reference to all values associated with the key.
    pub fn get_list(&self, key: &K) -> Option<&Vec<V>> {
        self.inner.get(key)
    }

    /// Sets the value for a key, replacing any existing values.
    pub fn set(&mut self, key: K, value: V) {
        self.inner.insert(key, vec![value]);
    }

    /// Sets all values for a key, replacing any existing values.
    pub fn set_list(&mut self, key: K, values: Vec<V>) {
        self.inner.insert(key, values);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        self.inner.entry(key).or_default().push(value);
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> map::Keys<'_, K, Vec<V>> {
        self.inner.keys()
    }

    /// Returns an iterator over all value lists.
    pub fn values(&self) -> map::Values<'_, K, Vec<V>> {
        self.inner.values()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns an iterator over (key, value-list) pairs.
    pub fn iter(&self) -> map::Iter<'_, K, Vec<V>> {
        self.inner.iter()
    }
}

impl MultiValueDict<String, String> {
    /// Parses an `application/x-www-form-urlencoded` string.
    ///
    /// Pairs are split on `&`, keys and values are percent-decoded and `+`
    /// is read as a space. A pair without `=` gets an empty value.
    ///
    /// ```
    /// use formidable_core::utils::MultiValueDict;
    ///
    /// let d = MultiValueDict::from_urlencoded("tags%5B%5D=a&tags%5B%5D=b&name=Ann+Lee");
    /// assert_eq!(d.get(&"name".to_string()).map(String::as_str), Some("Ann Lee"));
    /// assert_eq!(d.get_list(&"tags[]".to_string()).map(Vec::len), Some(2));
    /// ```
    pub fn from_urlencoded(body: &str) -> Self {
        let mut data = Self::new();
        for pair in body.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));
            data.append(decode_component(key), decode_component(value));
        }
        data
    }
}

impl MultiValueDict<String, String> {
    /// Builds a dictionary from `(key, values)` pairs, keeping their order.
    ///
    /// ```
    /// use formidable_core::utils::MultiValueDict;
    ///
    /// let d = MultiValueDict::from_pairs([("name", vec!["Ann"]), ("tags[]", vec!["a", "b"])]);
    /// assert_eq!(d.len(), 2);
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, Vec<V>)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(k, vs)| (k.into(), vs.into_iter().map(Into::into).collect()))
            .collect()
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

impl<K: Eq + Hash, V> FromIterator<(K, Vec<V>)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, Vec<V>)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (key, values) in iter {
            data.inner.entry(key).or_default().extend(values);
        }
        data
    }
}

impl<K: Eq + Hash, V> IntoIterator for MultiValueDict<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = map::IntoIter<K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, K: Eq + Hash, V> IntoIterator for &'a MultiValueDict<K, V> {
    type Item = (&'a K, &'a Vec<V>);
    type IntoIter = map::Iter<'a, K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
