//! Request parameter encoding
//!
//! Parameters are an ordered list of string pairs. List-valued parameters
//! are flattened into 1-based indexed keys (`Prefix.N.Field`) in the order
//! the caller supplied them.

/// Ordered request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value in place
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builder form of [`Params::push`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Set `key` only when `value` is present
    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value.to_string());
        }
        self
    }

    /// Flatten a list of records into `prefix.N.field` keys
    ///
    /// ```
    /// use courier_core::Params;
    ///
    /// let mut params = Params::new();
    /// params.push_entries("Entry", [[("Id", "1"), ("Body", "a")], [("Id", "2"), ("Body", "b")]]);
    ///
    /// assert_eq!(params.get("Entry.1.Body"), Some("a"));
    /// assert_eq!(params.get("Entry.2.Id"), Some("2"));
    /// ```
    pub fn push_entries<I, E, K, V>(&mut self, prefix: &str, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = E>,
        E: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (index, entry) in entries.into_iter().enumerate() {
            for (field, value) in entry {
                self.push(format!("{prefix}.{}.{}", index + 1, field.as_ref()), value);
            }
        }
        self
    }

    /// Encode a name/value map as `Attribute.N.Name` / `Attribute.N.Value`
    pub fn push_attributes<I, K, V>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.push_entries(
            "Attribute",
            attributes
                .into_iter()
                .map(|(name, value)| [("Name", name.into()), ("Value", value.into())]),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(existing, _)| existing == key).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
