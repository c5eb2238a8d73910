use super::value::FieldValue;

/// Ordered mapping from field name to value
///
/// Iteration follows insertion order; overwriting an existing field keeps
/// its original position. The diff engine relies on this order to emit
/// events deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or overwrite a field, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(existing, _)| existing == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<FieldValue>> FromIterator<(N, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.set(name, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_follows_insertion_order() {
        let map = FieldMap::new()
            .with("name", "Ada")
            .with("gender", "f")
            .with("bio", "mathematician");
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["name", "gender", "bio"]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut map = FieldMap::new().with("a", 1i64).with("b", 2i64);
        let previous = map.set("a", 10i64);
        assert_eq!(previous, Some(FieldValue::Integer(1)));
        let entries: Vec<_> = map.iter().map(|(n, v)| (n.to_string(), v.clone())).collect();
        assert_eq!(entries[0], ("a".to_string(), FieldValue::Integer(10)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut map = FieldMap::new().with("a", 1i64);
        assert_eq!(map.remove("a"), Some(FieldValue::Integer(1)));
        assert!(map.remove("a").is_none());
        assert!(map.is_empty());
    }
}
