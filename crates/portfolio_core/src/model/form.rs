//! Raw form payload as delivered by a submit/blur event.

use std::collections::BTreeMap;

const CHECKED_VALUES: &[&str] = &["on", "true", "1", "yes", "si", "sí"];

/// Field name -> raw value map captured from one form.
///
/// Values are stored exactly as typed; trimming and normalization happen when
/// the payload is converted into a `ContactoDraft`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns whether a checkbox-like field carries a truthy value.
    pub fn is_checked(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| {
            let normalized = value.trim().to_lowercase();
            CHECKED_VALUES.contains(&normalized.as_str())
        })
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut form = Self::new();
        for (name, value) in iter {
            form.set(name, value);
        }
        form
    }
}
