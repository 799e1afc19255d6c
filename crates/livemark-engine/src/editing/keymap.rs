use std::collections::BTreeMap;

use crate::error::Result;

use super::actions::Action;

/// Key to [`Action`] bindings, consulted while the platform modifier
/// (ctrl, or cmd on macOS) is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: BTreeMap<String, Action>,
}

const DEFAULT_BINDINGS: [(&str, &str); 18] = [
    (".", "blockquote"),
    ("1", "h1"),
    ("2", "h2"),
    ("3", "h3"),
    ("4", "h4"),
    ("p", "p"),
    ("u", "ul"),
    ("o", "ol"),
    ("e", "pre"),
    ("b", "strong"),
    ("c", "code"),
    ("d", "del"),
    ("i", "em"),
    ("l", "a"),
    ("ArrowUp", "sup"),
    ("ArrowDown", "sub"),
    ("/", "markdown"),
    ("a", "all"),
];

impl Default for Keymap {
    fn default() -> Self {
        let bindings = DEFAULT_BINDINGS
            .iter()
            .filter_map(|(key, name)| Some((key.to_string(), name.parse().ok()?)))
            .collect();
        Self { bindings }
    }
}

impl Keymap {
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// The default keymap with `overrides` (key, action name) applied on top.
    pub fn with_overrides<K, V>(overrides: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut keymap = Self::default();
        for (key, name) in overrides {
            keymap.bind(key, name.as_ref().parse()?);
        }
        Ok(keymap)
    }

    pub fn bind(&mut self, key: impl Into<String>, action: Action) {
        self.bindings.insert(key.into(), action);
    }

    pub fn lookup(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Action)> {
        self.bindings.iter().map(|(k, a)| (k.as_str(), *a))
    }
}
