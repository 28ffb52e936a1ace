//! Sibling selectors
//!
//! The small selector language used by layout references and child
//! queries: `*`, `#name`, `.class`, a type name, and the positional
//! `prev()`.

/// Parsed selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `*`
    Any,
    /// `#name` - matches the widget `id` property
    Id(String),
    /// `.class`
    Class(String),
    /// Type name, with or without namespace (`Composite`, `tether.Composite`)
    Type(String),
    /// `prev()` - the preceding sibling
    Prev,
}

impl Selector {
    /// Parse selector text, `None` if malformed
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "*" {
            return Some(Self::Any);
        }
        if text == "prev()" {
            return Some(Self::Prev);
        }
        if let Some(name) = text.strip_prefix('#') {
            return is_ident(name).then(|| Self::Id(name.to_string()));
        }
        if let Some(class) = text.strip_prefix('.') {
            return is_ident(class).then(|| Self::Class(class.to_string()));
        }
        let type_ok = text
            .split('.')
            .all(|part| is_ident(part) && !part.starts_with(|c: char| c.is_ascii_digit()));
        type_ok.then(|| Self::Type(text.to_string()))
    }

    /// Whether this selector is positional rather than attribute based
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Prev)
    }

    /// Match attribute selectors against node data
    ///
    /// Positional selectors never match here; they are resolved by the tree.
    pub fn matches(&self, type_name: &str, name: Option<&str>, classes: &[String]) -> bool {
        match self {
            Self::Any => true,
            Self::Id(id) => name == Some(id.as_str()),
            Self::Class(class) => classes.iter().any(|c| c == class),
            Self::Type(ty) => {
                type_name == ty || type_name.rsplit('.').next() == Some(ty.as_str())
            }
            Self::Prev => false,
        }
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
