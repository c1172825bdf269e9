//! A two-state optional value for tool parameters

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value the model may leave out
///
/// A missing field or JSON `null` decodes to [`Optional::Absent`]; anything
/// else decodes to [`Optional::Present`]. `Absent` encodes as `null`. Fields
/// of this type are never listed as required.
///
/// Fields of this type need no `#[serde(default)]`; a missing field decodes
/// as `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Optional<T> {
    /// No value was supplied
    Absent,
    /// A value was supplied
    Present(T),
}

impl<T> Optional<T> {
    /// Whether no value was supplied
    pub fn is_absent(&self) -> bool {
        matches!(self, Optional::Absent)
    }

    /// Whether a value was supplied
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Borrow the value, if any
    pub fn as_ref(&self) -> Optional<&T> {
        match self {
            Optional::Absent => Optional::Absent,
            Optional::Present(value) => Optional::Present(value),
        }
    }

    /// The value, or a fallback
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Optional::Absent => default,
            Optional::Present(value) => value,
        }
    }

    /// Convert into a std `Option`
    pub fn into_option(self) -> Option<T> {
        self.into()
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Optional::Absent
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Optional::Present(value),
            None => Optional::Absent,
        }
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(value: Optional<T>) -> Self {
        match value {
            Optional::Present(value) => Some(value),
            Optional::Absent => None,
        }
    }
}

impl<T: Serialize> Serialize for Optional<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Optional::Absent => serializer.serialize_none(),
            Optional::Present(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Optional<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Optional::from)
    }
}
