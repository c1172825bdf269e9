//! Parameter introspection for tool argument structs
//!
//! [`ToolParameters`] lists the fields of an argument struct; it is normally
//! derived. [`ParamType`] maps a Rust field type to the type name advertised
//! to the model and says whether the field may be left out.

use crate::optional::Optional;
use palaver_core::PropertyType;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// One parameter found on an argument struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterField {
    /// Name the model uses for the parameter
    pub name: String,
    /// Inferred or annotated type, if any
    pub kind: Option<PropertyType>,
    /// Description from the field's annotation or doc comment
    pub description: Option<String>,
    /// Whether the field may be left out
    pub optional: bool,
    /// Key the field is decoded from, when it differs from `name`
    pub key: Option<String>,
}

impl ParameterField {
    /// A required field of the given type
    pub fn new(name: impl Into<String>, kind: impl Into<PropertyType>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind.into()),
            description: None,
            optional: false,
            key: None,
        }
    }

    /// Set the description
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Mark the field as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Decode the field from `key` instead of its advertised name
    pub fn decoded_from(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The key the field is decoded from
    pub fn decode_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

/// A struct whose fields are the parameters of a tool
///
/// Derive it with `#[derive(ToolParameters)]`.
pub trait ToolParameters {
    /// The struct's parameters in declaration order, flattened
    fn parameters() -> Vec<ParameterField>;
}

impl ToolParameters for () {
    fn parameters() -> Vec<ParameterField> {
        Vec::new()
    }
}

/// Type information for a single parameter field
pub trait ParamType {
    /// The advertised type; `None` leaves it to an explicit annotation
    fn param_type() -> Option<PropertyType>;

    /// Whether a field of this type is left out of `required`
    fn is_optional() -> bool {
        false
    }
}

macro_rules! param_type {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl ParamType for $ty {
                fn param_type() -> Option<PropertyType> {
                    Some($kind)
                }
            }
        )+
    };
}

param_type!(PropertyType::Number =>
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
);
param_type!(PropertyType::Bool => bool);
param_type!(PropertyType::String => String, str, char);

impl<T: ParamType + ?Sized> ParamType for &T {
    fn param_type() -> Option<PropertyType> {
        T::param_type()
    }

    fn is_optional() -> bool {
        T::is_optional()
    }
}

impl<T: ParamType + ?Sized> ParamType for Box<T> {
    fn param_type() -> Option<PropertyType> {
        T::param_type()
    }

    fn is_optional() -> bool {
        T::is_optional()
    }
}

impl<T: ParamType> ParamType for Optional<T> {
    fn param_type() -> Option<PropertyType> {
        T::param_type()
    }

    fn is_optional() -> bool {
        true
    }
}

impl<T: ParamType> ParamType for Option<T> {
    fn param_type() -> Option<PropertyType> {
        T::param_type()
    }

    fn is_optional() -> bool {
        true
    }
}

impl<T> ParamType for Vec<T> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Array)
    }
}

impl<T> ParamType for [T] {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Array)
    }
}

impl<T, const N: usize> ParamType for [T; N] {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Array)
    }
}

impl<T> ParamType for VecDeque<T> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Array)
    }
}

impl<T, S> ParamType for HashSet<T, S> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Array)
    }
}

impl<T> ParamType for BTreeSet<T> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Array)
    }
}

impl<K, V, S> ParamType for HashMap<K, V, S> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Object)
    }
}

impl<K, V> ParamType for BTreeMap<K, V> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Object)
    }
}

impl<K, V, S> ParamType for indexmap::IndexMap<K, V, S> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Object)
    }
}

impl ParamType for serde_json::Map<String, Value> {
    fn param_type() -> Option<PropertyType> {
        Some(PropertyType::Object)
    }
}

// Any JSON value; the field needs an explicit type.
impl ParamType for Value {
    fn param_type() -> Option<PropertyType> {
        None
    }
}
