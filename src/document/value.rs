//! The wire `Value` tagged union and its numeric type tags.

use serde::{Deserialize, Serialize};

use crate::identity::Handle;

/// Numeric tags used on the wire. The assignment is inherited unchanged
/// from the interpreter this schema was distilled from — note the gap at
/// `2`, which is intentional: renumbering would break every document
/// written before this crate existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ValueType {
    /// The nil/null value.
    Nil = 0,
    /// A boolean.
    Bool = 1,
    /// A double-precision number.
    Number = 3,
    /// An immutable string.
    String = 4,
    /// A table, by handle.
    Table = 5,
    /// A closure (native or interpreted), by handle.
    Function = 6,
    /// Opaque host user data, by handle.
    UserData = 7,
    /// A cooperative thread/coroutine, by handle.
    Thread = 8,
}

impl ValueType {
    /// Recovers a `ValueType` from its wire tag, or `None` if the tag is
    /// not one of the recognized values (the caller decides whether that
    /// is the legacy-safety-valve Nil coercion or a hard error).
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Self::Nil),
            1 => Some(Self::Bool),
            3 => Some(Self::Number),
            4 => Some(Self::String),
            5 => Some(Self::Table),
            6 => Some(Self::Function),
            7 => Some(Self::UserData),
            8 => Some(Self::Thread),
            _ => None,
        }
    }

    /// True if values of this type carry a `Handle` rather than a scalar.
    pub fn is_pointer_kind(self) -> bool {
        matches!(
            self,
            Self::Table | Self::Function | Self::UserData | Self::Thread
        )
    }
}

/// A polymorphic VM value as it appears on the wire: a type tag plus
/// whichever payload field that tag implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    /// The `ValueType` discriminant.
    #[serde(rename = "Type")]
    pub type_: i32,
    /// Populated when `type_` is a pointer kind (Table/Function/UserData/Thread).
    #[serde(rename = "Ptr", skip_serializing_if = "Option::is_none", default)]
    pub ptr: Option<Handle>,
    /// Populated when `type_` is String.
    #[serde(rename = "String", skip_serializing_if = "Option::is_none", default)]
    pub string: Option<String>,
    /// Populated when `type_` is Bool.
    #[serde(rename = "Bool", default)]
    pub bool: bool,
    /// Populated when `type_` is Number.
    #[serde(rename = "Number", default)]
    pub number: f64,
}

impl Value {
    /// The nil value.
    pub fn nil() -> Self {
        Self {
            type_: ValueType::Nil as i32,
            ptr: None,
            string: None,
            bool: false,
            number: 0.0,
        }
    }

    /// A boolean value.
    pub fn from_bool(b: bool) -> Self {
        Self {
            type_: ValueType::Bool as i32,
            bool: b,
            ..Self::nil()
        }
    }

    /// A numeric value.
    pub fn from_number(n: f64) -> Self {
        Self {
            type_: ValueType::Number as i32,
            number: n,
            ..Self::nil()
        }
    }

    /// A string value.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self {
            type_: ValueType::String as i32,
            string: Some(s.into()),
            ..Self::nil()
        }
    }

    /// A handle-carrying value of the given pointer kind.
    pub fn pointer(kind: ValueType, handle: Handle) -> Self {
        debug_assert!(kind.is_pointer_kind());
        Self {
            type_: kind as i32,
            ptr: Some(handle),
            ..Self::nil()
        }
    }

    /// Returns the handle carried by a pointer-kind value, if any.
    pub fn as_handle(&self) -> Option<&Handle> {
        self.ptr.as_ref()
    }

    /// True if this value's tag is `Nil`.
    pub fn is_nil(&self) -> bool {
        self.type_ == ValueType::Nil as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_values_round_trip_through_json() {
        let v = Value::pointer(ValueType::Table, Handle::from("t-1"));
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"Ptr\":\"t-1\""));
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn scalar_values_omit_ptr_field() {
        let v = Value::from_number(3.5);
        let json = serde_json::to_string(&v).unwrap();
        assert!(!json.contains("\"Ptr\""));
    }

    #[test]
    fn type_gap_at_two_is_preserved() {
        assert_eq!(ValueType::from_tag(2), None);
        assert_eq!(ValueType::Number as i32, 3);
    }
}
