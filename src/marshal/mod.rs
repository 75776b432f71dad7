//! Conversions between Rust data and [`Value`] trees.
//!
//! Structs describe their own layout with [`FieldTag`] descriptors instead
//! of runtime reflection. Tags are plain `const` values: a key override,
//! an always-omit marker, and the omit-if-empty and inline flags.
//!
//! ```
//! use watson::marshal::{FieldTag, FromValue, MarshalResult, ObjectBuilder, ObjectReader, ToValue};
//! use watson::Value;
//!
//! struct Point {
//!     x: i64,
//!     y: i64,
//!     label: Option<String>,
//! }
//!
//! const LABEL: FieldTag = FieldTag::named("name").omit_empty();
//!
//! impl ToValue for Point {
//!     fn to_value(&self) -> Value {
//!         ObjectBuilder::new()
//!             .field("x", FieldTag::PLAIN, &self.x)
//!             .field("y", FieldTag::PLAIN, &self.y)
//!             .field("label", LABEL, &self.label)
//!             .build()
//!     }
//! }
//!
//! impl FromValue for Point {
//!     fn from_value(value: &Value) -> MarshalResult<Self> {
//!         let obj = ObjectReader::new(value)?;
//!         Ok(Point {
//!             x: obj.field("x", FieldTag::PLAIN)?,
//!             y: obj.field("y", FieldTag::PLAIN)?,
//!             label: obj.field("label", LABEL)?,
//!         })
//!     }
//! }
//!
//! let v = Point { x: 1, y: 2, label: None }.to_value();
//! assert_eq!(v.get("name"), None);
//! assert_eq!(Point::from_value(&v).unwrap().y, 2);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::value::{Kind, Object, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarshalError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: Kind, found: Kind },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("value out of range for {target}")]
    OutOfRange { target: &'static str },
    #[error("expected an object, found {0}")]
    NotAnObject(Kind),
    #[error("invalid field tag `{tag}`: unknown option `{option}`")]
    InvalidTag { tag: String, option: String },
    #[error("in field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<MarshalError>,
    },
}

pub type MarshalResult<T> = Result<T, MarshalError>;

fn mismatch(expected: Kind, found: &Value) -> MarshalError {
    MarshalError::TypeMismatch { expected, found: found.kind() }
}

/// How one struct field maps onto an object key.
///
/// Built with `const fn`s so a struct's layout can live in constants:
/// `FieldTag::named("id").omit_empty()`. [`FieldTag::parse`] reads the
/// textual `name,omitempty,inline` form and rejects anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldTag<'a> {
    name: Option<&'a str>,
    skip: bool,
    omit_empty: bool,
    inline: bool,
}

impl FieldTag<'static> {
    /// Key is the lowercased field name, no flags.
    pub const PLAIN: FieldTag<'static> = FieldTag::new();
}

impl<'a> FieldTag<'a> {
    pub const fn new() -> Self {
        FieldTag { name: None, skip: false, omit_empty: false, inline: false }
    }

    /// Store the field under `name` instead of its own name.
    pub const fn named(name: &'a str) -> Self {
        FieldTag { name: Some(name), skip: false, omit_empty: false, inline: false }
    }

    /// Never write the field; reading treats it as missing.
    pub const fn skip() -> Self {
        FieldTag { name: None, skip: true, omit_empty: false, inline: false }
    }

    /// Leave the key out when the value is empty (see [`Value::is_empty`]).
    pub const fn omit_empty(self) -> Self {
        FieldTag { omit_empty: true, ..self }
    }

    /// Merge an object-valued field's entries into the parent.
    pub const fn inline(self) -> Self {
        FieldTag { inline: true, ..self }
    }

    pub fn parse(tag: &'a str) -> MarshalResult<Self> {
        let mut segments = tag.split(',');
        let mut parsed = match segments.next() {
            Some("-") => FieldTag::skip(),
            Some("") | None => FieldTag::new(),
            Some(name) => FieldTag::named(name),
        };
        for option in segments {
            parsed = match option {
                "omitempty" => parsed.omit_empty(),
                "inline" => parsed.inline(),
                other => {
                    return Err(MarshalError::InvalidTag {
                        tag: tag.to_string(),
                        option: other.to_string(),
                    });
                }
            };
        }
        Ok(parsed)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn omits_empty(&self) -> bool {
        self.omit_empty
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// The object key for a field called `field`: the tag's name if it has
    /// one, otherwise the field name in lowercase.
    pub fn key_for(&self, field: &str) -> String {
        match self.name {
            Some(name) => name.to_string(),
            None => field.to_lowercase(),
        }
    }
}

pub trait ToValue {
    fn to_value(&self) -> Value;
}

pub trait FromValue: Sized {
    fn from_value(value: &Value) -> MarshalResult<Self>;

    /// What an absent field decodes to, if absence is allowed at all.
    fn missing() -> Option<Self> {
        None
    }
}

// ---- Objects ----

/// Assembles an object field by field, honoring tags.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    entries: Object,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        ObjectBuilder::default()
    }

    pub fn field<T: ToValue + ?Sized>(mut self, name: &str, tag: FieldTag<'_>, value: &T) -> Self {
        if tag.skip {
            return self;
        }
        let value = value.to_value();
        if tag.omit_empty && value.is_empty() {
            return self;
        }
        match value {
            Value::Object(inner) if tag.inline => self.entries.extend(inner),
            value => {
                self.entries.insert(tag.key_for(name).into_bytes(), value);
            }
        }
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.entries)
    }
}

/// Reads fields back out of an object, honoring tags.
#[derive(Debug, Clone, Copy)]
pub struct ObjectReader<'a> {
    value: &'a Value,
    entries: &'a Object,
}

impl<'a> ObjectReader<'a> {
    pub fn new(value: &'a Value) -> MarshalResult<Self> {
        match value {
            Value::Object(entries) => Ok(ObjectReader { value, entries }),
            other => Err(MarshalError::NotAnObject(other.kind())),
        }
    }

    /// Decode a field. Absent keys are an error unless `T` allows absence
    /// (as `Option` does). Inline fields decode from the whole object.
    pub fn field<T: FromValue>(&self, name: &str, tag: FieldTag<'_>) -> MarshalResult<T> {
        let key = tag.key_for(name);
        if tag.inline {
            return T::from_value(self.value).map_err(|e| in_field(&key, e));
        }
        let found = if tag.skip { None } else { self.entries.get(key.as_bytes()) };
        match found {
            Some(value) => T::from_value(value).map_err(|e| in_field(&key, e)),
            None => T::missing().ok_or(MarshalError::MissingField(key)),
        }
    }

    /// Like [`field`](Self::field), but an absent key yields `T::default()`.
    pub fn field_or_default<T: FromValue + Default>(
        &self,
        name: &str,
        tag: FieldTag<'_>,
    ) -> MarshalResult<T> {
        match self.field(name, tag) {
            Err(MarshalError::MissingField(_)) => Ok(T::default()),
            other => other,
        }
    }
}

fn in_field(field: &str, source: MarshalError) -> MarshalError {
    MarshalError::Field { field: field.to_string(), source: Box::new(source) }
}

// ---- Scalars ----

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.deep_copy()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        Ok(value.deep_copy())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        value.as_bool().ok_or_else(|| mismatch(Kind::Bool, value))
    }
}

macro_rules! integers {
    ($variant:ident, $kind:expr, $wide:ty => $($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Value {
                Value::$variant(*self as $wide)
            }
        }

        impl FromValue for $t {
            fn from_value(value: &Value) -> MarshalResult<Self> {
                let wide = match value {
                    Value::Int(n) => i128::from(*n),
                    Value::Uint(n) => i128::from(*n),
                    other => return Err(mismatch($kind, other)),
                };
                <$t>::try_from(wide).map_err(|_| MarshalError::OutOfRange { target: stringify!($t) })
            }
        }
    )*};
}

integers!(Int, Kind::Int, i64 => i8, i16, i32, i64, isize);
integers!(Uint, Kind::Uint, u64 => u8, u16, u32, u64, usize);

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        value.as_float().ok_or_else(|| mismatch(Kind::Float, value))
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        let x = f64::from_value(value)?;
        // Non-finite values carry over; finite ones must fit.
        if x.is_finite() && x.abs() > f64::from(f32::MAX) {
            return Err(MarshalError::OutOfRange { target: "f32" });
        }
        Ok(x as f32)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::string(self)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::string(self.as_str())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        let bytes = value.as_bytes().ok_or_else(|| mismatch(Kind::String, value))?;
        String::from_utf8(bytes.to_vec()).map_err(|_| MarshalError::InvalidUtf8)
    }
}

// ---- Containers ----

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Nil,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        let items = value.as_array().ok_or_else(|| mismatch(Kind::Array, value))?;
        items.iter().map(T::from_value).collect()
    }
}

fn object_to_value<'a, T, I>(entries: I) -> Value
where
    T: ToValue + 'a,
    I: Iterator<Item = (&'a String, &'a T)>,
{
    Value::Object(entries.map(|(k, v)| (k.clone().into_bytes(), v.to_value())).collect())
}

fn object_entries<T: FromValue>(value: &Value) -> MarshalResult<Vec<(String, T)>> {
    let entries = value.as_object().ok_or_else(|| mismatch(Kind::Object, value))?;
    entries
        .iter()
        .map(|(k, v)| {
            let key = String::from_utf8(k.clone()).map_err(|_| MarshalError::InvalidUtf8)?;
            let decoded = T::from_value(v).map_err(|e| in_field(&key, e))?;
            Ok((key, decoded))
        })
        .collect()
}

impl<T: ToValue> ToValue for BTreeMap<String, T> {
    fn to_value(&self) -> Value {
        object_to_value(self.iter())
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        Ok(object_entries(value)?.into_iter().collect())
    }
}

impl<T: ToValue, S> ToValue for HashMap<String, T, S> {
    fn to_value(&self) -> Value {
        object_to_value(self.iter())
    }
}

impl<T: FromValue, S: BuildHasher + Default> FromValue for HashMap<String, T, S> {
    fn from_value(value: &Value) -> MarshalResult<Self> {
        Ok(object_entries(value)?.into_iter().collect())
    }
}
