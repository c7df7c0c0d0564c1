//! Field descriptors for JSON schemas.
//!
//! A descriptor is an immutable record describing how one attribute of a target type maps to
//! a key in a document mapping: its external name, how that name is derived, the coercion
//! applied to each element, whether it is optional or repeated, and the chain of parent keys
//! it lives under. Each descriptor is built around an accessor closure, so the engine never
//! needs reflection over the target type.

use crate::coerce::{Coercion, NameConv};
use crate::error::{ConstructionError, Error, Result};
use crate::schema::JsonSchema;
use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;

type PlainGetter<T> = Arc<dyn Fn(&T) -> serde_json::Result<Option<Value>> + Send + Sync>;
type PlainSetter<T> = Arc<dyn Fn(&mut T, Value) -> serde_json::Result<()> + Send + Sync>;
type ObjectGetter<T> = Arc<dyn Fn(&T) -> Result<Option<Value>> + Send + Sync>;
type ObjectSetter<T> = Arc<dyn Fn(&mut T, &str, &Value) -> Result<()> + Send + Sync>;

pub(crate) fn coercion_error(attribute: &str, err: impl Display) -> Error {
    Error::Coercion {
        attribute: attribute.to_owned(),
        message: err.to_string(),
    }
}

/// Options shared by every descriptor kind, JSON and config alike.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    pub(crate) name: Option<String>,
    pub(crate) name_conv: NameConv,
    pub(crate) optional: bool,
}

impl FieldOptions {
    /// Fixes the external name, deriving it from the attribute name when none was given.
    pub(crate) fn resolve(&mut self, attribute: &str) -> std::result::Result<(), ConstructionError> {
        let name = match self.name.take() {
            Some(name) => name,
            None => self.name_conv.convert(attribute),
        };
        if name.is_empty() {
            return Err(ConstructionError::EmptyName {
                attribute: attribute.to_owned(),
            });
        }
        self.name = Some(name);
        Ok(())
    }

    /// The external key. Empty until the descriptor has been registered on a schema.
    pub fn external_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Builder methods common to all descriptors.
pub trait Describe: Sized {
    fn options_mut(&mut self) -> &mut FieldOptions;

    /// Sets the external key explicitly instead of deriving it with the name conversion.
    fn name(mut self, name: impl Into<String>) -> Self {
        self.options_mut().name = Some(name.into());
        self
    }

    fn name_conv(mut self, conv: NameConv) -> Self {
        self.options_mut().name_conv = conv;
        self
    }

    /// Missing values are skipped on output and left untouched on input instead of failing.
    fn optional(mut self) -> Self {
        self.options_mut().optional = true;
        self
    }
}

/// Builder method for descriptors that can live under nested parent keys.
pub trait Nest: Sized {
    fn parent_keys_mut(&mut self) -> &mut Vec<String>;

    /// `["snippet", "localized"]` places the field at `{"snippet": {"localized": {name: ..}}}`.
    fn parent_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.parent_keys_mut() = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// Serializes a plain (non-object) attribute.
pub struct SerField<T> {
    options: FieldOptions,
    parent_keys: Vec<String>,
    kind: Coercion,
    repeated: bool,
    default: Option<Value>,
    get: PlainGetter<T>,
}

impl<T: 'static> SerField<T> {
    /// `get` returns `None` when the attribute has no value.
    pub fn new<V, F>(get: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> Option<V> + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            parent_keys: Vec::new(),
            kind: Coercion::identity(),
            repeated: false,
            default: None,
            get: Arc::new(move |target: &T| get(target).map(serde_json::to_value).transpose()),
        }
    }

    pub fn kind(mut self, kind: Coercion) -> Self {
        self.kind = kind;
        self
    }

    /// The value is a list; `kind` applies to each element.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Substituted when the attribute has no value. Only valid on optional fields.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn extract(&self, attribute: &str, target: &T) -> Result<Option<Value>> {
        let value = (self.get)(target)
            .map_err(|e| coercion_error(attribute, e))?
            .filter(|v| !v.is_null());
        let value = match (value, &self.default) {
            (Some(value), _) => value,
            (None, Some(default)) => {
                trace!("attribute `{attribute}` falls back to its default");
                default.clone()
            }
            (None, None) => return Ok(None),
        };
        apply_kind(&self.kind, self.repeated, attribute, value).map(Some)
    }
}

fn apply_kind(kind: &Coercion, repeated: bool, attribute: &str, value: Value) -> Result<Value> {
    if !repeated {
        return kind.apply(value).map_err(|e| coercion_error(attribute, e));
    }
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| kind.apply(item).map_err(|e| coercion_error(attribute, e)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        _ => Err(Error::ExpectedSequence {
            attribute: attribute.to_owned(),
        }),
    }
}

/// Deserializes a plain (non-object) attribute.
pub struct DeserField<T> {
    options: FieldOptions,
    parent_keys: Vec<String>,
    kind: Coercion,
    repeated: bool,
    set: PlainSetter<T>,
}

impl<T: 'static> DeserField<T> {
    /// `set` receives the coerced value converted into `V`.
    pub fn new<V, F>(set: F) -> Self
    where
        V: DeserializeOwned,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            parent_keys: Vec::new(),
            kind: Coercion::identity(),
            repeated: false,
            set: Arc::new(move |target: &mut T, value: Value| {
                set(target, serde_json::from_value(value)?);
                Ok(())
            }),
        }
    }

    pub fn kind(mut self, kind: Coercion) -> Self {
        self.kind = kind;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    fn assign(&self, attribute: &str, target: &mut T, value: &Value) -> Result<()> {
        let value = apply_kind(&self.kind, self.repeated, attribute, value.clone())?;
        (self.set)(target, value).map_err(|e| coercion_error(attribute, e))
    }
}

/// Serializes an attribute holding another object (or a list of them) through a nested schema.
pub struct SerObjectField<T> {
    options: FieldOptions,
    parent_keys: Vec<String>,
    repeated: bool,
    get: ObjectGetter<T>,
}

impl<T: 'static> SerObjectField<T> {
    pub fn new<U, F>(schema: JsonSchema<U>, get: F) -> Self
    where
        U: 'static,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            parent_keys: Vec::new(),
            repeated: false,
            get: Arc::new(move |target: &T| match get(target) {
                Some(nested) => schema.to_dict(nested).map(|map| Some(Value::Object(map))),
                None => Ok(None),
            }),
        }
    }

    /// Each element is serialized through `schema`, preserving order.
    pub fn new_repeated<U, F>(schema: JsonSchema<U>, get: F) -> Self
    where
        U: 'static,
        F: for<'a> Fn(&'a T) -> Option<&'a [U]> + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            parent_keys: Vec::new(),
            repeated: true,
            get: Arc::new(move |target: &T| match get(target) {
                Some(items) => items
                    .iter()
                    .map(|nested| schema.to_dict(nested).map(Value::Object))
                    .collect::<Result<Vec<_>>>()
                    .map(|list| Some(Value::Array(list))),
                None => Ok(None),
            }),
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }
}

/// Deserializes an attribute holding another object (or a list of them) through a nested schema.
///
/// Nested targets are created with `U::default()` and then populated.
pub struct DeserObjectField<T> {
    options: FieldOptions,
    parent_keys: Vec<String>,
    repeated: bool,
    set: ObjectSetter<T>,
}

impl<T: 'static> DeserObjectField<T> {
    pub fn new<U, F>(schema: JsonSchema<U>, set: F) -> Self
    where
        U: Default + 'static,
        F: Fn(&mut T, U) + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            parent_keys: Vec::new(),
            repeated: false,
            set: Arc::new(move |target: &mut T, attribute: &str, value: &Value| {
                let nested = load_nested(&schema, attribute, value)?;
                set(target, nested);
                Ok(())
            }),
        }
    }

    pub fn new_repeated<U, F>(schema: JsonSchema<U>, set: F) -> Self
    where
        U: Default + 'static,
        F: Fn(&mut T, Vec<U>) + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            parent_keys: Vec::new(),
            repeated: true,
            set: Arc::new(move |target: &mut T, attribute: &str, value: &Value| {
                let items = value.as_array().ok_or_else(|| Error::ExpectedSequence {
                    attribute: attribute.to_owned(),
                })?;
                let nested = items
                    .iter()
                    .map(|item| load_nested(&schema, attribute, item))
                    .collect::<Result<Vec<_>>>()?;
                set(target, nested);
                Ok(())
            }),
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }
}

fn load_nested<U: Default + 'static>(
    schema: &JsonSchema<U>,
    attribute: &str,
    value: &Value,
) -> Result<U> {
    let data = value.as_object().ok_or_else(|| Error::ExpectedMapping {
        attribute: attribute.to_owned(),
    })?;
    trace!("recursing into nested object for `{attribute}`");
    schema.load_dict(data)
}

impl<T> Describe for SerField<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<T> Describe for DeserField<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<T> Describe for SerObjectField<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<T> Describe for DeserObjectField<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<T> Nest for SerField<T> {
    fn parent_keys_mut(&mut self) -> &mut Vec<String> {
        &mut self.parent_keys
    }
}

impl<T> Nest for DeserField<T> {
    fn parent_keys_mut(&mut self) -> &mut Vec<String> {
        &mut self.parent_keys
    }
}

impl<T> Nest for SerObjectField<T> {
    fn parent_keys_mut(&mut self) -> &mut Vec<String> {
        &mut self.parent_keys
    }
}

impl<T> Nest for DeserObjectField<T> {
    fn parent_keys_mut(&mut self) -> &mut Vec<String> {
        &mut self.parent_keys
    }
}

/// The serialize half of an attribute.
pub enum SerDescriptor<T> {
    Plain(SerField<T>),
    Object(SerObjectField<T>),
}

impl<T: 'static> SerDescriptor<T> {
    pub fn options(&self) -> &FieldOptions {
        match self {
            SerDescriptor::Plain(field) => &field.options,
            SerDescriptor::Object(field) => &field.options,
        }
    }

    pub fn parent_keys(&self) -> &[String] {
        match self {
            SerDescriptor::Plain(field) => &field.parent_keys,
            SerDescriptor::Object(field) => &field.parent_keys,
        }
    }

    pub(crate) fn resolve(&mut self, attribute: &str) -> std::result::Result<(), ConstructionError> {
        match self {
            SerDescriptor::Plain(field) => {
                if field.default.is_some() && !field.options.optional {
                    return Err(ConstructionError::DefaultOnRequired {
                        attribute: attribute.to_owned(),
                    });
                }
                field.options.resolve(attribute)
            }
            SerDescriptor::Object(field) => field.options.resolve(attribute),
        }
    }

    /// Reads the attribute from `target` and renders it as a document value, `None` if absent.
    pub(crate) fn extract(&self, attribute: &str, target: &T) -> Result<Option<Value>> {
        match self {
            SerDescriptor::Plain(field) => field.extract(attribute, target),
            SerDescriptor::Object(field) => (field.get)(target),
        }
    }
}

/// The deserialize half of an attribute.
pub enum DeserDescriptor<T> {
    Plain(DeserField<T>),
    Object(DeserObjectField<T>),
}

impl<T: 'static> DeserDescriptor<T> {
    pub fn options(&self) -> &FieldOptions {
        match self {
            DeserDescriptor::Plain(field) => &field.options,
            DeserDescriptor::Object(field) => &field.options,
        }
    }

    pub fn parent_keys(&self) -> &[String] {
        match self {
            DeserDescriptor::Plain(field) => &field.parent_keys,
            DeserDescriptor::Object(field) => &field.parent_keys,
        }
    }

    pub(crate) fn resolve(&mut self, attribute: &str) -> std::result::Result<(), ConstructionError> {
        match self {
            DeserDescriptor::Plain(field) => field.options.resolve(attribute),
            DeserDescriptor::Object(field) => field.options.resolve(attribute),
        }
    }

    pub(crate) fn assign(&self, attribute: &str, target: &mut T, value: &Value) -> Result<()> {
        match self {
            DeserDescriptor::Plain(field) => field.assign(attribute, target, value),
            DeserDescriptor::Object(field) => (field.set)(target, attribute, value),
        }
    }
}

impl<T> From<SerField<T>> for SerDescriptor<T> {
    fn from(field: SerField<T>) -> Self {
        SerDescriptor::Plain(field)
    }
}

impl<T> From<SerObjectField<T>> for SerDescriptor<T> {
    fn from(field: SerObjectField<T>) -> Self {
        SerDescriptor::Object(field)
    }
}

impl<T> From<DeserField<T>> for DeserDescriptor<T> {
    fn from(field: DeserField<T>) -> Self {
        DeserDescriptor::Plain(field)
    }
}

impl<T> From<DeserObjectField<T>> for DeserDescriptor<T> {
    fn from(field: DeserObjectField<T>) -> Self {
        DeserDescriptor::Object(field)
    }
}

/// The serialize and deserialize halves registered for one attribute. Either may be absent.
pub struct CompositeField<T> {
    pub(crate) ser: Option<SerDescriptor<T>>,
    pub(crate) deser: Option<DeserDescriptor<T>>,
}

impl<T> CompositeField<T> {
    pub(crate) fn empty() -> Self {
        Self {
            ser: None,
            deser: None,
        }
    }

    pub fn serializer(&self) -> Option<&SerDescriptor<T>> {
        self.ser.as_ref()
    }

    pub fn deserializer(&self) -> Option<&DeserDescriptor<T>> {
        self.deser.as_ref()
    }
}
