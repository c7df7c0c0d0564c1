use crate::document::{read_source, write_file};
use crate::error::{ConstructionError, Error, Result};
use crate::field::{CompositeField, DeserDescriptor, SerDescriptor};
use log::{debug, trace};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// An ordered table of descriptors mapping a `T` to and from a document mapping.
///
/// Built once with [`JsonSchema::builder`] and immutable afterwards; a single schema is meant
/// to be reused across many targets and can be shared between threads. Attributes are
/// processed in registration order on both the serialize and deserialize paths.
pub struct JsonSchema<T> {
    fields: Arc<Vec<(String, CompositeField<T>)>>,
}

impl<T> Clone for JsonSchema<T> {
    fn clone(&self) -> Self {
        Self {
            fields: Arc::clone(&self.fields),
        }
    }
}

impl<T> fmt::Debug for JsonSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field(
                "attributes",
                &self.fields.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Registers descriptors for a [`JsonSchema`]. Each registration is checked immediately.
pub struct JsonSchemaBuilder<T> {
    fields: Vec<(String, CompositeField<T>)>,
}

impl<T> fmt::Debug for JsonSchemaBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaBuilder")
            .field(
                "attributes",
                &self.fields.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: 'static> JsonSchemaBuilder<T> {
    fn entry(&mut self, attribute: &str) -> &mut CompositeField<T> {
        let index = match self.fields.iter().position(|(name, _)| name == attribute) {
            Some(index) => index,
            None => {
                self.fields
                    .push((attribute.to_owned(), CompositeField::empty()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index].1
    }

    /// Registers the serialize half for `attribute`.
    ///
    /// # Errors
    /// Returns a `ConstructionError` if the attribute already has a serialize half, the
    /// descriptor carries a default while required, or its name resolves to nothing.
    pub fn serialize(
        mut self,
        attribute: &str,
        descriptor: impl Into<SerDescriptor<T>>,
    ) -> std::result::Result<Self, ConstructionError> {
        let mut descriptor = descriptor.into();
        descriptor.resolve(attribute)?;
        let entry = self.entry(attribute);
        if entry.ser.is_some() {
            return Err(ConstructionError::DuplicateSerializer {
                attribute: attribute.to_owned(),
            });
        }
        trace!(
            "registered serializer `{attribute}` -> `{}`",
            descriptor.options().external_name()
        );
        entry.ser = Some(descriptor);
        Ok(self)
    }

    /// Registers the deserialize half for `attribute`.
    ///
    /// # Errors
    /// Returns a `ConstructionError` if the attribute already has a deserialize half or its
    /// name resolves to nothing.
    pub fn deserialize(
        mut self,
        attribute: &str,
        descriptor: impl Into<DeserDescriptor<T>>,
    ) -> std::result::Result<Self, ConstructionError> {
        let mut descriptor = descriptor.into();
        descriptor.resolve(attribute)?;
        let entry = self.entry(attribute);
        if entry.deser.is_some() {
            return Err(ConstructionError::DuplicateDeserializer {
                attribute: attribute.to_owned(),
            });
        }
        trace!(
            "registered deserializer `{attribute}` <- `{}`",
            descriptor.options().external_name()
        );
        entry.deser = Some(descriptor);
        Ok(self)
    }

    /// Registers both halves for `attribute`.
    ///
    /// # Errors
    /// See [`serialize`](Self::serialize) and [`deserialize`](Self::deserialize).
    pub fn field(
        self,
        attribute: &str,
        ser: impl Into<SerDescriptor<T>>,
        deser: impl Into<DeserDescriptor<T>>,
    ) -> std::result::Result<Self, ConstructionError> {
        self.serialize(attribute, ser)?.deserialize(attribute, deser)
    }

    pub fn build(self) -> JsonSchema<T> {
        JsonSchema {
            fields: Arc::new(self.fields),
        }
    }
}

impl<T: 'static> JsonSchema<T> {
    pub fn builder() -> JsonSchemaBuilder<T> {
        JsonSchemaBuilder { fields: Vec::new() }
    }

    /// Attribute names with the descriptors registered for them, in definition order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &CompositeField<T>)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Converts `target` into a document mapping.
    ///
    /// # Errors
    /// `MissingValue` when a required attribute has no value, `StructureConflict` when a
    /// parent key is occupied by a non-mapping, `Coercion`/`ExpectedSequence` when a value
    /// cannot be rendered.
    pub fn to_dict(&self, target: &T) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for (attribute, field) in self.fields.iter() {
            let Some(ser) = &field.ser else {
                continue;
            };
            let value = match ser.extract(attribute, target)? {
                Some(value) => value,
                None if ser.options().is_optional() => {
                    trace!("skipping optional `{attribute}` without a value");
                    continue;
                }
                None => {
                    return Err(Error::MissingValue {
                        attribute: attribute.clone(),
                    })
                }
            };
            let slot = descend(&mut out, ser.parent_keys(), attribute)?;
            slot.insert(ser.options().external_name().to_owned(), value);
        }
        Ok(out)
    }

    /// Converts `target` into pretty-printed JSON text.
    ///
    /// # Errors
    /// Any error of [`to_dict`](Self::to_dict), or a JSON encoding error.
    pub fn to_json_string(&self, target: &T) -> Result<String> {
        let map = self.to_dict(target)?;
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }

    /// Converts `target` into JSON text, writing it to `filename` when one is given
    /// and returning it otherwise. The whole text is built before the file is touched.
    ///
    /// # Errors
    /// Any error of [`to_dict`](Self::to_dict), or an I/O error while writing.
    pub fn to_json(&self, target: &T, filename: Option<&Path>) -> Result<Option<String>> {
        let text = self.to_json_string(target)?;
        match filename {
            Some(path) => {
                write_file(path, &text)?;
                Ok(None)
            }
            None => Ok(Some(text)),
        }
    }

    /// Like [`to_json`](Self::to_json) but emits YAML.
    ///
    /// # Errors
    /// Any error of [`to_dict`](Self::to_dict), a YAML encoding error, or an I/O error.
    pub fn to_yaml(&self, target: &T, filename: Option<&Path>) -> Result<Option<String>> {
        let map = self.to_dict(target)?;
        let text = serde_yaml::to_string(&Value::Object(map))?;
        match filename {
            Some(path) => {
                write_file(path, &text)?;
                Ok(None)
            }
            None => Ok(Some(text)),
        }
    }

    /// Populates `target` from a document mapping.
    ///
    /// Attributes whose data is missing are left untouched when optional. JSON `null`
    /// counts as missing.
    ///
    /// # Errors
    /// `MissingKey`/`MissingField` for required data that is absent, `StructureConflict`
    /// when a parent key holds a non-mapping, `Coercion` when a value does not convert.
    pub fn from_dict<'t>(&self, target: &'t mut T, data: &Map<String, Value>) -> Result<&'t mut T> {
        for (attribute, field) in self.fields.iter() {
            let Some(deser) = &field.deser else {
                continue;
            };
            let optional = deser.options().is_optional();
            let Some(located) = locate(data, deser.parent_keys(), attribute, optional)? else {
                continue;
            };
            let name = deser.options().external_name();
            match located.get(name) {
                Some(value) if !value.is_null() => deser.assign(attribute, target, value)?,
                _ if optional => trace!("optional `{attribute}` not present, left unset"),
                _ => {
                    return Err(Error::MissingField {
                        attribute: attribute.clone(),
                        name: name.to_owned(),
                    })
                }
            }
        }
        Ok(target)
    }

    /// Creates a fresh `T` and populates it from `data`.
    ///
    /// # Errors
    /// See [`from_dict`](Self::from_dict).
    pub fn load_dict(&self, data: &Map<String, Value>) -> Result<T>
    where
        T: Default,
    {
        let mut target = T::default();
        self.from_dict(&mut target, data)?;
        Ok(target)
    }

    /// Populates `target` from JSON read from `filename` or given as `raw`.
    ///
    /// # Errors
    /// `Argument` unless exactly one source is given, `RootNotMapping` when the document is
    /// not an object, plus any error of [`from_dict`](Self::from_dict).
    pub fn from_json<'t>(
        &self,
        target: &'t mut T,
        filename: Option<&Path>,
        raw: Option<&str>,
    ) -> Result<&'t mut T> {
        let text = read_source(filename, raw)?;
        let value: Value = serde_json::from_str(&text)?;
        debug!("loading {} attributes from JSON", self.fields.len());
        self.from_value(target, &value)
    }

    /// Shorthand for [`from_json`](Self::from_json) with literal text.
    ///
    /// # Errors
    /// See [`from_json`](Self::from_json).
    pub fn from_json_str<'t>(&self, target: &'t mut T, raw: &str) -> Result<&'t mut T> {
        self.from_json(target, None, Some(raw))
    }

    /// Like [`from_json`](Self::from_json) but parses YAML.
    ///
    /// # Errors
    /// See [`from_json`](Self::from_json).
    pub fn from_yaml<'t>(
        &self,
        target: &'t mut T,
        filename: Option<&Path>,
        raw: Option<&str>,
    ) -> Result<&'t mut T> {
        let text = read_source(filename, raw)?;
        let value: Value = serde_yaml::from_str(&text)?;
        self.from_value(target, &value)
    }

    fn from_value<'t>(&self, target: &'t mut T, value: &Value) -> Result<&'t mut T> {
        match value {
            Value::Object(map) => self.from_dict(target, map),
            _ => Err(Error::RootNotMapping),
        }
    }
}

/// Walks `keys` from `map`, creating empty mappings along the way.
fn descend<'m>(
    mut map: &'m mut Map<String, Value>,
    keys: &[String],
    attribute: &str,
) -> Result<&'m mut Map<String, Value>> {
    for key in keys {
        map = map
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| Error::StructureConflict {
                attribute: attribute.to_owned(),
                key: key.clone(),
            })?;
    }
    Ok(map)
}

/// Walks `keys` from `data`. `Ok(None)` means a key is missing on an optional attribute.
fn locate<'d>(
    mut data: &'d Map<String, Value>,
    keys: &[String],
    attribute: &str,
    optional: bool,
) -> Result<Option<&'d Map<String, Value>>> {
    for key in keys {
        data = match data.get(key) {
            Some(Value::Object(inner)) => inner,
            Some(Value::Null) | None if optional => {
                trace!("parent key `{key}` of optional `{attribute}` not present");
                return Ok(None);
            }
            Some(Value::Null) | None => {
                return Err(Error::MissingKey {
                    attribute: attribute.to_owned(),
                    key: key.clone(),
                })
            }
            Some(_) => {
                return Err(Error::StructureConflict {
                    attribute: attribute.to_owned(),
                    key: key.clone(),
                })
            }
        };
    }
    Ok(Some(data))
}
