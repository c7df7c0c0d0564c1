//! Option- and section-level descriptors for INI configuration schemas.

use crate::coerce::Coercion;
use crate::config::schema::ConfigSchema;
use crate::error::{ConstructionError, Error, Result};
use crate::field::{coercion_error, Describe, FieldOptions};
use crate::ini::IniDocument;
use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

type OptionGetter<T> = Arc<dyn Fn(&T) -> serde_json::Result<Option<Value>> + Send + Sync>;
type OptionSetter<T> = Arc<dyn Fn(&mut T, Value) -> serde_json::Result<()> + Send + Sync>;

/// Serializes one attribute as `key = value` in an INI section.
pub struct SerOption<T> {
    options: FieldOptions,
    section: Option<String>,
    kind: Coercion,
    default: Option<Value>,
    get: OptionGetter<T>,
}

impl<T: 'static> SerOption<T> {
    /// `get` returns `None` when the attribute has no value.
    pub fn new<V, F>(get: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> Option<V> + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            section: None,
            kind: Coercion::identity(),
            default: None,
            get: Arc::new(move |target: &T| get(target).map(serde_json::to_value).transpose()),
        }
    }

    /// The INI section the option is written to. Overridden when the schema is nested.
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn kind(mut self, kind: Coercion) -> Self {
        self.kind = kind;
        self
    }

    /// Substituted when the attribute has no value. Only valid on optional options.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Renders the attribute as option text, `None` when absent.
    fn extract(&self, attribute: &str, target: &T) -> Result<Option<String>> {
        let value = (self.get)(target)
            .map_err(|e| coercion_error(attribute, e))?
            .filter(|v| !v.is_null())
            .or_else(|| self.default.clone());
        let Some(value) = value else {
            return Ok(None);
        };
        let value = self
            .kind
            .apply(value)
            .map_err(|e| coercion_error(attribute, e))?;
        Ok(match value {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
    }
}

impl<T> Clone for SerOption<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            section: self.section.clone(),
            kind: self.kind.clone(),
            default: self.default.clone(),
            get: Arc::clone(&self.get),
        }
    }
}

/// Reads one `key = value` option from an INI section into an attribute.
pub struct DeserOption<T> {
    options: FieldOptions,
    section: Option<String>,
    kind: Coercion,
    set: OptionSetter<T>,
}

impl<T: 'static> DeserOption<T> {
    /// The option text reaches `kind` as a JSON string; the result is converted into `V`.
    pub fn new<V, F>(set: F) -> Self
    where
        V: DeserializeOwned,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            section: None,
            kind: Coercion::identity(),
            set: Arc::new(move |target: &mut T, value: Value| {
                set(target, serde_json::from_value(value)?);
                Ok(())
            }),
        }
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn kind(mut self, kind: Coercion) -> Self {
        self.kind = kind;
        self
    }

    fn assign(&self, attribute: &str, target: &mut T, raw: &str) -> Result<()> {
        let value = self
            .kind
            .apply(Value::String(raw.to_owned()))
            .map_err(|e| coercion_error(attribute, e))?;
        (self.set)(target, value).map_err(|e| coercion_error(attribute, e))
    }
}

impl<T> Clone for DeserOption<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            section: self.section.clone(),
            kind: self.kind.clone(),
            set: Arc::clone(&self.set),
        }
    }
}

/// Writes a nested object's options into the section its schema was stamped with.
pub(crate) trait SectionWriter<T>: Send + Sync {
    fn write(&self, target: &T, document: &mut IniDocument) -> Result<()>;
    fn stamped(&self, section: &str) -> Arc<dyn SectionWriter<T>>;
}

/// Reads a nested object's options from the section its schema was stamped with.
pub(crate) trait SectionReader<T>: Send + Sync {
    fn read(&self, target: &mut T, document: &IniDocument) -> Result<()>;
    fn stamped(&self, section: &str) -> Arc<dyn SectionReader<T>>;
}

struct WriteLink<T, U> {
    schema: ConfigSchema<U>,
    get: Arc<dyn for<'a> Fn(&'a T) -> &'a U + Send + Sync>,
}

impl<T: 'static, U: 'static> SectionWriter<T> for WriteLink<T, U> {
    fn write(&self, target: &T, document: &mut IniDocument) -> Result<()> {
        self.schema.write_into((self.get)(target), document)
    }

    fn stamped(&self, section: &str) -> Arc<dyn SectionWriter<T>> {
        Arc::new(WriteLink {
            schema: self.schema.stamped(section),
            get: Arc::clone(&self.get),
        })
    }
}

struct ReadLink<T, U> {
    schema: ConfigSchema<U>,
    get_mut: Arc<dyn for<'a> Fn(&'a mut T) -> &'a mut U + Send + Sync>,
}

impl<T: 'static, U: 'static> SectionReader<T> for ReadLink<T, U> {
    fn read(&self, target: &mut T, document: &IniDocument) -> Result<()> {
        self.schema.read_from((self.get_mut)(target), document)
    }

    fn stamped(&self, section: &str) -> Arc<dyn SectionReader<T>> {
        Arc::new(ReadLink {
            schema: self.schema.stamped(section),
            get_mut: Arc::clone(&self.get_mut),
        })
    }
}

/// Serializes a nested config object whose every option lands in one section.
///
/// The section name is the descriptor's external name (explicit or derived from the
/// attribute name). It is stamped onto the nested schema when the descriptor is registered.
pub struct SerSection<T> {
    options: FieldOptions,
    link: Arc<dyn SectionWriter<T>>,
}

impl<T: 'static> SerSection<T> {
    pub fn new<U, F>(schema: ConfigSchema<U>, get: F) -> Self
    where
        U: 'static,
        F: for<'a> Fn(&'a T) -> &'a U + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            link: Arc::new(WriteLink {
                schema,
                get: Arc::new(get),
            }),
        }
    }

    pub fn section_name(&self) -> &str {
        self.options.external_name()
    }
}

impl<T> Clone for SerSection<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            link: Arc::clone(&self.link),
        }
    }
}

/// Deserializes a nested config object from one section, in place.
pub struct DeserSection<T> {
    options: FieldOptions,
    link: Arc<dyn SectionReader<T>>,
}

impl<T: 'static> DeserSection<T> {
    pub fn new<U, F>(schema: ConfigSchema<U>, get_mut: F) -> Self
    where
        U: 'static,
        F: for<'a> Fn(&'a mut T) -> &'a mut U + Send + Sync + 'static,
    {
        Self {
            options: FieldOptions::default(),
            link: Arc::new(ReadLink {
                schema,
                get_mut: Arc::new(get_mut),
            }),
        }
    }

    pub fn section_name(&self) -> &str {
        self.options.external_name()
    }
}

impl<T> Clone for DeserSection<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            link: Arc::clone(&self.link),
        }
    }
}

impl<T> Describe for SerOption<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<T> Describe for DeserOption<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<T> Describe for SerSection<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<T> Describe for DeserSection<T> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

fn section_of<'s>(section: &'s Option<String>, attribute: &str) -> Result<&'s str> {
    section.as_deref().ok_or_else(|| {
        Error::Construction(ConstructionError::Unsectioned {
            attribute: attribute.to_owned(),
        })
    })
}

fn restamped(options: &FieldOptions, section_name: &str) -> FieldOptions {
    let mut options = options.clone();
    options.name = Some(section_name.to_owned());
    options
}

/// The serialize half of a config attribute.
pub enum ConfigSerDescriptor<T> {
    Option(SerOption<T>),
    Section(SerSection<T>),
}

impl<T: 'static> ConfigSerDescriptor<T> {
    pub fn options(&self) -> &FieldOptions {
        match self {
            ConfigSerDescriptor::Option(option) => &option.options,
            ConfigSerDescriptor::Section(section) => &section.options,
        }
    }

    pub(crate) fn resolve(&mut self, attribute: &str) -> std::result::Result<(), ConstructionError> {
        match self {
            ConfigSerDescriptor::Option(option) => {
                if option.default.is_some() && !option.options.optional {
                    return Err(ConstructionError::DefaultOnRequired {
                        attribute: attribute.to_owned(),
                    });
                }
                option.options.resolve(attribute)
            }
            ConfigSerDescriptor::Section(section) => {
                section.options.resolve(attribute)?;
                section.link = section.link.stamped(section.options.external_name());
                Ok(())
            }
        }
    }

    pub(crate) fn stamped(&self, section_name: &str) -> Self {
        match self {
            ConfigSerDescriptor::Option(option) => {
                ConfigSerDescriptor::Option(option.clone().section(section_name))
            }
            ConfigSerDescriptor::Section(section) => ConfigSerDescriptor::Section(SerSection {
                options: restamped(&section.options, section_name),
                link: section.link.stamped(section_name),
            }),
        }
    }

    pub(crate) fn write(&self, attribute: &str, target: &T, document: &mut IniDocument) -> Result<()> {
        match self {
            ConfigSerDescriptor::Option(option) => {
                let section = section_of(&option.section, attribute)?;
                match option.extract(attribute, target)? {
                    Some(text) => {
                        document.set(section, option.options.external_name(), &text);
                        Ok(())
                    }
                    None if option.options.optional => {
                        trace!("skipping optional `{attribute}` without a value");
                        Ok(())
                    }
                    None => Err(Error::MissingValue {
                        attribute: attribute.to_owned(),
                    }),
                }
            }
            ConfigSerDescriptor::Section(section) => {
                trace!("writing nested section for `{attribute}`");
                section.link.write(target, document)
            }
        }
    }
}

impl<T> Clone for ConfigSerDescriptor<T> {
    fn clone(&self) -> Self {
        match self {
            ConfigSerDescriptor::Option(option) => ConfigSerDescriptor::Option(option.clone()),
            ConfigSerDescriptor::Section(section) => ConfigSerDescriptor::Section(section.clone()),
        }
    }
}

/// The deserialize half of a config attribute.
pub enum ConfigDeserDescriptor<T> {
    Option(DeserOption<T>),
    Section(DeserSection<T>),
}

impl<T: 'static> ConfigDeserDescriptor<T> {
    pub fn options(&self) -> &FieldOptions {
        match self {
            ConfigDeserDescriptor::Option(option) => &option.options,
            ConfigDeserDescriptor::Section(section) => &section.options,
        }
    }

    pub(crate) fn resolve(&mut self, attribute: &str) -> std::result::Result<(), ConstructionError> {
        match self {
            ConfigDeserDescriptor::Option(option) => option.options.resolve(attribute),
            ConfigDeserDescriptor::Section(section) => {
                section.options.resolve(attribute)?;
                section.link = section.link.stamped(section.options.external_name());
                Ok(())
            }
        }
    }

    pub(crate) fn stamped(&self, section_name: &str) -> Self {
        match self {
            ConfigDeserDescriptor::Option(option) => {
                ConfigDeserDescriptor::Option(option.clone().section(section_name))
            }
            ConfigDeserDescriptor::Section(section) => {
                ConfigDeserDescriptor::Section(DeserSection {
                    options: restamped(&section.options, section_name),
                    link: section.link.stamped(section_name),
                })
            }
        }
    }

    pub(crate) fn read(&self, attribute: &str, target: &mut T, document: &IniDocument) -> Result<()> {
        match self {
            ConfigDeserDescriptor::Option(option) => {
                let section = section_of(&option.section, attribute)?;
                let name = option.options.external_name();
                let optional = option.options.optional;
                if !document.has_section(section) {
                    if optional {
                        trace!("section [{section}] for optional `{attribute}` not present");
                        return Ok(());
                    }
                    return Err(Error::MissingSection {
                        attribute: attribute.to_owned(),
                        section: section.to_owned(),
                    });
                }
                match document.get(section, name) {
                    Some(raw) => option.assign(attribute, target, raw),
                    None if optional => {
                        trace!("optional `{attribute}` not present, left unset");
                        Ok(())
                    }
                    None => Err(Error::MissingOption {
                        attribute: attribute.to_owned(),
                        section: section.to_owned(),
                        option: name.to_owned(),
                    }),
                }
            }
            ConfigDeserDescriptor::Section(section) => {
                if section.options.optional && !document.has_section(section.section_name()) {
                    trace!("optional section [{}] not present", section.section_name());
                    return Ok(());
                }
                section.link.read(target, document)
            }
        }
    }
}

impl<T> Clone for ConfigDeserDescriptor<T> {
    fn clone(&self) -> Self {
        match self {
            ConfigDeserDescriptor::Option(option) => ConfigDeserDescriptor::Option(option.clone()),
            ConfigDeserDescriptor::Section(section) => {
                ConfigDeserDescriptor::Section(section.clone())
            }
        }
    }
}

impl<T> From<SerOption<T>> for ConfigSerDescriptor<T> {
    fn from(option: SerOption<T>) -> Self {
        ConfigSerDescriptor::Option(option)
    }
}

impl<T> From<SerSection<T>> for ConfigSerDescriptor<T> {
    fn from(section: SerSection<T>) -> Self {
        ConfigSerDescriptor::Section(section)
    }
}

impl<T> From<DeserOption<T>> for ConfigDeserDescriptor<T> {
    fn from(option: DeserOption<T>) -> Self {
        ConfigDeserDescriptor::Option(option)
    }
}

impl<T> From<DeserSection<T>> for ConfigDeserDescriptor<T> {
    fn from(section: DeserSection<T>) -> Self {
        ConfigDeserDescriptor::Section(section)
    }
}

/// The serialize and deserialize halves registered for one config attribute.
pub struct ConfigField<T> {
    pub(crate) ser: Option<ConfigSerDescriptor<T>>,
    pub(crate) deser: Option<ConfigDeserDescriptor<T>>,
}

impl<T> ConfigField<T> {
    pub(crate) fn empty() -> Self {
        Self {
            ser: None,
            deser: None,
        }
    }

    pub fn serializer(&self) -> Option<&ConfigSerDescriptor<T>> {
        self.ser.as_ref()
    }

    pub fn deserializer(&self) -> Option<&ConfigDeserDescriptor<T>> {
        self.deser.as_ref()
    }
}

impl<T> Clone for ConfigField<T> {
    fn clone(&self) -> Self {
        Self {
            ser: self.ser.clone(),
            deser: self.deser.clone(),
        }
    }
}
