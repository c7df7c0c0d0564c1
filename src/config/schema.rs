use crate::config::field::{ConfigDeserDescriptor, ConfigField, ConfigSerDescriptor};
use crate::error::{ConstructionError, Result};
use crate::ini::IniDocument;
use log::{debug, trace};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// An ordered table of option and section descriptors mapping a `T` to and from an INI file.
pub struct ConfigSchema<T> {
    fields: Arc<Vec<(String, ConfigField<T>)>>,
}

impl<T> Clone for ConfigSchema<T> {
    fn clone(&self) -> Self {
        Self {
            fields: Arc::clone(&self.fields),
        }
    }
}

impl<T> fmt::Debug for ConfigSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSchema")
            .field(
                "attributes",
                &self.fields.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Registers descriptors for a [`ConfigSchema`].
pub struct ConfigSchemaBuilder<T> {
    fields: Vec<(String, ConfigField<T>)>,
}

impl<T> fmt::Debug for ConfigSchemaBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSchemaBuilder")
            .field(
                "attributes",
                &self.fields.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: 'static> ConfigSchemaBuilder<T> {
    fn entry(&mut self, attribute: &str) -> &mut ConfigField<T> {
        let index = match self.fields.iter().position(|(name, _)| name == attribute) {
            Some(index) => index,
            None => {
                self.fields.push((attribute.to_owned(), ConfigField::empty()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index].1
    }

    /// Registers the serialize half for `attribute`. Section descriptors stamp their
    /// section name onto the nested schema here.
    ///
    /// # Errors
    /// Returns a `ConstructionError` on a duplicate half, a default on a required option,
    /// or an empty resolved name.
    pub fn serialize(
        mut self,
        attribute: &str,
        descriptor: impl Into<ConfigSerDescriptor<T>>,
    ) -> std::result::Result<Self, ConstructionError> {
        let mut descriptor = descriptor.into();
        descriptor.resolve(attribute)?;
        let entry = self.entry(attribute);
        if entry.ser.is_some() {
            return Err(ConstructionError::DuplicateSerializer {
                attribute: attribute.to_owned(),
            });
        }
        entry.ser = Some(descriptor);
        Ok(self)
    }

    /// Registers the deserialize half for `attribute`.
    ///
    /// # Errors
    /// Returns a `ConstructionError` on a duplicate half or an empty resolved name.
    pub fn deserialize(
        mut self,
        attribute: &str,
        descriptor: impl Into<ConfigDeserDescriptor<T>>,
    ) -> std::result::Result<Self, ConstructionError> {
        let mut descriptor = descriptor.into();
        descriptor.resolve(attribute)?;
        let entry = self.entry(attribute);
        if entry.deser.is_some() {
            return Err(ConstructionError::DuplicateDeserializer {
                attribute: attribute.to_owned(),
            });
        }
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
        ser: impl Into<ConfigSerDescriptor<T>>,
        deser: impl Into<ConfigDeserDescriptor<T>>,
    ) -> std::result::Result<Self, ConstructionError> {
        self.serialize(attribute, ser)?.deserialize(attribute, deser)
    }

    pub fn build(self) -> ConfigSchema<T> {
        ConfigSchema {
            fields: Arc::new(self.fields),
        }
    }
}

impl<T: 'static> ConfigSchema<T> {
    pub fn builder() -> ConfigSchemaBuilder<T> {
        ConfigSchemaBuilder { fields: Vec::new() }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ConfigField<T>)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// A copy of this schema whose every option, at any depth, lives in `section`.
    pub(crate) fn stamped(&self, section: &str) -> ConfigSchema<T> {
        trace!("stamping section [{section}] onto {} attributes", self.fields.len());
        let fields = self
            .fields
            .iter()
            .map(|(attribute, field)| {
                let stamped = ConfigField {
                    ser: field.ser.as_ref().map(|d| d.stamped(section)),
                    deser: field.deser.as_ref().map(|d| d.stamped(section)),
                };
                (attribute.clone(), stamped)
            })
            .collect();
        ConfigSchema {
            fields: Arc::new(fields),
        }
    }

    pub(crate) fn write_into(&self, target: &T, document: &mut IniDocument) -> Result<()> {
        for (attribute, field) in self.fields.iter() {
            if let Some(ser) = &field.ser {
                ser.write(attribute, target, document)?;
            }
        }
        Ok(())
    }

    pub(crate) fn read_from(&self, target: &mut T, document: &IniDocument) -> Result<()> {
        for (attribute, field) in self.fields.iter() {
            if let Some(deser) = &field.deser {
                deser.read(attribute, target, document)?;
            }
        }
        Ok(())
    }

    /// Renders `target` into a fresh in-memory INI document.
    ///
    /// # Errors
    /// `MissingValue` for a required option without a value, `Coercion` when a value
    /// cannot be rendered, `Construction` for an option that never received a section.
    pub fn to_ini(&self, target: &T) -> Result<IniDocument> {
        let mut document = IniDocument::new();
        self.write_into(target, &mut document)?;
        Ok(document)
    }

    /// Renders `target` as INI, writing it to `filename` when one is given and returning the
    /// document otherwise. The whole document is built before the file is touched.
    ///
    /// # Errors
    /// Any error of [`to_ini`](Self::to_ini), or an I/O error while writing.
    pub fn to_config(&self, target: &T, filename: Option<&Path>) -> Result<Option<IniDocument>> {
        let document = self.to_ini(target)?;
        match filename {
            Some(path) => {
                debug!("saving {} attributes to {}", self.fields.len(), path.display());
                document.save(path)?;
                Ok(None)
            }
            None => Ok(Some(document)),
        }
    }

    /// Populates `target` from an in-memory INI document.
    ///
    /// # Errors
    /// `MissingSection`/`MissingOption` for required data that is absent, `Coercion` when an
    /// option does not convert.
    pub fn from_ini<'t>(&self, target: &'t mut T, document: &IniDocument) -> Result<&'t mut T> {
        self.read_from(target, document)?;
        Ok(target)
    }

    /// Reads the INI file at `filename` and populates `target` from it. Nested sections are
    /// read from the same document.
    ///
    /// # Errors
    /// An I/O or parse error, plus any error of [`from_ini`](Self::from_ini).
    pub fn from_config<'t>(&self, target: &'t mut T, filename: &Path) -> Result<&'t mut T> {
        debug!("loading {} attributes from {}", self.fields.len(), filename.display());
        let document = IniDocument::load(filename)?;
        self.from_ini(target, &document)
    }

    /// Parses literal INI text and populates `target` from it.
    ///
    /// # Errors
    /// See [`from_config`](Self::from_config).
    pub fn from_config_str<'t>(&self, target: &'t mut T, raw: &str) -> Result<&'t mut T> {
        let document = IniDocument::parse(raw, "<string>")?;
        self.from_ini(target, &document)
    }

    /// Creates a fresh `T` and populates it from the INI file at `filename`.
    ///
    /// # Errors
    /// See [`from_config`](Self::from_config).
    pub fn load_config(&self, filename: &Path) -> Result<T>
    where
        T: Default,
    {
        let mut target = T::default();
        self.from_config(&mut target, filename)?;
        Ok(target)
    }
}
