//! Schemas mapping objects to and from INI configuration files.

pub mod field;
pub mod schema;

pub use field::{
    ConfigDeserDescriptor, ConfigField, ConfigSerDescriptor, DeserOption, DeserSection, SerOption,
    SerSection,
};
pub use schema::{ConfigSchema, ConfigSchemaBuilder};
