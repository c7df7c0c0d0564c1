//! Declarative field-descriptor schemas.
//!
//! A schema is an ordered table of descriptors, one pair per attribute of a target type. A
//! [`JsonSchema`] maps targets to and from nested JSON (or YAML) mappings; a [`ConfigSchema`]
//! maps them to and from INI sections. Descriptors carry the external name, coercion,
//! optionality, repetition and nesting path, plus an accessor closure into the target, so no
//! marshalling code is written by hand.
//!
//! ```
//! use fieldmap::prelude::*;
//!
//! #[derive(Default)]
//! struct Video {
//!     title: Option<String>,
//! }
//!
//! let schema = JsonSchema::builder()
//!     .field(
//!         "title",
//!         SerField::new(|v: &Video| v.title.clone()).name("Title"),
//!         DeserField::new(|v: &mut Video, t: String| v.title = Some(t)).name("Title"),
//!     )
//!     .unwrap()
//!     .build();
//!
//! let video = Video { title: Some("Hello".into()) };
//! let map = schema.to_dict(&video).unwrap();
//! assert_eq!(map["Title"], "Hello");
//!
//! let copy = schema.load_dict(&map).unwrap();
//! assert_eq!(copy.title.as_deref(), Some("Hello"));
//! ```

pub mod coerce;
pub mod config;
mod document;
pub mod error;
pub mod field;
pub mod ini;
pub mod schema;
pub mod utils;

pub use coerce::{Coercion, CoercionError, NameConv};
pub use config::{ConfigSchema, DeserOption, DeserSection, SerOption, SerSection};
pub use error::{ConstructionError, Error, IniError, Result};
pub use field::{DeserField, DeserObjectField, Describe, Nest, SerField, SerObjectField};
pub use ini::IniDocument;
pub use schema::{JsonSchema, JsonSchemaBuilder};

/// Everything needed to declare and use schemas.
pub mod prelude {
    pub use crate::coerce::{Coercion, NameConv};
    pub use crate::config::{ConfigSchema, DeserOption, DeserSection, SerOption, SerSection};
    pub use crate::error::{ConstructionError, Error};
    pub use crate::field::{
        DeserField, DeserObjectField, Describe, Nest, SerField, SerObjectField,
    };
    pub use crate::ini::IniDocument;
    pub use crate::schema::JsonSchema;
}
