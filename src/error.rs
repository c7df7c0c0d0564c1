use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the schema engines can report. Nothing is retried internally.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Missing value for required attribute `{attribute}`")]
    #[diagnostic(
        code(schema::missing_value),
        help("Populate the attribute, mark the field optional, or give it a default.")
    )]
    MissingValue { attribute: String },

    #[error("Key `{key}` already holds a non-mapping value, cannot nest `{attribute}` under it")]
    #[diagnostic(
        code(schema::structure_conflict),
        help("Two fields disagree about the shape of the document at this key.")
    )]
    StructureConflict { attribute: String, key: String },

    #[error("Parent key `{key}` for attribute `{attribute}` is missing")]
    #[diagnostic(code(schema::missing_key))]
    MissingKey { attribute: String, key: String },

    #[error("Field `{name}` for attribute `{attribute}` is missing")]
    #[diagnostic(code(schema::missing_field))]
    MissingField { attribute: String, name: String },

    #[error("Section `{section}` required by attribute `{attribute}` is missing")]
    #[diagnostic(code(config::missing_section))]
    MissingSection { attribute: String, section: String },

    #[error("Option `{option}` in section `{section}` required by attribute `{attribute}` is missing")]
    #[diagnostic(code(config::missing_option))]
    MissingOption {
        attribute: String,
        section: String,
        option: String,
    },

    #[error("Invalid arguments: {0}")]
    #[diagnostic(
        code(schema::argument),
        help("Pass exactly one of `filename` or `raw`.")
    )]
    Argument(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Construction(#[from] ConstructionError),

    #[error("Could not coerce attribute `{attribute}`: {message}")]
    #[diagnostic(code(schema::coercion))]
    Coercion { attribute: String, message: String },

    #[error("Attribute `{attribute}` is repeated but its value is not a list")]
    #[diagnostic(code(schema::expected_sequence))]
    ExpectedSequence { attribute: String },

    #[error("Attribute `{attribute}` is an object field but its value is not a mapping")]
    #[diagnostic(code(schema::expected_mapping))]
    ExpectedMapping { attribute: String },

    #[error("Document root is not a mapping")]
    #[diagnostic(code(schema::root_not_mapping))]
    RootNotMapping,

    #[error("JSON error: {0}")]
    #[diagnostic(code(schema::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    #[diagnostic(code(schema::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error on {path:?}: {source}")]
    #[diagnostic(code(schema::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ini(#[from] IniError),
}

/// Descriptor invariants broken while a schema is being defined.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Attribute `{attribute}` has a default but is not optional")]
    #[diagnostic(
        code(construction::default_on_required),
        help("A default is only meaningful on an optional field; call `.optional()`.")
    )]
    DefaultOnRequired { attribute: String },

    #[error("Attribute `{attribute}` already has a serialize descriptor")]
    #[diagnostic(code(construction::duplicate_serializer))]
    DuplicateSerializer { attribute: String },

    #[error("Attribute `{attribute}` already has a deserialize descriptor")]
    #[diagnostic(code(construction::duplicate_deserializer))]
    DuplicateDeserializer { attribute: String },

    #[error("Attribute `{attribute}` resolves to an empty external name")]
    #[diagnostic(code(construction::empty_name))]
    EmptyName { attribute: String },

    #[error("Option for attribute `{attribute}` has no section")]
    #[diagnostic(
        code(construction::unsectioned),
        help("Give the option a `.section(..)` or register its schema under a section field.")
    )]
    Unsectioned { attribute: String },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum IniError {
    #[error("Option outside of any section at line {line}")]
    #[diagnostic(
        code(ini::missing_section_header),
        help("Every option must follow a `[section]` header.")
    )]
    MissingSectionHeader {
        #[source_code]
        src: NamedSource<String>,
        #[label("this option has no section")]
        span: SourceSpan,
        line: usize,
    },

    #[error("Unterminated section header at line {line}")]
    #[diagnostic(code(ini::unterminated_header), help("Close the header with `]`."))]
    UnterminatedHeader {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected `]` at the end of this line")]
        span: SourceSpan,
        line: usize,
    },

    #[error("Line {line} is neither a header, an option nor a comment")]
    #[diagnostic(
        code(ini::missing_delimiter),
        help("Options are written as `key = value` or `key: value`.")
    )]
    MissingDelimiter {
        #[source_code]
        src: NamedSource<String>,
        #[label("no `=` or `:` on this line")]
        span: SourceSpan,
        line: usize,
    },

    #[error("Option at line {line} has an empty key")]
    #[diagnostic(code(ini::empty_key))]
    EmptyKey {
        #[source_code]
        src: NamedSource<String>,
        #[label("key expected before the delimiter")]
        span: SourceSpan,
        line: usize,
    },

    #[error("Section `{name}` is declared twice, again at line {line}")]
    #[diagnostic(code(ini::duplicate_section))]
    DuplicateSection {
        #[source_code]
        src: NamedSource<String>,
        #[label("second declaration here")]
        span: SourceSpan,
        line: usize,
        name: String,
    },

    #[error("Option `{option}` is set twice in section `{section}`, again at line {line}")]
    #[diagnostic(code(ini::duplicate_option))]
    DuplicateOption {
        #[source_code]
        src: NamedSource<String>,
        #[label("second assignment here")]
        span: SourceSpan,
        line: usize,
        section: String,
        option: String,
    },
}
