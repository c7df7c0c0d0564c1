//! A small INI reader and writer.

pub mod document;
pub mod lexer;
pub mod parser;

pub use document::{IniDocument, Section, DEFAULT_SECTION};
