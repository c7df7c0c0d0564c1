use crate::document::{read_file, write_file};
use crate::error::{IniError, Result};
use crate::ini::parser::Parser;
use std::fmt;
use std::path::Path;

/// Options of the `DEFAULT` section apply to every other section that lacks them.
pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, keeping its original position if it already exists.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => self.entries.push((key.to_owned(), value.to_owned())),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An in-memory INI file: ordered sections of ordered `key = value` options.
///
/// Section and key order is the order of first insertion, both when built in memory and
/// when parsed from text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses INI text. `name` labels the source in diagnostics.
    ///
    /// # Errors
    /// Returns an `IniError` pointing at the offending line.
    pub fn parse(source: &str, name: &str) -> std::result::Result<Self, IniError> {
        Parser::new_with_name(source, name.to_string()).parse_document()
    }

    /// Reads and parses the file at `path` in one go.
    ///
    /// # Errors
    /// An I/O error, or the parse error wrapped in `Error::Ini`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_file(path)?;
        Ok(Self::parse(&text, &path.to_string_lossy())?)
    }

    /// Writes the whole document to `path`, replacing any existing file atomically.
    ///
    /// # Errors
    /// An I/O error.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_file(path, &self.to_string())
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Returns the named section, appending an empty one if it does not exist yet.
    pub fn add_section(&mut self, name: &str) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Looks `key` up in `section`, falling back to the `DEFAULT` section.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)
            .and_then(|s| s.get(key))
            .or_else(|| self.section(DEFAULT_SECTION).and_then(|s| s.get(key)))
    }

    /// Sets `key` in `section`, creating the section if needed.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.add_section(section).set(key, value);
    }

    pub(crate) fn append_line(&mut self, section: &str, key: &str, line: &str) {
        let section = self.add_section(section);
        if let Some((_, value)) = section.entries.iter_mut().find(|(k, _)| k == key) {
            value.push('\n');
            value.push_str(line);
        }
    }
}

impl fmt::Display for IniDocument {
    /// Writes `[section]` headers and `key = value` lines, each section followed by a blank
    /// line. Embedded newlines are written as tab-indented continuation lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{key} = {}", value.replace('\n', "\n\t"))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_layout() {
        let mut doc = IniDocument::new();
        doc.set("server", "host", "localhost");
        doc.set("server", "port", "8080");
        doc.set("auth", "token", "");
        assert_eq!(
            doc.to_string(),
            "[server]\nhost = localhost\nport = 8080\n\n[auth]\ntoken = \n\n"
        );
    }

    #[test]
    fn test_set_keeps_first_position() {
        let mut doc = IniDocument::new();
        doc.set("a", "x", "1");
        doc.set("a", "y", "2");
        doc.set("a", "x", "3");
        let entries: Vec<_> = doc.section("a").unwrap().entries().collect();
        assert_eq!(entries, [("x", "3"), ("y", "2")]);
    }

    #[test]
    fn test_default_section_fallback() {
        let doc = IniDocument::parse("[DEFAULT]\nretries = 3\n\n[net]\nhost = h\n", "t.ini").unwrap();
        assert_eq!(doc.get("net", "retries"), Some("3"));
        assert_eq!(doc.get("net", "host"), Some("h"));
        assert_eq!(doc.get("missing", "retries"), Some("3"));
        assert_eq!(doc.get("net", "absent"), None);
    }

    #[test]
    fn test_multiline_round_trip() {
        let mut doc = IniDocument::new();
        doc.set("video", "description", "line one\nline two");
        let text = doc.to_string();
        assert_eq!(text, "[video]\ndescription = line one\n\tline two\n\n");
        assert_eq!(IniDocument::parse(&text, "t.ini").unwrap(), doc);
    }

    #[test]
    fn test_awkward_multiline_values_round_trip() {
        let mut doc = IniDocument::new();
        doc.set("video", "paragraphs", "para one\n\npara two");
        doc.set("video", "hashtags", "Watch this\n#travel #lake\n; aside");
        doc.set("video", "indented", "list:\n  - one\n\t- two");
        doc.set("video", "after", "plain");
        let text = doc.to_string();
        assert!(text.contains("paragraphs = para one\n\t\n\tpara two\n"));
        assert_eq!(IniDocument::parse(&text, "t.ini").unwrap(), doc);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ini");
        let mut doc = IniDocument::new();
        doc.set("a", "k", "v");
        doc.save(&path).unwrap();
        assert_eq!(IniDocument::load(&path).unwrap(), doc);
    }
}
