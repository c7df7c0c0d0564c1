use crate::error::IniError;
use crate::ini::document::IniDocument;
use crate::ini::lexer::{Lexer, Line, LineType};
use crate::utils::get_line_and_column;
use log::{debug, trace};
use miette::{NamedSource, SourceSpan};

/// Builds an [`IniDocument`] from classified lines.
///
/// Indented lines that follow an option continue its value on a new line, even when they
/// look like comments. Blank lines between continuations are part of the value; blank
/// lines after the last one are not. Duplicate sections and duplicate options within a
/// section are rejected.
#[derive(Debug)]
pub struct Parser<'a> {
    name: String,
    lines: Vec<Line>,
    position: usize,
    source_text: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.ini".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let mut lexer = Lexer::new(source_text);
        Self {
            name,
            lines: lexer.lex(),
            position: 0,
            source_text,
        }
    }

    pub fn parse_document(&mut self) -> Result<IniDocument, IniError> {
        let mut document = IniDocument::new();
        let mut current: Option<String> = None;
        // (section, key) of the option a continuation line would extend.
        let mut open_entry: Option<(String, String)> = None;
        // Blank lines seen inside an open entry; kept only if another continuation follows.
        let mut pending_blanks = 0usize;

        while let Some(line) = self.lines.get(self.position).cloned() {
            self.position += 1;

            if let Some((section, key)) = &open_entry {
                if line.ltype == LineType::Blank {
                    pending_blanks += 1;
                    continue;
                }
                if line.indented {
                    for _ in 0..pending_blanks {
                        document.append_line(section, key, "");
                    }
                    pending_blanks = 0;
                    document.append_line(section, key, self.continuation_text(&line));
                    continue;
                }
            }
            open_entry = None;
            pending_blanks = 0;

            let span = self.span(&line);
            match line.ltype {
                LineType::Blank | LineType::Comment(_) => {}
                LineType::Header(name) => {
                    if document.has_section(&name) {
                        return Err(IniError::DuplicateSection {
                            src: self.source(),
                            span,
                            line: self.line_number(span),
                            name,
                        });
                    }
                    trace!("section [{name}]");
                    document.add_section(&name);
                    current = Some(name);
                }
                LineType::UnterminatedHeader => {
                    return Err(IniError::UnterminatedHeader {
                        src: self.source(),
                        span,
                        line: self.line_number(span),
                    });
                }
                LineType::Entry { key, value } => {
                    let Some(section) = &current else {
                        return Err(IniError::MissingSectionHeader {
                            src: self.source(),
                            span,
                            line: self.line_number(span),
                        });
                    };
                    if key.is_empty() {
                        return Err(IniError::EmptyKey {
                            src: self.source(),
                            span,
                            line: self.line_number(span),
                        });
                    }
                    if document
                        .section(section)
                        .is_some_and(|s| s.get(&key).is_some())
                    {
                        return Err(IniError::DuplicateOption {
                            src: self.source(),
                            span,
                            line: self.line_number(span),
                            section: section.clone(),
                            option: key,
                        });
                    }
                    document.set(section, &key, &value);
                    open_entry = Some((section.clone(), key));
                }
                LineType::Bare(_) => {
                    return Err(IniError::MissingDelimiter {
                        src: self.source(),
                        span,
                        line: self.line_number(span),
                    });
                }
            }
        }
        Ok(document)
    }

    /// The text of a continuation line. A single leading tab is the indent the writer adds,
    /// so any whitespace after it belongs to the value; other indents are dropped whole.
    fn continuation_text(&self, line: &Line) -> &'a str {
        let source: &'a str = self.source_text;
        let raw = &source[line.pos_start..line.pos_end];
        match raw.strip_prefix('\t') {
            Some(rest) => rest.trim_end(),
            None => raw.trim(),
        }
    }

    fn source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.source_text.to_string())
    }

    fn line_number(&self, span: SourceSpan) -> usize {
        let (line, _) = get_line_and_column(self.source_text, span.offset());
        debug!("{}:{line}: rejecting line", self.name);
        line
    }

    fn span(&self, line: &Line) -> SourceSpan {
        (line.pos_start, line.pos_end - line.pos_start).into()
    }
}
