/// The kinds of lines an INI file is made of.
#[derive(Debug, PartialEq, Clone)]
pub enum LineType {
    /// An empty or whitespace-only line.
    Blank,
    /// A line starting with `#` or `;`. Holds the text after the marker, trimmed.
    Comment(String),
    /// A `[section]` header. Holds the trimmed section name.
    Header(String),
    /// A line starting with `[` that never closes.
    UnterminatedHeader,
    /// `key = value` or `key: value`, split on the first delimiter. Both halves trimmed.
    Entry { key: String, value: String },
    /// Anything else. Holds the trimmed text.
    Bare(String),
}

/// A classified line with its byte range in the source, excluding the line terminator.
#[derive(Debug, Clone)]
pub struct Line {
    pub ltype: LineType,
    /// The line starts with whitespace; used for multi-line values.
    pub indented: bool,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Line {
    pub fn new(ltype: LineType, indented: bool, pos_start: usize, pos_end: usize) -> Line {
        Line {
            ltype,
            indented,
            pos_start,
            pos_end,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    pub fn lex(&mut self) -> Vec<Line> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line() {
            lines.push(line);
        }
        lines
    }

    pub fn next_line(&mut self) -> Option<Line> {
        if self.position >= self.input.len() {
            return None;
        }
        let start = self.position;
        let rest = &self.input[start..];
        let (text, consumed) = match rest.find('\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        self.position += consumed;

        let text = text.strip_suffix('\r').unwrap_or(text);
        let indented = text.starts_with(|c: char| c.is_whitespace());
        Some(Line::new(
            classify(text.trim()),
            indented,
            start,
            start + text.len(),
        ))
    }
}

fn classify(text: &str) -> LineType {
    if text.is_empty() {
        return LineType::Blank;
    }
    if let Some(comment) = text.strip_prefix('#').or_else(|| text.strip_prefix(';')) {
        return LineType::Comment(comment.trim().to_string());
    }
    if let Some(header) = text.strip_prefix('[') {
        return match header.strip_suffix(']') {
            Some(name) => LineType::Header(name.trim().to_string()),
            None => LineType::UnterminatedHeader,
        };
    }
    match text.find(|c: char| c == '=' || c == ':') {
        Some(i) => LineType::Entry {
            key: text[..i].trim().to_string(),
            value: text[i + 1..].trim().to_string(),
        },
        None => LineType::Bare(text.to_string()),
    }
}
