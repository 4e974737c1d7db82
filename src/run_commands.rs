//! Normalization of the `run` option into the ordered list of DOS shell
//! commands issued after startup.
//!
//! A `run` value of the form `?name` reads the commands from the page URL's `name`
//! query parameter. That text is a string or array-of-strings literal such as
//! `['LOAD.BAT -x', 'GAME']`; it is filtered against a character allow-list and
//! then parsed with the small literal grammar below. Nothing is ever evaluated.
use crate::launch_options::RunCommands;
use lazy_static::lazy_static;
use regex::Regex;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunCommandError {
    #[error("The required URL parameter \"{0}\" is empty.")]
    MissingParam(String),
    #[error("The contents of the URL parameter \"{0}\" are malformed.")]
    Malformed(String),
    #[error("The contents of the URL parameter \"{name}\" could not be parsed: {source}")]
    Syntax { name: String, source: LiteralError },
    #[error("All run commands must be strings.")]
    NotText,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
}

/// A parsed literal: a string, a number or an array of literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
    List(Vec<Literal>),
}

lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r#"[^A-Za-z0-9,. '"?\[\]/\\\-]"#).unwrap();
}

/// Whether `text` only holds characters that may appear in a URL-supplied run literal.
pub fn is_allowed(text: &str) -> bool {
    !DISALLOWED.is_match(text)
}

/// Turns `run` into the final command list, prefixed with `cd {persist}` when
/// `persist` is non-empty. `query` looks up URL query parameters.
pub fn normalize<F>(
    run: &RunCommands,
    persist: &str,
    query: F,
) -> Result<Vec<String>, RunCommandError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut commands = match run {
        RunCommands::Inline(commands) => commands.clone(),
        RunCommands::UrlParam(name) => from_url_param(name, query)?,
    };
    if !persist.is_empty() {
        commands.insert(0, format!("cd {}", persist));
    }
    Ok(commands)
}

fn from_url_param<F>(name: &str, query: F) -> Result<Vec<String>, RunCommandError>
where
    F: Fn(&str) -> Option<String>,
{
    let text = match query(name) {
        Some(text) if !text.is_empty() => text,
        _ => return Err(RunCommandError::MissingParam(name.to_string())),
    };
    if !is_allowed(&text) {
        return Err(RunCommandError::Malformed(name.to_string()));
    }
    let literal = parse_literal(&text).map_err(|source| RunCommandError::Syntax {
        name: name.to_string(),
        source,
    })?;
    flatten(literal)
}

/// One level of flattening: a string is one command, an array must hold only strings.
pub fn flatten(literal: Literal) -> Result<Vec<String>, RunCommandError> {
    match literal {
        Literal::Text(text) => Ok(vec![text]),
        Literal::List(items) => items
            .into_iter()
            .map(|item| match item {
                Literal::Text(text) => Ok(text),
                _ => Err(RunCommandError::NotText),
            })
            .collect(),
        Literal::Number(_) => Err(RunCommandError::NotText),
    }
}

pub fn parse_literal(text: &str) -> Result<Literal, LiteralError> {
    let mut parser = LiteralParser {
        chars: text.char_indices().peekable(),
    };
    let value = parser.value()?;
    parser.skip_spaces();
    match parser.chars.next() {
        None => Ok(value),
        Some((offset, found)) => Err(LiteralError::Unexpected { found, offset }),
    }
}

struct LiteralParser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl LiteralParser<'_> {
    fn skip_spaces(&mut self) {
        while let Some((_, c)) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.chars.next();
        }
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_spaces();
        match self.chars.peek().copied() {
            None => Err(LiteralError::UnexpectedEnd),
            Some((offset, quote @ ('\'' | '"'))) => {
                self.chars.next();
                self.string(offset, quote).map(Literal::Text)
            }
            Some((_, '[')) => {
                self.chars.next();
                self.list().map(Literal::List)
            }
            Some((_, c)) if c.is_ascii_digit() || c == '.' || c == '-' => self.number(),
            Some((offset, found)) => Err(LiteralError::Unexpected { found, offset }),
        }
    }

    fn string(&mut self, start: usize, quote: char) -> Result<String, LiteralError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(LiteralError::UnterminatedString(start)),
                Some((_, c)) if c == quote => return Ok(text),
                Some((offset, '\\')) => text.push(self.escape(start, offset)?),
                Some((_, c)) => text.push(c),
            }
        }
    }

    /// Decodes one escape after its backslash at `offset`. `\xHH` and `\uHHHH`
    /// give the code point, the single-letter control escapes are mapped and any
    /// other non-digit character stands for itself. Octal digit escapes and
    /// code points that are not a valid `char` are rejected.
    fn escape(&mut self, start: usize, offset: usize) -> Result<char, LiteralError> {
        match self.chars.next() {
            None => Err(LiteralError::UnterminatedString(start)),
            Some((_, 'n')) => Ok('\n'),
            Some((_, 't')) => Ok('\t'),
            Some((_, 'r')) => Ok('\r'),
            Some((_, 'b')) => Ok('\u{8}'),
            Some((_, 'f')) => Ok('\u{c}'),
            Some((_, 'v')) => Ok('\u{b}'),
            Some((_, '0')) if !matches!(self.chars.peek(), Some((_, c)) if c.is_ascii_digit()) => {
                Ok('\0')
            }
            Some((_, 'x')) => self.hex_escape(2, offset),
            Some((_, 'u')) => self.hex_escape(4, offset),
            Some((_, c)) if c.is_ascii_digit() => Err(LiteralError::InvalidEscape(offset)),
            Some((_, escaped)) => Ok(escaped),
        }
    }

    fn hex_escape(&mut self, digits: usize, offset: usize) -> Result<char, LiteralError> {
        let mut code = 0;
        for _ in 0..digits {
            let digit = match self.chars.peek() {
                Some((_, c)) => c.to_digit(16),
                None => None,
            }
            .ok_or(LiteralError::InvalidEscape(offset))?;
            self.chars.next();
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(LiteralError::InvalidEscape(offset))
    }

    // The opening bracket has been consumed.
    fn list(&mut self) -> Result<Vec<Literal>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_spaces();
            if let Some((_, ']')) = self.chars.peek() {
                self.chars.next();
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_spaces();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ']')) => return Ok(items),
                Some((offset, found)) => return Err(LiteralError::Unexpected { found, offset }),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn number(&mut self) -> Result<Literal, LiteralError> {
        let mut digits = String::new();
        let mut start = None;
        while let Some(&(offset, c)) = self.chars.peek() {
            if !(c.is_ascii_digit() || c == '.' || (c == '-' && digits.is_empty())) {
                break;
            }
            start.get_or_insert(offset);
            digits.push(c);
            self.chars.next();
        }
        digits
            .parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| LiteralError::Unexpected {
                found: digits.chars().last().unwrap_or('-'),
                offset: start.unwrap_or(0),
            })
    }
}
