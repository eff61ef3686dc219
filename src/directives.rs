//! Parser for the `screenshot` / `screenshot_sizes` directive file.
//!
//! The syntax follows nginx configuration blocks:
//!
//! ```text
//! # which built-in ?size= classes requests may pick
//! screenshot small medium;
//!
//! screenshot_sizes {
//!     thumb 160 90;
//!     wide  1280 720;
//! }
//! ```
//!
//! - `screenshot <mask>...;` takes one or more of `all`, `small`, `medium`,
//!   `large`. Repeated directives OR together. Without any, everything is
//!   enabled.
//! - `screenshot_sizes { ... }` takes no arguments; each inner line is
//!   `name width height;`. Repeated blocks append.
//!
//! Any error aborts loading and carries the `file:line` of the offending
//! directive.

use crate::config::{ConfigError, Location};
use crate::presets::{PresetTable, SizeClasses};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Semicolon,
    BlockStart,
    BlockEnd,
}

/// A token and the line it starts on.
type Lexeme = (Token, usize);

/// Load and parse a directive file.
pub fn load_directives(path: &Path) -> Result<PresetTable, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_directives(&path.display().to_string(), &text)
}

/// Parse directive text. `source` names the file in error locations.
pub fn parse_directives(source: &str, text: &str) -> Result<PresetTable, ConfigError> {
    let lexemes = tokenize(source, text)?;
    let mut iter = lexemes.into_iter();

    let mut enabled: Option<SizeClasses> = None;
    let mut sizes: Vec<(Location, Vec<String>)> = Vec::new();
    let mut last_line = 1;

    while let Some((first, line)) = iter.next() {
        last_line = line;
        let location = Location::new(source, line);
        let name = match first {
            Token::Word(w) => w,
            other => return Err(unexpected(&location, &other)),
        };

        let mut args = Vec::new();
        let terminator = loop {
            match iter.next() {
                Some((Token::Word(w), line)) => {
                    last_line = line;
                    args.push(w);
                }
                Some((Token::BlockEnd, line)) => {
                    return Err(unexpected(&Location::new(source, line), &Token::BlockEnd));
                }
                Some((token, _)) => break token,
                None => {
                    return Err(ConfigError::directive(
                        &Location::new(source, last_line),
                        "unexpected end of file, expecting \";\" or \"}\"",
                    ));
                }
            }
        };

        match (name.as_str(), terminator) {
            ("screenshot", Token::Semicolon) => {
                let mask = SizeClasses::from_tokens(&args, &location)?;
                enabled = Some(enabled.unwrap_or(SizeClasses::empty()) | mask);
            }
            ("screenshot", _) => {
                return Err(ConfigError::directive(
                    &location,
                    "directive \"screenshot\" is not terminated by \";\"",
                ));
            }
            ("screenshot_sizes", Token::BlockStart) => {
                if !args.is_empty() {
                    return Err(ConfigError::directive(
                        &location,
                        "invalid number of arguments in \"screenshot_sizes\" directive",
                    ));
                }
                last_line = parse_sizes_block(source, &mut iter, &mut sizes, last_line)?;
            }
            ("screenshot_sizes", _) => {
                return Err(ConfigError::directive(
                    &location,
                    "directive \"screenshot_sizes\" has no opening \"{\"",
                ));
            }
            (other, _) => {
                let message = format!("unknown directive \"{other}\"");
                return Err(ConfigError::directive(&location, message));
            }
        }
    }

    PresetTable::build(sizes, enabled.unwrap_or(SizeClasses::ALL))
}

/// Collect `name width height;` lines up to the closing brace.
///
/// Returns the line of the closing brace.
fn parse_sizes_block<I>(
    source: &str,
    iter: &mut I,
    sizes: &mut Vec<(Location, Vec<String>)>,
    mut last_line: usize,
) -> Result<usize, ConfigError>
where
    I: Iterator<Item = Lexeme>,
{
    let mut current: Option<(Location, Vec<String>)> = None;

    loop {
        let Some((token, line)) = iter.next() else {
            return Err(ConfigError::directive(
                &Location::new(source, last_line),
                "unexpected end of file, expecting \"}\"",
            ));
        };
        last_line = line;

        match token {
            Token::Word(w) => {
                let (_, args) =
                    current.get_or_insert_with(|| (Location::new(source, line), Vec::new()));
                args.push(w);
            }
            Token::Semicolon => match current.take() {
                Some(line) => sizes.push(line),
                None => return Err(unexpected(&Location::new(source, line), &Token::Semicolon)),
            },
            Token::BlockEnd => {
                if let Some((location, _)) = current {
                    return Err(unexpected(&location, &Token::BlockEnd));
                }
                return Ok(last_line);
            }
            Token::BlockStart => {
                return Err(unexpected(&Location::new(source, line), &Token::BlockStart));
            }
        }
    }
}

fn unexpected(location: &Location, token: &Token) -> ConfigError {
    let text = match token {
        Token::Word(w) => w.as_str(),
        Token::Semicolon => ";",
        Token::BlockStart => "{",
        Token::BlockEnd => "}",
    };
    ConfigError::directive(location, format!("unexpected \"{text}\""))
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ';' | '{' | '}' | '#' | '"')
}

fn tokenize(source: &str, text: &str) -> Result<Vec<Lexeme>, ConfigError> {
    let mut lexemes = Vec::new();
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '#' => {
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            ';' => lexemes.push((Token::Semicolon, line)),
            '{' => lexemes.push((Token::BlockStart, line)),
            '}' => lexemes.push((Token::BlockEnd, line)),
            '"' => {
                let start = line;
                let mut word = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            word.push(c);
                        }
                        None => {
                            return Err(ConfigError::directive(
                                &Location::new(source, start),
                                "unterminated quoted string",
                            ));
                        }
                    }
                }
                lexemes.push((Token::Word(word), start));
            }
            c => {
                let mut word = String::from(c);
                while let Some(next) = chars.next_if(|&c| is_word_char(c)) {
                    word.push(next);
                }
                lexemes.push((Token::Word(word), line));
            }
        }
    }

    Ok(lexemes)
}
