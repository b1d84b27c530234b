//! Input tokenization and the token queue consumed by argument parsers.
//!
//! Tokens are whitespace-delimited. Single quotes group text verbatim,
//! double quotes group text and honor `\"` and `\\` escapes, and a
//! backslash outside quotes escapes the next character.

use cmdtree_types::error::{CommandError, Result};

/// Raw scanner output.
struct Scan {
    tokens: Vec<String>,
    /// Quote character still open at end of input, if any.
    open_quote: Option<char>,
    /// Input ended on unquoted whitespace (or was empty).
    trailing_space: bool,
}

fn scan(input: &str) -> Scan {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A quoted empty string still produces a token.
    let mut started = false;
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    let mut trailing_space = true;

    while let Some(ch) = chars.next() {
        trailing_space = false;
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else if ch == '\\'
                && let Some(&next) = chars.peek()
                && (next == '"' || next == '\\')
            {
                current.push(next);
                chars.next();
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    started = true;
                },
                '"' => {
                    in_double = true;
                    started = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    started = true;
                },
                c if c.is_whitespace() => {
                    if started || !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                        started = false;
                    }
                    trailing_space = true;
                },
                _ => {
                    current.push(ch);
                    started = true;
                },
            }
        }
    }

    let open_quote = if in_single {
        Some('\'')
    } else if in_double {
        Some('"')
    } else {
        None
    };

    if started || !current.is_empty() || open_quote.is_some() {
        tokens.push(current);
    }

    Scan {
        tokens,
        open_quote,
        trailing_space: trailing_space && open_quote.is_none(),
    }
}

/// Split a complete command line into tokens.
///
/// An unterminated quote is an error.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let scan = scan(input);
    match scan.open_quote {
        Some('\'') => Err(CommandError::Tokenize("unterminated single quote".into())),
        Some(_) => Err(CommandError::Tokenize("unterminated double quote".into())),
        None => Ok(scan.tokens),
    }
}

/// Split a partially typed command line for suggestion purposes.
///
/// Never fails: an open quote is taken as an incomplete final token. When
/// the input is empty or ends in whitespace an empty final token is added,
/// so the last token is always the one being completed.
pub fn tokenize_partial(input: &str) -> Vec<String> {
    let mut scan = scan(input);
    if scan.trailing_space {
        scan.tokens.push(String::new());
    }
    scan.tokens
}

/// Tokens plus a read cursor.
///
/// Parsers consume from the front. The cursor can be saved with
/// [`position`](Self::position) and restored with [`rewind`](Self::rewind),
/// which is how failed or discarded parse attempts leave the queue untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenQueue {
    tokens: Vec<String>,
    cursor: usize,
}

impl TokenQueue {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens, cursor: 0 }
    }

    /// Next unconsumed token.
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.cursor).map(String::as_str)
    }

    /// Consume and return the next token.
    pub fn pop(&mut self) -> Option<String> {
        let token = self.tokens.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(token)
    }

    /// Consume every remaining token.
    pub fn drain(&mut self) -> Vec<String> {
        let rest = self.tokens[self.cursor..].to_vec();
        self.cursor = self.tokens.len();
        rest
    }

    /// Number of tokens consumed so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Restore the cursor to a previously saved position.
    pub fn rewind(&mut self, position: usize) {
        self.cursor = position.min(self.tokens.len());
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unconsumed tokens, in order.
    pub fn remaining_tokens(&self) -> &[String] {
        &self.tokens[self.cursor..]
    }

    /// Unconsumed tokens joined by single spaces.
    pub fn remaining_input(&self) -> String {
        self.remaining_tokens().join(" ")
    }
}

impl From<Vec<String>> for TokenQueue {
    fn from(tokens: Vec<String>) -> Self {
        Self::new(tokens)
    }
}

impl From<&[&str]> for TokenQueue {
    fn from(tokens: &[&str]) -> Self {
        Self::new(tokens.iter().map(|t| t.to_string()).collect())
    }
}
