//! String argument parser.

use cmdtree_types::error::ArgumentFailure;

use super::{Acceptance, ArgumentParser};
use crate::context::CommandContext;
use crate::parse_result::ParseResult;
use crate::tokenizer::TokenQueue;

/// How many tokens a [`StringParser`] consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMode {
    /// Exactly one token (a quoted group counts as one token).
    Single,
    /// Every remaining token, joined by single spaces.
    Greedy,
}

/// Free-form text. Offers no suggestions of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringParser {
    mode: StringMode,
}

impl StringParser {
    pub fn single() -> Self {
        Self {
            mode: StringMode::Single,
        }
    }

    pub fn greedy() -> Self {
        Self {
            mode: StringMode::Greedy,
        }
    }

    pub fn mode(&self) -> StringMode {
        self.mode
    }
}

impl<S> ArgumentParser<S> for StringParser {
    type Output = String;

    fn parse(&self, _ctx: &mut CommandContext<S>, input: &mut TokenQueue) -> ParseResult<String> {
        if input.is_empty() {
            return ParseResult::failure(ArgumentFailure::NoInput);
        }
        match self.mode {
            StringMode::Single => match input.pop() {
                Some(token) => ParseResult::success(token),
                None => ParseResult::failure(ArgumentFailure::NoInput),
            },
            StringMode::Greedy => ParseResult::success(input.drain().join(" ")),
        }
    }

    fn acceptance(&self) -> Acceptance {
        match self.mode {
            StringMode::Single => Acceptance::AnyToken,
            StringMode::Greedy => Acceptance::Greedy,
        }
    }

    fn same_config(&self, other: &Self) -> bool {
        self.mode == other.mode
    }

    fn type_name(&self) -> &'static str {
        match self.mode {
            StringMode::Single => "string",
            StringMode::Greedy => "text",
        }
    }
}
