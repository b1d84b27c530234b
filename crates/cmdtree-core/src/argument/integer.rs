//! Integer argument parser.

use cmdtree_types::error::ArgumentFailure;

use super::ArgumentParser;
use crate::context::CommandContext;
use crate::parse_result::ParseResult;
use crate::tokenizer::TokenQueue;

/// Largest bounded range whose values are offered as suggestions.
const MAX_ENUMERATED: i64 = 16;

/// Signed 64-bit integer, optionally restricted to an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerParser {
    min: i64,
    max: i64,
}

impl IntegerParser {
    pub fn new() -> Self {
        Self {
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    /// Restrict to `min..=max`.
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min = min.min(max);
        self.max = max.max(min);
        self
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    fn is_bounded(&self) -> bool {
        self.min != i64::MIN || self.max != i64::MAX
    }
}

impl Default for IntegerParser {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ArgumentParser<S> for IntegerParser {
    type Output = i64;

    fn parse(&self, _ctx: &mut CommandContext<S>, input: &mut TokenQueue) -> ParseResult<i64> {
        let Some(token) = input.peek() else {
            return ParseResult::failure(ArgumentFailure::NoInput);
        };
        let value = match token.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                return ParseResult::failure(ArgumentFailure::InvalidFormat {
                    input: token.to_string(),
                    expected: "integer",
                });
            },
        };
        if value < self.min || value > self.max {
            return ParseResult::failure(ArgumentFailure::OutOfRange {
                input: token.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        input.pop();
        ParseResult::success(value)
    }

    /// Enumerates small bounded ranges; unconstrained integers get nothing.
    fn suggestions(&self, _ctx: &CommandContext<S>, input: &str) -> Vec<String> {
        if !self.is_bounded() || self.max.saturating_sub(self.min) >= MAX_ENUMERATED {
            return Vec::new();
        }
        (self.min..=self.max)
            .map(|v| v.to_string())
            .filter(|v| v.starts_with(input))
            .collect()
    }

    fn same_config(&self, other: &Self) -> bool {
        self == other
    }

    fn type_name(&self) -> &'static str {
        "integer"
    }
}
