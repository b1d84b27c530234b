//! Outcome of a single argument parse attempt.

use cmdtree_types::error::ArgumentFailure;

/// Either a parsed value or the reason the parser rejected its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult<T> {
    Success(T),
    Failure(ArgumentFailure),
}

impl<T> ParseResult<T> {
    pub fn success(value: T) -> Self {
        ParseResult::Success(value)
    }

    pub fn failure(reason: ArgumentFailure) -> Self {
        ParseResult::Failure(reason)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Transform the success value, leaving a failure untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<U> {
        match self {
            ParseResult::Success(v) => ParseResult::Success(f(v)),
            ParseResult::Failure(e) => ParseResult::Failure(e),
        }
    }

    /// Chain another fallible step onto a success.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> ParseResult<U>) -> ParseResult<U> {
        match self {
            ParseResult::Success(v) => f(v),
            ParseResult::Failure(e) => ParseResult::Failure(e),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            ParseResult::Success(v) => Some(v),
            ParseResult::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&ArgumentFailure> {
        match self {
            ParseResult::Success(_) => None,
            ParseResult::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, ArgumentFailure> {
        self.into()
    }
}

impl<T> From<ParseResult<T>> for Result<T, ArgumentFailure> {
    fn from(result: ParseResult<T>) -> Self {
        match result {
            ParseResult::Success(v) => Ok(v),
            ParseResult::Failure(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, ArgumentFailure>> for ParseResult<T> {
    fn from(result: Result<T, ArgumentFailure>) -> Self {
        match result {
            Ok(v) => ParseResult::Success(v),
            Err(e) => ParseResult::Failure(e),
        }
    }
}
