//! Fixed keyword components.

/// A keyword matched by exact, case-sensitive comparison against its name
/// or any of its aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    name: String,
    aliases: Vec<String>,
}

impl Literal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, A>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        for alias in aliases {
            self.add_alias(alias.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Name followed by aliases.
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn matches(&self, token: &str) -> bool {
        self.spellings().any(|s| s == token)
    }

    /// Spellings that complete `partial`.
    pub fn suggestions(&self, partial: &str) -> Vec<String> {
        self.spellings()
            .filter(|s| s.starts_with(partial))
            .map(str::to_string)
            .collect()
    }

    /// Whether any spelling of `other` is also a spelling of `self`.
    pub fn collides_with(&self, other: &Literal) -> bool {
        other.spellings().any(|s| self.matches(s))
    }

    pub(crate) fn merge_aliases(&mut self, other: &Literal) {
        for alias in &other.aliases {
            self.add_alias(alias.clone());
        }
    }

    fn add_alias(&mut self, alias: String) {
        if alias != self.name && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }
}
