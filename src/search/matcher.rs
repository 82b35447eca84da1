/// Case-insensitive substring matcher.
///
/// The pattern is folded once when it changes; setting the same pattern again is free.
#[derive(Debug, Clone, Default)]
pub struct StringMatcher {
    pattern: String,
    folded: String,
}

impl StringMatcher {
    pub fn new(pattern: &str) -> Self {
        let mut matcher = Self::default();
        matcher.set_pattern(pattern);
        matcher
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn set_pattern(&mut self, pattern: &str) {
        if self.pattern == pattern {
            return;
        }

        self.pattern = pattern.to_string();
        self.folded = pattern.to_lowercase();
    }

    /// True if `candidate` contains the pattern. An empty pattern matches everything.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.folded.is_empty() || candidate.to_lowercase().contains(&self.folded)
    }
}
