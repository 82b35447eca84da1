use std::fmt;

/// Autocomplete proposal produced by a search criterion.
///
/// Two suggestions are equal when text (case-sensitive) and keyword flag are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCriteriaSuggestion {
    text: String,
    is_keyword: bool,
}

impl SearchCriteriaSuggestion {
    /// A value to search for, e.g. a branch name.
    pub fn value(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_keyword: false,
        }
    }

    /// The keyword of a criterion, e.g. `after`.
    pub fn keyword(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_keyword: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_keyword(&self) -> bool {
        self.is_keyword
    }
}

impl fmt::Display for SearchCriteriaSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_keyword {
            write!(f, "{}:", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}
