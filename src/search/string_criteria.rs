use std::cell::RefCell;

use indexmap::IndexSet;

use crate::build::{Build, BuildSource};
use crate::locale::{Locale, Text};

use super::criteria::{SearchCriteria, SuggestionCache};
use super::matcher::StringMatcher;
use super::suggestion::SearchCriteriaSuggestion;

const EXAMPLES_FROM_CACHE: usize = 2;

/// Criterion matching one string attribute of a build.
pub struct StringCriteria {
    keyword: Text,
    description: Text,
    value_of: fn(&Build) -> String,
    fallback_examples: &'static [&'static str],
    locale: Locale,
    matcher: RefCell<StringMatcher>,
    values: SuggestionCache<IndexSet<String>>,
}

impl StringCriteria {
    pub fn new(keyword: Text, description: Text, value_of: fn(&Build) -> String) -> Self {
        Self {
            keyword,
            description,
            value_of,
            fallback_examples: &[],
            locale: Locale::default(),
            matcher: RefCell::new(StringMatcher::default()),
            values: SuggestionCache::default(),
        }
    }

    /// Matches the build definition name.
    pub fn definition() -> Self {
        Self::new(
            Text::DefinitionKeyword,
            Text::DefinitionDescription,
            |build| build.definition.name.clone(),
        )
        .with_fallback_examples(&["CI", "Nightly"])
    }

    /// Matches the branch name without its `refs/heads/` prefix.
    pub fn branch() -> Self {
        Self::new(Text::BranchKeyword, Text::BranchDescription, |build| {
            build.branch_name().to_string()
        })
        .with_fallback_examples(&["main", "feature/"])
    }

    pub fn source() -> Self {
        Self::new(Text::SourceKeyword, Text::SourceDescription, |build| {
            build.source.name.clone()
        })
    }

    pub fn status() -> Self {
        Self::new(Text::StatusKeyword, Text::StatusDescription, |build| {
            build.status.as_str().to_string()
        })
        .with_fallback_examples(&["Failed", "Running"])
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_fallback_examples(mut self, examples: &'static [&'static str]) -> Self {
        self.fallback_examples = examples;
        self
    }
}

impl SearchCriteria for StringCriteria {
    fn keyword(&self, locale: Locale) -> String {
        locale.text(self.keyword).to_string()
    }

    fn description(&self, locale: Locale) -> String {
        locale.text(self.description).to_string()
    }

    fn examples(&self) -> Vec<String> {
        let values = self.values.values();
        if values.is_empty() {
            return self.fallback_examples.iter().map(|e| e.to_string()).collect();
        }

        values.iter().take(EXAMPLES_FROM_CACHE).cloned().collect()
    }

    fn is_build_included(&self, build: &Build, term: &str) -> bool {
        let mut matcher = self.matcher.borrow_mut();
        matcher.set_pattern(term);
        matcher.is_match(&(self.value_of)(build))
    }

    /// Cached values containing `input`, ordered by how they compare to `input`.
    fn suggest(&self, input: &str) -> Vec<SearchCriteriaSuggestion> {
        let matcher = StringMatcher::new(input);
        let values = self.values.values();
        let mut matches: Vec<&String> = values
            .iter()
            .filter(|value| matcher.is_match(value))
            .collect();
        matches.sort_by(|a, b| {
            self.locale
                .compare_ignore_case(input, a)
                .cmp(&self.locale.compare_ignore_case(input, b))
        });

        matches
            .into_iter()
            .map(|value| SearchCriteriaSuggestion::value(value.as_str()))
            .collect()
    }

    fn refresh_cache(&self, source: &dyn BuildSource) {
        self.values
            .refresh_with(source, |builds| builds.iter().map(self.value_of).collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::test_support::*;
    use crate::build::{BuildCache, BuildStatus};

    fn source_with(builds: Vec<Build>) -> BuildCache {
        let mut cache = BuildCache::new();
        cache.replace(builds, utc(2020, 6, 18, 8));
        cache
    }

    fn texts(suggestions: &[SearchCriteriaSuggestion]) -> Vec<&str> {
        suggestions.iter().map(SearchCriteriaSuggestion::text).collect()
    }

    #[test]
    fn includes_builds_whose_value_contains_term() {
        let criteria = StringCriteria::branch();
        let b = build("1", "CI", "refs/heads/feature/login");

        assert!(criteria.is_build_included(&b, "LOGIN"));
        assert!(criteria.is_build_included(&b, "feature"));
        assert!(criteria.is_build_included(&b, ""));
        assert!(!criteria.is_build_included(&b, "refs"));
        assert!(!criteria.is_build_included(&b, "main"));
    }

    #[test]
    fn status_criteria_matches_status_name() {
        let criteria = StringCriteria::status();
        let b = with_status(build("1", "CI", "main"), BuildStatus::PartiallySucceeded);
        assert!(criteria.is_build_included(&b, "partially"));
        assert!(!criteria.is_build_included(&b, "failed"));
    }

    #[test]
    fn suggestions_come_from_refreshed_cache() {
        let criteria = StringCriteria::definition();
        assert!(criteria.suggest("").is_empty());

        criteria.refresh_cache(&source_with(vec![
            build("1", "Nightly", "main"),
            build("2", "CI", "main"),
            build("3", "Nightly", "dev"),
        ]));

        let suggestions = criteria.suggest("");
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| !s.is_keyword()));
    }

    #[test]
    fn suggestions_are_filtered_by_input() {
        let criteria = StringCriteria::definition();
        criteria.refresh_cache(&source_with(vec![
            build("1", "Nightly", "main"),
            build("2", "CI", "main"),
            build("3", "Night Watch", "main"),
        ]));

        let suggestions = criteria.suggest("night");
        assert_eq!(texts(&suggestions), vec!["Nightly", "Night Watch"]);
    }

    #[test]
    fn suggestions_are_ordered_by_comparison_with_input() {
        let criteria = StringCriteria::branch();
        criteria.refresh_cache(&source_with(vec![
            build("1", "CI", "xa"),
            build("2", "CI", "ab"),
            build("3", "CI", "a"),
        ]));

        // values sorting after the input come first, the exact match last
        let suggestions = criteria.suggest("a");
        assert_eq!(texts(&suggestions), vec!["xa", "ab", "a"]);
    }

    #[test]
    fn values_sorting_before_the_input_follow_the_exact_match() {
        let criteria = StringCriteria::branch();
        criteria.refresh_cache(&source_with(vec![
            build("1", "CI", "ab"),
            build("2", "CI", "b"),
            build("3", "CI", "bc"),
        ]));

        let suggestions = criteria.suggest("b");
        assert_eq!(texts(&suggestions), vec!["bc", "b", "ab"]);
    }

    #[test]
    fn examples_prefer_cached_values() {
        let criteria = StringCriteria::definition();
        assert_eq!(criteria.examples(), vec!["CI", "Nightly"]);

        criteria.refresh_cache(&source_with(vec![build("1", "Release", "main")]));
        assert_eq!(criteria.examples(), vec!["Release"]);
    }

    #[test]
    fn keywords_are_localized() {
        let criteria = StringCriteria::source();
        assert_eq!(criteria.keyword(Locale::En), "source");
        assert_eq!(criteria.keyword(Locale::De), "quelle");
    }
}
