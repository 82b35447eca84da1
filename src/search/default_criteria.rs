use std::collections::HashSet;
use std::rc::Rc;

use crate::build::{Build, BuildSource};
use crate::locale::{Locale, Text};

use super::criteria::SearchCriteria;
use super::suggestion::SearchCriteriaSuggestion;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;
pub const DEFAULT_SUGGESTIONS_PER_CRITERIA: usize = 2;

const EXAMPLES_PER_CRITERIA: usize = 1;

/// A registered criterion and whether unqualified terms are matched against it.
#[derive(Clone)]
pub struct RegisteredCriteria {
    pub criteria: Rc<dyn SearchCriteria>,
    pub include_in_default: bool,
}

/// Criterion used for text typed without a keyword.
///
/// A build is included when any criterion taking part in default matching includes it.
pub struct DefaultSearchCriteria {
    criteria: Vec<RegisteredCriteria>,
    locale: Locale,
    max_suggestions: usize,
    suggestions_per_criteria: usize,
}

impl DefaultSearchCriteria {
    pub fn new(criteria: Vec<RegisteredCriteria>, locale: Locale) -> Self {
        Self {
            criteria,
            locale,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            suggestions_per_criteria: DEFAULT_SUGGESTIONS_PER_CRITERIA,
        }
    }

    #[must_use]
    pub fn with_limits(mut self, max_suggestions: usize, suggestions_per_criteria: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self.suggestions_per_criteria = suggestions_per_criteria;
        self
    }

    /// One `(keyword, example)` pair for every criterion.
    pub fn examples_from_each_criteria(&self) -> Vec<(String, String)> {
        self.criteria
            .iter()
            .flat_map(|registered| {
                let keyword = registered.criteria.keyword(self.locale);
                registered
                    .criteria
                    .examples()
                    .into_iter()
                    .take(EXAMPLES_PER_CRITERIA)
                    .map(move |example| (keyword.clone(), example))
            })
            .collect()
    }

    fn keyword_suggestions<'a>(
        &'a self,
        input: &'a str,
    ) -> impl Iterator<Item = SearchCriteriaSuggestion> + 'a {
        self.criteria
            .iter()
            .map(|registered| registered.criteria.keyword(self.locale))
            .filter(move |keyword| {
                input.is_empty() || self.locale.starts_with_ignore_case(keyword, input)
            })
            .map(SearchCriteriaSuggestion::keyword)
    }

    fn value_suggestions<'a>(
        &'a self,
        input: &'a str,
    ) -> impl Iterator<Item = SearchCriteriaSuggestion> + 'a {
        self.criteria.iter().flat_map(move |registered| {
            registered
                .criteria
                .suggest(input)
                .into_iter()
                .take(self.suggestions_per_criteria)
        })
    }
}

impl SearchCriteria for DefaultSearchCriteria {
    fn keyword(&self, _locale: Locale) -> String {
        String::new()
    }

    fn description(&self, locale: Locale) -> String {
        locale.text(Text::DefaultDescription).to_string()
    }

    fn examples(&self) -> Vec<String> {
        self.examples_from_each_criteria()
            .into_iter()
            .map(|(_, example)| example)
            .collect()
    }

    fn is_build_included(&self, build: &Build, term: &str) -> bool {
        if term.trim().is_empty() {
            return true;
        }

        self.criteria
            .iter()
            .filter(|registered| registered.include_in_default)
            .any(|registered| registered.criteria.is_build_included(build, term))
    }

    /// Matching keywords first, then a few values of every criterion.
    fn suggest(&self, input: &str) -> Vec<SearchCriteriaSuggestion> {
        let mut seen = HashSet::new();

        self.keyword_suggestions(input)
            .chain(self.value_suggestions(input))
            .filter(|suggestion| seen.insert(suggestion.clone()))
            .take(self.max_suggestions)
            .collect()
    }

    fn refresh_cache(&self, source: &dyn BuildSource) {
        for registered in &self.criteria {
            registered.criteria.refresh_cache(source);
        }
    }
}
