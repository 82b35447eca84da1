use std::collections::HashSet;
use std::rc::Rc;

use chrono::{Datelike, Days, NaiveDate};
use indexmap::IndexSet;

use crate::build::{Build, BuildSource};
use crate::clock::{Clock, SystemClock};
use crate::locale::{Locale, Text};

use super::criteria::{SearchCriteria, SuggestionCache};
use super::matcher::StringMatcher;
use super::suggestion::SearchCriteriaSuggestion;

pub const DEFAULT_MAX_DATES_TO_SUGGEST: usize = 10;

/// Comparison a date criterion applies between a build's queue date and the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOperator {
    /// Strictly after the given date.
    After,
    /// Strictly before the given date.
    Before,
}

impl DateOperator {
    fn keyword(self) -> Text {
        match self {
            DateOperator::After => Text::AfterKeyword,
            DateOperator::Before => Text::BeforeKeyword,
        }
    }

    fn description(self) -> Text {
        match self {
            DateOperator::After => Text::AfterDescription,
            DateOperator::Before => Text::BeforeDescription,
        }
    }

    fn relative_keyword(self) -> Text {
        match self {
            DateOperator::After => Text::AfterYesterday,
            DateOperator::Before => Text::BeforeToday,
        }
    }

    /// Date the relative keyword stands for. `None` at the edge of the calendar.
    fn relative_date(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateOperator::After => today.checked_sub_days(Days::new(1)),
            DateOperator::Before => Some(today),
        }
    }

    /// The value a user would type to include builds queued on `queued`.
    fn boundary_for(self, queued: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateOperator::After => queued.checked_sub_days(Days::new(1)),
            DateOperator::Before => queued.checked_add_days(Days::new(1)),
        }
    }

    fn includes(self, queued: NaiveDate, boundary: NaiveDate) -> bool {
        match self {
            DateOperator::After => queued > boundary,
            DateOperator::Before => queued < boundary,
        }
    }
}

/// Criterion comparing the date a build was queued with a typed date.
///
/// Dates are compared without time of day, in UTC. Builds without a queue time are
/// always included.
pub struct DateCriteria {
    operator: DateOperator,
    locale: Locale,
    clock: Rc<dyn Clock>,
    max_dates: usize,
    boundaries: SuggestionCache<Vec<NaiveDate>>,
}

impl DateCriteria {
    pub fn new(operator: DateOperator) -> Self {
        Self {
            operator,
            locale: Locale::default(),
            clock: Rc::new(SystemClock),
            max_dates: DEFAULT_MAX_DATES_TO_SUGGEST,
            boundaries: SuggestionCache::default(),
        }
    }

    pub fn after() -> Self {
        Self::new(DateOperator::After)
    }

    pub fn before() -> Self {
        Self::new(DateOperator::Before)
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_max_dates(mut self, max_dates: usize) -> Self {
        self.max_dates = max_dates;
        self
    }

    pub fn operator(&self) -> DateOperator {
        self.operator
    }

    fn relative_keyword(&self) -> &'static str {
        self.locale.text(self.operator.relative_keyword())
    }

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn format(&self, date: NaiveDate) -> String {
        self.locale.format_short_date(date)
    }

    fn resolve_term(&self, term: &str, today: NaiveDate) -> Option<NaiveDate> {
        if self.locale.eq_ignore_case(term, self.relative_keyword()) {
            return self.operator.relative_date(today);
        }

        self.locale.parse_date(term, today.year())
    }

    /// Parsed date for suggestions that are dates, the literal text otherwise.
    fn canonical(&self, suggestion: &str, today: NaiveDate) -> CanonicalSuggestion {
        match self.locale.parse_date(suggestion, today.year()) {
            Some(date) => CanonicalSuggestion::Date(date),
            None => CanonicalSuggestion::Literal(suggestion.to_string()),
        }
    }

    fn candidates(&self, input: &str, today: NaiveDate) -> Vec<String> {
        let mut candidates = Vec::new();

        let relative = self.relative_keyword();
        if StringMatcher::new(input).is_match(relative) {
            candidates.push(relative.to_string());
        }

        candidates.extend(
            self.boundaries
                .values()
                .iter()
                .map(|date| self.format(*date))
                .filter(|text| input.is_empty() || self.locale.starts_with_ignore_case(text, input)),
        );

        let today_text = self.format(today);
        if !input.is_empty() && self.locale.starts_with_ignore_case(&today_text, input) {
            candidates.push(today_text);
        }

        candidates
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum CanonicalSuggestion {
    Date(NaiveDate),
    Literal(String),
}

impl SearchCriteria for DateCriteria {
    fn keyword(&self, locale: Locale) -> String {
        locale.text(self.operator.keyword()).to_string()
    }

    fn description(&self, locale: Locale) -> String {
        locale.text(self.operator.description()).to_string()
    }

    fn examples(&self) -> Vec<String> {
        let today = self.today();
        let mut examples = vec![self.relative_keyword().to_string(), self.format(today)];
        examples.extend(today.checked_sub_days(Days::new(1)).map(|d| self.format(d)));
        examples
    }

    fn is_build_included(&self, build: &Build, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }

        let Some(queued) = build.queue_time else {
            return true;
        };

        match self.resolve_term(term, self.today()) {
            Some(boundary) => self.operator.includes(queued.date_naive(), boundary),
            None => false,
        }
    }

    /// Relative keyword, observed boundary dates and today's date, deduplicated by
    /// the date they stand for.
    fn suggest(&self, input: &str) -> Vec<SearchCriteriaSuggestion> {
        let input = input.trim();
        let today = self.today();
        let mut seen = HashSet::new();

        self.candidates(input, today)
            .into_iter()
            .filter(|text| seen.insert(self.canonical(text, today)))
            .map(SearchCriteriaSuggestion::value)
            .collect()
    }

    fn refresh_cache(&self, source: &dyn BuildSource) {
        let operator = self.operator;
        let max_dates = self.max_dates;

        self.boundaries.refresh_with(source, |builds| {
            builds
                .iter()
                .filter_map(|build| build.queue_time)
                .filter_map(|queued| operator.boundary_for(queued.date_naive()))
                .collect::<IndexSet<_>>()
                .into_iter()
                .take(max_dates)
                .collect()
        });
    }
}
