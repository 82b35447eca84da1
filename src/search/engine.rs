use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::build::{Build, BuildSource};
use crate::clock::Clock;
use crate::locale::Locale;
use crate::tree::BuildTree;

use super::criteria::SearchCriteria;
use super::date_criteria::{DateCriteria, DEFAULT_MAX_DATES_TO_SUGGEST};
use super::default_criteria::{
    DefaultSearchCriteria, RegisteredCriteria, DEFAULT_MAX_SUGGESTIONS,
    DEFAULT_SUGGESTIONS_PER_CRITERIA,
};
use super::string_criteria::StringCriteria;
use super::suggestion::SearchCriteriaSuggestion;

/// Ends a keyword, e.g. `after:`.
pub const KEYWORD_SEPARATOR: char = ':';
/// Ends a block and switches back to the default criterion.
pub const BLOCK_SEPARATOR: char = ',';

/// A criterion together with the term it is applied with.
pub struct SearchBlock {
    criteria: Rc<dyn SearchCriteria>,
    keyword_text: String,
    entered_text: String,
    search_term: String,
}

impl SearchBlock {
    fn new(criteria: Rc<dyn SearchCriteria>, keyword_text: String, entered_text: String) -> Self {
        let search_term = collapse_whitespace(entered_text.trim_end_matches(BLOCK_SEPARATOR));
        Self {
            criteria,
            keyword_text,
            entered_text,
            search_term,
        }
    }

    pub fn criteria(&self) -> &Rc<dyn SearchCriteria> {
        &self.criteria
    }

    /// The keyword that opened this block as typed, including the separator. Empty
    /// for blocks under the default criterion.
    pub fn keyword_text(&self) -> &str {
        &self.keyword_text
    }

    /// Text typed after the keyword, verbatim. Includes a closing `,` if there was one.
    pub fn entered_text(&self) -> &str {
        &self.entered_text
    }

    /// Entered text without the closing separator and with whitespace collapsed.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Everything this block consumed from the input.
    pub fn raw_text(&self) -> String {
        format!("{}{}", self.keyword_text, self.entered_text)
    }

    pub fn is_build_included(&self, build: &Build) -> bool {
        self.criteria.is_build_included(build, &self.search_term)
    }
}

impl fmt::Debug for SearchBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchBlock")
            .field("keyword_text", &self.keyword_text)
            .field("entered_text", &self.entered_text)
            .field("search_term", &self.search_term)
            .finish_non_exhaustive()
    }
}

/// Result of parsing one search text.
#[derive(Debug)]
pub struct SpecificSearch {
    text: String,
    blocks: Vec<SearchBlock>,
}

impl SpecificSearch {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Never empty.
    pub fn blocks(&self) -> &[SearchBlock] {
        &self.blocks
    }

    /// A build is included when every block includes it.
    pub fn is_build_included(&self, build: &Build) -> bool {
        self.blocks.iter().all(|block| block.is_build_included(build))
    }
}

impl BuildTree {
    /// Copy of this tree keeping only builds included by `search`.
    pub fn filtered(&self, search: &SpecificSearch) -> BuildTree {
        self.retain_builds(|build| search.is_build_included(build))
    }
}

/// Passed to the parse observer after every [`SearchEngine::parse`].
#[derive(Debug, Clone, Copy)]
pub struct SearchParsed<'a> {
    pub text: &'a str,
    pub search: &'a SpecificSearch,
}

type ParsedObserver = Box<dyn Fn(&SearchParsed<'_>)>;

/// Turns search text into blocks bound to registered criteria.
///
/// Text is scanned once from left to right. A `,` closes the current block and
/// returns to the default criterion. A `:` switches to the criterion whose keyword
/// directly precedes it; without such a keyword it is ordinary text. Registration
/// order decides between keywords that both match.
pub struct SearchEngine {
    criteria: Vec<RegisteredCriteria>,
    locale: Locale,
    max_suggestions: usize,
    suggestions_per_criteria: usize,
    default_criteria: OnceCell<Rc<DefaultSearchCriteria>>,
    observer: Option<ParsedObserver>,
}

impl SearchEngine {
    pub fn new(locale: Locale) -> Self {
        Self {
            criteria: Vec::new(),
            locale,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            suggestions_per_criteria: DEFAULT_SUGGESTIONS_PER_CRITERIA,
            default_criteria: OnceCell::new(),
            observer: None,
        }
    }

    /// Engine with the built-in criteria registered.
    pub fn with_defaults(locale: Locale, clock: Rc<dyn Clock>) -> Self {
        let mut engine = Self::new(locale);
        engine.register_defaults(clock, DEFAULT_MAX_DATES_TO_SUGGEST);
        engine
    }

    /// Registers the definition, branch, source, status, after and before criteria.
    ///
    /// Definition, branch and source take part in unqualified matching; status and
    /// the date criteria only apply behind their keyword.
    pub fn register_defaults(&mut self, clock: Rc<dyn Clock>, max_dates: usize) {
        let locale = self.locale;
        self.add_criteria(Rc::new(StringCriteria::definition().with_locale(locale)), true);
        self.add_criteria(Rc::new(StringCriteria::branch().with_locale(locale)), true);
        self.add_criteria(Rc::new(StringCriteria::source().with_locale(locale)), true);
        self.add_criteria(Rc::new(StringCriteria::status().with_locale(locale)), false);

        for criteria in [DateCriteria::after(), DateCriteria::before()] {
            let criteria = criteria
                .with_locale(locale)
                .with_clock(Rc::clone(&clock))
                .with_max_dates(max_dates);
            self.add_criteria(Rc::new(criteria), false);
        }
    }

    #[must_use]
    pub fn with_limits(mut self, max_suggestions: usize, suggestions_per_criteria: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self.suggestions_per_criteria = suggestions_per_criteria;
        self.default_criteria.take();
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn add_criteria(&mut self, criteria: Rc<dyn SearchCriteria>, include_in_default: bool) {
        debug!(
            "Registering search criteria '{}'",
            criteria.keyword(self.locale)
        );
        self.criteria.push(RegisteredCriteria {
            criteria,
            include_in_default,
        });
        self.default_criteria.take();
    }

    pub fn criteria(&self) -> &[RegisteredCriteria] {
        &self.criteria
    }

    /// Criterion applied to text typed without a keyword.
    pub fn default_criteria(&self) -> Rc<DefaultSearchCriteria> {
        let default = self.default_criteria.get_or_init(|| {
            Rc::new(
                DefaultSearchCriteria::new(self.criteria.clone(), self.locale)
                    .with_limits(self.max_suggestions, self.suggestions_per_criteria),
            )
        });
        Rc::clone(default)
    }

    pub fn set_parsed_observer<F>(&mut self, observer: F)
    where
        F: Fn(&SearchParsed<'_>) + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn parse(&self, text: &str) -> SpecificSearch {
        let search = SpecificSearch {
            text: text.to_string(),
            blocks: self.parse_blocks(text),
        };
        debug!("Parsed '{}' into {} blocks", text, search.blocks.len());

        if let Some(observer) = &self.observer {
            observer(&SearchParsed {
                text,
                search: &search,
            });
        }

        search
    }

    /// Suggestions for the block being typed at the end of `text`.
    pub fn suggest(&self, text: &str) -> Vec<SearchCriteriaSuggestion> {
        let blocks = self.parse_blocks(text);
        match blocks.last() {
            Some(block) => block.criteria.suggest(&block.search_term),
            None => Vec::new(),
        }
    }

    pub fn refresh_caches(&self, source: &dyn BuildSource) {
        for registered in &self.criteria {
            registered.criteria.refresh_cache(source);
        }
    }

    fn parse_blocks(&self, text: &str) -> Vec<SearchBlock> {
        let default: Rc<dyn SearchCriteria> = self.default_criteria();
        let mut blocks = Vec::new();
        let mut buffer = String::new();
        let mut current = Rc::clone(&default);
        let mut keyword_text = String::new();

        for character in text.chars() {
            buffer.push(character);

            if character == BLOCK_SEPARATOR {
                blocks.push(SearchBlock::new(
                    std::mem::replace(&mut current, Rc::clone(&default)),
                    std::mem::take(&mut keyword_text),
                    std::mem::take(&mut buffer),
                ));
                continue;
            }

            if character != KEYWORD_SEPARATOR {
                continue;
            }

            let Some((matched, keyword_len)) = self.match_keyword(&buffer) else {
                continue;
            };

            let keyword = buffer.split_off(buffer.len() - keyword_len);
            blocks.push(SearchBlock::new(
                std::mem::replace(&mut current, matched),
                std::mem::replace(&mut keyword_text, keyword),
                std::mem::take(&mut buffer),
            ));
        }

        blocks.push(SearchBlock::new(current, keyword_text, buffer));
        blocks
    }

    /// First criterion whose keyword and separator end `buffer`, with the byte length
    /// of that suffix.
    fn match_keyword(&self, buffer: &str) -> Option<(Rc<dyn SearchCriteria>, usize)> {
        self.criteria.iter().find_map(|registered| {
            let keyword = registered.criteria.keyword(self.locale);
            if keyword.is_empty() {
                return None;
            }

            let pattern = format!("{keyword}{KEYWORD_SEPARATOR}");
            let suffix = char_suffix(buffer, pattern.chars().count())?;
            self.locale
                .eq_ignore_case(suffix, &pattern)
                .then(|| (Rc::clone(&registered.criteria), suffix.len()))
        })
    }
}

fn char_suffix(text: &str, count: usize) -> Option<&str> {
    let (start, _) = text.char_indices().rev().nth(count.checked_sub(1)?)?;
    Some(&text[start..])
}

/// Collapses runs of spaces and tabs into one space. Other characters, line breaks
/// included, are kept.
fn collapse_whitespace(text: &str) -> String {
    text.split([' ', '\t'])
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use super::*;
    use crate::build::test_support::*;
    use crate::build::BuildCache;
    use crate::clock::FixedClock;
    use crate::tree::{GroupDefinition, GroupingSpec, TreeBuilder};

    fn clock() -> Rc<dyn Clock> {
        Rc::new(FixedClock(NaiveDate::from_ymd_opt(2020, 6, 18).unwrap()))
    }

    fn after_only() -> SearchEngine {
        let mut engine = SearchEngine::new(Locale::En);
        engine.add_criteria(Rc::new(DateCriteria::after().with_clock(clock())), true);
        engine
    }

    fn keywords(search: &SpecificSearch) -> Vec<String> {
        search
            .blocks()
            .iter()
            .map(|block| block.criteria().keyword(Locale::En))
            .collect()
    }

    fn terms(search: &SpecificSearch) -> Vec<&str> {
        search.blocks().iter().map(SearchBlock::search_term).collect()
    }

    #[test]
    fn entered_text_keeps_space_after_keyword() {
        let search = after_only().parse("after: 1");

        assert_eq!(keywords(&search), vec!["", "after"]);
        assert_eq!(terms(&search), vec!["", "1"]);
        assert_eq!(search.blocks()[0].entered_text(), "");
        assert_eq!(search.blocks()[1].keyword_text(), "after:");
        assert_eq!(search.blocks()[1].entered_text(), " 1");
    }

    #[test]
    fn empty_text_yields_one_default_block() {
        let search = after_only().parse("");
        assert_eq!(search.blocks().len(), 1);
        assert_eq!(keywords(&search), vec![""]);
        assert_eq!(terms(&search), vec![""]);
    }

    #[test]
    fn block_separator_returns_to_default_criteria() {
        let engine = SearchEngine::with_defaults(Locale::En, clock());
        let search = engine.parse("branch: feature/ ,  nightly   build");

        assert_eq!(keywords(&search), vec!["", "branch", ""]);
        assert_eq!(terms(&search), vec!["", "feature/", "nightly build"]);
        assert_eq!(search.blocks()[1].entered_text(), " feature/ ,");
    }

    #[test]
    fn blocks_reconstruct_the_input() {
        let engine = SearchEngine::with_defaults(Locale::En, clock());
        let text = "ci BRANCH:main, status:failed after: 6/1/2020 x:y";
        let search = engine.parse(text);

        let rebuilt: String = search.blocks().iter().map(SearchBlock::raw_text).collect();
        assert_eq!(rebuilt, text);
        assert_eq!(
            keywords(&search),
            vec!["", "branch", "", "status", "after"]
        );
        assert_eq!(terms(&search), vec!["ci", "main", "", "failed", "6/1/2020 x:y"]);
    }

    #[test]
    fn only_spaces_and_tabs_are_collapsed() {
        let search = after_only().parse("  nightly \t\t build\n  ci  ");
        assert_eq!(terms(&search), vec!["nightly build\n ci"]);
        assert_eq!(collapse_whitespace(" \t "), "");
    }

    #[test]
    fn unknown_keyword_is_plain_text() {
        let search = after_only().parse("later: 1");
        assert_eq!(keywords(&search), vec![""]);
        assert_eq!(terms(&search), vec!["later: 1"]);
    }

    #[test]
    fn keyword_must_directly_precede_separator() {
        let search = after_only().parse("after :1");
        assert_eq!(search.blocks().len(), 1);
    }

    #[test]
    fn first_registered_keyword_wins() {
        let mut engine = SearchEngine::new(Locale::En);
        engine.add_criteria(Rc::new(StringCriteria::branch()), true);
        engine.add_criteria(
            Rc::new(StringCriteria::new(
                crate::locale::Text::BranchKeyword,
                crate::locale::Text::DefinitionDescription,
                |build| build.definition.name.clone(),
            )),
            true,
        );

        let search = engine.parse("branch:main");
        let b = build("1", "CI", "main");
        assert!(search.is_build_included(&b));
        assert!(!engine.parse("branch:CI").is_build_included(&b));
    }

    #[test]
    fn keywords_follow_engine_locale() {
        let engine = SearchEngine::with_defaults(Locale::De, clock());
        let search = engine.parse("quelle:azure nach:17.06.2020");
        let keywords: Vec<String> = search
            .blocks()
            .iter()
            .map(|block| block.criteria().keyword(Locale::De))
            .collect();
        assert_eq!(keywords, vec!["", "quelle", "nach"]);
    }

    #[test]
    fn all_blocks_must_include_a_build() {
        let engine = SearchEngine::with_defaults(Locale::En, clock());
        let old = queued_on(build("1", "CI", "main"), 2020, 6, 1);
        let new = queued_on(build("2", "CI", "main"), 2020, 6, 17);
        let other = queued_on(build("3", "Nightly", "main"), 2020, 6, 17);

        let search = engine.parse("ci, after: 6/10/2020");
        assert!(!search.is_build_included(&old));
        assert!(search.is_build_included(&new));
        assert!(!search.is_build_included(&other));
    }

    #[test]
    fn filtered_tree_drops_empty_groups() {
        let engine = SearchEngine::with_defaults(Locale::En, clock());
        let tree = TreeBuilder::new(GroupingSpec::new([GroupDefinition::BuildDefinition])).build(&[
            build("1", "CI", "main"),
            build("2", "Nightly", "main"),
        ]);

        let filtered = tree.filtered(&engine.parse("night"));
        assert_eq!(filtered.children().len(), 1);
        assert_eq!(filtered.build_count(), 1);
        assert_eq!(tree.filtered(&engine.parse("")).build_count(), 2);
    }

    #[test]
    fn suggests_for_the_last_block() {
        let engine = SearchEngine::with_defaults(Locale::En, clock());
        let mut source = BuildCache::new();
        source.replace(
            vec![build("1", "CI", "refs/heads/main"), build("2", "CI", "develop")],
            utc(2020, 6, 18, 9),
        );
        engine.refresh_caches(&source);

        let suggestions = engine.suggest("ci, branch: ma");
        assert_eq!(suggestions, vec![SearchCriteriaSuggestion::value("main")]);

        let suggestions = engine.suggest("BR");
        assert_eq!(suggestions, vec![SearchCriteriaSuggestion::keyword("branch")]);
    }

    #[test]
    fn default_criteria_is_rebuilt_after_registration() {
        let mut engine = SearchEngine::new(Locale::En);
        assert!(engine.default_criteria().examples().is_empty());

        engine.add_criteria(Rc::new(StringCriteria::definition()), true);
        assert_eq!(engine.default_criteria().examples(), vec!["CI"]);
    }

    #[test]
    fn observer_sees_every_parse() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut engine = after_only();
        let sink = Rc::clone(&seen);
        engine.set_parsed_observer(move |parsed| {
            sink.borrow_mut()
                .push((parsed.text.to_string(), parsed.search.blocks().len()));
        });

        engine.parse("after: 1");
        engine.parse("x");

        assert_eq!(
            *seen.borrow(),
            vec![("after: 1".to_string(), 2), ("x".to_string(), 1)]
        );
    }

    #[test]
    fn suggest_does_not_notify() {
        let count = Rc::new(RefCell::new(0));
        let mut engine = after_only();
        let sink = Rc::clone(&count);
        engine.set_parsed_observer(move |_| *sink.borrow_mut() += 1);

        engine.suggest("after: 6");
        assert_eq!(*count.borrow(), 0);
    }
}
