mod criteria;
mod date_criteria;
mod default_criteria;
mod engine;
mod matcher;
mod string_criteria;
mod suggestion;

pub use criteria::{SearchCriteria, SuggestionCache};
pub use date_criteria::{DateCriteria, DateOperator, DEFAULT_MAX_DATES_TO_SUGGEST};
pub use default_criteria::{
    DefaultSearchCriteria, RegisteredCriteria, DEFAULT_MAX_SUGGESTIONS,
    DEFAULT_SUGGESTIONS_PER_CRITERIA,
};
pub use engine::{
    SearchBlock, SearchEngine, SearchParsed, SpecificSearch, BLOCK_SEPARATOR, KEYWORD_SEPARATOR,
};
pub use matcher::StringMatcher;
pub use string_criteria::StringCriteria;
pub use suggestion::SearchCriteriaSuggestion;
