use std::cell::{Cell, Ref, RefCell};

use chrono::{DateTime, Utc};
use log::debug;

use crate::build::{Build, BuildSource};
use crate::locale::Locale;

use super::suggestion::SearchCriteriaSuggestion;

/// A pluggable match and suggest unit bound to one search keyword.
///
/// Criteria are registered once and live as long as the search engine. Their
/// suggestion caches are refreshed through [`SearchCriteria::refresh_cache`] by the
/// owner of the refresh cycle; matching and suggesting never fail, unparsable input
/// simply matches nothing.
pub trait SearchCriteria {
    /// Keyword typed before `:` to select this criterion. Empty for the default one.
    fn keyword(&self, locale: Locale) -> String;

    fn description(&self, locale: Locale) -> String;

    /// Example terms shown to the user.
    fn examples(&self) -> Vec<String>;

    fn is_build_included(&self, build: &Build, term: &str) -> bool;

    fn suggest(&self, input: &str) -> Vec<SearchCriteriaSuggestion>;

    /// Recomputes cached suggestion values when `source` changed since the last call.
    fn refresh_cache(&self, source: &dyn BuildSource);
}

/// Values derived from a [`BuildSource`], recomputed when its `last_updated` changes.
#[derive(Debug, Default)]
pub struct SuggestionCache<T> {
    values: RefCell<T>,
    stamp: Cell<Option<Option<DateTime<Utc>>>>,
}

impl<T> SuggestionCache<T> {
    /// Returns whether the values were recomputed.
    pub fn refresh_with<F>(&self, source: &dyn BuildSource, compute: F) -> bool
    where
        F: FnOnce(&[Build]) -> T,
    {
        let stamp = Some(source.last_updated());
        if self.stamp.get() == stamp {
            return false;
        }

        *self.values.borrow_mut() = compute(source.cached_builds());
        self.stamp.set(stamp);
        debug!("Refreshed suggestion cache from {} builds", source.cached_builds().len());
        true
    }

    pub fn values(&self) -> Ref<'_, T> {
        self.values.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::test_support::*;
    use crate::build::BuildCache;

    #[test]
    fn cache_recomputes_only_when_source_changes() {
        let cache: SuggestionCache<usize> = SuggestionCache::default();
        let mut source = BuildCache::new();

        assert!(cache.refresh_with(&source, <[Build]>::len));
        assert!(!cache.refresh_with(&source, <[Build]>::len));
        assert_eq!(*cache.values(), 0);

        source.replace(vec![build("1", "CI", "main")], utc(2020, 6, 18, 10));
        assert!(cache.refresh_with(&source, <[Build]>::len));
        assert_eq!(*cache.values(), 1);
        assert!(!cache.refresh_with(&source, <[Build]>::len));
    }
}
