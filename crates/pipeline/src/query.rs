//! Literature query composition.
//!
//! A run searches one boolean query string. It is composed from a selection
//! of journals and an optional hand-written query.

use serde::{Deserialize, Serialize};

use crate::WatchError;

/// Default cap on query results.
pub const DEFAULT_MAX_RESULTS: u32 = 1000;

/// Default recency window in days.
pub const DEFAULT_RECENCY_DAYS: u32 = 7;

/// A journal offered for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Journal {
    /// Short flag name, e.g. `"jama"`.
    pub abbreviation: &'static str,
    /// Name shown to the operator.
    pub display_name: &'static str,
    /// Name as indexed by the literature database.
    pub database_name: &'static str,
}

/// Commonly surveilled journals.
pub const COMMON_JOURNALS: &[Journal] = &[
    Journal {
        abbreviation: "afm",
        display_name: "Annals of Family Medicine",
        database_name: "Annals of family medicine",
    },
    Journal {
        abbreviation: "jabfm",
        display_name: "Journal of the American Board of Family Medicine",
        database_name: "Journal of the American Board of Family Medicine : JABFM",
    },
    Journal {
        abbreviation: "fm_stfm",
        display_name: "Family Medicine",
        database_name: "Family medicine\"[Journal]",
    },
    Journal {
        abbreviation: "jama",
        display_name: "Journal of the American Medical Association (JAMA)",
        database_name: "JAMA",
    },
    Journal {
        abbreviation: "jama_im",
        display_name: "JAMA Internal Medicine",
        database_name: "JAMA internal medicine",
    },
    Journal {
        abbreviation: "aim",
        display_name: "Annals of Internal Medicine",
        database_name: "Annals of internal medicine",
    },
    Journal {
        abbreviation: "nejm",
        display_name: "New England Journal of Medicine",
        database_name: "The New England journal of medicine",
    },
    Journal {
        abbreviation: "nm",
        display_name: "Nature Medicine",
        database_name: "Nature medicine",
    },
    Journal {
        abbreviation: "jgim",
        display_name: "Journal of General Internal Medicine",
        database_name: "Journal of general internal medicine",
    },
];

impl Journal {
    pub fn by_abbreviation(abbreviation: &str) -> Option<&'static Journal> {
        COMMON_JOURNALS
            .iter()
            .find(|j| j.abbreviation.eq_ignore_ascii_case(abbreviation))
    }
}

/// Joins two query fragments as `(a) <joiner> (b)`.
pub fn concat_queries(left: &str, right: &str, joiner: &str) -> String {
    format!("({left}) {joiner} ({right})")
}

/// Builds an `or` query over journal names, each tagged `[journal]`.
///
/// Returns the empty string for an empty list.
pub fn build_journal_query<S: AsRef<str>>(journals: &[S]) -> String {
    let mut parts = journals.iter().map(|j| format!("\"{}\"[journal]", j.as_ref()));
    let Some(first) = parts.next() else {
        return String::new();
    };
    parts.fold(first, |acc, next| concat_queries(&acc, &next, "or"))
}

/// One search against the literature database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureQuery {
    term: String,
    pub max_results: u32,
    pub recency_days: u32,
}

impl LiteratureQuery {
    /// Creates a query, rejecting an empty or blank term.
    pub fn new(term: impl Into<String>, max_results: u32, recency_days: u32) -> Result<Self, WatchError> {
        let term = term.into();
        if term.trim().is_empty() {
            return Err(WatchError::EmptyQuery);
        }
        Ok(Self {
            term,
            max_results,
            recency_days,
        })
    }

    /// Composes the term from journal names and a written query.
    ///
    /// The written query is placed first and `or`-joined with the journal
    /// query when both are present.
    pub fn compose<S: AsRef<str>>(
        journals: &[S],
        written: Option<&str>,
        max_results: u32,
        recency_days: u32,
    ) -> Result<Self, WatchError> {
        let journal_query = build_journal_query(journals);
        let written = written.map(str::trim).filter(|q| !q.is_empty());

        let term = match (written, journal_query.is_empty()) {
            (Some(w), true) => w.to_string(),
            (Some(w), false) => concat_queries(w, &journal_query, "or"),
            (None, _) => journal_query,
        };
        Self::new(term, max_results, recency_days)
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl std::fmt::Display for LiteratureQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (last {} days, max {} results)",
            self.term, self.recency_days, self.max_results
        )
    }
}
