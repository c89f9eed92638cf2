//! Catalog queries: the filtered, sorted view over all documents
//!
//! Everything here is a pure function of its inputs. Calling [`query`] twice
//! with the same arguments yields the same ordered sequence.

use crate::Document;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sentinel category values that match every document
pub const ALL_CATEGORIES: [&str; 2] = ["All", "Todos"];

/// Unrecognized sort key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown sort key '{0}': expected 'date' or 'title'")]
pub struct UnknownSortKey(pub String);

/// Ordering applied to the catalog view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most recent historical date first; ties keep their original order
    #[default]
    Date,
    /// Ascending, accent- and case-insensitive title order
    Title,
}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "title" => Ok(SortKey::Title),
            _ => Err(UnknownSortKey(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Date => write!(f, "date"),
            SortKey::Title => write!(f, "title"),
        }
    }
}

/// Category restriction for the catalog view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every category
    #[default]
    All,
    /// Exactly this category
    Exact(String),
}

impl CategoryFilter {
    /// Interpret a user-selected category
    ///
    /// `"All"`, `"Todos"` (any case) and the empty string select everything.
    /// Any other value must equal a category exactly.
    pub fn parse(value: &str) -> Self {
        let sentinel = value.trim();
        if value.is_empty()
            || ALL_CATEGORIES
                .iter()
                .any(|all| all.eq_ignore_ascii_case(sentinel))
        {
            CategoryFilter::All
        } else {
            CategoryFilter::Exact(value.to_string())
        }
    }

    /// Whether a document's category passes this filter
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Exact(wanted) => wanted == category,
        }
    }
}

/// A search + category + sort specification over the catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    /// Case-insensitive substring matched against title, source and category
    pub search: String,
    /// Category restriction
    pub category: CategoryFilter,
    /// Result ordering
    pub sort: SortKey,
}

impl CatalogQuery {
    /// Create a query from its three parts
    pub fn new(search: impl Into<String>, category: CategoryFilter, sort: SortKey) -> Self {
        Self {
            search: search.into(),
            category,
            sort,
        }
    }

    /// Produce the filtered, ordered view of `documents`
    pub fn apply(&self, documents: &[Document]) -> Vec<Document> {
        let needle = self.search.to_lowercase();

        let mut selected: Vec<Document> = documents
            .iter()
            .filter(|doc| matches_search(doc, &needle) && self.category.matches(&doc.category))
            .cloned()
            .collect();

        match self.sort {
            // slice::sort_by is stable, so equal dates keep their input order
            SortKey::Date => selected.sort_by(|a, b| b.date.cmp(&a.date)),
            SortKey::Title => sort_by_title(&mut selected),
        }

        selected
    }
}

/// Filter and sort `documents` in one call
pub fn query(documents: &[Document], search: &str, category: &str, sort: SortKey) -> Vec<Document> {
    CatalogQuery::new(search, CategoryFilter::parse(category), sort).apply(documents)
}

/// Sorted, de-duplicated categories present in the catalog
pub fn distinct_categories(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .map(|doc| doc.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Collation key for locale-aware title ordering
///
/// Decomposes to NFD, drops combining marks and lowercases, so "Éden" sorts
/// next to "eden" rather than after "z".
pub fn collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn matches_search(doc: &Document, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [&doc.title, &doc.source, &doc.category]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn case_inverted(title: &str) -> impl Iterator<Item = char> + '_ {
    title.chars().flat_map(|c| {
        let swapped: Vec<char> = if c.is_uppercase() {
            c.to_lowercase().collect()
        } else {
            c.to_uppercase().collect()
        };
        swapped
    })
}

fn sort_by_title(documents: &mut Vec<Document>) {
    let mut keyed: Vec<(String, Document)> = documents
        .drain(..)
        .map(|doc| (collation_key(&doc.title), doc))
        .collect();

    // Equal keys: lowercase before uppercase, then code points
    keyed.sort_by(|(ka, a), (kb, b)| {
        ka.cmp(kb)
            .then_with(|| case_inverted(&a.title).cmp(case_inverted(&b.title)))
            .then_with(|| a.title.cmp(&b.title))
    });

    documents.extend(keyed.into_iter().map(|(_, doc)| doc));
}
