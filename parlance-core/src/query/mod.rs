//! Filter, sort and paginate: the layer every list endpoint is built on.
//!
//! A handler turns its query string into a [`ListRequest`] through
//! [`ListParams`], and a repository pairs the request's filters and sort
//! with its own projection in a [`ListQuery`]. The count and the page are
//! then produced from the same filter set.

pub mod builder;
pub mod filters;
pub mod params;
pub mod sort;

pub use builder::{FilterSet, ListQuery, contains_pattern, escape_like};
pub use filters::{
    CollectionFilters, LanguageFilters, LearnerLanguageFilters,
    LearnerVocabFilters, MeaningFilters, TextFilters, TextHistoryFilters,
    VocabFilters,
};
pub use params::{
    DEFAULT_PAGE_SIZE, ListParams, ListRequest, MAX_PAGE_SIZE, Pagination,
};
pub use sort::{
    CollectionSort, HistorySort, LanguageSort, MeaningSort, Sort, SortKey,
    SortOrder, TextSort, VocabSort,
};
