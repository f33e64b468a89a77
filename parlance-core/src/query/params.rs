//! Raw list query-string parameters and their validated form.

use parlance_model::{LanguageLevel, VocabLevel};
use serde::Deserialize;
use uuid::Uuid;

use super::filters::{
    CollectionFilters, LanguageFilters, LearnerLanguageFilters,
    LearnerVocabFilters, MeaningFilters, TextFilters, TextHistoryFilters,
    VocabFilters,
};
use super::sort::{
    CollectionSort, HistorySort, LanguageSort, MeaningSort, Sort, SortKey,
    TextSort, VocabSort,
};
use crate::validation::{FieldErrors, check_language_code};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn parse(
        page: Option<&str>,
        page_size: Option<&str>,
        errors: &mut FieldErrors,
    ) -> Self {
        let mut pagination = Self::default();
        if let Some(raw) = page {
            match raw.trim().parse::<u32>() {
                Ok(value) if value >= 1 => pagination.page = value,
                _ => errors.add("page", "Must be an integer of at least 1"),
            }
        }
        if let Some(raw) = page_size {
            match raw.trim().parse::<u32>() {
                Ok(value) if (1..=MAX_PAGE_SIZE).contains(&value) => {
                    pagination.page_size = value
                }
                _ => errors.add(
                    "pageSize",
                    format!("Must be an integer between 1 and {MAX_PAGE_SIZE}"),
                ),
            }
        }
        pagination
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// A validated list request.
#[derive(Debug, Clone)]
pub struct ListRequest<F, K> {
    pub filters: F,
    pub sort: Sort<K>,
    pub pagination: Pagination,
}

/// Query-string parameters shared by every list endpoint. Each endpoint
/// reads the subset it understands and ignores the rest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub language_code: Option<String>,
    pub added_by: Option<String>,
    pub search_query: Option<String>,
    pub level: Option<String>,
    pub has_audio: Option<String>,
    pub is_supported: Option<String>,
    pub vocab_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn parse_bool(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => {
            errors.add(field, "Must be true or false");
            None
        }
    }
}

/// Splits a comma list, recording an error for any unknown item.
fn parse_list<T>(
    errors: &mut FieldErrors,
    field: &str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Vec<T> {
    let mut items = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match parse(part) {
            Some(item) => items.push(item),
            None => {
                errors.add(field, format!("Unknown value: {part}"));
            }
        }
    }
    items
}

impl ListParams {
    fn sort<K: SortKey>(&self, errors: &mut FieldErrors) -> Sort<K> {
        Sort::parse(
            self.sort_by.as_deref(),
            self.sort_order.as_deref(),
            errors,
        )
    }

    fn pagination(&self, errors: &mut FieldErrors) -> Pagination {
        Pagination::parse(self.page.as_deref(), self.page_size.as_deref(), errors)
    }

    fn language_code(&self, errors: &mut FieldErrors) -> Option<String> {
        let code = self.language_code.as_deref()?;
        check_language_code(errors, "languageCode", code);
        Some(code.to_string())
    }

    fn search(&self) -> Option<String> {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }

    fn added_by(&self) -> Option<String> {
        self.added_by.clone()
    }

    fn text_filters(
        &self,
        errors: &mut FieldErrors,
        viewer: Option<Uuid>,
    ) -> TextFilters {
        let levels = self
            .level
            .as_deref()
            .map(|raw| {
                parse_list(errors, "level", raw, |s| s.parse::<LanguageLevel>().ok())
            })
            .unwrap_or_default();
        let has_audio = self
            .has_audio
            .as_deref()
            .and_then(|raw| parse_bool(errors, "hasAudio", raw));

        TextFilters {
            language_code: self.language_code(errors),
            added_by: self.added_by(),
            search: self.search(),
            levels,
            has_audio,
            viewer,
            ..TextFilters::default()
        }
    }

    fn finish<F, K>(
        errors: FieldErrors,
        filters: F,
        sort: Sort<K>,
        pagination: Pagination,
    ) -> Result<ListRequest<F, K>, FieldErrors> {
        errors.into_result()?;
        Ok(ListRequest {
            filters,
            sort,
            pagination,
        })
    }

    /// `GET /texts`: hidden texts are left out for signed-in viewers.
    pub fn texts(
        &self,
        viewer: Option<Uuid>,
    ) -> Result<ListRequest<TextFilters, TextSort>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut filters = self.text_filters(&mut errors, viewer);
        filters.exclude_hidden = viewer.is_some();
        let sort = self.sort(&mut errors);
        let pagination = self.pagination(&mut errors);
        Self::finish(errors, filters, sort, pagination)
    }

    /// Texts inside one collection.
    pub fn collection_texts(
        &self,
        collection_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<ListRequest<TextFilters, TextSort>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut filters = self.text_filters(&mut errors, viewer);
        filters.collection_id = Some(collection_id);
        let sort = self.sort(&mut errors);
        let pagination = self.pagination(&mut errors);
        Self::finish(errors, filters, sort, pagination)
    }

    pub fn bookmarked_texts(
        &self,
        viewer: Uuid,
    ) -> Result<ListRequest<TextFilters, TextSort>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut filters = self.text_filters(&mut errors, Some(viewer));
        filters.bookmarked_by = Some(viewer);
        let sort = self.sort(&mut errors);
        let pagination = self.pagination(&mut errors);
        Self::finish(errors, filters, sort, pagination)
    }

    pub fn text_history(
        &self,
        viewer: Uuid,
    ) -> Result<ListRequest<TextHistoryFilters, HistorySort>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let text = self.text_filters(&mut errors, Some(viewer));
        let filters = TextHistoryFilters {
            past_viewer: viewer,
            text,
        };
        let sort = self.sort(&mut errors);
        let pagination = self.pagination(&mut errors);
        Self::finish(errors, filters, sort, pagination)
    }

    pub fn collections(
        &self,
        viewer: Option<Uuid>,
    ) -> Result<ListRequest<CollectionFilters, CollectionSort>, FieldErrors>
    {
        let mut errors = FieldErrors::new();
        let filters = CollectionFilters {
            language_code: self.language_code(&mut errors),
            added_by: self.added_by(),
            search: self.search(),
            viewer,
            bookmarked_by: None,
        };
        let sort = self.sort(&mut errors);
        let pagination = self.pagination(&mut errors);
        Self::finish(errors, filters, sort, pagination)
    }

    pub fn bookmarked_collections(
        &self,
        viewer: Uuid,
    ) -> Result<ListRequest<CollectionFilters, CollectionSort>, FieldErrors>
    {
        let mut request = self.collections(Some(viewer))?;
        request.filters.bookmarked_by = Some(viewer);
        Ok(request)
    }

    pub fn vocabs(
        &self,
    ) -> Result<ListRequest<VocabFilters, VocabSort>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let filters = VocabFilters {
            language_code: self.language_code(&mut errors),
            search: self.search(),
        };
        let sort = self.sort(&mut errors);
        let pagination = self.pagination(&mut errors);
        Self::finish(errors, filters, sort, pagination)
    }

    pub fn learner_vocabs(
        &self,
        learner: Uuid,
    ) -> Result<ListRequest<LearnerVocabFilters, VocabSort>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let levels = self
            .level
            .as_deref()
            .map(|raw| {
                parse_list(&mut errors, "level", raw, |s| {
                    s.parse::<i16>()
                        .ok()
                        .and_then(|n| VocabLevel::try_from(n).ok())
                })
            })
            .unwrap_or_default();
        let filters = LearnerVocabFilters {
            learner,
            language_code: self.language_code(&mut errors),
            search: self.search(),
            levels,
        };
        let sort = self.sort(&mut errors);
        let pagination = self.pagination(&mut errors);
        Self::finish(errors, filters, sort, pagination)
    }

    /// Languages are few; they are sorted but never paginated.
    pub fn languages(
        &self,
    ) -> Result<(LanguageFilters, Sort<LanguageSort>), FieldErrors> {
        let mut errors = FieldErrors::new();
        let is_supported = self
            .is_supported
            .as_deref()
            .and_then(|raw| parse_bool(&mut errors, "isSupported", raw));
        let sort: Sort<LanguageSort> = self.sort(&mut errors);
        if sort.key == LanguageSort::LastOpened {
            errors.add("sortBy", "Must be one of: name, learnersCount");
        }
        errors.into_result()?;
        Ok((LanguageFilters { is_supported }, sort))
    }

    pub fn learner_languages(
        &self,
        learner: Uuid,
    ) -> Result<(LearnerLanguageFilters, Sort<LanguageSort>), FieldErrors> {
        let mut errors = FieldErrors::new();
        let sort = self.sort(&mut errors);
        errors.into_result()?;
        Ok((LearnerLanguageFilters { learner }, sort))
    }

    /// Meanings of one vocab, unpaginated.
    pub fn vocab_meanings(
        &self,
        vocab_id: Uuid,
    ) -> Result<(MeaningFilters, Sort<MeaningSort>), FieldErrors> {
        let mut errors = FieldErrors::new();
        let language_code = self.language_code(&mut errors);
        let sort = self.sort(&mut errors);
        errors.into_result()?;
        Ok((
            MeaningFilters {
                vocab_id: Some(vocab_id),
                language_code,
                learner: None,
            },
            sort,
        ))
    }

    /// The learner's saved meanings, optionally narrowed to one vocab.
    pub fn learner_meanings(
        &self,
        learner: Uuid,
    ) -> Result<(MeaningFilters, Sort<MeaningSort>), FieldErrors> {
        let mut errors = FieldErrors::new();
        let vocab_id = self.vocab_id.as_deref().and_then(|raw| {
            match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("vocabId", "Must be a valid id");
                    None
                }
            }
        });
        let sort = self.sort(&mut errors);
        errors.into_result()?;
        Ok((
            MeaningFilters {
                vocab_id,
                language_code: None,
                learner: Some(learner),
            },
            sort,
        ))
    }
}
