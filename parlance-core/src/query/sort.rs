use sqlx::{Postgres, QueryBuilder};

use crate::validation::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A sortable field of one resource.
///
/// `expression` and `tie_breakers` are SQL fragments resolved against the
/// resource's projection; they never contain user input.
pub trait SortKey: Copy + Send + Sync + 'static {
    /// Wire name → key.
    const FIELDS: &'static [(&'static str, Self)];
    /// Column that makes the ordering total.
    const ID_COLUMN: &'static str;

    fn default_key() -> Self;

    fn default_order() -> SortOrder {
        SortOrder::Asc
    }

    fn expression(self) -> &'static str;

    /// Applied ascending after the primary expression.
    fn tie_breakers(self) -> &'static [&'static str] {
        &[]
    }

    /// Rows without a value sort last in either direction.
    fn nulls_last(self) -> bool {
        false
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::FIELDS
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, key)| *key)
    }

    fn field_names() -> String {
        Self::FIELDS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub order: SortOrder,
}

impl<K: SortKey> Default for Sort<K> {
    fn default() -> Self {
        Self {
            key: K::default_key(),
            order: K::default_order(),
        }
    }
}

impl<K: SortKey> Sort<K> {
    pub fn new(key: K, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Reads `sortBy`/`sortOrder`, recording field errors for unknown values.
    pub fn parse(
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        errors: &mut FieldErrors,
    ) -> Self {
        let mut sort = Self::default();
        if let Some(raw) = sort_by {
            match K::parse(raw) {
                Some(key) => sort.key = key,
                None => errors.add(
                    "sortBy",
                    format!("Must be one of: {}", K::field_names()),
                ),
            }
        }
        if let Some(raw) = sort_order {
            match SortOrder::parse(raw) {
                Some(order) => sort.order = order,
                None => errors.add("sortOrder", "Must be one of: asc, desc"),
            }
        }
        sort
    }

    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" ORDER BY ");
        qb.push(self.key.expression());
        qb.push(" ");
        qb.push(self.order.as_sql());
        if self.key.nulls_last() {
            qb.push(" NULLS LAST");
        }
        for column in self.key.tie_breakers() {
            qb.push(", ");
            qb.push(*column);
            qb.push(" ASC");
        }
        qb.push(", ");
        qb.push(K::ID_COLUMN);
        qb.push(" ASC");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSort {
    Title,
    CreatedDate,
    PastViewersCount,
    /// Position inside a collection; standalone texts sort last.
    OrderInCollection,
}

impl SortKey for TextSort {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("title", TextSort::Title),
        ("createdDate", TextSort::CreatedDate),
        ("pastViewersCount", TextSort::PastViewersCount),
        ("orderInCollection", TextSort::OrderInCollection),
    ];
    const ID_COLUMN: &'static str = "t.id";

    fn default_key() -> Self {
        TextSort::Title
    }

    fn expression(self) -> &'static str {
        match self {
            TextSort::Title => "t.title",
            TextSort::CreatedDate => "t.added_on",
            TextSort::PastViewersCount => "past_viewers_count",
            TextSort::OrderInCollection => "t.order_in_collection",
        }
    }

    fn tie_breakers(self) -> &'static [&'static str] {
        match self {
            TextSort::Title | TextSort::OrderInCollection => &[],
            TextSort::CreatedDate | TextSort::PastViewersCount => &["t.title"],
        }
    }

    fn nulls_last(self) -> bool {
        matches!(self, TextSort::OrderInCollection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySort {
    TimeViewed,
    Title,
    CreatedDate,
    PastViewersCount,
}

impl SortKey for HistorySort {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("timeViewed", HistorySort::TimeViewed),
        ("title", HistorySort::Title),
        ("createdDate", HistorySort::CreatedDate),
        ("pastViewersCount", HistorySort::PastViewersCount),
    ];
    // Several views of one text are distinct rows.
    const ID_COLUMN: &'static str = "h.id";

    fn default_key() -> Self {
        HistorySort::TimeViewed
    }

    fn default_order() -> SortOrder {
        SortOrder::Desc
    }

    fn expression(self) -> &'static str {
        match self {
            HistorySort::TimeViewed => "h.time_viewed",
            HistorySort::Title => "t.title",
            HistorySort::CreatedDate => "t.added_on",
            HistorySort::PastViewersCount => "past_viewers_count",
        }
    }

    fn tie_breakers(self) -> &'static [&'static str] {
        match self {
            HistorySort::Title => &[],
            _ => &["t.title"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionSort {
    Title,
    CreatedDate,
    AvgPastViewersCountPerText,
}

impl SortKey for CollectionSort {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("title", CollectionSort::Title),
        ("createdDate", CollectionSort::CreatedDate),
        (
            "avgPastViewersCountPerText",
            CollectionSort::AvgPastViewersCountPerText,
        ),
    ];
    const ID_COLUMN: &'static str = "c.id";

    fn default_key() -> Self {
        CollectionSort::Title
    }

    fn expression(self) -> &'static str {
        match self {
            CollectionSort::Title => "c.title",
            CollectionSort::CreatedDate => "c.added_on",
            CollectionSort::AvgPastViewersCountPerText => {
                "avg_past_viewers_count_per_text"
            }
        }
    }

    fn tie_breakers(self) -> &'static [&'static str] {
        match self {
            CollectionSort::Title => &[],
            _ => &["c.title"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabSort {
    Text,
    LearnersCount,
}

impl SortKey for VocabSort {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("text", VocabSort::Text),
        ("learnersCount", VocabSort::LearnersCount),
    ];
    const ID_COLUMN: &'static str = "v.id";

    fn default_key() -> Self {
        VocabSort::Text
    }

    fn expression(self) -> &'static str {
        match self {
            VocabSort::Text => "v.text",
            VocabSort::LearnersCount => "learners_count",
        }
    }

    fn tie_breakers(self) -> &'static [&'static str] {
        match self {
            VocabSort::Text => &[],
            VocabSort::LearnersCount => &["v.text"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSort {
    Name,
    LearnersCount,
    LastOpened,
}

impl SortKey for LanguageSort {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("name", LanguageSort::Name),
        ("learnersCount", LanguageSort::LearnersCount),
        ("lastOpened", LanguageSort::LastOpened),
    ];
    const ID_COLUMN: &'static str = "l.id";

    fn default_key() -> Self {
        LanguageSort::Name
    }

    fn expression(self) -> &'static str {
        match self {
            LanguageSort::Name => "l.name",
            LanguageSort::LearnersCount => "learners_count",
            // Only resolvable in learner-language listings.
            LanguageSort::LastOpened => "ml.last_opened",
        }
    }

    fn tie_breakers(self) -> &'static [&'static str] {
        match self {
            LanguageSort::Name => &[],
            _ => &["l.name"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeaningSort {
    LearnersCount,
    Text,
}

impl SortKey for MeaningSort {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("learnersCount", MeaningSort::LearnersCount),
        ("text", MeaningSort::Text),
    ];
    const ID_COLUMN: &'static str = "m.id";

    fn default_key() -> Self {
        MeaningSort::LearnersCount
    }

    fn default_order() -> SortOrder {
        SortOrder::Desc
    }

    fn expression(self) -> &'static str {
        match self {
            MeaningSort::LearnersCount => "learners_count",
            MeaningSort::Text => "m.text",
        }
    }

    fn tie_breakers(self) -> &'static [&'static str] {
        match self {
            MeaningSort::LearnersCount => &["m.text"],
            MeaningSort::Text => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_by<K: SortKey>(sort: Sort<K>) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        sort.push_order_by(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn primary_key_then_tie_breakers_then_id() {
        let sql =
            order_by(Sort::new(TextSort::PastViewersCount, SortOrder::Desc));
        assert_eq!(
            sql,
            " ORDER BY past_viewers_count DESC, t.title ASC, t.id ASC"
        );
    }

    #[test]
    fn title_sort_only_breaks_ties_on_id() {
        let sql = order_by(Sort::<TextSort>::default());
        assert_eq!(sql, " ORDER BY t.title ASC, t.id ASC");
    }

    #[test]
    fn standalone_texts_stay_last_in_both_directions() {
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let sql = order_by(Sort::new(TextSort::OrderInCollection, order));
            assert_eq!(
                sql,
                format!(
                    " ORDER BY t.order_in_collection {} NULLS LAST, t.id ASC",
                    order.as_sql()
                )
            );
        }
    }

    #[test]
    fn history_defaults_to_most_recent_first() {
        let sort = Sort::<HistorySort>::default();
        assert_eq!(sort.key, HistorySort::TimeViewed);
        assert_eq!(sort.order, SortOrder::Desc);
        assert_eq!(
            order_by(sort),
            " ORDER BY h.time_viewed DESC, t.title ASC, h.id ASC"
        );
    }

    #[test]
    fn parse_records_unknown_values() {
        let mut errors = FieldErrors::new();
        let sort = Sort::<VocabSort>::parse(
            Some("popularity"),
            Some("sideways"),
            &mut errors,
        );
        assert_eq!(sort, Sort::default());
        assert_eq!(
            errors.get("sortBy"),
            Some("Must be one of: text, learnersCount")
        );
        assert_eq!(errors.get("sortOrder"), Some("Must be one of: asc, desc"));
    }

    #[test]
    fn parse_accepts_known_values() {
        let mut errors = FieldErrors::new();
        let sort = Sort::<CollectionSort>::parse(
            Some("createdDate"),
            Some("desc"),
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(sort.key, CollectionSort::CreatedDate);
        assert_eq!(sort.order, SortOrder::Desc);
    }
}
