//! Per-resource WHERE conditions.
//!
//! Aliases are fixed per resource: `t` texts, `c` collections, `v` vocabs,
//! `m` meanings, `l` the row's language, `u` the author's user row, `h` a
//! history row, `mv` a learner-vocab row and `ml` a learner-language row.

use parlance_model::{LanguageLevel, VocabLevel};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::builder::{FilterSet, contains_pattern};
use crate::privacy::{push_collection_visibility, push_text_visibility};

fn push_language_code<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    code: &'a Option<String>,
) {
    if let Some(code) = code {
        qb.push(" AND l.code = ");
        qb.push_bind(code.as_str());
    }
}

fn push_added_by<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    username: &'a Option<String>,
) {
    if let Some(username) = username {
        qb.push(" AND LOWER(u.username) = LOWER(");
        qb.push_bind(username.as_str());
        qb.push(")");
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextFilters {
    pub language_code: Option<String>,
    pub added_by: Option<String>,
    /// Raw search input; matched against the title.
    pub search: Option<String>,
    pub levels: Vec<LanguageLevel>,
    pub has_audio: Option<bool>,
    /// Viewer profile, for visibility and per-viewer exclusions.
    pub viewer: Option<Uuid>,
    pub exclude_hidden: bool,
    pub collection_id: Option<Uuid>,
    pub bookmarked_by: Option<Uuid>,
}

impl FilterSet for TextFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        push_text_visibility(qb, "t", "c", self.viewer);
        push_language_code(qb, &self.language_code);
        push_added_by(qb, &self.added_by);

        if let Some(search) = &self.search {
            qb.push(" AND t.title ILIKE ");
            qb.push_bind(contains_pattern(search));
        }
        if !self.levels.is_empty() {
            let levels: Vec<String> = self
                .levels
                .iter()
                .map(|level| level.as_str().to_string())
                .collect();
            qb.push(" AND t.level = ANY(");
            qb.push_bind(levels);
            qb.push(")");
        }
        match self.has_audio {
            Some(true) => {
                qb.push(" AND t.audio <> ''");
            }
            Some(false) => {
                qb.push(" AND t.audio = ''");
            }
            None => {}
        }
        if let Some(collection_id) = self.collection_id {
            qb.push(" AND t.collection_id = ");
            qb.push_bind(collection_id);
        }
        if let Some(viewer) = self.bookmarked_by {
            qb.push(
                " AND EXISTS (SELECT 1 FROM map_bookmarker_text bt \
                 WHERE bt.text_id = t.id AND bt.bookmarker_id = ",
            );
            qb.push_bind(viewer);
            qb.push(")");
        }
        if self.exclude_hidden
            && let Some(viewer) = self.viewer
        {
            qb.push(
                " AND NOT EXISTS (SELECT 1 FROM map_hider_text ht \
                 WHERE ht.text_id = t.id AND ht.hider_id = ",
            );
            qb.push_bind(viewer);
            qb.push(")");
        }
    }
}

/// A learner's reading history, one row per recorded view.
#[derive(Debug, Clone)]
pub struct TextHistoryFilters {
    pub past_viewer: Uuid,
    pub text: TextFilters,
}

impl FilterSet for TextHistoryFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" AND h.past_viewer_id = ");
        qb.push_bind(self.past_viewer);
        self.text.push_filters(qb);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionFilters {
    pub language_code: Option<String>,
    pub added_by: Option<String>,
    /// Matched against title and description.
    pub search: Option<String>,
    pub viewer: Option<Uuid>,
    pub bookmarked_by: Option<Uuid>,
}

impl FilterSet for CollectionFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        push_collection_visibility(qb, "c", self.viewer);
        push_language_code(qb, &self.language_code);
        push_added_by(qb, &self.added_by);

        if let Some(search) = &self.search {
            let pattern = contains_pattern(search);
            qb.push(" AND (c.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR c.description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        if let Some(viewer) = self.bookmarked_by {
            qb.push(
                " AND EXISTS (SELECT 1 FROM map_bookmarker_collection bc \
                 WHERE bc.collection_id = c.id AND bc.bookmarker_id = ",
            );
            qb.push_bind(viewer);
            qb.push(")");
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VocabFilters {
    pub language_code: Option<String>,
    pub search: Option<String>,
}

impl FilterSet for VocabFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        push_language_code(qb, &self.language_code);
        if let Some(search) = &self.search {
            qb.push(" AND v.text ILIKE ");
            qb.push_bind(contains_pattern(search));
        }
    }
}

#[derive(Debug, Clone)]
pub struct LearnerVocabFilters {
    pub learner: Uuid,
    pub language_code: Option<String>,
    pub search: Option<String>,
    pub levels: Vec<VocabLevel>,
}

impl FilterSet for LearnerVocabFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" AND mv.learner_id = ");
        qb.push_bind(self.learner);
        push_language_code(qb, &self.language_code);
        if let Some(search) = &self.search {
            qb.push(" AND v.text ILIKE ");
            qb.push_bind(contains_pattern(search));
        }
        if !self.levels.is_empty() {
            let levels: Vec<i16> =
                self.levels.iter().map(|level| level.as_i16()).collect();
            qb.push(" AND mv.level = ANY(");
            qb.push_bind(levels);
            qb.push(")");
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LanguageFilters {
    pub is_supported: Option<bool>,
}

impl FilterSet for LanguageFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        if let Some(is_supported) = self.is_supported {
            qb.push(" AND l.is_supported = ");
            qb.push_bind(is_supported);
        }
    }
}

#[derive(Debug, Clone)]
pub struct LearnerLanguageFilters {
    pub learner: Uuid,
}

impl FilterSet for LearnerLanguageFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" AND ml.learner_id = ");
        qb.push_bind(self.learner);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeaningFilters {
    pub vocab_id: Option<Uuid>,
    /// Language the meaning is written in.
    pub language_code: Option<String>,
    /// Restricts to meanings this learner saved.
    pub learner: Option<Uuid>,
}

impl FilterSet for MeaningFilters {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        if let Some(vocab_id) = self.vocab_id {
            qb.push(" AND m.vocab_id = ");
            qb.push_bind(vocab_id);
        }
        push_language_code(qb, &self.language_code);
        if let Some(learner) = self.learner {
            qb.push(
                " AND EXISTS (SELECT 1 FROM map_learner_meaning lm \
                 WHERE lm.meaning_id = m.id AND lm.learner_id = ",
            );
            qb.push_bind(learner);
            qb.push(")");
        }
    }
}
