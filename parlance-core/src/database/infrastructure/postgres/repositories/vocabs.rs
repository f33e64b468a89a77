use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::{LearnerVocab, Page, Vocab, VocabLevel};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::try_map_page;
use crate::database::ports::vocabs::{
    LearnerVocabChanges, NewVocab, VocabRecord, VocabsRepository,
};
use crate::error::{CoreError, Result, map_unique_violation};
use crate::query::{
    LearnerVocabFilters, ListQuery, ListRequest, VocabFilters, VocabSort,
};

const VOCAB_COLUMNS: &str = "v.id, v.text, l.code AS language, \
     v.language_id, v.is_phrase, \
     (SELECT COUNT(*) FROM map_learner_vocab x WHERE x.vocab_id = v.id) \
     AS learners_count";

const LEARNER_VOCAB_COLUMNS: &str = "v.id, v.text, l.code AS language, \
     v.language_id, v.is_phrase, \
     (SELECT COUNT(*) FROM map_learner_vocab x WHERE x.vocab_id = v.id) \
     AS learners_count, mv.level, mv.notes, mv.saved_on";

const VOCABS_FROM: &str = " FROM vocabs v \
     JOIN languages l ON l.id = v.language_id WHERE TRUE";

const LEARNER_VOCABS_FROM: &str = " FROM map_learner_vocab mv \
     JOIN vocabs v ON v.id = mv.vocab_id \
     JOIN languages l ON l.id = v.language_id WHERE TRUE";

#[derive(Debug, FromRow)]
struct VocabRow {
    id: Uuid,
    text: String,
    language: String,
    language_id: Uuid,
    is_phrase: bool,
    learners_count: i64,
}

impl VocabRow {
    fn into_record(self) -> VocabRecord {
        VocabRecord {
            language_id: self.language_id,
            vocab: Vocab {
                id: self.id,
                text: self.text,
                language: self.language,
                is_phrase: self.is_phrase,
                learners_count: self.learners_count,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct LearnerVocabRow {
    #[sqlx(flatten)]
    vocab: VocabRow,
    level: i16,
    notes: String,
    saved_on: DateTime<Utc>,
}

impl TryFrom<LearnerVocabRow> for LearnerVocab {
    type Error = CoreError;

    fn try_from(row: LearnerVocabRow) -> Result<Self> {
        let level = VocabLevel::try_from(row.level)
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        let vocab = row.vocab.into_record().vocab;
        Ok(LearnerVocab {
            id: vocab.id,
            text: vocab.text,
            language: vocab.language,
            is_phrase: vocab.is_phrase,
            learners_count: vocab.learners_count,
            level,
            notes: row.notes,
            saved_on: row.saved_on,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PostgresVocabsRepository {
    pool: PgPool,
}

impl PostgresVocabsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VocabsRepository for PostgresVocabsRepository {
    async fn list_vocabs(
        &self,
        request: &ListRequest<VocabFilters, VocabSort>,
    ) -> Result<Page<Vocab>> {
        let query = ListQuery {
            select: VOCAB_COLUMNS,
            from: VOCABS_FROM,
            filters: &request.filters,
            sort: request.sort,
        };
        let page: Page<VocabRow> =
            query.fetch_page(self.pool(), request.pagination).await?;
        Ok(page.map(|row| row.into_record().vocab))
    }

    async fn get_vocab(&self, id: Uuid) -> Result<Option<VocabRecord>> {
        let row: Option<VocabRow> = sqlx::query_as(&format!(
            "SELECT {VOCAB_COLUMNS}{VOCABS_FROM} AND v.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(VocabRow::into_record))
    }

    async fn get_or_create_vocab(
        &self,
        vocab: &NewVocab,
    ) -> Result<(Vocab, bool)> {
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO vocabs (id, text, language_id, is_phrase)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (language_id, text) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&vocab.text)
        .bind(vocab.language_id)
        .bind(vocab.is_phrase)
        .fetch_optional(self.pool())
        .await?;

        let (id, created) = match inserted {
            Some(id) => {
                info!("Created vocab {:?} ({})", vocab.text, id);
                (id, true)
            }
            None => {
                let id: Uuid = sqlx::query_scalar(
                    "SELECT id FROM vocabs WHERE language_id = $1 AND text = $2",
                )
                .bind(vocab.language_id)
                .bind(&vocab.text)
                .fetch_one(self.pool())
                .await?;
                (id, false)
            }
        };

        let record = self
            .get_vocab(id)
            .await?
            .ok_or_else(|| CoreError::Internal("Vocab vanished".into()))?;
        Ok((record.vocab, created))
    }

    async fn list_learner_vocabs(
        &self,
        request: &ListRequest<LearnerVocabFilters, VocabSort>,
    ) -> Result<Page<LearnerVocab>> {
        let query = ListQuery {
            select: LEARNER_VOCAB_COLUMNS,
            from: LEARNER_VOCABS_FROM,
            filters: &request.filters,
            sort: request.sort,
        };
        let page: Page<LearnerVocabRow> =
            query.fetch_page(self.pool(), request.pagination).await?;
        try_map_page(page, LearnerVocab::try_from)
    }

    async fn get_learner_vocab(
        &self,
        learner: Uuid,
        vocab_id: Uuid,
    ) -> Result<Option<LearnerVocab>> {
        let row: Option<LearnerVocabRow> = sqlx::query_as(&format!(
            "SELECT {LEARNER_VOCAB_COLUMNS}{LEARNER_VOCABS_FROM} \
             AND mv.learner_id = $1 AND mv.vocab_id = $2"
        ))
        .bind(learner)
        .bind(vocab_id)
        .fetch_optional(self.pool())
        .await?;
        row.map(LearnerVocab::try_from).transpose()
    }

    async fn save_learner_vocab(
        &self,
        learner: Uuid,
        vocab_id: Uuid,
        level: VocabLevel,
    ) -> Result<LearnerVocab> {
        sqlx::query(
            r#"
            INSERT INTO map_learner_vocab (learner_id, vocab_id, level)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(learner)
        .bind(vocab_id)
        .bind(level.as_i16())
        .execute(self.pool())
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &[("map_learner_vocab_pkey", "Vocab already saved")],
                "Failed to save vocab",
            )
        })?;

        self.get_learner_vocab(learner, vocab_id)
            .await?
            .ok_or_else(|| CoreError::Internal("Saved vocab vanished".into()))
    }

    async fn update_learner_vocab(
        &self,
        learner: Uuid,
        vocab_id: Uuid,
        changes: &LearnerVocabChanges,
    ) -> Result<Option<LearnerVocab>> {
        let result = sqlx::query(
            r#"
            UPDATE map_learner_vocab SET
                level = COALESCE($3, level),
                notes = COALESCE($4, notes)
            WHERE learner_id = $1 AND vocab_id = $2
            "#,
        )
        .bind(learner)
        .bind(vocab_id)
        .bind(changes.level.map(VocabLevel::as_i16))
        .bind(changes.notes.as_deref())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_learner_vocab(learner, vocab_id).await
    }

    async fn delete_learner_vocab(
        &self,
        learner: Uuid,
        vocab_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM map_learner_vocab WHERE learner_id = $1 AND vocab_id = $2",
        )
        .bind(learner)
        .bind(vocab_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn learner_vocabs_in_text(
        &self,
        learner: Uuid,
        text_id: Uuid,
    ) -> Result<Vec<LearnerVocab>> {
        // Parsed text is space-separated normalized words, so padding it with
        // spaces turns a phrase match into a whole-word substring match.
        let rows: Vec<LearnerVocabRow> = sqlx::query_as(&format!(
            "SELECT {LEARNER_VOCAB_COLUMNS}{LEARNER_VOCABS_FROM} \
             AND mv.learner_id = $1 \
             AND EXISTS ( \
                 SELECT 1 FROM texts tx \
                 WHERE tx.id = $2 AND tx.language_id = v.language_id AND ( \
                     (NOT v.is_phrase AND ( \
                         v.text = ANY(string_to_array(tx.parsed_title, ' ')) \
                         OR v.text = ANY(string_to_array(tx.parsed_content, ' ')))) \
                     OR (v.is_phrase AND ( \
                         (' ' || tx.parsed_title || ' ') LIKE ('% ' || v.text || ' %') \
                         OR (' ' || tx.parsed_content || ' ') LIKE ('% ' || v.text || ' %'))) \
                 ) \
             ) \
             ORDER BY v.text ASC, v.id ASC"
        ))
        .bind(learner)
        .bind(text_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(LearnerVocab::try_from).collect()
    }
}
