use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::Meaning;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::ports::meanings::{MeaningsRepository, NewMeaning};
use crate::error::{CoreError, Result, map_unique_violation};
use crate::query::{ListQuery, MeaningFilters, MeaningSort, Sort};

const MEANING_COLUMNS: &str = "m.id, m.text, m.vocab_id, l.code AS language, \
     u.username AS added_by, m.added_on, \
     (SELECT COUNT(*) FROM map_learner_meaning x WHERE x.meaning_id = m.id) \
     AS learners_count";

const MEANINGS_FROM: &str = " FROM meanings m \
     JOIN languages l ON l.id = m.language_id \
     LEFT JOIN profiles p ON p.id = m.added_by_id \
     LEFT JOIN users u ON u.id = p.user_id \
     WHERE TRUE";

#[derive(Debug, FromRow)]
struct MeaningRow {
    id: Uuid,
    text: String,
    vocab_id: Uuid,
    language: String,
    added_by: Option<String>,
    added_on: DateTime<Utc>,
    learners_count: i64,
}

impl From<MeaningRow> for Meaning {
    fn from(row: MeaningRow) -> Self {
        Meaning {
            id: row.id,
            text: row.text,
            vocab_id: row.vocab_id,
            language: row.language,
            added_by: row.added_by,
            added_on: row.added_on,
            learners_count: row.learners_count,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PostgresMeaningsRepository {
    pool: PgPool,
}

impl PostgresMeaningsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MeaningsRepository for PostgresMeaningsRepository {
    async fn list_meanings(
        &self,
        filters: &MeaningFilters,
        sort: Sort<MeaningSort>,
    ) -> Result<Vec<Meaning>> {
        let query = ListQuery {
            select: MEANING_COLUMNS,
            from: MEANINGS_FROM,
            filters,
            sort,
        };
        let rows: Vec<MeaningRow> = query.fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(Meaning::from).collect())
    }

    async fn get_meaning(&self, id: Uuid) -> Result<Option<Meaning>> {
        let row: Option<MeaningRow> = sqlx::query_as(&format!(
            "SELECT {MEANING_COLUMNS}{MEANINGS_FROM} AND m.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Meaning::from))
    }

    async fn get_or_create_meaning(
        &self,
        meaning: &NewMeaning,
    ) -> Result<(Meaning, bool)> {
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO meanings (id, text, vocab_id, language_id, added_by_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (vocab_id, language_id, text) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&meaning.text)
        .bind(meaning.vocab_id)
        .bind(meaning.language_id)
        .bind(meaning.added_by)
        .fetch_optional(self.pool())
        .await?;

        let (id, created) = match inserted {
            Some(id) => {
                info!("Created meaning {} for vocab {}", id, meaning.vocab_id);
                (id, true)
            }
            None => {
                let id: Uuid = sqlx::query_scalar(
                    r#"
                    SELECT id FROM meanings
                    WHERE vocab_id = $1 AND language_id = $2 AND text = $3
                    "#,
                )
                .bind(meaning.vocab_id)
                .bind(meaning.language_id)
                .bind(&meaning.text)
                .fetch_one(self.pool())
                .await?;
                (id, false)
            }
        };

        let found = self
            .get_meaning(id)
            .await?
            .ok_or_else(|| CoreError::Internal("Meaning vanished".into()))?;
        Ok((found, created))
    }

    async fn save_learner_meaning(
        &self,
        learner: Uuid,
        meaning_id: Uuid,
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO map_learner_vocab (learner_id, vocab_id, level)
            SELECT $1, m.vocab_id, 0 FROM meanings m WHERE m.id = $2
            ON CONFLICT (learner_id, vocab_id) DO NOTHING
            "#,
        )
        .bind(learner)
        .bind(meaning_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO map_learner_meaning (learner_id, meaning_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(learner)
        .bind(meaning_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &[("map_learner_meaning_pkey", "Meaning already saved")],
                "Failed to save meaning",
            )
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_learner_meaning(
        &self,
        learner: Uuid,
        meaning_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM map_learner_meaning WHERE learner_id = $1 AND meaning_id = $2",
        )
        .bind(learner)
        .bind(meaning_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
