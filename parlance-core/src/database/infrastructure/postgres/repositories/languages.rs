use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::{Language, LearnerLanguage};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::ports::languages::{LanguagesRepository, NewLanguage};
use crate::error::{CoreError, Result, map_unique_violation};
use crate::query::{
    LanguageFilters, LanguageSort, LearnerLanguageFilters, ListQuery, Sort,
};

const LANGUAGE_COLUMNS: &str = "l.id, l.code, l.name, l.greeting, l.flag, \
     l.is_supported, \
     (SELECT COUNT(*) FROM map_learner_language x \
      WHERE x.language_id = l.id) AS learners_count";

const LEARNER_LANGUAGE_COLUMNS: &str = "l.id, l.code, l.name, l.greeting, \
     l.flag, l.is_supported, \
     (SELECT COUNT(*) FROM map_learner_language x \
      WHERE x.language_id = l.id) AS learners_count, \
     ml.started_learning_on, ml.last_opened";

const LANGUAGES_FROM: &str = " FROM languages l WHERE TRUE";

const LEARNER_LANGUAGES_FROM: &str = " FROM map_learner_language ml \
     JOIN languages l ON l.id = ml.language_id WHERE TRUE";

#[derive(Debug, FromRow)]
struct LanguageRow {
    id: Uuid,
    code: String,
    name: String,
    greeting: String,
    flag: Option<String>,
    is_supported: bool,
    learners_count: i64,
}

impl From<LanguageRow> for Language {
    fn from(row: LanguageRow) -> Self {
        Language {
            id: row.id,
            code: row.code,
            name: row.name,
            greeting: row.greeting,
            flag: row.flag,
            is_supported: row.is_supported,
            learners_count: row.learners_count,
        }
    }
}

#[derive(Debug, FromRow)]
struct LearnerLanguageRow {
    #[sqlx(flatten)]
    language: LanguageRow,
    started_learning_on: DateTime<Utc>,
    last_opened: DateTime<Utc>,
}

impl From<LearnerLanguageRow> for LearnerLanguage {
    fn from(row: LearnerLanguageRow) -> Self {
        LearnerLanguage {
            language: row.language.into(),
            started_learning_on: row.started_learning_on,
            last_opened: row.last_opened,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PostgresLanguagesRepository {
    pool: PgPool,
}

impl PostgresLanguagesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn learner_language(
        &self,
        learner: Uuid,
        language_id: Uuid,
    ) -> Result<Option<LearnerLanguage>> {
        let row: Option<LearnerLanguageRow> = sqlx::query_as(&format!(
            "SELECT {LEARNER_LANGUAGE_COLUMNS}{LEARNER_LANGUAGES_FROM} \
             AND ml.learner_id = $1 AND ml.language_id = $2"
        ))
        .bind(learner)
        .bind(language_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(LearnerLanguage::from))
    }
}

#[async_trait]
impl LanguagesRepository for PostgresLanguagesRepository {
    async fn list_languages(
        &self,
        filters: &LanguageFilters,
        sort: Sort<LanguageSort>,
    ) -> Result<Vec<Language>> {
        let query = ListQuery {
            select: LANGUAGE_COLUMNS,
            from: LANGUAGES_FROM,
            filters,
            sort,
        };
        let rows: Vec<LanguageRow> = query.fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(Language::from).collect())
    }

    async fn get_language_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Language>> {
        let row: Option<LanguageRow> = sqlx::query_as(&format!(
            "SELECT {LANGUAGE_COLUMNS}{LANGUAGES_FROM} AND l.code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Language::from))
    }

    async fn create_language(&self, language: &NewLanguage) -> Result<Language> {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO languages (id, code, name, greeting, flag, is_supported)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&language.code)
        .bind(&language.name)
        .bind(&language.greeting)
        .bind(language.flag.as_deref())
        .bind(language.is_supported)
        .execute(self.pool())
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &[("languages_code_key", "Language code already exists")],
                "Failed to create language",
            )
        })?;

        info!("Created language {} ({})", language.name, language.code);
        self.get_language_by_code(&language.code)
            .await?
            .ok_or_else(|| CoreError::Internal("Created language vanished".into()))
    }

    async fn list_learner_languages(
        &self,
        filters: &LearnerLanguageFilters,
        sort: Sort<LanguageSort>,
    ) -> Result<Vec<LearnerLanguage>> {
        let query = ListQuery {
            select: LEARNER_LANGUAGE_COLUMNS,
            from: LEARNER_LANGUAGES_FROM,
            filters,
            sort,
        };
        let rows: Vec<LearnerLanguageRow> = query.fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(LearnerLanguage::from).collect())
    }

    async fn is_learning(&self, learner: Uuid, language_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM map_learner_language
                WHERE learner_id = $1 AND language_id = $2
            )
            "#,
        )
        .bind(learner)
        .bind(language_id)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    async fn add_learner_language(
        &self,
        learner: Uuid,
        language_id: Uuid,
    ) -> Result<LearnerLanguage> {
        sqlx::query(
            r#"
            INSERT INTO map_learner_language (learner_id, language_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(learner)
        .bind(language_id)
        .execute(self.pool())
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &[(
                    "map_learner_language_pkey",
                    "Already learning this language",
                )],
                "Failed to add learner language",
            )
        })?;

        self.learner_language(learner, language_id)
            .await?
            .ok_or_else(|| CoreError::Internal("Learner language vanished".into()))
    }

    async fn touch_learner_language(
        &self,
        learner: Uuid,
        language_id: Uuid,
    ) -> Result<Option<LearnerLanguage>> {
        let result = sqlx::query(
            r#"
            UPDATE map_learner_language SET last_opened = NOW()
            WHERE learner_id = $1 AND language_id = $2
            "#,
        )
        .bind(learner)
        .bind(language_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.learner_language(learner, language_id).await
    }

    async fn remove_learner_language(
        &self,
        learner: Uuid,
        language_id: Uuid,
    ) -> Result<bool> {
        let mut tx = self.pool().begin().await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM map_learner_language
            WHERE learner_id = $1 AND language_id = $2
            "#,
        )
        .bind(learner)
        .bind(language_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let vocabs = sqlx::query(
            r#"
            DELETE FROM map_learner_vocab mv
            USING vocabs v
            WHERE mv.vocab_id = v.id
              AND mv.learner_id = $1
              AND v.language_id = $2
            "#,
        )
        .bind(learner)
        .bind(language_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let meanings = sqlx::query(
            r#"
            DELETE FROM map_learner_meaning lm
            USING meanings m, vocabs v
            WHERE lm.meaning_id = m.id
              AND m.vocab_id = v.id
              AND lm.learner_id = $1
              AND v.language_id = $2
            "#,
        )
        .bind(learner)
        .bind(language_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(
            "Learner {} stopped learning {} ({} vocabs, {} meanings reset)",
            learner, language_id, vocabs, meanings
        );
        Ok(true)
    }
}
