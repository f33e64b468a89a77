use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::{LanguageLevel, Page, Text, TextHistoryEntry};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::info;
use uuid::Uuid;

use super::try_map_page;
use crate::database::ports::texts::{
    NewText, TextChanges, TextRecord, TextsRepository,
};
use crate::error::{CoreError, Result, map_unique_violation};
use crate::parsing::parse_text;
use crate::privacy::TextPrivacy;
use crate::query::{
    HistorySort, ListQuery, ListRequest, TextFilters, TextHistoryFilters,
    TextSort, builder::Projection,
};

const TEXT_COLUMNS: &str = "t.id, t.title, t.content, t.audio, t.image, \
     l.code AS language, t.language_id, t.level, t.collection_id, \
     t.order_in_collection, t.is_public, u.username AS added_by, \
     t.added_by_id, t.added_on, c.is_public AS collection_is_public, \
     (SELECT COUNT(DISTINCT pv.past_viewer_id) FROM map_past_viewer_text pv \
      WHERE pv.text_id = t.id) AS past_viewers_count";

pub(crate) const TEXTS_FROM: &str = " FROM texts t \
     JOIN languages l ON l.id = t.language_id \
     JOIN profiles p ON p.id = t.added_by_id \
     JOIN users u ON u.id = p.user_id \
     LEFT JOIN collections c ON c.id = t.collection_id \
     WHERE TRUE";

const HISTORY_FROM: &str = " FROM map_past_viewer_text h \
     JOIN texts t ON t.id = h.text_id \
     JOIN languages l ON l.id = t.language_id \
     JOIN profiles p ON p.id = t.added_by_id \
     JOIN users u ON u.id = p.user_id \
     LEFT JOIN collections c ON c.id = t.collection_id \
     WHERE TRUE";

/// Text columns plus the viewer's bookmark flag.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextColumns {
    pub viewer: Option<Uuid>,
    pub extra: &'static str,
}

impl TextColumns {
    pub(crate) fn for_viewer(viewer: Option<Uuid>) -> Self {
        Self { viewer, extra: "" }
    }
}

impl Projection for TextColumns {
    fn push_select<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(TEXT_COLUMNS);
        qb.push(
            ", EXISTS (SELECT 1 FROM map_bookmarker_text bt \
             WHERE bt.text_id = t.id AND bt.bookmarker_id = ",
        );
        qb.push_bind(self.viewer);
        qb.push(") AS is_bookmarked");
        qb.push(self.extra);
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TextRow {
    id: Uuid,
    title: String,
    content: String,
    audio: String,
    image: String,
    language: String,
    language_id: Uuid,
    level: Option<String>,
    collection_id: Option<Uuid>,
    order_in_collection: Option<i32>,
    is_public: bool,
    added_by: String,
    added_by_id: Uuid,
    added_on: DateTime<Utc>,
    collection_is_public: Option<bool>,
    past_viewers_count: i64,
    is_bookmarked: bool,
}

impl TextRow {
    pub(crate) fn into_record(self) -> Result<TextRecord> {
        let level = self
            .level
            .as_deref()
            .map(str::parse::<LanguageLevel>)
            .transpose()
            .map_err(|e| CoreError::Internal(e.to_string()))?;

        Ok(TextRecord {
            language_id: self.language_id,
            privacy: TextPrivacy {
                is_public: self.is_public,
                author_profile_id: self.added_by_id,
                collection_is_public: self.collection_is_public,
            },
            text: Text {
                id: self.id,
                title: self.title,
                content: self.content,
                audio: self.audio,
                image: self.image,
                language: self.language,
                level,
                collection_id: self.collection_id,
                order_in_collection: self.order_in_collection,
                is_public: self.is_public,
                added_by: self.added_by,
                added_on: self.added_on,
                past_viewers_count: self.past_viewers_count,
                is_bookmarked: self.is_bookmarked,
            },
        })
    }

    pub(crate) fn into_text(self) -> Result<Text> {
        Ok(self.into_record()?.text)
    }
}

#[derive(Debug, FromRow)]
struct TextHistoryRow {
    #[sqlx(flatten)]
    text: TextRow,
    time_viewed: DateTime<Utc>,
}

/// Position of a text inside its collection, if any.
#[derive(Debug, FromRow)]
struct Placement {
    collection_id: Option<Uuid>,
    order_in_collection: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct PostgresTextsRepository {
    pool: PgPool,
}

impl PostgresTextsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Next free slot at the end of a collection. Locks the collection row so
/// concurrent appends serialize.
async fn next_order(
    tx: &mut Transaction<'_, Postgres>,
    collection_id: Uuid,
) -> Result<i32> {
    sqlx::query("SELECT id FROM collections WHERE id = $1 FOR UPDATE")
        .bind(collection_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::not_found("Collection not found"))?;

    let next: i32 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(MAX(order_in_collection) + 1, 0)
        FROM texts WHERE collection_id = $1
        "#,
    )
    .bind(collection_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(next)
}

/// Shifts later texts down by one after a text leaves `collection_id`.
async fn close_gap(
    tx: &mut Transaction<'_, Postgres>,
    collection_id: Uuid,
    order: i32,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE texts SET order_in_collection = order_in_collection - 1
        WHERE collection_id = $1 AND order_in_collection > $2
        "#,
    )
    .bind(collection_id)
    .bind(order)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn lock_placement(
    tx: &mut Transaction<'_, Postgres>,
    text_id: Uuid,
) -> Result<Placement> {
    sqlx::query_as(
        r#"
        SELECT collection_id, order_in_collection
        FROM texts WHERE id = $1 FOR UPDATE
        "#,
    )
    .bind(text_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| CoreError::not_found("Text not found"))
}

#[async_trait]
impl TextsRepository for PostgresTextsRepository {
    async fn list_texts(
        &self,
        request: &ListRequest<TextFilters, TextSort>,
    ) -> Result<Page<Text>> {
        let query = ListQuery {
            select: TextColumns::for_viewer(request.filters.viewer),
            from: TEXTS_FROM,
            filters: &request.filters,
            sort: request.sort,
        };
        let page: Page<TextRow> =
            query.fetch_page(self.pool(), request.pagination).await?;
        try_map_page(page, TextRow::into_text)
    }

    async fn list_text_history(
        &self,
        request: &ListRequest<TextHistoryFilters, HistorySort>,
    ) -> Result<Page<TextHistoryEntry>> {
        let query = ListQuery {
            select: TextColumns {
                viewer: Some(request.filters.past_viewer),
                extra: ", h.time_viewed",
            },
            from: HISTORY_FROM,
            filters: &request.filters,
            sort: request.sort,
        };
        let page: Page<TextHistoryRow> =
            query.fetch_page(self.pool(), request.pagination).await?;
        try_map_page(page, |row| {
            Ok(TextHistoryEntry {
                text: row.text.into_text()?,
                time_viewed: row.time_viewed,
            })
        })
    }

    async fn get_text(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<TextRecord>> {
        let columns = TextColumns::for_viewer(viewer);
        let mut qb = QueryBuilder::new("SELECT ");
        columns.push_select(&mut qb);
        qb.push(TEXTS_FROM);
        qb.push(" AND t.id = ");
        qb.push_bind(id);

        let row: Option<TextRow> =
            qb.build_query_as().fetch_optional(self.pool()).await?;
        row.map(TextRow::into_record).transpose()
    }

    async fn create_text(&self, text: &NewText, viewer: Uuid) -> Result<Text> {
        let mut tx = self.pool().begin().await?;
        let id = Uuid::now_v7();

        let order = match text.collection_id {
            Some(collection_id) => Some(next_order(&mut tx, collection_id).await?),
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO texts (
                id, title, content, parsed_title, parsed_content, audio, image,
                language_id, collection_id, order_in_collection, level,
                is_public, added_by_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id)
        .bind(&text.title)
        .bind(&text.content)
        .bind(parse_text(&text.title).normalized)
        .bind(parse_text(&text.content).normalized)
        .bind(&text.audio)
        .bind(&text.image)
        .bind(text.language_id)
        .bind(text.collection_id)
        .bind(order)
        .bind(text.level.map(|level| level.as_str()))
        .bind(text.is_public)
        .bind(text.added_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Created text {} ({})", text.title, id);

        self.get_text(id, Some(viewer))
            .await?
            .map(|record| record.text)
            .ok_or_else(|| CoreError::Internal("Created text vanished".into()))
    }

    async fn update_text(
        &self,
        id: Uuid,
        changes: &TextChanges,
        viewer: Uuid,
    ) -> Result<Text> {
        let mut tx = self.pool().begin().await?;
        let current = lock_placement(&mut tx, id).await?;

        let (collection_id, order) = match changes.collection_id {
            Some(target) if target != current.collection_id => {
                if let (Some(old), Some(old_order)) =
                    (current.collection_id, current.order_in_collection)
                {
                    close_gap(&mut tx, old, old_order).await?;
                }
                match target {
                    Some(new) => (Some(new), Some(next_order(&mut tx, new).await?)),
                    None => (None, None),
                }
            }
            _ => (current.collection_id, current.order_in_collection),
        };

        let (set_level, level) = match changes.level {
            Some(level) => (true, level.map(|l| l.as_str())),
            None => (false, None),
        };

        sqlx::query(
            r#"
            UPDATE texts SET
                title = COALESCE($2, title),
                parsed_title = COALESCE($3, parsed_title),
                content = COALESCE($4, content),
                parsed_content = COALESCE($5, parsed_content),
                audio = COALESCE($6, audio),
                image = COALESCE($7, image),
                is_public = COALESCE($8, is_public),
                level = CASE WHEN $9 THEN $10 ELSE level END,
                collection_id = $11,
                order_in_collection = $12
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.title.as_deref().map(|t| parse_text(t).normalized))
        .bind(changes.content.as_deref())
        .bind(changes.content.as_deref().map(|c| parse_text(c).normalized))
        .bind(changes.audio.as_deref())
        .bind(changes.image.as_deref())
        .bind(changes.is_public)
        .bind(set_level)
        .bind(level)
        .bind(collection_id)
        .bind(order)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Updated text {}", id);

        self.get_text(id, Some(viewer))
            .await?
            .map(|record| record.text)
            .ok_or_else(|| CoreError::not_found("Text not found"))
    }

    async fn delete_text(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        let placement = lock_placement(&mut tx, id).await?;

        sqlx::query("DELETE FROM texts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let (Some(collection_id), Some(order)) =
            (placement.collection_id, placement.order_in_collection)
        {
            close_gap(&mut tx, collection_id, order).await?;
        }

        tx.commit().await?;
        info!("Deleted text {}", id);
        Ok(())
    }

    async fn record_view(&self, viewer: Uuid, text_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO map_past_viewer_text (id, past_viewer_id, text_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(viewer)
        .bind(text_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn bookmark_text(&self, bookmarker: Uuid, text_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO map_bookmarker_text (bookmarker_id, text_id) VALUES ($1, $2)",
        )
        .bind(bookmarker)
        .bind(text_id)
        .execute(self.pool())
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &[("map_bookmarker_text_pkey", "Text already bookmarked")],
                "Failed to bookmark text",
            )
        })?;
        Ok(())
    }

    async fn remove_text_bookmark(
        &self,
        bookmarker: Uuid,
        text_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM map_bookmarker_text WHERE bookmarker_id = $1 AND text_id = $2",
        )
        .bind(bookmarker)
        .bind(text_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn hide_text(&self, hider: Uuid, text_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO map_hider_text (hider_id, text_id) VALUES ($1, $2)",
        )
        .bind(hider)
        .bind(text_id)
        .execute(self.pool())
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &[("map_hider_text_pkey", "Text already hidden")],
                "Failed to hide text",
            )
        })?;
        Ok(())
    }

    async fn unhide_text(&self, hider: Uuid, text_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM map_hider_text WHERE hider_id = $1 AND text_id = $2",
        )
        .bind(hider)
        .bind(text_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
