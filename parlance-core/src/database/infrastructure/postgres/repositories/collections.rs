use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::{Collection, Page, Text};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::texts::{TEXTS_FROM, TextColumns, TextRow};
use crate::database::ports::collections::{
    CollectionChanges, CollectionRecord, CollectionsRepository, NewCollection,
};
use crate::error::{CoreError, Result, map_unique_violation};
use crate::privacy::push_text_visibility;
use crate::query::{
    CollectionFilters, CollectionSort, ListQuery, ListRequest,
    builder::Projection,
};

const COLLECTION_COLUMNS: &str = "c.id, c.title, c.description, c.image, \
     l.code AS language, c.language_id, c.is_public, \
     u.username AS added_by, c.added_by_id, c.added_on, \
     COALESCE(( \
         SELECT AVG(per_text.viewers) FROM ( \
             SELECT COUNT(DISTINCT pv.past_viewer_id) AS viewers \
             FROM texts ct \
             LEFT JOIN map_past_viewer_text pv ON pv.text_id = ct.id \
             WHERE ct.collection_id = c.id \
             GROUP BY ct.id \
         ) per_text \
     ), 0)::float8 AS avg_past_viewers_count_per_text";

const COLLECTIONS_FROM: &str = " FROM collections c \
     JOIN languages l ON l.id = c.language_id \
     JOIN profiles p ON p.id = c.added_by_id \
     JOIN users u ON u.id = p.user_id \
     WHERE TRUE";

#[derive(Debug, Clone, Copy)]
struct CollectionColumns {
    viewer: Option<Uuid>,
}

impl Projection for CollectionColumns {
    fn push_select<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(COLLECTION_COLUMNS);
        qb.push(
            ", EXISTS (SELECT 1 FROM map_bookmarker_collection bc \
             WHERE bc.collection_id = c.id AND bc.bookmarker_id = ",
        );
        qb.push_bind(self.viewer);
        qb.push(") AS is_bookmarked");
    }
}

#[derive(Debug, FromRow)]
struct CollectionRow {
    id: Uuid,
    title: String,
    description: String,
    image: String,
    language: String,
    language_id: Uuid,
    is_public: bool,
    added_by: String,
    added_by_id: Uuid,
    added_on: DateTime<Utc>,
    avg_past_viewers_count_per_text: f64,
    is_bookmarked: bool,
}

impl CollectionRow {
    fn into_record(self) -> CollectionRecord {
        CollectionRecord {
            language_id: self.language_id,
            author_profile_id: self.added_by_id,
            collection: Collection {
                id: self.id,
                title: self.title,
                description: self.description,
                image: self.image,
                language: self.language,
                is_public: self.is_public,
                added_by: self.added_by,
                added_on: self.added_on,
                avg_past_viewers_count_per_text: self
                    .avg_past_viewers_count_per_text,
                is_bookmarked: self.is_bookmarked,
                texts: None,
            },
        }
    }
}

/// `texts_order` must name every text of the collection exactly once.
pub(crate) fn is_permutation(current: &[Uuid], proposed: &[Uuid]) -> bool {
    if current.len() != proposed.len() {
        return false;
    }
    let mut current = current.to_vec();
    let mut proposed = proposed.to_vec();
    current.sort_unstable();
    proposed.sort_unstable();
    current == proposed
}

#[derive(Clone, Debug)]
pub struct PostgresCollectionsRepository {
    pool: PgPool,
}

impl PostgresCollectionsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CollectionsRepository for PostgresCollectionsRepository {
    async fn list_collections(
        &self,
        request: &ListRequest<CollectionFilters, CollectionSort>,
    ) -> Result<Page<Collection>> {
        let query = ListQuery {
            select: CollectionColumns {
                viewer: request.filters.viewer,
            },
            from: COLLECTIONS_FROM,
            filters: &request.filters,
            sort: request.sort,
        };
        let page: Page<CollectionRow> =
            query.fetch_page(self.pool(), request.pagination).await?;
        Ok(page.map(|row| row.into_record().collection))
    }

    async fn get_collection(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<CollectionRecord>> {
        let columns = CollectionColumns { viewer };
        let mut qb = QueryBuilder::new("SELECT ");
        columns.push_select(&mut qb);
        qb.push(COLLECTIONS_FROM);
        qb.push(" AND c.id = ");
        qb.push_bind(id);

        let row: Option<CollectionRow> =
            qb.build_query_as().fetch_optional(self.pool()).await?;
        Ok(row.map(CollectionRow::into_record))
    }

    async fn get_collection_texts(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<Text>> {
        let columns = TextColumns::for_viewer(viewer);
        let mut qb = QueryBuilder::new("SELECT ");
        columns.push_select(&mut qb);
        qb.push(TEXTS_FROM);
        qb.push(" AND t.collection_id = ");
        qb.push_bind(id);
        push_text_visibility(&mut qb, "t", "c", viewer);
        qb.push(" ORDER BY t.order_in_collection ASC, t.id ASC");

        let rows: Vec<TextRow> =
            qb.build_query_as().fetch_all(self.pool()).await?;
        rows.into_iter().map(TextRow::into_text).collect()
    }

    async fn create_collection(
        &self,
        collection: &NewCollection,
    ) -> Result<Collection> {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO collections (
                id, title, description, image, language_id, added_by_id,
                is_public
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&collection.title)
        .bind(&collection.description)
        .bind(&collection.image)
        .bind(collection.language_id)
        .bind(collection.added_by)
        .bind(collection.is_public)
        .execute(self.pool())
        .await?;

        info!("Created collection {} ({})", collection.title, id);
        self.get_collection(id, Some(collection.added_by))
            .await?
            .map(|record| record.collection)
            .ok_or_else(|| {
                CoreError::Internal("Created collection vanished".into())
            })
    }

    async fn update_collection(
        &self,
        id: Uuid,
        changes: &CollectionChanges,
        viewer: Uuid,
    ) -> Result<Collection> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE collections SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                image = COALESCE($4, image),
                is_public = COALESCE($5, is_public)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.image.as_deref())
        .bind(changes.is_public)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Collection not found"));
        }

        if let Some(order) = &changes.texts_order {
            let current: Vec<Uuid> = sqlx::query_scalar(
                "SELECT id FROM texts WHERE collection_id = $1 FOR UPDATE",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            if !is_permutation(&current, order) {
                return Err(CoreError::field(
                    "textsOrder",
                    "Must list each text of the collection exactly once",
                ));
            }

            sqlx::query(
                r#"
                UPDATE texts SET order_in_collection = (x.position - 1)::int
                FROM UNNEST($2::uuid[]) WITH ORDINALITY AS x(text_id, position)
                WHERE texts.id = x.text_id AND texts.collection_id = $1
                "#,
            )
            .bind(id)
            .bind(order.as_slice())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Updated collection {}", id);

        self.get_collection(id, Some(viewer))
            .await?
            .map(|record| record.collection)
            .ok_or_else(|| CoreError::not_found("Collection not found"))
    }

    async fn delete_collection(&self, id: Uuid, cascade_texts: bool) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        let detach_or_delete = if cascade_texts {
            sqlx::query("DELETE FROM texts WHERE collection_id = $1")
        } else {
            sqlx::query(
                r#"
                UPDATE texts SET collection_id = NULL, order_in_collection = NULL
                WHERE collection_id = $1
                "#,
            )
        };
        let texts = detach_or_delete
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Collection not found"));
        }

        tx.commit().await?;
        info!(
            "Deleted collection {} ({} texts {})",
            id,
            texts,
            if cascade_texts { "deleted" } else { "detached" }
        );
        Ok(())
    }

    async fn bookmark_collection(
        &self,
        bookmarker: Uuid,
        collection_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO map_bookmarker_collection (bookmarker_id, collection_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(bookmarker)
        .bind(collection_id)
        .execute(self.pool())
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &[(
                    "map_bookmarker_collection_pkey",
                    "Collection already bookmarked",
                )],
                "Failed to bookmark collection",
            )
        })?;
        Ok(())
    }

    async fn remove_collection_bookmark(
        &self,
        bookmarker: Uuid,
        collection_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM map_bookmarker_collection
            WHERE bookmarker_id = $1 AND collection_id = $2
            "#,
        )
        .bind(bookmarker)
        .bind(collection_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_requires_same_members() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let c = Uuid::now_v7();
        assert!(is_permutation(&[a, b, c], &[c, a, b]));
        assert!(!is_permutation(&[a, b, c], &[a, b]));
        assert!(!is_permutation(&[a, b], &[a, a]));
        assert!(!is_permutation(&[a, b], &[a, c]));
        assert!(is_permutation(&[], &[]));
    }
}
