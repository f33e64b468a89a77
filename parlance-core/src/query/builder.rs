use parlance_model::Page;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::params::Pagination;
use super::sort::{Sort, SortKey};
use crate::error::Result;

/// Pushes a resource's WHERE conditions, each starting with ` AND `.
///
/// The same set is pushed into the count and the page query so that totals
/// agree with the rows returned.
pub trait FilterSet {
    fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>);
}

/// Pushes the SELECT list. Projections may bind values, e.g. the viewer
/// for per-viewer flags; those binds precede the filters'.
pub trait Projection {
    fn push_select<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>);
}

impl Projection for &'static str {
    fn push_select<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(*self);
    }
}

/// The pieces of one list query.
///
/// `from` must end in a WHERE clause that filters can extend with ` AND `,
/// e.g. `" FROM texts t ... WHERE TRUE"`.
#[derive(Debug)]
pub struct ListQuery<'q, P, F, K> {
    pub select: P,
    pub from: &'static str,
    pub filters: &'q F,
    pub sort: Sort<K>,
}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%<escaped>%` for case-insensitive substring search.
pub fn contains_pattern(raw: &str) -> String {
    format!("%{}%", escape_like(raw))
}

impl<'q, P, F, K> ListQuery<'q, P, F, K>
where
    P: Projection + Sync,
    F: FilterSet + Sync,
    K: SortKey,
{
    fn count_sql(&self) -> QueryBuilder<'q, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        qb.push(self.from);
        self.filters.push_filters(&mut qb);
        qb
    }

    fn rows_sql<'s>(
        &'s self,
        pagination: Option<Pagination>,
    ) -> QueryBuilder<'s, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        self.select.push_select(&mut qb);
        qb.push(self.from);
        self.filters.push_filters(&mut qb);
        self.sort.push_order_by(&mut qb);
        if let Some(pagination) = pagination {
            qb.push(" LIMIT ");
            qb.push_bind(pagination.limit());
            qb.push(" OFFSET ");
            qb.push_bind(pagination.offset());
        }
        qb
    }

    /// Runs the count query then the page query.
    pub async fn fetch_page<R>(
        &self,
        pool: &PgPool,
        pagination: Pagination,
    ) -> Result<Page<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut count = self.count_sql();
        let total: i64 =
            count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut rows = self.rows_sql(Some(pagination));
        let data = rows.build_query_as::<R>().fetch_all(pool).await?;

        Ok(Page::new(
            pagination.page,
            pagination.page_size,
            u64::try_from(total).unwrap_or_default(),
            data,
        ))
    }

    /// Runs the query unpaginated, for short lists such as languages.
    pub async fn fetch_all<R>(&self, pool: &PgPool) -> Result<Vec<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut rows = self.rows_sql(None);
        Ok(rows.build_query_as::<R>().fetch_all(pool).await?)
    }
}
