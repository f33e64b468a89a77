//! Visibility rules for collections and texts.
//!
//! A collection is visible when it is public or the viewer authored it. A
//! text is visible when it is public and so is its collection (if any), or
//! when the viewer authored the text. Rows that fail these checks are
//! reported as missing, never as forbidden.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Author/flag facts needed to decide a text's visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPrivacy {
    pub is_public: bool,
    pub author_profile_id: Uuid,
    /// `None` for standalone texts.
    pub collection_is_public: Option<bool>,
}

pub fn collection_visible(
    is_public: bool,
    author_profile_id: Uuid,
    viewer_profile_id: Option<Uuid>,
) -> bool {
    is_public || viewer_profile_id == Some(author_profile_id)
}

pub fn text_visible(text: TextPrivacy, viewer_profile_id: Option<Uuid>) -> bool {
    if viewer_profile_id == Some(text.author_profile_id) {
        return true;
    }
    text.is_public && text.collection_is_public.unwrap_or(true)
}

/// Appends ` AND <visibility>` for a text aliased `text_alias` whose
/// collection is LEFT JOINed as `collection_alias`.
pub fn push_text_visibility<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    text_alias: &str,
    collection_alias: &str,
    viewer_profile_id: Option<Uuid>,
) {
    qb.push(format!(
        " AND (({text_alias}.is_public AND ({collection_alias}.id IS NULL OR {collection_alias}.is_public))"
    ));
    if let Some(viewer) = viewer_profile_id {
        qb.push(format!(" OR {text_alias}.added_by_id = "));
        qb.push_bind(viewer);
    }
    qb.push(")");
}

/// Appends ` AND <visibility>` for a collection aliased `collection_alias`.
pub fn push_collection_visibility<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    collection_alias: &str,
    viewer_profile_id: Option<Uuid>,
) {
    qb.push(format!(" AND ({collection_alias}.is_public"));
    if let Some(viewer) = viewer_profile_id {
        qb.push(format!(" OR {collection_alias}.added_by_id = "));
        qb.push_bind(viewer);
    }
    qb.push(")");
}
