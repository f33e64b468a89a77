pub mod collections;
pub mod languages;
pub mod meanings;
pub mod sessions;
pub mod texts;
pub mod users;
pub mod vocabs;

use parlance_model::Page;

use crate::error::Result;

/// Converts page rows whose mapping can fail (e.g. stored enum values).
pub(crate) fn try_map_page<T, U>(
    page: Page<T>,
    f: impl FnMut(T) -> Result<U>,
) -> Result<Page<U>> {
    let data = page.data.into_iter().map(f).collect::<Result<Vec<_>>>()?;
    Ok(Page {
        page: page.page,
        page_size: page.page_size,
        page_count: page.page_count,
        data,
    })
}
