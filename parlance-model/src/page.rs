#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Builds a page given the total number of matching rows.
    pub fn new(page: u32, page_size: u32, total: u64, data: Vec<T>) -> Self {
        Self {
            page,
            page_size,
            page_count: page_count(total, page_size),
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

pub fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}
