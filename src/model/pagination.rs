use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Page size used when neither the query nor the config sets one.
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    page_num: usize,
    page_size: usize,
}

impl Pagination {
    /// Pages are numbered from 1; zero-sized pages are not allowed, nor
    /// pages that start beyond the addressable range.
    pub fn new(page_num: usize, page_size: usize) -> Option<Self> {
        if page_num == 0 || page_size == 0 {
            return None;
        }
        (page_num - 1).checked_mul(page_size)?;
        Some(Self {
            page_num,
            page_size,
        })
    }

    pub fn page_num(&self) -> usize {
        self.page_num
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn skip(&self) -> usize {
        (self.page_num - 1).saturating_mul(self.page_size)
    }

    /// Cut one page out of a full listing.
    pub fn apply<T>(self, items: Vec<T>) -> Paginated<T> {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(self.skip())
            .take(self.page_size)
            .collect();
        Paginated {
            items,
            pagination: self.result(total),
        }
    }

    pub fn result(self, total: usize) -> PaginationResult {
        PaginationResult {
            page_num: self.page_num,
            page_size: self.page_size,
            total,
            total_pages: total.div_ceil(self.page_size),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Pagination {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let default_size = req
            .rocket()
            .state::<Config>()
            .map_or(DEFAULT_PAGE_SIZE, Config::page_size);
        let page_num = if let Ok(page_num) = req.query_value::<usize>("page_num").unwrap_or(Ok(1)) {
            page_num
        } else {
            return request::Outcome::Error((Status::BadRequest, ()));
        };
        let page_size = if let Ok(page_size) = req
            .query_value::<usize>("page_size")
            .unwrap_or(Ok(default_size))
        {
            page_size
        } else {
            return request::Outcome::Error((Status::BadRequest, ()));
        };
        match Self::new(page_num, page_size) {
            Some(pagination) => request::Outcome::Success(pagination),
            None => request::Outcome::Error((Status::BadRequest, ())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page_num: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// One page of a listing plus where it sits in the whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationResult,
}
