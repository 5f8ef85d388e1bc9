// src/fetcher.rs

//! Paginated article fetching.
//!
//! Pages are pulled lazily: each page is requested only when the consumer has
//! drained the previous one, so peak memory stays around a single page. A
//! failed page ends the stream early and whatever was already yielded stands
//! as a partial result.

use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};

use crate::auth::TokenManager;
use crate::error::{AppError, Result};
use crate::models::{ArticleRecord, EntriesPage};

/// Articles requested per page.
pub const PER_PAGE: u32 = 250;

/// Fetches the remote entries listing page by page.
pub struct ArticleFetcher {
    client: reqwest::Client,
    instance_url: String,
    tokens: Arc<TokenManager>,
}

struct PageCursor {
    /// Last page fetched; 0 before the first request.
    page: u32,
    /// Total pages reported by the server; 1 until the first response so the
    /// loop runs at least once.
    total: u32,
    token: String,
}

impl ArticleFetcher {
    pub fn new(client: reqwest::Client, instance_url: String, tokens: Arc<TokenManager>) -> Self {
        Self {
            client,
            instance_url,
            tokens,
        }
    }

    /// Acquire a token and stream all listed articles in page order.
    ///
    /// A token failure aborts the whole cycle (the error propagates); a page
    /// failure mid-listing is logged and merely truncates the stream.
    pub async fn articles(&self) -> Result<impl Stream<Item = ArticleRecord> + '_> {
        let token = self.tokens.access_token().await?;
        Ok(self.pages(token).flat_map(stream::iter))
    }

    fn pages(&self, token: String) -> impl Stream<Item = Vec<ArticleRecord>> + '_ {
        let cursor = PageCursor {
            page: 0,
            total: 1,
            token,
        };
        stream::unfold(cursor, move |mut cursor| async move {
            if cursor.page >= cursor.total {
                return None;
            }
            cursor.page += 1;
            match self.fetch_page(&cursor.token, cursor.page).await {
                Ok(page) => {
                    cursor.total = page.pages;
                    Some((page.embedded.items, cursor))
                }
                Err(error) => {
                    log::warn!("Fetch stopped at page {}: {}", cursor.page, error);
                    None
                }
            }
        })
    }

    /// Fetch and parse a single listing page.
    async fn fetch_page(&self, token: &str, page: u32) -> Result<EntriesPage> {
        let mut url = url::Url::parse(&format!("{}/api/entries.json", self.instance_url))?;
        url.query_pairs_mut()
            .append_pair("perPage", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api(status.as_u16(), url.to_string()));
        }
        Ok(response.json().await?)
    }
}
