//! Search filters and paged listing of transactions.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, category::CategoryId, endpoints};

use super::{
    core::Transaction,
    store::TransactionStore,
    validation::parse_date,
};

/// Narrows the set of transactions by description text, category and day.
///
/// Every criterion that is set must match. A filter with nothing set matches
/// every transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Text the description must contain, ignoring ASCII case.
    pub text: Option<String>,
    /// The category the transaction must belong to.
    pub category_id: Option<CategoryId>,
    /// The calendar day of the transaction's date.
    pub date: Option<Date>,
}

impl TransactionFilter {
    /// Build a filter from raw query string values.
    ///
    /// Blank values and values that do not parse are ignored rather than
    /// rejected.
    pub fn parse(text: Option<&str>, category_id: Option<&str>, date: Option<&str>) -> Self {
        Self {
            text: text
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned),
            category_id: category_id.and_then(|id| id.trim().parse().ok()),
            date: date.and_then(parse_date),
        }
    }

    /// A filter that matches every transaction in a category.
    pub fn for_category(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            ..Default::default()
        }
    }

    /// Whether the filter matches every transaction.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.category_id.is_none() && self.date.is_none()
    }

    /// The URL of the search page for this filter at `page`.
    pub fn search_url(&self, page: u64) -> String {
        let query = SearchQuery {
            q: self.text.as_deref(),
            category_id: self.category_id,
            date: self.date.map(|date| date.to_string()),
            page,
        };

        match serde_urlencoded::to_string(&query) {
            Ok(query) => format!("{}?{query}", endpoints::SEARCH_VIEW),
            Err(error) => {
                tracing::error!("could not encode search query {self:?}: {error}");
                endpoints::SEARCH_VIEW.to_owned()
            }
        }
    }
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    page: u64,
}

/// The query string of the search page.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
}

impl SearchParams {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter::parse(
            self.q.as_deref(),
            self.category_id.as_deref(),
            self.date.as_deref(),
        )
    }

    pub fn page(&self) -> u64 {
        parse_page(self.page.as_deref())
    }
}

/// Parse a page number, where anything missing, malformed or below one means
/// the first page.
pub(crate) fn parse_page(page: Option<&str>) -> u64 {
    page.and_then(|page| page.trim().parse::<u64>().ok())
        .unwrap_or(1)
        .max(1)
}

/// One page of transactions and the totals needed to page through the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPage {
    /// The transactions on this page.
    pub items: Vec<Transaction>,
    /// The one-based page number.
    pub page: u64,
    /// The most transactions a page can hold.
    pub page_size: u64,
    /// How many transactions match the filter across all pages.
    pub total_count: u64,
    /// Zero when nothing matches.
    pub total_pages: u64,
}

/// Get the `page`-th page of transactions that match `filter`, newest first.
///
/// A page of zero is treated as the first page. A page past the end gives an
/// empty list with the totals still filled in.
pub fn list_transactions(
    store: &impl TransactionStore,
    filter: &TransactionFilter,
    page: u64,
    page_size: u64,
) -> Result<TransactionPage, Error> {
    let page = page.max(1);
    let page_size = page_size.max(1);

    let total_count = store.count(filter)?;
    let offset = (page - 1).saturating_mul(page_size);
    let items = store.query(filter, page_size, offset)?;

    Ok(TransactionPage {
        items,
        page,
        page_size,
        total_count,
        total_pages: total_count.div_ceil(page_size),
    })
}
