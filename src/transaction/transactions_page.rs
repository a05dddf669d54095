//! The transactions list and search pages.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::get_all_categories,
    currency::CurrencyConfig,
    endpoints,
    pagination::PaginationConfig,
};

use super::{
    form::{TransactionForm, TransactionFormValues},
    notice::Notice,
    query::{SearchParams, TransactionFilter, list_transactions, parse_page},
    store::SQLiteTransactionStore,
    validation::ValidationErrors,
    view::{Listing, TransactionsView, transactions_view},
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to display pages of transactions.
    pub pagination_config: PaginationConfig,
    pub currency_config: CurrencyConfig,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
            currency_config: state.currency_config.clone(),
        }
    }
}

/// The query string of the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsParams {
    pub page: Option<String>,
    /// Which change to report, see [Notice].
    pub notice: Option<String>,
    pub id: Option<String>,
}

/// Render a page of all transactions, newest first.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Query(params): Query<TransactionsParams>,
) -> Result<Response, Error> {
    let page = match params.page.as_deref() {
        None => state.pagination_config.default_page,
        page => parse_page(page),
    };
    let notice = Notice::from_params(
        params.notice.as_deref(),
        params.id.as_deref().and_then(|id| id.trim().parse().ok()),
    );

    render_listing(&state, Listing::All, page, notice)
}

/// Render a page of the transactions matching the search parameters.
///
/// Redirects to the transactions page when no search criteria are given.
pub async fn get_search_page(
    State(state): State<TransactionsPageState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, Error> {
    let filter = params.filter();

    if filter.is_empty() {
        return Ok(Redirect::to(endpoints::TRANSACTIONS_VIEW).into_response());
    }

    render_listing(&state, Listing::Search(&filter), params.page(), None)
}

fn render_listing(
    state: &TransactionsPageState,
    listing: Listing<'_>,
    page: u64,
    notice: Option<Notice>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let store = SQLiteTransactionStore::new(&connection);

    let all_transactions = TransactionFilter::default();
    let filter = listing.filter().unwrap_or(&all_transactions);
    let transactions = list_transactions(
        &store,
        filter,
        page,
        state.pagination_config.default_page_size,
    )
    .inspect_err(|error| tracing::error!("could not list transactions for {filter:?}: {error}"))?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let values = TransactionFormValues::new(&state.currency_config);
    let errors = ValidationErrors::default();

    let view = TransactionsView {
        listing,
        notice,
        form: TransactionForm {
            values: &values,
            errors: &errors,
            categories: &categories,
            currencies: &state.currency_config,
        },
        page: &transactions,
        max_page_indicators: state.pagination_config.max_pages,
    };

    Ok(transactions_view(&view).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{Duration, macros::datetime};

    use crate::{
        category::{Category, CategoryName, create_category},
        currency::CurrencyConfig,
        db::initialize,
        pagination::PaginationConfig,
        test_utils::{
            assert_content_type, assert_status_ok, assert_valid_html, get_header,
            parse_html_document,
        },
        transaction::{
            NewTransaction, SQLiteTransactionStore, TransactionStore, query::SearchParams,
        },
    };

    use super::{TransactionsPageState, TransactionsParams, get_search_page, get_transactions_page};

    fn get_state() -> (TransactionsPageState, Category, Category) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let food = create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
        let rent = create_category(CategoryName::new_unchecked("Rent"), &connection).unwrap();

        let state = TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig::default(),
            currency_config: CurrencyConfig::default(),
        };

        (state, food, rent)
    }

    fn insert_many(state: &TransactionsPageState, count: i64, category: &Category) {
        let connection = state.db_connection.lock().unwrap();
        let store = SQLiteTransactionStore::new(&connection);
        let start = datetime!(2025-01-01 9:00);

        for i in 0..count {
            store
                .insert(NewTransaction {
                    amount: 10.0 + i as f64,
                    date: start + Duration::days(i),
                    currency: "USD".to_owned(),
                    description: format!("Transaction number {i}"),
                    category_id: category.id,
                })
                .unwrap();
        }
    }

    fn row_count(html: &scraper::Html) -> usize {
        html.select(&Selector::parse("tbody tr[data-transaction-id]").unwrap())
            .count()
    }

    fn params(page: &str) -> TransactionsParams {
        TransactionsParams {
            page: Some(page.to_owned()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn pages_through_transactions() {
        let (state, food, _) = get_state();
        insert_many(&state, 45, &food);

        let first = get_transactions_page(State(state.clone()), Query(params("1")))
            .await
            .unwrap();
        assert_status_ok(&first);
        assert_content_type(&first, "text/html; charset=utf-8");
        let first = parse_html_document(first).await;
        assert_valid_html(&first);
        assert_eq!(row_count(&first), 20);

        let third = get_transactions_page(State(state.clone()), Query(params("3")))
            .await
            .unwrap();
        assert_eq!(row_count(&parse_html_document(third).await), 5);

        let fourth = get_transactions_page(State(state), Query(params("4")))
            .await
            .unwrap();
        let fourth = parse_html_document(fourth).await;
        assert_eq!(row_count(&fourth), 0);
        let last_page_link = fourth
            .select(&Selector::parse("nav.pagination a:not([role])").unwrap())
            .last()
            .map(|link| link.text().collect::<String>());
        assert_eq!(last_page_link.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn shows_notice_from_query() {
        let (state, _, _) = get_state();
        let params = TransactionsParams {
            page: None,
            notice: Some("edited".to_owned()),
            id: Some("12".to_owned()),
        };

        let response = get_transactions_page(State(state), Query(params))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let notice = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No notice found")
            .text()
            .collect::<String>();
        assert!(notice.contains("Successfully edited transaction #12!"));
    }

    #[tokio::test]
    async fn search_without_criteria_redirects() {
        let (state, _, _) = get_state();

        let response = get_search_page(State(state), Query(SearchParams::default()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), "/transactions");
    }

    #[tokio::test]
    async fn search_filters_by_category_and_text() {
        let (state, food, rent) = get_state();
        insert_many(&state, 3, &food);
        insert_many(&state, 2, &rent);
        let params = SearchParams {
            q: Some("number 1".to_owned()),
            category_id: Some(rent.id.to_string()),
            ..Default::default()
        };

        let response = get_search_page(State(state), Query(params)).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(row_count(&html), 1);
        let selected = html
            .select(&Selector::parse("#search-category option[selected]").unwrap())
            .next()
            .map(|option| option.text().collect::<String>());
        assert_eq!(selected.as_deref(), Some("Rent"));
    }
}
