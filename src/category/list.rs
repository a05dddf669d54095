//! Read-only category listings: an HTML page and the JSON lookups used to
//! populate selection inputs.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    currency::CurrencyConfig,
    endpoints,
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    transaction::TransactionFilter,
};

use super::{Category, CategoryId, count_transactions_per_category, get_all_categories};

/// The state needed for listing categories.
#[derive(Debug, Clone)]
pub struct CategoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

struct CategoryRow {
    category: Category,
    transaction_count: u64,
    search_url: String,
}

/// Render the categories page with the number of transactions in each.
pub async fn get_categories_page(State(state): State<CategoriesState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let counts = count_transactions_per_category(&connection).inspect_err(|error| {
        tracing::error!("Could not count transactions per category: {error}")
    })?;

    let rows = categories
        .into_iter()
        .map(|category| CategoryRow {
            transaction_count: counts.get(&category.id).copied().unwrap_or(0),
            search_url: TransactionFilter::for_category(category.id).search_url(1),
            category,
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

#[derive(Debug, Serialize)]
struct CategoryOption {
    id: CategoryId,
    name: String,
}

/// List the categories as `{id, name}` pairs ordered by name.
pub async fn get_categories_json(
    State(state): State<CategoriesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let options = get_all_categories(&connection)?
        .into_iter()
        .map(|category| CategoryOption {
            id: category.id,
            name: category.name.to_string(),
        })
        .collect::<Vec<_>>();

    Ok(Json(options).into_response())
}

/// List the allowed currency codes and the default code.
pub async fn get_currencies_json(State(currencies): State<CurrencyConfig>) -> Response {
    Json(currencies).into_response()
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-3xl"
            {
                h1 class="text-xl font-bold" { "Categories" }

                table class="w-full text-sm text-left rtl:text-right
                    text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                        }
                    }

                    tbody
                    {
                        @for row in rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    span class=(CATEGORY_BADGE_STYLE) { (row.category.name) }
                                }

                                td class=(TABLE_CELL_STYLE)
                                {
                                    a href=(row.search_url) class=(LINK_STYLE)
                                    {
                                        (row.transaction_count)
                                    }
                                }
                            }
                        }

                        @if rows.is_empty() {
                            tr
                            {
                                td
                                    colspan="2"
                                    class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                {
                                    "No categories yet."
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;
    use serde_json::{Value, json};

    use crate::{
        category::{CategoryName, create_category},
        currency::CurrencyConfig,
        db::initialize,
        test_utils::{assert_content_type, assert_valid_html, parse_html_document},
    };

    use super::{CategoriesState, get_categories_json, get_categories_page, get_currencies_json};

    fn get_state() -> CategoriesState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CategoriesState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");
        serde_json::from_slice(&bytes).expect("Could not parse response body as JSON")
    }

    #[tokio::test]
    async fn page_lists_categories_with_links_to_search() {
        let state = get_state();
        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = get_categories_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let link = html
            .select(&Selector::parse("tbody a").unwrap())
            .next()
            .expect("No link to the category's transactions");
        assert_eq!(
            link.value().attr("href"),
            Some(format!("/transactions/search?category_id={}&page=1", category.id).as_str())
        );
        assert_eq!(link.text().collect::<String>().trim(), "0");
    }

    #[tokio::test]
    async fn json_lists_id_name_pairs() {
        let state = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_category(CategoryName::new_unchecked("Rent"), &connection).unwrap();
            create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
        }

        let response = get_categories_json(State(state)).await.unwrap();

        assert_eq!(
            body_json(response).await,
            json!([{"id": 2, "name": "Food"}, {"id": 1, "name": "Rent"}])
        );
    }

    #[tokio::test]
    async fn currencies_json_includes_default() {
        let response = get_currencies_json(State(CurrencyConfig::default())).await;

        assert_eq!(
            body_json(response).await,
            json!({"codes": ["USD", "EUR", "GBP"], "default": "USD"})
        );
    }
}
