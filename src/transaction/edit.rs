//! The page and endpoint for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    currency::CurrencyConfig,
    database_id::TransactionId,
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

use super::{
    core::Transaction,
    form::{TransactionForm, TransactionFormValues, edit_transaction_form},
    notice::Notice,
    service::{UpdateOutcome, get_transaction, update_transaction},
    store::SQLiteTransactionStore,
    validation::{TransactionInput, ValidationErrors},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    pub currency_config: CurrencyConfig,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            currency_config: state.currency_config.clone(),
        }
    }
}

/// Render the edit form for a transaction.
///
/// htmx requests get just the form so it can be shown in a dialog, other
/// requests get a full page.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionState>,
    HxRequest(is_htmx_request): HxRequest,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };
    let store = SQLiteTransactionStore::new(&connection);

    let result = get_transaction(&store, transaction_id).and_then(|transaction| {
        get_all_categories(&connection).map(|categories| (transaction, categories))
    });

    let (transaction, categories) = match result {
        Ok(found) => found,
        Err(error) if is_htmx_request => return error.into_alert_response(),
        Err(error) => return error.into_response(),
    };

    let values = TransactionFormValues::from_transaction(&transaction);
    let form = edit_dialog(
        transaction.id,
        &TransactionForm {
            values: &values,
            errors: &ValidationErrors::default(),
            categories: &categories,
            currencies: &state.currency_config,
        },
    );

    if is_htmx_request {
        form.into_response()
    } else {
        edit_page(&form).into_response()
    }
}

/// Apply the submitted changes to a transaction.
///
/// Requests sent with `X-Requested-With: XMLHttpRequest` are answered with
/// JSON, other requests are redirected to the transactions page with a
/// notice. Invalid input is answered with the edit form and its errors.
pub async fn update_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    headers: HeaderMap,
    Form(input): Form<TransactionInput>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };
    let store = SQLiteTransactionStore::new(&connection);
    let wants_json = is_xml_http_request(&headers);

    let outcome = match update_transaction(&store, transaction_id, &input, &state.currency_config)
    {
        Ok(outcome) => outcome,
        Err(Error::UpdateMissingTransaction) if wants_json => {
            tracing::debug!("tried to update missing transaction {transaction_id}");
            return (StatusCode::NOT_FOUND, Json(json!({ "success": false }))).into_response();
        }
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            return error.into_alert_response();
        }
    };

    match outcome {
        UpdateOutcome::Updated(transaction) => {
            tracing::info!("updated transaction {}", transaction.id);

            if wants_json {
                Json(json!({ "success": true })).into_response()
            } else {
                (
                    HxRedirect(Notice::Edited(transaction.id).redirect_url()),
                    StatusCode::SEE_OTHER,
                )
                    .into_response()
            }
        }
        UpdateOutcome::Rejected { original, errors } if wants_json => {
            tracing::debug!("rejected changes to transaction {}: {errors}", original.id);
            let errors = errors
                .iter()
                .map(|error| json!({ "field": error.field.name(), "message": error.message }))
                .collect::<Vec<_>>();

            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "success": false, "errors": errors })),
            )
                .into_response()
        }
        UpdateOutcome::Rejected { original, errors } => {
            tracing::debug!("rejected changes to transaction {}: {errors}", original.id);

            match get_all_categories(&connection) {
                Ok(categories) => {
                    rejected_form(&original, &input, &errors, &categories, &state.currency_config)
                        .into_response()
                }
                Err(error) => {
                    tracing::error!("Failed to retrieve categories: {error}");
                    error.into_alert_response()
                }
            }
        }
    }
}

fn is_xml_http_request(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"XMLHttpRequest"))
}

/// The edit form for a rejected update, showing what was submitted.
///
/// The category always comes from the saved transaction since it cannot be
/// changed.
fn rejected_form(
    original: &Transaction,
    input: &TransactionInput,
    errors: &ValidationErrors,
    categories: &[Category],
    currencies: &CurrencyConfig,
) -> Markup {
    let mut values = TransactionFormValues::from_input(input, currencies);
    values.category_id = Some(original.category_id);
    if values.date.is_empty() {
        values.date = TransactionFormValues::from_transaction(original).date;
    }

    edit_transaction_form(
        original.id,
        &TransactionForm {
            values: &values,
            errors,
            categories,
            currencies,
        },
    )
}

fn edit_dialog(transaction_id: TransactionId, form: &TransactionForm<'_>) -> Markup {
    html! {
        div
            role="dialog"
            aria-labelledby="edit-transaction-heading"
            class="p-6 my-6 rounded shadow bg-white dark:bg-gray-800 text-gray-900 dark:text-white"
        {
            span id="edit-transaction-heading" class="sr-only"
            {
                "Edit transaction " (transaction_id)
            }

            (edit_transaction_form(transaction_id, form))

            a
                href=(endpoints::TRANSACTIONS_VIEW)
                class={(BUTTON_SECONDARY_STYLE) " block mt-4 text-center"}
            {
                "Cancel"
            }
        }
    }
}

fn edit_page(dialog: &Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (dialog) }
    };

    base("Edit Transaction", &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        extract::{Path, State},
        http::{HeaderMap, HeaderValue, StatusCode},
        response::Response,
    };
    use axum_extra::extract::Form;
    use axum_htmx::HxRequest;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        category::{Category, CategoryName, create_category},
        currency::CurrencyConfig,
        db::initialize,
        test_utils::{
            assert_field_error, assert_form_input_with_value, assert_hx_endpoint,
            assert_hx_redirect, assert_valid_html, must_get_form, parse_html_document,
            parse_html_fragment,
        },
        transaction::{
            NewTransaction, SQLiteTransactionStore, Transaction, TransactionInput,
            TransactionStore,
        },
    };

    use super::{EditTransactionState, get_edit_transaction_page, update_transaction_endpoint};

    fn get_state() -> (EditTransactionState, Category, Category, Transaction) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let food = create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();
        let rent = create_category(CategoryName::new_unchecked("Rent"), &connection).unwrap();
        let transaction = SQLiteTransactionStore::new(&connection)
            .insert(NewTransaction {
                amount: 20.0,
                date: datetime!(2025-10-05 19:00),
                currency: "USD".to_owned(),
                description: "Takeaway dinner".to_owned(),
                category_id: food.id,
            })
            .unwrap();

        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            currency_config: CurrencyConfig::default(),
        };

        (state, food, rent, transaction)
    }

    fn changes(amount: &str, description: &str, category: &Category) -> TransactionInput {
        TransactionInput {
            amount: Some(amount.to_owned()),
            date: Some("2025-10-06T20:15:00".to_owned()),
            currency: None,
            selected_currency: Some("GBP".to_owned()),
            description: Some(description.to_owned()),
            category_id: Some(category.id.to_string()),
        }
    }

    fn saved(state: &EditTransactionState, transaction: &Transaction) -> Transaction {
        let connection = state.db_connection.lock().unwrap();
        SQLiteTransactionStore::new(&connection)
            .get(transaction.id)
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");
        serde_json::from_slice(&bytes).expect("Could not parse response body as JSON")
    }

    #[tokio::test]
    async fn page_renders_filled_form() {
        let (state, _, _, transaction) = get_state();

        let response =
            get_edit_transaction_page(State(state), HxRequest(false), Path(transaction.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, &format!("/api/transactions/{}", transaction.id), "hx-put");
        assert_form_input_with_value(&form, "description", "text", "Takeaway dinner");
        assert_form_input_with_value(&form, "date", "datetime-local", "2025-10-05T19:00:00");
    }

    #[tokio::test]
    async fn htmx_request_gets_fragment() {
        let (state, _, _, transaction) = get_state();

        let response =
            get_edit_transaction_page(State(state), HxRequest(true), Path(transaction.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert!(
            html.select(&scraper::Selector::parse("nav").unwrap())
                .next()
                .is_none(),
            "want a fragment without the nav bar"
        );
        must_get_form(&html);
    }

    #[tokio::test]
    async fn missing_transaction_returns_not_found() {
        let (state, _, _, _) = get_state();

        let page =
            get_edit_transaction_page(State(state.clone()), HxRequest(false), Path(99)).await;
        let fragment = get_edit_transaction_page(State(state), HxRequest(true), Path(99)).await;

        assert_eq!(page.status(), StatusCode::NOT_FOUND);
        assert_eq!(fragment.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_redirects_and_keeps_category() {
        let (state, food, rent, transaction) = get_state();

        let response = update_transaction_endpoint(
            State(state.clone()),
            Path(transaction.id),
            HeaderMap::new(),
            Form(changes("25.5", "Takeaway and drinks", &rent)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format!("/transactions?notice=edited&id={}", transaction.id),
        );
        let updated = saved(&state, &transaction);
        assert_eq!(updated.amount, 25.5);
        assert_eq!(updated.currency, "GBP");
        assert_eq!(updated.date, datetime!(2025-10-06 20:15));
        assert_eq!(updated.description, "Takeaway and drinks");
        assert_eq!(updated.category_id, food.id);
    }

    #[tokio::test]
    async fn xml_http_request_gets_json() {
        let (state, food, _, transaction) = get_state();
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let response = update_transaction_endpoint(
            State(state),
            Path(transaction.id),
            headers,
            Form(changes("25.5", "Takeaway and drinks", &food)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "success": true }));
    }

    #[tokio::test]
    async fn invalid_update_returns_form_and_changes_nothing() {
        let (state, food, _, transaction) = get_state();

        let response = update_transaction_endpoint(
            State(state.clone()),
            Path(transaction.id),
            HeaderMap::new(),
            Form(changes("-2", "Takeaway and drinks", &food)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, &format!("/api/transactions/{}", transaction.id), "hx-put");
        assert_field_error(&form, "amount", "Amount must be greater than zero");
        assert_eq!(saved(&state, &transaction), transaction);
    }

    #[tokio::test]
    async fn xml_http_request_for_missing_transaction_gets_json_404() {
        let (state, food, _, _) = get_state();
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let response = update_transaction_endpoint(
            State(state),
            Path(1234),
            headers,
            Form(changes("25.5", "Takeaway and drinks", &food)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "success": false }));
    }

    #[tokio::test]
    async fn update_of_missing_transaction_returns_404_alert() {
        let (state, food, _, _) = get_state();

        let response = update_transaction_endpoint(
            State(state),
            Path(1234),
            HeaderMap::new(),
            Form(changes("25.5", "Takeaway and drinks", &food)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        let alert = html
            .select(&scraper::Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No alert found")
            .text()
            .collect::<String>();
        assert!(alert.contains("Could not update transaction"));
    }
}
