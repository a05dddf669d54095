//! The endpoint for adding a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, category::get_all_categories, currency::CurrencyConfig,
    timezone::local_now,
};

use super::{
    form::{TransactionForm, TransactionFormValues, create_transaction_form},
    notice::Notice,
    service::create_transaction,
    store::SQLiteTransactionStore,
    validation::TransactionInput,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub currency_config: CurrencyConfig,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            currency_config: state.currency_config.clone(),
        }
    }
}

/// Create a transaction from the submitted form.
///
/// On success the client is redirected to the transactions page with a
/// notice. Invalid input is answered with the form and its errors.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(input): Form<TransactionInput>,
) -> Response {
    let now = match local_now(&state.local_timezone) {
        Ok(now) => now,
        Err(error) => {
            tracing::error!("could not get the local time: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };
    let store = SQLiteTransactionStore::new(&connection);

    match create_transaction(&store, &input, &state.currency_config, now) {
        Ok(transaction) => {
            tracing::info!("created transaction {}", transaction.id);

            (
                HxRedirect(Notice::Created.redirect_url()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::InvalidTransaction(errors)) => {
            tracing::debug!("rejected new transaction: {errors}");

            match get_all_categories(&connection) {
                Ok(categories) => create_transaction_form(&TransactionForm {
                    values: &TransactionFormValues::from_input(&input, &state.currency_config),
                    errors: &errors,
                    categories: &categories,
                    currencies: &state.currency_config,
                })
                .into_response(),
                Err(error) => {
                    tracing::error!("Failed to retrieve categories: {error}");
                    error.into_alert_response()
                }
            }
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a transaction: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        category::{Category, CategoryName, create_category},
        currency::CurrencyConfig,
        db::initialize,
        test_utils::{
            assert_field_error, assert_form_input_with_value, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_fragment,
        },
        transaction::{SQLiteTransactionStore, TransactionInput, TransactionStore},
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn get_state() -> (CreateTransactionState, Category) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let category = create_category(CategoryName::new_unchecked("Food"), &connection).unwrap();

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
            currency_config: CurrencyConfig::default(),
        };

        (state, category)
    }

    #[tokio::test]
    async fn creates_transaction_and_redirects_with_notice() {
        let (state, category) = get_state();
        let input = TransactionInput {
            amount: Some("12.30".to_owned()),
            date: Some("2025-10-05T08:00:00".to_owned()),
            currency: Some("USD".to_owned()),
            selected_currency: Some("EUR".to_owned()),
            description: Some("Coffee and a bagel".to_owned()),
            category_id: Some(category.id.to_string()),
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(input)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/transactions?notice=created");
        let connection = state.db_connection.lock().unwrap();
        let transaction = SQLiteTransactionStore::new(&connection).get(1).unwrap();
        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.currency, "EUR");
        assert_eq!(transaction.description, "Coffee and a bagel");
        assert_eq!(transaction.category_id, category.id);
    }

    #[tokio::test]
    async fn invalid_input_returns_form_with_errors() {
        let (state, category) = get_state();
        let input = TransactionInput {
            amount: Some("0".to_owned()),
            description: Some("Tea".to_owned()),
            category_id: Some(category.id.to_string()),
            ..Default::default()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(input)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_input_with_value(&form, "description", "text", "Tea");
        assert_field_error(&form, "amount", "Amount must be greater than zero");
        assert_field_error(
            &form,
            "description",
            "Description must be at least 5 characters long",
        );
        let connection = state.db_connection.lock().unwrap();
        let count = SQLiteTransactionStore::new(&connection)
            .count(&Default::default())
            .unwrap();
        assert_eq!(count, 0, "want nothing saved for invalid input");
    }

    #[tokio::test]
    async fn invalid_timezone_returns_alert() {
        let (mut state, category) = get_state();
        state.local_timezone = "Not/AZone".to_owned();
        let input = TransactionInput {
            amount: Some("5".to_owned()),
            description: Some("Coffee and a bagel".to_owned()),
            category_id: Some(category.id.to_string()),
            ..Default::default()
        };

        let response = create_transaction_endpoint(State(state), Form(input)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
