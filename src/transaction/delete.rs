//! The confirmation page and endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_category},
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_SECONDARY_STYLE, CATEGORY_BADGE_STYLE, FORM_CONTAINER_STYLE,
        base, format_amount,
    },
    navigation::NavBar,
};

use super::{
    core::Transaction,
    notice::Notice,
    service::{DeleteOutcome, delete_transaction, get_transaction},
    store::{SQLiteTransactionStore, TransactionStore},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Ask the user to confirm deleting a transaction.
pub async fn get_delete_transaction_page(
    State(state): State<DeleteTransactionState>,
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
        get_category(transaction.category_id, &connection).map(|category| (transaction, category))
    });

    let (transaction, category) = match result {
        Ok(found) => found,
        Err(error) if is_htmx_request => return error.into_alert_response(),
        Err(error) => return error.into_response(),
    };

    let dialog = confirm_delete_view(&transaction, &category);

    if is_htmx_request {
        dialog.into_response()
    } else {
        let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
        let content = html! {
            (nav_bar)
            div class=(FORM_CONTAINER_STYLE) { (dialog) }
        };

        base("Delete Transaction", &content).into_response()
    }
}

/// Delete a transaction and redirect to the transactions page.
///
/// Deleting a transaction that does not exist is not an error, the client is
/// redirected without a notice.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
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

    let redirect_url = match store.in_transaction(|store| delete_transaction(store, transaction_id))
    {
        Ok(DeleteOutcome::Deleted(id)) => {
            tracing::info!("deleted transaction {id}");
            Notice::Deleted(id).redirect_url()
        }
        Ok(DeleteOutcome::NoOp) => {
            tracing::debug!("transaction {transaction_id} was already gone");
            endpoints::TRANSACTIONS_VIEW.to_owned()
        }
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            return error.into_alert_response();
        }
    };

    (HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
}

fn confirm_delete_view(transaction: &Transaction, category: &Category) -> Markup {
    let delete_endpoint = format_endpoint(endpoints::TRANSACTION, transaction.id);

    html! {
        div
            role="dialog"
            aria-labelledby="delete-transaction-heading"
            class="w-full p-6 my-6 space-y-4 rounded shadow bg-white
                dark:bg-gray-800 text-gray-900 dark:text-white"
        {
            h2 id="delete-transaction-heading" class="text-lg font-semibold"
            {
                "Delete transaction #" (transaction.id) "?"
            }

            dl class="grid grid-cols-3 gap-2 text-sm"
            {
                dt class="font-medium" { "Description" }
                dd class="col-span-2" { (transaction.description) }

                dt class="font-medium" { "Amount" }
                dd class="col-span-2" { (format_amount(transaction.amount, &transaction.currency)) }

                dt class="font-medium" { "Date" }
                dd class="col-span-2" { (transaction.date.date()) }

                dt class="font-medium" { "Category" }
                dd class="col-span-2" { span class=(CATEGORY_BADGE_STYLE) { (category.name) } }
            }

            p class="text-sm text-gray-600 dark:text-gray-400" { "This cannot be undone." }

            div class="flex gap-4"
            {
                button
                    type="button"
                    hx-delete=(delete_endpoint)
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }

                a
                    href=(endpoints::TRANSACTIONS_VIEW)
                    class={(BUTTON_SECONDARY_STYLE) " text-center"}
                {
                    "Cancel"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_htmx::HxRequest;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::datetime;

    use crate::{
        Error,
        category::{CategoryName, create_category},
        db::initialize,
        test_utils::{
            assert_hx_redirect, assert_valid_html, parse_html_document, parse_html_fragment,
        },
        transaction::{NewTransaction, SQLiteTransactionStore, Transaction, TransactionStore},
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint, get_delete_transaction_page};

    fn get_state() -> (DeleteTransactionState, Transaction) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let category =
            create_category(CategoryName::new_unchecked("Transport"), &connection).unwrap();
        let transaction = SQLiteTransactionStore::new(&connection)
            .insert(NewTransaction {
                amount: 3.5,
                date: datetime!(2025-10-05 07:45),
                currency: "EUR".to_owned(),
                description: "Bus to work".to_owned(),
                category_id: category.id,
            })
            .unwrap();

        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, transaction)
    }

    #[tokio::test]
    async fn confirmation_shows_transaction_and_category() {
        let (state, transaction) = get_state();

        let response =
            get_delete_transaction_page(State(state), HxRequest(false), Path(transaction.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text = html
            .select(&Selector::parse("[role=dialog]").unwrap())
            .next()
            .expect("No dialog found")
            .text()
            .collect::<String>();
        assert!(text.contains("Bus to work"));
        assert!(text.contains("3.50 EUR"));
        assert!(text.contains("Transport"));
        let button = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .next()
            .and_then(|button| button.value().attr("hx-delete"));
        assert_eq!(button, Some(format!("/api/transactions/{}", transaction.id).as_str()));
    }

    #[tokio::test]
    async fn confirmation_for_htmx_is_a_fragment() {
        let (state, transaction) = get_state();

        let response =
            get_delete_transaction_page(State(state), HxRequest(true), Path(transaction.id)).await;

        let html = parse_html_fragment(response).await;
        assert!(
            html.select(&Selector::parse("nav").unwrap())
                .next()
                .is_none()
        );
        assert!(
            html.select(&Selector::parse("[role=dialog]").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn confirmation_for_missing_transaction_is_not_found() {
        let (state, _) = get_state();

        let response = get_delete_transaction_page(State(state), HxRequest(false), Path(77)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_and_redirects_with_notice() {
        let (state, transaction) = get_state();

        let response =
            delete_transaction_endpoint(State(state.clone()), Path(transaction.id)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format!("/transactions?notice=deleted&id={}", transaction.id),
        );
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            SQLiteTransactionStore::new(&connection).get(transaction.id),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn deleting_missing_transaction_is_a_no_op() {
        let (state, transaction) = get_state();

        let response = delete_transaction_endpoint(State(state.clone()), Path(404)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/transactions");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            SQLiteTransactionStore::new(&connection).get(transaction.id),
            Ok(transaction)
        );
    }
}
