//! The create and edit forms for transactions.
//!
//! Invalid submissions are answered with the same form, filled with what the
//! user entered and with an error message under each rejected field.

use maud::{Markup, html};

use crate::{
    category::{Category, CategoryId},
    currency::CurrencyConfig,
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
};

use super::{
    core::Transaction,
    validation::{
        DATE_TIME_INPUT_FORMAT, Field, MIN_DESCRIPTION_LENGTH, TransactionInput, ValidationErrors,
    },
};

/// The values to fill a transaction form with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFormValues {
    pub amount: String,
    pub date: String,
    pub currency: String,
    pub description: String,
    pub category_id: Option<CategoryId>,
}

impl TransactionFormValues {
    /// Empty values with the default currency selected.
    pub fn new(currencies: &CurrencyConfig) -> Self {
        Self {
            currency: currencies.default_code().to_owned(),
            ..Default::default()
        }
    }

    /// Echo a submission back so the user does not have to type it again.
    pub fn from_input(input: &TransactionInput, currencies: &CurrencyConfig) -> Self {
        let text = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_owned();

        let currency = [&input.selected_currency, &input.currency]
            .into_iter()
            .map(text)
            .find(|code| !code.is_empty())
            .unwrap_or_else(|| currencies.default_code().to_owned());

        Self {
            amount: text(&input.amount),
            date: text(&input.date),
            currency,
            description: text(&input.description),
            category_id: input
                .category_id
                .as_deref()
                .and_then(|id| id.trim().parse().ok()),
        }
    }

    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            amount: format!("{:.2}", transaction.amount),
            date: transaction
                .date
                .format(DATE_TIME_INPUT_FORMAT)
                .unwrap_or_default(),
            currency: transaction.currency.clone(),
            description: transaction.description.clone(),
            category_id: Some(transaction.category_id),
        }
    }
}

/// Everything a transaction form needs to render.
pub struct TransactionForm<'a> {
    pub values: &'a TransactionFormValues,
    pub errors: &'a ValidationErrors,
    pub categories: &'a [Category],
    pub currencies: &'a CurrencyConfig,
}

/// The form for adding a transaction.
pub fn create_transaction_form(form: &TransactionForm<'_>) -> Markup {
    html! {
        form
            id="create-transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            h2 class="text-lg font-semibold" { "Add Transaction" }

            (amount_field(form))
            (date_field(form, false))
            (currency_field(form))
            (description_field(form))
            (category_select(form))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Transaction" }
        }
    }
}

/// The form for editing transaction `transaction_id`.
///
/// The category is shown but cannot be changed.
pub fn edit_transaction_form(transaction_id: TransactionId, form: &TransactionForm<'_>) -> Markup {
    let update_endpoint = format_endpoint(endpoints::TRANSACTION, transaction_id);

    html! {
        form
            id="edit-transaction-form"
            hx-put=(update_endpoint)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            h2 class="text-lg font-semibold" { "Edit Transaction #" (transaction_id) }

            (amount_field(form))
            (date_field(form, true))
            (currency_field(form))
            (description_field(form))
            (fixed_category(form))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
        }
    }
}

fn field_error(errors: &ValidationErrors, field: Field) -> Markup {
    html! {
        @if let Some(message) = errors.message_for(field) {
            p id=(error_id(field)) class=(FORM_ERROR_STYLE) { (message) }
        }
    }
}

fn error_id(field: Field) -> String {
    format!("{}-error", field.name())
}

fn amount_field(form: &TransactionForm<'_>) -> Markup {
    let has_error = form.errors.message_for(Field::Amount).is_some();

    html! {
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            input
                name="amount"
                id="amount"
                type="number"
                step="0.01"
                min="0.01"
                placeholder="0.00"
                required
                value=(form.values.amount)
                aria-invalid=[has_error.then_some("true")]
                aria-describedby=[has_error.then(|| error_id(Field::Amount))]
                class=(FORM_TEXT_INPUT_STYLE);

            (field_error(form.errors, Field::Amount))
        }
    }
}

fn date_field(form: &TransactionForm<'_>, required: bool) -> Markup {
    let has_error = form.errors.message_for(Field::Date).is_some();

    html! {
        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="datetime-local"
                step="1"
                required[required]
                value=(form.values.date)
                aria-invalid=[has_error.then_some("true")]
                aria-describedby=[has_error.then(|| error_id(Field::Date))]
                class=(FORM_TEXT_INPUT_STYLE);

            @if !required {
                p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                {
                    "Leave blank to use the current time."
                }
            }

            (field_error(form.errors, Field::Date))
        }
    }
}

fn currency_field(form: &TransactionForm<'_>) -> Markup {
    html! {
        div
        {
            label for="selected_currency" class=(FORM_LABEL_STYLE) { "Currency" }

            select
                name="selected_currency"
                id="selected_currency"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for code in form.currencies.codes() {
                    option value=(code) selected[*code == form.values.currency] { (code) }
                }
            }

            (field_error(form.errors, Field::Currency))
        }
    }
}

fn description_field(form: &TransactionForm<'_>) -> Markup {
    let has_error = form.errors.message_for(Field::Description).is_some();

    html! {
        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                minlength=(MIN_DESCRIPTION_LENGTH)
                required
                value=(form.values.description)
                aria-invalid=[has_error.then_some("true")]
                aria-describedby=[has_error.then(|| error_id(Field::Description))]
                class=(FORM_TEXT_INPUT_STYLE);

            (field_error(form.errors, Field::Description))
        }
    }
}

fn category_select(form: &TransactionForm<'_>) -> Markup {
    html! {
        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select
                name="category_id"
                id="category_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a category" }

                @for category in form.categories {
                    option
                        value=(category.id)
                        selected[Some(category.id) == form.values.category_id]
                    {
                        (category.name)
                    }
                }
            }

            (field_error(form.errors, Field::Category))
        }
    }
}

fn fixed_category(form: &TransactionForm<'_>) -> Markup {
    let category = form
        .values
        .category_id
        .and_then(|id| form.categories.iter().find(|category| category.id == id));

    html! {
        div
        {
            span class=(FORM_LABEL_STYLE) { "Category" }

            @if let Some(category) = category {
                span class=(CATEGORY_BADGE_STYLE) { (category.name) }
            } @else {
                span class="text-sm text-gray-500" { "Unknown category" }
            }

            @if let Some(category_id) = form.values.category_id {
                input type="hidden" name="category_id" value=(category_id);
            }

            (field_error(form.errors, Field::Category))
        }
    }
}
