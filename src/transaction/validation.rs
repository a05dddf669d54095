//! Field rules that every transaction must satisfy before it is written.
//!
//! Validation collects every violation rather than stopping at the first one,
//! so a form can show all of its errors at once.

use std::fmt::Display;

use serde::Deserialize;
use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, category::CategoryId, currency::CurrencyConfig};

use super::store::{NewTransaction, TransactionStore};

/// The fewest characters (grapheme clusters) a description may have.
pub const MIN_DESCRIPTION_LENGTH: usize = 5;

/// The format of the date-time values sent by `<input type="datetime-local">`.
pub const DATE_TIME_INPUT_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DATE_TIME_MINUTES_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// The raw, unvalidated values for creating or updating a transaction, e.g.
/// from a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionInput {
    /// A positive decimal number, e.g. "12.50".
    #[serde(default)]
    pub amount: Option<String>,
    /// A date with an optional time, e.g. "2025-10-05T14:30".
    #[serde(default)]
    pub date: Option<String>,
    /// A currency code, e.g. "USD".
    #[serde(default)]
    pub currency: Option<String>,
    /// An explicit currency choice which takes precedence over `currency`.
    #[serde(default)]
    pub selected_currency: Option<String>,
    /// What the transaction was for.
    #[serde(default)]
    pub description: Option<String>,
    /// The ID of an existing category.
    #[serde(default)]
    pub category_id: Option<String>,
}

/// The input fields that can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The transaction amount.
    Amount,
    /// The date and time of the transaction.
    Date,
    /// The currency code.
    Currency,
    /// The text description.
    Description,
    /// The category the transaction belongs to.
    Category,
}

impl Field {
    /// The form field name for this field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::Date => "date",
            Field::Currency => "currency",
            Field::Description => "description",
            Field::Category => "category_id",
        }
    }
}

/// A single broken rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// The field that broke the rule.
    pub field: Field,
    /// A message explaining how to fix the field.
    pub message: String,
}

/// Every rule a [TransactionInput] broke.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Record that `field` broke a rule.
    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no rules were broken.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The broken rules in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The first error message for `field`, if it has one.
    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .0
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>();

        write!(f, "{}", messages.join("; "))
    }
}

impl TransactionInput {
    /// Check the input against the transaction rules.
    ///
    /// A missing date falls back to `default_date`. A missing currency falls
    /// back to the configured default, and `selected_currency` overrides
    /// `currency` when both are given.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransaction] with every violation found, or an
    /// error from `store` if the category could not be looked up.
    pub fn validate(
        &self,
        currencies: &CurrencyConfig,
        default_date: PrimitiveDateTime,
        store: &impl TransactionStore,
    ) -> Result<NewTransaction, Error> {
        let mut errors = ValidationErrors::default();

        let amount = parse_amount(self.amount.as_deref())
            .map_err(|message| errors.push(Field::Amount, message))
            .ok();

        let date = match non_blank(self.date.as_deref()) {
            None => Some(default_date),
            Some(text) => parse_date_time(text)
                .ok_or_else(|| {
                    errors.push(
                        Field::Date,
                        "Date must be a valid date, e.g. 2025-10-05T14:30",
                    )
                })
                .ok(),
        };

        let currency = self.resolve_currency(currencies);
        if !currencies.is_allowed(&currency) {
            errors.push(
                Field::Currency,
                format!(
                    "Currency must be one of {}",
                    currencies.codes().join(", ")
                ),
            );
        }

        let description = non_blank(self.description.as_deref()).unwrap_or_default();
        if description.is_empty() {
            errors.push(Field::Description, "Description is required");
        } else if description.graphemes(true).count() < MIN_DESCRIPTION_LENGTH {
            errors.push(
                Field::Description,
                format!("Description must be at least {MIN_DESCRIPTION_LENGTH} characters long"),
            );
        }

        let category_id = match non_blank(self.category_id.as_deref()) {
            None => {
                errors.push(Field::Category, "Category is required");
                None
            }
            Some(text) => match text.parse::<CategoryId>() {
                Ok(id) if store.category_exists(id)? => Some(id),
                _ => {
                    errors.push(Field::Category, "Category does not exist");
                    None
                }
            },
        };

        match (amount, date, category_id) {
            (Some(amount), Some(date), Some(category_id)) if errors.is_empty() => {
                Ok(NewTransaction {
                    amount,
                    date,
                    currency,
                    description: description.to_owned(),
                    category_id,
                })
            }
            _ => Err(Error::InvalidTransaction(errors)),
        }
    }

    fn resolve_currency(&self, currencies: &CurrencyConfig) -> String {
        non_blank(self.selected_currency.as_deref())
            .or_else(|| non_blank(self.currency.as_deref()))
            .unwrap_or(currencies.default_code())
            .to_owned()
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}

fn parse_amount(text: Option<&str>) -> Result<f64, &'static str> {
    let text = non_blank(text).ok_or("Amount is required")?;

    let amount = text
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or("Amount must be a number")?;

    if amount > 0.0 {
        Ok(amount)
    } else {
        Err("Amount must be greater than zero")
    }
}

/// Parse a date with an optional time, where a date on its own means midnight.
pub(crate) fn parse_date_time(text: &str) -> Option<PrimitiveDateTime> {
    let text = text.trim().replacen(' ', "T", 1);

    PrimitiveDateTime::parse(&text, DATE_TIME_INPUT_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(&text, DATE_TIME_MINUTES_FORMAT))
        .ok()
        .or_else(|| Date::parse(&text, DATE_FORMAT).ok().map(Date::midnight))
}

/// Parse a calendar date, ignoring anything that is not a `YYYY-MM-DD` date.
pub(crate) fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), DATE_FORMAT).ok()
}
