//! The transactions page: notices, the create form, the search form and the
//! paged table of transactions.

use std::collections::HashMap;

use maud::{Markup, html};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    category::{Category, CategoryId},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_amount,
    },
    navigation::NavBar,
    pagination::{create_pagination_indicators, pagination_view},
};

use super::{
    core::Transaction,
    form::{TransactionForm, create_transaction_form},
    notice::Notice,
    query::{TransactionFilter, TransactionPage},
};

/// Descriptions longer than this many characters are cut short in the table.
const MAX_DESCRIPTION_GRAPHEMES: usize = 32;

const TABLE_DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Which listing is being shown, which decides how page links are built.
pub enum Listing<'a> {
    All,
    Search(&'a TransactionFilter),
}

impl Listing<'_> {
    fn page_url(&self, page: u64) -> String {
        match self {
            Listing::All => format!("{}?page={page}", endpoints::TRANSACTIONS_VIEW),
            Listing::Search(filter) => filter.search_url(page),
        }
    }

    pub fn filter(&self) -> Option<&TransactionFilter> {
        match self {
            Listing::All => None,
            Listing::Search(filter) => Some(*filter),
        }
    }
}

pub struct TransactionsView<'a> {
    pub listing: Listing<'a>,
    pub notice: Option<Notice>,
    pub form: TransactionForm<'a>,
    pub page: &'a TransactionPage,
    pub max_page_indicators: u64,
}

pub fn transactions_view(view: &TransactionsView<'_>) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let category_names = view
        .form
        .categories
        .iter()
        .map(|category| (category.id, category.name.as_ref()))
        .collect::<HashMap<CategoryId, &str>>();
    let indicators = create_pagination_indicators(
        view.page.page,
        view.page.total_pages,
        view.max_page_indicators,
    );
    let pagination = pagination_view(&indicators, |page| view.listing.page_url(page));
    let title = match view.listing {
        Listing::All => "Transactions",
        Listing::Search(_) => "Search Transactions",
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-5xl space-y-6"
            {
                @if let Some(notice) = view.notice {
                    (notice.into_alert().into_html())
                }

                div class="grid gap-6 lg:grid-cols-3"
                {
                    section class="lg:col-span-1"
                    {
                        (create_transaction_form(&view.form))
                    }

                    section class="lg:col-span-2 space-y-4"
                    {
                        h1 class="text-xl font-bold" { (title) }

                        (search_form(view.listing.filter(), view.form.categories))

                        @if let Listing::Search(_) = view.listing {
                            p class="text-sm text-gray-600 dark:text-gray-400"
                            {
                                (view.page.total_count) " matching transactions. "
                                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE)
                                {
                                    "Clear search"
                                }
                            }
                        }

                        (transactions_table(&view.page.items, &category_names))

                        (pagination)
                    }
                }
            }
        }
    };

    base(title, &content)
}

fn search_form(filter: Option<&TransactionFilter>, categories: &[Category]) -> Markup {
    let text = filter.and_then(|filter| filter.text.as_deref());
    let category_id = filter.and_then(|filter| filter.category_id);
    let date = filter.and_then(|filter| filter.date).map(|date| date.to_string());

    html! {
        form
            method="get"
            action=(endpoints::SEARCH_VIEW)
            role="search"
            class="grid gap-2 sm:grid-cols-4 items-end"
        {
            div class="sm:col-span-2"
            {
                label for="q" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    type="search"
                    name="q"
                    id="q"
                    placeholder="Search descriptions"
                    value=[text]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="search-category" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category_id" id="search-category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }

                    @for category in categories {
                        option value=(category.id) selected[Some(category.id) == category_id]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="search-date" class=(FORM_LABEL_STYLE) { "Day" }
                input
                    type="date"
                    name="date"
                    id="search-date"
                    value=[date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Search" }
        }
    }
}

fn transactions_table(
    transactions: &[Transaction],
    category_names: &HashMap<CategoryId, &str>,
) -> Markup {
    html! {
        div class="relative overflow-x-auto shadow-md rounded"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE)
                        {
                            span class="sr-only" { "Actions" }
                        }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(
                            transaction,
                            category_names.get(&transaction.category_id).copied(),
                        ))
                    }

                    @if transactions.is_empty() {
                        tr
                        {
                            td
                                colspan="6"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No transactions found."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transaction_row(transaction: &Transaction, category_name: Option<&str>) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, transaction.id);
    let (description, tooltip) = truncate_description(&transaction.description);

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.id) }
            td class=(TABLE_CELL_STYLE) { (format_date(transaction.date)) }
            td class=(TABLE_CELL_STYLE) title=[tooltip] { (description) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (category_name.unwrap_or("Unknown")) }
            }
            td class={(TABLE_CELL_STYLE) " text-right whitespace-nowrap"}
            {
                (format_amount(transaction.amount, &transaction.currency))
            }
            td class={(TABLE_CELL_STYLE) " space-x-2 whitespace-nowrap"}
            {
                a
                    href=(edit_url)
                    hx-get=(edit_url)
                    hx-target="#transaction-modal"
                    hx-target-error="#alert-container"
                    class=(LINK_STYLE)
                {
                    "Edit"
                }

                a
                    href=(delete_url)
                    hx-get=(delete_url)
                    hx-target="#transaction-modal"
                    hx-target-error="#alert-container"
                    class=(LINK_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn format_date(date: PrimitiveDateTime) -> String {
    date.format(TABLE_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Shorten long descriptions, returning the text to show and, if it was
/// shortened, the full text for a tooltip.
fn truncate_description(description: &str) -> (String, Option<&str>) {
    if description.graphemes(true).count() <= MAX_DESCRIPTION_GRAPHEMES {
        return (description.to_owned(), None);
    }

    let mut truncated = description
        .graphemes(true)
        .take(MAX_DESCRIPTION_GRAPHEMES - 3)
        .collect::<String>();
    truncated.push_str("...");

    (truncated, Some(description))
}
