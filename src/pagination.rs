//! This modules defines the common functionality for paging data.

use maud::{Markup, html};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items to display per page.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
        }
    }
}

/// The number of pages needed to show `item_count` items, `page_size` at a time.
pub fn page_count(item_count: u64, page_size: u64) -> u64 {
    item_count.div_ceil(page_size.max(1))
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// Work out which page links to show for `curr_page`.
///
/// At most `max_pages` numbered pages are shown around the current page, plus
/// the first and last page separated by an ellipsis when they fall outside
/// that window.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    if page_count == 0 {
        return Vec::new();
    }

    let half = max_pages / 2;
    let is_truncated = page_count > max_pages;

    let (first, last) = if !is_truncated {
        (1, page_count)
    } else if curr_page <= half {
        (1, max_pages)
    } else if curr_page > page_count - half {
        (page_count - max_pages + 1, page_count)
    } else {
        (curr_page - half, curr_page + half)
    };

    let mut indicators = Vec::new();

    if curr_page > 1 {
        indicators.push(PaginationIndicator::BackButton(curr_page - 1));
    }

    if is_truncated && curr_page > half + 1 {
        indicators.push(PaginationIndicator::Page(1));
        indicators.push(PaginationIndicator::Ellipsis);
    }

    indicators.extend((first..=last).map(|page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    }));

    if is_truncated && curr_page < page_count - half {
        indicators.push(PaginationIndicator::Ellipsis);
        indicators.push(PaginationIndicator::Page(page_count));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render the pagination controls, using `page_url` to build the link for each page.
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    let link_style = "block px-3 py-2 rounded-sm text-blue-600 hover:underline";

    html! {
        @if !indicators.is_empty() {
            nav class="pagination flex justify-center"
            {
                ul class="pagination flex flex-wrap items-center gap-x-2 p-0 m-0"
                {
                    @for indicator in indicators {
                        li
                        {
                            @match indicator {
                                PaginationIndicator::Page(page) => {
                                    a href=(page_url(*page)) class=(link_style) { (page) }
                                }
                                PaginationIndicator::CurrPage(page) => {
                                    p
                                        aria-current="page"
                                        class="block px-3 py-2 rounded-sm font-bold text-black dark:text-white"
                                    { (page) }
                                }
                                PaginationIndicator::Ellipsis => {
                                    span class="px-3 py-2" { "..." }
                                }
                                PaginationIndicator::BackButton(page) => {
                                    a href=(page_url(*page)) role="button" class=(link_style) { "Back" }
                                }
                                PaginationIndicator::NextButton(page) => {
                                    a href=(page_url(*page)) role="button" class=(link_style) { "Next" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
