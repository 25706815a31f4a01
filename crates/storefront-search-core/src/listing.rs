//! Category listing helpers: pagination and price display.

use serde::Serialize;

use crate::models::Price;

/// Products per page on a category page.
pub const DEFAULT_PER_PAGE: usize = 12;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Slice `items` into 1-based page `page` of `per_page` items.
///
/// Out-of-range page numbers are clamped to the nearest valid page, and a
/// zero `per_page` is treated as one.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let start = ((page - 1) * per_page).min(total_items);
    let end = (start + per_page).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Render a price for display.
///
/// Numeric prices use Turkish lira formatting (`₺1.234,56`); label
/// prices are returned unchanged.
pub fn format_price(price: &Price) -> String {
    match price {
        Price::Label(label) => label.clone(),
        Price::Amount(amount) => format_lira(*amount),
    }
}

fn format_lira(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{} ₺", amount);
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}₺{},{:02}", sign, grouped, frac)
}
