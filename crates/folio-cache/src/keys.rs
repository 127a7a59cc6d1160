//! Cache keys and key templates used by the library service.
//!
//! Every book view lives under [`BOOK_PREFIX`] so that a single prefix
//! invalidation drops them all after an inventory change.

use std::fmt::Display;

/// Prefix shared by all cached book views.
pub const BOOK_PREFIX: &str = "book:";

/// Per-user dashboard.
pub const DASHBOARD_VIEW: &str = "dashboard_view_{user_id}_{role}";

/// A single book.
pub const BOOK_DETAIL: &str = "book:{book_id}";

/// One page of the book catalogue.
pub const BOOK_LIST: &str = "book:list:{page}";

/// A user's rentals.
pub const USER_RENTALS: &str = "rentals:{user_id}";

/// Generate the cache key for a book by ID.
#[must_use]
pub fn book_detail(book_id: impl Display) -> String {
    format!("{}{}", BOOK_PREFIX, book_id)
}

/// Generate the cache key for a catalogue page.
#[must_use]
pub fn book_list(page: u32) -> String {
    format!("{}list:{}", BOOK_PREFIX, page)
}

/// Generate the cache key for a user's rentals.
#[must_use]
pub fn user_rentals(user_id: impl Display) -> String {
    format!("rentals:{}", user_id)
}
