pub mod delete_service;
pub mod shortener;

pub use delete_service::{DELETE_FLUSH_PERIOD, DeleteService};
pub use shortener::{ShortenOutcome, ShortenerService};
