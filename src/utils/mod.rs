pub mod short_id;
pub mod url_validator;

pub use short_id::compute_short_id;
pub use url_validator::validate_full_url;
