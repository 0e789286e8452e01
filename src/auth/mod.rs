//! Identification of the acting user.
//!
//! Authentication happens upstream; the proxy forwards the signed-in user's
//! id in the `X-User-Id` header and handlers resolve it with `CurrentUser`.

mod extractor;

pub use extractor::{CurrentUser, parse_user_id};
