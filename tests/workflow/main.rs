//! Case workflow integration tests.
//!
//! Each test runs against its own in-memory SQLite database with the full
//! migration set applied.
//!
//! Run with: cargo test --test workflow

mod test_helpers;

mod test_audit_checks;
mod test_case_lifecycle;
mod test_comments_and_contacts;
mod test_http;
mod test_publication;
mod test_retests;
