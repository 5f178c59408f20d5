//! HTTP integration tests.
//!
//! Each test builds the actix apps with `actix_web::test::init_service`
//! against a fresh in-memory SQLite database.
//!
//! Run with: cargo test --test integration

mod test_helpers;

mod events_tests;
mod management_tests;
mod settings_tests;
mod webhook_tests;
