//! GitEvents library.
//!
//! Receives GitHub webhooks, stores pull request, branch and push events in a
//! relational database and serves them back through a query API. Also opens
//! pull requests for new branches and runs post-merge scripts.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
