//! Accessibility monitoring platform library.
//!
//! Case management for monitoring public sector website accessibility:
//! cases and their workflow, WCAG tests, reports and publication,
//! correspondence, equality-body retests and workflow navigation.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod sitemap;
