//! SeaORM entity definitions.

pub mod audit;
pub mod base_template;
pub mod case;
pub mod case_event;
pub mod check_result;
pub mod comment;
pub mod contact;
pub mod email_template;
pub mod equality_body_correspondence;
pub mod event_history;
pub mod notification_setting;
pub mod page;
pub mod platform;
pub mod report;
pub mod retest;
pub mod retest_check_result;
pub mod retest_page;
pub mod s3_report;
pub mod section;
pub mod sector;
pub mod statement_check;
pub mod statement_check_result;
pub mod sub_category;
pub mod table_row;
pub mod task;
pub mod user;
pub mod wcag_definition;
pub mod zendesk_ticket;
