//! Contact and correspondence choice enums and DTOs.

use sea_orm::sea_query::StringLen;
use serde::Deserialize;
use utoipa::ToSchema;

choice_enum! {
    pub enum ContactPreferred {
        Unknown => "unknown", "Not known",
        Yes => "yes", "Yes",
        No => "no", "No",
    }
}

choice_enum! {
    pub enum CorrespondenceType {
        Question => "question", "Question",
        Retest => "retest", "Retest request",
    }
}

choice_enum! {
    pub enum CorrespondenceStatus {
        Unresolved => "unresolved", "Unresolved",
        Resolved => "resolved", "Resolved",
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub contact_details: String,
    #[serde(default)]
    pub preferred: ContactPreferred,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EditCommentRequest {
    pub version: i32,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateZendeskTicketRequest {
    pub url: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCorrespondenceRequest {
    #[serde(default)]
    pub correspondence_type: CorrespondenceType,
    pub message: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub zendesk_url: String,
}
