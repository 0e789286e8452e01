//! Event history references.

use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

choice_enum! {
    pub enum HistoryEventType {
        Create => "create", "Create",
        Update => "update", "Update",
    }
}

choice_enum! {
    /// Entity kinds that record event history.
    pub enum EntityType {
        Case => "case", "Case",
        Audit => "audit", "Audit",
        Page => "page", "Page",
        CheckResult => "check_result", "Check result",
        StatementCheckResult => "statement_check_result", "Statement check result",
        Report => "report", "Report",
        Section => "section", "Report section",
        S3Report => "s3_report", "Published report",
        Contact => "contact", "Contact",
        Comment => "comment", "Comment",
        ZendeskTicket => "zendesk_ticket", "Zendesk ticket",
        EqualityBodyCorrespondence => "equality_body_correspondence", "Equality body correspondence",
        Retest => "retest", "Retest",
        RetestPage => "retest_page", "Retest page",
        RetestCheckResult => "retest_check_result", "Retest check result",
        Task => "task", "Task",
    }
}

/// Typed reference to a history-bearing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Case(i32),
    Audit(i32),
    Page(i32),
    CheckResult(i32),
    StatementCheckResult(i32),
    Report(i32),
    Section(i32),
    S3Report(i32),
    Contact(i32),
    Comment(i32),
    ZendeskTicket(i32),
    EqualityBodyCorrespondence(i32),
    Retest(i32),
    RetestPage(i32),
    RetestCheckResult(i32),
    Task(i32),
}

impl EntityRef {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Case(_) => EntityType::Case,
            Self::Audit(_) => EntityType::Audit,
            Self::Page(_) => EntityType::Page,
            Self::CheckResult(_) => EntityType::CheckResult,
            Self::StatementCheckResult(_) => EntityType::StatementCheckResult,
            Self::Report(_) => EntityType::Report,
            Self::Section(_) => EntityType::Section,
            Self::S3Report(_) => EntityType::S3Report,
            Self::Contact(_) => EntityType::Contact,
            Self::Comment(_) => EntityType::Comment,
            Self::ZendeskTicket(_) => EntityType::ZendeskTicket,
            Self::EqualityBodyCorrespondence(_) => EntityType::EqualityBodyCorrespondence,
            Self::Retest(_) => EntityType::Retest,
            Self::RetestPage(_) => EntityType::RetestPage,
            Self::RetestCheckResult(_) => EntityType::RetestCheckResult,
            Self::Task(_) => EntityType::Task,
        }
    }

    pub fn id(&self) -> i32 {
        match *self {
            Self::Case(id)
            | Self::Audit(id)
            | Self::Page(id)
            | Self::CheckResult(id)
            | Self::StatementCheckResult(id)
            | Self::Report(id)
            | Self::Section(id)
            | Self::S3Report(id)
            | Self::Contact(id)
            | Self::Comment(id)
            | Self::ZendeskTicket(id)
            | Self::EqualityBodyCorrespondence(id)
            | Self::Retest(id)
            | Self::RetestPage(id)
            | Self::RetestCheckResult(id)
            | Self::Task(id) => id,
        }
    }

    /// Rebuild a reference from its stored parts.
    pub fn from_parts(entity_type: EntityType, id: i32) -> Self {
        match entity_type {
            EntityType::Case => Self::Case(id),
            EntityType::Audit => Self::Audit(id),
            EntityType::Page => Self::Page(id),
            EntityType::CheckResult => Self::CheckResult(id),
            EntityType::StatementCheckResult => Self::StatementCheckResult(id),
            EntityType::Report => Self::Report(id),
            EntityType::Section => Self::Section(id),
            EntityType::S3Report => Self::S3Report(id),
            EntityType::Contact => Self::Contact(id),
            EntityType::Comment => Self::Comment(id),
            EntityType::ZendeskTicket => Self::ZendeskTicket(id),
            EntityType::EqualityBodyCorrespondence => Self::EqualityBodyCorrespondence(id),
            EntityType::Retest => Self::Retest(id),
            EntityType::RetestPage => Self::RetestPage(id),
            EntityType::RetestCheckResult => Self::RetestCheckResult(id),
            EntityType::Task => Self::Task(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref_parts_round_trip() {
        for entity_type in EntityType::ALL {
            let reference = EntityRef::from_parts(*entity_type, 17);
            assert_eq!(reference.entity_type(), *entity_type);
            assert_eq!(reference.id(), 17);
        }
    }

    #[test]
    fn test_entity_ref_serializes_as_tagged_union() {
        let json = serde_json::to_value(EntityRef::Contact(4)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "contact", "id": 4}));
    }
}
