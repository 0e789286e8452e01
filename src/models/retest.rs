//! Equality-body retest enums and DTOs.

use chrono::NaiveDate;
use sea_orm::sea_query::StringLen;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{RetestState, StatementComplianceState};

choice_enum! {
    pub enum RetestComplianceState {
        NotKnown => "not-known", "Not known",
        Compliant => "compliant", "Compliant",
        PartiallyCompliant => "partially-compliant", "Partially compliant",
    }
}

/// `id_within_case` of the synthetic row standing for the original test.
pub const ORIGINAL_TEST_ID_WITHIN_CASE: i32 = 0;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StartRetestRequest {
    pub date_of_retest: Option<NaiveDate>,
    #[serde(default)]
    pub retest_notes: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RetestCheckResultUpdate {
    pub retest_check_result_id: i32,
    pub version: i32,
    pub retest_state: RetestState,
    #[serde(default)]
    pub retest_notes: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RetestPageUpdate {
    /// Version of the retest page as read by the client.
    pub version: i32,
    pub results: Vec<RetestCheckResultUpdate>,
    pub complete_date: Option<NaiveDate>,
    pub missing_date: Option<NaiveDate>,
    #[serde(default)]
    pub additional_issues_notes: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RetestDecision {
    pub version: i32,
    pub retest_compliance_state: RetestComplianceState,
    #[serde(default)]
    pub compliance_notes: String,
    pub statement_compliance_state: Option<StatementComplianceState>,
}
