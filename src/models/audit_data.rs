//! Read view over an audit and its children.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::entity::{audit, check_result, page, statement_check_result, wcag_definition};
use crate::models::{RetestState, StatementCheckResultState};

/// An audit with its live pages, check results and statement results.
///
/// Soft-deleted rows are never loaded into this view.
#[derive(Debug, Clone, Serialize)]
pub struct AuditData {
    pub audit: audit::Model,
    /// Pages ordered by page type, then creation.
    pub pages: Vec<page::Model>,
    pub check_results: Vec<check_result::Model>,
    pub wcag_definitions: BTreeMap<i32, wcag_definition::Model>,
    pub statement_check_results: Vec<statement_check_result::Model>,
    /// WCAG definition id to catalogue position.
    #[serde(skip)]
    wcag_positions: BTreeMap<i32, usize>,
}

impl AuditData {
    pub fn new(
        audit: audit::Model,
        mut pages: Vec<page::Model>,
        check_results: Vec<check_result::Model>,
        wcag_definitions: Vec<wcag_definition::Model>,
        statement_check_results: Vec<statement_check_result::Model>,
    ) -> Self {
        pages.retain(|p| !p.is_deleted);
        pages.sort_by_key(|p| p.sort_key());
        let mut catalogue: Vec<&wcag_definition::Model> = wcag_definitions.iter().collect();
        catalogue.sort_by_key(|w| w.catalogue_key());
        let wcag_positions = catalogue
            .iter()
            .enumerate()
            .map(|(position, w)| (w.id, position))
            .collect();
        Self {
            audit,
            pages,
            check_results: check_results.into_iter().filter(|r| !r.is_deleted).collect(),
            wcag_definitions: wcag_definitions.into_iter().map(|w| (w.id, w)).collect(),
            statement_check_results: statement_check_results
                .into_iter()
                .filter(|r| !r.is_deleted)
                .collect(),
            wcag_positions,
        }
    }

    pub fn page(&self, id: i32) -> Option<&page::Model> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn wcag_definition(&self, id: i32) -> Option<&wcag_definition::Model> {
        self.wcag_definitions.get(&id)
    }

    /// Pages included in testing.
    pub fn testable_pages(&self) -> Vec<&page::Model> {
        self.pages.iter().filter(|p| p.is_testable()).collect()
    }

    /// Testable pages with at least one failed check.
    pub fn retestable_pages(&self) -> Vec<&page::Model> {
        let failing: BTreeSet<i32> = self
            .check_results
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| r.page_id)
            .collect();
        self.testable_pages()
            .into_iter()
            .filter(|p| failing.contains(&p.id))
            .collect()
    }

    /// Failed checks on testable pages, by page order then WCAG order.
    pub fn failed_check_results(&self) -> Vec<&check_result::Model> {
        let page_order: BTreeMap<i32, (usize, i32)> = self
            .testable_pages()
            .into_iter()
            .map(|p| (p.id, p.sort_key()))
            .collect();

        let mut failed: Vec<&check_result::Model> = self
            .check_results
            .iter()
            .filter(|r| r.is_failed() && page_order.contains_key(&r.page_id))
            .collect();
        failed.sort_by_key(|r| {
            (page_order[&r.page_id], self.wcag_order(r), r.wcag_definition_id, r.id)
        });
        failed
    }

    /// Catalogue position of a result's WCAG definition. Unknown definitions
    /// sort last.
    fn wcag_order(&self, result: &check_result::Model) -> usize {
        self.wcag_positions
            .get(&result.wcag_definition_id)
            .copied()
            .unwrap_or(usize::MAX)
    }

    /// Failed checks not yet marked fixed at the 12-week retest.
    pub fn unfixed_check_results(&self) -> Vec<&check_result::Model> {
        self.failed_check_results()
            .into_iter()
            .filter(|r| r.retest_state != RetestState::Fixed)
            .collect()
    }

    pub fn check_results_for_page(&self, page_id: i32) -> Vec<&check_result::Model> {
        let mut results: Vec<&check_result::Model> = self
            .check_results
            .iter()
            .filter(|r| r.page_id == page_id)
            .collect();
        results.sort_by_key(|r| (self.wcag_order(r), r.wcag_definition_id, r.id));
        results
    }

    /// Statement checks answered "no" at the initial test.
    pub fn failed_statement_check_results(&self) -> Vec<&statement_check_result::Model> {
        let mut failed: Vec<&statement_check_result::Model> = self
            .statement_check_results
            .iter()
            .filter(|r| r.check_result_state == StatementCheckResultState::No)
            .collect();
        failed.sort_by_key(|r| (r.check_type, r.issue_number));
        failed
    }

    /// Failed statement checks still failing at retest.
    pub fn outstanding_statement_check_results(&self) -> Vec<&statement_check_result::Model> {
        self.failed_statement_check_results()
            .into_iter()
            .filter(|r| r.retest_state != StatementCheckResultState::Yes)
            .collect()
    }
}
