//! Correspondence due-date arithmetic.
//!
//! Due dates are recomputed only when their trigger field changed between
//! the stored and the edited case; dates with an unchanged trigger are left
//! alone so manual overrides survive unrelated saves.

use chrono::{Days, NaiveDate};

use crate::entity::case;

pub const ONE_WEEK_IN_DAYS: u64 = 7;
pub const FOUR_WEEKS_IN_DAYS: u64 = 4 * ONE_WEEK_IN_DAYS;
pub const TWELVE_WEEKS_IN_DAYS: u64 = 12 * ONE_WEEK_IN_DAYS;

fn add_days(date: Option<NaiveDate>, days: u64) -> Option<NaiveDate> {
    date.and_then(|d| d.checked_add_days(Days::new(days)))
}

/// Report follow-up due dates for a report sent on `sent`.
pub fn report_followup_due_dates(
    sent: Option<NaiveDate>,
) -> (Option<NaiveDate>, Option<NaiveDate>, Option<NaiveDate>) {
    (
        add_days(sent, ONE_WEEK_IN_DAYS),
        add_days(sent, FOUR_WEEKS_IN_DAYS),
        add_days(sent, TWELVE_WEEKS_IN_DAYS),
    )
}

/// Recompute the due dates of `new` whose trigger differs from `old`.
///
/// Returns the names of the trigger fields that fired.
pub fn apply_schedule(old: &case::Model, new: &mut case::Model) -> Vec<&'static str> {
    let mut fired = Vec::new();

    if old.report_sent_date != new.report_sent_date {
        let (week_1, week_4, week_12) = report_followup_due_dates(new.report_sent_date);
        new.report_followup_week_1_due_date = week_1;
        new.report_followup_week_4_due_date = week_4;
        new.report_followup_week_12_due_date = week_12;
        fired.push("report_sent_date");
    }

    if old.seven_day_no_contact_email_sent_date != new.seven_day_no_contact_email_sent_date {
        let sent = new.seven_day_no_contact_email_sent_date;
        new.no_contact_one_week_chaser_due_date = add_days(sent, ONE_WEEK_IN_DAYS);
        new.no_contact_four_week_chaser_due_date = add_days(sent, FOUR_WEEKS_IN_DAYS);
        fired.push("seven_day_no_contact_email_sent_date");
    }

    if old.twelve_week_update_requested_date != new.twelve_week_update_requested_date {
        new.twelve_week_1_week_chaser_due_date =
            add_days(new.twelve_week_update_requested_date, ONE_WEEK_IN_DAYS);
        fired.push("twelve_week_update_requested_date");
    }

    fired
}

/// Names of the due dates maintained by the scheduler.
pub const DUE_DATE_FIELDS: &[&str] = &[
    "report_followup_week_1_due_date",
    "report_followup_week_4_due_date",
    "report_followup_week_12_due_date",
    "no_contact_one_week_chaser_due_date",
    "no_contact_four_week_chaser_due_date",
    "twelve_week_1_week_chaser_due_date",
];

/// A due date that has passed without the matching chaser being sent.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct OverdueItem {
    pub field: &'static str,
    pub description: &'static str,
    pub due_date: NaiveDate,
}

/// Overdue correspondence for `case` on `today`.
pub fn overdue_items(case: &case::Model, today: NaiveDate) -> Vec<OverdueItem> {
    let checks: [(&'static str, &'static str, Option<NaiveDate>, bool); 5] = [
        (
            "no_contact_one_week_chaser_due_date",
            "No contact details response overdue",
            case.no_contact_one_week_chaser_due_date,
            case.no_contact_one_week_chaser_sent_date.is_none(),
        ),
        (
            "no_contact_four_week_chaser_due_date",
            "No contact details response overdue (4 weeks)",
            case.no_contact_four_week_chaser_due_date,
            case.no_contact_four_week_chaser_sent_date.is_none(),
        ),
        (
            "report_followup_week_1_due_date",
            "1-week follow-up to report due",
            case.report_followup_week_1_due_date,
            case.report_followup_week_1_sent_date.is_none()
                && case.report_acknowledged_date.is_none(),
        ),
        (
            "report_followup_week_4_due_date",
            "4-week follow-up to report due",
            case.report_followup_week_4_due_date,
            case.report_followup_week_4_sent_date.is_none()
                && case.report_acknowledged_date.is_none(),
        ),
        (
            "twelve_week_1_week_chaser_due_date",
            "1-week follow-up to 12-week update request due",
            case.twelve_week_1_week_chaser_due_date,
            case.twelve_week_1_week_chaser_sent_date.is_none()
                && case.twelve_week_correspondence_acknowledged_date.is_none(),
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(field, description, due, outstanding)| match due {
            Some(due_date) if outstanding && due_date < today => Some(OverdueItem {
                field,
                description,
                due_date,
            }),
            _ => None,
        })
        .collect()
}
