//! iCalendar renewal reminders
//!
//! A reminder is a single all-day event one calendar month before a policy
//! expires. Dates are handled as plain calendar dates so no local time zone
//! can shift the result by a day.

use crate::policy::InsurancePolicy;
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use thiserror::Error;

/// File name offered for the generated calendar file
pub const REMINDER_FILE_NAME: &str = "insurance_reminder.ics";

const PRODUCT_ID: &str = "-//InsurTrack//Policy Reminder//EN";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("cannot compute a reminder date for expiry {0}")]
    DateOutOfRange(NaiveDate),
}

/// One month before `end_date`, clamped to the last day of a shorter month
pub fn reminder_date(end_date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    end_date
        .checked_sub_months(Months::new(1))
        .ok_or(CalendarError::DateOutOfRange(end_date))
}

/// Escape TEXT values per RFC 5545 section 3.3.11
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn ics_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Build the reminder calendar for one policy, stamped at `now`
pub fn reminder_ics(policy: &InsurancePolicy, now: DateTime<Utc>) -> Result<String, CalendarError> {
    let start = reminder_date(policy.end_date)?;
    let end = start
        .checked_add_days(Days::new(1))
        .ok_or(CalendarError::DateOutOfRange(policy.end_date))?;

    let summary = format!(
        "Renewal reminder: {} {} insurance",
        policy.provider, policy.policy_type
    );
    let description = format!(
        "Policy {} expires on {}. Review your coverage and renew or shop for quotes.",
        policy.policy_number, policy.end_date
    );

    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODUCT_ID),
        "CALSCALE:GREGORIAN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@insurtrack", escape_text(&policy.id)),
        format!("DTSTAMP:{}", now.format("%Y%m%dT%H%M%SZ")),
        format!("DTSTART;VALUE=DATE:{}", ics_date(start)),
        format!("DTEND;VALUE=DATE:{}", ics_date(end)),
        format!("SUMMARY:{}", escape_text(&summary)),
        format!("DESCRIPTION:{}", escape_text(&description)),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];

    let mut ics = lines.join("\r\n");
    ics.push_str("\r\n");
    Ok(ics)
}
