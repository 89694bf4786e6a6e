//! Recurrence policy: maps a check-in frequency label to a base interval.
//!
//! [`FREQUENCY_TABLE`] is the single source of truth for which labels are
//! accepted, both when a relationship is created and when its frequency is
//! changed later.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CheckInError;

/// How often a user wants to check in with a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckInFrequency {
    #[serde(rename = "Twice a Month")]
    TwiceAMonth,
    #[serde(rename = "Monthly")]
    Monthly,
    #[serde(rename = "Quarterly")]
    Quarterly,
    #[serde(rename = "Semiannually")]
    Semiannually,
    #[serde(rename = "Twice a Year")]
    TwiceAYear,
}

/// Recognized labels and their base interval in days.
pub const FREQUENCY_TABLE: &[(CheckInFrequency, &str, u32)] = &[
    (CheckInFrequency::TwiceAMonth, "Twice a Month", 15),
    (CheckInFrequency::Monthly, "Monthly", 30),
    (CheckInFrequency::Quarterly, "Quarterly", 90),
    (CheckInFrequency::Semiannually, "Semiannually", 180),
    (CheckInFrequency::TwiceAYear, "Twice a Year", 180),
];

impl CheckInFrequency {
    /// Every recognized frequency, in table order.
    pub fn all() -> impl Iterator<Item = CheckInFrequency> {
        FREQUENCY_TABLE.iter().map(|(f, _, _)| *f)
    }

    /// Look up a frequency by its exact label.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::InvalidFrequency`] for any label not in
    /// [`FREQUENCY_TABLE`]. Matching is case-sensitive.
    pub fn from_label(label: &str) -> Result<Self, CheckInError> {
        FREQUENCY_TABLE
            .iter()
            .find(|(_, l, _)| *l == label)
            .map(|(f, _, _)| *f)
            .ok_or_else(|| CheckInError::InvalidFrequency(label.to_owned()))
    }

    /// The label as stored and shown to callers.
    pub fn label(self) -> &'static str {
        self.entry().1
    }

    /// Base interval in days before the next check-in.
    pub fn days(self) -> u32 {
        self.entry().2
    }

    fn entry(self) -> &'static (CheckInFrequency, &'static str, u32) {
        // Table rows are in declaration order.
        &FREQUENCY_TABLE[self as usize]
    }
}

impl fmt::Display for CheckInFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CheckInFrequency {
    type Err = CheckInError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

/// Base interval in days for a frequency label.
///
/// # Errors
///
/// Returns [`CheckInError::InvalidFrequency`] if the label is not recognized.
pub fn days_for(label: &str) -> Result<u32, CheckInError> {
    CheckInFrequency::from_label(label).map(CheckInFrequency::days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_intervals_match_policy() {
        assert_eq!(days_for("Twice a Month"), Ok(15));
        assert_eq!(days_for("Monthly"), Ok(30));
        assert_eq!(days_for("Quarterly"), Ok(90));
        assert_eq!(days_for("Semiannually"), Ok(180));
        assert_eq!(days_for("Twice a Year"), Ok(180));
    }

    #[test]
    fn unknown_label_rejected() {
        assert_eq!(
            days_for("Weekly"),
            Err(CheckInError::InvalidFrequency("Weekly".into()))
        );
    }

    #[test]
    fn labels_are_case_sensitive() {
        assert!(days_for("monthly").is_err());
        assert!(days_for(" Monthly").is_err());
        assert!(days_for("").is_err());
    }

    #[test]
    fn every_variant_round_trips_through_label() {
        for freq in CheckInFrequency::all() {
            assert_eq!(CheckInFrequency::from_label(freq.label()), Ok(freq));
            assert_eq!(freq.to_string(), freq.label());
        }
        assert_eq!(CheckInFrequency::all().count(), 5);
    }

    #[test]
    fn table_rows_follow_declaration_order() {
        for (idx, (freq, _, _)) in FREQUENCY_TABLE.iter().enumerate() {
            assert_eq!(*freq as usize, idx);
        }
    }

    #[test]
    fn serde_uses_label() {
        let json = serde_json::to_string(&CheckInFrequency::TwiceAMonth).expect("serialize");
        assert_eq!(json, "\"Twice a Month\"");
        let parsed: CheckInFrequency =
            serde_json::from_str("\"Semiannually\"").expect("deserialize");
        assert_eq!(parsed, CheckInFrequency::Semiannually);
    }

    #[test]
    fn from_str_parses_labels() {
        let freq: CheckInFrequency = "Quarterly".parse().expect("parse");
        assert_eq!(freq.days(), 90);
    }
}
