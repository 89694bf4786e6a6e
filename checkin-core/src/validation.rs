//! Input validation run before any store call.
//!
//! Validators return parsed values rather than a bare `Ok(())` so callers
//! never re-parse a frequency label or birthday after it was checked.

use chrono::NaiveDate;

use crate::error::CheckInError;
use crate::recurrence::CheckInFrequency;
use crate::scheduler::parse_date;
use crate::types::{CreateRequest, RelationshipKey};

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCreate {
    pub key: RelationshipKey,
    pub name: String,
    pub birthday: Option<NaiveDate>,
    pub frequency: CheckInFrequency,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Check that both key components carry a non-whitespace value.
///
/// # Errors
///
/// Returns [`CheckInError::MissingIdentity`] if either is blank.
pub fn validate_identity(user_id: &str, contact_id: &str) -> Result<RelationshipKey, CheckInError> {
    if is_blank(user_id) || is_blank(contact_id) {
        return Err(CheckInError::MissingIdentity);
    }
    Ok(RelationshipKey::new(user_id, contact_id))
}

/// Validate every field required to create a relationship.
///
/// Checks, in order: `UserId`, `ContactId`, `Name` and `CheckInFrequency`
/// are non-blank, the frequency label is recognized, and `Birthday` (if
/// given and non-empty) is a `YYYY-MM-DD` date.
///
/// # Errors
///
/// - [`CheckInError::MissingRequiredField`] for the first blank field.
/// - [`CheckInError::InvalidFrequency`] for an unrecognized label.
/// - [`CheckInError::InvalidField`] for a malformed birthday.
pub fn validate_create(req: &CreateRequest) -> Result<ValidCreate, CheckInError> {
    let required = [
        ("UserId", req.user_id.as_str()),
        ("ContactId", req.contact_id.as_str()),
        ("Name", req.name.as_str()),
        ("CheckInFrequency", req.check_in_frequency.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| is_blank(v)) {
        return Err(CheckInError::MissingRequiredField(*field));
    }

    let frequency = CheckInFrequency::from_label(&req.check_in_frequency)?;
    let birthday = parse_birthday(req.birthday.as_deref())?;

    Ok(ValidCreate {
        key: RelationshipKey::new(&req.user_id, &req.contact_id),
        name: req.name.clone(),
        birthday,
        frequency,
    })
}

/// Parse an optional birthday; `None` and empty strings both mean "no birthday".
///
/// # Errors
///
/// Returns [`CheckInError::InvalidField`] if a non-empty value is not a date.
pub fn parse_birthday(raw: Option<&str>) -> Result<Option<NaiveDate>, CheckInError> {
    match raw {
        None => Ok(None),
        Some(s) if is_blank(s) => Ok(None),
        Some(s) => parse_date("Birthday", s).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> CreateRequest {
        CreateRequest {
            user_id: "u1".into(),
            contact_id: "c1".into(),
            name: "Alice".into(),
            birthday: None,
            check_in_frequency: "Monthly".into(),
        }
    }

    #[test]
    fn identity_requires_both_components() {
        assert!(validate_identity("u1", "c1").is_ok());
        assert_eq!(validate_identity("", "c1"), Err(CheckInError::MissingIdentity));
        assert_eq!(validate_identity("u1", "   "), Err(CheckInError::MissingIdentity));
        assert_eq!(validate_identity("\t", "\n"), Err(CheckInError::MissingIdentity));
    }

    #[test]
    fn identity_preserves_raw_values() {
        let key = validate_identity(" u1", "c1 ").expect("valid");
        assert_eq!(key.user_id, " u1");
        assert_eq!(key.contact_id, "c1 ");
    }

    #[test]
    fn valid_create_is_parsed() {
        let valid = validate_create(&alice()).expect("valid");
        assert_eq!(valid.key, RelationshipKey::new("u1", "c1"));
        assert_eq!(valid.frequency, CheckInFrequency::Monthly);
        assert_eq!(valid.birthday, None);
    }

    #[test]
    fn create_reports_first_missing_field() {
        let req = CreateRequest {
            user_id: String::new(),
            ..alice()
        };
        assert_eq!(
            validate_create(&req),
            Err(CheckInError::MissingRequiredField("UserId"))
        );

        let req = CreateRequest {
            contact_id: " ".into(),
            ..alice()
        };
        assert_eq!(
            validate_create(&req),
            Err(CheckInError::MissingRequiredField("ContactId"))
        );

        let req = CreateRequest {
            name: String::new(),
            ..alice()
        };
        assert_eq!(
            validate_create(&req),
            Err(CheckInError::MissingRequiredField("Name"))
        );

        let req = CreateRequest {
            check_in_frequency: String::new(),
            ..alice()
        };
        assert_eq!(
            validate_create(&req),
            Err(CheckInError::MissingRequiredField("CheckInFrequency"))
        );
    }

    #[test]
    fn create_rejects_unknown_frequency() {
        let req = CreateRequest {
            check_in_frequency: "Hourly".into(),
            ..alice()
        };
        assert_eq!(
            validate_create(&req),
            Err(CheckInError::InvalidFrequency("Hourly".into()))
        );
    }

    #[test]
    fn create_parses_birthday() {
        let req = CreateRequest {
            birthday: Some("1990-05-01".into()),
            ..alice()
        };
        let valid = validate_create(&req).expect("valid");
        assert_eq!(valid.birthday, NaiveDate::from_ymd_opt(1990, 5, 1));

        let req = CreateRequest {
            birthday: Some("May 1st".into()),
            ..alice()
        };
        assert!(matches!(
            validate_create(&req),
            Err(CheckInError::InvalidField { field: "Birthday", .. })
        ));
    }

    #[test]
    fn blank_birthday_means_none() {
        assert_eq!(parse_birthday(Some("")), Ok(None));
        assert_eq!(parse_birthday(None), Ok(None));
    }
}
