//! Partial update builder.
//!
//! Turns a sparse [`RelationshipChanges`] into an [`UpdateSpec`]: a list of
//! typed field assignments that a store applies as data. Fields the caller
//! did not mention never appear in the spec. A frequency change always
//! carries a freshly scheduled `CheckInDate` with it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CheckInError;
use crate::recurrence::CheckInFrequency;
use crate::scheduler::{JitterSource, format_date, schedule};
use crate::types::{Patch, Relationship, RelationshipChanges};
use crate::validation::parse_birthday;

/// A stored attribute that an update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Birthday,
    CheckInFrequency,
    CheckInDate,
}

impl Field {
    /// Stored attribute name.
    pub fn name(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Birthday => "Birthday",
            Field::CheckInFrequency => "CheckInFrequency",
            Field::CheckInDate => "CheckInDate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `field = value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAssignment {
    Name(String),
    /// `None` clears the birthday.
    Birthday(Option<NaiveDate>),
    CheckInFrequency(CheckInFrequency),
    CheckInDate(NaiveDate),
}

impl FieldAssignment {
    pub fn field(&self) -> Field {
        match self {
            FieldAssignment::Name(_) => Field::Name,
            FieldAssignment::Birthday(_) => Field::Birthday,
            FieldAssignment::CheckInFrequency(_) => Field::CheckInFrequency,
            FieldAssignment::CheckInDate(_) => Field::CheckInDate,
        }
    }

    /// Rendered value; `None` for a cleared field.
    pub fn value(&self) -> Option<String> {
        match self {
            FieldAssignment::Name(name) => Some(name.clone()),
            FieldAssignment::Birthday(date) => date.map(format_date),
            FieldAssignment::CheckInFrequency(freq) => Some(freq.label().to_owned()),
            FieldAssignment::CheckInDate(date) => Some(format_date(*date)),
        }
    }

    /// Write this assignment into a relationship.
    pub fn apply_to(&self, rel: &mut Relationship) {
        match self {
            FieldAssignment::Name(name) => rel.name.clone_from(name),
            FieldAssignment::Birthday(date) => rel.birthday = *date,
            FieldAssignment::CheckInFrequency(freq) => rel.check_in_frequency = *freq,
            FieldAssignment::CheckInDate(date) => rel.check_in_date = *date,
        }
    }
}

/// Post-update values of the touched attributes, keyed by attribute name.
pub type UpdatedAttributes = BTreeMap<String, Option<String>>;

/// An ordered, non-empty set of field assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSpec {
    assignments: Vec<FieldAssignment>,
}

impl UpdateSpec {
    pub fn assignments(&self) -> &[FieldAssignment] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether `field` is assigned.
    pub fn touches(&self, field: Field) -> bool {
        self.assignments.iter().any(|a| a.field() == field)
    }

    /// Apply every assignment to `rel` in order.
    pub fn apply_to(&self, rel: &mut Relationship) {
        for assignment in &self.assignments {
            assignment.apply_to(rel);
        }
    }

    /// Read the touched attributes back from a stored relationship.
    pub fn read_back(&self, rel: &Relationship) -> UpdatedAttributes {
        self.assignments
            .iter()
            .map(|a| {
                let value = match a.field() {
                    Field::Name => Some(rel.name.clone()),
                    Field::Birthday => rel.birthday.map(format_date),
                    Field::CheckInFrequency => Some(rel.check_in_frequency.label().to_owned()),
                    Field::CheckInDate => Some(format_date(rel.check_in_date)),
                };
                (a.field().name().to_owned(), value)
            })
            .collect()
    }

    fn push(&mut self, assignment: FieldAssignment) {
        self.assignments.push(assignment);
    }
}

/// Summary of an update as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub user_id: String,
    pub contact_id: String,
    /// Logical fields touched; frequency and date count as one.
    pub fields_touched: usize,
    pub updated_attributes: UpdatedAttributes,
}

/// Build the minimal update for `changes`.
///
/// Returns the spec and the number of logical fields touched, counting
/// `CheckInFrequency` + `CheckInDate` as a single pair.
///
/// # Errors
///
/// - [`CheckInError::MissingRequiredField`] if `Name` or `CheckInFrequency`
///   is explicitly null or blank (only `Birthday` can be cleared).
/// - [`CheckInError::InvalidFrequency`] for an unrecognized label.
/// - [`CheckInError::InvalidField`] for a malformed birthday.
/// - [`CheckInError::NoFieldsProvided`] if nothing was mentioned.
pub fn build_update(
    changes: &RelationshipChanges,
    now: DateTime<Utc>,
    jitter: &dyn JitterSource,
) -> Result<(UpdateSpec, usize), CheckInError> {
    // An unknown frequency label outranks every other field error.
    let rescheduled = match changes.check_in_frequency.as_ref() {
        Patch::Unset => None,
        Patch::Null => return Err(CheckInError::MissingRequiredField("CheckInFrequency")),
        Patch::Value(label) => {
            let frequency = CheckInFrequency::from_label(label)?;
            Some((frequency, schedule(frequency, now, jitter)?))
        }
    };

    let mut spec = UpdateSpec::default();
    let mut touched = 0usize;

    match changes.name.as_ref() {
        Patch::Unset => {}
        Patch::Null => return Err(CheckInError::MissingRequiredField("Name")),
        Patch::Value(name) if name.trim().is_empty() => {
            return Err(CheckInError::MissingRequiredField("Name"));
        }
        Patch::Value(name) => {
            spec.push(FieldAssignment::Name(name.clone()));
            touched += 1;
        }
    }

    match changes.birthday.as_ref() {
        Patch::Unset => {}
        Patch::Null => {
            spec.push(FieldAssignment::Birthday(None));
            touched += 1;
        }
        Patch::Value(raw) => {
            spec.push(FieldAssignment::Birthday(parse_birthday(Some(raw.as_str()))?));
            touched += 1;
        }
    }

    if let Some((frequency, date)) = rescheduled {
        spec.push(FieldAssignment::CheckInFrequency(frequency));
        spec.push(FieldAssignment::CheckInDate(date));
        touched += 1;
    }

    if spec.is_empty() {
        return Err(CheckInError::NoFieldsProvided);
    }

    tracing::trace!(assignments = spec.len(), touched, "built partial update");
    Ok((spec, touched))
}
