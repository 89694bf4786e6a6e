//! Relationship data model and request shapes.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::recurrence::CheckInFrequency;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Composite key of a relationship: owner plus contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipKey {
    /// Partition component: the owning user.
    pub user_id: String,
    /// Sort component: the tracked contact.
    pub contact_id: String,
}

impl RelationshipKey {
    pub fn new(user_id: impl Into<String>, contact_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            contact_id: contact_id.into(),
        }
    }
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.contact_id)
    }
}

// ---------------------------------------------------------------------------
// Stored entity
// ---------------------------------------------------------------------------

/// One user's tracked contact, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub user_id: String,
    pub contact_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    pub check_in_frequency: CheckInFrequency,
    /// Always derived from `check_in_frequency` by the scheduler.
    pub check_in_date: NaiveDate,
}

impl Relationship {
    /// The identity of this relationship.
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey::new(&self.user_id, &self.contact_id)
    }
}

// ---------------------------------------------------------------------------
// Tri-state patch value
// ---------------------------------------------------------------------------

/// A field in a sparse update.
///
/// `Unset` means the caller did not mention the field, `Null` means the
/// caller explicitly cleared it, and `Value` carries a new value. On the
/// wire an absent key deserializes to `Unset` (via `#[serde(default)]`) and
/// a JSON `null` to `Null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unset,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Unset | Patch::Null => serializer.serialize_none(),
            Patch::Value(v) => serializer.serialize_some(v),
        }
    }
}

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

/// Create a relationship. `check_in_frequency` and `birthday` stay raw
/// strings so bad labels and dates surface as validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub contact_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default)]
    pub check_in_frequency: String,
}

/// Point lookup or delete by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub contact_id: String,
}

pub type GetRequest = KeyRequest;
pub type DeleteRequest = KeyRequest;

/// The updatable fields of a relationship, each tri-state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipChanges {
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub birthday: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub check_in_frequency: Patch<String>,
}

impl RelationshipChanges {
    /// `true` if no field was mentioned at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_unset() && self.birthday.is_unset() && self.check_in_frequency.is_unset()
    }
}

/// Sparse update of one relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub contact_id: String,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub birthday: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub check_in_frequency: Patch<String>,
}

impl UpdateRequest {
    /// Build a request from a key and a set of changes.
    pub fn new(key: RelationshipKey, changes: RelationshipChanges) -> Self {
        Self {
            user_id: key.user_id,
            contact_id: key.contact_id,
            name: changes.name,
            birthday: changes.birthday,
            check_in_frequency: changes.check_in_frequency,
        }
    }

    /// The field changes, without the key.
    pub fn changes(&self) -> RelationshipChanges {
        RelationshipChanges {
            name: self.name.clone(),
            birthday: self.birthday.clone(),
            check_in_frequency: self.check_in_frequency.clone(),
        }
    }
}
