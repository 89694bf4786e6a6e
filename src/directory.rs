//! Relationship directory: the four point operations.
//!
//! Each operation validates its input, prepares the store call with the
//! engine in `checkin_core`, issues exactly one store operation and maps the
//! outcome onto [`DirectoryError`]. Validation failures never reach the
//! store. Nothing is retried here.

use std::sync::Arc;

use checkin_core::scheduler::{Clock, JitterSource, SystemClock, ThreadJitter, schedule};
use checkin_core::{
    CheckInError, CreateRequest, DeleteRequest, GetRequest, Relationship, RelationshipKey,
    UpdateRequest, UpdateSummary, build_update, validate_create, validate_identity,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::store::{RelationshipStore, StoreError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Stable category of a [`DirectoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingIdentity,
    MissingRequiredField,
    InvalidFrequency,
    InvalidField,
    NoFieldsProvided,
    NotFound,
    StoreUnavailable,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingIdentity => "MissingIdentity",
            ErrorKind::MissingRequiredField => "MissingRequiredField",
            ErrorKind::InvalidFrequency => "InvalidFrequency",
            ErrorKind::InvalidField => "InvalidField",
            ErrorKind::NoFieldsProvided => "NoFieldsProvided",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::StoreUnavailable => "StoreUnavailable",
        }
    }
}

/// Failure of a directory operation.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Input rejected before any store call.
    #[error(transparent)]
    Validation(#[from] CheckInError),

    /// No item under the requested key.
    #[error("no contact found with UserId='{user_id}' and ContactId='{contact_id}'")]
    NotFound { user_id: String, contact_id: String },

    /// The store call failed; the only category worth retrying.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::Validation(e) => match e {
                CheckInError::MissingIdentity => ErrorKind::MissingIdentity,
                CheckInError::MissingRequiredField(_) => ErrorKind::MissingRequiredField,
                CheckInError::InvalidFrequency(_) => ErrorKind::InvalidFrequency,
                CheckInError::InvalidField { .. } => ErrorKind::InvalidField,
                CheckInError::NoFieldsProvided => ErrorKind::NoFieldsProvided,
            },
            DirectoryError::NotFound { .. } => ErrorKind::NotFound,
            DirectoryError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }

    /// `true` only for store failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DirectoryError::StoreUnavailable(_))
    }

    fn not_found(key: &RelationshipKey) -> Self {
        DirectoryError::NotFound {
            user_id: key.user_id.clone(),
            contact_id: key.contact_id.clone(),
        }
    }

    fn from_store(key: &RelationshipKey, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found(key),
            other => {
                error!(user_id = %key.user_id, contact_id = %key.contact_id, error = %other, "store call failed");
                DirectoryError::StoreUnavailable(other.to_string())
            }
        }
    }
}

/// Acknowledgement of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfirmation {
    pub user_id: String,
    pub contact_id: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Entry points for creating, reading, updating and deleting relationships.
///
/// Holds only shared handles (store, clock, jitter); no per-request state
/// survives between calls. Cheap to clone.
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn RelationshipStore>,
    clock: Arc<dyn Clock>,
    jitter: Arc<dyn JitterSource>,
}

impl Directory {
    /// A directory over `store` using the wall clock and thread RNG.
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            jitter: Arc::new(ThreadJitter),
        }
    }

    /// Replace the clock used for "now".
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the jitter source used for check-in dates.
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Create (or overwrite) a relationship and schedule its first check-in.
    ///
    /// # Errors
    ///
    /// Validation errors for bad input; [`DirectoryError::StoreUnavailable`]
    /// if the put fails.
    pub async fn create(&self, req: &CreateRequest) -> Result<Relationship, DirectoryError> {
        validate_identity(&req.user_id, &req.contact_id)?;
        let valid = validate_create(req)?;

        let check_in_date = schedule(valid.frequency, self.clock.now(), self.jitter.as_ref())?;
        let item = Relationship {
            user_id: valid.key.user_id.clone(),
            contact_id: valid.key.contact_id.clone(),
            name: valid.name,
            birthday: valid.birthday,
            check_in_frequency: valid.frequency,
            check_in_date,
        };

        debug!(user_id = %item.user_id, contact_id = %item.contact_id, %check_in_date, "attempting to add connection");
        self.store
            .put(&item)
            .await
            .map_err(|e| DirectoryError::from_store(&valid.key, e))?;

        info!(
            user_id = %item.user_id,
            contact_id = %item.contact_id,
            %check_in_date,
            "added connection"
        );
        Ok(item)
    }

    /// Fetch one relationship.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] on a miss.
    pub async fn get(&self, req: &GetRequest) -> Result<Relationship, DirectoryError> {
        let key = validate_identity(&req.user_id, &req.contact_id)?;

        match self.store.get(&key).await {
            Ok(Some(item)) => {
                debug!(user_id = %key.user_id, contact_id = %key.contact_id, "retrieved connection");
                Ok(item)
            }
            Ok(None) => {
                warn!(user_id = %key.user_id, contact_id = %key.contact_id, "no connection found");
                Err(DirectoryError::not_found(&key))
            }
            Err(e) => Err(DirectoryError::from_store(&key, e)),
        }
    }

    /// Apply a partial update. Changing the frequency reschedules the
    /// check-in date in the same store call.
    ///
    /// # Errors
    ///
    /// Validation errors (including [`CheckInError::NoFieldsProvided`]),
    /// [`DirectoryError::NotFound`] if the key does not exist.
    pub async fn update(&self, req: &UpdateRequest) -> Result<UpdateSummary, DirectoryError> {
        let key = validate_identity(&req.user_id, &req.contact_id)?;
        let (spec, fields_touched) =
            build_update(&req.changes(), self.clock.now(), self.jitter.as_ref())?;

        debug!(user_id = %key.user_id, contact_id = %key.contact_id, ?spec, "applying update");
        let updated_attributes = match self.store.update(&key, &spec).await {
            Ok(attrs) => attrs,
            Err(StoreError::NotFound(_)) => {
                warn!(user_id = %key.user_id, contact_id = %key.contact_id, "update target missing");
                return Err(DirectoryError::not_found(&key));
            }
            Err(e) => return Err(DirectoryError::from_store(&key, e)),
        };

        info!(
            user_id = %key.user_id,
            contact_id = %key.contact_id,
            fields_touched,
            "updated connection"
        );
        Ok(UpdateSummary {
            user_id: key.user_id,
            contact_id: key.contact_id,
            fields_touched,
            updated_attributes,
        })
    }

    /// Delete a relationship. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// [`CheckInError::MissingIdentity`] or
    /// [`DirectoryError::StoreUnavailable`].
    pub async fn delete(&self, req: &DeleteRequest) -> Result<DeleteConfirmation, DirectoryError> {
        let key = validate_identity(&req.user_id, &req.contact_id)?;

        self.store
            .delete(&key)
            .await
            .map_err(|e| DirectoryError::from_store(&key, e))?;

        info!(user_id = %key.user_id, contact_id = %key.contact_id, "deleted connection");
        Ok(DeleteConfirmation {
            message: format!(
                "Successfully deleted contact {} for user {}",
                key.contact_id, key.user_id
            ),
            user_id: key.user_id,
            contact_id: key.contact_id,
        })
    }
}
