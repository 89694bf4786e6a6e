//! Jittered next-check-in scheduling.
//!
//! The next check-in lands `days(frequency)` after the reference instant,
//! shifted by a uniform random offset in `[-JITTER_DAYS, +JITTER_DAYS]` so
//! that relationships sharing a frequency do not all come due on the same
//! day. Both the clock and the random source are injected; nothing in this
//! module reads process-wide state on its own.

use std::ops::RangeInclusive;
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CheckInError;
use crate::recurrence::CheckInFrequency;

/// Maximum jitter applied either side of the target date, in days.
pub const JITTER_DAYS: i64 = 15;

/// Date format used for every stored and returned date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Injected collaborators
// ---------------------------------------------------------------------------

/// Source of jitter offsets.
///
/// Implementations must draw independently on every call and be uniform
/// over the integers of `range`.
pub trait JitterSource: Send + Sync {
    /// Draw an integer from `range` (inclusive on both ends).
    fn draw(&self, range: RangeInclusive<i64>) -> i64;
}

/// Draws from the thread-local RNG on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadJitter;

impl JitterSource for ThreadJitter {
    fn draw(&self, range: RangeInclusive<i64>) -> i64 {
        rand::thread_rng().gen_range(range)
    }
}

/// Deterministic jitter from a seeded `StdRng`.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    /// Create a source that yields the same sequence for the same seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn draw(&self, range: RangeInclusive<i64>) -> i64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(range)
    }
}

/// Always returns the same offset, clamped into the requested range.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub i64);

impl JitterSource for FixedJitter {
    fn draw(&self, range: RangeInclusive<i64>) -> i64 {
        self.0.clamp(*range.start(), *range.end())
    }
}

/// Source of "now".
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Compute the next check-in date for a frequency label.
///
/// # Errors
///
/// Returns [`CheckInError::InvalidFrequency`] if `label` is not recognized.
pub fn next_check_in(
    label: &str,
    reference: DateTime<Utc>,
    jitter: &dyn JitterSource,
) -> Result<NaiveDate, CheckInError> {
    let frequency = CheckInFrequency::from_label(label)?;
    schedule(frequency, reference, jitter)
}

/// Compute the next check-in date for an already-validated frequency.
///
/// # Errors
///
/// Returns [`CheckInError::InvalidField`] only if the result would fall
/// outside the representable date range.
pub fn schedule(
    frequency: CheckInFrequency,
    reference: DateTime<Utc>,
    jitter: &dyn JitterSource,
) -> Result<NaiveDate, CheckInError> {
    let offset = jitter.draw(-JITTER_DAYS..=JITTER_DAYS);
    let total = i64::from(frequency.days()) + offset;

    let date = reference
        .date_naive()
        .checked_add_signed(Duration::days(total))
        .ok_or_else(|| CheckInError::InvalidField {
            field: "CheckInDate",
            reason: format!("{reference} + {total} days is out of range"),
        })?;

    tracing::trace!(%frequency, offset, %date, "scheduled next check-in");
    Ok(date)
}

/// Inclusive window that [`schedule`] can return for `frequency`.
pub fn window(frequency: CheckInFrequency, reference: DateTime<Utc>) -> RangeInclusive<NaiveDate> {
    let base = reference.date_naive();
    let days = i64::from(frequency.days());
    let lo = base + Duration::days(days - JITTER_DAYS);
    let hi = base + Duration::days(days + JITTER_DAYS);
    lo..=hi
}

/// Render a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`CheckInError::InvalidField`] naming `field` when `raw` is not a
/// valid calendar date in that format.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, CheckInError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| CheckInError::InvalidField {
        field,
        reason: format!("expected YYYY-MM-DD, got {raw:?} ({e})"),
    })
}
