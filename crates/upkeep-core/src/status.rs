//! Maintenance status, computed on read, never stored.
//!
//! An item is due `interval_days` after it was last serviced. It turns
//! [`Status::DueSoon`] during the seven days before that and
//! [`Status::Overdue`] once the due date has passed.

use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentRecord;

/// Length of the "due soon" warning window.
pub const DUE_SOON_WINDOW: Days = Days::new(7);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Unknown,
  Overdue,
  DueSoon,
  Ok,
}

impl Status {
  pub fn label(self) -> &'static str {
    match self {
      Self::Unknown => "Unknown",
      Self::Overdue => "Overdue",
      Self::DueSoon => "Due Soon",
      Self::Ok => "OK",
    }
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// The date an item next needs servicing, or `None` if either input is
/// missing, the interval is not positive, or the date overflows.
pub fn next_due(serviced: Option<NaiveDate>, interval_days: Option<i64>) -> Option<NaiveDate> {
  let days = u64::try_from(interval_days?).ok().filter(|d| *d >= 1)?;
  serviced?.checked_add_days(Days::new(days))
}

/// Derive the status of an item as of `now`.
///
/// `now` is compared against midnight of the due date, so the due date itself
/// is already overdue from the first second after midnight.
pub fn compute_status(
  serviced: Option<NaiveDate>,
  interval_days: Option<i64>,
  now: NaiveDateTime,
) -> Status {
  let Some(due) = next_due(serviced, interval_days) else {
    return Status::Unknown;
  };
  let due_at = due.and_time(NaiveTime::MIN);
  let Some(warn_at) = due.checked_sub_days(DUE_SOON_WINDOW) else {
    return Status::Unknown;
  };

  if now > due_at {
    Status::Overdue
  } else if now > warn_at.and_time(NaiveTime::MIN) {
    Status::DueSoon
  } else {
    Status::Ok
  }
}

impl EquipmentRecord {
  pub fn next_due(&self) -> Option<NaiveDate> {
    next_due(self.serviced_date.get(), self.interval_days.get())
  }

  pub fn status(&self, now: NaiveDateTime) -> Status {
    compute_status(self.serviced_date.get(), self.interval_days.get(), now)
  }
}

// ─── Smart filter ────────────────────────────────────────────────────────────

/// Status-based list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
  #[default]
  All,
  Overdue,
  DueSoon,
  OverdueOrDueSoon,
  Ok,
}

impl StatusFilter {
  pub fn matches(self, status: Status) -> bool {
    match self {
      Self::All => true,
      Self::Overdue => status == Status::Overdue,
      Self::DueSoon => status == Status::DueSoon,
      Self::OverdueOrDueSoon => matches!(status, Status::Overdue | Status::DueSoon),
      Self::Ok => status == Status::Ok,
    }
  }
}

/// Per-status tallies over a set of items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
  pub total:    usize,
  pub overdue:  usize,
  pub due_soon: usize,
  pub ok:       usize,
  pub unknown:  usize,
}

impl StatusCounts {
  pub fn tally(statuses: impl IntoIterator<Item = Status>) -> Self {
    statuses.into_iter().fold(Self::default(), |mut c, s| {
      c.total += 1;
      match s {
        Status::Overdue => c.overdue += 1,
        Status::DueSoon => c.due_soon += 1,
        Status::Ok => c.ok += 1,
        Status::Unknown => c.unknown += 1,
      }
      c
    })
  }

  pub fn overdue_or_due_soon(&self) -> usize { self.overdue + self.due_soon }

  /// The number of items a given filter would show.
  pub fn count(&self, filter: StatusFilter) -> usize {
    match filter {
      StatusFilter::All => self.total,
      StatusFilter::Overdue => self.overdue,
      StatusFilter::DueSoon => self.due_soon,
      StatusFilter::OverdueOrDueSoon => self.overdue_or_due_soon(),
      StatusFilter::Ok => self.ok,
    }
  }
}
