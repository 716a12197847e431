//! Reconciled scheduled/estimated time pairs.

use std::fmt;

use chrono::Duration;

use super::TimePoint;

/// The live estimate for an event: either a concrete time or a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Estimate {
    /// A concrete predicted (or actual) time.
    Time(TimePoint),
    /// Running to schedule; the estimate equals the scheduled time.
    OnTime,
    /// Late, with no predicted time available.
    Delayed,
    /// The event will not happen.
    Cancelled,
    /// The provider has no information.
    NoReport,
}

impl Estimate {
    /// Returns the concrete time, if the estimate has one.
    pub fn time(&self) -> Option<TimePoint> {
        match self {
            Estimate::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Estimate {
    /// Renders the estimate the way departure boards show it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Time(t) => write!(f, "{t}"),
            Estimate::OnTime => f.write_str("On time"),
            Estimate::Delayed => f.write_str("Delayed"),
            Estimate::Cancelled => f.write_str("Cancelled"),
            Estimate::NoReport => f.write_str("No report"),
        }
    }
}

/// A scheduled time together with its reconciled estimate.
///
/// # Examples
///
/// ```
/// use departure_board::domain::{Estimate, ServiceTime, TimePoint};
///
/// let scheduled = TimePoint::parse_hhmm("10:00").unwrap();
/// let on_time = ServiceTime::new(scheduled, Estimate::OnTime);
/// assert_eq!(on_time.expected().to_string(), "10:00");
///
/// let late = ServiceTime::new(
///     scheduled,
///     Estimate::Time(TimePoint::parse_hhmm("10:07").unwrap()),
/// );
/// assert_eq!(late.expected().to_string(), "10:07");
/// assert!(late.is_delayed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceTime {
    pub scheduled: TimePoint,
    pub estimate: Estimate,
}

/// Estimates further than this from the scheduled time are taken to be on
/// the other side of midnight.
const ESTIMATE_ROLLOVER_HOURS: i64 = 6;

impl ServiceTime {
    pub fn new(scheduled: TimePoint, estimate: Estimate) -> Self {
        Self {
            scheduled,
            estimate,
        }
    }

    /// The controlling time: the estimate when it is concrete, else the
    /// scheduled time.
    pub fn expected(&self) -> TimePoint {
        self.estimate.time().unwrap_or(self.scheduled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.estimate == Estimate::Cancelled
    }

    /// Returns true for an explicit delay, or a concrete estimate later than
    /// scheduled.
    pub fn is_delayed(&self) -> bool {
        match self.estimate {
            Estimate::Delayed => true,
            Estimate::Time(_) => self.delay_minutes().is_some_and(|m| m > 0),
            _ => false,
        }
    }

    /// Minutes between scheduled and a concrete estimate.
    ///
    /// Negative when running early; `None` when there is no concrete estimate.
    pub fn delay_minutes(&self) -> Option<i64> {
        let estimate = self.estimate.time()?;
        Some(estimate.minutes_since(self.scheduled, Duration::hours(ESTIMATE_ROLLOVER_HOURS)))
    }
}
