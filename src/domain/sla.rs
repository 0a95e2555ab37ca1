//! SLA deadline calculation and live urgency evaluation.
//!
//! [`deadline_for`] runs once at ticket creation; the stored deadline is
//! never recomputed afterwards. [`evaluate`] is pure and re-run on every
//! read, so listings always show a live countdown without persisting
//! any derived state.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ticket::{Criticality, TicketStatus};

/// Live urgency classification derived from the deadline and `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    /// More than 24 hours of headroom (or SLA not applicable).
    Normal,
    /// Between 2 and 24 hours left.
    Warning,
    /// Two hours or less left.
    Critical,
    /// Deadline has passed.
    Overdue,
}

/// Result of an SLA evaluation: the bucket plus a sortable score.
///
/// Scores are bucketed so that sorting by `score` descending yields
/// overdue-first, then nearest-deadline-first, without a separate
/// comparator: overdue is pinned at 1000, critical occupies 100..200,
/// warning 50..100, normal 0..25.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SlaAssessment {
    /// Urgency bucket.
    pub status: SlaStatus,
    /// Monotonic urgency score; higher sorts first.
    pub score: f64,
}

impl SlaAssessment {
    /// Assessment for tickets whose state carries no live SLA.
    #[must_use]
    pub const fn inactive() -> Self {
        Self {
            status: SlaStatus::Normal,
            score: 0.0,
        }
    }
}

/// Maps a criticality tier to the absolute resolution deadline.
///
/// critical → +6h, high → +24h, medium → +3 days, low → +7 days, all as
/// wall-clock arithmetic on UTC instants.
#[must_use]
pub fn deadline_for(criticality: Criticality, created_at: DateTime<Utc>) -> DateTime<Utc> {
    let headroom = match criticality {
        Criticality::Critical => Duration::hours(6),
        Criticality::High => Duration::hours(24),
        Criticality::Medium => Duration::days(3),
        Criticality::Low => Duration::days(7),
    };
    created_at + headroom
}

/// Evaluates the live SLA status and urgency score of a ticket.
///
/// Only tickets in an SLA-active state (`submitted`, `in-progress`,
/// `pending_feedback`) carry urgency; everything else reports
/// [`SlaAssessment::inactive`].
#[must_use]
pub fn evaluate(
    sla_deadline: DateTime<Utc>,
    status: TicketStatus,
    now: DateTime<Utc>,
) -> SlaAssessment {
    if !status.is_sla_active() {
        return SlaAssessment::inactive();
    }

    let time_left = sla_deadline - now;
    if time_left <= Duration::zero() {
        return SlaAssessment {
            status: SlaStatus::Overdue,
            score: 1000.0,
        };
    }

    let hours_left = time_left.num_milliseconds() as f64 / 3_600_000.0;
    if hours_left <= 2.0 {
        SlaAssessment {
            status: SlaStatus::Critical,
            score: 100.0 + (100.0 - hours_left).max(0.0),
        }
    } else if hours_left <= 24.0 {
        SlaAssessment {
            status: SlaStatus::Warning,
            score: 50.0 + (50.0 - hours_left / 2.0).max(0.0),
        }
    } else {
        SlaAssessment {
            status: SlaStatus::Normal,
            score: (25.0 - hours_left / 24.0).max(0.0),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn deadline_mapping_per_tier() {
        let created = t0();
        assert_eq!(
            deadline_for(Criticality::Critical, created),
            created + Duration::hours(6)
        );
        assert_eq!(
            deadline_for(Criticality::High, created),
            created + Duration::hours(24)
        );
        assert_eq!(
            deadline_for(Criticality::Medium, created),
            created + Duration::days(3)
        );
        assert_eq!(
            deadline_for(Criticality::Low, created),
            created + Duration::days(7)
        );
    }

    #[test]
    fn deadline_rolls_over_month_boundary() {
        let created = Utc.with_ymd_and_hms(2025, 1, 30, 23, 0, 0).single().unwrap_or_default();
        let deadline = deadline_for(Criticality::Medium, created);
        assert_eq!(
            deadline,
            Utc.with_ymd_and_hms(2025, 2, 2, 23, 0, 0).single().unwrap_or_default()
        );
    }

    #[test]
    fn overdue_pins_score_at_1000() {
        let deadline = t0();
        let now = deadline + Duration::hours(1);
        let a = evaluate(deadline, TicketStatus::Submitted, now);
        assert_eq!(a.status, SlaStatus::Overdue);
        assert!((a.score - 1000.0).abs() < f64::EPSILON);

        // Exactly at the deadline counts as overdue (timeLeft <= 0).
        let a = evaluate(deadline, TicketStatus::Submitted, deadline);
        assert_eq!(a.status, SlaStatus::Overdue);
    }

    #[test]
    fn critical_bucket_within_two_hours() {
        let now = t0();
        let deadline = now + Duration::hours(1);
        let a = evaluate(deadline, TicketStatus::InProgress, now);
        assert_eq!(a.status, SlaStatus::Critical);
        assert!((a.score - 199.0).abs() < 1e-6);
    }

    #[test]
    fn warning_bucket_within_a_day() {
        let now = t0();
        let deadline = now + Duration::hours(10);
        let a = evaluate(deadline, TicketStatus::PendingFeedback, now);
        assert_eq!(a.status, SlaStatus::Warning);
        assert!((a.score - 95.0).abs() < 1e-6);
    }

    #[test]
    fn normal_bucket_beyond_a_day() {
        let now = t0();
        let deadline = now + Duration::days(2);
        let a = evaluate(deadline, TicketStatus::Submitted, now);
        assert_eq!(a.status, SlaStatus::Normal);
        assert!((a.score - 23.0).abs() < 1e-6);
    }

    #[test]
    fn far_future_deadline_floors_at_zero() {
        let now = t0();
        let deadline = now + Duration::days(40);
        let a = evaluate(deadline, TicketStatus::Submitted, now);
        assert_eq!(a.status, SlaStatus::Normal);
        assert!(a.score.abs() < f64::EPSILON);
    }

    #[test]
    fn inactive_states_report_no_urgency() {
        let now = t0();
        let deadline = now - Duration::hours(5); // long overdue
        for status in [
            TicketStatus::Completed,
            TicketStatus::Closed,
            TicketStatus::Reopened,
        ] {
            let a = evaluate(deadline, status, now);
            assert_eq!(a.status, SlaStatus::Normal);
            assert!(a.score.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn evaluation_is_idempotent_for_fixed_now() {
        let now = t0();
        let deadline = now + Duration::hours(5);
        let a = evaluate(deadline, TicketStatus::Submitted, now);
        let b = evaluate(deadline, TicketStatus::Submitted, now);
        assert_eq!(a, b);
    }

    #[test]
    fn score_orders_buckets_correctly() {
        let now = t0();
        let overdue = evaluate(now - Duration::minutes(1), TicketStatus::Submitted, now);
        let critical = evaluate(now + Duration::hours(1), TicketStatus::Submitted, now);
        let warning = evaluate(now + Duration::hours(12), TicketStatus::Submitted, now);
        let normal = evaluate(now + Duration::days(3), TicketStatus::Submitted, now);
        assert!(overdue.score > critical.score);
        assert!(critical.score > warning.score);
        assert!(warning.score > normal.score);
    }
}
