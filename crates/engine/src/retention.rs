//! FSRS-style retention lane: half-life updates, next-review scheduling,
//! session retention budget, and the pluggable exposure/fatigue policy.

use studyforge_domain::RetentionCard;

const MIN_HALF_LIFE_HOURS: f64 = 1.0 / 60.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

pub struct HalfLifeUpdate {
    pub half_life_hours: f64,
    pub expected: f64,
    pub correct: bool,
}

/// Multiplicative half-life update: a correct response extends it, a miss
/// contracts it proportionally to how confidently it was expected.
pub fn update_half_life(input: HalfLifeUpdate) -> f64 {
    let gain = if input.correct {
        0.2 + 0.6 * (1.0 - input.expected)
    } else {
        -0.5 * (0.3 + 0.7 * input.expected)
    };
    (input.half_life_hours * gain.exp()).max(MIN_HALF_LIFE_HOURS)
}

/// Next review timestamp derived from the current half-life.
pub fn schedule_next_review(half_life_hours: f64, now_ms: i64) -> i64 {
    let interval_ms = (half_life_hours * MS_PER_HOUR).max(1.0);
    now_ms + interval_ms.round() as i64
}

/// Fraction of a study session to reserve for retention review.
pub fn retention_budget(max_days_overdue: f64) -> f64 {
    if max_days_overdue > 7.0 { 0.6 } else { 0.4 }
}

/// A retention card queued for review, alongside its overdue-ness.
#[derive(Debug, Clone)]
pub struct QueuedCard {
    pub item_id: String,
    pub card: RetentionCard,
    pub overdue_days: f64,
    pub estimated_minutes: f64,
}

/// Per-item expected-learning-gain-per-minute, used to estimate review time
/// when available; falls back to a LO-count-scaled constant otherwise.
pub fn estimate_minutes_per_item(lo_count: usize, elg_per_min: Option<f64>) -> f64 {
    match elg_per_min {
        Some(rate) if rate > 0.0 => 1.0 / rate,
        _ => (90.0 + 6.0 * lo_count as f64) / 60.0,
    }
}

/// Build a review queue from an item's retention cards, sorted overdue-first
/// (then by `next_review_ms`, ties broken by larger overdue days), filling
/// until `minute_budget` is exceeded but always keeping at least one item.
pub fn build_retention_queue(
    mut cards: Vec<(String, RetentionCard)>,
    now_ms: i64,
    minute_budget: f64,
    elg_per_min_by_item: impl Fn(&str) -> Option<f64>,
) -> Vec<QueuedCard> {
    cards.sort_by(|(_, a), (_, b)| {
        let overdue_a = overdue_days(a, now_ms);
        let overdue_b = overdue_days(b, now_ms);
        let a_is_overdue = overdue_a > 0.0;
        let b_is_overdue = overdue_b > 0.0;
        match (a_is_overdue, b_is_overdue) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a
                .next_review_ms
                .cmp(&b.next_review_ms)
                .then(overdue_b.partial_cmp(&overdue_a).unwrap_or(std::cmp::Ordering::Equal)),
        }
    });

    let mut queue = Vec::new();
    let mut spent_minutes = 0.0;

    for (item_id, card) in cards {
        let estimated_minutes =
            estimate_minutes_per_item(card.lo_ids.len(), elg_per_min_by_item(&item_id));
        if !queue.is_empty() && spent_minutes + estimated_minutes > minute_budget {
            break;
        }
        spent_minutes += estimated_minutes;
        let overdue_days = overdue_days(&card, now_ms);
        queue.push(QueuedCard {
            item_id,
            card,
            overdue_days,
            estimated_minutes,
        });
    }

    queue
}

fn overdue_days(card: &RetentionCard, now_ms: i64) -> f64 {
    ((now_ms - card.next_review_ms).max(0) as f64) / MS_PER_HOUR / 24.0
}

/// Per-candidate exposure signals consumed by an [`ExposurePolicy`].
#[derive(Debug, Clone, Copy)]
pub struct ExposureSignals {
    pub last24h: u32,
    pub last7d: u32,
    pub hours_since_last: f64,
    pub mean_score: f64,
    pub se: f64,
}

/// Pluggable exposure-multiplier policy. The default engine wiring uses
/// [`IdentityExposure`]; [`CappedExposure`] implements the documented caps
/// but is not the default (see the Open Question decision in DESIGN.md).
pub trait ExposurePolicy: Send + Sync {
    fn multiplier(&self, signals: ExposureSignals) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityExposure;

impl ExposurePolicy for IdentityExposure {
    fn multiplier(&self, _signals: ExposureSignals) -> f64 {
        1.0
    }
}

/// Daily/weekly exposure caps plus a familiarity clamp for items the
/// learner already answers confidently and consistently.
#[derive(Debug, Clone, Copy, Default)]
pub struct CappedExposure;

impl ExposurePolicy for CappedExposure {
    fn multiplier(&self, signals: ExposureSignals) -> f64 {
        if signals.last24h >= 1 || signals.last7d >= 2 || signals.hours_since_last < 96.0 {
            return 0.0;
        }
        if signals.mean_score > 0.9 && signals.se < 0.15 {
            return 0.0;
        }
        1.0
    }
}
