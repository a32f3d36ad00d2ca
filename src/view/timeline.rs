//! Adaptive timeline labels.

/// Candidate label spacings in seconds, smallest first.
pub const NICE_INTERVALS: [f64; 18] = [
    0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 60.0, 120.0, 300.0,
    600.0, 1200.0,
];

/// Aim for this many labels; the ladder keeps the result within 5..=15
/// for any duration the ladder covers.
pub const TARGET_LABEL_COUNT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLabel {
    /// Seconds from the left edge of the view.
    pub position_seconds: f64,
    /// Time shown to the user.
    pub time_seconds: f64,
    pub text: String,
}

/// Smallest nice interval at least `visible_duration / TARGET_LABEL_COUNT`.
pub fn label_interval(visible_duration: f64) -> f64 {
    if !(visible_duration > 0.0) {
        return NICE_INTERVALS[0];
    }
    let ideal = visible_duration / TARGET_LABEL_COUNT;
    NICE_INTERVALS
        .iter()
        .copied()
        .find(|i| *i >= ideal - 1e-12)
        .unwrap_or(NICE_INTERVALS[NICE_INTERVALS.len() - 1])
}

/// Millisecond precision below 100 ms spacing, tenths below 1 s, whole
/// seconds otherwise (`m:ss` past a minute).
pub fn format_label(t: f64, interval: f64) -> String {
    if interval < 0.1 {
        format!("{t:.3}s")
    } else if interval < 1.0 {
        format!("{t:.1}s")
    } else if t >= 60.0 {
        let total = t.round() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    } else {
        format!("{t:.0}s")
    }
}

/// Labels for a view whose left edge sits at `view_start` (in the rendered
/// asset's time) and whose displayed time is shifted by `label_offset`.
pub fn timeline_labels(view_start: f64, visible_duration: f64, label_offset: f64) -> Vec<TimelineLabel> {
    if !(visible_duration > 0.0) || !view_start.is_finite() || !label_offset.is_finite() {
        return Vec::new();
    }
    let interval = label_interval(visible_duration);
    let first_shown = view_start + label_offset;
    let last_shown = first_shown + visible_duration;

    // Integer stepping keeps labels on exact multiples of the interval.
    let first_k = (first_shown / interval - 1e-9).ceil() as i64;
    let mut labels = Vec::new();
    let mut k = first_k;
    loop {
        let t = k as f64 * interval;
        if t > last_shown + 1e-9 {
            break;
        }
        labels.push(TimelineLabel {
            position_seconds: (t - first_shown).max(0.0),
            time_seconds: t,
            text: format_label(t, interval),
        });
        k += 1;
    }
    labels
}
