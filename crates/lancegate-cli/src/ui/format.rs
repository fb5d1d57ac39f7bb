//! Formatting utilities for CLI output.

use chrono::{DateTime, Utc};

/// Truncate a string to a maximum length with ellipsis.
///
/// The output is at most `max_len` characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Preview of a vector, e.g. `[1.000, 0.000, 0.000]` or `[0.120, 0.340, ... (384 dims)]`.
pub fn format_vector(vector: &[f32], max_items: usize) -> String {
    let shown: Vec<String> = vector
        .iter()
        .take(max_items)
        .map(|v| format!("{:.3}", v))
        .collect();

    if vector.len() > max_items {
        format!("[{}, ... ({} dims)]", shown.join(", "), vector.len())
    } else {
        format!("[{}]", shown.join(", "))
    }
}

/// Format a distance with fixed precision.
pub fn format_distance(distance: f32) -> String {
    format!("{:.4}", distance)
}

/// Format a timestamp as relative time (e.g., "5 mins ago", "3h ago").
///
/// Anything older than a week, or in the future, is shown as a date.
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);

    if duration.num_seconds() < 0 {
        return timestamp.format("%Y-%m-%d").to_string();
    }

    if duration.num_minutes() < 1 {
        "just now".to_string()
    } else if duration.num_hours() < 1 {
        format!("{} mins ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}
