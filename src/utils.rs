//! Common utility functions used across modules.

/// Format a count with K/M suffix for compact display.
///
/// # Examples
/// ```
/// use adishe::utils::format_count;
/// assert_eq!(format_count(500), "500");
/// assert_eq!(format_count(1500), "1.5K");
/// assert_eq!(format_count(1_500_000), "1.5M");
/// ```
pub fn format_count(count: usize) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Join up to `max` items for a log line, noting how many were left out.
///
/// # Examples
/// ```
/// use adishe::utils::preview;
/// assert_eq!(preview(["a", "b", "c"], 2), "a, b (+1 more)");
/// ```
pub fn preview<I, S>(items: I, max: usize) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut shown = Vec::new();
    let mut hidden = 0usize;
    for item in items {
        if shown.len() < max {
            shown.push(item.as_ref().to_string());
        } else {
            hidden += 1;
        }
    }
    let mut out = shown.join(", ");
    if hidden > 0 {
        out.push_str(&format!(" (+{} more)", hidden));
    }
    out
}
