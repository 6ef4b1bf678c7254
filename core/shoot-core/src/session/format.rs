use std::time::Duration;

/// Renders a duration as `MM:SS`.
///
/// Sub-second parts are truncated, and minutes keep counting past 59 since
/// the timer has no hour field.
pub fn format_mm_ss(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
