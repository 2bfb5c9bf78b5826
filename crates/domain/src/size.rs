const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Renders a byte count with one decimal in the largest unit below 1024.
///
/// Negative values keep their sign: `-100` renders as `-100.0 B`.
#[must_use]
pub fn format_size(bytes: impl Into<i128>) -> String {
    let bytes: i128 = bytes.into();
    let mut value = bytes as f64;
    for unit in UNITS {
        if value.abs() < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }

    format!("{value:.1} PB")
}
