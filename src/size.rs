//! Human-readable byte counts.

const SIZES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Format `bytes` as `"<value> <unit>"`, dividing by `base` (1000 or 1024)
/// until the value drops below `base` or the unit ladder runs out.
///
/// Whole bytes print without decimals; anything scaled prints two.
pub fn human_readable_size(bytes: u64, base: u64) -> String {
    let base = base.max(2) as f64;
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= base && unit < SIZES.len() - 1 {
        value /= base;
        unit += 1;
    }

    if unit == 0 {
        format!("{:.0} {}", value, SIZES[unit])
    } else {
        format!("{:.2} {}", value, SIZES[unit])
    }
}
