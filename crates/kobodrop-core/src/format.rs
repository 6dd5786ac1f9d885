//! Human-readable labels for the file list shown on the e-reader.

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Base-1024 size with one decimal, trailing `.0` trimmed: `1536` -> `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.1}", value);
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Uppercased extension of `name`, or `FILE` when it has none.
pub fn file_extension_badge(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_uppercase(),
        _ => "FILE".to_string(),
    }
}
