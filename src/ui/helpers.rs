//! Small presentation helpers shared by the panels.

use ratatui::layout::Rect;

/// Human-readable size, matching what the device's own pages show:
/// two decimals, MB at most.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Truncate a name to `max_len` with a trailing ellipsis.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = name.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Centered sub-rectangle for popups.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_caps_at_mb() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_048_576), "1.00 MB");
        assert_eq!(format_size(5 * 1_073_741_824), "5120.00 MB");
    }

    #[test]
    fn truncate_name_adds_ellipsis() {
        assert_eq!(truncate_name("short.txt", 20), "short.txt");
        assert_eq!(truncate_name("verylongfilename.txt", 10), "verylon...");
        assert_eq!(truncate_name("ab", 2), "ab");
    }

    #[test]
    fn centered_rect_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        let rect = centered_rect(40, 8, area);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.x, 20);
        let oversized = centered_rect(200, 50, area);
        assert_eq!(oversized.width, 80);
        assert_eq!(oversized.height, 24);
    }
}
