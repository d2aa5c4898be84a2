//! Text templating for captions, stats and progress displays.

use crate::catalog::{CatalogEntry, RatingSummary};

/// Renders the HTML caption for one catalog entry.
///
/// Optional fields are omitted rather than shown empty; the numeric code
/// always closes the caption so users can forward it around.
#[must_use]
pub fn entry_caption(
    entry: &CatalogEntry,
    rating: Option<&RatingSummary>,
    include_stats: bool,
) -> String {
    let mut text = format!("🎬 <b>{}</b>\n\n", entry.title);

    if let Some(description) = &entry.description {
        text.push_str(&format!("📝 {description}\n\n"));
    }

    text.push_str(&format!("🎭 Genre: {}\n", entry.genre));

    if let Some(year) = entry.year {
        text.push_str(&format!("📅 Year: {year}\n"));
    }
    if let Some(country) = &entry.country {
        text.push_str(&format!("🌍 Country: {country}\n"));
    }
    if let Some(minutes) = entry.duration_min {
        text.push_str(&format!("⏱ Runtime: {}\n", format_duration_min(minutes)));
    }

    text.push_str(&format!("🎥 Quality: {}\n", entry.quality));

    if let Some(imdb) = entry.external_rating {
        text.push_str(&format!("⭐️ IMDb: {imdb}/10\n"));
    }

    if let Some(summary) = rating
        && summary.is_rated()
    {
        text.push_str(&format!(
            "📊 Rating: {} ({}/5) - {} votes\n",
            stars(summary.average),
            summary.average,
            summary.count
        ));
    }

    if include_stats {
        text.push_str(&format!("👁 Views: {}\n", format_number(entry.views)));
    }

    text.push_str(&format!("\n🔢 Code: <code>{}</code>", entry.code));
    text
}

/// Shortens a count for display (1000 -> 1.0K, 2500000 -> 2.5M).
#[must_use]
pub fn format_number(num: u64) -> String {
    if num < 1_000 {
        num.to_string()
    } else if num < 1_000_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    }
}

/// Formats a runtime in minutes as "2h 15m" / "45m".
#[must_use]
pub fn format_duration_min(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Renders a star strip for an average score (whole stars only).
#[must_use]
pub fn stars(average: f64) -> String {
    let count = average.max(0.0) as usize;
    "⭐️".repeat(count.min(5))
}

/// Renders a ten-segment progress bar with a percentage.
#[must_use]
pub fn progress_bar(current: u64, total: u64) -> String {
    const LENGTH: u64 = 10;

    if total == 0 {
        return format!("{} 0%", "░".repeat(LENGTH as usize));
    }

    let filled = (current * LENGTH / total) as usize;
    let percentage = current * 100 / total;
    format!(
        "{}{} {percentage}%",
        "█".repeat(filled),
        "░".repeat(LENGTH as usize - filled)
    )
}

/// Builds the deep link that starts the bot straight into a code delivery.
#[must_use]
pub fn deep_link(bot_username: &str, code: i64) -> String {
    format!("https://t.me/{bot_username}?start=code_{code}")
}

/// Parses a `code_<integer>` start parameter.
///
/// Returns `None` for anything that is not a numeric code payload. Whether
/// the code exists is the lookup's call, so `code_0` parses and resolves to
/// a not-found answer rather than being dropped.
#[must_use]
pub fn parse_start_code(param: &str) -> Option<i64> {
    param.strip_prefix("code_")?.parse().ok()
}

/// Builds an invite link for a channel.
///
/// Public channels link by handle; private ones fall back to the internal
/// `t.me/c/` form (channel ids carry a `-100` prefix on the wire).
#[must_use]
pub fn channel_link(channel_id: i64, handle: Option<&str>) -> String {
    if let Some(handle) = handle {
        return format!("https://t.me/{}", handle.trim_start_matches('@'));
    }
    if channel_id < 0 {
        let raw = channel_id.to_string();
        if raw.len() > 4 {
            return format!("https://t.me/c/{}", &raw[4..]);
        }
    }
    "https://t.me/".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FileRef, Quality};
    use chrono::Utc;

    fn sample_entry() -> CatalogEntry {
        CatalogEntry {
            code: 1234,
            file: FileRef::new("file-1"),
            title: "Avatar 2".to_owned(),
            genre: "Sci-Fi".to_owned(),
            description: None,
            year: Some(2022),
            country: None,
            duration_min: Some(192),
            quality: Quality::Hd,
            external_rating: Some(7.8),
            thumbnail: None,
            views: 1500,
            is_active: true,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1.0K");
        assert_eq!(format_number(1500), "1.5K");
        assert_eq!(format_number(2_500_000), "2.5M");
    }

    #[test]
    fn test_format_duration_min() {
        assert_eq!(format_duration_min(45), "45m");
        assert_eq!(format_duration_min(192), "3h 12m");
        assert_eq!(format_duration_min(120), "2h 0m");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "░░░░░░░░░░ 0%");
        assert_eq!(progress_bar(5, 10), "█████░░░░░ 50%");
        assert_eq!(progress_bar(10, 10), "██████████ 100%");
        // Empty snapshot never divides by zero.
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░ 0%");
    }

    #[test]
    fn test_parse_start_code() {
        assert_eq!(parse_start_code("code_1234"), Some(1234));
        assert_eq!(parse_start_code("code_0"), Some(0));
        assert_eq!(parse_start_code("code_-5"), Some(-5));
        assert_eq!(parse_start_code("code_abc"), None);
        assert_eq!(parse_start_code("1234"), None);
    }

    #[test]
    fn test_deep_link() {
        assert_eq!(
            deep_link("movie_code_bot", 77),
            "https://t.me/movie_code_bot?start=code_77"
        );
    }

    #[test]
    fn test_channel_link() {
        assert_eq!(channel_link(-1001234567, Some("@movies")), "https://t.me/movies");
        assert_eq!(channel_link(-1001234567, None), "https://t.me/c/1234567");
        assert_eq!(channel_link(42, None), "https://t.me/");
    }

    #[test]
    fn test_entry_caption_skips_absent_fields() {
        let caption = entry_caption(&sample_entry(), None, false);
        assert!(caption.contains("<b>Avatar 2</b>"));
        assert!(caption.contains("📅 Year: 2022"));
        assert!(caption.contains("3h 12m"));
        assert!(!caption.contains("Country"));
        assert!(!caption.contains("Views"));
        assert!(caption.ends_with("<code>1234</code>"));
    }

    #[test]
    fn test_entry_caption_with_rating_and_stats() {
        let summary = RatingSummary {
            average: 4.3,
            count: 12,
        };
        let caption = entry_caption(&sample_entry(), Some(&summary), true);
        assert!(caption.contains("(4.3/5) - 12 votes"));
        assert!(caption.contains("👁 Views: 1.5K"));
    }
}
