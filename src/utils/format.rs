//! Display formatting for prices, dates and status lines

use chrono::{DateTime, Duration, Utc};

use crate::models::Resolution;

/// Price with precision chosen by magnitude
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return "N/A".to_string();
    }
    if price < 0.000001 {
        format!("{:.2e}", price)
    } else if price < 0.001 {
        format!("{:.8}", price)
    } else if price < 1.0 {
        format!("{:.4}", price)
    } else if price < 1000.0 {
        format!("{:.2}", price)
    } else {
        format!("{:.1}", price)
    }
}

/// Fixed decimals with `,` grouping of the integer part
pub fn format_number(number: f64, decimals: usize) -> String {
    if !number.is_finite() {
        return "N/A".to_string();
    }
    let fixed = format!("{:.*}", decimals, number);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// UTC timestamp in the style of the resolution's axis
pub fn format_date(timestamp: DateTime<Utc>, resolution: Resolution) -> String {
    match resolution {
        Resolution::Day => timestamp.format("%I:%M %p").to_string(),
        Resolution::Week => timestamp.format("%b %-d").to_string(),
        Resolution::Month => timestamp.format("%b %-d, %Y").to_string(),
    }
}

/// 24h change badge text
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(c) if c.is_finite() && c >= 0.0 => format!("▲ {:.2}%", c),
        Some(c) if c.is_finite() => format!("▼ {:.2}%", c.abs()),
        _ => "N/A".to_string(),
    }
}

/// "Cached: N min left" for a cache hit, "Live" for fresh data
pub fn format_cache_status(remaining: Option<Duration>) -> String {
    match remaining {
        Some(r) if r > Duration::zero() => {
            let minutes = (r.num_milliseconds() + 59_999) / 60_000;
            format!("Cached: {} min left", minutes)
        }
        _ => "Live".to_string(),
    }
}

pub fn format_load_time(load_time: Duration) -> String {
    format!("Load time: {}ms", load_time.num_milliseconds())
}

/// Countdown to the next auto-refresh
pub fn format_next_refresh(next_refresh: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let next = match next_refresh {
        Some(next) => next,
        None => return "Auto-refresh: disabled".to_string(),
    };

    let millis = (next - now).num_milliseconds().max(0);
    let seconds = (millis + 999) / 1000;
    if seconds == 0 {
        "Just refreshed".to_string()
    } else {
        format!("Auto-refresh in: {}:{:02}", seconds / 60, seconds % 60)
    }
}

pub fn format_last_refreshed(last: Option<DateTime<Utc>>) -> Option<String> {
    last.map(|t| format!("Last Refreshed: {}", t.format("%H:%M:%S UTC")))
}
