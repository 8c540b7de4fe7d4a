/// Strip transport prefixes from an error so the banner shows only the cause
///
/// "Failed to update chart for BTC: HTTP Error: 502 Bad Gateway" stays as is,
/// while "error returned from database: (code: 5) database is locked"
/// becomes "database is locked".
pub fn extract_clean_error(error_msg: &str) -> String {
    if error_msg.contains("error returned from database:") {
        // Find the last colon, everything after it is the actual error message
        if let Some(last_colon) = error_msg.rfind(": ") {
            error_msg[last_colon + 2..].trim().to_string()
        } else {
            error_msg.to_string()
        }
    } else {
        error_msg.trim().to_string()
    }
}

/// Banner text for a failed chart update
pub fn chart_error_message(symbol: &str, cause: &str) -> String {
    let cause = extract_clean_error(cause);
    if cause.is_empty() {
        format!("Failed to update chart for {}", symbol)
    } else {
        format!("Failed to update chart for {}: {}", symbol, cause)
    }
}
