use chrono::Local;

const HISTORY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time in the format used for history rows.
pub fn history_timestamp() -> String {
    Local::now().format(HISTORY_FORMAT).to_string()
}
