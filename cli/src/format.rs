use chrono::NaiveDate;

/// `Sun, 3/10/24`: short weekday, then month/day/two-digit year.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%a, %-m/%-d/%y").to_string()
}

pub fn minutes_label(minutes: u64) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{} minutes", minutes)
    }
}
