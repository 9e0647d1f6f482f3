use time::{macros::format_description, Date, Duration};

/// Parse a `yyyy-mm-dd` date
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
}

/// Format a date the way the dataset stores it (`yyyy-mm-dd`)
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(format_description!("[year]-[month]-[day]"))
}

/// The "last N days" window used by the trailing-year routes.
///
/// The window ends at a fixed anchor (the last date in the dataset snapshot),
/// never at the wall clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrailingWindow {
    anchor: Date,
    days: u16,
}

impl TrailingWindow {
    pub fn new(anchor: Date, days: u16) -> Self {
        Self { anchor, days }
    }

    pub fn anchor(&self) -> Date {
        self.anchor
    }

    pub fn days(&self) -> u16 {
        self.days
    }

    /// First date included in the window
    pub fn cutoff(&self) -> Date {
        self.anchor
            .saturating_sub(Duration::days(i64::from(self.days)))
    }
}
