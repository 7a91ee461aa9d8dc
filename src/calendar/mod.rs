mod cursor;
mod grid;
mod util;
mod widget;
pub(crate) use self::cursor::MonthCursor;
pub(crate) use self::widget::MonthCalendar;
use ratatui::style::Style;
use time::{Date, OffsetDateTime, UtcOffset};

/// A record that can be placed on the agenda by its delivery date
pub(crate) trait Scheduled {
    /// Returns `None` if the record has no delivery date or the date cannot be
    /// parsed; such records are left off the calendar.
    fn delivery_date(&self) -> Option<Date>;

    fn label(&self) -> &str;

    fn style(&self) -> Style {
        Style::new()
    }
}

/// Source of "today" for highlighting the current date
pub(crate) trait Clock {
    fn today(&self) -> Date;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn today(&self) -> Date {
        (**self).today()
    }
}

/// Clock reading the system time in a fixed UTC offset.
///
/// The local offset has to be detected before any other threads are spawned
/// (see [`UtcOffset::current_local_offset`]), so it is captured once at
/// startup by [`SystemClock::detect`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub(crate) fn detect() -> SystemClock {
        let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "could not determine local UTC offset; using UTC");
            UtcOffset::UTC
        });
        SystemClock { offset }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.offset).date()
    }
}

#[cfg(test)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct FixedClock(pub(crate) Date);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
