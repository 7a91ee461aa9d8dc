use super::util::{first_day_of_month, last_day_of_month};
use thiserror::Error;
use time::Date;

/// Which month the agenda is showing.
///
/// The reference date is always kept on the first of its month, so moving
/// forwards and then backwards lands on exactly the same value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MonthCursor {
    reference: Date,
}

impl MonthCursor {
    pub(crate) fn new(today: Date) -> Self {
        MonthCursor {
            reference: first_day_of_month(today),
        }
    }

    pub(crate) fn start_month(mut self, date: Date) -> Self {
        self.reference = first_day_of_month(date);
        self
    }

    pub(crate) fn reference(&self) -> Date {
        self.reference
    }

    /// `today` comes from the caller's clock at the time of the jump, which
    /// may be later than when the cursor was created
    pub(crate) fn jump_to_today(&mut self, today: Date) {
        self.reference = first_day_of_month(today);
    }

    pub(crate) fn jump_to_month(&mut self, date: Date) {
        self.reference = first_day_of_month(date);
    }

    pub(crate) fn next_month(&mut self) -> Result<(), OutOfTimeError> {
        let next = last_day_of_month(self.reference)
            .next_day()
            .ok_or(OutOfTimeError)?;
        self.reference = next;
        Ok(())
    }

    pub(crate) fn previous_month(&mut self) -> Result<(), OutOfTimeError> {
        let prev = self.reference.previous_day().ok_or(OutOfTimeError)?;
        self.reference = first_day_of_month(prev);
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;
