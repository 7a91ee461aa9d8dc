use std::iter::successors;
use time::{Date, Weekday};

pub(super) const DAYS_IN_WEEK: usize = 7;

pub(super) trait WeekdayExt {
    /// Position of the weekday in a Sunday-first week, from 0 to 6
    fn index0(&self) -> u16;
}

impl WeekdayExt for Weekday {
    fn index0(&self) -> u16 {
        self.number_days_from_sunday().into()
    }
}

pub(super) fn first_day_of_month(date: Date) -> Date {
    date.replace_day(1)
        .expect("every month should have a first day")
}

/// Iterates over every day of the month that starts on `first`, in order
pub(super) fn days_of_month(first: Date) -> impl Iterator<Item = Date> {
    let month = first.month();
    successors(Some(first), |&d| d.next_day()).take_while(move |d| d.month() == month)
}

pub(super) fn last_day_of_month(date: Date) -> Date {
    days_of_month(first_day_of_month(date))
        .last()
        .unwrap_or(date)
}

pub(super) fn iter_days_after(date: Date) -> impl Iterator<Item = Date> {
    successors(Some(date), |&d| d.next_day()).skip(1)
}

pub(super) fn iter_days_before(date: Date) -> impl Iterator<Item = Date> {
    successors(Some(date), |&d| d.previous_day()).skip(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_days_of_month() {
        let days = days_of_month(date!(2024 - 02 - 01)).collect::<Vec<_>>();
        assert_eq!(days.len(), 29);
        assert_eq!(days.first(), Some(&date!(2024 - 02 - 01)));
        assert_eq!(days.last(), Some(&date!(2024 - 02 - 29)));
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(first_day_of_month(date!(2025 - 06 - 18)), date!(2025 - 06 - 01));
        assert_eq!(last_day_of_month(date!(2025 - 06 - 18)), date!(2025 - 06 - 30));
        assert_eq!(last_day_of_month(date!(2023 - 02 - 01)), date!(2023 - 02 - 28));
        assert_eq!(last_day_of_month(date!(2025 - 12 - 31)), date!(2025 - 12 - 31));
    }

    #[test]
    fn test_iter_days_around() {
        let before = iter_days_before(date!(2025 - 03 - 02)).take(3).collect::<Vec<_>>();
        assert_eq!(
            before,
            [date!(2025 - 03 - 01), date!(2025 - 02 - 28), date!(2025 - 02 - 27)]
        );
        let after = iter_days_after(date!(2024 - 12 - 30)).take(3).collect::<Vec<_>>();
        assert_eq!(
            after,
            [date!(2024 - 12 - 31), date!(2025 - 01 - 01), date!(2025 - 01 - 02)]
        );
    }

    #[test]
    fn test_weekday_index0() {
        assert_eq!(Weekday::Sunday.index0(), 0);
        assert_eq!(Weekday::Wednesday.index0(), 3);
        assert_eq!(Weekday::Saturday.index0(), 6);
    }
}
