use super::util::{
    days_of_month, first_day_of_month, iter_days_after, iter_days_before, WeekdayExt,
    DAYS_IN_WEEK,
};
use super::{Clock, Scheduled};
use std::collections::BTreeMap;
use time::Date;

/// One cell of the month grid
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CalendarDay<'a, R> {
    pub(crate) date: Date,
    pub(crate) is_current_month: bool,
    pub(crate) is_today: bool,
    /// Records delivered on `date`, in the order they were given
    pub(crate) records: Vec<&'a R>,
}

/// Lays out the month containing `reference` as whole Sunday-to-Saturday
/// weeks and attaches each record to the day of its delivery date.
///
/// The result always starts on a Sunday and ends on a Saturday, so its length
/// is a multiple of seven, except where padding would run past the ends of
/// [`Date`]'s range.  Records without a usable delivery date are
/// skipped.
pub(crate) fn build_month_grid<'a, R: Scheduled, C: Clock>(
    reference: Date,
    records: &'a [R],
    clock: C,
) -> Vec<CalendarDay<'a, R>> {
    let today = clock.today();
    let first = first_day_of_month(reference);
    let month_days = days_of_month(first).collect::<Vec<_>>();
    let last = month_days.last().copied().unwrap_or(first);

    let lead = usize::from(first.weekday().index0());
    let mut leading = iter_days_before(first).take(lead).collect::<Vec<_>>();
    leading.reverse();
    let trail = DAYS_IN_WEEK - 1 - usize::from(last.weekday().index0());
    let trailing = iter_days_after(last).take(trail).collect::<Vec<_>>();

    let mut buckets = bucket_by_day(records);
    let mut grid = Vec::with_capacity(leading.len() + month_days.len() + trailing.len());
    for (date, is_current_month) in leading
        .into_iter()
        .map(|d| (d, false))
        .chain(month_days.into_iter().map(|d| (d, true)))
        .chain(trailing.into_iter().map(|d| (d, false)))
    {
        grid.push(CalendarDay {
            date,
            is_current_month,
            is_today: date == today,
            records: buckets.remove(&date).unwrap_or_default(),
        });
    }
    grid
}

fn bucket_by_day<R: Scheduled>(records: &[R]) -> BTreeMap<Date, Vec<&R>> {
    let mut buckets = BTreeMap::<Date, Vec<&R>>::new();
    for r in records {
        match r.delivery_date() {
            Some(date) => buckets.entry(date).or_default().push(r),
            None => tracing::debug!(label = r.label(), "skipping record without a usable delivery date"),
        }
    }
    buckets
}
