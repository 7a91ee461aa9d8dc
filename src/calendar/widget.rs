use super::cursor::MonthCursor;
use super::grid::{build_month_grid, CalendarDay};
use super::util::DAYS_IN_WEEK;
use super::{Clock, Scheduled};
use crate::theme::{MORE_STYLE, OUTSIDE_MONTH_STYLE, TITLE_STYLE, TODAY_STYLE, WEEKDAY_STYLE};
use ratatui::{prelude::*, widgets::*};
use time::{Date, Month};

static WEEKDAY_NAMES: [&str; DAYS_IN_WEEK] = ["dom", "seg", "ter", "qua", "qui", "sex", "sáb"];

/// Number of columns per day of week
const DAY_WIDTH: u16 = 11;

/// Width of the whole grid in columns
const MAIN_WIDTH: u16 = DAY_WIDTH * 7;

/// Number of lines taken up by the title, the weekday names, and the rule
/// beneath them
const HEADER_LINES: u16 = 3;

/// Each week gets at least a line for the day numbers and one for a record
const MIN_WEEK_LINES: u16 = 2;

/// Longest record label drawn inside a day cell; the rest of the cell width is
/// padding between columns
const LABEL_WIDTH: usize = DAY_WIDTH as usize - 2;

/// Draws one month of the agenda, with the records due on each day listed
/// beneath the day number
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MonthCalendar<'a, R, C> {
    records: &'a [R],
    clock: C,
}

impl<'a, R, C> MonthCalendar<'a, R, C> {
    pub(crate) fn new(records: &'a [R], clock: C) -> Self {
        MonthCalendar { records, clock }
    }
}

impl<R: Scheduled, C: Clock> StatefulWidget for MonthCalendar<'_, R, C> {
    type State = MonthCursor;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let left = area.width.saturating_sub(MAIN_WIDTH) / 2;
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(left),
                Constraint::Length(MAIN_WIDTH.min(area.width)),
                Constraint::Min(0),
            ])
            .split(area);
        let area = chunks[1];
        let grid = build_month_grid(state.reference(), self.records, self.clock);
        let week_qty = u16::try_from(grid.len().div_ceil(DAYS_IN_WEEK))
            .unwrap_or(u16::MAX)
            .max(1);
        let week_lines = (area.height.saturating_sub(HEADER_LINES) / week_qty).max(MIN_WEEK_LINES);
        let mut canvas = BufferCanvas::new(area, buf);
        canvas.draw_title(state.reference());
        canvas.draw_header();
        for (i, week) in std::iter::zip(0u16.., grid.chunks(DAYS_IN_WEEK)) {
            let top = HEADER_LINES.saturating_add(i.saturating_mul(week_lines));
            for (col, day) in std::iter::zip(0u16.., week) {
                canvas.draw_day(top, col, week_lines, day);
            }
        }
    }
}

fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "janeiro",
        Month::February => "fevereiro",
        Month::March => "março",
        Month::April => "abril",
        Month::May => "maio",
        Month::June => "junho",
        Month::July => "julho",
        Month::August => "agosto",
        Month::September => "setembro",
        Month::October => "outubro",
        Month::November => "novembro",
        Month::December => "dezembro",
    }
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn draw_title(&mut self, reference: Date) {
        let title = format!("{} {}", month_name(reference.month()), reference.year());
        let width = u16::try_from(title.chars().count()).unwrap_or(u16::MAX);
        self.mvprint(0, MAIN_WIDTH.saturating_sub(width) / 2, title, Some(TITLE_STYLE));
    }

    fn draw_header(&mut self) {
        for (i, name) in std::iter::zip(0u16.., WEEKDAY_NAMES) {
            self.mvprint(1, DAY_WIDTH * i + 1, name, Some(WEEKDAY_STYLE));
        }
        self.hline(2, 0, '─', MAIN_WIDTH);
    }

    fn draw_day<R: Scheduled>(&mut self, top: u16, col: u16, week_lines: u16, day: &CalendarDay<'_, R>) {
        let x = DAY_WIDTH * col;
        let (text, style) = if day.is_today {
            (format!("[{:2}]", day.date.day()), TODAY_STYLE)
        } else if day.is_current_month {
            (format!(" {:2} ", day.date.day()), Style::new())
        } else {
            (format!(" {:2} ", day.date.day()), OUTSIDE_MONTH_STYLE)
        };
        self.mvprint(top, x, text, Some(style));
        let capacity = usize::from(week_lines.saturating_sub(1));
        let total = day.records.len();
        for (k, (y, r)) in std::iter::zip(top.saturating_add(1).., &day.records)
            .enumerate()
            .take(capacity)
        {
            if k + 1 == capacity && total > capacity {
                self.mvprint(y, x + 1, format!("+{} mais", total - k), Some(MORE_STYLE));
            } else {
                let label = r.label().chars().take(LABEL_WIDTH).collect::<String>();
                self.mvprint(y, x + 1, label, Some(r.style()));
            }
        }
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // Using a Paragraph lets us truncate text that extends beyond the
            // calendar's area, though we need to be sure that the Rect passed
            // to the Paragraph is entirely within the frame lest a panic
            // result.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    fn hline(&mut self, y: u16, x: u16, ch: char, length: u16) {
        self.mvprint(y, x, String::from(ch).repeat(length.into()), None);
    }
}
