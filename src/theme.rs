use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const TITLE_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const TODAY_STYLE: Style = Style::new()
    .fg(Color::LightYellow)
    .add_modifier(Modifier::BOLD);

pub(crate) const OUTSIDE_MONTH_STYLE: Style = Style::new().fg(Color::DarkGray);

pub(crate) const MORE_STYLE: Style = Style::new()
    .fg(Color::Gray)
    .add_modifier(Modifier::ITALIC);

pub(crate) const NOTICE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Red);

pub(crate) mod status {
    use super::*;

    pub(crate) const OPEN_STYLE: Style = Style::new().fg(Color::LightBlue);

    pub(crate) const IN_PROGRESS_STYLE: Style = Style::new().fg(Color::LightYellow);

    pub(crate) const WAITING_STYLE: Style = Style::new().fg(Color::LightMagenta);

    pub(crate) const DONE_STYLE: Style = Style::new().fg(Color::LightGreen);

    pub(crate) const CANCELLED_STYLE: Style = Style::new()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::CROSSED_OUT);
}

pub(crate) mod jumpto {
    use super::*;

    pub(crate) const UNFILLED_CELL_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const READY_ENTER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);
}
