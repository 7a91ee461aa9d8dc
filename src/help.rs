use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

static HELP_TEXT: &[&str] = &[
    "l, RIGHT        Next month",
    "h, LEFT         Previous month",
    "0, HOME         Jump to this month",
    "g               Input month to jump to",
    "r               Reload service orders",
    "?               Show this help",
    "q, ESC          Quit",
    "",
    "Press the Any Key to dismiss.",
];

/// A bordered box of text centered over whatever is beneath it
#[derive(Clone, Debug)]
pub(crate) struct Popup<'a> {
    title: &'a str,
    text: Text<'a>,
    style: Style,
}

impl<'a> Popup<'a> {
    pub(crate) fn new(title: &'a str, text: Text<'a>, style: Style) -> Popup<'a> {
        Popup { title, text, style }
    }

    pub(crate) fn help(style: Style) -> Popup<'static> {
        let lines = HELP_TEXT.iter().map(|&s| Line::raw(s)).collect::<Vec<_>>();
        Popup::new(" Commands ", Text::from(lines), style)
    }
}

impl Widget for Popup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = u16::try_from(self.text.height())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(area.height);
        let width = u16::try_from(self.text.width())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(area.width);
        let para = Paragraph::new(self.text)
            .block(
                Block::bordered()
                    .title(self.title)
                    .title_alignment(Alignment::Center),
            )
            .style(self.style);
        let [popup_area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [popup_area] = Layout::vertical([height])
            .flex(Flex::Center)
            .areas(popup_area);
        // One column of padding on either side, kept inside the frame
        let outer_area = Rect {
            x: popup_area.x.saturating_sub(1),
            y: popup_area.y,
            width: popup_area.width.saturating_add(2),
            height: popup_area.height,
        }
        .intersection(area);
        Clear.render(outer_area, buf);
        Block::new().style(self.style).render(outer_area, buf);
        para.render(popup_area, buf);
    }
}
