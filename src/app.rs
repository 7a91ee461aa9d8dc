use crate::api::ApiError;
use crate::calendar::{Clock, MonthCalendar, MonthCursor};
use crate::help::Popup;
use crate::jumpto::{JumpTo, JumpToInput, JumpToOutput, JumpToState};
use crate::models::ServiceOrder;
use crate::session::Session;
use crate::storage::Storage;
use crate::theme::{BASE_STYLE, NOTICE_STYLE};
use crossterm::event::{read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use tracing::warn;

/// The interactive month agenda of service orders
#[derive(Debug)]
pub(crate) struct App<S, C> {
    session: Session<S>,
    clock: C,
    cursor: MonthCursor,
    orders: Vec<ServiceOrder>,
    /// Transient message shown in the status line until the next key press
    notice: Option<String>,
    state: AppState,
}

/// How the interactive agenda ended
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Outcome {
    Quit,
    SessionExpired,
}

impl<S: Storage, C: Clock> App<S, C> {
    pub(crate) fn new(
        session: Session<S>,
        clock: C,
        cursor: MonthCursor,
        orders: Vec<ServiceOrder>,
    ) -> App<S, C> {
        App {
            session,
            clock,
            cursor,
            orders,
            notice: None,
            state: AppState::Calendar,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> io::Result<Outcome> {
        loop {
            match self.state {
                AppState::Quitting => return Ok(Outcome::Quit),
                AppState::Expired => return Ok(Outcome::SessionExpired),
                _ => (),
            }
            terminal.draw(|frame| frame.render_widget(&mut self, frame.area()))?;
            self.handle_input()?;
        }
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.state {
            AppState::Calendar => {
                self.notice = None;
                match key {
                    KeyCode::Char('l') | KeyCode::Right => self.cursor.next_month().is_ok(),
                    KeyCode::Char('h') | KeyCode::Left => self.cursor.previous_month().is_ok(),
                    KeyCode::Char('0') | KeyCode::Home => {
                        self.cursor.jump_to_today(self.clock.today());
                        true
                    }
                    KeyCode::Char('g') => {
                        self.state = AppState::Jumping(JumpToState::new());
                        true
                    }
                    KeyCode::Char('r') => {
                        self.reload();
                        true
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        self.state = AppState::Quitting;
                        true
                    }
                    KeyCode::Char('?') => {
                        self.state = AppState::Helping;
                        true
                    }
                    _ => false,
                }
            }
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Jumping(state) => {
                if matches!(key, KeyCode::Char('q' | 'g') | KeyCode::Esc) {
                    self.state = AppState::Calendar;
                    true
                } else {
                    let output = match key {
                        KeyCode::Char(c) => match c.to_digit(10).and_then(|d| u8::try_from(d).ok()) {
                            Some(d) => state.handle_input(JumpToInput::Digit(d)),
                            None => JumpToOutput::Invalid,
                        },
                        KeyCode::Backspace | KeyCode::Delete => {
                            state.handle_input(JumpToInput::Backspace)
                        }
                        KeyCode::Enter => state.handle_input(JumpToInput::Enter),
                        _ => JumpToOutput::Invalid,
                    };
                    match output {
                        JumpToOutput::Ok => true,
                        JumpToOutput::Invalid => false,
                        JumpToOutput::Jump(date) => {
                            self.state = AppState::Calendar;
                            self.cursor.jump_to_month(date);
                            true
                        }
                    }
                }
            }
            AppState::Quitting | AppState::Expired => false,
        }
    }

    fn reload(&mut self) {
        match self.session.client().all_service_orders() {
            Ok(orders) => self.orders = orders,
            Err(ApiError::Unauthorized) => {
                if let Err(e) = self.session.refresh() {
                    warn!(error = %e, "failed to re-read session storage");
                }
                self.state = AppState::Expired;
            }
            Err(e) => {
                warn!(error = %e, "failed to reload service orders");
                self.notice = Some(format!("Could not load service orders: {e}"));
            }
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn status_line(&self) -> Line<'static> {
        if let Some(notice) = &self.notice {
            return Line::styled(format!(" {notice}"), NOTICE_STYLE);
        }
        let who = self
            .session
            .current_user()
            .map_or("-", |u| u.name.as_str());
        Line::styled(
            format!(" {who} | {} service orders | ? help | q quit", self.orders.len()),
            BASE_STYLE,
        )
    }
}

impl<S: Storage, C: Clock> Widget for &mut App<S, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let [main, status] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
        MonthCalendar::new(&self.orders, &self.clock).render(main, buf, &mut self.cursor);
        self.status_line().render(status, buf);
        if self.state == AppState::Helping {
            Popup::help(BASE_STYLE).render(main, buf);
        } else if let AppState::Jumping(ref mut state) = self.state {
            JumpTo.render(main, buf, state);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Jumping(JumpToState),
    Quitting,
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::calendar::FixedClock;
    use crate::storage::{MemoryStorage, TOKEN_KEY, USER_KEY};
    use mockito::Server;
    use serde_json::json;
    use time::macros::date;

    const TODAY: FixedClock = FixedClock(date!(2025 - 06 - 10));

    fn app(url: &str, orders: Vec<ServiceOrder>) -> App<MemoryStorage, FixedClock> {
        let storage = MemoryStorage::default();
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage
            .set(USER_KEY, r#"{"id":1,"nome":"Admin","email":"admin@sistema.com","tipo":"ADMIN"}"#)
            .unwrap();
        let session = Session::restore(ApiClient::new(url, storage).unwrap()).unwrap();
        App::new(session, TODAY, MonthCursor::new(TODAY.0), orders)
    }

    fn order(id: i64, client: &str, due: &str) -> ServiceOrder {
        ServiceOrder {
            id,
            client_name: client.to_owned(),
            delivery_forecast: Some(due.to_owned()),
            ..ServiceOrder::default()
        }
    }

    fn render(app: &mut App<MemoryStorage, FixedClock>) -> Buffer {
        let area = Rect::new(0, 0, 80, 25);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        buf
    }

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn test_initial_render() {
        let mut app = app("http://127.0.0.1:1", vec![order(1, "João Silva", "2025-06-15T10:00:00")]);
        let buf = render(&mut app);
        assert_eq!(line(&buf, 0).trim(), "junho 2025");
        assert_eq!(line(&buf, 12).trim(), "João Silv");
        assert_eq!(line(&buf, 24).trim(), "Admin | 1 service orders | ? help | q quit");
    }

    #[test]
    fn test_month_navigation() {
        let mut app = app("http://127.0.0.1:1", Vec::new());
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Right));
        assert_eq!(app.cursor.reference(), date!(2025 - 08 - 01));
        assert_eq!(line(&render(&mut app), 0).trim(), "agosto 2025");
        assert!(app.handle_key(KeyCode::Left));
        assert!(app.handle_key(KeyCode::Char('h')));
        assert!(app.handle_key(KeyCode::Char('h')));
        assert_eq!(app.cursor.reference(), date!(2025 - 05 - 01));
        assert!(app.handle_key(KeyCode::Home));
        assert_eq!(app.cursor.reference(), date!(2025 - 06 - 01));
        assert!(!app.handle_key(KeyCode::Char('x')));
    }

    #[test]
    fn test_today_follows_clock_past_midnight() {
        let mut app = app("http://127.0.0.1:1", Vec::new());
        assert!(app.handle_key(KeyCode::Char('h')));
        app.clock = FixedClock(date!(2025 - 07 - 01));
        assert!(app.handle_key(KeyCode::Char('0')));
        assert_eq!(app.cursor.reference(), date!(2025 - 07 - 01));
        let buf = render(&mut app);
        assert_eq!(line(&buf, 0).trim(), "julho 2025");
        assert!(line(&buf, 3).contains("[ 1]"));
    }

    #[test]
    fn test_jump_to_month() {
        let mut app = app("http://127.0.0.1:1", Vec::new());
        assert!(app.handle_key(KeyCode::Char('g')));
        for c in "202402".chars() {
            assert!(app.handle_key(KeyCode::Char(c)));
        }
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Calendar);
        assert_eq!(app.cursor.reference(), date!(2024 - 02 - 01));
    }

    #[test]
    fn test_help_and_quit() {
        let mut app = app("http://127.0.0.1:1", Vec::new());
        assert!(app.handle_key(KeyCode::Char('?')));
        assert_eq!(app.state, AppState::Helping);
        let buf = render(&mut app);
        assert!((0..25).any(|y| line(&buf, y).contains("Commands")));
        assert!(app.handle_key(KeyCode::Char('z')));
        assert_eq!(app.state, AppState::Calendar);
        assert!(app.handle_key(KeyCode::Char('q')));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[test]
    fn test_reload() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/api/ordens-servico")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "content": [
                        {"id": 1, "nomeCliente": "Ana", "status": "ABERTA", "dataPrevisaoEntrega": "2025-06-03T10:00:00"},
                        {"id": 2, "nomeCliente": "Bia", "status": "ABERTA", "dataPrevisaoEntrega": "2025-06-04T10:00:00"}
                    ],
                    "totalElements": 2, "totalPages": 1, "size": 20, "number": 0
                })
                .to_string(),
            )
            .create();
        let mut app = app(&server.url(), Vec::new());
        assert!(app.handle_key(KeyCode::Char('r')));
        assert_eq!(app.orders.len(), 2);
        assert_eq!(app.notice, None);
    }

    #[test]
    fn test_reload_failure_shows_notice() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/api/ordens-servico")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create();
        let mut app = app(&server.url(), vec![order(1, "Ana", "2025-06-03")]);
        assert!(app.handle_key(KeyCode::Char('r')));
        assert_eq!(app.orders.len(), 1);
        let buf = render(&mut app);
        assert!(line(&buf, 24).contains("Could not load service orders: server returned 503 Service Unavailable"));
        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.notice, None);
    }

    #[test]
    fn test_reload_with_expired_session() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/api/ordens-servico")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .create();
        let mut app = app(&server.url(), Vec::new());
        assert!(app.handle_key(KeyCode::Char('r')));
        assert_eq!(app.state, AppState::Expired);
        assert!(!app.session.is_authenticated());
    }
}
