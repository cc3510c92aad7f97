//! Command Menu (TUI popup)
//!
//! Shown when the user types "/" on its own. The first five entries are the
//! numbered session options, which can also be chosen by typing their digit
//! at the prompt.

use ratatui::{
    crossterm::event::{self, Event, KeyCode},
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::io;

/// Command menu entry
#[derive(Debug, Clone, Copy)]
pub struct MenuEntry {
    /// Command the entry expands to
    pub command: &'static str,
    /// Digit shortcut at the prompt
    pub shortcut: Option<char>,
    pub description: &'static str,
    /// Whether the command needs arguments typed after it
    pub takes_args: bool,
}

const fn entry(
    command: &'static str,
    shortcut: Option<char>,
    description: &'static str,
    takes_args: bool,
) -> MenuEntry {
    MenuEntry {
        command,
        shortcut,
        description,
        takes_args,
    }
}

/// Everything the menu lists
pub const MENU_ENTRIES: &[MenuEntry] = &[
    entry("/load", Some('1'), "Load CSV into a table", true),
    entry("/sql", Some('2'), "Run SQL query", true),
    entry("/ask", Some('3'), "Ask a question (AI-generated SQL)", true),
    entry("/tables", Some('4'), "List tables", false),
    entry("/quit", Some('5'), "Exit", false),
    entry("/schema", None, "Show the schema sent to the model", false),
    entry("/config", None, "Set the API key", true),
    entry("/model", None, "Set the model", true),
    entry("/help", None, "Show detailed help", false),
];

/// Menu entry for a digit typed at the prompt
pub fn shortcut(input: &str) -> Option<&'static MenuEntry> {
    let mut chars = input.trim().chars();
    let digit = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    MENU_ENTRIES.iter().find(|e| e.shortcut == Some(digit))
}

/// All command names, for completion
pub fn command_names() -> impl Iterator<Item = &'static str> {
    MENU_ENTRIES
        .iter()
        .map(|e| e.command)
        .chain(std::iter::once("/exit"))
}

/// Result of running the command menu
pub enum MenuResult {
    /// User selected an entry
    Selected(&'static MenuEntry),
    /// User cancelled (ESC)
    Cancelled,
    /// User wants to type their own input
    TextInput,
}

/// Display the command menu and return the selection
pub fn show_command_menu() -> io::Result<MenuResult> {
    let mut state = ListState::default();
    state.select(Some(0));

    crossterm::terminal::enable_raw_mode()?;
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;

    let result = run_menu(&mut terminal, &mut state);

    terminal.clear()?;
    crossterm::terminal::disable_raw_mode()?;

    result
}

fn run_menu(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
    state: &mut ListState,
) -> io::Result<MenuResult> {
    loop {
        terminal.draw(|f| ui(f, state))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(MenuResult::Cancelled),
                KeyCode::Enter => {
                    if let Some(selected) = state.selected() {
                        return Ok(MenuResult::Selected(&MENU_ENTRIES[selected]));
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let selected = state.selected().unwrap_or(0);
                    if selected + 1 < MENU_ENTRIES.len() {
                        state.select(Some(selected + 1));
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    let selected = state.selected().unwrap_or(0);
                    state.select(Some(selected.saturating_sub(1)));
                }
                KeyCode::Char('/') => return Ok(MenuResult::TextInput),
                KeyCode::Char(c) => {
                    if let Some(entry) = MENU_ENTRIES.iter().find(|e| e.shortcut == Some(c)) {
                        return Ok(MenuResult::Selected(entry));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let border = Style::default().fg(Color::Cyan);

    let header = Paragraph::new(Line::from(" 📦 SQLite Assistant ").style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL).border_style(border))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = MENU_ENTRIES
        .iter()
        .map(|e| {
            let key = e.shortcut.map(|c| format!("{}.", c)).unwrap_or_default();
            ListItem::new(format!("  {:3}{:10} {}", key, e.command, e.description))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).border_style(border))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Black)
                .bg(Color::Cyan),
        );
    f.render_stateful_widget(list, chunks[1], state);

    let help = Paragraph::new(
        Line::from(" ↑/k ↓/j: Move  Enter or 1-5: Select  ESC/q: Cancel  /: Type command ")
            .style(Style::default().fg(Color::Gray)),
    )
    .block(Block::default().borders(Borders::ALL).border_style(border))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_shortcuts() {
        assert_eq!(shortcut("1").map(|e| e.command), Some("/load"));
        assert_eq!(shortcut("2").map(|e| e.command), Some("/sql"));
        assert_eq!(shortcut("3").map(|e| e.command), Some("/ask"));
        assert_eq!(shortcut(" 4 ").map(|e| e.command), Some("/tables"));
        assert_eq!(shortcut("5").map(|e| e.command), Some("/quit"));
        assert!(shortcut("6").is_none());
        assert!(shortcut("12").is_none());
        assert!(shortcut("").is_none());
    }

    #[test]
    fn test_every_entry_parses_as_command() {
        for name in command_names() {
            let input = match name {
                "/load" => "/load a.csv t".to_string(),
                "/sql" => "/sql SELECT 1".to_string(),
                "/config" | "/model" => format!("{} value", name),
                _ => name.to_string(),
            };
            assert!(
                crate::cli::commands::Command::parse(&input).is_ok(),
                "{} should parse",
                name
            );
        }
    }
}
