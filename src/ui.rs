use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{
    Component, EventContext, EventKind, EventRoutingState, HandlerResponse, RenderContext,
};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
    StatusBarStyle,
};

use crate::action::Action;
use crate::grid::GridView;
use crate::pagination::PageSlot;
use crate::state::{AppState, CatalogMode, Creature};

const BG_BASE: Color = Color::Rgb(14, 16, 24);
const BG_PANEL: Color = Color::Rgb(24, 28, 40);
const TEXT_MAIN: Color = Color::Rgb(236, 238, 244);
const TEXT_DIM: Color = Color::Rgb(150, 158, 178);
const ACCENT: Color = Color::Rgb(255, 203, 5);
const ACCENT_ALT: Color = Color::Rgb(61, 125, 202);
const ERROR: Color = Color::Rgb(232, 92, 92);

pub const CARD_WIDTH: u16 = 24;
pub const CARD_HEIGHT: u16 = 6;

pub const EMPTY_MESSAGE: &str = "No Pokémon found. Try searching with another name.";

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CatalogComponentId {
    Search,
    Grid,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogContext {
    Browse,
    Search,
}

impl EventRoutingState<CatalogComponentId, CatalogContext> for AppState {
    fn focused(&self) -> Option<CatalogComponentId> {
        if self.search_bar.is_editing() {
            Some(CatalogComponentId::Search)
        } else {
            Some(CatalogComponentId::Grid)
        }
    }

    fn modal(&self) -> Option<CatalogComponentId> {
        self.search_bar
            .is_editing()
            .then_some(CatalogComponentId::Search)
    }

    fn binding_context(&self, id: CatalogComponentId) -> CatalogContext {
        match id {
            CatalogComponentId::Search => CatalogContext::Search,
            CatalogComponentId::Grid => CatalogContext::Browse,
        }
    }

    fn default_context(&self) -> CatalogContext {
        CatalogContext::Browse
    }
}

/// Colour family a card is drawn in, picked from its primary type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardTheme {
    Grass,
    Fire,
    Water,
    Electric,
    Normal,
}

impl CardTheme {
    pub fn for_type(type_name: &str) -> Self {
        match type_name.trim().to_ascii_lowercase().as_str() {
            "grass" | "bug" | "poison" => CardTheme::Grass,
            "fire" | "dragon" | "fighting" => CardTheme::Fire,
            "water" | "ice" => CardTheme::Water,
            "electric" => CardTheme::Electric,
            _ => CardTheme::Normal,
        }
    }

    pub fn color(self) -> Color {
        match self {
            CardTheme::Grass => Color::Rgb(72, 199, 116),
            CardTheme::Fire => Color::Rgb(240, 128, 48),
            CardTheme::Water => Color::Rgb(104, 144, 240),
            CardTheme::Electric => Color::Rgb(248, 208, 48),
            CardTheme::Normal => Color::Rgb(168, 168, 120),
        }
    }
}

pub struct CatalogUi {
    status_bar: StatusBar,
}

impl Default for CatalogUi {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogUi {
    pub fn new() -> Self {
        Self {
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        _render_ctx: RenderContext,
        event_ctx: &mut EventContext<CatalogComponentId>,
    ) {
        let areas = layout(area);
        event_ctx.set_component_area(CatalogComponentId::Search, areas.header);
        event_ctx.set_component_area(CatalogComponentId::Grid, areas.grid);
        render_page(frame, area, state, &mut self.status_bar);
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_search_event(event, state)
    }

    pub fn handle_grid_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_grid_event(event, state)
    }
}

struct Areas {
    header: Rect,
    grid: Rect,
    pagination: Rect,
    footer: Rect,
}

fn layout(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);
    Areas {
        header: chunks[0],
        grid: chunks[1],
        pagination: chunks[2],
        footer: chunks[3],
    }
}

/// Draws the whole screen without touching event routing.
pub fn render_page(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);
    let areas = layout(area);
    render_header(frame, areas.header, state);
    render_grid(frame, areas.grid, state);
    render_pagination(frame, areas.pagination, state);
    render_footer(frame, areas.footer, state, status_bar);
}

pub fn handle_search_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            KeyCode::Enter => vec![Action::SearchSubmit],
            KeyCode::Esc => vec![Action::SearchClear],
            KeyCode::Backspace => vec![Action::SearchBackspace],
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![Action::SearchInput(ch)]
            }
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_grid_event(event: &EventKind, state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            KeyCode::Char('/') => vec![Action::SearchStart],
            KeyCode::Esc if state.is_searching() || state.search_bar.has_text() => {
                vec![Action::SearchClear]
            }
            KeyCode::Left | KeyCode::Char('h') => vec![Action::PagePrev],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::PageNext],
            KeyCode::Home => vec![Action::PageFirst],
            KeyCode::End => vec![Action::PageLast],
            KeyCode::Up | KeyCode::Char('k') => vec![Action::GridScroll(-1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::GridScroll(1)],
            KeyCode::Char('[') => vec![Action::HistoryBack],
            KeyCode::Char(']') => vec![Action::HistoryForward],
            KeyCode::Char('C') => vec![Action::CacheClear],
            KeyCode::Char(digit @ '1'..='9') => {
                vec![Action::PageRequest(i64::from(digit as u8 - b'0'))]
            }
            _ => vec![],
        },
        EventKind::Scroll { delta, .. } => vec![Action::GridScroll(*delta as i16)],
        _ => vec![],
    };
    handler_response(actions)
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let editing = state.search_bar.is_editing();
    let search_text = if editing {
        format!("{}_", state.search_bar.text())
    } else if state.search_bar.text().is_empty() {
        "press / to search".to_string()
    } else {
        state.search_bar.text().to_string()
    };
    let search_style = if editing {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else if state.search_bar.text().is_empty() {
        Style::default().fg(TEXT_DIM)
    } else {
        Style::default().fg(TEXT_MAIN)
    };

    let text = Text::from(vec![
        Line::from(vec![
            Span::styled("Search: ", Style::default().fg(TEXT_DIM)),
            Span::styled(search_text, search_style),
        ]),
        Line::from(Span::styled(
            summary_line(state),
            Style::default().fg(ACCENT_ALT),
        )),
    ]);

    let border = if editing {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_DIM)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title("POKEGRID")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(border);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn summary_line(state: &AppState) -> String {
    let page = state.pagination.current_page();
    let pages = state.pagination.total_pages();
    match state.mode() {
        CatalogMode::Listing => format!(
            "All Pokémon · {} total · page {page}/{pages}",
            state.total_items
        ),
        CatalogMode::Searching => {
            let matches = state.results.len();
            let noun = if matches == 1 { "match" } else { "matches" };
            format!(
                "{matches} {noun} for \"{}\" · page {page}/{pages}",
                state.search_term
            )
        }
    }
}

pub fn render_grid(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_BASE).fg(TEXT_MAIN))
        .border_style(Style::default().fg(TEXT_DIM));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match state.grid.view() {
        GridView::Loading => render_skeletons(frame, inner, state),
        GridView::Empty => render_notice(frame, inner, EMPTY_MESSAGE, TEXT_DIM),
        GridView::Error(message) => render_notice(frame, inner, message, ERROR),
        GridView::Cards => {
            let creatures: Vec<&Creature> =
                state.grid.cards().iter().map(|card| &card.creature).collect();
            for (rect, index) in card_cells(inner, creatures.len(), state.grid_scroll) {
                render_card(frame, rect, creatures[index]);
            }
        }
    }
}

/// Cells for `count` cards laid out in rows, starting `scroll` rows down.
///
/// Returns `(cell, index)` pairs for the cards that fit in `area`.
pub fn card_cells(area: Rect, count: usize, scroll: u16) -> Vec<(Rect, usize)> {
    let Some(rows) = GridRows::fit(area, count) else {
        return Vec::new();
    };
    let GridRows {
        columns,
        visible_rows,
        ..
    } = rows;
    let first_row = (scroll as usize).min(rows.hidden());

    let mut cells = Vec::new();
    for row in 0..visible_rows {
        for column in 0..columns {
            let index = (first_row + row) * columns + column;
            if index >= count {
                return cells;
            }
            let rect = Rect {
                x: area.x + column as u16 * CARD_WIDTH,
                y: area.y + row as u16 * CARD_HEIGHT,
                width: CARD_WIDTH,
                height: CARD_HEIGHT,
            };
            cells.push((rect, index));
        }
    }
    cells
}

/// Furthest row offset that still moves the grid on a `width` x `height`
/// terminal showing `count` cards.
pub fn max_grid_scroll((width, height): (u16, u16), count: usize) -> u16 {
    let grid = layout(Rect::new(0, 0, width, height)).grid;
    let inner = Block::default().borders(Borders::ALL).inner(grid);
    GridRows::fit(inner, count)
        .map(|rows| u16::try_from(rows.hidden()).unwrap_or(u16::MAX))
        .unwrap_or(0)
}

struct GridRows {
    columns: usize,
    visible_rows: usize,
    total_rows: usize,
}

impl GridRows {
    fn fit(area: Rect, count: usize) -> Option<Self> {
        if area.width < CARD_WIDTH || area.height < CARD_HEIGHT || count == 0 {
            return None;
        }
        let columns = (area.width / CARD_WIDTH) as usize;
        Some(Self {
            columns,
            visible_rows: (area.height / CARD_HEIGHT) as usize,
            total_rows: count.div_ceil(columns),
        })
    }

    /// Rows below the first screen.
    fn hidden(&self) -> usize {
        self.total_rows.saturating_sub(self.visible_rows)
    }
}

fn render_card(frame: &mut Frame, area: Rect, creature: &Creature) {
    let primary = creature.primary_type();
    let color = CardTheme::for_type(primary).color();
    let image = match (&creature.artwork_url, &creature.sprite_url) {
        (Some(_), _) => "◆ artwork",
        (None, Some(_)) => "◇ sprite",
        (None, None) => "· no image",
    };

    let text = Text::from(vec![
        Line::from(vec![
            Span::styled(format_card_id(creature.id), Style::default().fg(TEXT_DIM)),
            Span::raw("  "),
            Span::styled(primary.to_string(), Style::default().fg(color)),
        ]),
        Line::from(Span::styled(
            display_name(&creature.name),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(image, Style::default().fg(TEXT_DIM))),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL))
        .border_style(Style::default().fg(color));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_skeletons(frame: &mut Frame, area: Rect, state: &AppState) {
    let spinner = SPINNER[(state.tick % SPINNER.len() as u64) as usize];
    let shade = if state.tick % 2 == 0 { "░░░░░░░░" } else { "▒▒▒▒▒▒▒▒" };
    let count = state.items_per_page as usize;
    for (rect, _) in card_cells(area, count, 0) {
        let text = Text::from(vec![
            Line::from(Span::styled(
                format!("{spinner} loading"),
                Style::default().fg(TEXT_DIM),
            )),
            Line::from(Span::styled(shade, Style::default().fg(TEXT_DIM))),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .style(Style::default().bg(BG_PANEL))
            .border_style(Style::default().fg(TEXT_DIM));
        frame.render_widget(Paragraph::new(text).block(block), rect);
    }
}

fn render_notice(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let top = area.height.saturating_sub(1) / 2;
    let line = Rect {
        y: area.y + top,
        height: area.height.min(2),
        ..area
    };
    let paragraph = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(color));
    frame.render_widget(paragraph, line);
}

pub fn render_pagination(frame: &mut Frame, area: Rect, state: &AppState) {
    let pagination = &state.pagination;
    let enabled = Style::default().fg(TEXT_MAIN);
    let disabled = Style::default().fg(TEXT_DIM).add_modifier(Modifier::DIM);

    let mut spans = vec![Span::styled(
        "‹ Prev",
        if pagination.has_previous() { enabled } else { disabled },
    )];
    for slot in pagination.page_numbers() {
        spans.push(Span::raw("  "));
        spans.push(match slot {
            PageSlot::Gap => Span::styled("…", Style::default().fg(TEXT_DIM)),
            PageSlot::Page(page) if page == pagination.current_page() => Span::styled(
                format!("[{page}]"),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            PageSlot::Page(page) => Span::styled(page.to_string(), enabled),
        });
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        "Next ›",
        if pagination.has_next() { enabled } else { disabled },
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(TEXT_DIM));
    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = state.message.clone().unwrap_or_else(|| {
        if state.loading {
            match state.mode() {
                CatalogMode::Listing => "Loading page...".to_string(),
                CatalogMode::Searching => format!("Searching \"{}\"...", state.search_term),
            }
        } else {
            String::new()
        }
    });
    let (left_hints, center_hints) = status_hints(state);
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::hints(&center_hints).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> (Vec<StatusBarHint<'static>>, Vec<StatusBarHint<'static>>) {
    if state.search_bar.is_editing() {
        let left = vec![
            StatusBarHint::new("Enter", "Search"),
            StatusBarHint::new("Esc", "Clear"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
        return (left, Vec::new());
    }
    let left = vec![
        StatusBarHint::new("/", "Search"),
        StatusBarHint::new("h/l", "Page"),
        StatusBarHint::new("Home/End", "First/Last"),
        StatusBarHint::new("j/k", "Scroll"),
    ];
    let center = vec![
        StatusBarHint::new("[ ]", "History"),
        StatusBarHint::new("C", "Clear cache"),
        StatusBarHint::new("q", "Quit"),
    ];
    (left, center)
}

/// `#0025` style label; a missing id shows as `#0000`.
pub fn format_card_id(id: u32) -> String {
    format!("#{id:04}")
}

pub fn display_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return "Unknown".to_string();
    }
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> EventKind {
        EventKind::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn type_themes_group_related_types() {
        assert_eq!(CardTheme::for_type("bug"), CardTheme::Grass);
        assert_eq!(CardTheme::for_type("Dragon"), CardTheme::Fire);
        assert_eq!(CardTheme::for_type("ice"), CardTheme::Water);
        assert_eq!(CardTheme::for_type("electric"), CardTheme::Electric);
        assert_eq!(CardTheme::for_type("ghost"), CardTheme::Normal);
        assert_eq!(CardTheme::for_type(""), CardTheme::Normal);
    }

    #[test]
    fn card_labels() {
        assert_eq!(format_card_id(25), "#0025");
        assert_eq!(format_card_id(0), "#0000");
        assert_eq!(format_card_id(10_001), "#10001");
        assert_eq!(display_name("mr-mime"), "Mr Mime");
        assert_eq!(display_name("  "), "Unknown");
    }

    #[test]
    fn card_cells_fill_rows_then_scroll() {
        let area = Rect::new(0, 0, CARD_WIDTH * 3, CARD_HEIGHT * 2);

        let cells = card_cells(area, 10, 0);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[3].0, Rect::new(0, CARD_HEIGHT, CARD_WIDTH, CARD_HEIGHT));

        let scrolled = card_cells(area, 10, 1);
        assert_eq!(scrolled.first().map(|cell| cell.1), Some(3));
        assert_eq!(scrolled.last().map(|cell| cell.1), Some(8));

        // Scrolling past the end keeps the last full screen in view.
        let clamped = card_cells(area, 10, 40);
        assert_eq!(clamped.first().map(|cell| cell.1), Some(6));
        assert_eq!(clamped.len(), 4);
    }

    #[test]
    fn scroll_limit_counts_hidden_rows() {
        // 160x40: grid inner is 158 wide (6 columns) and 28 tall (4 rows).
        assert_eq!(max_grid_scroll((160, 40), 18), 0);
        assert_eq!(max_grid_scroll((160, 40), 36), 2);
        // 80x24: 3 columns and 2 visible rows, so 18 cards leave 4 rows below.
        assert_eq!(max_grid_scroll((80, 24), 18), 4);
        assert_eq!(max_grid_scroll((80, 24), 0), 0);
        assert_eq!(max_grid_scroll((10, 5), 18), 0);
    }

    #[test]
    fn card_cells_need_room_for_one_card() {
        assert!(card_cells(Rect::new(0, 0, CARD_WIDTH - 1, 40), 5, 0).is_empty());
        assert!(card_cells(Rect::new(0, 0, 80, 40), 0, 0).is_empty());
    }

    #[test]
    fn search_keys_edit_and_submit() {
        let state = AppState::default();
        let typed = handle_search_event(&key(KeyCode::Char('p')), &state);
        assert_eq!(typed.actions, vec![Action::SearchInput('p')]);
        assert!(typed.consumed);

        let submit = handle_search_event(&key(KeyCode::Enter), &state);
        assert_eq!(submit.actions, vec![Action::SearchSubmit]);

        let clear = handle_search_event(&key(KeyCode::Esc), &state);
        assert_eq!(clear.actions, vec![Action::SearchClear]);
    }

    #[test]
    fn grid_keys_map_to_page_intents() {
        let state = AppState::default();
        let cases = [
            (KeyCode::Left, Action::PagePrev),
            (KeyCode::Char('l'), Action::PageNext),
            (KeyCode::Home, Action::PageFirst),
            (KeyCode::End, Action::PageLast),
            (KeyCode::Down, Action::GridScroll(1)),
            (KeyCode::Char('['), Action::HistoryBack),
            (KeyCode::Char(']'), Action::HistoryForward),
            (KeyCode::Char('C'), Action::CacheClear),
            (KeyCode::Char('/'), Action::SearchStart),
            (KeyCode::Char('4'), Action::PageRequest(4)),
        ];
        for (code, expected) in cases {
            let response = handle_grid_event(&key(code), &state);
            assert_eq!(response.actions, vec![expected], "{code:?}");
        }
    }

    #[test]
    fn escape_in_grid_only_clears_an_active_search() {
        let mut state = AppState::default();
        assert!(handle_grid_event(&key(KeyCode::Esc), &state).actions.is_empty());

        state.search_term = "pika".to_string();
        assert_eq!(
            handle_grid_event(&key(KeyCode::Esc), &state).actions,
            vec![Action::SearchClear]
        );
    }

    #[test]
    fn routing_follows_search_focus() {
        let mut state = AppState::default();
        assert_eq!(state.focused(), Some(CatalogComponentId::Grid));
        assert_eq!(state.modal(), None);

        state.search_bar.start_editing();
        assert_eq!(state.focused(), Some(CatalogComponentId::Search));
        assert_eq!(state.modal(), Some(CatalogComponentId::Search));
    }
}
