use crate::dashboard::{Dashboard, DonutChart, ProportionSlice};
use crate::format::format_rand;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Qualifications,
    QualificationGender,
    EthnicByGender,
    QualificationKey,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Overview,
        Page::Qualifications,
        Page::QualificationGender,
        Page::EthnicByGender,
        Page::QualificationKey,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Qualifications,
            Page::Qualifications => Page::QualificationGender,
            Page::QualificationGender => Page::EthnicByGender,
            Page::EthnicByGender => Page::QualificationKey,
            Page::QualificationKey => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::QualificationKey,
            Page::Qualifications => Page::Overview,
            Page::QualificationGender => Page::Qualifications,
            Page::EthnicByGender => Page::QualificationGender,
            Page::QualificationKey => Page::EthnicByGender,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Qualifications => "Qualifications",
            Page::QualificationGender => "Qualification × Gender",
            Page::EthnicByGender => "Ethnic Groups by Gender",
            Page::QualificationKey => "Qualification Key",
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub current_page: Page,
    pub key_state: TableState,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let mut key_state = TableState::default();
        if !dashboard.qualification_key.is_empty() {
            key_state.select(Some(0));
        }

        Self {
            dashboard,
            current_page: Page::Overview,
            key_state,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn key_len(&self) -> usize {
        self.dashboard.qualification_key.len()
    }

    pub fn next(&mut self) {
        let len = self.key_len();
        if len == 0 {
            return;
        }
        let i = match self.key_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.key_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.key_len();
        if len == 0 {
            return;
        }
        let i = match self.key_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.key_state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.key_len();
        if len == 0 {
            return;
        }
        let i = match self.key_state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.key_state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.key_len() == 0 {
            return;
        }
        let i = self.key_state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.key_state.select(Some(i));
    }

    pub fn first(&mut self) {
        if self.key_len() > 0 {
            self.key_state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.key_len();
        if len > 0 {
            self.key_state.select(Some(len - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Right => app.next_page(),
                KeyCode::Left => app.previous_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        Page::Qualifications => render_qualifications(f, chunks[1], app),
        Page::QualificationGender => render_qualification_gender(f, chunks[1], app),
        Page::EthnicByGender => render_ethnic_by_gender(f, chunks[1], app),
        Page::QualificationKey => render_key_table(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", format_rand(app.dashboard.grand_total())),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", app.dashboard.title)),
    );

    f.render_widget(header, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.current_page.title()),
        Style::default().fg(Color::Cyan),
    )];

    if app.current_page == Page::QualificationKey {
        let selected = app.key_state.selected().map(|i| i + 1).unwrap_or(0);
        status_spans.push(Span::raw(format!("Row: {}/{} | ", selected, app.key_len())));
        status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Nav | "));
        status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Fast | "));
    } else {
        status_spans.push(Span::raw("| "));
    }

    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn header_row(titles: &[&str]) -> Row<'static> {
    let cells = titles
        .iter()
        .map(|h| {
            Cell::from(h.to_string()).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect::<Vec<_>>();

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn no_data(f: &mut Frame, area: Rect, title: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "  No data",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )))
    .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title)));
    f.render_widget(paragraph, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_shares(f, chunks[0], &app.dashboard.institution_shares, "Total Funds by Institution");
    render_shares(f, chunks[1], &app.dashboard.ethnic_shares, "Total Funds by Ethnic Group");
}

fn render_shares(f: &mut Frame, area: Rect, shares: &[ProportionSlice], title: &str) {
    if shares.is_empty() {
        no_data(f, area, title);
        return;
    }

    let rows = shares.iter().map(|s| {
        Row::new(vec![
            Cell::from(truncate(&s.label, 30)),
            Cell::from(format_rand(s.value)),
            Cell::from(s.percent_label.clone()).style(Style::default().fg(Color::Cyan)),
            Cell::from(share_bar(s.share, 20)).style(Style::default().fg(Color::Blue)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(16),
            Constraint::Length(9),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Label", "Total Funds", "Share", ""]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", title)),
    );

    f.render_widget(table, area);
}

fn render_qualifications(f: &mut Frame, area: Rect, app: &App) {
    let title = "Total Funds by Qualification";
    let totals = &app.dashboard.qualification_totals;
    if totals.is_empty() {
        no_data(f, area, title);
        return;
    }

    let bars: Vec<Bar> = totals
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.value.max(0.0).round() as u64)
                .label(Line::from(truncate(&b.label, 28)))
                .text_value(format_rand(b.value))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", title)),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::LightBlue))
        .value_style(Style::default().fg(Color::Black).bg(Color::LightBlue))
        .data(BarGroup::default().bars(&bars));

    f.render_widget(chart, area);
}

fn render_qualification_gender(f: &mut Frame, area: Rect, app: &App) {
    let title = "Total Funds by Qualification and Gender";
    let grouped = &app.dashboard.qualification_by_gender;
    if grouped.is_empty() {
        no_data(f, area, title);
        return;
    }

    const SERIES_COLORS: [Color; 4] = [Color::Blue, Color::LightRed, Color::Green, Color::Magenta];

    let legend = grouped
        .series
        .iter()
        .map(|s| format!("■ {}", s))
        .collect::<Vec<_>>()
        .join("  ");

    let mut chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(
                    " {} (axis max {}) {} ",
                    title,
                    format_rand(grouped.axis_max),
                    legend
                )),
        )
        .bar_width(5)
        .bar_gap(1)
        .group_gap(3)
        .max(grouped.axis_max.max(1.0) as u64);

    for (category, values) in grouped.categories.iter().zip(&grouped.values) {
        let bars: Vec<Bar> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Bar::default()
                    .value(v.max(0.0).round() as u64)
                    .text_value(String::new())
                    .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
            })
            .collect();

        chart = chart.data(
            BarGroup::default()
                .label(Line::from(truncate(category, 12)))
                .bars(&bars),
        );
    }

    f.render_widget(chart, area);
}

fn render_ethnic_by_gender(f: &mut Frame, area: Rect, app: &App) {
    let notes_height = if app.dashboard.notes.is_empty() {
        0
    } else {
        app.dashboard.notes.len() as u16 + 3
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(notes_height)])
        .split(area);

    let donut_count = app.dashboard.donuts.len().max(1) as u32;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            app.dashboard
                .donuts
                .iter()
                .map(|_| Constraint::Ratio(1, donut_count))
                .collect::<Vec<_>>(),
        )
        .split(rows[0]);

    for (donut, column) in app.dashboard.donuts.iter().zip(columns.iter()) {
        render_donut(f, *column, donut);
    }

    if !app.dashboard.notes.is_empty() {
        let lines: Vec<Line> = app
            .dashboard
            .notes
            .iter()
            .map(|note| {
                Line::from(vec![
                    Span::styled(
                        format!("  {} ", note.heading()),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(note.breakdown.clone()),
                ])
            })
            .collect();

        let notes = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Note on 'Other' Category "),
        );
        f.render_widget(notes, rows[1]);
    }
}

fn render_donut(f: &mut Frame, area: Rect, donut: &DonutChart) {
    let title = format!(" {} - Total {} ", donut.group, donut.total_label);
    if donut.is_empty() {
        no_data(f, area, &title);
        return;
    }

    let rows = donut.slices.iter().map(|s| {
        Row::new(vec![
            Cell::from("██").style(Style::default().fg(hex_color(&s.color))),
            Cell::from(s.display_label.clone()),
            Cell::from(format_rand(s.value)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(3), Constraint::Min(20), Constraint::Length(16)],
    )
    .header(header_row(&["", "Ethnic Group", "Total Funds"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    );

    f.render_widget(table, area);
}

fn render_key_table(f: &mut Frame, area: Rect, app: &mut App) {
    let title = "Qualification Key Table";
    if app.dashboard.qualification_key.is_empty() {
        no_data(f, area, title);
        return;
    }

    let columns = app.dashboard.qualification_key.columns();
    let header = header_row(&columns.iter().map(String::as_str).collect::<Vec<_>>());

    let rows = app.dashboard.qualification_key.entries.iter().map(|entry| {
        let mut cells = vec![
            Cell::from(truncate(&entry.institution, 30)),
            Cell::from(truncate(&entry.qualification, 40)),
        ];
        cells.extend(entry.details.iter().map(|d| Cell::from(truncate(d, 40))));
        Row::new(cells).height(1)
    });

    let widths = columns
        .iter()
        .enumerate()
        .map(|(i, _)| if i == 0 { Constraint::Length(32) } else { Constraint::Min(20) })
        .collect::<Vec<_>>();

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", title)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.key_state);
}

fn share_bar(share: f64, width: usize) -> String {
    let filled = ((share.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    "█".repeat(filled)
}

/// "#1f77b4" → Color::Rgb; anything unparsable falls back to gray
fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Color::Gray;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::records::{Dataset, QualificationKeyEntry, QualificationKeyTable};

    fn app_with_key_rows(n: usize) -> App {
        let key = QualificationKeyTable {
            detail_columns: Vec::new(),
            entries: (0..n)
                .map(|i| QualificationKeyEntry {
                    institution: format!("Inst{}", i),
                    qualification: "BSc".to_string(),
                    details: Vec::new(),
                })
                .collect(),
        };
        let dataset = Dataset::new(Vec::new(), key);
        let dashboard = Dashboard::build(&dataset, &DashboardConfig::default()).unwrap();
        App::new(dashboard)
    }

    #[test]
    fn test_page_cycle() {
        let mut page = Page::Overview;
        for _ in 0..Page::ALL.len() {
            page = page.next();
        }
        assert_eq!(page, Page::Overview);
        assert_eq!(Page::Overview.previous(), Page::QualificationKey);
        assert_eq!(Page::Qualifications.next().previous(), Page::Qualifications);
    }

    #[test]
    fn test_app_navigation() {
        let mut app = app_with_key_rows(30);
        assert_eq!(app.current_page, Page::Overview);
        assert_eq!(app.key_state.selected(), Some(0));

        app.next_page();
        assert_eq!(app.current_page, Page::Qualifications);
        app.previous_page();
        app.previous_page();
        assert_eq!(app.current_page, Page::QualificationKey);

        app.previous();
        assert_eq!(app.key_state.selected(), Some(29));
        app.next();
        assert_eq!(app.key_state.selected(), Some(0));
        app.page_down();
        assert_eq!(app.key_state.selected(), Some(20));
        app.page_down();
        assert_eq!(app.key_state.selected(), Some(29));
        app.page_up();
        assert_eq!(app.key_state.selected(), Some(9));
        app.first();
        assert_eq!(app.key_state.selected(), Some(0));
        app.last();
        assert_eq!(app.key_state.selected(), Some(29));
    }

    #[test]
    fn test_navigation_on_empty_key_table() {
        let mut app = app_with_key_rows(0);
        assert_eq!(app.key_state.selected(), None);
        app.next();
        app.page_down();
        app.last();
        assert_eq!(app.key_state.selected(), None);
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#1f77b4"), Color::Rgb(0x1f, 0x77, 0xb4));
        assert_eq!(hex_color("#ccc"), Color::Gray);
        assert_eq!(hex_color("#zzzzzz"), Color::Gray);
    }

    #[test]
    fn test_truncate_and_share_bar() {
        assert_eq!(truncate("Diploma", 10), "Diploma");
        assert_eq!(truncate("Bachelor of Science", 10), "Bachelo...");
        assert_eq!(share_bar(0.5, 10).chars().count(), 5);
        assert_eq!(share_bar(2.0, 10).chars().count(), 10);
    }
}
