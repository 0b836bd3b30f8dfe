// 🖥️ Terminal admin screens: members, transactions, dues calendar, voicemails

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use church_admin::access::Role;
use church_admin::dues::MonthStatus;
use church_admin::entities::{Household, Member, Transaction, TransactionQuery, TransactionType, Voicemail};
use church_admin::listing::{Debouncer, ListState, Paged, SearchGate};
use church_admin::views::{self, DuesView};
use church_admin::{phone, telemetry};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Where the transaction screen gets its rows (backend or test double)
pub trait TransactionSource {
    fn fetch(&mut self, query: &TransactionQuery) -> Result<Vec<Transaction>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Members,
    Transactions,
    Dues,
    Voicemails,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Members, Page::Transactions, Page::Dues, Page::Voicemails];

    pub fn next(&self) -> Self {
        match self {
            Page::Members => Page::Transactions,
            Page::Transactions => Page::Dues,
            Page::Dues => Page::Voicemails,
            Page::Voicemails => Page::Members,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Members => Page::Voicemails,
            Page::Transactions => Page::Members,
            Page::Dues => Page::Transactions,
            Page::Voicemails => Page::Dues,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Members => "Members",
            Page::Transactions => "Transactions",
            Page::Dues => "Dues",
            Page::Voicemails => "Voicemail",
        }
    }

    /// Sortable columns, in the order of the number keys
    fn sort_keys(&self) -> &'static [&'static str] {
        match self {
            Page::Members => &[
                "lastName",
                "firstName",
                "email",
                "familyId",
                "pledgeAmount",
                "phone",
                "roles",
            ],
            Page::Transactions => &[
                "paymentDate",
                "name",
                "amount",
                "paymentType",
                "paymentMethod",
                "receiptNumber",
            ],
            Page::Voicemails => &["createdAt", "fromNumber", "callerName", "duration", "transcription"],
            Page::Dues => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

const ROLE_FILTERS: [Role; 6] = [
    Role::Admin,
    Role::Treasurer,
    Role::Secretary,
    Role::ChurchLeadership,
    Role::DepartmentLeader,
    Role::Member,
];

pub struct App {
    pub current_page: Page,
    pub input_mode: InputMode,
    pub search_input: String,

    pub members: Vec<Member>,
    pub member_list: ListState,
    pub member_table: TableState,

    pub transactions: Vec<Transaction>,
    /// Typed server-side search term (may not have settled yet)
    pub transaction_search: String,
    pub transaction_list: ListState,
    pub transaction_table: TableState,

    pub voicemails: Vec<Voicemail>,
    pub voicemail_list: ListState,
    pub voicemail_table: TableState,

    pub dues: Option<DuesView>,
    pub dues_year: i32,
    pub household: bool,
    dues_member: Option<String>,

    /// One-line banner: last error or notice
    pub status: Option<String>,

    today: NaiveDate,
    gate: SearchGate,
    debouncer: Debouncer,
    source: Box<dyn TransactionSource>,
}

impl App {
    pub fn new(
        members: Vec<Member>,
        voicemails: Vec<Voicemail>,
        source: Box<dyn TransactionSource>,
        page_size: usize,
        search_debounce: Duration,
        today: NaiveDate,
    ) -> Self {
        let mut app = Self {
            current_page: Page::Members,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            members,
            member_list: ListState::new(page_size),
            member_table: TableState::default(),
            transactions: Vec::new(),
            transaction_search: String::new(),
            transaction_list: ListState::new(page_size),
            transaction_table: TableState::default(),
            voicemails,
            voicemail_list: ListState::new(page_size),
            voicemail_table: TableState::default(),
            dues: None,
            dues_year: today.year(),
            household: false,
            dues_member: None,
            status: None,
            today,
            gate: SearchGate::default(),
            debouncer: Debouncer::new(search_debounce),
            source,
        };
        app.search_transactions("");
        app.reset_selection();
        app
    }

    // ------------------------------------------------------------------
    // Rows of the current query
    // ------------------------------------------------------------------

    pub fn member_page(&self) -> Paged<Member> {
        views::member_rows(&self.members, self.member_list.query())
    }

    pub fn transaction_page(&self) -> Paged<Transaction> {
        views::transaction_rows(&self.transactions, self.transaction_list.query())
    }

    pub fn voicemail_page(&self) -> Paged<Voicemail> {
        views::voicemail_rows(&self.voicemails, self.voicemail_list.query())
    }

    fn row_count(&self) -> usize {
        match self.current_page {
            Page::Members => self.member_page().items.len(),
            Page::Transactions => self.transaction_page().items.len(),
            Page::Voicemails => self.voicemail_page().items.len(),
            Page::Dues => 0,
        }
    }

    fn total_pages(&self) -> usize {
        match self.current_page {
            Page::Members => self.member_page().total_pages,
            Page::Transactions => self.transaction_page().total_pages,
            Page::Voicemails => self.voicemail_page().total_pages,
            Page::Dues => 1,
        }
    }

    fn list_mut(&mut self) -> Option<&mut ListState> {
        match self.current_page {
            Page::Members => Some(&mut self.member_list),
            Page::Transactions => Some(&mut self.transaction_list),
            Page::Voicemails => Some(&mut self.voicemail_list),
            Page::Dues => None,
        }
    }

    fn table_mut(&mut self) -> Option<&mut TableState> {
        match self.current_page {
            Page::Members => Some(&mut self.member_table),
            Page::Transactions => Some(&mut self.transaction_table),
            Page::Voicemails => Some(&mut self.voicemail_table),
            Page::Dues => None,
        }
    }

    pub fn selected_member(&self) -> Option<Member> {
        let i = self.member_table.selected()?;
        self.member_page().items.into_iter().nth(i)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn next_tab(&mut self) {
        self.current_page = self.current_page.next();
        self.sync_search_input();
    }

    pub fn previous_tab(&mut self) {
        self.current_page = self.current_page.previous();
        self.sync_search_input();
    }

    fn sync_search_input(&mut self) {
        self.search_input = match self.current_page {
            Page::Members => self.member_list.query().search.clone(),
            Page::Voicemails => self.voicemail_list.query().search.clone(),
            Page::Transactions => self.transaction_search.clone(),
            Page::Dues => String::new(),
        };
    }

    fn reset_selection(&mut self) {
        let has_rows = self.row_count() > 0;
        if let Some(table) = self.table_mut() {
            table.select(if has_rows { Some(0) } else { None });
        }
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if let Some(table) = self.table_mut() {
            if len == 0 {
                return;
            }
            let i = match table.selected() {
                Some(i) if i + 1 < len => i + 1,
                _ => 0,
            };
            table.select(Some(i));
        }
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if let Some(table) = self.table_mut() {
            if len == 0 {
                return;
            }
            let i = match table.selected() {
                Some(0) | None => len - 1,
                Some(i) => i - 1,
            };
            table.select(Some(i));
        }
    }

    pub fn next_list_page(&mut self) {
        let total = self.total_pages();
        if let Some(list) = self.list_mut() {
            list.next_page(total);
        }
        self.reset_selection();
    }

    pub fn previous_list_page(&mut self) {
        if let Some(list) = self.list_mut() {
            list.previous_page();
        }
        self.reset_selection();
    }

    /// Number key n sorts by the page's n-th column (again: flips direction)
    pub fn sort_by_column(&mut self, column: usize) {
        let Some(key) = self.current_page.sort_keys().get(column).copied() else {
            return;
        };
        if let Some(list) = self.list_mut() {
            list.toggle_sort(key);
        }
        self.reset_selection();
    }

    /// Cycle the page's categorical filter: all -> each value -> all
    pub fn cycle_filter(&mut self) {
        let (key, values): (&str, Vec<&str>) = match self.current_page {
            Page::Members => ("role", ROLE_FILTERS.iter().map(|r| r.as_str()).collect()),
            Page::Transactions => (
                "paymentType",
                TransactionType::ALL.iter().map(|t| t.as_str()).collect(),
            ),
            Page::Voicemails => ("listened", vec!["false", "true"]),
            Page::Dues => return,
        };
        let Some(list) = self.list_mut() else {
            return;
        };
        let next = match list.filter(key) {
            None => values.first().copied(),
            Some(current) => values
                .iter()
                .position(|v| *v == current)
                .and_then(|i| values.get(i + 1))
                .copied(),
        };
        match next {
            Some(value) => list.set_filter(key, value),
            None => list.clear_filter(key),
        }
        self.reset_selection();
    }

    pub fn active_filter(&self) -> Option<String> {
        let (list, key) = match self.current_page {
            Page::Members => (&self.member_list, "role"),
            Page::Transactions => (&self.transaction_list, "paymentType"),
            Page::Voicemails => (&self.voicemail_list, "listened"),
            Page::Dues => return None,
        };
        list.filter(key).map(|v| format!("{key}={v}"))
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// A keystroke changed the search box. Members and voicemails filter
    /// locally at once; transactions are searched server-side after the
    /// debounce settles.
    pub fn on_search_input(&mut self, now: Instant) {
        let term = self.search_input.clone();
        match self.current_page {
            Page::Members => self.member_list.set_search(term),
            Page::Voicemails => self.voicemail_list.set_search(term),
            Page::Transactions => {
                self.transaction_search = term.clone();
                self.debouncer.push(term, now);
            }
            Page::Dues => {}
        }
        self.reset_selection();
    }

    /// Called on every loop tick
    pub fn tick(&mut self, now: Instant) {
        if let Some(term) = self.debouncer.poll(now) {
            self.search_transactions(&term);
        }
    }

    pub fn search_transactions(&mut self, term: &str) {
        if !self.gate.should_fetch(term) {
            return;
        }
        let query = TransactionQuery {
            search: Some(term.trim().to_string()).filter(|t| !t.is_empty()),
            ..Default::default()
        };
        match self.source.fetch(&query) {
            Ok(rows) => {
                self.transactions = rows;
                self.gate.mark_fetched(term);
                self.transaction_list.go_to(1);
                self.status = None;
            }
            Err(err) => self.status = Some(format!("Search failed: {err:#}")),
        }
        if self.current_page == Page::Transactions {
            self.reset_selection();
        }
    }

    // ------------------------------------------------------------------
    // Dues
    // ------------------------------------------------------------------

    pub fn open_dues(&mut self, member_id: &str) {
        self.dues_member = Some(member_id.to_string());
        self.current_page = Page::Dues;
        self.load_dues();
    }

    pub fn load_dues(&mut self) {
        let Some(member_id) = self.dues_member.clone() else {
            return;
        };
        let Some(member) = self.members.iter().find(|m| m.id == member_id).cloned() else {
            self.status = Some(format!("Member {member_id} not found"));
            return;
        };

        let year = self.dues_year;
        let query = TransactionQuery {
            member_id: (!self.household).then(|| member.id.clone()),
            start_date: NaiveDate::from_ymd_opt(year, 1, 1),
            end_date: NaiveDate::from_ymd_opt(year, 12, 31),
            ..Default::default()
        };
        let transactions = match self.source.fetch(&query) {
            Ok(rows) => rows,
            Err(err) => {
                self.status = Some(format!("Could not load dues: {err:#}"));
                return;
            }
        };

        self.dues = Some(if self.household {
            let household = Household::of(&member, &self.members);
            views::household_dues_view(&household, &transactions, year, self.today, false)
        } else {
            views::member_dues_view(&member, &self.members, &transactions, year, self.today, false)
        });
        self.status = None;
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Returns false when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if self.input_mode == InputMode::Search {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Backspace => {
                    self.search_input.pop();
                    self.on_search_input(now);
                }
                KeyCode::Char(c) => {
                    self.search_input.push(c);
                    self.on_search_input(now);
                }
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_tab();
                } else {
                    self.next_tab();
                }
            }
            KeyCode::BackTab => self.previous_tab(),
            KeyCode::Char('/') if self.current_page != Page::Dues => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('f') => self.cycle_filter(),
            KeyCode::Char('n') | KeyCode::PageDown => self.next_list_page(),
            KeyCode::Char('p') | KeyCode::PageUp => self.previous_list_page(),
            KeyCode::Char(c @ '1'..='9') => {
                self.sort_by_column(c as usize - '1' as usize);
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Enter if self.current_page == Page::Members => {
                if let Some(member) = self.selected_member() {
                    self.open_dues(&member.id);
                }
            }
            KeyCode::Char('h') if self.current_page == Page::Dues => {
                self.household = !self.household;
                self.load_dues();
            }
            KeyCode::Char('[') if self.current_page == Page::Dues => {
                self.dues_year -= 1;
                self.load_dues();
            }
            KeyCode::Char(']') if self.current_page == Page::Dues => {
                self.dues_year += 1;
                self.load_dues();
            }
            _ => {}
        }
        true
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    telemetry::set_muted(true);
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    telemetry::set_muted(false);

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Poll instead of blocking so a settled search fires without a keypress
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key, Instant::now()) {
                    return Ok(());
                }
            }
        }
        app.tick(Instant::now());
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs + search box
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Members => render_members(f, chunks[1], app),
        Page::Transactions => render_transactions(f, chunks[1], app),
        Page::Dues => render_dues(f, chunks[1], app),
        Page::Voicemails => render_voicemails(f, chunks[1], app),
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

        let name = if *page == Page::Voicemails {
            format!("{} ({} new)", page.title(), views::unheard_count(&app.voicemails))
        } else {
            page.title().to_string()
        };
        tab_spans.push(Span::styled(name, style));
    }

    if app.current_page != Page::Dues {
        tab_spans.push(Span::raw("  |  "));
        let search_style = if app.input_mode == InputMode::Search {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::White)
        };
        tab_spans.push(Span::styled(format!("Search: {}", app.search_input), search_style));
        if app.input_mode == InputMode::Search {
            tab_spans.push(Span::styled("▏", search_style));
        }
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&str]) -> Row<'static> {
    let cells: Vec<Cell> = titles
        .iter()
        .enumerate()
        .map(|(i, h)| {
            Cell::from(format!("{} {}", i + 1, h)).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn list_block<T>(title: &str, paged: &Paged<T>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(
            " {} - page {}/{} ({} total) ",
            title,
            paged.page,
            paged.total_pages.max(1),
            paged.total_items
        ))
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn render_members(f: &mut Frame, area: Rect, app: &mut App) {
    let paged = app.member_page();
    let rows = paged.items.iter().map(|m| {
        let phone_label = m
            .phone
            .as_deref()
            .map(|p| phone::format_display(p).unwrap_or_else(|| p.to_string()))
            .unwrap_or_default();
        Row::new(vec![
            Cell::from(truncate(&m.last_name, 18)),
            Cell::from(truncate(&m.first_name, 18)),
            Cell::from(truncate(m.email.as_deref().unwrap_or(""), 28)),
            Cell::from(m.family_id.clone().unwrap_or_default()),
            Cell::from(format!("{:.2}", m.pledge_amount)),
            Cell::from(phone_label),
            Cell::from(truncate(&m.role_labels(), 30)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(20),
            Constraint::Length(30),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Last", "First", "Email", "Family", "Pledge", "Phone", "Roles"]))
    .block(list_block("Members", &paged))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.member_table);
}

fn type_color(kind: TransactionType) -> Color {
    match kind {
        TransactionType::MembershipDue => Color::Cyan,
        TransactionType::Tithe | TransactionType::Offering => Color::Green,
        TransactionType::Donation => Color::Magenta,
        TransactionType::PledgePayment => Color::Yellow,
        _ => Color::White,
    }
}

fn render_transactions(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let paged = app.transaction_page();
    let rows = paged.items.iter().map(|tx| {
        let color = type_color(tx.payment_type);
        Row::new(vec![
            Cell::from(tx.payment_date.format("%Y-%m-%d").to_string()),
            Cell::from(truncate(&tx.display_name(), 28)),
            Cell::from(format!("{:.2}", tx.amount)).style(Style::default().fg(color)),
            Cell::from(tx.payment_type.label()).style(Style::default().fg(color)),
            Cell::from(tx.payment_method.as_str()),
            Cell::from(tx.receipt_number.clone().unwrap_or_default()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(30),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Date", "Name", "Amount", "Type", "Method", "Receipt"]))
    .block(list_block("Transactions", &paged))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[0], &mut app.transaction_table);

    let totals = views::transaction_totals(&app.transactions);
    let summary = Line::from(vec![
        Span::styled(format!(" {} loaded", totals.count), Style::default().fg(Color::Cyan)),
        Span::raw("  |  "),
        Span::styled(format!("Total ${:.2}", totals.total), Style::default().fg(Color::Green)),
    ]);
    f.render_widget(Paragraph::new(summary), chunks[1]);
}

fn render_voicemails(f: &mut Frame, area: Rect, app: &mut App) {
    let paged = app.voicemail_page();
    let rows = paged.items.iter().map(|v| {
        let style = if v.listened {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };
        Row::new(vec![
            Cell::from(
                v.created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ),
            Cell::from(phone::format_display(&v.from_number).unwrap_or_else(|| v.from_number.clone())),
            Cell::from(truncate(v.caller_name.as_deref().unwrap_or(""), 20)),
            Cell::from(v.duration_label()),
            Cell::from(truncate(v.transcription.as_deref().unwrap_or(""), 60)),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(16),
            Constraint::Length(22),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Received", "From", "Caller", "Length", "Transcription"]))
    .block(list_block("Voicemail", &paged))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.voicemail_table);
}

fn status_color(status: MonthStatus) -> Color {
    match status {
        MonthStatus::Paid => Color::Green,
        MonthStatus::Due => Color::Red,
        MonthStatus::Upcoming => Color::DarkGray,
        MonthStatus::PreMembership => Color::Blue,
    }
}

fn render_dues(f: &mut Frame, area: Rect, app: &App) {
    let Some(view) = &app.dues else {
        let hint = Paragraph::new("Select a member on the Members page and press Enter.")
            .block(Block::default().borders(Borders::ALL).title(" Dues "));
        f.render_widget(hint, area);
        return;
    };
    let summary = &view.summary;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Summary
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Calendar + contributions
        ])
        .split(area);

    let scope = if app.household {
        format!("household of {}", view.household_size)
    } else {
        "member".to_string()
    };
    let summary_lines = vec![
        Line::from(vec![
            Span::styled(view.name.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(format!("  ({scope}, {})", summary.year)),
        ]),
        Line::from(format!(
            "Pledge ${:.2}/yr  |  Monthly ${:.2}  |  Collected ${:.2}  |  Remaining ${:.2}",
            summary.annual_pledge, summary.monthly_payment, summary.dues_collected, summary.remaining
        )),
        Line::from(Span::styled(
            if summary.is_current() {
                "Up to date".to_string()
            } else {
                format!("${:.2} due over {} month(s)", summary.total_due, summary.months_due())
            },
            Style::default().fg(if summary.is_current() { Color::Green } else { Color::Red }),
        )),
    ];
    f.render_widget(
        Paragraph::new(summary_lines).block(Block::default().borders(Borders::ALL).title(" Dues ")),
        chunks[0],
    );

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(summary.progress));
    f.render_widget(gauge, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[2]);

    let rows = summary.months.iter().map(|m| {
        let color = status_color(m.status);
        Row::new(vec![
            Cell::from(m.label.clone()),
            Cell::from(format!("{:.2}", m.expected)),
            Cell::from(format!("{:.2}", m.paid)),
            Cell::from(format!("{:.2}", m.due)).style(Style::default().fg(color)),
            Cell::from(m.status.as_str()).style(Style::default().fg(color)),
        ])
    });
    let calendar = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Month", "Expected", "Paid", "Due", "Status"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Calendar "));
    f.render_widget(calendar, body[0]);

    let mut lines: Vec<Line> = summary
        .contributions
        .non_zero()
        .into_iter()
        .map(|(label, amount)| Line::from(format!("{label:<16} ${amount:.2}")))
        .collect();
    if lines.is_empty() {
        lines.push(Line::from("No other contributions"));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Other giving ")),
        body[1],
    );
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(message) = &app.status {
        status_spans.push(Span::styled(format!(" {message} "), Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" | "));
    }

    if let Some(filter) = app.active_filter() {
        status_spans.push(Span::styled(format!("Filter: {filter}"), Style::default().fg(Color::Green)));
        status_spans.push(Span::raw(" | "));
    }

    let keys: &[(&str, &str)] = match (app.input_mode, app.current_page) {
        (InputMode::Search, _) => &[("Enter/Esc", "Done")],
        (_, Page::Dues) => &[("h", "Household"), ("[/]", "Year"), ("Tab", "Page"), ("q", "Quit")],
        (_, Page::Members) => &[
            ("/", "Search"),
            ("f", "Filter"),
            ("#", "Sort"),
            ("n/p", "Page"),
            ("Enter", "Dues"),
            ("Tab", "Screen"),
            ("q", "Quit"),
        ],
        _ => &[
            ("/", "Search"),
            ("f", "Filter"),
            ("#", "Sort"),
            ("n/p", "Page"),
            ("Tab", "Screen"),
            ("q", "Quit"),
        ],
    };
    for (i, (key, label)) in keys.iter().enumerate() {
        if i > 0 {
            status_spans.push(Span::raw(" | "));
        }
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!(" {label}")));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use church_admin::entities::{MemberStatus, PaymentMethod};
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    /// Records every query and answers from a fixed set
    struct FakeSource {
        rows: Vec<Transaction>,
        calls: Rc<RefCell<Vec<TransactionQuery>>>,
    }

    impl TransactionSource for FakeSource {
        fn fetch(&mut self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
            self.calls.borrow_mut().push(query.clone());
            Ok(self.rows.iter().filter(|tx| query.matches(tx)).cloned().collect())
        }
    }

    fn member(id: &str, first: &str, family: &str, roles: &[Role]) -> Member {
        Member {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: "Tesfaye".to_string(),
            email: None,
            phone: None,
            family_id: Some(family.to_string()),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
            pledge_amount: 1200.0,
            membership_start_date: None,
            status: MemberStatus::Active,
            dependents: vec![],
        }
    }

    fn dues(id: &str, member_id: &str, amount: f64, month: u32) -> Transaction {
        Transaction {
            id: id.to_string(),
            member_id: Some(member_id.to_string()),
            payer_name: Some(format!("Payer {member_id}")),
            amount,
            payment_date: NaiveDate::from_ymd_opt(2024, month, 5).unwrap(),
            payment_type: TransactionType::MembershipDue,
            payment_method: PaymentMethod::Check,
            receipt_number: Some(format!("R-{id}")),
            note: None,
            income_category_id: None,
            donor_first_name: None,
            donor_last_name: None,
            donor_email: None,
            donor_phone: None,
            status: None,
        }
    }

    fn app() -> (App, Rc<RefCell<Vec<TransactionQuery>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let source = FakeSource {
            rows: vec![dues("1", "1", 100.0, 1), dues("2", "2", 100.0, 2), dues("3", "1", 100.0, 2)],
            calls: calls.clone(),
        };
        let members = vec![
            member("1", "Abel", "F1", &[Role::Member, Role::Admin]),
            member("2", "Hana", "F1", &[Role::Member]),
            member("3", "Dawit", "F2", &[Role::Member]),
        ];
        let app = App::new(
            members,
            vec![],
            Box::new(source),
            20,
            Duration::from_millis(300),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );
        (app, calls)
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), now)
    }

    #[test]
    fn test_initial_load() {
        let (app, calls) = app();
        assert_eq!(app.transactions.len(), 3);
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(app.member_table.selected(), Some(0));
    }

    #[test]
    fn test_member_search_is_local() {
        let (mut app, calls) = app();
        let now = Instant::now();
        press(&mut app, KeyCode::Char('/'), now);
        for c in "haN".chars() {
            press(&mut app, KeyCode::Char(c), now);
        }
        press(&mut app, KeyCode::Enter, now);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.member_page().total_items, 1);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_transaction_search_debounced_and_gated() {
        let (mut app, calls) = app();
        let start = Instant::now();
        press(&mut app, KeyCode::Tab, start);
        assert_eq!(app.current_page, Page::Transactions);

        press(&mut app, KeyCode::Char('/'), start);
        press(&mut app, KeyCode::Char('R'), start);
        press(&mut app, KeyCode::Char('-'), start);
        app.tick(start + Duration::from_millis(400));
        // Two characters: below the minimum, no refetch
        assert_eq!(calls.borrow().len(), 1);

        press(&mut app, KeyCode::Char('3'), start + Duration::from_millis(500));
        app.tick(start + Duration::from_millis(600));
        assert_eq!(calls.borrow().len(), 1);
        app.tick(start + Duration::from_millis(900));
        assert_eq!(calls.borrow().len(), 2);
        assert_eq!(calls.borrow()[1].search.as_deref(), Some("R-3"));
        assert_eq!(app.transactions.len(), 1);
    }

    #[test]
    fn test_filter_cycles_back_to_all() {
        let (mut app, _) = app();
        let now = Instant::now();
        press(&mut app, KeyCode::Char('f'), now);
        assert_eq!(app.active_filter().as_deref(), Some("role=admin"));
        assert_eq!(app.member_page().total_items, 1);

        for _ in 0..ROLE_FILTERS.len() {
            press(&mut app, KeyCode::Char('f'), now);
        }
        assert_eq!(app.active_filter(), None);
        assert_eq!(app.member_page().total_items, 3);
    }

    #[test]
    fn test_sort_key_toggles_direction() {
        let (mut app, _) = app();
        let now = Instant::now();
        press(&mut app, KeyCode::Char('2'), now);
        assert_eq!(app.member_page().items[0].first_name, "Abel");
        press(&mut app, KeyCode::Char('2'), now);
        assert_eq!(app.member_page().items[0].first_name, "Hana");
    }

    #[test]
    fn test_enter_opens_member_then_household_dues() {
        let (mut app, calls) = app();
        let now = Instant::now();
        app.sort_by_column(1);
        press(&mut app, KeyCode::Enter, now);

        assert_eq!(app.current_page, Page::Dues);
        let view = app.dues.as_ref().unwrap();
        assert_eq!(view.subject_id, "1");
        assert_eq!(view.summary.dues_collected, 200.0);
        assert_eq!(calls.borrow().last().unwrap().member_id.as_deref(), Some("1"));

        press(&mut app, KeyCode::Char('h'), now);
        let view = app.dues.as_ref().unwrap();
        assert_eq!(view.subject_id, "F1");
        assert_eq!(view.household_size, 2);
        assert_eq!(view.summary.dues_collected, 300.0);
        assert_eq!(view.summary.annual_pledge, 2400.0);
    }

    #[test]
    fn test_quit_key() {
        let (mut app, _) = app();
        assert!(!press(&mut app, KeyCode::Char('q'), Instant::now()));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("ሰላም ለዓለም", 6), "ሰላም...");
        assert_eq!(truncate("short", 10), "short");
    }
}
