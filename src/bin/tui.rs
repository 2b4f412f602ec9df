use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_api::{client::ApiClient, domain::todo::{Priority, Todo, UpdateTodo}};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://127.0.0.1:3001".to_string());
    let client = ApiClient::new(base_url);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Filter { All, Active, Completed }

impl Filter {
    fn label(self) -> &'static str { match self { Filter::All => "All", Filter::Active => "Active", Filter::Completed => "Completed" } }
    fn next(self) -> Self { match self { Filter::All => Filter::Active, Filter::Active => Filter::Completed, Filter::Completed => Filter::All } }
}

struct App {
    client: ApiClient,
    items: Vec<Todo>,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    filter: Filter,
    filtered_indices: Vec<usize>,
    draft: String,
    draft_priority: Priority,
    status: String,
    last_error: Option<String>,
}

impl App {
    async fn load(&mut self) {
        match self.client.list().await {
            Ok(listing) => { self.items = listing.items; self.last_error = None; }
            Err(e) => self.last_error = Some(format!("load failed: {e}")),
        }
        self.recompute_filtered();
    }

    async fn refresh_status(&mut self) {
        self.status = match (self.client.health().await, self.client.metrics().await) {
            (Ok(h), Ok(m)) => format!(
                "{} [{}] up {}s, rss {} KiB, checked {}",
                h.service, h.environment, m.uptime_seconds, m.memory_usage.rss_bytes / 1024, h.timestamp.format("%H:%M:%S")
            ),
            (Err(e), _) | (_, Err(e)) => format!("backend unreachable at {}: {e}", self.client.base_url()),
        };
    }

    fn recompute_filtered(&mut self) {
        self.filtered_indices.clear();
        for (i, t) in self.items.iter().enumerate() {
            let include = match self.filter {
                Filter::All => true,
                Filter::Active => !t.completed,
                Filter::Completed => t.completed,
            };
            if include { self.filtered_indices.push(i); }
        }
        // Clamp selection within filtered bounds
        let len = self.filtered_indices.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn current(&self) -> Option<&Todo> {
        self.filtered_indices.get(self.selected).and_then(|&idx| self.items.get(idx))
    }

    async fn apply(&mut self, patch: UpdateTodo) {
        let Some(id) = self.current().map(|t| t.id.clone()) else { return };
        if let Err(e) = self.client.update(&id, &patch).await {
            self.last_error = Some(format!("update failed: {e}"));
            return;
        }
        self.load().await;
    }
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, client: ApiClient) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App {
        client,
        items: vec![],
        selected: 0,
        last_tick: Instant::now(),
        mode: Mode::View,
        list_state: ListState::default(),
        filter: Filter::All,
        filtered_indices: Vec::new(),
        draft: String::new(),
        draft_priority: Priority::Medium,
        status: String::new(),
        last_error: None,
    };
    app.load().await;
    app.refresh_status().await;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Enter: toggle, n: new, e: edit, p: priority, d: delete, f: filter, r: refresh, q: quit  |  New/Edit: Tab cycles priority, Enter saves, Esc cancels")
                .block(Block::default().borders(Borders::ALL).title(app.status.as_str()));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.filtered_indices.iter().filter_map(|&idx| app.items.get(idx)).map(|t| {
                let mark = if t.completed { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} {:<6} {}", mark, t.priority.as_str(), t.text))
            }).collect();
            // Keep list_state selection in sync with current index
            if app.filtered_indices.is_empty() { app.list_state.select(None); } else { app.list_state.select(Some(app.selected)); }
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("todos [{}] {}/{}", app.filter.label(), app.filtered_indices.len(), app.items.len())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = match app.current() {
                Some(t) => format!(
                    "Text:\n{}\n\nCompleted: {}\nPriority: {}\n\nCreated: {}\nUpdated: {}\nId: {}",
                    t.text, if t.completed { "yes" } else { "no" }, t.priority.as_str(),
                    t.created_at.format("%Y-%m-%d %H:%M:%S"), t.updated_at.format("%Y-%m-%d %H:%M:%S"), t.id
                ),
                None => String::new(),
            };
            let details = Paragraph::new(detail)
                .block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);

            let footer_text = match app.mode {
                Mode::View => app.last_error.clone().unwrap_or_else(|| format!("API_URL={}", app.client.base_url())),
                Mode::Create => format!("New [{}]: {}_", app.draft_priority.as_str(), app.draft),
                Mode::Edit => format!("Edit: {}_", app.draft),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Edit => "edit" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.selected > 0 { app.selected -= 1; } }
                        KeyCode::Down => { let len = app.filtered_indices.len(); if app.selected + 1 < len { app.selected += 1; } }
                        KeyCode::Enter => {
                            if let Some(completed) = app.current().map(|t| !t.completed) {
                                app.apply(UpdateTodo { completed: Some(completed), ..Default::default() }).await;
                            }
                        }
                        KeyCode::Char('p') => {
                            if let Some(priority) = app.current().map(|t| t.priority.cycle()) {
                                app.apply(UpdateTodo { priority: Some(priority), ..Default::default() }).await;
                            }
                        }
                        KeyCode::Char('n') => {
                            app.mode = Mode::Create;
                            app.draft.clear();
                            app.draft_priority = Priority::Medium;
                        }
                        KeyCode::Char('e') => {
                            if let Some(text) = app.current().map(|t| t.text.clone()) {
                                app.mode = Mode::Edit;
                                app.draft = text;
                            }
                        }
                        KeyCode::Char('d') => {
                            if let Some(id) = app.current().map(|t| t.id.clone()) {
                                if let Err(e) = app.client.delete(&id).await {
                                    app.last_error = Some(format!("delete failed: {e}"));
                                } else {
                                    if app.selected > 0 { app.selected -= 1; }
                                    app.load().await;
                                }
                            }
                        }
                        KeyCode::Char('f') => {
                            app.filter = app.filter.next();
                            app.recompute_filtered();
                        }
                        KeyCode::Char('r') => {
                            app.load().await;
                            app.refresh_status().await;
                        }
                        _ => {}
                    },
                    Mode::Create | Mode::Edit => match key.code {
                        KeyCode::Esc => { app.mode = Mode::View; app.draft.clear(); }
                        KeyCode::Enter => {
                            let text = app.draft.trim().to_string();
                            let mode = app.mode;
                            app.mode = Mode::View;
                            app.draft.clear();
                            if text.is_empty() { continue; }
                            if mode == Mode::Create {
                                match app.client.create(&text, Some(app.draft_priority)).await {
                                    Ok(_) => app.load().await,
                                    Err(e) => app.last_error = Some(format!("create failed: {e}")),
                                }
                            } else {
                                app.apply(UpdateTodo { text: Some(text), ..Default::default() }).await;
                            }
                        }
                        KeyCode::Tab => { if app.mode == Mode::Create { app.draft_priority = app.draft_priority.cycle(); } }
                        KeyCode::Backspace => { app.draft.pop(); }
                        KeyCode::Char(c) => app.draft.push(c),
                        _ => {}
                    },
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
