use std::io::{stdout, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde_json::json;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::catalog::{Catalog, MealRecord};
use crate::config::{CommandExec, Config, SearchMode, UiColors};
use crate::search;

use super::draw;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Results,
}

/// The three mutually exclusive states of the results area. Exactly one
/// renders for any controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsView {
    Loading,
    Cards,
    Empty,
}

impl ResultsView {
    pub fn current(loading: bool, has_results: bool) -> Self {
        if loading {
            ResultsView::Loading
        } else if has_results {
            ResultsView::Cards
        } else {
            ResultsView::Empty
        }
    }
}

/// Order confirmation modal for the selected meal.
#[derive(Debug, Clone)]
pub struct OrderModal {
    pub meal_index: usize,
}

/// Help modal state with scroll support
#[derive(Debug, Clone)]
pub struct HelpModal {
    /// Current scroll offset (line index at top of viewport)
    pub scroll: usize,
    /// Total number of content lines
    pub total_lines: usize,
    /// Viewport height (set during rendering)
    pub viewport_height: usize,
}

impl HelpModal {
    pub fn new() -> Self {
        Self {
            scroll: 0,
            total_lines: 0,
            viewport_height: 0,
        }
    }

    pub fn can_scroll_up(&self) -> bool {
        self.scroll > 0
    }

    pub fn can_scroll_down(&self) -> bool {
        self.scroll + self.viewport_height < self.total_lines
    }

    pub fn scroll_down(&mut self) {
        if self.can_scroll_down() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        if self.can_scroll_up() {
            self.scroll -= 1;
        }
    }
}

impl Default for HelpModal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct HelpSection {
    pub title: &'static str,
    pub entries: Vec<HelpEntry>,
}

pub struct HelpEntry {
    pub action: &'static str,
    pub keys: String,
}

pub struct App<'a> {
    catalog: &'a Catalog,
    config: &'a Config,
    catalog_label: String,
    pub search_input: Input,
    pub focus: Focus,
    /// Indices into the catalog, in catalog order.
    pub results: Vec<usize>,
    /// Position within `results`.
    pub selected: usize,
    pub loading: bool,
    /// Deferred mode: whether a search has been submitted yet. Controls
    /// the empty-state wording.
    pub searched: bool,
    pub status: Option<String>,
    pub order_modal: Option<OrderModal>,
    pub help_modal: Option<HelpModal>,
    // Flag to run the filter from the event loop after a loading frame
    pending_filter: bool,
}

impl<'a> App<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a Config, catalog_label: String) -> Self {
        // Immediate mode starts with the whole catalog visible; deferred
        // starts in the "no search performed" state.
        let results = match config.search.mode {
            SearchMode::Immediate => search::filter_indices(catalog, ""),
            SearchMode::Deferred => Vec::new(),
        };

        Self {
            catalog,
            config,
            catalog_label,
            search_input: Input::default(),
            focus: Focus::Search,
            results,
            selected: 0,
            loading: false,
            searched: false,
            status: None,
            order_modal: None,
            help_modal: None,
            pending_filter: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            // Handle pending filter: the loading frame was just drawn, now
            // run the (synchronous) filter and redraw with results.
            if self.pending_filter {
                self.pending_filter = false;
                self.apply_pending_filter();
                continue;
            }

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        // If help modal is open, handle its keys first
        if self.help_modal.is_some() {
            self.handle_help_modal_key(key);
            return Ok(false);
        }

        if self.order_modal.is_some() {
            self.handle_order_modal_key(key)?;
            return Ok(false);
        }

        match self.focus {
            Focus::Search => self.handle_search_key(key),
            Focus::Results => self.handle_results_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<bool> {
        let input_keys = &self.config.keys.search_input;

        // Cancel: move focus to the result list
        if self.key_matches_any(&key, &input_keys.cancel) {
            self.focus = Focus::Results;
            return Ok(false);
        }

        // Confirm: deferred mode submits the search; immediate mode just
        // moves focus, since results already track the query.
        if self.key_matches_any(&key, &input_keys.confirm) {
            match self.config.search.mode {
                SearchMode::Deferred => self.submit_search(),
                SearchMode::Immediate => self.focus = Focus::Results,
            }
            return Ok(false);
        }

        // Next/prev: navigate results while typing
        if self.key_matches_any(&key, &input_keys.next) {
            self.move_selection(1);
            return Ok(false);
        }
        if self.key_matches_any(&key, &input_keys.prev) {
            self.move_selection(-1);
            return Ok(false);
        }

        // Pass other keys to the input widget
        if let Some(change) = self.search_input.handle_event(&Event::Key(key)) {
            if change.value {
                self.status = None;
                if self.config.search.mode == SearchMode::Immediate {
                    self.refresh_results();
                }
            }
        }
        Ok(false)
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> Result<bool> {
        let results_keys = &self.config.keys.results;
        let global_keys = &self.config.keys.global;

        if self.key_matches_any(&key, &global_keys.quit) {
            return Ok(true);
        }

        if self.key_matches_any(&key, &global_keys.search) {
            self.focus = Focus::Search;
            return Ok(false);
        }

        if self.key_matches_any(&key, &global_keys.help) {
            self.help_modal = Some(HelpModal::new());
            return Ok(false);
        }

        if self.key_matches_any(&key, &results_keys.cancel) {
            self.focus = Focus::Search;
            return Ok(false);
        }

        if self.key_matches_any(&key, &results_keys.order) {
            if self.selected_meal().is_some() {
                self.order_modal = Some(OrderModal {
                    meal_index: self.results[self.selected],
                });
            }
            return Ok(false);
        }

        if self.key_matches_any(&key, &results_keys.next) {
            self.move_selection(1);
            return Ok(false);
        }
        if self.key_matches_any(&key, &results_keys.prev) {
            self.move_selection(-1);
            return Ok(false);
        }
        if self.key_matches_any(&key, &results_keys.page_down) {
            self.move_selection(5);
            return Ok(false);
        }
        if self.key_matches_any(&key, &results_keys.page_up) {
            self.move_selection(-5);
            return Ok(false);
        }
        if self.key_matches_any(&key, &results_keys.top) {
            self.selected = 0;
            return Ok(false);
        }
        if self.key_matches_any(&key, &results_keys.bottom) {
            if !self.results.is_empty() {
                self.selected = self.results.len() - 1;
            }
            return Ok(false);
        }

        Ok(false)
    }

    fn handle_order_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(modal) = self.order_modal.take() else {
            return Ok(());
        };

        let modal_keys = &self.config.keys.modal;

        if self.key_matches_any(&key, &modal_keys.cancel) {
            return Ok(());
        }

        if self.key_matches_any(&key, &modal_keys.confirm) {
            self.place_order(modal.meal_index)?;
            return Ok(());
        }

        // Put the modal back if key wasn't handled
        self.order_modal = Some(modal);
        Ok(())
    }

    fn handle_help_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.help_modal.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.help_modal = None;
            }
            KeyCode::Char('j') | KeyCode::Down => modal.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => modal.scroll_up(),
            _ => {}
        }
    }

    /// Deferred-mode submit. Empty or whitespace-only queries are a no-op:
    /// previous results and state persist. Otherwise a loading frame is
    /// shown and the filter runs from the event loop.
    pub fn submit_search(&mut self) {
        if search::normalize_query(self.search_input.value()).is_none() {
            return;
        }
        self.loading = true;
        self.pending_filter = true;
    }

    pub fn apply_pending_filter(&mut self) {
        self.refresh_results();
        self.loading = false;
        self.searched = true;
    }

    /// Recompute results for the current query, keeping the selection on
    /// the same meal when it survives the filter.
    pub fn refresh_results(&mut self) {
        let previous_id = self
            .selected_meal()
            .map(|meal| meal.id.clone());

        self.results = search::filter_indices(self.catalog, self.search_input.value());

        if let Some(id) = previous_id {
            if let Some(position) = self.results.iter().position(|&index| {
                self.catalog
                    .get(index)
                    .map(|meal| meal.id == id)
                    .unwrap_or(false)
            }) {
                self.selected = position;
                return;
            }
        }

        if self.results.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.results.len() {
            self.selected = self.results.len() - 1;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.results.is_empty() {
            return;
        }
        let len = self.results.len() as isize;
        let mut index = self.selected as isize + delta;
        if index < 0 {
            index = 0;
        } else if index >= len {
            index = len - 1;
        }
        self.selected = index as usize;
    }

    /// Emit an order request for a meal. The core does not interpret the
    /// request: it is piped to the configured order command, or recorded in
    /// the status line when no handler is wired.
    fn place_order(&mut self, meal_index: usize) -> Result<()> {
        let Some(meal) = self.catalog.get(meal_index) else {
            return Ok(());
        };

        let name = meal.name.clone();
        match &self.config.commands.order {
            Some(command) => {
                let payload = json!({
                    "id": meal.id,
                    "name": meal.name,
                    "price": meal.price,
                })
                .to_string();
                let command = command.clone();
                self.run_order_command(&command, &payload)?;
                self.set_status(format!("Order sent for {}", name));
            }
            None => {
                self.set_status(format!(
                    "Order recorded for {} (no order command configured)",
                    name
                ));
            }
        }
        Ok(())
    }

    fn run_order_command(&self, command: &CommandExec, payload: &str) -> Result<()> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", command.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload.as_bytes())?;
            stdin.write_all(b"\n")?;
        }

        let status = child.wait()?;
        if !status.success() {
            bail!("`{}` exited with {}", command.program, status);
        }

        Ok(())
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    // =========================================================================
    // Accessors for rendering
    // =========================================================================

    pub fn results_view(&self) -> ResultsView {
        ResultsView::current(self.loading, !self.results.is_empty())
    }

    pub fn empty_message(&self) -> &'static str {
        if self.config.search.mode == SearchMode::Deferred && !self.searched {
            "Type a query and press Enter to search."
        } else {
            "No meals found matching your search."
        }
    }

    pub fn result_meal(&self, position: usize) -> Option<&MealRecord> {
        self.results
            .get(position)
            .and_then(|&index| self.catalog.get(index))
    }

    pub fn selected_meal(&self) -> Option<&MealRecord> {
        self.result_meal(self.selected)
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub fn catalog_label(&self) -> &str {
        &self.catalog_label
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    pub fn search_mode(&self) -> SearchMode {
        self.config.search.mode
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    // =========================================================================
    // Help modal
    // =========================================================================

    /// Generate help content from current keybindings configuration
    pub fn help_entries(&self) -> Vec<HelpSection> {
        let keys = &self.config.keys;

        vec![
            HelpSection {
                title: "Global",
                entries: vec![
                    HelpEntry {
                        action: "Quit",
                        keys: keys.global.quit.join(", "),
                    },
                    HelpEntry {
                        action: "Search",
                        keys: keys.global.search.join(", "),
                    },
                    HelpEntry {
                        action: "Help",
                        keys: keys.global.help.join(", "),
                    },
                ],
            },
            HelpSection {
                title: "Search Input",
                entries: vec![
                    HelpEntry {
                        action: "Focus results",
                        keys: keys.search_input.cancel.join(", "),
                    },
                    HelpEntry {
                        action: "Submit",
                        keys: keys.search_input.confirm.join(", "),
                    },
                    HelpEntry {
                        action: "Next result",
                        keys: keys.search_input.next.join(", "),
                    },
                    HelpEntry {
                        action: "Previous result",
                        keys: keys.search_input.prev.join(", "),
                    },
                ],
            },
            HelpSection {
                title: "Results",
                entries: vec![
                    HelpEntry {
                        action: "Back to search",
                        keys: keys.results.cancel.join(", "),
                    },
                    HelpEntry {
                        action: "Order",
                        keys: keys.results.order.join(", "),
                    },
                    HelpEntry {
                        action: "Next",
                        keys: keys.results.next.join(", "),
                    },
                    HelpEntry {
                        action: "Previous",
                        keys: keys.results.prev.join(", "),
                    },
                    HelpEntry {
                        action: "Page down",
                        keys: keys.results.page_down.join(", "),
                    },
                    HelpEntry {
                        action: "Page up",
                        keys: keys.results.page_up.join(", "),
                    },
                    HelpEntry {
                        action: "First card",
                        keys: keys.results.top.join(", "),
                    },
                    HelpEntry {
                        action: "Last card",
                        keys: keys.results.bottom.join(", "),
                    },
                ],
            },
        ]
    }

    // =========================================================================
    // Key matching
    // =========================================================================

    fn key_matches_any(&self, event: &KeyEvent, bindings: &[String]) -> bool {
        bindings.iter().any(|b| key_matches_single(event, b))
    }
}

/// Check if the key event matches a single binding string
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        // Special keys
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        // Arrow keys
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        // Page navigation
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        // Function keys
        "f1" => matches!(event.code, KeyCode::F(1)),
        "f2" => matches!(event.code, KeyCode::F(2)),
        "f3" => matches!(event.code, KeyCode::F(3)),
        "f4" => matches!(event.code, KeyCode::F(4)),
        "f5" => matches!(event.code, KeyCode::F(5)),
        "f6" => matches!(event.code, KeyCode::F(6)),
        "f7" => matches!(event.code, KeyCode::F(7)),
        "f8" => matches!(event.code, KeyCode::F(8)),
        "f9" => matches!(event.code, KeyCode::F(9)),
        "f10" => matches!(event.code, KeyCode::F(10)),
        "f11" => matches!(event.code, KeyCode::F(11)),
        "f12" => matches!(event.code, KeyCode::F(12)),
        // Single character - case-sensitive (g != G, since G requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}
