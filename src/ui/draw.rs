use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::{Frame, Terminal};

use crate::config::{RgbColor, SearchMode};
use crate::rating;

use super::app::{App, Focus, ResultsView};

const SEARCH_HELP_IMMEDIATE: &str = "Type to filter  Esc: focus results  Enter: focus results";
const SEARCH_HELP_DEFERRED: &str = "Type a query  Enter: search  Esc: focus results";
const RESULTS_HELP: &str = "j/k: nav  Enter/o: order  /: search  ?: help  q: quit";
const ORDER_MODAL_HELP: &str = "Enter/y: confirm  Esc/n: cancel";
const HELP_MODAL_FOOTER: &str = "j/k: scroll  Esc/q: close";

/// Height of one result card including its borders.
const CARD_HEIGHT: u16 = 6;

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_order_modal(frame, size, app);
    draw_help_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let header_style = header_text_style(app);

    let spans = vec![
        Span::styled(" MENUDEX ", header_style.add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" CATALOG://{} ", app.catalog_label()),
            header_style,
        ),
        Span::raw(format!(" {} meals ", app.catalog_len())),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    draw_search_bar(frame, layout[0], app);
    draw_results(frame, layout[1], app);
}

fn draw_search_bar(frame: &mut Frame<'_>, area: Rect, app: &App) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let active = app.focus == Focus::Search;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, active))
        .title(Span::styled(" SEARCH ", header_text_style(app)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let value = app.search_input.value();
    let value_style = if active {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    frame.render_widget(
        Paragraph::new(Span::styled(value.to_string(), value_style)),
        inner,
    );

    if active {
        let x = inner
            .x
            .saturating_add(app.search_input.visual_cursor() as u16)
            .min(inner.x + inner.width.saturating_sub(1));
        frame.set_cursor_position((x, inner.y));
    }
}

fn draw_results(frame: &mut Frame<'_>, area: Rect, app: &App) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    match app.results_view() {
        ResultsView::Loading => render_centered_line(frame, area, "LOADING..."),
        ResultsView::Empty => render_centered_line(frame, area, app.empty_message()),
        ResultsView::Cards => draw_cards(frame, area, app),
    }
}

fn draw_cards(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let per_screen = (area.height / CARD_HEIGHT).max(1) as usize;

    // Keep the selected card inside the window.
    let first = if app.selected >= per_screen {
        app.selected + 1 - per_screen
    } else {
        0
    };
    let last = (first + per_screen).min(app.result_count());

    for position in first..last {
        let Some(meal) = app.result_meal(position) else {
            continue;
        };
        let row = (position - first) as u16;
        // Clamp to the results area so a partially visible last card never
        // writes outside the frame buffer.
        let card_area = Rect::new(area.x, area.y + row * CARD_HEIGHT, area.width, CARD_HEIGHT)
            .intersection(area);
        if card_area.width == 0 || card_area.height == 0 {
            continue;
        }
        draw_card(frame, card_area, app, position, meal);
    }
}

fn draw_card(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &App,
    position: usize,
    meal: &crate::catalog::MealRecord,
) {
    let selected = position == app.selected;
    let colors = app.ui_colors();

    let title_style = if selected {
        selection_style(app).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, selected))
        .title(Span::styled(format!(" {} ", meal.name), title_style));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let rating_style = Style::default().fg(color(colors.rating));
    let badge_style = Style::default().fg(color(colors.badge));

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(rating::stars(meal.rate), rating_style),
        Span::raw("  "),
        Span::styled(
            meal.price_display(app.currency()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("[{}]", meal.country), badge_style),
    ]));
    lines.push(Line::from(Span::raw(meal.dsc.clone())));

    let order_style = if selected {
        selection_style(app)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    let img_span = Span::styled(
        format!("img: {}", meal.img),
        Style::default().add_modifier(Modifier::DIM),
    );
    let button = "[ ORDER NOW ]";
    // Right-align the order button on the image line when both fit; long
    // image references push it onto its own line instead of truncating it.
    let img_width = img_span.width();
    if inner.width as usize >= img_width + button.len() + 2 {
        let pad = inner.width as usize - img_width - button.len();
        lines.push(Line::from(vec![
            img_span,
            Span::raw(" ".repeat(pad)),
            Span::styled(button, order_style),
        ]));
    } else {
        lines.push(Line::from(img_span));
        lines.push(Line::from(Span::styled(button, order_style)));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let status_style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let text = match &app.status {
        Some(status) => status.clone(),
        None => match app.focus {
            Focus::Search => match app.search_mode() {
                SearchMode::Immediate => SEARCH_HELP_IMMEDIATE.to_string(),
                SearchMode::Deferred => SEARCH_HELP_DEFERRED.to_string(),
            },
            Focus::Results => {
                let mut hint = RESULTS_HELP.to_string();
                if app.result_count() > 0 {
                    hint = format!(
                        "{}/{}  {}",
                        app.selected + 1,
                        app.result_count(),
                        hint
                    );
                }
                hint
            }
        },
    };

    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {} ", text), status_style)),
        area,
    );
}

fn draw_order_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    if app.order_modal.is_none() {
        return;
    }

    // The modal always targets the current selection; it cannot change
    // while the modal is open.
    let Some(meal) = app.selected_meal() else {
        return;
    };

    let width = 44u16.min(area.width);
    let height = 5u16.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, true))
        .title(Span::styled(" ORDER ", header_text_style(app)))
        .title_bottom(
            Line::from(Span::styled(
                format!(" {} ", ORDER_MODAL_HELP),
                header_text_style(app),
            ))
            .alignment(Alignment::Center),
        );

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let text = format!(
        "Order {} for {}?",
        meal.name,
        meal.price_display(app.currency())
    );
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        inner,
    );
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if app.help_modal.is_none() {
        return;
    }

    // Modal size: 2/3 width, 80% height
    let width = area
        .width
        .saturating_mul(2)
        .saturating_div(3)
        .max(40)
        .min(area.width);
    let height = area
        .height
        .saturating_mul(4)
        .saturating_div(5)
        .max(10)
        .min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    // Get styles before any mutable borrows
    let header_style = header_text_style(app);
    let border_s = border_style(app, true);

    let sections = app.help_entries();
    let mut lines: Vec<Line> = Vec::new();

    let content_width = width.saturating_sub(4) as usize;
    let action_width = 20usize;

    for (section_idx, section) in sections.iter().enumerate() {
        let header_text = format!(" {} ", section.title);
        let padding_total = content_width.saturating_sub(header_text.len());
        let left_pad = padding_total / 2;
        let right_pad = padding_total - left_pad;
        let header_line = format!(
            "{}{}{}",
            LINE.horizontal.to_string().repeat(left_pad),
            header_text,
            LINE.horizontal.to_string().repeat(right_pad)
        );
        lines.push(Line::from(Span::styled(header_line, header_style)));

        for entry in &section.entries {
            let action = format!("{:<width$}", entry.action, width = action_width);
            lines.push(Line::from(vec![
                Span::styled(action, Style::default()),
                Span::styled(entry.keys.clone(), header_style),
            ]));
        }

        if section_idx < sections.len() - 1 {
            lines.push(Line::from(""));
        }
    }

    let total_lines = lines.len();
    let inner_height = height.saturating_sub(3) as usize; // borders (2) + footer line (1)

    let Some(modal) = app.help_modal.as_mut() else {
        return;
    };
    modal.total_lines = total_lines;
    modal.viewport_height = inner_height;

    let max_scroll = modal.total_lines.saturating_sub(modal.viewport_height);
    if modal.scroll > max_scroll {
        modal.scroll = max_scroll;
    }

    let scroll = modal.scroll;
    let viewport_height = modal.viewport_height;
    let can_scroll_up = modal.can_scroll_up();
    let can_scroll_down = modal.can_scroll_down();

    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(scroll)
        .take(viewport_height)
        .collect();

    let scroll_indicator = match (can_scroll_up, can_scroll_down) {
        (true, true) => "▲▼",
        (true, false) => "▲ ",
        (false, true) => " ▼",
        (false, false) => "  ",
    };

    let title = Line::from(vec![
        Span::styled(" HELP ", header_style),
        Span::styled(scroll_indicator, header_style),
    ]);

    let footer = Line::from(Span::styled(
        format!(" {} ", HELP_MODAL_FOOTER),
        header_style,
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_s)
        .title(title)
        .title_bottom(footer)
        .title_alignment(Alignment::Center);

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    frame.render_widget(Paragraph::new(visible_lines), inner);
}

fn render_centered_line(frame: &mut Frame<'_>, area: Rect, text: &str) {
    let row = area.y + area.height / 2;
    let line_area = Rect::new(area.x, row, area.width, 1);
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        line_area,
    );
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App, active: bool) -> Style {
    let colors = app.ui_colors();
    let style = Style::default().fg(color(colors.border));
    if active {
        style
    } else {
        style.add_modifier(Modifier::DIM)
    }
}

fn header_text_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.border))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
