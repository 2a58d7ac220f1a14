//! Profile table pane: one row per type, largest total first

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::engine::profile::ProfileView;
use crate::report::format_bytes;
use crate::runtime::heap::ObjectHeap;
use crate::ui::theme::DEFAULT_THEME;

pub fn render_profile_pane(
    frame: &mut Frame,
    area: Rect,
    heap: &ObjectHeap,
    view: &ProfileView,
    focused: bool,
    scroll: usize,
) {
    let border_color = if focused {
        DEFAULT_THEME.border_focused
    } else {
        DEFAULT_THEME.border_normal
    };
    let block = Block::default()
        .title(format!(
            " Profiles ({} types, {} total) ",
            view.rows.len(),
            format_bytes(view.grand_total)
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let header = Row::new(vec![
        Cell::from("total"),
        Cell::from("count"),
        Cell::from("largest"),
        Cell::from("type"),
    ])
    .style(Style::default().fg(DEFAULT_THEME.primary));

    let mut rows: Vec<Row> = view
        .rows
        .iter()
        .skip(scroll)
        .map(|row| {
            Row::new(vec![
                Cell::from(format_bytes(row.total))
                    .style(Style::default().fg(DEFAULT_THEME.number)),
                Cell::from(row.count.to_string()).style(Style::default().fg(DEFAULT_THEME.fg)),
                Cell::from(format_bytes(row.high))
                    .style(Style::default().fg(DEFAULT_THEME.number)),
                Cell::from(row.key.label(heap))
                    .style(Style::default().fg(DEFAULT_THEME.type_name)),
            ])
        })
        .collect();

    if let Some(below) = view.collapsed {
        rows.push(
            Row::new(vec![
                Cell::from(format_bytes(below.total)),
                Cell::from(below.count.to_string()),
                Cell::from(""),
                Cell::from(format!("({} types below cutoff)", below.types)),
            ])
            .style(Style::default().fg(DEFAULT_THEME.comment)),
        );
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block);

    frame.render_widget(table, area);
}
