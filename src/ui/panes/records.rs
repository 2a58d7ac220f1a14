//! Size-record tree pane

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::engine::sizer::SizeRecord;
use crate::report::format_bytes;
use crate::ui::theme::DEFAULT_THEME;

pub fn render_records_pane(
    frame: &mut Frame,
    area: Rect,
    records: &[SizeRecord],
    focused: bool,
    scroll: usize,
) {
    let border_color = if focused {
        DEFAULT_THEME.border_focused
    } else {
        DEFAULT_THEME.border_normal
    };
    let block = Block::default()
        .title(format!(" Breakdown ({} roots) ", records.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let mut lines = Vec::new();
    for record in records {
        flatten(record, 0, &mut lines);
    }
    let visible: Vec<Line> = lines.into_iter().skip(scroll).collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);
}

fn flatten(record: &SizeRecord, depth: usize, out: &mut Vec<Line<'static>>) {
    out.push(Line::from(vec![
        Span::raw(" ".repeat(depth * 2)),
        Span::styled(
            record.name.clone(),
            Style::default().fg(DEFAULT_THEME.fg),
        ),
        Span::styled(
            format!("  {}", format_bytes(record.size)),
            Style::default().fg(DEFAULT_THEME.number),
        ),
        Span::styled(
            format!("  (flat {})", format_bytes(record.flat)),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
    ]));
    for child in &record.refs {
        flatten(child, depth + 1, out);
    }
}
