//! Summary pane: last call's counters and the tracker history

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::engine::sizer::SizerStats;
use crate::report::format_bytes;
use crate::track::Tracker;
use crate::ui::theme::DEFAULT_THEME;

pub fn render_summary_pane(
    frame: &mut Frame,
    area: Rect,
    stats: &SizerStats,
    tracker: &Tracker,
    focused: bool,
) {
    let border_color = if focused {
        DEFAULT_THEME.border_focused
    } else {
        DEFAULT_THEME.border_normal
    };
    let block = Block::default()
        .title(" Summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let label = Style::default().fg(DEFAULT_THEME.comment);
    let value = Style::default().fg(DEFAULT_THEME.fg);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("total      ", label),
            Span::styled(
                format!("{} ({} bytes)", format_bytes(stats.total), stats.total),
                Style::default().fg(DEFAULT_THEME.number),
            ),
        ]),
        Line::from(vec![
            Span::styled("objects    ", label),
            Span::styled(
                format!(
                    "{} given, {} sized, {} excluded, {} seen",
                    stats.given, stats.sized, stats.excluded, stats.seen
                ),
                value,
            ),
        ]),
        Line::from(vec![
            Span::styled("traversal  ", label),
            Span::styled(
                format!(
                    "depth {}, {} duplicate, {} missed",
                    stats.max_depth, stats.duplicate, stats.missed
                ),
                if stats.missed > 0 {
                    Style::default().fg(DEFAULT_THEME.error)
                } else {
                    value
                },
            ),
        ]),
        Line::from(vec![
            Span::styled("history    ", label),
            Span::styled(
                format!(
                    "{} snapshots, {} / {}",
                    tracker.len(),
                    format_bytes(tracker.memory_usage()),
                    format_bytes(tracker.memory_limit())
                ),
                value,
            ),
        ]),
    ];

    for root in tracker.roots() {
        let series = tracker.series(&root.name);
        let last = series.last().copied().unwrap_or(0);
        let delta = tracker.delta(&root.name).unwrap_or(0);
        let delta_style = if delta > 0 {
            Style::default().fg(DEFAULT_THEME.error)
        } else if delta < 0 {
            Style::default().fg(DEFAULT_THEME.success)
        } else {
            label
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", root.name), value),
            Span::styled(
                format!("{:>12}", format_bytes(last)),
                Style::default().fg(DEFAULT_THEME.number),
            ),
            Span::styled(format!("  {:+}", delta), delta_style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
