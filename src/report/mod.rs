//! Plain-text reporting
//!
//! Pure string formatting over the engine's output: a one-call summary, the
//! ranked profile table, the registered-descriptor dump and a size-record
//! tree renderer.  Nothing here performs I/O; callers print the returned
//! strings wherever they like, and the TUI renders from the same data
//! instead of these.

use std::fmt::Write as _;

use crate::engine::profile::ProfileView;
use crate::engine::registry::Registry;
use crate::engine::sizer::{SizeRecord, Sizer, SizerStats};
use crate::runtime::heap::ObjectHeap;

/// Bytes with a binary-SI suffix, e.g. `1.50 KiB`.  Values below one KiB
/// print as a plain byte count.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// One-call summary: total, configuration in effect, and the session
/// counters.
pub fn summary(sizer: &Sizer) -> String {
    let stats = sizer.stats();
    let config = sizer.config();
    let widths = sizer.registry().widths();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "total {} ({} bytes)",
        format_bytes(stats.total),
        stats.total
    );
    let _ = writeln!(
        out,
        "align {}, limit {}, pointer width {} bytes{}",
        config.align,
        config.limit,
        widths.pointer,
        if config.code { ", code included" } else { "" }
    );
    let _ = writeln!(
        out,
        "objects: {} given, {} sized, {} excluded, {} seen, {} duplicate, {} missed",
        stats.given, stats.sized, stats.excluded, stats.seen, stats.duplicate, stats.missed
    );
    let _ = write!(out, "deepest recursion {}", stats.max_depth);
    out
}

/// The ranked profile table, one row per type above the configured cutoff,
/// with the below-cutoff entries collapsed into a trailing line.
pub fn profile_table(heap: &ObjectHeap, sizer: &Sizer) -> String {
    let view = sizer.profiles().ranked(sizer.config().cutoff);
    render_profile_view(heap, &view)
}

/// Render an already-built profile view; the TUI shares this data shape.
pub fn render_profile_view(heap: &ObjectHeap, view: &ProfileView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>12} {:>8} {:>12}  type",
        "total", "count", "largest"
    );
    for row in &view.rows {
        let _ = writeln!(
            out,
            "{:>12} {:>8} {:>12}  {}",
            format_bytes(row.total),
            row.count,
            format_bytes(row.high),
            row.key.label(heap)
        );
    }
    if let Some(below) = view.collapsed {
        let _ = writeln!(
            out,
            "{:>12} {:>8} {:>12}  ({} types below cutoff)",
            format_bytes(below.total),
            below.count,
            "",
            below.types
        );
    }
    let _ = write!(out, "{:>12} {:>8}", format_bytes(view.grand_total), "");
    out
}

/// Dump of every registered descriptor, sorted by label.
pub fn typedefs(heap: &ObjectHeap, registry: &Registry) -> String {
    let mut lines: Vec<String> = registry
        .iter()
        .map(|(key, desc)| {
            format!(
                "{:<32} base {:>5}  item {:>3}  {:<8} {}",
                key.label(heap),
                desc.base_size,
                desc.item_size,
                desc.category.name(),
                if desc.both { "data+code" } else { "code only" }
            )
        })
        .collect();
    lines.sort();
    let mut out = format!("{} registered type descriptors\n", lines.len());
    out.push_str(&lines.join("\n"));
    out
}

/// Indented rendering of a size-record tree.
pub fn record_tree(record: &SizeRecord) -> String {
    let mut out = String::new();
    render_record(record, 0, &mut out);
    out
}

fn render_record(record: &SizeRecord, depth: usize, out: &mut String) {
    let _ = writeln!(
        out,
        "{:indent$}{} size {} flat {}",
        "",
        record.name,
        format_bytes(record.size),
        format_bytes(record.flat),
        indent = depth * 2
    );
    for child in &record.refs {
        render_record(child, depth + 1, out);
    }
}

/// Short headline for status lines: total plus the counters that matter.
pub fn headline(stats: &SizerStats) -> String {
    format!(
        "{} | {} sized, {} missed",
        format_bytes(stats.total),
        stats.sized,
        stats.missed
    )
}
