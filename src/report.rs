//! Plain-text rendering of a [`NewsAnalysis`].
//!
//! Section order and headings are fixed. Nothing here counts anything the
//! aggregator has not already counted.

use std::fmt::Write;

use news_types::{Category, ProvinceLedgerEntry};

use crate::aggregate::{Extremes, KingdomSection, NewsAnalysis, Side, SideTotals, Swing};
use crate::kingdom::HomeSource;

const NAME_WIDTH: usize = 32;

/// "1234567" → "1,234,567"
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Signed acreage: "+1,200", "-55", "0".
pub fn signed_thousands(n: i64) -> String {
    let magnitude = thousands(n.unsigned_abs());
    match n.signum() {
        1 => format!("+{magnitude}"),
        -1 => format!("-{magnitude}"),
        _ => magnitude,
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

pub fn render_report(a: &NewsAnalysis) -> String {
    let mut out = String::new();
    render_header(&mut out, a);
    render_summary(&mut out, a);
    for section in &a.kingdoms {
        render_ledger(&mut out, section);
    }
    render_uniques(&mut out, a);
    render_highlights(&mut out, a);
    render_relations(&mut out, a);
    render_dragons(&mut out, a);
    out
}

// ── Header ───────────────────────────────────────────────────────────────

fn render_header(out: &mut String, a: &NewsAnalysis) {
    let title = "Kingdom News Report";
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.len()));

    let source = match a.home_source {
        HomeSource::Explicit => "given",
        HomeSource::OurKingdomPhrase => "from news",
        HomeSource::MostDefended => "most attacked",
        HomeSource::Fallback => "default",
    };
    let enemy = a.enemy.as_ref().map_or_else(|| "none".to_string(), |k| k.to_string());
    let _ = writeln!(out, "Home: {} ({source})    Enemy: {enemy}", a.home);

    match (&a.first_date, &a.last_date) {
        (Some(first), Some(last)) => {
            let _ = writeln!(out, "Period: {first} to {last} ({} days)", a.elapsed_days);
        }
        _ => {
            let _ = writeln!(out, "Period: undated");
        }
    }
    let _ = writeln!(
        out,
        "Lines: {}    Events: {}    Unique window: {} days",
        thousands(a.line_count as u64),
        thousands(a.record_count as u64),
        a.window
    );
    out.push('\n');
}

// ── Summary ──────────────────────────────────────────────────────────────

fn render_side(out: &mut String, label: &str, totals: &SideTotals) {
    let _ = writeln!(
        out,
        "{label}: {} ({} acres gained by land transfer)",
        thousands(totals.count as u64),
        thousands(totals.overall_acres)
    );
    for tally in &totals.categories {
        let mut line = format!("  {:<20}{:>6}", tally.category.as_str(), thousands(tally.count as u64));
        if tally.acres > 0 {
            let _ = write!(line, "  {} acres", thousands(tally.acres));
        }
        if tally.books > 0 {
            let _ = write!(line, "  {} books", thousands(tally.books));
        }
        if tally.kills > 0 {
            let _ = write!(line, "  {} killed", thousands(tally.kills));
        }
        let _ = writeln!(out, "{line}");
    }
}

fn render_summary(out: &mut String, a: &NewsAnalysis) {
    heading(out, "Summary");
    render_side(out, "Attacks made", &a.made);
    render_side(out, "Attacks suffered", &a.suffered);
    let _ = writeln!(
        out,
        "Bounces: made {}, suffered {}",
        a.made.count_of(Category::FailedAttack),
        a.suffered.count_of(Category::FailedAttack)
    );
    let d = &a.dragon_counts;
    let _ = writeln!(
        out,
        "Dragons: sent {}, received {}, slain {}, flown away {}",
        d.sent, d.received, d.slain, d.flown_away
    );
    let _ = writeln!(
        out,
        "Rituals: started {}, completed {}",
        a.rituals.started, a.rituals.completed
    );
    if a.divergent > 0 {
        let _ = writeln!(out, "Events with mismatched type and category: {}", a.divergent);
    }
    out.push('\n');
}

// ── Ledgers ──────────────────────────────────────────────────────────────

fn ledger_row(e: &ProvinceLedgerEntry) -> String {
    format!(
        "  {:<width$}{:>10}{:>8}{:>8}",
        e.province,
        signed_thousands(e.acres),
        e.times_attacking,
        e.times_defending,
        width = NAME_WIDTH
    )
}

fn render_ledger(out: &mut String, section: &KingdomSection) {
    let role = if section.is_home { " (home)" } else { "" };
    heading(out, &format!("Kingdom {}{role}", section.kingdom));
    let _ = writeln!(out, "Interactions: {}", thousands(section.interactions as u64));
    if section.ledger.is_empty() {
        let _ = writeln!(out, "  (no provinces)");
    } else {
        let _ = writeln!(
            out,
            "  {:<width$}{:>10}{:>8}{:>8}",
            "Province",
            "Acres",
            "Hits",
            "Hit by",
            width = NAME_WIDTH
        );
        for entry in &section.ledger {
            let _ = writeln!(out, "{}", ledger_row(entry));
        }
        let net: i64 = section.ledger.iter().map(|e| e.acres).sum();
        let _ = writeln!(out, "  {:<width$}{:>10}", "Net", signed_thousands(net), width = NAME_WIDTH);
    }
    out.push('\n');
}

// ── Uniques ──────────────────────────────────────────────────────────────

fn render_uniques(out: &mut String, a: &NewsAnalysis) {
    heading(out, &format!("Unique Attacks ({} day window)", a.window));
    for section in &a.kingdoms {
        let _ = writeln!(
            out,
            "  {:<10}made {:>5}    suffered {:>5}",
            section.kingdom.to_string(),
            section.uniques_made,
            section.uniques_suffered
        );
    }
    out.push('\n');
}

// ── Highlights ───────────────────────────────────────────────────────────

fn swing_line(label: &str, category: Category, s: &Swing) -> String {
    let date = if s.date.is_empty() { "undated" } else { s.date.as_str() };
    format!(
        "  {label} {category}: {} acres, {} -> {} ({date})",
        thousands(s.acres as u64),
        s.attacker,
        s.defender
    )
}

fn render_extremes(out: &mut String, side: Side, extremes: &[Extremes]) {
    let label = match side {
        Side::Made => "Made",
        Side::Suffered => "Suffered",
    };
    let rows: Vec<&Extremes> = extremes.iter().filter(|e| e.side == side).collect();
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "{label}:");
    for e in rows {
        let _ = writeln!(out, "{}", swing_line("Largest", e.category, &e.largest));
        let _ = writeln!(out, "{}", swing_line("Smallest", e.category, &e.smallest));
    }
}

fn render_highlights(out: &mut String, a: &NewsAnalysis) {
    heading(out, "Highlights");
    let h = &a.highlights;
    if h.extremes.is_empty() && h.most_bounced.is_empty() {
        let _ = writeln!(out, "  (nothing notable)");
    }
    render_extremes(out, Side::Made, &h.extremes);
    render_extremes(out, Side::Suffered, &h.extremes);
    if !h.most_bounced.is_empty() {
        let _ = writeln!(out, "Most bounced:");
        for b in &h.most_bounced {
            let kingdom = b.kingdom.as_ref().map(|k| format!(" {}", k.parenthesized())).unwrap_or_default();
            let _ = writeln!(out, "  {}{kingdom}: {}", b.province, b.bounces);
        }
    }
    out.push('\n');
}

// ── News sections ────────────────────────────────────────────────────────

fn render_relations(out: &mut String, a: &NewsAnalysis) {
    heading(out, "Relations News");
    if a.relations.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in &a.relations {
        let _ = writeln!(out, "  {}: {}", item.date, item.text);
    }
    out.push('\n');
}

fn render_dragons(out: &mut String, a: &NewsAnalysis) {
    heading(out, "Dragon News");
    if a.dragons.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for event in &a.dragons {
        let _ = writeln!(out, "  {}: [{}] {}", event.item.date, event.kind.as_str(), event.item.text);
    }
}
