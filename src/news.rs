//! Turning a pasted news page into an ordered record stream.
//!
//! Every non-empty line gets a calendar day (its own date prefix, or the
//! last one seen above it) and a tick; only then is it classified. Lines
//! that classify as nothing are dropped from `records` but stay in `lines`
//! and still occupy their slot within the day.

use news_types::AttackRecord;
use tracing::debug;

use crate::calendar::{GameDate, split_date_prefix};
use crate::classify::classify;
use crate::extract::extract;

// ── Lines ────────────────────────────────────────────────────────────────

/// One non-empty input line after date handling.
#[derive(Debug, Clone)]
pub struct LogLine {
    /// Position in the pasted text, counting non-empty lines only
    pub index: usize,
    pub raw: String,
    /// Date prefix as written on this line, empty when absent
    pub prefix: String,
    /// Line text without the date prefix
    pub text: String,
    /// Effective day: own prefix, else carried forward from above
    pub date: Option<GameDate>,
    pub day_tick: u32,
    pub tick: f64,
}

impl LogLine {
    /// "July 1 of YR3" or "undated".
    pub fn date_label(&self) -> String {
        self.date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "undated".to_string())
    }
}

/// Split, date, stably sort by day and assign ticks.
///
/// Within a day of `n` lines the k-th line (in pasted order) gets
/// `tick = day + k/n`, so ticks are strictly increasing and never reach
/// the next day.
pub fn read_lines(input: &str) -> Vec<LogLine> {
    let mut current: Option<GameDate> = None;
    let mut lines: Vec<LogLine> = input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(index, raw)| {
            let dated = split_date_prefix(raw);
            if dated.date.is_some() {
                current = dated.date;
            }
            LogLine {
                index,
                raw: raw.to_string(),
                prefix: dated.prefix.to_string(),
                text: dated.text.to_string(),
                date: current,
                day_tick: current.map(|d| d.tick()).unwrap_or(0),
                tick: 0.0,
            }
        })
        .collect();

    // Pages are pasted newest-first as often as oldest-first.
    lines.sort_by_key(|l| l.day_tick);

    let mut start = 0;
    while start < lines.len() {
        let day = lines[start].day_tick;
        let end = lines[start..]
            .iter()
            .position(|l| l.day_tick != day)
            .map_or(lines.len(), |p| start + p);
        let n = (end - start) as f64;
        for (k, line) in lines[start..end].iter_mut().enumerate() {
            line.tick = day as f64 + k as f64 / n;
        }
        start = end;
    }

    lines
}

// ── Records ──────────────────────────────────────────────────────────────

/// Classify and extract one line. `None` when the classifier drops it.
pub fn build_record(line: &LogLine) -> Option<AttackRecord> {
    let class = classify(&line.raw)?;
    let (found, pattern) = extract(&line.text);

    let record = AttackRecord {
        raw: line.raw.clone(),
        date: line.prefix.clone(),
        attacker_province: found.attacker_province,
        attacker_kingdom: found.attacker_kingdom,
        defender_province: found.defender_province,
        defender_kingdom: found.defender_kingdom,
        outcome: class.outcome,
        category: class.category,
        acres: found.acres,
        books: found.books,
        kills: found.kills,
        tick: line.tick,
    };

    if !record.type_agrees_with_category() {
        debug!(
            line = line.index,
            category = record.category.as_str(),
            outcome = record.outcome.as_str(),
            "type and category disagree"
        );
    }
    debug!(
        line = line.index,
        rule = class.rule,
        ?pattern,
        category = record.category.as_str(),
        "record"
    );
    Some(record)
}

/// Everything derived from one paste.
#[derive(Debug, Clone)]
pub struct NewsLog {
    /// All non-empty lines in tick order, classified or not
    pub lines: Vec<LogLine>,
    /// Classified lines in tick order
    pub records: Vec<AttackRecord>,
}

pub fn parse_news(input: &str) -> NewsLog {
    let lines = read_lines(input);
    let records: Vec<AttackRecord> = lines.iter().filter_map(build_record).collect();
    debug!(
        lines = lines.len(),
        records = records.len(),
        dropped = lines.len() - records.len(),
        "parsed news"
    );
    NewsLog { lines, records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news_types::{Category, KingdomKey, Outcome};

    // ── line ordering ────────────────────────────────────────────────

    #[test]
    fn test_read_lines_skips_blank_and_handles_crlf() {
        let lines = read_lines("July 1 of YR3\tA\r\n\r\n   \r\nJuly 2 of YR3\tB\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "A");
        assert_eq!(lines[1].text, "B");
    }

    #[test]
    fn test_read_lines_sorts_newest_first_paste() {
        let lines = read_lines("July 3 of YR3\tC\nJuly 1 of YR3\tA\nJuly 2 of YR3\tB");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["A", "B", "C"]);
    }

    #[test]
    fn test_same_day_keeps_paste_order_with_fractional_ticks() {
        let lines = read_lines("July 1 of YR3\tfirst\nJuly 1 of YR3\tsecond\nJuly 1 of YR3\tthird\nJuly 2 of YR3\tnext");
        let day = GameDate::new(3, 6, 1).unwrap().tick() as f64;
        assert_eq!(lines[0].text, "first");
        assert_eq!(lines[0].tick, day);
        assert!(lines[1].tick > lines[0].tick && lines[1].tick < day + 1.0);
        assert!(lines[2].tick > lines[1].tick && lines[2].tick < day + 1.0);
        assert_eq!(lines[3].tick, day + 1.0);
    }

    #[test]
    fn test_date_separator_carries_forward() {
        let lines = read_lines("undated before\nJuly 5 of YR3\nevent one\nevent two");
        assert_eq!(lines[0].day_tick, 0);
        assert!(lines[0].date.is_none());
        let day = GameDate::new(3, 6, 5).unwrap();
        assert_eq!(lines[2].date, Some(day));
        assert_eq!(lines[3].day_tick, day.tick());
        assert_eq!(lines[2].prefix, "");
        assert_eq!(lines[1].prefix, "July 5 of YR3");
    }

    #[test]
    fn test_ticks_non_decreasing() {
        let lines = read_lines("May 2 of YR1\ta\nJan 1 of YR2\tb\nMay 2 of YR1\tc\nundated\nJuly 24 of YR0\td");
        for pair in lines.windows(2) {
            assert!(pair[0].tick <= pair[1].tick);
        }
    }

    // ── records ──────────────────────────────────────────────────────

    #[test]
    fn test_example_line_becomes_traditional_march() {
        let log = parse_news(
            "July 1 of YR3\tDuke Silverhand (3:12) invaded Baron Ashgrove (6:7) and successfully captured 55 acres of land!",
        );
        assert_eq!(log.records.len(), 1);
        let r = &log.records[0];
        assert_eq!(r.attacker_province.as_deref(), Some("Duke Silverhand"));
        assert_eq!(r.attacker_kingdom, KingdomKey::parse("3:12"));
        assert_eq!(r.defender_province.as_deref(), Some("Baron Ashgrove"));
        assert_eq!(r.defender_kingdom, KingdomKey::parse("6:7"));
        assert_eq!(r.acres, Some(55));
        assert_eq!(r.category, Category::TraditionalMarch);
        assert_eq!(r.outcome, Outcome::Land);
        assert_eq!(r.date, "July 1 of YR3");
    }

    #[test]
    fn test_failed_attack_has_no_acres() {
        let log = parse_news("July 2 of YR3\tFoo (3:12) attempted to invade Bar (6:7), but was repelled.");
        let r = &log.records[0];
        assert_eq!(r.category, Category::FailedAttack);
        assert_eq!(r.outcome, Outcome::Fail);
        assert!(r.acres.is_none());
    }

    #[test]
    fn test_date_only_line_is_not_a_record() {
        let log = parse_news("July 1 of YR3");
        assert_eq!(log.lines.len(), 1);
        assert!(log.records.is_empty());
    }

    #[test]
    fn test_capture_shapes_property() {
        let cases = [
            ("Foo (1:2) captured 12 acres of land from Bar (3:4).", Category::TraditionalMarch),
            ("Foo (1:2), captured 12 acres of land from Bar (3:4).", Category::Conquest),
            ("Foo Bar-Baz (10:11) captured 2,012 acres of land from Qux (3:4)", Category::TraditionalMarch),
        ];
        for (line, category) in cases {
            let log = parse_news(line);
            let r = &log.records[0];
            assert_eq!(r.category, category, "{line}");
            assert!(r.attacker_kingdom.is_some(), "{line}");
            assert_eq!(r.defender_kingdom, KingdomKey::parse("3:4"), "{line}");
        }
        let r = &parse_news(cases[2].0).records[0];
        assert_eq!(r.attacker_kingdom, KingdomKey::parse("10:11"));
        assert_eq!(r.acres, Some(2012));
    }

    #[test]
    fn test_dropped_lines_still_consume_ticks() {
        let log = parse_news("July 1 of YR3\tnothing here\nJuly 1 of YR3\tFoo (1:2) razed 5 acres of Bar (3:4)");
        assert_eq!(log.records.len(), 1);
        let day = GameDate::new(3, 6, 1).unwrap().tick() as f64;
        assert_eq!(log.records[0].tick, day + 0.5);
    }
}
