use std::sync::LazyLock;

use news_types::KingdomKey;
use regex::{Captures, Regex};

// ── Regex patterns ─────────────────────────────────────────────────
//
// Real news examples (date prefix already stripped):
//   An unknown province from Shadowfell (6:7) captured 31 acres of land from Baron Ashgrove (3:12).
//   Duke Silverhand (3:12) captured 55 acres of land from Baron Ashgrove (6:7).
//   Duke Silverhand (3:12) recaptured 18 acres of land from Baron Ashgrove (6:7).
//   Duke Silverhand (3:12) invaded Baron Ashgrove (6:7) and captured 55 acres of land.
//   Duke Silverhand (3:12) razed 40 acres of Baron Ashgrove (6:7).
//   Duke Silverhand (3:12) invaded and killed 1,234 people within Baron Ashgrove (6:7).
//   Duke Silverhand (3:12) attempted an invasion of Baron Ashgrove (6:7), but was repelled.

// Pattern 1: anonymous attacker, only the attacking kingdom is known
static RE_UNKNOWN_CAPTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^an?\s+unknown\s+province\s+from\s+[^()]*?\((?P<akd>\d+:\d+)\).*?\bcaptured\s+(?P<acres>[\d,]+)\s+acres\b.*?\bfrom\s+(?P<def>[^()]+?)\s*\((?P<dkd>\d+:\d+)\)"
    ).unwrap()
});

// Pattern 2: {Att} ({kd})[,] captured|recaptured|invaded|attacked ... N acres ... from {Def} ({kd})
static RE_CAPTURE_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<att>[^()]+?)\s*\((?P<akd>\d+:\d+)\)\s*,?\s*(?:re)?(?:captured|invaded|attacked)\b.*?(?P<acres>[\d,]+)\s+acres\b.*?\bfrom\s+(?P<def>[^()]+?)\s*\((?P<dkd>\d+:\d+)\)"
    ).unwrap()
});

// Pattern 3: {Att} ({kd}) invaded {Def} ({kd}) ... captured N acres
static RE_INVADED_THEN_CAPTURED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<att>[^()]+?)\s*\((?P<akd>\d+:\d+)\)\s+(?:invaded|attacked|ambushed\s+armies\s+from)\s+(?P<def>[^()]+?)\s*\((?P<dkd>\d+:\d+)\).*?\b(?:re)?captured\s+(?P<acres>[\d,]+)\s+acres\b"
    ).unwrap()
});

// Pattern 4: {Att} ({kd}) razed N acres of {Def} ({kd})
static RE_RAZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<att>[^()]+?)\s*\((?P<akd>\d+:\d+)\)\s+razed\s+(?P<acres>[\d,]+)\s+acres\s+of\s+(?P<def>[^()]+?)\s*\((?P<dkd>\d+:\d+)\)"
    ).unwrap()
});

// Pattern 5: {Att} ({kd}) ... killed N people within {Def} ({kd})
static RE_KILLED_WITHIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<att>[^()]+?)\s*\((?P<akd>\d+:\d+)\).*?\bkilled\s+(?P<kills>[\d,]+)\s+people\s+within\s+(?P<def>[^()]+?)\s*\((?P<dkd>\d+:\d+)\)"
    ).unwrap()
});

// Fallback: any parenthesized coordinate pair
static RE_COORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+:\d+)\)").unwrap());

// Fallback defender: the text after the first preposition between the two
// coordinate pairs ("an invasion of Baron Ashgrove", "armies from ..."),
// else the text after a bare attack verb ("attacked Baron Ashgrove").
static RE_DEFENDER_PREPOSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^.*?\b(?:from|of|within|at|on)\s+(?P<def>.+?)\s*$").unwrap()
});
static RE_DEFENDER_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^.*?\b(?:invaded|invade|attacked)\s+(?P<def>.+?)\s*$").unwrap()
});

// Numeric payloads, independent of the structural match
static RE_ACRES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d[\d,]*)\s+acres\b").unwrap());
static RE_BOOKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d[\d,]*)\s+books\b").unwrap());
static RE_KILLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bkilled\s+(\d[\d,]*)\s+people\b").unwrap());

static RE_UNKNOWN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^an?\s+unknown\s+province\b").unwrap());

pub const UNKNOWN_PROVINCE: &str = "An unknown Province";

// ── Types ────────────────────────────────────────────────────────────

/// Which structural pattern populated the participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPattern {
    UnknownCapture,
    CaptureFrom,
    InvadedThenCaptured,
    Razed,
    KilledWithin,
    Generic,
    None,
}

/// Participants and payloads pulled out of one news line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub attacker_province: Option<String>,
    pub attacker_kingdom: Option<KingdomKey>,
    pub defender_province: Option<String>,
    pub defender_kingdom: Option<KingdomKey>,
    pub acres: Option<u32>,
    pub books: Option<u32>,
    pub kills: Option<u32>,
}

// ── Entry point ──────────────────────────────────────────────────────

/// Extract participants and payloads from date-stripped line text.
/// Never fails: anything that does not match is left `None`.
pub fn extract(text: &str) -> (Extraction, ExtractionPattern) {
    let text = text.trim();
    let mut out = Extraction {
        acres: first_number(&RE_ACRES, text),
        books: first_number(&RE_BOOKS, text),
        kills: first_number(&RE_KILLS, text),
        ..Extraction::default()
    };

    let pattern = if let Some(caps) = RE_UNKNOWN_CAPTURE.captures(text) {
        out.attacker_province = Some(UNKNOWN_PROVINCE.to_string());
        out.attacker_kingdom = kingdom(&caps, "akd");
        fill_defender(&mut out, &caps);
        ExtractionPattern::UnknownCapture
    } else if let Some(caps) = RE_CAPTURE_FROM.captures(text) {
        fill_both(&mut out, &caps);
        ExtractionPattern::CaptureFrom
    } else if let Some(caps) = RE_INVADED_THEN_CAPTURED.captures(text) {
        fill_both(&mut out, &caps);
        ExtractionPattern::InvadedThenCaptured
    } else if let Some(caps) = RE_RAZED.captures(text) {
        fill_both(&mut out, &caps);
        ExtractionPattern::Razed
    } else if let Some(caps) = RE_KILLED_WITHIN.captures(text) {
        fill_both(&mut out, &caps);
        ExtractionPattern::KilledWithin
    } else if extract_generic(&mut out, text) {
        ExtractionPattern::Generic
    } else {
        ExtractionPattern::None
    };

    (out, pattern)
}

fn fill_both(out: &mut Extraction, caps: &Captures) {
    out.attacker_province = caps.name("att").and_then(|m| clean_province(m.as_str()));
    out.attacker_kingdom = kingdom(caps, "akd");
    fill_defender(out, caps);
}

fn fill_defender(out: &mut Extraction, caps: &Captures) {
    out.defender_province = caps.name("def").and_then(|m| clean_province(m.as_str()));
    out.defender_kingdom = kingdom(caps, "dkd");
}

fn kingdom(caps: &Captures, group: &str) -> Option<KingdomKey> {
    caps.name(group).and_then(|m| KingdomKey::parse(m.as_str()))
}

/// First coordinate pair is the attacker; the second, if any, the defender.
fn extract_generic(out: &mut Extraction, text: &str) -> bool {
    let coords: Vec<_> = RE_COORD.captures_iter(text).collect();
    let Some(first) = coords.first() else {
        return false;
    };
    let first_span = first.get(0).unwrap();
    out.attacker_kingdom = first.get(1).and_then(|m| KingdomKey::parse(m.as_str()));
    out.attacker_province = clean_province(&text[..first_span.start()]);

    if let Some(second) = coords.get(1) {
        let second_span = second.get(0).unwrap();
        out.defender_kingdom = second.get(1).and_then(|m| KingdomKey::parse(m.as_str()));
        let between = &text[first_span.end()..second_span.start()];
        out.defender_province = RE_DEFENDER_PREPOSITION
            .captures(between)
            .or_else(|| RE_DEFENDER_VERB.captures(between))
            .and_then(|c| c.name("def"))
            .and_then(|m| clean_province(m.as_str()));
    }
    true
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Parse "1,234" → 1234.
pub fn parse_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().filter(|c| *c != ',').collect();
    digits.parse().ok()
}

fn first_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_number(m.as_str()))
}

/// Trim a captured province name and drop the dangling hyphen the news
/// table leaves behind ("Duke Silverhand -" → "Duke Silverhand").
/// Empty names come back as `None`.
pub fn clean_province(raw: &str) -> Option<String> {
    let mut name = raw.trim();
    while let Some(stripped) = name.strip_suffix('-') {
        let stripped = stripped.trim_end();
        if stripped.is_empty() {
            break;
        }
        name = stripped;
    }
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Lowercased, whitespace-collapsed name used to group provinces.
pub fn province_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The name a province is shown under. All anonymous attackers share one.
pub fn display_name(name: &str) -> String {
    if RE_UNKNOWN_NAME.is_match(name.trim()) {
        UNKNOWN_PROVINCE.to_string()
    } else {
        name.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
