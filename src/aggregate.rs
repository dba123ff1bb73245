//! Folding the ordered record stream into totals, ledgers and news digests.
//!
//! Everything here is relative to a resolved home kingdom. "Made" means the
//! home kingdom was the attacker, "suffered" means it was the target. The
//! output is a plain serializable [`NewsAnalysis`] that the report module
//! renders without further counting.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use news_types::{AttackRecord, Category, KingdomKey, ProvinceLedgerEntry};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::extract::{display_name, province_key};
use crate::kingdom::{HomeSource, resolve_enemy, resolve_home};
use crate::news::{LogLine, NewsLog};

// ── Regex patterns ───────────────────────────────────────────────────────

// Fallback for lines the category table did not recognize as attacks
static RE_ATTACK_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:invaded|attacked|captured|recaptured|razed|ambushed|pillaged|plundered|looted|massacred|killed)\b",
    )
    .unwrap()
});

// "Duke Silverhand (3:12) was invaded by ...": the coordinate before a
// passive attack verb belongs to the province that was hit
static RE_DEFENDER_SIDE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\((\d+:\d+)\)[^()]*?\b(?:was|were|been|got)\s+(?:invaded|attacked|captured|razed|ambushed|pillaged|plundered|looted|massacred|raided|hit)\b",
    )
    .unwrap()
});

// Names that end up in the province column but are not provinces
static RE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdragon|\btopaz\b|\bour\s+kingdom\b|\bworld\s+divided\b|^\s*-").unwrap()
});

// A relations verb, not just the word "war" somewhere in the line
static RE_RELATIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bdeclared\b.*\bwar\b|\bwar\b.*\b(?:ended|is\s+over|has\s+ended)\b|\bend(?:ed)?\s+(?:the\s+|our\s+)?war\b|\bcease-?\s?fire\b|\bsurrender\w*|\bpeace\b|\bformal\s+relations\b|\bhostilities\b",
    )
    .unwrap()
});

static RE_DRAGON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bdragons?\b").unwrap());
static RE_DRAGON_SLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bslain\b|\bslew\b|\bkilled\b|\bdefeated\b").unwrap());
static RE_DRAGON_FLOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfl(?:own|ew)\s+away\b|\bleft\s+our\s+lands\b").unwrap());
static RE_DRAGON_SENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:we|our\s+kingdom)\s+(?:has\s+|have\s+)?sent\b|\bsent\b.*\bto\b").unwrap());
static RE_DRAGON_RECEIVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bravag\w*\s+our\b|\bour\s+lands\b|\bhas\s+arrived\b|\bentered\s+our\b").unwrap()
});
static RE_DRAGON_PROJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bproject\b|\bbegun\b|\bfunded\b").unwrap());

static RE_RITUAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\britual\b").unwrap());
static RE_RITUAL_DONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcompleted\b|\bfinished\b|\bnow\s+(?:active|covers|covering)\b").unwrap()
});
static RE_RITUAL_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbeg[au]n\b|\bstarted\b|\binitiated\b").unwrap());

const TOP_BOUNCED: usize = 5;

// ── Sides ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Made,
    Suffered,
}

/// One participant of a record as the aggregator reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Party<'a> {
    pub province: Option<&'a str>,
    pub kingdom: Option<&'a KingdomKey>,
}

/// Whether the extracted attacker is really the province that was hit.
///
/// Only when extraction found no defender kingdom: the line's coordinate
/// is then followed by a passive attack verb ("(3:12) was invaded").
pub fn reads_as_hit(record: &AttackRecord) -> bool {
    record.defender_kingdom.is_none()
        && record
            .attacker_kingdom
            .as_ref()
            .is_some_and(|k| hit_verb_after(&record.raw, k))
}

fn hit_verb_after(raw: &str, kingdom: &KingdomKey) -> bool {
    RE_DEFENDER_SIDE_VERB
        .captures_iter(raw)
        .any(|c| c.get(1).is_some_and(|m| m.as_str() == kingdom.as_str()))
}

/// The side that struck. Empty for a line that reads as a hit.
pub fn striker(record: &AttackRecord) -> Party<'_> {
    if reads_as_hit(record) {
        Party {
            province: None,
            kingdom: None,
        }
    } else {
        Party {
            province: record.attacker_province.as_deref(),
            kingdom: record.attacker_kingdom.as_ref(),
        }
    }
}

/// The side that was struck.
pub fn target(record: &AttackRecord) -> Party<'_> {
    if reads_as_hit(record) {
        Party {
            province: record.attacker_province.as_deref(),
            kingdom: record.attacker_kingdom.as_ref(),
        }
    } else {
        Party {
            province: record.defender_province.as_deref(),
            kingdom: record.defender_kingdom.as_ref(),
        }
    }
}

/// Whether `record` belongs on `side` for `kingdom`. A line that reads as
/// a hit on `kingdom` is suffered, never made.
pub fn on_side(record: &AttackRecord, side: Side, kingdom: &KingdomKey) -> bool {
    let party = match side {
        Side::Made => striker(record),
        Side::Suffered => target(record),
    };
    party.kingdom == Some(kingdom)
}

/// The category table's verdict, or the attack-verb fallback.
pub fn is_attack_like(record: &AttackRecord) -> bool {
    record.category.is_attack() || RE_ATTACK_VERB.is_match(&record.raw)
}

// ── Category totals ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    pub category: Category,
    pub count: u32,
    pub acres: u64,
    pub books: u64,
    pub kills: u64,
}

impl CategoryTally {
    fn new(category: Category) -> Self {
        Self {
            category,
            count: 0,
            acres: 0,
            books: 0,
            kills: 0,
        }
    }

    fn add(&mut self, record: &AttackRecord) {
        self.count += 1;
        self.acres += record.acres.unwrap_or(0) as u64;
        self.books += record.books.unwrap_or(0) as u64;
        self.kills += record.kills.unwrap_or(0) as u64;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideTotals {
    pub count: u32,
    /// Non-empty categories in report order
    pub categories: Vec<CategoryTally>,
    /// Land actually transferred: Traditional March, Ambush and Conquest
    pub overall_acres: u64,
}

impl SideTotals {
    pub fn get(&self, category: Category) -> Option<&CategoryTally> {
        self.categories.iter().find(|t| t.category == category)
    }

    pub fn count_of(&self, category: Category) -> u32 {
        self.get(category).map_or(0, |t| t.count)
    }
}

pub fn side_totals<'a>(records: impl IntoIterator<Item = &'a AttackRecord>) -> SideTotals {
    let mut tallies: Vec<CategoryTally> = Category::ALL.iter().map(|c| CategoryTally::new(*c)).collect();
    let mut totals = SideTotals::default();
    for record in records {
        totals.count += 1;
        if record.category.transfers_land() {
            totals.overall_acres += record.acres.unwrap_or(0) as u64;
        }
        if let Some(tally) = tallies.iter_mut().find(|t| t.category == record.category) {
            tally.add(record);
        }
    }
    totals.categories = tallies.into_iter().filter(|t| t.count > 0).collect();
    totals
}

// ── Windowed uniques ─────────────────────────────────────────────────────

/// Distinct strikes on one side, collapsing each province's repeat hits
/// that land within `window` days of its last counted strike.
///
/// Records must already be in tick order. Only attack-like records count,
/// ambushes never do, nor do records without a province on the relevant
/// side.
pub fn unique_attacks<'a>(
    records: impl IntoIterator<Item = &'a AttackRecord>,
    side: Side,
    window: f64,
) -> u32 {
    let mut last_counted: HashMap<String, f64> = HashMap::new();
    let mut uniques = 0;
    for record in records {
        if record.category == Category::Ambush || !is_attack_like(record) {
            continue;
        }
        let province = match side {
            Side::Made => striker(record).province,
            Side::Suffered => target(record).province,
        };
        let Some(province) = province else { continue };
        let key = province_key(&display_name(province));
        match last_counted.get(&key) {
            Some(last) if record.tick - last < window => {}
            _ => {
                last_counted.insert(key, record.tick);
                uniques += 1;
            }
        }
    }
    uniques
}

// ── Province ledgers ─────────────────────────────────────────────────────

/// Rejects ledger names that are not real provinces.
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    extra: Vec<Regex>,
}

impl NoiseFilter {
    pub fn new(extra: Vec<Regex>) -> Self {
        Self { extra }
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self::new(config.noise_regexes()?))
    }

    pub fn is_noise(&self, name: &str) -> bool {
        RE_NOISE.is_match(name) || self.extra.iter().any(|re| re.is_match(name))
    }
}

/// Net acres and hit counts per province of `kingdom`, sorted by acres
/// descending then name.
pub fn province_ledger(
    records: &[AttackRecord],
    kingdom: &KingdomKey,
    noise: &NoiseFilter,
) -> Vec<ProvinceLedgerEntry> {
    let mut by_key: BTreeMap<String, ProvinceLedgerEntry> = BTreeMap::new();

    for record in records.iter().filter(|r| is_attack_like(r)) {
        // Razing destroys land, it does not move it
        let acres = match record.category {
            Category::Raze => 0,
            _ => record.acres.unwrap_or(0) as i64,
        };
        if on_side(record, Side::Made, kingdom)
            && let Some(name) = striker(record).province
        {
            let entry = ledger_entry(&mut by_key, name);
            entry.times_attacking += 1;
            entry.acres += acres;
        }
        if on_side(record, Side::Suffered, kingdom)
            && let Some(name) = target(record).province
        {
            let entry = ledger_entry(&mut by_key, name);
            entry.times_defending += 1;
            entry.acres -= acres;
        }
    }

    let mut merged: BTreeMap<String, ProvinceLedgerEntry> = BTreeMap::new();
    for entry in by_key.into_values() {
        if noise.is_noise(&entry.province) {
            debug!(province = %entry.province, %kingdom, "dropping ledger noise");
            continue;
        }
        merged
            .entry(entry.province.clone())
            .and_modify(|e| e.merge(&entry))
            .or_insert(entry);
    }

    let mut ledger: Vec<ProvinceLedgerEntry> = merged.into_values().collect();
    ledger.sort_by(|a, b| b.acres.cmp(&a.acres).then_with(|| a.province.cmp(&b.province)));
    ledger
}

fn ledger_entry<'a>(
    by_key: &'a mut BTreeMap<String, ProvinceLedgerEntry>,
    name: &str,
) -> &'a mut ProvinceLedgerEntry {
    by_key
        .entry(province_key(name))
        .or_insert_with(|| ProvinceLedgerEntry::new(display_name(name)))
}

// ── Kingdom sections ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KingdomSection {
    pub kingdom: KingdomKey,
    pub is_home: bool,
    /// Records naming this kingdom on either side
    pub interactions: u32,
    pub ledger: Vec<ProvinceLedgerEntry>,
    pub uniques_made: u32,
    pub uniques_suffered: u32,
}

/// Home first, then every other kingdom by interaction count descending,
/// ties by coordinates. An explicit counterpart with no records is
/// appended so it still gets a section.
pub fn kingdom_order(
    records: &[AttackRecord],
    home: &KingdomKey,
    enemy: Option<&KingdomKey>,
) -> Vec<(KingdomKey, u32)> {
    let mut counts: BTreeMap<&KingdomKey, u32> = BTreeMap::new();
    for record in records {
        let mut sides = [striker(record).kingdom, target(record).kingdom];
        if sides[0] == sides[1] {
            sides[1] = None;
        }
        for k in sides.into_iter().flatten() {
            *counts.entry(k).or_default() += 1;
        }
    }

    let home_count = counts.remove(home).unwrap_or(0);
    let mut others: Vec<(KingdomKey, u32)> = counts.into_iter().map(|(k, n)| (k.clone(), n)).collect();
    others.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut order = vec![(home.clone(), home_count)];
    order.extend(others);
    if let Some(enemy) = enemy
        && !order.iter().any(|(k, _)| k == enemy)
    {
        order.push((enemy.clone(), 0));
    }
    order
}

// ── Highlights ───────────────────────────────────────────────────────────

/// One single-event acreage swing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Swing {
    pub acres: u32,
    pub attacker: String,
    pub defender: String,
    pub date: String,
}

impl Swing {
    fn from_record(record: &AttackRecord, acres: u32) -> Self {
        let name = |party: Party| {
            let province = party.province.map(display_name).unwrap_or_else(|| "?".to_string());
            match party.kingdom {
                Some(k) => format!("{province} {}", k.parenthesized()),
                None => province,
            }
        };
        Self {
            acres,
            attacker: name(striker(record)),
            defender: name(target(record)),
            date: record.date.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extremes {
    pub side: Side,
    pub category: Category,
    pub largest: Swing,
    pub smallest: Swing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BouncedProvince {
    pub province: String,
    pub kingdom: Option<KingdomKey>,
    pub bounces: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub extremes: Vec<Extremes>,
    pub most_bounced: Vec<BouncedProvince>,
}

/// Largest and smallest Traditional March and Ambush per side. The
/// earliest record wins a tie.
pub fn extremes(records: &[AttackRecord], home: &KingdomKey) -> Vec<Extremes> {
    let mut out = Vec::new();
    for side in [Side::Made, Side::Suffered] {
        for category in [Category::TraditionalMarch, Category::Ambush] {
            let mut largest: Option<(u32, &AttackRecord)> = None;
            let mut smallest: Option<(u32, &AttackRecord)> = None;
            for record in records
                .iter()
                .filter(|r| r.category == category && on_side(r, side, home))
            {
                let Some(acres) = record.acres else { continue };
                if largest.is_none_or(|(best, _)| acres > best) {
                    largest = Some((acres, record));
                }
                if smallest.is_none_or(|(best, _)| acres < best) {
                    smallest = Some((acres, record));
                }
            }
            if let (Some((la, lr)), Some((sa, sr))) = (largest, smallest) {
                out.push(Extremes {
                    side,
                    category,
                    largest: Swing::from_record(lr, la),
                    smallest: Swing::from_record(sr, sa),
                });
            }
        }
    }
    out
}

/// Attacking provinces with the most failed attacks.
pub fn most_bounced(records: &[AttackRecord], limit: usize) -> Vec<BouncedProvince> {
    let mut counts: BTreeMap<(String, Option<KingdomKey>), u32> = BTreeMap::new();
    for record in records.iter().filter(|r| r.category == Category::FailedAttack) {
        let party = striker(record);
        let Some(province) = party.province else { continue };
        *counts
            .entry((display_name(province), party.kingdom.cloned()))
            .or_default() += 1;
    }
    let mut bounced: Vec<BouncedProvince> = counts
        .into_iter()
        .map(|((province, kingdom), bounces)| BouncedProvince {
            province,
            kingdom,
            bounces,
        })
        .collect();
    bounced.sort_by(|a, b| b.bounces.cmp(&a.bounces));
    bounced.truncate(limit);
    bounced
}

// ── News digests ─────────────────────────────────────────────────────────

/// A dated line passed through close to verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub date: String,
    pub text: String,
}

impl NewsItem {
    fn from_line(line: &LogLine) -> Self {
        Self {
            date: line.date_label(),
            text: line.text.clone(),
        }
    }
}

pub fn relations_news(lines: &[LogLine]) -> Vec<NewsItem> {
    lines
        .iter()
        .filter(|l| !l.text.is_empty() && RE_RELATIONS.is_match(&l.text))
        .map(NewsItem::from_line)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragonKind {
    Slain,
    FlownAway,
    Sent,
    Received,
    Project,
    Other,
}

impl DragonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slain => "slain",
            Self::FlownAway => "flown away",
            Self::Sent => "sent",
            Self::Received => "received",
            Self::Project => "project",
            Self::Other => "other",
        }
    }
}

/// First match wins: a sent dragon's line also mentions ravaging.
pub fn dragon_kind(text: &str) -> DragonKind {
    if RE_DRAGON_SLAIN.is_match(text) {
        DragonKind::Slain
    } else if RE_DRAGON_FLOWN.is_match(text) {
        DragonKind::FlownAway
    } else if RE_DRAGON_SENT.is_match(text) {
        DragonKind::Sent
    } else if RE_DRAGON_RECEIVED.is_match(text) {
        DragonKind::Received
    } else if RE_DRAGON_PROJECT.is_match(text) {
        DragonKind::Project
    } else {
        DragonKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragonEvent {
    pub kind: DragonKind,
    #[serde(flatten)]
    pub item: NewsItem,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragonCounts {
    pub sent: u32,
    pub received: u32,
    pub slain: u32,
    pub flown_away: u32,
}

pub fn dragon_news(lines: &[LogLine]) -> (Vec<DragonEvent>, DragonCounts) {
    let mut counts = DragonCounts::default();
    let events: Vec<DragonEvent> = lines
        .iter()
        .filter(|l| RE_DRAGON.is_match(&l.text))
        .map(|l| {
            let kind = dragon_kind(&l.text);
            match kind {
                DragonKind::Sent => counts.sent += 1,
                DragonKind::Received => counts.received += 1,
                DragonKind::Slain => counts.slain += 1,
                DragonKind::FlownAway => counts.flown_away += 1,
                DragonKind::Project | DragonKind::Other => {}
            }
            DragonEvent {
                kind,
                item: NewsItem::from_line(l),
            }
        })
        .collect();
    (events, counts)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RitualCounts {
    pub started: u32,
    pub completed: u32,
}

pub fn ritual_counts(lines: &[LogLine]) -> RitualCounts {
    let mut counts = RitualCounts::default();
    for line in lines.iter().filter(|l| RE_RITUAL.is_match(&l.text)) {
        if RE_RITUAL_DONE.is_match(&line.text) {
            counts.completed += 1;
        } else if RE_RITUAL_START.is_match(&line.text) {
            counts.started += 1;
        }
    }
    counts
}

// ═══════════════════════════════════════════════════════════════════════
//  FULL ANALYSIS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsAnalysis {
    pub home: KingdomKey,
    pub home_source: HomeSource,
    pub enemy: Option<KingdomKey>,
    pub window: f64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    /// Game days between the first and last dated line
    pub elapsed_days: u32,
    pub line_count: usize,
    pub record_count: usize,
    /// Records whose coarse type contradicts their category
    pub divergent: usize,
    pub made: SideTotals,
    pub suffered: SideTotals,
    pub kingdoms: Vec<KingdomSection>,
    pub highlights: Highlights,
    pub relations: Vec<NewsItem>,
    pub dragons: Vec<DragonEvent>,
    pub dragon_counts: DragonCounts,
    pub rituals: RitualCounts,
}

pub fn analyze(log: &NewsLog, config: &AnalysisConfig, noise: &NoiseFilter) -> NewsAnalysis {
    let records = &log.records;
    let (home, home_source) =
        resolve_home(config.home.as_ref(), &log.lines, records, &config.fallback_home);
    let enemy = resolve_enemy(config.enemy.as_ref(), &home, records);
    let window = config.unique_window;

    let made = side_totals(records.iter().filter(|r| on_side(r, Side::Made, &home)));
    let suffered = side_totals(records.iter().filter(|r| on_side(r, Side::Suffered, &home)));

    let kingdoms: Vec<KingdomSection> = kingdom_order(records, &home, enemy.as_ref())
        .into_iter()
        .map(|(kingdom, interactions)| {
            let uniques = |side: Side| {
                unique_attacks(records.iter().filter(|r| on_side(r, side, &kingdom)), side, window)
            };
            KingdomSection {
                is_home: kingdom == home,
                interactions,
                ledger: province_ledger(records, &kingdom, noise),
                uniques_made: uniques(Side::Made),
                uniques_suffered: uniques(Side::Suffered),
                kingdom,
            }
        })
        .collect();

    let dated: Vec<&LogLine> = log.lines.iter().filter(|l| l.date.is_some()).collect();
    let (first, last) = (dated.first(), dated.last());
    let elapsed_days = match (first, last) {
        (Some(f), Some(l)) => l.day_tick - f.day_tick,
        _ => 0,
    };

    let (dragons, dragon_counts) = dragon_news(&log.lines);
    let divergent = records.iter().filter(|r| !r.type_agrees_with_category()).count();

    info!(
        %home,
        enemy = ?enemy,
        records = records.len(),
        made = made.count,
        suffered = suffered.count,
        kingdoms = kingdoms.len(),
        "analysis complete"
    );

    NewsAnalysis {
        highlights: Highlights {
            extremes: extremes(records, &home),
            most_bounced: most_bounced(records, TOP_BOUNCED),
        },
        home,
        home_source,
        enemy,
        window,
        first_date: first.map(|l| l.date_label()),
        last_date: last.map(|l| l.date_label()),
        elapsed_days,
        line_count: log.lines.len(),
        record_count: records.len(),
        divergent,
        made,
        suffered,
        kingdoms,
        relations: relations_news(&log.lines),
        dragons,
        dragon_counts,
        rituals: ritual_counts(&log.lines),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news_types::Outcome;

    use crate::news::parse_news;

    fn kd(s: &str) -> KingdomKey {
        KingdomKey::parse(s).unwrap()
    }

    fn record(category: Category, attacker: &str, defender: &str, acres: Option<u32>, tick: f64) -> AttackRecord {
        AttackRecord {
            raw: format!("{attacker} (3:12) hit {defender} (6:7)"),
            date: String::new(),
            attacker_province: Some(attacker.to_string()),
            attacker_kingdom: Some(kd("3:12")),
            defender_province: Some(defender.to_string()),
            defender_kingdom: Some(kd("6:7")),
            outcome: category.expected_outcome().unwrap_or(Outcome::Other),
            category,
            acres,
            books: None,
            kills: None,
            tick,
        }
    }

    fn entry<'a>(ledger: &'a [ProvinceLedgerEntry], name: &str) -> &'a ProvinceLedgerEntry {
        ledger.iter().find(|e| e.province == name).unwrap()
    }

    // ── windowed uniques ─────────────────────────────────────────────

    #[test]
    fn test_unique_window_collapses_runs() {
        let records: Vec<_> = [1.0, 2.0, 3.0, 20.0]
            .into_iter()
            .map(|t| record(Category::TraditionalMarch, "X", "Y", Some(10), t))
            .collect();
        assert_eq!(unique_attacks(&records, Side::Made, 5.0), 2);
    }

    #[test]
    fn test_unique_window_measures_from_last_counted() {
        // 4 falls inside the window opened at 0, 8 does not
        let records: Vec<_> = [0.0, 4.0, 8.0]
            .into_iter()
            .map(|t| record(Category::TraditionalMarch, "X", "Y", Some(10), t))
            .collect();
        assert_eq!(unique_attacks(&records, Side::Made, 5.0), 2);
    }

    #[test]
    fn test_ambush_never_counts_as_unique() {
        let records: Vec<_> = [1.0, 50.0, 100.0]
            .into_iter()
            .map(|t| record(Category::Ambush, "X", "Y", Some(10), t))
            .collect();
        assert_eq!(unique_attacks(&records, Side::Made, 5.0), 0);

        let mut mixed = records.clone();
        mixed.push(record(Category::TraditionalMarch, "X", "Y", Some(10), 101.0));
        assert_eq!(unique_attacks(&mixed, Side::Made, 5.0), 1);
    }

    #[test]
    fn test_uncategorized_attacks_still_count_as_uniques() {
        let log = parse_news(
            "July 1 of YR3\tFoo (3:12) attacked Bar (6:7)\n\
             July 20 of YR3\tFoo (3:12) attacked Bar (6:7)",
        );
        assert!(log.records.iter().all(|r| r.category == Category::Other));
        assert_eq!(unique_attacks(&log.records, Side::Made, 5.0), 2);
        assert_eq!(unique_attacks(&log.records, Side::Suffered, 5.0), 2);
    }

    #[test]
    fn test_uniques_group_by_province_per_side() {
        let records = vec![
            record(Category::TraditionalMarch, "A", "Y", Some(10), 1.0),
            record(Category::TraditionalMarch, "B", "Y", Some(10), 1.5),
            record(Category::DragonUpdate, "A", "Y", None, 30.0),
        ];
        assert_eq!(unique_attacks(&records, Side::Made, 5.0), 2);
        assert_eq!(unique_attacks(&records, Side::Suffered, 5.0), 1);
    }

    // ── ledgers ──────────────────────────────────────────────────────

    #[test]
    fn test_raze_never_moves_acres() {
        let records = vec![record(Category::Raze, "A", "B", Some(40), 1.0)];
        let noise = NoiseFilter::default();
        let home = province_ledger(&records, &kd("3:12"), &noise);
        let enemy = province_ledger(&records, &kd("6:7"), &noise);
        assert_eq!(entry(&home, "A").acres, 0);
        assert_eq!(entry(&home, "A").times_attacking, 1);
        assert_eq!(entry(&enemy, "B").acres, 0);
        assert_eq!(entry(&enemy, "B").times_defending, 1);
    }

    #[test]
    fn test_traditional_march_conserves_acres() {
        let records = vec![record(Category::TraditionalMarch, "P1", "P2", Some(55), 1.0)];
        let noise = NoiseFilter::default();
        let home = province_ledger(&records, &kd("3:12"), &noise);
        let enemy = province_ledger(&records, &kd("6:7"), &noise);
        assert_eq!(entry(&home, "P1").acres, 55);
        assert_eq!(entry(&enemy, "P2").acres, -55);
    }

    #[test]
    fn test_ledger_drops_noise_and_merges_unknowns() {
        let mut records = vec![
            record(Category::TraditionalMarch, "An unknown province from Shadowfell", "Y", Some(10), 1.0),
            record(Category::TraditionalMarch, "an  Unknown Province", "Y", Some(5), 2.0),
            record(Category::TraditionalMarch, "Ruby Dragon", "Y", Some(5), 3.0),
            record(Category::TraditionalMarch, "- ", "Y", Some(5), 4.0),
            record(Category::TraditionalMarch, "Monarch Keep", "Y", Some(5), 5.0),
        ];
        records[3].attacker_province = Some("-".to_string());
        let extra = NoiseFilter::new(vec![Regex::new("(?i)^monarch").unwrap()]);
        let ledger = province_ledger(&records, &kd("3:12"), &extra);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].province, "An unknown Province");
        assert_eq!(ledger[0].acres, 15);
        assert_eq!(ledger[0].times_attacking, 2);
    }

    #[test]
    fn test_ledger_sorted_by_acres_then_name() {
        let records = vec![
            record(Category::TraditionalMarch, "Beta", "Y", Some(10), 1.0),
            record(Category::TraditionalMarch, "Alpha", "Y", Some(10), 2.0),
            record(Category::TraditionalMarch, "Gamma", "Y", Some(90), 3.0),
        ];
        let ledger = province_ledger(&records, &kd("3:12"), &NoiseFilter::default());
        let names: Vec<&str> = ledger.iter().map(|e| e.province.as_str()).collect();
        assert_eq!(names, ["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn test_non_attack_records_stay_out_of_ledger() {
        let mut r = record(Category::Aid, "A", "B", Some(10), 1.0);
        r.raw = "A (3:12) sent an aid shipment to B (6:7)".to_string();
        let ledger = province_ledger(&[r], &kd("3:12"), &NoiseFilter::default());
        assert!(ledger.is_empty());
    }

    // ── sides ────────────────────────────────────────────────────────

    #[test]
    fn test_passive_hit_on_home_is_suffered() {
        let log = parse_news(
            "July 1 of YR3\tDuke Silverhand (3:12) was invaded by an unknown province and 20 acres were captured.",
        );
        let r = &log.records[0];
        assert!(r.defender_kingdom.is_none());
        assert!(reads_as_hit(r));
        assert!(on_side(r, Side::Suffered, &kd("3:12")));
        assert!(!on_side(r, Side::Made, &kd("3:12")));
        assert_eq!(target(r).province, Some("Duke Silverhand"));
        assert_eq!(striker(r).kingdom, None);
    }

    #[test]
    fn test_lone_coordinate_with_active_verb_stays_made() {
        let log = parse_news("July 1 of YR3\tDuke Silverhand (3:12) attacked and was beaten back.");
        let r = &log.records[0];
        assert!(!reads_as_hit(r));
        assert!(on_side(r, Side::Made, &kd("3:12")));
        assert!(!on_side(r, Side::Suffered, &kd("3:12")));
    }

    #[test]
    fn test_passive_hit_books_loss_on_home_ledger() {
        let log = parse_news(
            "July 1 of YR3\tDuke Silverhand (3:12) was invaded by an unknown province and 20 acres were captured.\n\
             July 2 of YR3\tDuke Silverhand (3:12) invaded Baron Ashgrove (6:7) and captured 5 acres of land.",
        );
        let config = AnalysisConfig {
            home: Some(kd("3:12")),
            ..AnalysisConfig::default()
        };
        let a = analyze(&log, &config, &NoiseFilter::default());
        assert_eq!(a.made.count, 1);
        assert_eq!(a.suffered.count, 1);
        assert_eq!(a.suffered.overall_acres, 20);
        let duke = entry(&a.kingdoms[0].ledger, "Duke Silverhand");
        assert_eq!(duke.acres, -15);
        assert_eq!(duke.times_attacking, 1);
        assert_eq!(duke.times_defending, 1);
        assert_eq!(a.kingdoms[0].uniques_suffered, 1);
    }

    #[test]
    fn test_side_totals_overall_acres() {
        let records = vec![
            record(Category::TraditionalMarch, "A", "B", Some(10), 1.0),
            record(Category::Ambush, "A", "B", Some(5), 2.0),
            record(Category::Conquest, "A", "B", Some(20), 3.0),
            record(Category::Raze, "A", "B", Some(100), 4.0),
        ];
        let totals = side_totals(&records);
        assert_eq!(totals.count, 4);
        assert_eq!(totals.overall_acres, 35);
        assert_eq!(totals.get(Category::Raze).unwrap().acres, 100);
        assert_eq!(totals.count_of(Category::Massacre), 0);
        assert_eq!(totals.categories[0].category, Category::TraditionalMarch);
    }

    #[test]
    fn test_kingdom_order_home_first() {
        let mut records = vec![record(Category::TraditionalMarch, "A", "B", Some(10), 1.0)];
        let mut other = record(Category::TraditionalMarch, "C", "D", Some(10), 2.0);
        other.attacker_kingdom = Some(kd("9:9"));
        records.push(other.clone());
        records.push(other);
        let order = kingdom_order(&records, &kd("3:12"), Some(&kd("1:5")));
        let keys: Vec<String> = order.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["3:12", "6:7", "9:9", "1:5"]);
        assert_eq!(order[1].1, 3);
    }

    // ── highlights and digests ───────────────────────────────────────

    #[test]
    fn test_extremes_per_side() {
        let records = vec![
            record(Category::TraditionalMarch, "A", "B", Some(10), 1.0),
            record(Category::TraditionalMarch, "C", "D", Some(90), 2.0),
            record(Category::TraditionalMarch, "E", "F", Some(10), 3.0),
        ];
        let ex = extremes(&records, &kd("3:12"));
        assert_eq!(ex.len(), 1);
        assert_eq!(ex[0].side, Side::Made);
        assert_eq!(ex[0].largest.acres, 90);
        assert_eq!(ex[0].smallest.acres, 10);
        assert_eq!(ex[0].smallest.attacker, "A (3:12)");
    }

    #[test]
    fn test_most_bounced() {
        let records = vec![
            record(Category::FailedAttack, "A", "B", None, 1.0),
            record(Category::FailedAttack, "C", "B", None, 2.0),
            record(Category::FailedAttack, "C", "B", None, 3.0),
        ];
        let bounced = most_bounced(&records, 1);
        assert_eq!(bounced.len(), 1);
        assert_eq!(bounced[0].province, "C");
        assert_eq!(bounced[0].bounces, 2);
    }

    #[test]
    fn test_dragon_kinds() {
        assert_eq!(dragon_kind("We have sent a Ruby Dragon to ravage Foo (6:7)"), DragonKind::Sent);
        assert_eq!(dragon_kind("A Gold Dragon from Foo (6:7) has begun to ravage our lands!"), DragonKind::Received);
        assert_eq!(dragon_kind("Our army has slain the Gold Dragon"), DragonKind::Slain);
        assert_eq!(dragon_kind("The Ruby Dragon has flown away"), DragonKind::FlownAway);
        assert_eq!(dragon_kind("Our kingdom has begun the Ruby Dragon project"), DragonKind::Project);
    }

    #[test]
    fn test_relations_and_rituals_from_lines() {
        let log = parse_news(
            "July 1 of YR3\tWe have declared WAR on Foo (6:7)!\n\
             July 2 of YR3\tA ritual has begun.\n\
             July 3 of YR3\tThe ritual has been completed.\n\
             July 4 of YR3\tFoo (6:7) has proposed a ceasefire.",
        );
        let relations = relations_news(&log.lines);
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].date, "July 1 of YR3");
        assert_eq!(ritual_counts(&log.lines), RitualCounts { started: 1, completed: 1 });
    }

    #[test]
    fn test_passing_mention_of_war_is_not_relations_news() {
        let log = parse_news(
            "July 1 of YR3\tFoo (6:7) invaded Bar (3:12) to fill the war chest and captured 5 acres of land.\n\
             July 2 of YR3\tThe war with Foo (6:7) has ended.\n\
             July 3 of YR3\tFoo (6:7) has surrendered to us.",
        );
        let relations = relations_news(&log.lines);
        let dates: Vec<&str> = relations.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["July 2 of YR3", "July 3 of YR3"]);
    }

    // ── full analysis ────────────────────────────────────────────────

    #[test]
    fn test_analyze_splits_made_and_suffered() {
        let log = parse_news(
            "July 1 of YR3\tDuke Silverhand (3:12) invaded Baron Ashgrove (6:7) and captured 55 acres of land.\n\
             July 2 of YR3\tBaron Ashgrove (6:7) invaded Duke Silverhand (3:12) and captured 20 acres of land.\n\
             July 3 of YR3\tDuke Silverhand (3:12) attempted an invasion of Baron Ashgrove (6:7), but was repelled.",
        );
        let config = AnalysisConfig {
            home: Some(kd("3:12")),
            ..AnalysisConfig::default()
        };
        let a = analyze(&log, &config, &NoiseFilter::default());
        assert_eq!(a.enemy, Some(kd("6:7")));
        assert_eq!(a.made.count, 2);
        assert_eq!(a.suffered.count, 1);
        assert_eq!(a.made.overall_acres, 55);
        assert_eq!(a.suffered.overall_acres, 20);
        assert_eq!(a.made.count_of(Category::FailedAttack), 1);
        assert_eq!(a.elapsed_days, 2);
        assert_eq!(a.kingdoms[0].kingdom, kd("3:12"));
        assert_eq!(entry(&a.kingdoms[0].ledger, "Duke Silverhand").acres, 35);
        assert_eq!(entry(&a.kingdoms[1].ledger, "Baron Ashgrove").acres, -35);
    }
}
