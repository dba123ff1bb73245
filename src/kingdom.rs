//! Working out whose news this is.

use std::collections::HashMap;
use std::sync::LazyLock;

use news_types::{AttackRecord, KingdomKey};
use regex::Regex;
use tracing::{debug, warn};

use crate::aggregate::{striker, target};
use crate::news::LogLine;

/// Used when nothing in the paste identifies the home kingdom.
pub const DEFAULT_HOME: (u32, u32) = (1, 1);

pub fn default_home() -> KingdomKey {
    KingdomKey::new(DEFAULT_HOME.0, DEFAULT_HOME.1)
}

static RE_OUR_KINGDOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bour\s+kingdom\s*\((\d+:\d+)\)").unwrap());

/// How the home kingdom was decided, for the report header and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeSource {
    Explicit,
    OurKingdomPhrase,
    MostDefended,
    Fallback,
}

/// Explicit key, then "our kingdom (N:M)", then the most frequent defender,
/// then `fallback`. Never fails.
pub fn resolve_home(
    explicit: Option<&KingdomKey>,
    lines: &[LogLine],
    records: &[AttackRecord],
    fallback: &KingdomKey,
) -> (KingdomKey, HomeSource) {
    if let Some(k) = explicit {
        return (k.clone(), HomeSource::Explicit);
    }

    if let Some(k) = lines
        .iter()
        .filter_map(|l| RE_OUR_KINGDOM.captures(&l.text))
        .find_map(|c| c.get(1).and_then(|m| KingdomKey::parse(m.as_str())))
    {
        debug!(home = %k, "home kingdom from phrasing");
        return (k, HomeSource::OurKingdomPhrase);
    }

    let defenders = records.iter().filter_map(|r| target(r).kingdom);
    if let Some(k) = most_frequent(defenders) {
        debug!(home = %k, "home kingdom from most frequent defender");
        return (k, HomeSource::MostDefended);
    }

    warn!(fallback = %fallback, "no kingdom coordinates found, using fallback home");
    (fallback.clone(), HomeSource::Fallback)
}

/// Explicit key, else the kingdom other than home that shows up most often
/// on either side of a record.
pub fn resolve_enemy(
    explicit: Option<&KingdomKey>,
    home: &KingdomKey,
    records: &[AttackRecord],
) -> Option<KingdomKey> {
    if let Some(k) = explicit {
        return Some(k.clone());
    }
    let involved = records
        .iter()
        .flat_map(|r| [striker(r).kingdom, target(r).kingdom])
        .flatten()
        .filter(|k| *k != home);
    most_frequent(involved)
}

/// Most common key; ties go to whichever appeared first.
pub fn most_frequent<'a>(keys: impl Iterator<Item = &'a KingdomKey>) -> Option<KingdomKey> {
    let mut counts: HashMap<&KingdomKey, (usize, usize)> = HashMap::new();
    for (order, key) in keys.enumerate() {
        counts.entry(key).or_insert((0, order)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, oa)), (_, (cb, ob))| ca.cmp(cb).then(ob.cmp(oa)))
        .map(|(k, _)| k.clone())
}
