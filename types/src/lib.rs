use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Kingdom coordinates ──────────────────────────────────────────────────

/// A kingdom coordinate pair such as `"3:12"` (island:kingdom).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KingdomKey(String);

impl KingdomKey {
    pub fn new(island: u32, kingdom: u32) -> Self {
        Self(format!("{island}:{kingdom}"))
    }

    /// Accepts `<digits>:<digits>`, ignoring surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (island, kingdom) = s.split_once(':')?;
        let all_digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
        if all_digits(island) && all_digits(kingdom) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The form the game prints after a name: `(3:12)`.
    pub fn parenthesized(&self) -> String {
        format!("({})", self.0)
    }
}

impl fmt::Display for KingdomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for KingdomKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("expected kingdom coordinates like 3:12, got {s:?}"))
    }
}

impl TryFrom<String> for KingdomKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<KingdomKey> for String {
    fn from(k: KingdomKey) -> Self {
        k.0
    }
}

// ── Event classification ─────────────────────────────────────────────────

/// Coarse outcome of a news line. Secondary to [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Land,
    Plunder,
    Raze,
    Massacre,
    Fail,
    Other,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Land => "land",
            Self::Plunder => "plunder",
            Self::Raze => "raze",
            Self::Massacre => "massacre",
            Self::Fail => "fail",
            Self::Other => "other",
        }
    }
}

/// Fine-grained event label. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Traditional March")]
    TraditionalMarch,
    Ambush,
    Conquest,
    Raze,
    Massacre,
    Plunder,
    Learn,
    #[serde(rename = "Failed Attack")]
    FailedAttack,
    #[serde(rename = "Starting a Dragon")]
    StartingDragon,
    #[serde(rename = "Dragon Update")]
    DragonUpdate,
    #[serde(rename = "War Declaration")]
    WarDeclaration,
    #[serde(rename = "Enemy Declaration")]
    EnemyDeclaration,
    Ceasefire,
    #[serde(rename = "Withdrew Proposal")]
    WithdrewProposal,
    #[serde(rename = "Defected in")]
    DefectedIn,
    #[serde(rename = "Defected out")]
    DefectedOut,
    Aid,
    Killed,
    Other,
}

impl Category {
    pub const ALL: [Category; 19] = [
        Self::TraditionalMarch,
        Self::Ambush,
        Self::Conquest,
        Self::Raze,
        Self::Massacre,
        Self::Plunder,
        Self::Learn,
        Self::FailedAttack,
        Self::StartingDragon,
        Self::DragonUpdate,
        Self::WarDeclaration,
        Self::EnemyDeclaration,
        Self::Ceasefire,
        Self::WithdrewProposal,
        Self::DefectedIn,
        Self::DefectedOut,
        Self::Aid,
        Self::Killed,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TraditionalMarch => "Traditional March",
            Self::Ambush => "Ambush",
            Self::Conquest => "Conquest",
            Self::Raze => "Raze",
            Self::Massacre => "Massacre",
            Self::Plunder => "Plunder",
            Self::Learn => "Learn",
            Self::FailedAttack => "Failed Attack",
            Self::StartingDragon => "Starting a Dragon",
            Self::DragonUpdate => "Dragon Update",
            Self::WarDeclaration => "War Declaration",
            Self::EnemyDeclaration => "Enemy Declaration",
            Self::Ceasefire => "Ceasefire",
            Self::WithdrewProposal => "Withdrew Proposal",
            Self::DefectedIn => "Defected in",
            Self::DefectedOut => "Defected out",
            Self::Aid => "Aid",
            Self::Killed => "Killed",
            Self::Other => "Other",
        }
    }

    /// Categories that represent one province hitting another.
    pub fn is_attack(&self) -> bool {
        matches!(
            self,
            Self::TraditionalMarch
                | Self::Ambush
                | Self::Conquest
                | Self::Raze
                | Self::Massacre
                | Self::Plunder
                | Self::FailedAttack
                | Self::Learn
        )
    }

    /// Categories whose acres count toward the headline land figure.
    /// Razed land is destroyed, not transferred.
    pub fn transfers_land(&self) -> bool {
        matches!(self, Self::TraditionalMarch | Self::Ambush | Self::Conquest)
    }

    /// The outcome a category would normally imply, if it implies one.
    pub fn expected_outcome(&self) -> Option<Outcome> {
        match self {
            Self::TraditionalMarch | Self::Ambush | Self::Conquest => Some(Outcome::Land),
            Self::Raze => Some(Outcome::Raze),
            Self::Massacre => Some(Outcome::Massacre),
            Self::Plunder => Some(Outcome::Plunder),
            Self::FailedAttack => Some(Outcome::Fail),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Attack record ────────────────────────────────────────────────────────

/// One classified news line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRecord {
    /// Original line text, date prefix included
    pub raw: String,
    /// The line's own date prefix, empty when it had none
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacker_province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacker_kingdom: Option<KingdomKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defender_province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defender_kingdom: Option<KingdomKey>,
    #[serde(rename = "type")]
    pub outcome: Outcome,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acres: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kills: Option<u32>,
    /// Ordering value: calendar tick plus a fractional in-day position
    pub tick: f64,
}

impl AttackRecord {
    /// `false` when the coarse outcome contradicts the category.
    pub fn type_agrees_with_category(&self) -> bool {
        match self.category.expected_outcome() {
            Some(expected) => expected == self.outcome,
            None => true,
        }
    }
}

// ── Province ledger ──────────────────────────────────────────────────────

/// Net acreage and hit counts for one province within one kingdom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceLedgerEntry {
    pub province: String,
    pub acres: i64,
    pub times_attacking: u32,
    pub times_defending: u32,
}

impl ProvinceLedgerEntry {
    pub fn new(province: impl Into<String>) -> Self {
        Self {
            province: province.into(),
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: &ProvinceLedgerEntry) {
        self.acres += other.acres;
        self.times_attacking += other.times_attacking;
        self.times_defending += other.times_defending;
    }
}
