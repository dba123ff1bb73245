//! Line classification.
//!
//! A news line is reduced to a set of keyword [`Signal`]s, and the signals
//! are run through two independent ladders: [`CATEGORY_RULES`] (the
//! authoritative fine-grained label) and [`outcome_for`] (the coarse
//! legacy outcome). Phrasings overlap (an ambush line also says
//! "captured"), so both ladders are strictly first-match-wins.

use std::sync::LazyLock;

use news_types::{Category, Outcome};
use regex::Regex;

use crate::calendar::split_date_prefix;

// ── Signals ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Invaded,
    Attacked,
    Looted,
    Captured,
    Razed,
    Killed,
    Ambushed,
    Attempted,
    Recaptured,
    Pillaged,
    Dragon,
    WarDeclaration,
    Ceasefire,
    AidShipment,
    Defection,
    Collapse,
    // Qualifiers: only meaningful next to an event signal.
    ToUs,
    Begun,
    WeDeclared,
    Withdraw,
    ConquestShape,
}

impl Signal {
    /// Qualifiers alone never make a line worth keeping.
    pub fn is_event(&self) -> bool {
        !matches!(
            self,
            Self::ToUs | Self::Begun | Self::WeDeclared | Self::Withdraw | Self::ConquestShape
        )
    }
}

static SIGNAL_PATTERNS: LazyLock<Vec<(Signal, Regex)>> = LazyLock::new(|| {
    [
        (Signal::Invaded, r"\binvaded\b"),
        (Signal::Attacked, r"\battacked\b"),
        (Signal::Looted, r"\b(?:looted|stole|stolen)\b"),
        // \b keeps "recaptured" out of this one
        (Signal::Captured, r"\bcaptured\b"),
        (Signal::Razed, r"\brazed\b"),
        (Signal::Killed, r"\bkilled\b"),
        (Signal::Ambushed, r"\bambush(?:ed)?\b"),
        (Signal::Attempted, r"\battempted\b"),
        (Signal::Recaptured, r"\brecaptured\b"),
        (Signal::Pillaged, r"\b(?:pillaged|plundered)\b"),
        (Signal::Dragon, r"\bdragons?\b"),
        (Signal::WarDeclaration, r"\bdeclared\b.*\bwar\b"),
        (Signal::Ceasefire, r"\bcease-?\s?fire\b"),
        (Signal::AidShipment, r"\baid\s+shipment|\bsent\s+(?:some\s+)?aid\b"),
        (Signal::Defection, r"\bdefected\b"),
        (Signal::Collapse, r"\bcollapsed\b|\blies\s+in\s+ruins?\b|\bin\s+ruins\b"),
        (Signal::ToUs, r"\bto\s+us\b"),
        (Signal::Begun, r"\bbegun\b"),
        (Signal::WeDeclared, r"\bwe\s+(?:have\s+)?declared\b"),
        (Signal::Withdraw, r"\bwithdr(?:aw|ew)\w*"),
        (Signal::ConquestShape, r",\s*captured\s+\d"),
    ]
    .into_iter()
    .map(|(signal, pattern)| (signal, Regex::new(&format!("(?i){pattern}")).unwrap()))
    .collect()
});

/// The set of signals present on one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals(u32);

impl Signals {
    pub fn detect(text: &str) -> Self {
        let mut signals = Self::default();
        for (signal, re) in SIGNAL_PATTERNS.iter() {
            if re.is_match(text) {
                signals.0 |= 1 << *signal as u32;
            }
        }
        signals
    }

    pub fn has(self, signal: Signal) -> bool {
        self.0 & (1 << signal as u32) != 0
    }

    pub fn any_event(self) -> bool {
        SIGNAL_PATTERNS
            .iter()
            .any(|(signal, _)| signal.is_event() && self.has(*signal))
    }
}

// ── Category ladder ──────────────────────────────────────────────────────

pub struct CategoryRule {
    pub name: &'static str,
    pub applies: fn(Signals) -> bool,
    pub category: fn(Signals) -> Category,
}

/// Evaluated top to bottom; the first rule that applies decides.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        name: "collapse",
        applies: |s| s.has(Signal::Collapse),
        category: |_| Category::Killed,
    },
    CategoryRule {
        name: "defection",
        applies: |s| s.has(Signal::Defection),
        category: |s| {
            if s.has(Signal::ToUs) {
                Category::DefectedIn
            } else {
                Category::DefectedOut
            }
        },
    },
    CategoryRule {
        name: "aid",
        applies: |s| s.has(Signal::AidShipment),
        category: |_| Category::Aid,
    },
    CategoryRule {
        name: "dragon",
        applies: |s| s.has(Signal::Dragon),
        category: |s| {
            if s.has(Signal::Begun) {
                Category::StartingDragon
            } else {
                Category::DragonUpdate
            }
        },
    },
    CategoryRule {
        name: "war",
        applies: |s| s.has(Signal::WarDeclaration),
        category: |s| {
            if s.has(Signal::WeDeclared) {
                Category::WarDeclaration
            } else {
                Category::EnemyDeclaration
            }
        },
    },
    CategoryRule {
        name: "ceasefire",
        applies: |s| s.has(Signal::Ceasefire),
        category: |s| {
            if s.has(Signal::Withdraw) {
                Category::WithdrewProposal
            } else {
                Category::Ceasefire
            }
        },
    },
    CategoryRule {
        name: "recapture",
        applies: |s| s.has(Signal::Recaptured) || s.has(Signal::Ambushed),
        category: |_| Category::Ambush,
    },
    CategoryRule {
        name: "pillage",
        applies: |s| s.has(Signal::Pillaged),
        category: |_| Category::Plunder,
    },
    CategoryRule {
        name: "loot",
        applies: |s| s.has(Signal::Looted) && !s.has(Signal::Captured),
        category: |_| Category::Learn,
    },
    CategoryRule {
        name: "raze",
        applies: |s| s.has(Signal::Razed),
        category: |_| Category::Raze,
    },
    CategoryRule {
        name: "capture",
        applies: |s| s.has(Signal::Captured),
        category: |s| {
            if s.has(Signal::ConquestShape) {
                Category::Conquest
            } else {
                Category::TraditionalMarch
            }
        },
    },
    CategoryRule {
        name: "massacre",
        applies: |s| s.has(Signal::Killed) && !s.has(Signal::Captured) && !s.has(Signal::Razed),
        category: |_| Category::Massacre,
    },
    CategoryRule {
        name: "failed",
        applies: |s| s.has(Signal::Attempted),
        category: |_| Category::FailedAttack,
    },
];

/// The category and the name of the rule that chose it; `"other"` when
/// nothing applied.
pub fn category_for(signals: Signals) -> (Category, &'static str) {
    CATEGORY_RULES
        .iter()
        .find(|rule| (rule.applies)(signals))
        .map(|rule| ((rule.category)(signals), rule.name))
        .unwrap_or((Category::Other, "other"))
}

// ── Outcome ladder ───────────────────────────────────────────────────────

/// fail > raze > plunder > land > massacre > other
pub fn outcome_for(signals: Signals) -> Outcome {
    if signals.has(Signal::Attempted) && !signals.has(Signal::Captured) {
        Outcome::Fail
    } else if signals.has(Signal::Razed) {
        Outcome::Raze
    } else if signals.has(Signal::Pillaged) {
        Outcome::Plunder
    } else if signals.has(Signal::Captured) || signals.has(Signal::Recaptured) {
        Outcome::Land
    } else if signals.has(Signal::Killed) {
        Outcome::Massacre
    } else {
        Outcome::Other
    }
}

// ── Entry point ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub outcome: Outcome,
    pub rule: &'static str,
}

/// Classify one line. `None` for bare date separators and for lines that
/// carry no combat, diplomatic, dragon or aid signal.
pub fn classify(line: &str) -> Option<Classification> {
    classify_text(split_date_prefix(line).text)
}

/// Same as [`classify`] for text whose date prefix is already stripped.
pub fn classify_text(text: &str) -> Option<Classification> {
    if text.is_empty() {
        return None;
    }
    let signals = Signals::detect(text);
    if !signals.any_event() {
        return None;
    }
    let (category, rule) = category_for(signals);
    Some(Classification {
        category,
        outcome: outcome_for(signals),
        rule,
    })
}
