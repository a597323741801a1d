//! Static assistant catalog and the per-section purchase ladder.

use crate::storage::{purchase_key, KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Basic,
    Smart,
    Pro,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Smart, Tier::Pro];

    /// 1-based; rank 0 means nothing purchased.
    pub fn rank(self) -> u8 {
        match self {
            Tier::Basic => 1,
            Tier::Smart => 2,
            Tier::Pro => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Basic => "Basic",
            Tier::Smart => "Smart",
            Tier::Pro => "Pro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Tier::Basic),
            "smart" => Ok(Tier::Smart),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("Unknown tier: {other}")),
        }
    }
}

pub fn rank_of(tier: Option<Tier>) -> u8 {
    tier.map(Tier::rank).unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallToAction {
    Buy,
    Upgrade,
    Open,
    Included,
}

impl CallToAction {
    pub fn label(self) -> &'static str {
        match self {
            CallToAction::Buy => "Buy",
            CallToAction::Upgrade => "Upgrade",
            CallToAction::Open => "Open",
            CallToAction::Included => "Included",
        }
    }

    /// Whether activating this action records a purchase.
    pub fn purchases(self) -> bool {
        matches!(self, CallToAction::Buy | CallToAction::Upgrade)
    }
}

pub fn call_to_action(purchased: Option<Tier>, tier: Tier) -> CallToAction {
    let purchased = rank_of(purchased);
    let tier = tier.rank();
    if purchased == 0 {
        CallToAction::Buy
    } else if purchased < tier {
        CallToAction::Upgrade
    } else if purchased == tier {
        CallToAction::Open
    } else {
        CallToAction::Included
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub section: &'static str,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assistant {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub requires: Option<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub key: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
}

const fn requires(section: &'static str, tier: Tier) -> Option<Requirement> {
    Some(Requirement { section, tier })
}

pub static SECTIONS: &[Section] = &[
    Section {
        key: "pregnancy",
        title: "Calm pregnancy",
        subtitle: "Feelings, body changes and family during pregnancy",
    },
    Section {
        key: "newborn",
        title: "Our first days together",
        subtitle: "Sleep, routine and everyday care in the first year",
    },
];

pub static ASSISTANTS: &[Assistant] = &[
    Assistant {
        slug: "pregnancy_calm",
        title: "Calm pregnancy",
        description: "Gentle prompts and a way to untangle anxious thoughts.",
        requires: requires("pregnancy", Tier::Basic),
    },
    Assistant {
        slug: "pregnancy_emotions",
        title: "Emotional support in pregnancy",
        description: "Helps with worries, fears and mood swings.",
        requires: requires("pregnancy", Tier::Smart),
    },
    Assistant {
        slug: "pregnancy_body",
        title: "Body changes and wellbeing",
        description: "What is happening at each stage and when to see a doctor.",
        requires: requires("pregnancy", Tier::Smart),
    },
    Assistant {
        slug: "pregnancy_family",
        title: "Relationships and boundaries",
        description: "Talking with a partner, parents and the people around you.",
        requires: requires("pregnancy", Tier::Pro),
    },
    Assistant {
        slug: "newborn_sleep",
        title: "Our first days together",
        description: "Support and everyday guidance in the first weeks with a newborn.",
        requires: requires("newborn", Tier::Basic),
    },
    Assistant {
        slug: "routine_0_1",
        title: "Routine 0-1",
        description: "Sleep, feeding, calm rituals and household tips.",
        requires: requires("newborn", Tier::Smart),
    },
    Assistant {
        slug: "care_basics",
        title: "Care without panic",
        description: "Bathing, washing and dressing for the weather, without scare stories.",
        requires: requires("newborn", Tier::Pro),
    },
];

pub fn section(key: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|s| s.key == key)
}

pub fn assistant(slug: &str) -> Option<&'static Assistant> {
    ASSISTANTS.iter().find(|a| a.slug == slug)
}

/// Assistants a tier unlocks in its section, lower tiers included.
pub fn tier_assistants(section_key: &str, tier: Tier) -> Vec<&'static Assistant> {
    ASSISTANTS
        .iter()
        .filter(|a| match a.requires {
            Some(req) => req.section == section_key && req.tier <= tier,
            None => false,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TierOffer {
    pub tier: Tier,
    pub action: CallToAction,
    pub assistant_titles: Vec<&'static str>,
    pub unlock_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionOffer {
    pub section: &'static Section,
    pub purchased: Option<Tier>,
    pub tiers: Vec<TierOffer>,
}

#[derive(Debug, Clone)]
pub struct Activation {
    pub section: &'static Section,
    pub tier: Tier,
    pub action: CallToAction,
    pub unlocked: Vec<&'static Assistant>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Highest purchased tier per section. Only ever raised.
#[derive(Clone)]
pub struct PurchaseLedger {
    store: Arc<dyn KeyValueStore>,
}

impl PurchaseLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn purchased(&self, section_key: &str) -> Result<Option<Tier>, StorageError> {
        let raw = self.store.get(&purchase_key(section_key))?;
        Ok(raw.and_then(|value| match value.parse::<Tier>() {
            Ok(tier) => Some(tier),
            Err(_) => {
                tracing::warn!(section = section_key, value = %value, "ignoring unreadable purchase record");
                None
            }
        }))
    }

    pub fn purchased_rank(&self, section_key: &str) -> Result<u8, StorageError> {
        Ok(rank_of(self.purchased(section_key)?))
    }

    pub fn offers(&self) -> Result<Vec<SectionOffer>, StorageError> {
        SECTIONS
            .iter()
            .map(|section| -> Result<SectionOffer, StorageError> {
                let purchased = self.purchased(section.key)?;
                let tiers = Tier::ALL
                    .iter()
                    .map(|&tier| {
                        let assistant_titles: Vec<&'static str> = tier_assistants(section.key, tier)
                            .iter()
                            .map(|a| a.title)
                            .collect();
                        TierOffer {
                            tier,
                            action: call_to_action(purchased, tier),
                            unlock_count: assistant_titles.len(),
                            assistant_titles,
                        }
                    })
                    .collect();
                Ok(SectionOffer {
                    section,
                    purchased,
                    tiers,
                })
            })
            .collect()
    }

    /// Applies the tier's call-to-action: Buy and Upgrade record the tier,
    /// Open and Included only reveal the list.
    pub fn activate(&self, section_key: &str, tier: Tier) -> Result<Activation, CatalogError> {
        let section =
            section(section_key).ok_or_else(|| CatalogError::UnknownSection(section_key.into()))?;
        let purchased = self.purchased(section.key)?;
        let action = call_to_action(purchased, tier);

        if action.purchases() {
            self.store.set(&purchase_key(section.key), tier.name())?;
            tracing::info!(section = section.key, tier = %tier, action = action.label(), "tier purchased");
        }

        Ok(Activation {
            section,
            tier,
            action,
            unlocked: tier_assistants(section.key, tier),
        })
    }

    pub fn is_unlocked(&self, assistant: &Assistant) -> Result<bool, StorageError> {
        match assistant.requires {
            None => Ok(true),
            Some(req) => Ok(self.purchased_rank(req.section)? >= req.tier.rank()),
        }
    }

    /// Every assistant the purchases so far give access to.
    pub fn unlocked_assistants(&self) -> Result<Vec<&'static Assistant>, StorageError> {
        let mut unlocked = Vec::new();
        for assistant in ASSISTANTS {
            if self.is_unlocked(assistant)? {
                unlocked.push(assistant);
            }
        }
        Ok(unlocked)
    }
}
