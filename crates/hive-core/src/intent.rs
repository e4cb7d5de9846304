//! The closed intent vocabulary and the fixed set of agent roles.
//!
//! Every decision the loop emits is an [`Intent`].  External tokens enter
//! through exactly two doors:
//!
//! - [`Intent::from_str`]: strict; used for configuration, an unknown token
//!   is an error.
//! - [`Intent::parse_token`]: lenient; used at the oracle boundary, an
//!   unknown token maps to [`Intent::Idle`] so no agent is ever left without
//!   a valid intent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::HiveError;

/// The single discrete action an agent commits to for the current tick.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    #[default]
    Idle,
    Eat,
    Sleep,
    Rest,
    FleeToSafety,
    Defend,
    PatrolArea,
    GatherResources,
    Farm,
    Mine,
    Build,
    Craft,
    Trade,
    Explore,
    Socialize,
    SeekHealing,
}

impl Intent {
    /// Every variant, in declaration order.
    pub const ALL: [Intent; 16] = [
        Intent::Idle,
        Intent::Eat,
        Intent::Sleep,
        Intent::Rest,
        Intent::FleeToSafety,
        Intent::Defend,
        Intent::PatrolArea,
        Intent::GatherResources,
        Intent::Farm,
        Intent::Mine,
        Intent::Build,
        Intent::Craft,
        Intent::Trade,
        Intent::Explore,
        Intent::Socialize,
        Intent::SeekHealing,
    ];

    /// Wire token, e.g. `"FLEE_TO_SAFETY"`.
    pub fn as_token(self) -> &'static str {
        match self {
            Intent::Idle            => "IDLE",
            Intent::Eat             => "EAT",
            Intent::Sleep           => "SLEEP",
            Intent::Rest            => "REST",
            Intent::FleeToSafety    => "FLEE_TO_SAFETY",
            Intent::Defend          => "DEFEND",
            Intent::PatrolArea      => "PATROL_AREA",
            Intent::GatherResources => "GATHER_RESOURCES",
            Intent::Farm            => "FARM",
            Intent::Mine            => "MINE",
            Intent::Build           => "BUILD",
            Intent::Craft           => "CRAFT",
            Intent::Trade           => "TRADE",
            Intent::Explore         => "EXPLORE",
            Intent::Socialize       => "SOCIALIZE",
            Intent::SeekHealing     => "SEEK_HEALING",
        }
    }

    /// Lenient parse for untrusted input.  Surrounding whitespace and case
    /// are ignored; anything outside the vocabulary becomes `Idle`.
    pub fn parse_token(token: &str) -> Intent {
        Self::lookup(token).unwrap_or(Intent::Idle)
    }

    /// `true` if `token` names a vocabulary member (same normalisation as
    /// [`parse_token`](Self::parse_token)).
    pub fn is_known_token(token: &str) -> bool {
        Self::lookup(token).is_some()
    }

    fn lookup(token: &str) -> Option<Intent> {
        let normalised = token.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|i| i.as_token() == normalised)
    }

    /// Intents that protect the agent's life or meet a bodily need.
    /// Personality nudges never replace these.
    #[inline]
    pub fn is_self_preserving(self) -> bool {
        matches!(
            self,
            Intent::Eat | Intent::Sleep | Intent::Rest | Intent::FleeToSafety | Intent::SeekHealing
        )
    }
}

impl FromStr for Intent {
    type Err = HiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| HiveError::Parse(format!("unknown intent token {s:?}")))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// An agent's job in the colony.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Farmer,
    Miner,
    Builder,
    Guard,
    Explorer,
    Trader,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Farmer,
        Role::Miner,
        Role::Builder,
        Role::Guard,
        Role::Explorer,
        Role::Trader,
    ];

    /// The productive intent this role defaults to.
    pub fn work_intent(self) -> Intent {
        match self {
            Role::Farmer   => Intent::Farm,
            Role::Miner    => Intent::Mine,
            Role::Builder  => Intent::Build,
            Role::Guard    => Intent::PatrolArea,
            Role::Explorer => Intent::Explore,
            Role::Trader   => Intent::Trade,
        }
    }

    /// What the role does when nothing is queued.
    pub fn idle_intent(self) -> Intent {
        match self {
            Role::Guard  => Intent::PatrolArea,
            Role::Trader => Intent::Socialize,
            _            => Intent::Idle,
        }
    }

    /// Response to a nearby threat: guards hold the line, everyone else runs.
    pub fn threat_response(self) -> Intent {
        match self {
            Role::Guard => Intent::Defend,
            _           => Intent::FleeToSafety,
        }
    }

    /// Ordered substitutes used to break a repetition loop.  Never empty and
    /// always contains at least two distinct intents.
    pub fn alternates(self) -> &'static [Intent] {
        match self {
            Role::Farmer   => &[Intent::GatherResources, Intent::Craft, Intent::Socialize, Intent::Rest],
            Role::Miner    => &[Intent::GatherResources, Intent::Craft, Intent::Explore, Intent::Rest],
            Role::Builder  => &[Intent::GatherResources, Intent::Craft, Intent::Socialize, Intent::Rest],
            Role::Guard    => &[Intent::Explore, Intent::Socialize, Intent::Rest, Intent::PatrolArea],
            Role::Explorer => &[Intent::GatherResources, Intent::Trade, Intent::Socialize, Intent::Rest],
            Role::Trader   => &[Intent::GatherResources, Intent::Explore, Intent::Craft, Intent::Rest],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Farmer   => "farmer",
            Role::Miner    => "miner",
            Role::Builder  => "builder",
            Role::Guard    => "guard",
            Role::Explorer => "explorer",
            Role::Trader   => "trader",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
