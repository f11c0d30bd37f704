use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::BaseOutState;

/// Where the batter or a runner ended up after a play.
///
/// The numeric codes follow the play-by-play schema: 0 is out or no tracked
/// advance, 1-3 the base reached, 4 home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Destination {
    Out,
    First,
    Second,
    Third,
    Home,
}

impl Destination {
    /// The base this destination occupies, if any (1 = first, 3 = third).
    pub fn base(self) -> Option<u8> {
        match self {
            Destination::First => Some(1),
            Destination::Second => Some(2),
            Destination::Third => Some(3),
            Destination::Out | Destination::Home => None,
        }
    }

    pub fn scored(self) -> bool {
        self == Destination::Home
    }
}

impl TryFrom<u8> for Destination {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Destination::Out),
            1 => Ok(Destination::First),
            2 => Ok(Destination::Second),
            3 => Ok(Destination::Third),
            4 => Ok(Destination::Home),
            other => Err(Error::InvalidDestination(other)),
        }
    }
}

impl From<Destination> for u8 {
    fn from(dest: Destination) -> u8 {
        match dest {
            Destination::Out => 0,
            Destination::First => 1,
            Destination::Second => 2,
            Destination::Third => 3,
            Destination::Home => 4,
        }
    }
}

/// One play-by-play record, as delivered by the upstream data source.
///
/// A `Some` runner field means a runner started the play on that base and
/// carries his destination; `None` means the base was empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub game_id: String,
    /// 0 for a single game, 1 or 2 within a doubleheader.
    pub game_number: u8,
    pub inning: u8,
    pub home_batting: bool,
    pub batted_ball: bool,
    pub outs_before: u8,
    pub outs_on_play: u8,
    pub batter_dest: Destination,
    pub first_runner: Option<Destination>,
    pub second_runner: Option<Destination>,
    pub third_runner: Option<Destination>,
}

/// Identifies the half-inning a play belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HalfInningKey {
    pub game_id: String,
    pub game_number: u8,
    pub inning: u8,
    pub home_batting: bool,
}

impl PlayRecord {
    /// Base/outs state at the start of the play.
    pub fn before_state(&self) -> BaseOutState {
        let mut bases = 0u8;
        if self.first_runner.is_some() {
            bases |= 0b001;
        }
        if self.second_runner.is_some() {
            bases |= 0b010;
        }
        if self.third_runner.is_some() {
            bases |= 0b100;
        }
        BaseOutState::transient(self.outs_before, bases)
    }

    /// Base/outs state after the play. Three or more outs collapse to the
    /// absorbing state before the value is used anywhere as a lookup key.
    pub fn after_state(&self) -> BaseOutState {
        let outs = self.outs_before + self.outs_on_play;
        if outs >= 3 {
            return BaseOutState::ABSORBED;
        }
        let mut bases = 0u8;
        for target in 1..=3u8 {
            let mut occupied = self.batter_dest.base() == Some(target);
            for runner in [self.first_runner, self.second_runner, self.third_runner] {
                if let Some(dest) = runner {
                    occupied |= dest.base() == Some(target);
                }
            }
            if occupied {
                bases |= 1 << (target - 1);
            }
        }
        BaseOutState::transient(outs, bases)
    }

    pub fn transition(&self) -> (BaseOutState, BaseOutState) {
        (self.before_state(), self.after_state())
    }

    /// Runs recorded on the play, counted directly from destination codes.
    pub fn runs_scored(&self) -> u8 {
        let mut runs = u8::from(self.batter_dest.scored());
        for runner in [self.first_runner, self.second_runner, self.third_runner] {
            if let Some(dest) = runner {
                runs += u8::from(dest.scored());
            }
        }
        runs
    }

    pub fn half_inning_key(&self) -> HalfInningKey {
        HalfInningKey {
            game_id: self.game_id.clone(),
            game_number: self.game_number,
            inning: self.inning,
            home_batting: self.home_batting,
        }
    }

    /// Extra-inning plays are outside the model's input domain: inning past
    /// the ninth, or past the seventh in the second game of a doubleheader.
    pub fn is_extra_inning(&self) -> bool {
        self.inning > 9 || (self.inning > 7 && self.game_number == 2)
    }
}

/// Applies the model's input contract to a chronologically ordered record set:
/// batted-ball events only, no extra innings, and only plays from half-innings
/// that reach exactly three recorded outs.
pub fn select_model_plays(records: &[PlayRecord]) -> Vec<&PlayRecord> {
    let mut final_outs: HashMap<HalfInningKey, u8> = HashMap::new();
    for record in records {
        let outs = record.outs_before + record.outs_on_play;
        let entry = final_outs.entry(record.half_inning_key()).or_insert(0);
        *entry = (*entry).max(outs);
    }

    records
        .iter()
        .filter(|r| r.batted_ball && !r.is_extra_inning())
        .filter(|r| final_outs.get(&r.half_inning_key()) == Some(&3))
        .collect()
}

/// Splits records by the batting side: `(home, away)`.
pub fn split_by_batting_side(records: &[PlayRecord]) -> (Vec<&PlayRecord>, Vec<&PlayRecord>) {
    records.iter().partition(|r| r.home_batting)
}

/// Encodes records into (before, after) state pairs for the estimator.
pub fn encode_transitions<'a, I>(records: I) -> Vec<(BaseOutState, BaseOutState)>
where
    I: IntoIterator<Item = &'a PlayRecord>,
{
    records.into_iter().map(PlayRecord::transition).collect()
}
