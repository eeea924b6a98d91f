use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StatsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Religion {
    All,
    Jewish,
    Muslim,
    Druze,
    Christian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    All,
    Men,
    Women,
}

impl Religion {
    /// Output order of the religion axis.
    pub const ORDER: [Religion; 5] = [
        Religion::All,
        Religion::Jewish,
        Religion::Muslim,
        Religion::Druze,
        Religion::Christian,
    ];

    #[inline]
    pub const fn bits(self) -> u8 {
        match self {
            Religion::Jewish => 4,
            Religion::Muslim => 8,
            Religion::Christian => 16,
            Religion::Druze => 32,
            Religion::All => 0b111100,
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Religion::All => "all",
            Religion::Jewish => "jewish",
            Religion::Muslim => "muslim",
            Religion::Druze => "druze",
            Religion::Christian => "christian",
        }
    }

    /// Position in `ORDER`.
    #[inline]
    pub const fn rank(self) -> usize {
        match self {
            Religion::All => 0,
            Religion::Jewish => 1,
            Religion::Muslim => 2,
            Religion::Druze => 3,
            Religion::Christian => 4,
        }
    }

    #[inline]
    fn covers(self, other: Religion) -> bool {
        self == Religion::All || self == other
    }
}

impl Gender {
    /// Output order of the gender axis.
    pub const ORDER: [Gender; 3] = [Gender::All, Gender::Men, Gender::Women];

    #[inline]
    pub const fn bits(self) -> u8 {
        match self {
            Gender::Men => 1,
            Gender::Women => 2,
            Gender::All => 0b11,
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Gender::All => "all",
            Gender::Men => "men",
            Gender::Women => "women",
        }
    }

    /// Position in `ORDER`.
    #[inline]
    pub const fn rank(self) -> usize {
        match self {
            Gender::All => 0,
            Gender::Men => 1,
            Gender::Women => 2,
        }
    }

    #[inline]
    fn covers(self, other: Gender) -> bool {
        self == Gender::All || self == other
    }
}

impl FromStr for Religion {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        Religion::ORDER
            .into_iter()
            .find(|r| r.slug().eq_ignore_ascii_case(label))
            .ok_or_else(|| StatsError::UnknownReligion(label.to_string()))
    }
}

impl FromStr for Gender {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        Gender::ORDER
            .into_iter()
            .find(|g| g.slug().eq_ignore_ascii_case(label))
            .ok_or_else(|| StatsError::UnknownGender(label.to_string()))
    }
}

/// A (religion, gender) pair. Either axis may be `All` when used as a query
/// target; records always carry a concrete pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Demographic {
    pub religion: Religion,
    pub gender: Gender,
}

impl Demographic {
    pub const fn new(religion: Religion, gender: Gender) -> Self {
        Self { religion, gender }
    }

    /// Builds a record demographic, rejecting the `All` sentinel on either axis.
    pub fn concrete(religion: Religion, gender: Gender) -> Result<Self> {
        let d = Self::new(religion, gender);
        if !d.is_concrete() {
            return Err(StatsError::NotConcrete(format!("{d} (code {})", d.code())));
        }
        Ok(d)
    }

    /// Parses the gender and religion labels of a source row.
    pub fn parse_concrete(gender: &str, religion: &str) -> Result<Self> {
        Self::concrete(religion.parse()?, gender.parse()?)
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self.religion.bits() | self.gender.bits()
    }

    #[inline]
    pub fn is_concrete(self) -> bool {
        self.religion != Religion::All && self.gender != Gender::All
    }

    /// True iff this concrete demographic belongs to `target`. Same result as
    /// `self.code() & target.code() == self.code()`.
    #[inline]
    pub fn matches(self, target: Demographic) -> bool {
        target.religion.covers(self.religion) && target.gender.covers(self.gender)
    }

    /// Every target in output order: religions outer, genders inner.
    pub fn targets() -> impl Iterator<Item = Demographic> {
        Religion::ORDER
            .into_iter()
            .cartesian_product(Gender::ORDER)
            .map(|(r, g)| Demographic::new(r, g))
    }

    /// Dense index of this target in `targets()` order.
    #[inline]
    pub const fn index(self) -> usize {
        self.religion.rank() * Gender::ORDER.len() + self.gender.rank()
    }

    pub const COUNT: usize = Religion::ORDER.len() * Gender::ORDER.len();
}

impl fmt::Display for Demographic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.religion.slug(), self.gender.slug())
    }
}
