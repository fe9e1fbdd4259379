//! Closed skill taxonomy used by the readiness rules.

use rustc_hash::FxHashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{RotaError, RotaResult};

/// A qualification tag. Matching is case-sensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkillTag {
    /// Officer in charge (Take The Role)
    Ttr,
    /// Large goods vehicle driver
    Lgv,
    /// Breathing apparatus wearer
    Ba,
    /// Emergency response driver
    Erd,
    /// Incident command
    Ic,
}

impl SkillTag {
    pub const ALL: [SkillTag; 5] = [Self::Ttr, Self::Lgv, Self::Ba, Self::Erd, Self::Ic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ttr => "TTR",
            Self::Lgv => "LGV",
            Self::Ba => "BA",
            Self::Erd => "ERD",
            Self::Ic => "IC",
        }
    }
}

impl fmt::Display for SkillTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillTag {
    type Err = RotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| RotaError::UnknownSkillTag(s.to_string()))
    }
}

/// The set of tags one person holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkillSet {
    tags: FxHashSet<SkillTag>,
}

/// Result of lenient parsing: recognised tags plus the tokens that were not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedSkills {
    pub skills: SkillSet,
    pub unrecognised: Vec<String>,
}

impl SkillSet {
    /// Parse a space-delimited tag list, rejecting unknown tokens.
    pub fn parse(s: &str) -> RotaResult<Self> {
        s.split_whitespace()
            .map(SkillTag::from_str)
            .collect::<RotaResult<FxHashSet<_>>>()
            .map(|tags| Self { tags })
    }

    /// Parse a space-delimited tag list, setting unknown tokens aside.
    pub fn parse_lenient(s: &str) -> ParsedSkills {
        let mut parsed = ParsedSkills::default();
        for token in s.split_whitespace() {
            match token.parse::<SkillTag>() {
                Ok(tag) => {
                    parsed.skills.tags.insert(tag);
                }
                Err(_) => parsed.unrecognised.push(token.to_string()),
            }
        }
        parsed
    }

    pub fn contains(&self, tag: SkillTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn contains_any(&self, tags: &[SkillTag]) -> bool {
        tags.iter().any(|tag| self.contains(*tag))
    }

    pub fn remove(&mut self, tag: SkillTag) -> bool {
        self.tags.remove(&tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<SkillTag> for SkillSet {
    fn from_iter<T: IntoIterator<Item = SkillTag>>(iter: T) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for SkillSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<SkillTag> = self.tags.iter().copied().collect();
        tags.sort();
        let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
        f.write_str(&names.join(" "))
    }
}
