//! Hex patterns over the 40 nibbles of a Safe address.

use std::fmt;

use crate::config::ConfigError;
use crate::crypto::Address;

const ADDRESS_NIBBLES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternType {
    #[default]
    Prefix,
    Suffix,
    Contains,
    PrefixAndSuffix,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatternType::Prefix => "prefix",
            PatternType::Suffix => "suffix",
            PatternType::Contains => "contains",
            PatternType::PrefixAndSuffix => "prefix+suffix",
        })
    }
}

/// A validated pattern. `head` is the prefix, suffix or needle; `tail` is
/// only used by `PrefixAndSuffix`.
#[derive(Debug, Clone)]
pub struct Pattern {
    kind: PatternType,
    case_sensitive: bool,
    head: String,
    tail: String,
    head_nibbles: Vec<u8>,
    tail_nibbles: Vec<u8>,
}

impl Pattern {
    pub fn new(
        text: impl Into<String>,
        kind: PatternType,
        case_sensitive: bool,
    ) -> Result<Self, ConfigError> {
        if kind == PatternType::PrefixAndSuffix {
            return Err(ConfigError::InvalidPattern(
                "prefix+suffix patterns need both parts (use Pattern::prefix_and_suffix)".into(),
            ));
        }
        Self::build(kind, case_sensitive, text.into(), String::new())
    }

    pub fn prefix_and_suffix(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        case_sensitive: bool,
    ) -> Result<Self, ConfigError> {
        let suffix = suffix.into();
        if suffix.is_empty() {
            return Err(ConfigError::InvalidPattern("Suffix pattern cannot be empty".into()));
        }
        Self::build(PatternType::PrefixAndSuffix, case_sensitive, prefix.into(), suffix)
    }

    fn build(
        kind: PatternType,
        case_sensitive: bool,
        head: String,
        tail: String,
    ) -> Result<Self, ConfigError> {
        if head.is_empty() {
            return Err(ConfigError::InvalidPattern("Pattern cannot be empty".into()));
        }
        let head_nibbles = nibbles(&head)?;
        let tail_nibbles = nibbles(&tail)?;
        if head_nibbles.len() + tail_nibbles.len() > ADDRESS_NIBBLES {
            return Err(ConfigError::InvalidPattern(
                "Combined pattern cannot be longer than 40 characters (full address)".into(),
            ));
        }
        let fold = |s: String| if case_sensitive { s } else { s.to_lowercase() };
        Ok(Self {
            kind,
            case_sensitive,
            head: fold(head),
            tail: fold(tail),
            head_nibbles,
            tail_nibbles,
        })
    }

    pub fn pattern_type(&self) -> PatternType {
        self.kind
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Nibbles are compared first; for case-sensitive patterns the EIP-55
    /// casing is checked only once they already agree.
    #[inline]
    pub fn is_match(&self, address: &Address) -> bool {
        let mut nibbles = [0u8; ADDRESS_NIBBLES];
        for (i, byte) in address.as_bytes().iter().enumerate() {
            nibbles[2 * i] = byte >> 4;
            nibbles[2 * i + 1] = byte & 0x0f;
        }
        if !self.test(&nibbles, &self.head_nibbles, &self.tail_nibbles) {
            return false;
        }
        if !self.case_sensitive {
            return true;
        }
        let checksum = address.to_checksum();
        self.test(&checksum.as_bytes()[2..], self.head.as_bytes(), self.tail.as_bytes())
    }

    #[inline]
    fn test(&self, hay: &[u8], head: &[u8], tail: &[u8]) -> bool {
        match self.kind {
            PatternType::Prefix => hay.starts_with(head),
            PatternType::Suffix => hay.ends_with(head),
            PatternType::Contains => hay.windows(head.len()).any(|w| w == head),
            PatternType::PrefixAndSuffix => hay.starts_with(head) && hay.ends_with(tail),
        }
    }

    /// Constrained nibbles across both parts.
    pub fn len(&self) -> usize {
        self.head_nibbles.len() + self.tail_nibbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expected attempts per match: `16^len`, doubled for every letter whose
    /// checksum casing must also agree.
    pub fn estimated_difficulty(&self) -> u64 {
        let letters = if self.case_sensitive {
            (self.head.bytes().chain(self.tail.bytes()))
                .filter(u8::is_ascii_alphabetic)
                .count()
        } else {
            0
        };
        16u64
            .saturating_pow(self.len() as u32)
            .saturating_mul(2u64.saturating_pow(letters as u32))
    }

    pub fn difficulty_description(&self) -> String {
        let label = match self.estimated_difficulty() {
            0..=1_000 => "Very Easy (< 1 second)",
            1_001..=100_000 => "Easy (seconds)",
            100_001..=10_000_000 => "Medium (minutes)",
            10_000_001..=1_000_000_000 => "Hard (hours)",
            _ => "Very Hard (days or more)",
        };
        format!("{label}, ~1 in {}", self.estimated_difficulty())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PatternType::PrefixAndSuffix => write!(f, "{}...{} ({})", self.head, self.tail, self.kind),
            _ => write!(f, "{} ({})", self.head, self.kind),
        }
    }
}

fn nibbles(part: &str) -> Result<Vec<u8>, ConfigError> {
    part.chars()
        .map(|c| {
            c.to_digit(16).map(|d| d as u8).ok_or_else(|| {
                ConfigError::InvalidPattern(format!(
                    "{part:?} contains non-hex character {c:?} (only 0-9, a-f allowed)"
                ))
            })
        })
        .collect()
}
