// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Classification Policy
//!
//! Total-ordered hierarchy of classification levels and the dominance rule
//! that gates every encrypt/decrypt decision in the wallet.
//!
//! ```text
//! UNCLASSIFIED (0) < CONFIDENTIAL (1) < SECRET (2) < TOP_SECRET (3)
//! ```
//!
//! A reader may access content iff `reader >= content`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal classification tier attached to a clearance or to content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationLevel {
    #[default]
    Unclassified = 0,
    Confidential = 1,
    Secret = 2,
    TopSecret = 3,
}

impl ClassificationLevel {
    /// All levels, lowest first.
    pub const ALL: [ClassificationLevel; 4] = [
        ClassificationLevel::Unclassified,
        ClassificationLevel::Confidential,
        ClassificationLevel::Secret,
        ClassificationLevel::TopSecret,
    ];

    /// Lenient parse. Case and separators are ignored, so `"top-secret"`,
    /// `"TOP_SECRET"` and `"topsecret"` all yield [`ClassificationLevel::TopSecret`].
    ///
    /// Unrecognized input maps to `Unclassified`. Callers that need strictness
    /// must use [`ClassificationLevel::parse_strict`] first.
    pub fn parse(raw: &str) -> Self {
        Self::parse_strict(raw).unwrap_or_else(|| {
            tracing::debug!(raw = %raw, "Unrecognized classification level, defaulting to UNCLASSIFIED");
            ClassificationLevel::Unclassified
        })
    }

    /// Like [`ClassificationLevel::parse`] but returns `None` for unknown input.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "unclassified" | "u" | "0" => Some(ClassificationLevel::Unclassified),
            "confidential" | "c" | "1" => Some(ClassificationLevel::Confidential),
            "secret" | "s" | "2" => Some(ClassificationLevel::Secret),
            "topsecret" | "ts" | "3" => Some(ClassificationLevel::TopSecret),
            _ => None,
        }
    }

    /// `true` iff a holder of `self` may read content classified at `content`.
    pub fn dominates(self, content: ClassificationLevel) -> bool {
        self >= content
    }

    /// Levels satisfiable by this clearance, from `self` down to `Unclassified`.
    pub fn accessible_levels(self) -> Vec<ClassificationLevel> {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .filter(|level| self.dominates(*level))
            .collect()
    }

    /// Canonical wire label (`"TOP_SECRET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationLevel::Unclassified => "UNCLASSIFIED",
            ClassificationLevel::Confidential => "CONFIDENTIAL",
            ClassificationLevel::Secret => "SECRET",
            ClassificationLevel::TopSecret => "TOP_SECRET",
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ClassificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-function form of [`ClassificationLevel::dominates`].
pub fn dominates(reader: ClassificationLevel, content: ClassificationLevel) -> bool {
    reader.dominates(content)
}
