//! AI configuration

use crate::eval::Heuristics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AI strength
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Mostly random, occasionally takes or blocks a board
    Easy,
    /// Single-ply weighted heuristic
    #[default]
    Medium,
    /// Alpha-beta minimax over the meta board
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => f.pad("easy"),
            Difficulty::Medium => f.pad("medium"),
            Difficulty::Hard => f.pad("hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}' (expected easy, medium or hard)", other)),
        }
    }
}

/// AI configuration for game playing
#[derive(Clone, Debug)]
pub struct AiConfig {
    /// Strength tier
    pub difficulty: Difficulty,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Delay before the AI's move is applied, so it reads as a turn
    pub think_delay_ms: u64,
    /// Weights for move scoring
    pub heuristics: Heuristics,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            seed: None,
            think_delay_ms: 300,
            heuristics: Heuristics::default(),
        }
    }
}

impl AiConfig {
    /// Create config for the given difficulty
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Default::default()
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set think delay
    pub fn with_think_delay(mut self, millis: u64) -> Self {
        self.think_delay_ms = millis;
        self
    }

    /// Set custom heuristics
    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.seed, None);
        assert_eq!(config.think_delay_ms, 300);
    }

    #[test]
    fn test_ai_config_builders() {
        let config = AiConfig::new(Difficulty::Hard).with_seed(7).with_think_delay(0);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.think_delay_ms, 0);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert!("brutal".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Medium.to_string(), "medium");
    }
}
