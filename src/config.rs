//! Game configuration.
//!
//! A [`GameConfig`] is plain data: serde-loadable from JSON, with defaults
//! for everything so a partial file is enough.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{Color, MAX_PLAYERS, MIN_PLAYERS, PlayerKind};
use crate::GameResult;

/// One roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpec {
    /// Human or AI.
    pub kind: PlayerKind,
    /// Display colour.
    pub color: Color,
}

/// Map generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Grid width in sectors.
    pub width: u16,
    /// Grid height in sectors.
    pub height: u16,
    /// Number of landmarked sectors.
    pub landmarks: u16,
    /// Layout seed; the game seed is used when absent.
    pub seed: Option<u64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 6,
            landmarks: 8,
            seed: None,
        }
    }
}

/// How AI players pick their moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiStrategy {
    /// Random unit, random legal target.
    #[default]
    Random,
    /// Best-scoring move, random tiebreak.
    Greedy,
}

/// Configuration for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Roster, in turn order.
    pub players: Vec<PlayerSpec>,
    /// Map generation parameters.
    pub map: MapConfig,
    /// Pause between AI moves.
    pub ai_move_delay_ms: u64,
    /// AI move selection.
    pub ai_strategy: AiStrategy,
    /// Rounds between bonus objective allocations.
    pub bonus_objective_interval: u32,
    /// Stat bonus granted for winning the minigame.
    pub minigame_reward: i32,
    /// Level of freshly spawned units.
    pub unit_level: i32,
    /// Turn limit for headless runs.
    pub max_turns: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: (0..4)
                .map(|i| PlayerSpec {
                    kind: PlayerKind::Ai,
                    color: Color::PALETTE[i],
                })
                .collect(),
            map: MapConfig::default(),
            ai_move_delay_ms: 300,
            ai_strategy: AiStrategy::default(),
            bonus_objective_interval: 3,
            minigame_reward: 1,
            unit_level: 1,
            max_turns: 500,
        }
    }
}

impl GameConfig {
    /// An all-AI roster of `count` players with palette colours.
    #[must_use]
    pub fn with_ai_players(count: usize) -> Self {
        Self {
            players: Color::PALETTE
                .iter()
                .cycle()
                .take(count)
                .map(|&color| PlayerSpec {
                    kind: PlayerKind::Ai,
                    color,
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Read a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the result
    /// fails [`GameConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players.len()) {
            return Err(ConfigError::InvalidRosterSize {
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
                got: self.players.len(),
            });
        }
        if self.map.width == 0 || self.map.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "map must be at least 1x1, got {}x{}",
                self.map.width, self.map.height
            )));
        }
        let sectors = u32::from(self.map.width) * u32::from(self.map.height);
        if sectors > u32::from(u16::MAX) {
            return Err(ConfigError::Invalid(format!("map has too many sectors: {sectors}")));
        }
        if usize::from(self.map.landmarks) < self.players.len() {
            return Err(ConfigError::NotEnoughLandmarks {
                players: self.players.len(),
                landmarks: usize::from(self.map.landmarks),
            });
        }
        if u32::from(self.map.landmarks) >= sectors {
            return Err(ConfigError::Invalid(format!(
                "{} landmarks leave no room for the bonus objective on {sectors} sectors",
                self.map.landmarks
            )));
        }
        if self.bonus_objective_interval == 0 {
            return Err(ConfigError::Invalid(
                "bonus_objective_interval must be at least 1".to_string(),
            ));
        }
        if self.unit_level < 1 {
            return Err(ConfigError::Invalid(format!(
                "unit_level must be at least 1, got {}",
                self.unit_level
            )));
        }
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("max_turns must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.players.len(), 4);
        assert!(config.players.iter().all(|p| p.kind == PlayerKind::Ai));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_roster_size() {
        let config = GameConfig::with_ai_players(9);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRosterSize { got: 9, .. })
        ));
    }

    #[test]
    fn test_validate_landmarks() {
        let mut config = GameConfig::default();
        config.map.landmarks = 3;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotEnoughLandmarks {
                players: 4,
                landmarks: 3
            })
        );

        config.map = MapConfig {
            width: 2,
            height: 2,
            landmarks: 4,
            seed: None,
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "ai_strategy": "greedy", "map": { "width": 10 } }"#).unwrap();
        assert_eq!(config.ai_strategy, AiStrategy::Greedy);
        assert_eq!(config.map.width, 10);
        assert_eq!(config.map.height, 6);
        assert_eq!(config.max_turns, 500);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "players": [
                {{ "kind": "human", "color": {{ "r": 1, "g": 2, "b": 3 }} }},
                {{ "kind": "ai", "color": {{ "r": 4, "g": 5, "b": 6 }} }}
            ] }}"#
        )
        .unwrap();

        let config = GameConfig::load(file.path()).unwrap();
        assert_eq!(config.players[0].kind, PlayerKind::Human);
        assert_eq!(config.players[1].color, Color::rgb(4, 5, 6));
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_turns": 0 }}"#).unwrap();
        assert!(GameConfig::load(file.path()).is_err());
    }
}
