//! Persistent game state.
//!
//! A [`GameSnapshot`] holds everything needed to resume a game on the same
//! map: sector ownership, units and every effect, each player's effects and
//! remaining actions, whose turn it is and the map seed. Transient state
//! (queued events, the elimination queue, scheduled tasks) is not part of
//! it. Snapshots are stored as JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::GameResult;
use crate::game::{MapSnapshot, PlayerId, PlayerSnapshot};

/// Serializable state of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Whether the game was still running.
    pub processing: bool,
    /// Sectors, units and the bonus objective timer.
    pub map: MapSnapshot,
    /// Players in roster order.
    pub players: Vec<PlayerSnapshot>,
    /// Player whose turn it is.
    pub current: PlayerId,
    /// Turn counter.
    pub turn: u32,
    /// Seed the map layout was generated from.
    pub map_seed: u64,
}

impl GameSnapshot {
    /// Encode as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid snapshot.
    pub fn from_json(json: &str) -> GameResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> GameResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a
    /// snapshot.
    pub fn load(path: &Path) -> GameResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameError;
    use crate::config::GameConfig;
    use crate::game::Game;

    fn snapshot() -> GameSnapshot {
        Game::new(GameConfig::with_ai_players(3), 9).unwrap().snapshot()
    }

    #[test]
    fn test_json_round_trip() {
        let original = snapshot();
        let json = original.to_json().unwrap();
        assert!(json.contains("\"map_seed\": 9"));
        assert_eq!(GameSnapshot::from_json(&json).unwrap(), original);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        let original = snapshot();

        original.save(&path).unwrap();
        assert_eq!(GameSnapshot::load(&path).unwrap(), original);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(GameSnapshot::load(&missing), Err(GameError::Io(_))));

        assert!(matches!(
            GameSnapshot::from_json("{\"turn\": 1}"),
            Err(GameError::Encoding(_))
        ));
    }
}
