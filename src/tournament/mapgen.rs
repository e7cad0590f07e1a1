//! Deterministic map generation for tournaments.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::config::MapConfig;
use crate::effect::Resource;
use crate::error::ConfigError;
use crate::game::{Coord, Landmark, MapLayout, SectorId, SectorLayout};

/// Generate a rectangular grid of sectors with 4-neighbour adjacency.
///
/// Sector ids run row by row. `config.landmarks` distinct sectors carry a
/// landmark; resources alternate Attack/Defence in id order and amounts are
/// drawn from `1..=3`. The same config always yields the same layout.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the grid is empty, too large for a
/// [`SectorId`], or has fewer sectors than landmarks.
pub fn generate_layout(config: &MapConfig) -> Result<MapLayout, ConfigError> {
    let (width, height) = (config.width, config.height);
    if width == 0 || height == 0 {
        return Err(ConfigError::Invalid(format!(
            "map must be at least 1x1, got {width}x{height}"
        )));
    }
    let count = usize::from(width) * usize::from(height);
    if count > usize::from(SectorId::MAX) {
        return Err(ConfigError::Invalid(format!(
            "map of {count} sectors exceeds {}",
            SectorId::MAX
        )));
    }
    let landmarks = usize::from(config.landmarks);
    if landmarks > count {
        return Err(ConfigError::Invalid(format!(
            "{landmarks} landmarks do not fit on {count} sectors"
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));
    let mut sectors: Vec<SectorLayout> = (0..height)
        .flat_map(|y| (0..width).map(move |x| Coord::new(x, y)))
        .map(|coord| {
            let (neighbours, n) = coord.adjacent(width, height);
            SectorLayout {
                adjacent: neighbours[..usize::from(n)]
                    .iter()
                    .map(|c| c.y * width + c.x)
                    .collect(),
                landmark: None,
            }
        })
        .collect();

    let mut picked = index::sample(&mut rng, count, landmarks).into_vec();
    picked.sort_unstable();
    for (i, idx) in picked.into_iter().enumerate() {
        let resource = if i % 2 == 0 {
            Resource::Attack
        } else {
            Resource::Defence
        };
        sectors[idx].landmark = Some(Landmark {
            resource,
            amount: rng.random_range(1..=3),
        });
    }

    Ok(MapLayout {
        columns: width,
        sectors,
    })
}
