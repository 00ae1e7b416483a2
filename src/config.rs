//! City generation configuration and builder
//!
//! This module provides configuration types for deterministic city generation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CityError, Result};

/// Advisory city size taxonomy
///
/// The generator accepts any patch count; these presets name the ranges the
/// layouts were tuned for.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitySize {
    /// 6-9 patches
    SmallTown,
    /// 10-14 patches
    LargeTown,
    /// 15-23 patches
    SmallCity,
    /// 24-39 patches
    LargeCity,
    /// 40+ patches
    Metropolis,
    /// Custom patch count
    Custom {
        /// Number of city patches to generate
        n_patches: usize,
    },
}

impl CitySize {
    /// Representative patch count for this size preset
    pub fn n_patches(self) -> usize {
        match self {
            CitySize::SmallTown => 8,
            CitySize::LargeTown => 12,
            CitySize::SmallCity => 19,
            CitySize::LargeCity => 31,
            CitySize::Metropolis => 40,
            CitySize::Custom { n_patches } => n_patches,
        }
    }

    /// Classify a patch count into the advisory taxonomy
    pub fn classify(n_patches: usize) -> CitySize {
        match n_patches {
            0..=9 => CitySize::SmallTown,
            10..=14 => CitySize::LargeTown,
            15..=23 => CitySize::SmallCity,
            24..=39 => CitySize::LargeCity,
            _ => CitySize::Metropolis,
        }
    }

    /// Human-readable name for this size
    pub fn name(self) -> &'static str {
        match self {
            CitySize::SmallTown => "Small Town",
            CitySize::LargeTown => "Large Town",
            CitySize::SmallCity => "Small City",
            CitySize::LargeCity => "Large City",
            CitySize::Metropolis => "Metropolis",
            CitySize::Custom { .. } => "Custom",
        }
    }
}

impl Default for CitySize {
    fn default() -> Self {
        CitySize::SmallCity
    }
}

/// Configuration for deterministic city generation
///
/// The same configuration always produces the identical city, including
/// across failed internal build attempts (retries reseed from the stream
/// itself, never from the clock).
///
/// # Example
///
/// ```
/// use medieval_city::{CityConfigBuilder, CitySize};
///
/// let config = CityConfigBuilder::new()
///     .seed(42)
///     .city_size(CitySize::SmallTown)
///     .build()
///     .unwrap();
/// assert_eq!(config.n_patches, 8);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityConfig {
    /// Random seed, always in `[1, 2^31 - 2]`
    pub seed: i64,

    /// Number of city patches (the N of the layout pipeline)
    pub n_patches: usize,

    /// Force the central plaza on or off
    ///
    /// `None` keeps the seeded coin flip. The flip is drawn from the stream
    /// either way, so pinning one feature does not disturb the rest of the
    /// generation.
    pub plaza: Option<bool>,

    /// Force the citadel on or off (same semantics as `plaza`)
    pub citadel: Option<bool>,

    /// Force city walls on or off (same semantics as `plaza`)
    pub walls: Option<bool>,
}

impl CityConfig {
    /// Advisory size class for this configuration
    #[inline]
    pub fn size(&self) -> CitySize {
        CitySize::classify(self.n_patches)
    }
}

impl Default for CityConfig {
    fn default() -> Self {
        // The builder cannot fail with default values
        CityConfigBuilder::new()
            .build()
            .unwrap_or(CityConfig {
                seed: 1,
                n_patches: 15,
                plaza: None,
                citadel: None,
                walls: None,
            })
    }
}

/// Builder for creating a [`CityConfig`] with validation
///
/// # Example
///
/// ```
/// use medieval_city::CityConfigBuilder;
///
/// let config = CityConfigBuilder::new()
///     .seed(12345)
///     .n_patches(24)
///     .unwrap()
///     .walls(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.n_patches, 24);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CityConfigBuilder {
    seed: Option<i64>,
    n_patches: Option<usize>,
    plaza: Option<bool>,
    citadel: Option<bool>,
    walls: Option<bool>,
}

impl CityConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults: random seed, 15 patches (a small city), no feature pins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the random seed
    ///
    /// Values `<= 0` request a random seed, matching the behavior of
    /// [`generate`](crate::generate).
    pub fn seed(mut self, seed: i64) -> Self {
        if seed > 0 {
            self.seed = Some(seed);
        }
        self
    }

    /// Set the number of city patches
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for fewer than 3 or more than 256 patches.
    pub fn n_patches(mut self, n: usize) -> Result<Self> {
        if !(3..=256).contains(&n) {
            return Err(CityError::InvalidConfig(format!(
                "n_patches must be in 3..=256 (got {})",
                n
            )));
        }
        self.n_patches = Some(n);
        Ok(self)
    }

    /// Set the patch count from a size preset
    pub fn city_size(mut self, size: CitySize) -> Self {
        self.n_patches = Some(size.n_patches());
        self
    }

    /// Pin the central plaza on or off
    pub fn plaza(mut self, plaza: bool) -> Self {
        self.plaza = Some(plaza);
        self
    }

    /// Pin the citadel on or off
    pub fn citadel(mut self, citadel: bool) -> Self {
        self.citadel = Some(citadel);
        self
    }

    /// Pin the city walls on or off
    pub fn walls(mut self, walls: bool) -> Self {
        self.walls = Some(walls);
        self
    }

    /// Build the configuration
    ///
    /// If no seed was provided, draws one from the host entropy source.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a size preset produced an out-of-range
    /// patch count.
    pub fn build(self) -> Result<CityConfig> {
        let n_patches = self.n_patches.unwrap_or(15);
        if !(3..=256).contains(&n_patches) {
            return Err(CityError::InvalidConfig(format!(
                "n_patches must be in 3..=256 (got {})",
                n_patches
            )));
        }
        let seed = self
            .seed
            .unwrap_or_else(|| (rand::random::<u32>() % 0x7fff_fffe) as i64 + 1);

        Ok(CityConfig {
            seed,
            n_patches,
            plaza: self.plaza,
            citadel: self.citadel,
            walls: self.walls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_presets() {
        assert_eq!(CitySize::SmallTown.n_patches(), 8);
        assert_eq!(CitySize::Metropolis.n_patches(), 40);
        assert_eq!(CitySize::Custom { n_patches: 77 }.n_patches(), 77);
    }

    #[test]
    fn test_classify() {
        assert_eq!(CitySize::classify(6), CitySize::SmallTown);
        assert_eq!(CitySize::classify(10), CitySize::LargeTown);
        assert_eq!(CitySize::classify(15), CitySize::SmallCity);
        assert_eq!(CitySize::classify(24), CitySize::LargeCity);
        assert_eq!(CitySize::classify(40), CitySize::Metropolis);
    }

    #[test]
    fn test_builder_defaults() {
        let config = CityConfigBuilder::new().build().unwrap();
        assert_eq!(config.n_patches, 15);
        assert!(config.seed > 0);
        assert_eq!(config.plaza, None);
    }

    #[test]
    fn test_builder_custom() {
        let config = CityConfigBuilder::new()
            .seed(42)
            .n_patches(24)
            .unwrap()
            .plaza(true)
            .citadel(false)
            .build()
            .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.n_patches, 24);
        assert_eq!(config.plaza, Some(true));
        assert_eq!(config.citadel, Some(false));
        assert_eq!(config.walls, None);
    }

    #[test]
    fn test_builder_invalid_patch_count() {
        assert!(CityConfigBuilder::new().n_patches(2).is_err());
        assert!(CityConfigBuilder::new().n_patches(1000).is_err());
    }

    #[test]
    fn test_nonpositive_seed_is_randomized() {
        let config = CityConfigBuilder::new().seed(-1).build().unwrap();
        assert!(config.seed > 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = CityConfigBuilder::new().seed(7).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: CityConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
