//! Medieval city layout generation
//!
//! A standalone library that turns a size and a seed into the full
//! two-dimensional plan of a medieval-style city: Voronoi patches, an
//! optional curtain wall with gates and towers, streets routed through
//! the patch mesh, ward assignments and per-building footprints. The
//! output is pure geometry; rendering, export and interaction belong to
//! the caller.
//!
//! # Quick Start
//!
//! ```
//! use medieval_city::generate;
//!
//! // 15 patches, fixed seed: always the same city
//! let city = generate(15, 84).unwrap();
//!
//! println!("{} patches, {} gates", city.patches().len(), city.gates().len());
//! for patch in city.patches() {
//!     println!(
//!         "{}: {} buildings",
//!         patch.ward().name(),
//!         patch.ward().geometry().len()
//!     );
//! }
//! ```
//!
//! Generation is deterministic: the same size and seed produce the same
//! city, bit for bit, including across the generator's internal retries.
//! Passing `seed <= 0` picks a random seed; read it back from
//! [`Model::seed`] to reproduce the result.
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) position-to-patch lookups via a
//!   KD-tree
//! - `serde`: serialization support for the configuration and the
//!   resolved city geometry

pub mod config;
pub mod error;
pub mod geom;
pub mod model;
pub mod rng;

mod generation;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use config::{CityConfig, CityConfigBuilder, CitySize};
pub use error::{CityError, Result};
pub use geom::Polygon;
pub use model::{Model, Patch, Ward, WardKind, Wall};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;

/// Generate a city of the given size
///
/// `size` is the number of city patches (6-40 is the tuned range);
/// `seed <= 0` requests a random seed from the host entropy source.
///
/// # Errors
///
/// Returns `InvalidConfig` for an unusable size and `GenerationFailed`
/// if every internal build attempt failed for the seed.
pub fn generate(size: u32, seed: i64) -> Result<Model> {
    let config = CityConfigBuilder::new()
        .seed(seed)
        .n_patches(size as usize)?
        .build()?;
    Model::generate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_entry_point() {
        let city = generate(6, 1).unwrap();
        assert!(city.patches().len() >= 6);
        assert_eq!(city.seed(), 1);
    }

    #[test]
    fn test_generate_rejects_bad_size() {
        assert!(matches!(
            generate(1, 1),
            Err(CityError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_generate_random_seed() {
        let city = generate(6, 0).unwrap();
        assert!(city.seed() > 0);
    }
}
