//! The resolved city model
//!
//! [`Model`] is the read-only result of generation: every contour has been
//! resolved from the shared mesh into plain polygons, so consumers never
//! see vertex handles. Rendering, export and interaction all live outside
//! this crate; the model is just geometry and classification.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::DVec2;

use crate::config::{CityConfig, CitySize};
use crate::error::Result;
use crate::geom::Polygon;
#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

pub use crate::generation::wards::WardKind;

/// A generated city: patches, walls, streets and building footprints
///
/// # Example
///
/// ```
/// use medieval_city::{CityConfigBuilder, Model};
///
/// let config = CityConfigBuilder::new()
///     .seed(42)
///     .n_patches(10)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let city = Model::generate(config).unwrap();
/// assert!(city.patches().len() >= 10);
/// for patch in city.patches() {
///     let _ = patch.ward().kind();
/// }
/// ```
#[derive(Clone)]
pub struct Model {
    pub(crate) seed: i64,
    pub(crate) n_patches: usize,
    pub(crate) patches: Vec<Patch>,
    pub(crate) plaza: Option<usize>,
    pub(crate) citadel: Option<usize>,
    pub(crate) center: DVec2,
    pub(crate) city_radius: f64,
    pub(crate) gates: Vec<DVec2>,
    pub(crate) streets: Vec<Polygon>,
    pub(crate) roads: Vec<Polygon>,
    pub(crate) arteries: Vec<Polygon>,
    pub(crate) border: Wall,
    pub(crate) wall_present: bool,
    pub(crate) citadel_wall: Option<Wall>,
    #[cfg(feature = "spatial-index")]
    pub(crate) spatial_index: SpatialIndex,
}

impl Model {
    /// Generate a city from a configuration
    ///
    /// Fails with `GenerationFailed` only after exhausting the internal
    /// retry budget; transient geometry failures reseed and rebuild
    /// deterministically.
    pub fn generate(config: CityConfig) -> Result<Model> {
        crate::generation::generate(&config)
    }

    /// The seed that reproduces this exact city
    #[inline]
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// The patch count the city was generated for
    #[inline]
    pub fn n_patches(&self) -> usize {
        self.n_patches
    }

    /// Advisory size class for this city
    #[inline]
    pub fn size(&self) -> CitySize {
        CitySize::classify(self.n_patches)
    }

    /// All patches, city first, countryside after
    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// The central plaza patch, if the city has one
    pub fn plaza(&self) -> Option<&Patch> {
        self.plaza.and_then(|i| self.patches.get(i))
    }

    /// The citadel patch, if the city has one
    pub fn citadel(&self) -> Option<&Patch> {
        self.citadel.and_then(|i| self.patches.get(i))
    }

    /// The citadel's own curtain wall
    pub fn citadel_wall(&self) -> Option<&Wall> {
        self.citadel_wall.as_ref()
    }

    /// City center point
    #[inline]
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Largest distance of any city vertex from the origin
    #[inline]
    pub fn city_radius(&self) -> f64 {
        self.city_radius
    }

    /// Border of the city proper; a physical wall only when
    /// [`wall`](Self::wall) is present
    #[inline]
    pub fn border(&self) -> &Wall {
        &self.border
    }

    /// The city wall, when one was built
    pub fn wall(&self) -> Option<&Wall> {
        if self.wall_present {
            Some(&self.border)
        } else {
            None
        }
    }

    /// All gates: wall gates first, then citadel gates
    #[inline]
    pub fn gates(&self) -> &[DVec2] {
        &self.gates
    }

    /// Streets from each gate to the plaza, as open polylines
    #[inline]
    pub fn streets(&self) -> &[Polygon] {
        &self.streets
    }

    /// Approach roads from the countryside to the wall gates
    #[inline]
    pub fn roads(&self) -> &[Polygon] {
        &self.roads
    }

    /// Maximal merged street/road polylines
    #[inline]
    pub fn arteries(&self) -> &[Polygon] {
        &self.arteries
    }

    /// Index of the patch whose center is nearest to a position
    ///
    /// Requires the `spatial-index` feature. Returns `None` only for a
    /// city with no patches.
    #[cfg(feature = "spatial-index")]
    pub fn find_patch_at(&self, position: DVec2) -> Option<usize> {
        if self.patches.is_empty() {
            return None;
        }
        Some(self.spatial_index.find_nearest(position))
    }
}

/// One resolved city patch
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Patch {
    shape: Polygon,
    ward: Ward,
    within_city: bool,
    within_walls: bool,
}

impl Patch {
    pub(crate) fn new(shape: Polygon, ward: Ward, within_city: bool, within_walls: bool) -> Patch {
        Patch {
            shape,
            ward,
            within_city,
            within_walls,
        }
    }

    /// Patch boundary polygon
    #[inline]
    pub fn shape(&self) -> &Polygon {
        &self.shape
    }

    /// The ward occupying this patch
    #[inline]
    pub fn ward(&self) -> &Ward {
        &self.ward
    }

    /// True for patches that belong to the city proper
    #[inline]
    pub fn within_city(&self) -> bool {
        self.within_city
    }

    /// True for patches inside the curtain wall
    #[inline]
    pub fn within_walls(&self) -> bool {
        self.within_walls
    }
}

/// A ward: its kind and the building footprints it generated
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Ward {
    kind: WardKind,
    geometry: Vec<Polygon>,
}

impl Ward {
    pub(crate) fn new(kind: WardKind, geometry: Vec<Polygon>) -> Ward {
        Ward { kind, geometry }
    }

    #[inline]
    pub fn kind(&self) -> WardKind {
        self.kind
    }

    /// Display name of the ward kind
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Building footprints (empty for plain countryside)
    #[inline]
    pub fn geometry(&self) -> &[Polygon] {
        &self.geometry
    }
}

/// A resolved curtain wall
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Wall {
    pub(crate) shape: Polygon,
    pub(crate) gates: Vec<DVec2>,
    pub(crate) towers: Vec<DVec2>,
    pub(crate) segments: Vec<bool>,
}

impl Wall {
    /// Wall polygon
    #[inline]
    pub fn shape(&self) -> &Polygon {
        &self.shape
    }

    /// Gate positions, drawn from the wall polygon's vertices
    #[inline]
    pub fn gates(&self) -> &[DVec2] {
        &self.gates
    }

    /// Tower positions flanking the gates
    #[inline]
    pub fn towers(&self) -> &[DVec2] {
        &self.towers
    }

    /// Per-edge wall flags: `segments()[i]` tells whether the edge
    /// starting at vertex `i` carries a physical wall
    #[inline]
    pub fn segments(&self) -> &[bool] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CityConfigBuilder;

    fn small_city(seed: i64) -> Model {
        let config = CityConfigBuilder::new()
            .seed(seed)
            .n_patches(10)
            .unwrap()
            .build()
            .unwrap();
        Model::generate(config).unwrap()
    }

    #[test]
    fn test_generation_completes() {
        let city = small_city(1);
        assert!(city.patches().len() >= 10);
        assert_eq!(city.n_patches(), 10);
        assert_eq!(city.seed(), 1);
    }

    #[test]
    fn test_determinism() {
        let a = small_city(12345);
        let b = small_city(12345);

        assert_eq!(a.patches().len(), b.patches().len());
        for (pa, pb) in a.patches().iter().zip(b.patches()) {
            assert_eq!(pa.ward().kind(), pb.ward().kind());
            assert_eq!(pa.shape().vertices(), pb.shape().vertices());
            assert_eq!(pa.ward().geometry().len(), pb.ward().geometry().len());
        }
        assert_eq!(a.gates(), b.gates());
        assert_eq!(a.city_radius(), b.city_radius());
        for (sa, sb) in a.streets().iter().zip(b.streets()) {
            assert_eq!(sa.vertices(), sb.vertices());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = small_city(7);
        let b = small_city(8);
        // Layouts from different seeds should not coincide
        let same = a.patches().len() == b.patches().len()
            && a.patches()
                .iter()
                .zip(b.patches())
                .all(|(pa, pb)| pa.shape().vertices() == pb.shape().vertices());
        assert!(!same);
    }

    #[test]
    fn test_every_city_patch_has_a_real_ward() {
        for seed in [1, 42, 12345] {
            let city = small_city(seed);
            for patch in city.patches() {
                if patch.within_city() {
                    assert_ne!(patch.ward().kind(), WardKind::Common);
                    assert_ne!(patch.ward().kind(), WardKind::Farm);
                }
            }
        }
    }

    #[test]
    fn test_city_patch_polygons_are_counter_clockwise() {
        let city = small_city(42);
        for patch in city.patches() {
            if patch.within_city() {
                assert!(
                    patch.shape().signed_area() > 0.0,
                    "patch polygons stay counter-clockwise"
                );
                assert!(patch.shape().len() >= 3);
            }
        }
    }

    #[test]
    fn test_streets_reach_from_every_gate() {
        let city = small_city(42);
        assert_eq!(city.streets().len(), city.gates().len());
        for street in city.streets() {
            assert!(street.len() >= 1);
        }
    }

    #[test]
    fn test_wall_gates_lie_on_wall_and_patches() {
        // Walls pinned on so the invariant is exercised
        let config = CityConfigBuilder::new()
            .seed(4242)
            .n_patches(12)
            .unwrap()
            .walls(true)
            .build()
            .unwrap();
        let city = Model::generate(config).unwrap();

        let wall = city.wall().expect("walls were requested");
        assert!(!wall.gates().is_empty());
        assert_eq!(wall.segments().len(), wall.shape().len());

        for gate in wall.gates() {
            // Verbatim wall polygon vertex
            assert!(
                wall.shape().vertices().iter().any(|v| v == gate),
                "gate must be a wall vertex"
            );
            // And a vertex of at least one city patch (the countryside
            // side may have been absorbed by an outskirts gate ward)
            let inside = city.patches().iter().any(|patch| {
                patch.within_city() && patch.shape().vertices().iter().any(|v| v == gate)
            });
            assert!(inside, "gate touches the city");
        }
    }

    #[test]
    fn test_forced_plaza_citadel_walls() {
        // Forcing all three features makes individual attempts harder, so
        // sample a few seeds; every successful build must honor the pins
        let mut verified = false;
        for seed in [12345, 4242, 99, 7, 2024, 31415] {
            let config = CityConfigBuilder::new()
                .seed(seed)
                .n_patches(15)
                .unwrap()
                .plaza(true)
                .citadel(true)
                .walls(true)
                .build()
                .unwrap();
            let Ok(city) = Model::generate(config) else {
                continue;
            };

            assert!(city.wall().is_some());
            assert!(!city.border().gates().is_empty());

            let plaza = city.plaza().expect("plaza was requested");
            assert_eq!(plaza.ward().kind(), WardKind::Market);

            if let Some(citadel) = city.citadel() {
                assert_eq!(citadel.ward().kind(), WardKind::Castle);
                assert!(citadel.shape().compactness() >= 0.75);
                assert!(city.citadel_wall().is_some());
                verified = true;
                break;
            }
        }
        assert!(verified, "no seed produced a walled city with a citadel");
    }

    #[test]
    fn test_city_radius_covers_border() {
        let city = small_city(99);
        for v in city.border().shape().vertices() {
            assert!(v.length() <= city.city_radius() + 1e-6);
        }
    }

    #[test]
    fn test_no_walls_means_no_towers() {
        let config = CityConfigBuilder::new()
            .seed(5)
            .n_patches(8)
            .unwrap()
            .walls(false)
            .build()
            .unwrap();
        let city = Model::generate(config).unwrap();
        assert!(city.wall().is_none());
        assert!(city.border().towers().is_empty());
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn test_find_patch_at_center_of_patch() {
        let city = small_city(42);
        let target = city.patches()[0].shape().center();
        let found = city.find_patch_at(target).unwrap();
        assert_eq!(found, 0);
    }

    #[test]
    fn test_ward_template_respected_for_metropolis() {
        // A full-size city consumes the whole template: single-instance
        // wards appear at most... exactly as often as the template plus
        // replenished slums allow
        let config = CityConfigBuilder::new()
            .seed(2024)
            .n_patches(40)
            .unwrap()
            .build()
            .unwrap();
        let city = Model::generate(config).unwrap();

        let count = |k: WardKind| {
            city.patches()
                .iter()
                .filter(|p| p.within_city() && p.ward().kind() == k)
                .count()
        };
        assert!(count(WardKind::Cathedral) <= 1);
        assert!(count(WardKind::Park) <= 1);
        assert!(count(WardKind::Military) <= 1);
        assert!(count(WardKind::Market) <= 3); // template pair + plaza
        assert!(count(WardKind::Patriciate) <= 2);
    }
}
