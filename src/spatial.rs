//! Spatial indexing for fast position-to-patch lookups
//!
//! This module is only available with the `spatial-index` feature.

#[cfg(feature = "spatial-index")]
use glam::DVec2;
#[cfg(feature = "spatial-index")]
use kiddo::immutable::float::kdtree::ImmutableKdTree;
#[cfg(feature = "spatial-index")]
use kiddo::SquaredEuclidean;

/// Wrapper around a KD-tree for nearest-patch queries
///
/// Maps a 2D position to the index of the closest patch center in
/// O(log n); handy for hit-testing a rendered city without scanning
/// every polygon.
#[cfg(feature = "spatial-index")]
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
}

#[cfg(feature = "spatial-index")]
impl SpatialIndex {
    /// Build the index from patch centers
    ///
    /// # Example
    ///
    /// ```
    /// use medieval_city::spatial::SpatialIndex;
    /// use glam::DVec2;
    ///
    /// let centers = vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)];
    /// let index = SpatialIndex::new(&centers);
    /// assert_eq!(index.find_nearest(DVec2::new(9.0, 1.0)), 1);
    /// ```
    pub fn new(centers: &[DVec2]) -> Self {
        let points: Vec<[f64; 2]> = centers.iter().map(|c| [c.x, c.y]).collect();
        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
        }
    }

    /// Index of the center nearest to a position
    pub fn find_nearest(&self, position: DVec2) -> usize {
        let result = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[position.x, position.y]);
        result.item
    }
}

#[cfg(test)]
#[cfg(feature = "spatial-index")]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index_basic() {
        let centers = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(20.0, 0.0),
            DVec2::new(0.0, 20.0),
            DVec2::new(-20.0, -20.0),
        ];
        let index = SpatialIndex::new(&centers);

        assert_eq!(index.find_nearest(DVec2::new(1.0, 1.0)), 0);
        assert_eq!(index.find_nearest(DVec2::new(18.0, 2.0)), 1);
        assert_eq!(index.find_nearest(DVec2::new(-1.0, 19.0)), 2);
        assert_eq!(index.find_nearest(DVec2::new(-15.0, -25.0)), 3);
    }

    #[test]
    fn test_spatial_index_exact_match() {
        let centers = vec![DVec2::new(5.0, 5.0), DVec2::new(-5.0, 5.0)];
        let index = SpatialIndex::new(&centers);
        assert_eq!(index.find_nearest(centers[0]), 0);
        assert_eq!(index.find_nearest(centers[1]), 1);
    }
}
