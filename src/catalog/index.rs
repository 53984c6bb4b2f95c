//! Envelope index used to prefilter catalog regions.

use geo::Rect;
use rstar::{RTree, RTreeObject, AABB};

/// R-tree entry pointing back at a catalog position
#[derive(Debug, Clone)]
pub(crate) struct IndexedRegion {
    pub position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRegion {
    pub fn new(position: usize, rect: Rect<f64>) -> Self {
        Self {
            position,
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        }
    }
}

/// Spatial prefilter over region envelopes.
///
/// The tree does not know about catalog order; [`EnvelopeIndex::candidates`]
/// hands positions back sorted so callers can keep first-match semantics.
pub(crate) struct EnvelopeIndex {
    tree: RTree<IndexedRegion>,
}

impl EnvelopeIndex {
    pub fn build(entries: Vec<IndexedRegion>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Catalog positions whose envelope covers the point, ascending
    pub fn candidates(&self, lon: f64, lat: f64) -> Vec<usize> {
        let query_envelope = AABB::from_point([lon, lat]);
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|entry| entry.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn test_candidates_sorted_by_position() {
        let big = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
        let small = Rect::new(coord! { x: 4.0, y: 4.0 }, coord! { x: 6.0, y: 6.0 });
        let far = Rect::new(coord! { x: 50.0, y: 50.0 }, coord! { x: 60.0, y: 60.0 });

        let index = EnvelopeIndex::build(vec![
            IndexedRegion::new(7, small),
            IndexedRegion::new(2, far),
            IndexedRegion::new(3, big),
        ]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.candidates(5.0, 5.0), vec![3, 7]);
        assert_eq!(index.candidates(1.0, 1.0), vec![3]);
        assert!(index.candidates(-1.0, -1.0).is_empty());
    }

    #[test]
    fn test_envelope_boundary_is_candidate() {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let index = EnvelopeIndex::build(vec![IndexedRegion::new(0, rect)]);
        assert_eq!(index.candidates(1.0, 0.5), vec![0]);
    }
}
