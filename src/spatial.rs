//! H3 cell lookup and neighbourhood enumeration.

use crate::error::PredictError;
use h3o::{CellIndex, LatLng, Resolution};

/// Cell containing `(latitude, longitude)` at `resolution`.
///
/// Coordinates outside [-90, 90] x [-180, 180] are rejected instead of being
/// wrapped onto the sphere.
pub fn cell_for(latitude: f64, longitude: f64, resolution: Resolution) -> Result<CellIndex, PredictError> {
    let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
    if !in_range {
        return Err(PredictError::InvalidCoordinate { latitude, longitude });
    }

    let point = LatLng::new(latitude, longitude)
        .map_err(|_| PredictError::InvalidCoordinate { latitude, longitude })?;
    Ok(point.to_cell(resolution))
}

/// Every cell within grid distance `k` of `cell`, the cell itself included.
pub fn ring_neighbors(cell: CellIndex, k: u32) -> Vec<CellIndex> {
    cell.grid_disk::<Vec<_>>(k)
}

/// Parse a hexadecimal cell token such as `8c7a6e42c4629ff`.
pub fn parse_cell(token: &str) -> Result<CellIndex, h3o::error::InvalidCellIndex> {
    token.trim().parse::<CellIndex>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const NAIROBI_CBD: (f64, f64) = (-1.2843, 36.8248);

    fn nairobi() -> CellIndex {
        cell_for(NAIROBI_CBD.0, NAIROBI_CBD.1, Resolution::Twelve).unwrap()
    }

    #[test]
    fn test_cell_for_is_deterministic() {
        let a = nairobi();
        let b = nairobi();
        assert_eq!(a, b);
        assert_eq!(a.resolution(), Resolution::Twelve);
    }

    #[test]
    fn test_cell_for_rejects_out_of_range() {
        assert!(matches!(
            cell_for(91.0, 0.0, Resolution::Twelve),
            Err(PredictError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            cell_for(0.0, -180.5, Resolution::Twelve),
            Err(PredictError::InvalidCoordinate { .. })
        ));
        assert!(cell_for(f64::NAN, 0.0, Resolution::Twelve).is_err());
    }

    #[test]
    fn test_ring_zero_is_the_cell() {
        let cell = nairobi();
        assert_eq!(ring_neighbors(cell, 0), vec![cell]);
    }

    #[test]
    fn test_rings_are_monotonic() {
        let cell = nairobi();
        for k in 0..6 {
            let inner: HashSet<_> = ring_neighbors(cell, k).into_iter().collect();
            let outer: HashSet<_> = ring_neighbors(cell, k + 1).into_iter().collect();
            assert!(inner.contains(&cell));
            assert!(inner.is_subset(&outer), "disk {} not inside disk {}", k, k + 1);
        }
    }

    #[test]
    fn test_disk_sizes() {
        // Away from pentagons a disk of radius k holds 3k(k+1)+1 cells.
        let cell = nairobi();
        assert_eq!(ring_neighbors(cell, 1).len(), 7);
        assert_eq!(ring_neighbors(cell, 5).len(), 91);
        assert_eq!(ring_neighbors(cell, 7).len(), 169);
    }

    #[test]
    fn test_parse_round_trip() {
        let cell = nairobi();
        assert_eq!(parse_cell(&cell.to_string()).unwrap(), cell);
        assert!(parse_cell("not-a-cell").is_err());
    }
}
