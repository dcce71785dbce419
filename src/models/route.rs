use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GeoPoint;

/// A route produced by the external optimization process. Consumed read-only:
/// this service draws it, it never recomputes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub vehicle: String,
    pub driver: String,
    pub distance_km: f64,
    pub original_duration_min: u32,
    pub optimized_duration_min: u32,
    pub time_saved_min: u32,
    /// Ordered path: first entry is the start, last is the end, everything
    /// between is a waypoint. A drawable route has at least two entries.
    pub coordinates: Vec<GeoPoint>,
}

impl OptimizedRoute {
    pub fn is_drawable(&self) -> bool {
        self.coordinates.len() >= 2
    }

    pub fn waypoints(&self) -> &[GeoPoint] {
        if self.coordinates.len() > 2 {
            &self.coordinates[1..self.coordinates.len() - 1]
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::OptimizedRoute;
    use crate::models::GeoPoint;

    fn route_with(coords: Vec<GeoPoint>) -> OptimizedRoute {
        OptimizedRoute {
            id: Uuid::from_u128(7),
            origin: "Casablanca".to_string(),
            destination: "Rabat".to_string(),
            vehicle: "TR-104".to_string(),
            driver: "Hassan Alaoui".to_string(),
            distance_km: 87.0,
            original_duration_min: 95,
            optimized_duration_min: 80,
            time_saved_min: 15,
            coordinates: coords,
        }
    }

    #[test]
    fn single_point_route_is_not_drawable() {
        let route = route_with(vec![GeoPoint { lat: 33.57, lng: -7.59 }]);
        assert!(!route.is_drawable());
    }

    #[test]
    fn waypoints_exclude_start_and_end() {
        let route = route_with(vec![
            GeoPoint { lat: 33.57, lng: -7.59 },
            GeoPoint { lat: 33.69, lng: -7.38 },
            GeoPoint { lat: 34.26, lng: -6.58 },
            GeoPoint { lat: 34.02, lng: -6.84 },
        ]);
        assert_eq!(route.waypoints().len(), 2);
        assert_eq!(route.waypoints()[0].lat, 33.69);
    }

    #[test]
    fn two_point_route_has_no_waypoints() {
        let route = route_with(vec![
            GeoPoint { lat: 33.57, lng: -7.59 },
            GeoPoint { lat: 34.02, lng: -6.84 },
        ]);
        assert!(route.is_drawable());
        assert!(route.waypoints().is_empty());
    }
}
