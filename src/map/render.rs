use crate::geo::{self, Resolved};
use crate::models::delivery::DeliveryRecord;
use crate::models::route::OptimizedRoute;
use crate::models::GeoPoint;

use super::icons;
use super::lifecycle::MapLifecycle;
use super::surface::{MapError, PolylineDescriptor};

/// Geocoded endpoints of one delivery leg, with the lookup outcome preserved
/// so a fallback pin is visible to the caller.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryLeg {
    pub origin: Resolved,
    pub destination: Resolved,
}

impl DeliveryLeg {
    pub fn resolve(delivery: &DeliveryRecord) -> Self {
        Self {
            origin: geo::resolve_detailed(&delivery.origin),
            destination: geo::resolve_detailed(&delivery.destination),
        }
    }

    pub fn fallback_count(&self) -> usize {
        usize::from(self.origin.is_fallback()) + usize::from(self.destination.is_fallback())
    }
}

/// Draws one optimized route: start and end markers, a waypoint marker per
/// interior coordinate, and a polyline through the whole path. Additive only;
/// clearing stale overlays is the caller's job. Returns the number of markers
/// added and pushes every drawn coordinate into `acc` for viewport fitting.
pub fn draw_route(
    lifecycle: &mut MapLifecycle,
    route: &OptimizedRoute,
    color: &str,
    acc: &mut Vec<GeoPoint>,
) -> Result<usize, MapError> {
    if !route.is_drawable() {
        return Err(MapError::DegenerateRoute);
    }

    let coords = &route.coordinates;
    let mut markers = 0;

    lifecycle.add_marker(icons::route_start_marker(route, coords[0]))?;
    markers += 1;

    for (index, waypoint) in route.waypoints().iter().enumerate() {
        lifecycle.add_marker(icons::waypoint_marker(route, index + 1, *waypoint))?;
        markers += 1;
    }

    lifecycle.add_marker(icons::route_end_marker(route, coords[coords.len() - 1]))?;
    markers += 1;

    lifecycle.add_polyline(PolylineDescriptor {
        path: coords.clone(),
        color: color.to_string(),
        weight: 4,
        dashed: false,
        popup: Some(icons::route_summary_popup(route)),
    })?;

    acc.extend_from_slice(coords);
    Ok(markers)
}

/// Draws one delivery: status-colored origin and destination pins plus a
/// dashed connecting line carrying the summary popup.
pub fn draw_delivery(
    lifecycle: &mut MapLifecycle,
    delivery: &DeliveryRecord,
    leg: &DeliveryLeg,
    acc: &mut Vec<GeoPoint>,
) -> Result<usize, MapError> {
    let origin = leg.origin.point;
    let destination = leg.destination.point;
    let leg_km = geo::haversine_km(&origin, &destination);

    lifecycle.add_marker(icons::delivery_origin_marker(delivery, origin))?;
    lifecycle.add_marker(icons::delivery_destination_marker(delivery, destination))?;

    lifecycle.add_polyline(PolylineDescriptor {
        path: vec![origin, destination],
        color: icons::status_color(delivery.status).to_string(),
        weight: 3,
        dashed: true,
        popup: Some(icons::delivery_summary_popup(delivery, leg_km)),
    })?;

    acc.push(origin);
    acc.push(destination);
    Ok(2)
}
