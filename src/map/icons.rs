use crate::models::delivery::{DeliveryRecord, DeliveryStatus};
use crate::models::route::OptimizedRoute;
use crate::models::GeoPoint;

use super::surface::{MarkerDescriptor, MarkerKind, PopupContent};

/// Polyline colors for optimized routes, cycled by route index.
pub const ROUTE_PALETTE: &[&str] = &["#2563eb", "#dc2626", "#059669", "#7c3aed", "#ea580c"];

const WAYPOINT_COLOR: &str = "#64748b";

pub fn status_color(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Planned => "#3b82f6",
        DeliveryStatus::InProgress => "#f59e0b",
        DeliveryStatus::Completed => "#10b981",
        DeliveryStatus::Delayed => "#ef4444",
    }
}

pub fn route_color(index: usize) -> &'static str {
    ROUTE_PALETTE[index % ROUTE_PALETTE.len()]
}

fn pin_html(class: &str, color: &str, glyph: &str) -> String {
    format!(
        "<div class=\"fb-marker {class}\" style=\"background:{color}\">{glyph}</div>"
    )
}

pub fn route_start_marker(route: &OptimizedRoute, position: GeoPoint) -> MarkerDescriptor {
    let color = "#059669";
    MarkerDescriptor {
        kind: MarkerKind::RouteStart,
        position,
        color: color.to_string(),
        icon_html: pin_html("fb-marker-start fb-marker-pulse", color, "D"),
        icon_size: (28, 28),
        pulse: true,
        popup: PopupContent::titled(format!("Départ — {}", route.origin))
            .row("Driver", route.driver.clone())
            .row("Vehicle", route.vehicle.clone())
            .row("Destination", route.destination.clone()),
    }
}

pub fn route_end_marker(route: &OptimizedRoute, position: GeoPoint) -> MarkerDescriptor {
    let color = "#dc2626";
    MarkerDescriptor {
        kind: MarkerKind::RouteEnd,
        position,
        color: color.to_string(),
        icon_html: pin_html("fb-marker-end", color, "A"),
        icon_size: (28, 28),
        pulse: false,
        popup: PopupContent::titled(format!("Arrivée — {}", route.destination))
            .row("Distance", format!("{:.1} km", route.distance_km))
            .row("Optimized", format!("{} min", route.optimized_duration_min))
            .row("Time saved", format!("{} min", route.time_saved_min)),
    }
}

pub fn waypoint_marker(
    route: &OptimizedRoute,
    ordinal: usize,
    position: GeoPoint,
) -> MarkerDescriptor {
    MarkerDescriptor {
        kind: MarkerKind::Waypoint,
        position,
        color: WAYPOINT_COLOR.to_string(),
        icon_html: pin_html("fb-marker-waypoint", WAYPOINT_COLOR, &ordinal.to_string()),
        icon_size: (16, 16),
        pulse: false,
        popup: PopupContent::titled(format!("Waypoint {ordinal}"))
            .row("Route", format!("{} → {}", route.origin, route.destination))
            .row("Vehicle", route.vehicle.clone()),
    }
}

pub fn delivery_origin_marker(delivery: &DeliveryRecord, position: GeoPoint) -> MarkerDescriptor {
    let color = status_color(delivery.status);
    MarkerDescriptor {
        kind: MarkerKind::Origin,
        position,
        color: color.to_string(),
        icon_html: pin_html("fb-marker-origin", color, "O"),
        icon_size: (24, 24),
        pulse: delivery.status == DeliveryStatus::InProgress,
        popup: delivery_popup(delivery, "Origin", &delivery.origin),
    }
}

pub fn delivery_destination_marker(
    delivery: &DeliveryRecord,
    position: GeoPoint,
) -> MarkerDescriptor {
    let color = status_color(delivery.status);
    MarkerDescriptor {
        kind: MarkerKind::Destination,
        position,
        color: color.to_string(),
        icon_html: pin_html("fb-marker-destination", color, "D"),
        icon_size: (24, 24),
        pulse: false,
        popup: delivery_popup(delivery, "Destination", &delivery.destination),
    }
}

fn delivery_popup(delivery: &DeliveryRecord, end_label: &'static str, place: &str) -> PopupContent {
    PopupContent::titled(format!("Mission {}", delivery.id))
        .row(end_label, place.to_string())
        .row("Driver", delivery.driver.clone())
        .row("Vehicle", delivery.vehicle.clone())
        .row("Date", format!("{} {}", delivery.date, delivery.time))
        .row("Status", delivery.status.as_str())
}

pub fn delivery_summary_popup(delivery: &DeliveryRecord, leg_km: f64) -> PopupContent {
    PopupContent::titled(format!("{} → {}", delivery.origin, delivery.destination))
        .row("Driver", delivery.driver.clone())
        .row("Vehicle", delivery.vehicle.clone())
        .row("Status", delivery.status.as_str())
        .row("Approx. distance", format!("{leg_km:.0} km"))
}

pub fn route_summary_popup(route: &OptimizedRoute) -> PopupContent {
    PopupContent::titled(format!("{} → {}", route.origin, route.destination))
        .row("Driver", route.driver.clone())
        .row("Vehicle", route.vehicle.clone())
        .row("Distance", format!("{:.1} km", route.distance_km))
        .row(
            "Duration",
            format!(
                "{} min (was {} min)",
                route.optimized_duration_min, route.original_duration_min
            ),
        )
        .row("Time saved", format!("{} min", route.time_saved_min))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::delivery::{DeliveryRecord, DeliveryStatus};
    use crate::models::route::OptimizedRoute;
    use crate::models::GeoPoint;

    fn sample_route() -> OptimizedRoute {
        OptimizedRoute {
            id: Uuid::from_u128(42),
            origin: "Casablanca".to_string(),
            destination: "Rabat".to_string(),
            vehicle: "TR-104".to_string(),
            driver: "Hassan Alaoui".to_string(),
            distance_km: 87.3,
            original_duration_min: 95,
            optimized_duration_min: 80,
            time_saved_min: 15,
            coordinates: vec![
                GeoPoint { lat: 33.5731, lng: -7.5898 },
                GeoPoint { lat: 34.0209, lng: -6.8416 },
            ],
        }
    }

    fn sample_delivery(status: DeliveryStatus) -> DeliveryRecord {
        DeliveryRecord {
            id: Uuid::from_u128(9),
            date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            time: "08:30".to_string(),
            driver: "Karim Tazi".to_string(),
            vehicle: "VAN-21".to_string(),
            origin: "Casablanca".to_string(),
            destination: "Marrakech".to_string(),
            status,
            notes: None,
        }
    }

    #[test]
    fn factories_are_deterministic() {
        let route = sample_route();
        let position = route.coordinates[0];
        assert_eq!(
            route_start_marker(&route, position),
            route_start_marker(&route, position)
        );
    }

    #[test]
    fn end_marker_carries_distance_metrics() {
        let route = sample_route();
        let marker = route_end_marker(&route, route.coordinates[1]);
        let html = marker.popup.to_html();
        assert!(html.contains("87.3 km"));
        assert!(html.contains("15 min"));
    }

    #[test]
    fn waypoint_marker_names_its_ordinal_and_route() {
        let route = sample_route();
        let marker = waypoint_marker(&route, 2, GeoPoint { lat: 33.8, lng: -7.2 });
        assert_eq!(marker.popup.title, "Waypoint 2");
        let html = marker.popup.to_html();
        assert!(html.contains("Casablanca → Rabat"));
    }

    #[test]
    fn delivery_markers_use_status_colors() {
        let delayed = sample_delivery(DeliveryStatus::Delayed);
        let marker = delivery_origin_marker(&delayed, GeoPoint { lat: 0.0, lng: 0.0 });
        assert_eq!(marker.color, status_color(DeliveryStatus::Delayed));
    }

    #[test]
    fn route_palette_cycles() {
        assert_eq!(route_color(0), route_color(ROUTE_PALETTE.len()));
    }
}
