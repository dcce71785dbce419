use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;

use crate::models::GeoPoint;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map surface has been destroyed")]
    SurfaceGone,

    #[error("route has fewer than two coordinates")]
    DegenerateRoute,
}

/// Handle to a marker or polyline previously added to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OverlayId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    RouteStart,
    RouteEnd,
    Waypoint,
    Origin,
    Destination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupContent {
    pub title: String,
    pub rows: Vec<PopupRow>,
}

impl PopupContent {
    pub fn row(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.rows.push(PopupRow {
            label,
            value: value.into(),
        });
        self
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<div class=\"fb-popup\"><strong>{}</strong>", self.title);
        for row in &self.rows {
            html.push_str(&format!(
                "<div><span class=\"fb-popup-label\">{}</span> {}</div>",
                row.label, row.value
            ));
        }
        html.push_str("</div>");
        html
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDescriptor {
    pub kind: MarkerKind,
    pub position: GeoPoint,
    pub color: String,
    pub icon_html: String,
    pub icon_size: (u32, u32),
    pub pulse: bool,
    pub popup: PopupContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolylineDescriptor {
    pub path: Vec<GeoPoint>,
    pub color: String,
    pub weight: u32,
    pub dashed: bool,
    pub popup: Option<PopupContent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl Bounds {
    /// Smallest box containing every coordinate; `None` for an empty slice.
    pub fn around(coords: &[GeoPoint]) -> Option<Bounds> {
        let first = coords.first()?;
        let mut bounds = Bounds {
            south_west: *first,
            north_east: *first,
        };
        for point in &coords[1..] {
            bounds.south_west.lat = bounds.south_west.lat.min(point.lat);
            bounds.south_west.lng = bounds.south_west.lng.min(point.lng);
            bounds.north_east.lat = bounds.north_east.lat.max(point.lat);
            bounds.north_east.lng = bounds.north_east.lng.max(point.lng);
        }
        Some(bounds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: f64,
    pub fitted: Option<Bounds>,
}

/// Narrow capability interface over a tile-based map widget. The rendering
/// pipeline only ever talks to this trait, so it runs unchanged against a
/// browser-side tile engine or the headless [`OverlayStage`] below.
pub trait MapSurface: Send + Sync {
    fn set_view(&self, center: GeoPoint, zoom: f64) -> Result<(), MapError>;
    fn add_tile_layer(&self, url: &str, attribution: &str) -> Result<(), MapError>;
    fn add_marker(&self, marker: MarkerDescriptor) -> Result<OverlayId, MapError>;
    fn add_polyline(&self, line: PolylineDescriptor) -> Result<OverlayId, MapError>;
    fn remove_overlay(&self, id: OverlayId);
    fn fit_bounds(&self, bounds: Bounds, padding_px: u32) -> Result<(), MapError>;
    fn inject_stylesheet(&self, name: &str, css: &str);
    fn remove_stylesheet(&self, name: &str);
    fn destroy(&self);
    fn snapshot(&self) -> OverlaySnapshot;
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlaySnapshot {
    pub markers: Vec<MarkerDescriptor>,
    pub polylines: Vec<PolylineDescriptor>,
    pub stylesheets: Vec<String>,
    pub viewport: Viewport,
}

impl OverlaySnapshot {
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn polyline_count(&self) -> usize {
        self.polylines.len()
    }
}

struct StageInner {
    alive: bool,
    tile_layer: Option<(String, String)>,
    markers: Vec<(OverlayId, MarkerDescriptor)>,
    polylines: Vec<(OverlayId, PolylineDescriptor)>,
    stylesheets: BTreeMap<String, String>,
    viewport: Viewport,
}

/// In-process [`MapSurface`]: records every overlay operation and serves the
/// result as a serializable snapshot. The HTTP layer exposes that snapshot and
/// the tests assert against it.
pub struct OverlayStage {
    inner: Mutex<StageInner>,
    next_id: AtomicU64,
}

impl OverlayStage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StageInner {
                alive: true,
                tile_layer: None,
                markers: Vec::new(),
                polylines: Vec::new(),
                stylesheets: BTreeMap::new(),
                viewport: Viewport {
                    center: GeoPoint { lat: 0.0, lng: 0.0 },
                    zoom: 0.0,
                    fitted: None,
                },
            }),
            next_id: AtomicU64::new(1),
        }
    }

    fn inner(&self) -> MutexGuard<'_, StageInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_id(&self) -> OverlayId {
        OverlayId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for OverlayStage {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSurface for OverlayStage {
    fn set_view(&self, center: GeoPoint, zoom: f64) -> Result<(), MapError> {
        let mut inner = self.inner();
        if !inner.alive {
            return Err(MapError::SurfaceGone);
        }
        inner.viewport.center = center;
        inner.viewport.zoom = zoom;
        Ok(())
    }

    fn add_tile_layer(&self, url: &str, attribution: &str) -> Result<(), MapError> {
        let mut inner = self.inner();
        if !inner.alive {
            return Err(MapError::SurfaceGone);
        }
        inner.tile_layer = Some((url.to_string(), attribution.to_string()));
        Ok(())
    }

    fn add_marker(&self, marker: MarkerDescriptor) -> Result<OverlayId, MapError> {
        let id = self.next_id();
        let mut inner = self.inner();
        if !inner.alive {
            return Err(MapError::SurfaceGone);
        }
        inner.markers.push((id, marker));
        Ok(id)
    }

    fn add_polyline(&self, line: PolylineDescriptor) -> Result<OverlayId, MapError> {
        let id = self.next_id();
        let mut inner = self.inner();
        if !inner.alive {
            return Err(MapError::SurfaceGone);
        }
        inner.polylines.push((id, line));
        Ok(id)
    }

    fn remove_overlay(&self, id: OverlayId) {
        let mut inner = self.inner();
        inner.markers.retain(|(marker_id, _)| *marker_id != id);
        inner.polylines.retain(|(line_id, _)| *line_id != id);
    }

    fn fit_bounds(&self, bounds: Bounds, _padding_px: u32) -> Result<(), MapError> {
        let mut inner = self.inner();
        if !inner.alive {
            return Err(MapError::SurfaceGone);
        }
        inner.viewport.fitted = Some(bounds);
        inner.viewport.center = GeoPoint {
            lat: (bounds.south_west.lat + bounds.north_east.lat) / 2.0,
            lng: (bounds.south_west.lng + bounds.north_east.lng) / 2.0,
        };
        Ok(())
    }

    fn inject_stylesheet(&self, name: &str, css: &str) {
        self.inner()
            .stylesheets
            .insert(name.to_string(), css.to_string());
    }

    fn remove_stylesheet(&self, name: &str) {
        self.inner().stylesheets.remove(name);
    }

    fn destroy(&self) {
        let mut inner = self.inner();
        inner.alive = false;
        inner.tile_layer = None;
        inner.markers.clear();
        inner.polylines.clear();
        inner.stylesheets.clear();
    }

    fn snapshot(&self) -> OverlaySnapshot {
        let inner = self.inner();
        OverlaySnapshot {
            markers: inner.markers.iter().map(|(_, m)| m.clone()).collect(),
            polylines: inner.polylines.iter().map(|(_, l)| l.clone()).collect(),
            stylesheets: inner.stylesheets.keys().cloned().collect(),
            viewport: inner.viewport.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_at(lat: f64, lng: f64) -> MarkerDescriptor {
        MarkerDescriptor {
            kind: MarkerKind::Waypoint,
            position: GeoPoint { lat, lng },
            color: "#64748b".to_string(),
            icon_html: String::new(),
            icon_size: (12, 12),
            pulse: false,
            popup: PopupContent::titled("test"),
        }
    }

    #[test]
    fn bounds_around_empty_is_none() {
        assert!(Bounds::around(&[]).is_none());
    }

    #[test]
    fn bounds_cover_all_points() {
        let bounds = Bounds::around(&[
            GeoPoint { lat: 33.5, lng: -7.5 },
            GeoPoint { lat: 35.7, lng: -5.8 },
            GeoPoint { lat: 30.4, lng: -9.6 },
        ])
        .unwrap();
        assert_eq!(bounds.south_west.lat, 30.4);
        assert_eq!(bounds.south_west.lng, -9.6);
        assert_eq!(bounds.north_east.lat, 35.7);
        assert_eq!(bounds.north_east.lng, -5.8);
    }

    #[test]
    fn removed_overlays_disappear_from_snapshot() {
        let stage = OverlayStage::new();
        stage.add_marker(marker_at(33.5, -7.5)).unwrap();
        let second = stage.add_marker(marker_at(34.0, -6.8)).unwrap();
        stage.remove_overlay(second);

        let snapshot = stage.snapshot();
        assert_eq!(snapshot.marker_count(), 1);
        assert_eq!(snapshot.markers[0].position.lat, 33.5);
    }

    #[test]
    fn destroyed_stage_rejects_new_overlays() {
        let stage = OverlayStage::new();
        stage.destroy();
        assert!(stage.add_marker(marker_at(0.0, 0.0)).is_err());
    }

    #[test]
    fn popup_renders_title_and_rows() {
        let popup = PopupContent::titled("DLV-7").row("Driver", "Hassan");
        let html = popup.to_html();
        assert!(html.contains("DLV-7"));
        assert!(html.contains("Driver"));
        assert!(html.contains("Hassan"));
    }
}
