use std::sync::Arc;

use crate::models::GeoPoint;

use super::surface::{
    Bounds, MapError, MapSurface, MarkerDescriptor, OverlayId, PolylineDescriptor,
};

/// Default view: the whole delivery network, country-level zoom.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint { lat: 31.7917, lng: -7.0926 };
pub const DEFAULT_ZOOM: f64 = 6.0;

const FIT_PADDING_PX: u32 = 48;

pub const PULSE_STYLESHEET: &str = "fb-marker-pulse";
const PULSE_CSS: &str = "@keyframes fb-pulse { 0% { transform: scale(1); opacity: 1; } \
     70% { transform: scale(1.6); opacity: 0.35; } 100% { transform: scale(1); opacity: 1; } } \
     .fb-marker-pulse { animation: fb-pulse 1.8s ease-out infinite; }";

#[derive(Debug, Clone)]
pub struct MapConfig {
    pub center: GeoPoint,
    pub zoom: f64,
    pub tile_url: String,
    pub tile_attribution: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "© OpenStreetMap contributors".to_string(),
        }
    }
}

/// Owns one map widget: creation, the injected pulse stylesheet, the set of
/// overlays drawn on it, and teardown. Overlays added through this type are
/// tracked so `clear_overlays` removes exactly what a render pass drew,
/// leaving the base tiles alone.
pub struct MapLifecycle {
    surface: Arc<dyn MapSurface>,
    overlays: Vec<OverlayId>,
    initialized: bool,
}

impl MapLifecycle {
    pub fn new(surface: Arc<dyn MapSurface>) -> Self {
        Self {
            surface,
            overlays: Vec::new(),
            initialized: false,
        }
    }

    /// At most once per instance; calling again while initialized is a no-op.
    pub fn initialize(&mut self, config: &MapConfig) -> Result<(), MapError> {
        if self.initialized {
            return Ok(());
        }
        self.surface.set_view(config.center, config.zoom)?;
        self.surface
            .add_tile_layer(&config.tile_url, &config.tile_attribution)?;
        self.surface.inject_stylesheet(PULSE_STYLESHEET, PULSE_CSS);
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Safe to call in any state, any number of times.
    pub fn teardown(&mut self) {
        self.surface.remove_stylesheet(PULSE_STYLESHEET);
        self.surface.destroy();
        self.overlays.clear();
        self.initialized = false;
    }

    pub fn add_marker(&mut self, marker: MarkerDescriptor) -> Result<OverlayId, MapError> {
        let id = self.surface.add_marker(marker)?;
        self.overlays.push(id);
        Ok(id)
    }

    pub fn add_polyline(&mut self, line: PolylineDescriptor) -> Result<OverlayId, MapError> {
        let id = self.surface.add_polyline(line)?;
        self.overlays.push(id);
        Ok(id)
    }

    pub fn clear_overlays(&mut self) {
        for id in self.overlays.drain(..) {
            self.surface.remove_overlay(id);
        }
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// No-op when `coords` is empty: an empty render pass must not move the
    /// viewport the user is looking at.
    pub fn fit_to_coordinates(&self, coords: &[GeoPoint]) -> Result<(), MapError> {
        let Some(bounds) = Bounds::around(coords) else {
            return Ok(());
        };
        self.surface.fit_bounds(bounds, FIT_PADDING_PX)
    }

    pub fn surface(&self) -> &Arc<dyn MapSurface> {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::map::surface::OverlayStage;

    fn initialized_lifecycle() -> (Arc<OverlayStage>, MapLifecycle) {
        let stage = Arc::new(OverlayStage::new());
        let mut lifecycle = MapLifecycle::new(stage.clone());
        lifecycle.initialize(&MapConfig::default()).unwrap();
        (stage, lifecycle)
    }

    #[test]
    fn initialize_twice_is_a_noop() {
        let (stage, mut lifecycle) = initialized_lifecycle();
        lifecycle.initialize(&MapConfig::default()).unwrap();
        assert!(lifecycle.is_initialized());
        assert_eq!(stage.snapshot().stylesheets.len(), 1);
    }

    #[test]
    fn teardown_twice_leaves_no_stylesheet() {
        let (stage, mut lifecycle) = initialized_lifecycle();
        lifecycle.teardown();
        lifecycle.teardown();
        assert!(!lifecycle.is_initialized());
        assert!(stage.snapshot().stylesheets.is_empty());
    }

    #[test]
    fn teardown_without_initialize_is_safe() {
        let stage = Arc::new(OverlayStage::new());
        let mut lifecycle = MapLifecycle::new(stage);
        lifecycle.teardown();
    }

    #[test]
    fn fit_to_empty_coordinates_keeps_viewport() {
        let (stage, lifecycle) = initialized_lifecycle();
        let before = stage.snapshot().viewport;
        lifecycle.fit_to_coordinates(&[]).unwrap();
        assert_eq!(stage.snapshot().viewport, before);
    }

    #[test]
    fn fit_to_coordinates_records_bounds() {
        let (stage, lifecycle) = initialized_lifecycle();
        lifecycle
            .fit_to_coordinates(&[
                GeoPoint { lat: 33.5, lng: -7.5 },
                GeoPoint { lat: 34.0, lng: -6.8 },
            ])
            .unwrap();
        let viewport = stage.snapshot().viewport;
        let fitted = viewport.fitted.unwrap();
        assert_eq!(fitted.south_west.lat, 33.5);
        assert_eq!(fitted.north_east.lng, -6.8);
    }
}
