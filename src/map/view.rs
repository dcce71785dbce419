use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::models::delivery::DeliveryRecord;
use crate::models::route::OptimizedRoute;
use crate::models::GeoPoint;

use super::icons;
use super::legend::{self, Legend};
use super::lifecycle::{MapConfig, MapLifecycle};
use super::render::{self, DeliveryLeg};
use super::surface::{MapError, MapSurface, OverlaySnapshot};

pub const EMPTY_DELIVERIES: &str = "no deliveries to display";
pub const EMPTY_ROUTES: &str = "no optimized routes to display";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPhase {
    Uninitialized,
    Idle,
    Rendering,
    Rendered,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RenderReport {
    pub drawn: usize,
    pub skipped: usize,
    pub markers: usize,
    pub geocode_fallbacks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapViewSnapshot {
    pub phase: ViewPhase,
    pub generation: u64,
    pub placeholder: Option<&'static str>,
    pub legend: Option<Legend>,
    pub overlay: OverlaySnapshot,
}

/// Shared plumbing for both map views: phase bookkeeping, clear-then-redraw,
/// staggered drawing, and the final viewport fit. The overlay on the surface
/// always corresponds to exactly the most recently supplied input list.
struct ViewCore {
    lifecycle: MapLifecycle,
    phase: ViewPhase,
    legend: Option<Legend>,
    placeholder: Option<&'static str>,
    generation: u64,
    stagger: Duration,
    empty_text: &'static str,
}

impl ViewCore {
    fn create(
        surface: Arc<dyn MapSurface>,
        config: &MapConfig,
        stagger: Duration,
        empty_text: &'static str,
    ) -> Result<Self, MapError> {
        let mut lifecycle = MapLifecycle::new(surface);
        if let Err(err) = lifecycle.initialize(config) {
            // the init/teardown pairing holds on the error path too
            lifecycle.teardown();
            return Err(err);
        }
        Ok(Self {
            lifecycle,
            phase: ViewPhase::Idle,
            legend: None,
            placeholder: Some(empty_text),
            generation: 0,
            stagger,
            empty_text,
        })
    }

    fn begin_pass(&mut self) {
        self.generation += 1;
        self.phase = ViewPhase::Rendering;
        self.lifecycle.clear_overlays();
    }

    fn finish_empty(&mut self) {
        self.legend = None;
        self.placeholder = Some(self.empty_text);
        self.phase = ViewPhase::Rendered;
    }

    fn finish_pass(&mut self, legend: Legend, coords: &[GeoPoint]) {
        if let Err(err) = self.lifecycle.fit_to_coordinates(coords) {
            warn!(error = %err, "viewport fit failed");
        }
        self.legend = Some(legend);
        self.placeholder = None;
        self.phase = ViewPhase::Rendered;
    }

    async fn stagger_before(&self, index: usize) {
        if index > 0 && !self.stagger.is_zero() {
            tokio::time::sleep(self.stagger).await;
        }
    }

    fn snapshot(&self) -> MapViewSnapshot {
        MapViewSnapshot {
            phase: self.phase,
            generation: self.generation,
            placeholder: self.placeholder,
            legend: self.legend.clone(),
            overlay: self.lifecycle.surface().snapshot(),
        }
    }

    fn teardown(&mut self) {
        self.lifecycle.teardown();
        self.legend = None;
        self.placeholder = None;
        self.phase = ViewPhase::Uninitialized;
    }
}

/// Map of raw deliveries: status-colored origin/destination pins joined by a
/// dashed line, city names resolved through the geocoding table.
pub struct DeliveryMapView {
    core: ViewCore,
}

impl DeliveryMapView {
    pub fn new(
        surface: Arc<dyn MapSurface>,
        config: &MapConfig,
        stagger: Duration,
    ) -> Result<Self, MapError> {
        Ok(Self {
            core: ViewCore::create(surface, config, stagger, EMPTY_DELIVERIES)?,
        })
    }

    pub async fn set_deliveries(&mut self, deliveries: &[DeliveryRecord]) -> RenderReport {
        self.core.begin_pass();

        if deliveries.is_empty() {
            self.core.finish_empty();
            return RenderReport::default();
        }

        let mut report = RenderReport::default();
        let mut coords = Vec::with_capacity(deliveries.len() * 2);
        for (index, delivery) in deliveries.iter().enumerate() {
            self.core.stagger_before(index).await;
            let leg = DeliveryLeg::resolve(delivery);
            report.geocode_fallbacks += leg.fallback_count();
            match render::draw_delivery(&mut self.core.lifecycle, delivery, &leg, &mut coords) {
                Ok(markers) => {
                    report.drawn += 1;
                    report.markers += markers;
                }
                Err(err) => {
                    report.skipped += 1;
                    warn!(delivery_id = %delivery.id, error = %err, "skipping delivery that failed to draw");
                }
            }
        }

        self.core.finish_pass(legend::delivery_legend(deliveries), &coords);
        report
    }

    pub fn snapshot(&self) -> MapViewSnapshot {
        self.core.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.core.generation
    }

    pub fn teardown(&mut self) {
        self.core.teardown();
    }
}

impl Drop for DeliveryMapView {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Map of externally optimized routes: start/end/waypoint markers and a
/// colored polyline per route, coordinates taken directly from the record.
pub struct OptimizationMapView {
    core: ViewCore,
}

impl OptimizationMapView {
    pub fn new(
        surface: Arc<dyn MapSurface>,
        config: &MapConfig,
        stagger: Duration,
    ) -> Result<Self, MapError> {
        Ok(Self {
            core: ViewCore::create(surface, config, stagger, EMPTY_ROUTES)?,
        })
    }

    pub async fn set_routes(&mut self, routes: &[OptimizedRoute]) -> RenderReport {
        self.core.begin_pass();

        if routes.is_empty() {
            self.core.finish_empty();
            return RenderReport::default();
        }

        let mut report = RenderReport::default();
        let mut coords = Vec::new();
        for (index, route) in routes.iter().enumerate() {
            self.core.stagger_before(index).await;
            let color = icons::route_color(index);
            match render::draw_route(&mut self.core.lifecycle, route, color, &mut coords) {
                Ok(markers) => {
                    report.drawn += 1;
                    report.markers += markers;
                }
                Err(err) => {
                    report.skipped += 1;
                    warn!(route_id = %route.id, error = %err, "skipping route that failed to draw");
                }
            }
        }

        self.core.finish_pass(legend::route_legend(routes), &coords);
        report
    }

    pub fn snapshot(&self) -> MapViewSnapshot {
        self.core.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.core.generation
    }

    pub fn teardown(&mut self) {
        self.core.teardown();
    }
}

impl Drop for OptimizationMapView {
    fn drop(&mut self) {
        self.teardown();
    }
}
