use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub render_passes_total: IntCounterVec,
    pub render_pass_duration_seconds: HistogramVec,
    pub overlay_markers: IntGaugeVec,
    pub geocode_fallbacks_total: IntCounter,
    pub login_attempts_total: IntCounterVec,
    pub permission_denials_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let render_passes_total = IntCounterVec::new(
            Opts::new("render_passes_total", "Map render passes by view and outcome"),
            &["view", "outcome"],
        )
        .expect("valid render_passes_total metric");

        let render_pass_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "render_pass_duration_seconds",
                "Duration of a map render pass in seconds",
            ),
            &["view"],
        )
        .expect("valid render_pass_duration_seconds metric");

        let overlay_markers = IntGaugeVec::new(
            Opts::new("overlay_markers", "Markers currently drawn per view"),
            &["view"],
        )
        .expect("valid overlay_markers metric");

        let geocode_fallbacks_total = IntCounter::new(
            "geocode_fallbacks_total",
            "Place names that fell back to the default point",
        )
        .expect("valid geocode_fallbacks_total metric");

        let login_attempts_total = IntCounterVec::new(
            Opts::new("login_attempts_total", "Login attempts by outcome"),
            &["outcome"],
        )
        .expect("valid login_attempts_total metric");

        let permission_denials_total = IntCounterVec::new(
            Opts::new("permission_denials_total", "Denied actions by action name"),
            &["action"],
        )
        .expect("valid permission_denials_total metric");

        registry
            .register(Box::new(render_passes_total.clone()))
            .expect("register render_passes_total");
        registry
            .register(Box::new(render_pass_duration_seconds.clone()))
            .expect("register render_pass_duration_seconds");
        registry
            .register(Box::new(overlay_markers.clone()))
            .expect("register overlay_markers");
        registry
            .register(Box::new(geocode_fallbacks_total.clone()))
            .expect("register geocode_fallbacks_total");
        registry
            .register(Box::new(login_attempts_total.clone()))
            .expect("register login_attempts_total");
        registry
            .register(Box::new(permission_denials_total.clone()))
            .expect("register permission_denials_total");

        Self {
            registry,
            render_passes_total,
            render_pass_duration_seconds,
            overlay_markers,
            geocode_fallbacks_total,
            login_attempts_total,
            permission_denials_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
