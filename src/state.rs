use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::auth::notify::{NoticeLevel, Notifier};
use crate::auth::session::AuthService;
use crate::config::Config;
use crate::map::lifecycle::MapConfig;
use crate::map::surface::{MapError, OverlayStage};
use crate::map::view::{DeliveryMapView, OptimizationMapView};
use crate::observability::metrics::Metrics;
use crate::store::{RowStore, SessionProvider};

/// Events pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    OverlayUpdated { view: &'static str, generation: u64 },
    Notice { level: NoticeLevel, message: String },
}

/// Notifier that logs and forwards notices onto the push channel so connected
/// clients see them as toasts.
pub struct PushNotifier {
    tx: broadcast::Sender<PushEvent>,
}

impl Notifier for PushNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!(notice = message),
            NoticeLevel::Warning => warn!(notice = message),
            NoticeLevel::Error => error!(notice = message),
        }
        let _ = self.tx.send(PushEvent::Notice {
            level,
            message: message.to_string(),
        });
    }
}

pub struct AppState {
    pub store: Arc<dyn RowStore>,
    pub auth: RwLock<AuthService>,
    pub delivery_view: Mutex<DeliveryMapView>,
    pub route_view: Mutex<OptimizationMapView>,
    pub events_tx: broadcast::Sender<PushEvent>,
    pub metrics: Metrics,
    pub delivery_generation: AtomicU64,
    pub route_generation: AtomicU64,
}

impl AppState {
    pub async fn new(
        store: Arc<dyn RowStore>,
        provider: Arc<dyn SessionProvider>,
        config: &Config,
    ) -> Result<Self, MapError> {
        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);
        let notifier = Arc::new(PushNotifier {
            tx: events_tx.clone(),
        });

        let auth = AuthService::init(provider, store.clone(), notifier).await;

        let map_config = MapConfig {
            tile_url: config.tile_url.clone(),
            tile_attribution: config.tile_attribution.clone(),
            ..MapConfig::default()
        };
        let stagger = Duration::from_millis(config.render_stagger_ms);
        let delivery_view =
            DeliveryMapView::new(Arc::new(OverlayStage::new()), &map_config, stagger)?;
        let route_view =
            OptimizationMapView::new(Arc::new(OverlayStage::new()), &map_config, stagger)?;

        Ok(Self {
            store,
            auth: RwLock::new(auth),
            delivery_view: Mutex::new(delivery_view),
            route_view: Mutex::new(route_view),
            events_tx,
            metrics: Metrics::new(),
            delivery_generation: AtomicU64::new(0),
            route_generation: AtomicU64::new(0),
        })
    }
}
