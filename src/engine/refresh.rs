use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::models::delivery::DeliveryRecord;
use crate::models::route::OptimizedRoute;
use crate::state::{AppState, PushEvent};
use crate::store::{Table, TableChange};

/// Consumes row-store change notifications and re-runs the fetch-and-rerender
/// pass for the affected map view. Bursts are coalesced into one pass; a fetch
/// that completes after a newer one was requested is discarded, so the views
/// always end up reflecting the latest store contents.
pub async fn run_refresh_engine(state: Arc<AppState>) {
    info!("map refresh engine started");

    let mut deliveries_rx = state.store.subscribe(Table::Deliveries);
    let mut routes_rx = state.store.subscribe(Table::Routes);

    // initial pass so the views reflect whatever the store already holds
    refresh_deliveries(&state).await;
    refresh_routes(&state).await;

    loop {
        tokio::select! {
            change = deliveries_rx.recv() => match change {
                Ok(_) => {
                    drain(&mut deliveries_rx);
                    refresh_deliveries(&state).await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "delivery change stream lagged, refreshing anyway");
                    refresh_deliveries(&state).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            change = routes_rx.recv() => match change {
                Ok(_) => {
                    drain(&mut routes_rx);
                    refresh_routes(&state).await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "route change stream lagged, refreshing anyway");
                    refresh_routes(&state).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    warn!("map refresh engine stopped: change streams closed");
}

fn drain(rx: &mut broadcast::Receiver<TableChange>) {
    loop {
        match rx.try_recv() {
            Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

pub async fn refresh_deliveries(state: &AppState) {
    let generation = state.delivery_generation.fetch_add(1, Ordering::SeqCst) + 1;
    let started = Instant::now();

    let rows = match state.store.select(Table::Deliveries).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(error = %err, "delivery fetch failed");
            state
                .metrics
                .render_passes_total
                .with_label_values(&["deliveries", "error"])
                .inc();
            return;
        }
    };

    if state.delivery_generation.load(Ordering::SeqCst) != generation {
        debug!(generation, "delivery refresh superseded by a newer one");
        return;
    }

    let deliveries: Vec<DeliveryRecord> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(delivery) => Some(delivery),
            Err(err) => {
                warn!(error = %err, "skipping malformed delivery row");
                None
            }
        })
        .collect();

    let mut view = state.delivery_view.lock().await;
    let report = view.set_deliveries(&deliveries).await;
    let view_generation = view.generation();
    drop(view);

    let outcome = if report.skipped > 0 { "partial" } else { "success" };
    state
        .metrics
        .render_passes_total
        .with_label_values(&["deliveries", outcome])
        .inc();
    state
        .metrics
        .render_pass_duration_seconds
        .with_label_values(&["deliveries"])
        .observe(started.elapsed().as_secs_f64());
    state
        .metrics
        .overlay_markers
        .with_label_values(&["deliveries"])
        .set(report.markers as i64);
    state
        .metrics
        .geocode_fallbacks_total
        .inc_by(report.geocode_fallbacks as u64);

    let _ = state.events_tx.send(PushEvent::OverlayUpdated {
        view: "deliveries",
        generation: view_generation,
    });

    info!(
        drawn = report.drawn,
        skipped = report.skipped,
        markers = report.markers,
        "delivery overlay refreshed"
    );
}

pub async fn refresh_routes(state: &AppState) {
    let generation = state.route_generation.fetch_add(1, Ordering::SeqCst) + 1;
    let started = Instant::now();

    let rows = match state.store.select(Table::Routes).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(error = %err, "route fetch failed");
            state
                .metrics
                .render_passes_total
                .with_label_values(&["routes", "error"])
                .inc();
            return;
        }
    };

    if state.route_generation.load(Ordering::SeqCst) != generation {
        debug!(generation, "route refresh superseded by a newer one");
        return;
    }

    let routes: Vec<OptimizedRoute> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(route) => Some(route),
            Err(err) => {
                warn!(error = %err, "skipping malformed route row");
                None
            }
        })
        .collect();

    let mut view = state.route_view.lock().await;
    let report = view.set_routes(&routes).await;
    let view_generation = view.generation();
    drop(view);

    let outcome = if report.skipped > 0 { "partial" } else { "success" };
    state
        .metrics
        .render_passes_total
        .with_label_values(&["routes", outcome])
        .inc();
    state
        .metrics
        .render_pass_duration_seconds
        .with_label_values(&["routes"])
        .observe(started.elapsed().as_secs_f64());
    state
        .metrics
        .overlay_markers
        .with_label_values(&["routes"])
        .set(report.markers as i64);

    let _ = state.events_tx.send(PushEvent::OverlayUpdated {
        view: "routes",
        generation: view_generation,
    });

    info!(
        drawn = report.drawn,
        skipped = report.skipped,
        markers = report.markers,
        "route overlay refreshed"
    );
}
