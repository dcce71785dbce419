use serde::Serialize;

use crate::models::delivery::{DeliveryRecord, DeliveryStatus};
use crate::models::route::OptimizedRoute;

use super::icons;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub count: usize,
}

/// Purely derived from the current input list; holds no state of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub total: usize,
}

/// One entry per status present in the list, in status order.
pub fn delivery_legend(deliveries: &[DeliveryRecord]) -> Legend {
    let entries = DeliveryStatus::ALL
        .iter()
        .filter_map(|status| {
            let count = deliveries.iter().filter(|d| d.status == *status).count();
            if count == 0 {
                return None;
            }
            Some(LegendEntry {
                label: status.as_str().to_string(),
                color: icons::status_color(*status).to_string(),
                count,
            })
        })
        .collect();

    Legend {
        entries,
        total: deliveries.len(),
    }
}

/// One swatch per route, matching the polyline color it was drawn with.
pub fn route_legend(routes: &[OptimizedRoute]) -> Legend {
    let entries = routes
        .iter()
        .enumerate()
        .map(|(index, route)| LegendEntry {
            label: format!("{} — {} → {}", route.vehicle, route.origin, route.destination),
            color: icons::route_color(index).to_string(),
            count: 1,
        })
        .collect();

    Legend {
        entries,
        total: routes.len(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::delivery::{DeliveryRecord, DeliveryStatus};

    fn delivery(seed: u128, status: DeliveryStatus) -> DeliveryRecord {
        DeliveryRecord {
            id: Uuid::from_u128(seed),
            date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            time: "10:00".to_string(),
            driver: "Karim Tazi".to_string(),
            vehicle: "VAN-21".to_string(),
            origin: "Casablanca".to_string(),
            destination: "Rabat".to_string(),
            status,
            notes: None,
        }
    }

    #[test]
    fn legend_counts_by_status_and_skips_absent_ones() {
        let legend = delivery_legend(&[
            delivery(1, DeliveryStatus::Planned),
            delivery(2, DeliveryStatus::Planned),
            delivery(3, DeliveryStatus::Delayed),
        ]);

        assert_eq!(legend.total, 3);
        assert_eq!(legend.entries.len(), 2);
        assert_eq!(legend.entries[0].label, "planned");
        assert_eq!(legend.entries[0].count, 2);
        assert_eq!(legend.entries[1].label, "delayed");
        assert_eq!(legend.entries[1].count, 1);
    }

    #[test]
    fn empty_input_yields_empty_legend() {
        let legend = delivery_legend(&[]);
        assert!(legend.entries.is_empty());
        assert_eq!(legend.total, 0);
    }
}
