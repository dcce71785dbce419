use crate::models::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// City name -> coordinates for the network this operation serves. Lookup is
/// exact first, then substring (either direction, case-insensitive) in table
/// order, so aliases like "Tangier" still land on the right pin.
const CITY_TABLE: &[(&str, GeoPoint)] = &[
    ("Casablanca", GeoPoint { lat: 33.5731, lng: -7.5898 }),
    ("Rabat", GeoPoint { lat: 34.0209, lng: -6.8416 }),
    ("Rabat Agdal", GeoPoint { lat: 33.9986, lng: -6.8540 }),
    ("Marrakech", GeoPoint { lat: 31.6295, lng: -7.9811 }),
    ("Fes", GeoPoint { lat: 34.0181, lng: -5.0078 }),
    ("Tanger", GeoPoint { lat: 35.7595, lng: -5.8340 }),
    ("Tangier", GeoPoint { lat: 35.7595, lng: -5.8340 }),
    ("Agadir", GeoPoint { lat: 30.4278, lng: -9.5981 }),
    ("Meknes", GeoPoint { lat: 33.8935, lng: -5.5473 }),
    ("Oujda", GeoPoint { lat: 34.6814, lng: -1.9086 }),
    ("Kenitra", GeoPoint { lat: 34.2610, lng: -6.5802 }),
    ("Tetouan", GeoPoint { lat: 35.5785, lng: -5.3684 }),
    ("El Jadida", GeoPoint { lat: 33.2316, lng: -8.5007 }),
    ("Safi", GeoPoint { lat: 32.2994, lng: -9.2372 }),
    ("Mohammedia", GeoPoint { lat: 33.6866, lng: -7.3830 }),
    ("Khouribga", GeoPoint { lat: 32.8811, lng: -6.9063 }),
    ("Beni Mellal", GeoPoint { lat: 32.3373, lng: -6.3498 }),
    ("Nador", GeoPoint { lat: 35.1681, lng: -2.9335 }),
    ("Laayoune", GeoPoint { lat: 27.1253, lng: -13.1625 }),
    ("Errachidia", GeoPoint { lat: 31.9314, lng: -4.4246 }),
    ("Ouarzazate", GeoPoint { lat: 30.9189, lng: -6.8934 }),
    ("Essaouira", GeoPoint { lat: 31.5085, lng: -9.7595 }),
];

/// Where unresolvable names land. The outcome is reported to callers so a
/// wrong-but-plausible pin is never silent.
pub const FALLBACK_POINT: GeoPoint = GeoPoint { lat: 33.5731, lng: -7.5898 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Exact,
    Fuzzy,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub point: GeoPoint,
    pub outcome: LookupOutcome,
}

impl Resolved {
    pub fn is_fallback(&self) -> bool {
        self.outcome == LookupOutcome::Fallback
    }
}

/// Total lookup: never fails, never panics. Unresolvable names fall back to
/// [`FALLBACK_POINT`] with a diagnostic.
pub fn resolve(name: &str) -> GeoPoint {
    resolve_detailed(name).point
}

pub fn resolve_detailed(name: &str) -> Resolved {
    for (key, point) in CITY_TABLE {
        if *key == name {
            return Resolved {
                point: *point,
                outcome: LookupOutcome::Exact,
            };
        }
    }

    let needle = name.trim().to_lowercase();
    if !needle.is_empty() {
        for (key, point) in CITY_TABLE {
            let key_lower = key.to_lowercase();
            if key_lower.contains(&needle) || needle.contains(&key_lower) {
                return Resolved {
                    point: *point,
                    outcome: LookupOutcome::Fuzzy,
                };
            }
        }
    }

    tracing::warn!(name, "place name not in the geocoding table, using fallback point");
    Resolved {
        point: FALLBACK_POINT,
        outcome: LookupOutcome::Fallback,
    }
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}
