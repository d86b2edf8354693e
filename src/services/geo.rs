use crate::models::Coordinates;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Great-circle distance between two points using the haversine formula
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Selects the `k` items closest to `origin` by great-circle distance
///
/// Items at equal distance keep their input order. The result is ordered
/// nearest first.
pub fn nearest_k<T, F>(items: Vec<T>, origin: Coordinates, k: usize, coordinates: F) -> Vec<T>
where
    F: Fn(&T) -> Coordinates,
{
    if k == 0 {
        return Vec::new();
    }

    let mut keyed: Vec<(f64, usize, T)> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| (haversine_meters(origin, coordinates(&item)), index, item))
        .collect();

    let by_distance =
        |a: &(f64, usize, T), b: &(f64, usize, T)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));

    if keyed.len() > k {
        keyed.select_nth_unstable_by(k - 1, by_distance);
        keyed.truncate(k);
    }
    keyed.sort_unstable_by(by_distance);

    keyed.into_iter().map(|(_, _, item)| item).collect()
}
