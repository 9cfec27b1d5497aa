//! Distâncias geográficas para a tela de sensores próximos.

use crate::types::{GeoPoint, SensorData};

/// Raio médio da Terra (m).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Raio padrão da busca por sensores próximos (m).
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 1000.0;

/// Distância de grande círculo (haversine) em metros.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Nós posicionados a até `radius_m` metros de `center`, na ordem original.
pub fn within_radius<'a>(
    center: GeoPoint,
    nodes: &'a [SensorData],
    radius_m: f64,
) -> Vec<&'a SensorData> {
    nodes
        .iter()
        .filter(|node| {
            node.position()
                .is_some_and(|p| distance_meters(center, p) <= radius_m)
        })
        .collect()
}

/// Como [`within_radius`], com a distância, do mais próximo ao mais longe.
pub fn nearest_first<'a>(
    center: GeoPoint,
    nodes: &'a [SensorData],
    radius_m: f64,
) -> Vec<(&'a SensorData, f64)> {
    let mut hits: Vec<(&SensorData, f64)> = nodes
        .iter()
        .filter_map(|node| Some((node, distance_meters(center, node.position()?))))
        .filter(|(_, d)| *d <= radius_m)
        .collect();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(name: &str, lat: f64, lon: f64) -> SensorData {
        SensorData {
            node_name: Some(name.into()),
            latitude: Some(lat),
            longitude: Some(lon),
            ..Default::default()
        }
    }

    #[test]
    fn zero_distance_to_itself() {
        let p = GeoPoint { lat: 7.29, lon: 80.63 };
        assert!(distance_meters(p, p).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = GeoPoint { lat: 0.0, lon: 0.0 };
        let b = GeoPoint { lat: 1.0, lon: 0.0 };
        let d = distance_meters(a, b);
        // 2πR/360 ≈ 111 195 m
        assert!((d - 111_195.0).abs() < 10.0, "d = {d}");
    }

    #[test]
    fn symmetric() {
        let a = GeoPoint { lat: 7.29, lon: 80.63 };
        let b = GeoPoint { lat: 6.93, lon: 79.85 };
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6);
    }

    #[test]
    fn radius_filter_skips_far_and_unpositioned_nodes() {
        let center = GeoPoint { lat: 7.29, lon: 80.63 };
        let nodes = vec![
            at("near", 7.2950, 80.6300),  // ~555 m
            at("far", 7.3100, 80.6300),   // ~2.2 km
            SensorData {
                node_name: Some("lost".into()),
                ..Default::default()
            },
            at("center", 7.29, 80.63),
        ];
        let hits: Vec<_> = within_radius(center, &nodes, DEFAULT_NEARBY_RADIUS_M)
            .into_iter()
            .map(|n| n.name_or("?"))
            .collect();
        assert_eq!(hits, ["near", "center"]);
    }

    #[test]
    fn nearest_first_sorts_by_distance() {
        let center = GeoPoint { lat: 7.29, lon: 80.63 };
        let nodes = vec![
            at("near", 7.2950, 80.6300),
            at("far", 7.3100, 80.6300),
            at("center", 7.29, 80.63),
        ];
        let hits = nearest_first(center, &nodes, DEFAULT_NEARBY_RADIUS_M);
        let names: Vec<_> = hits.iter().map(|(n, _)| n.name_or("?")).collect();
        assert_eq!(names, ["center", "near"]);
        assert!(hits[0].1 < 1.0);
        assert!((hits[1].1 - 555.0).abs() < 10.0);
    }
}
