use gridcluster::{points_from_geojson, GeoPoint, Viewport};
use std::{fs, path::Path};

#[allow(dead_code)]
pub fn city_viewport() -> Viewport {
    Viewport::new(41.3874, 2.1686, 0.08, 0.08)
}

#[allow(dead_code)]
pub fn load_pitches() -> Vec<GeoPoint> {
    let file_path = Path::new("./tests/common/pitches.json");
    let json_string = fs::read_to_string(file_path).expect("pitches.json was not found");

    points_from_geojson(&json_string).expect("pitches.json was not parsed")
}

#[allow(dead_code)]
pub fn sorted_ids<'a, I>(points: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a GeoPoint>,
{
    let mut ids: Vec<String> = points.into_iter().map(|p| p.id.clone()).collect();
    ids.sort();

    ids
}
