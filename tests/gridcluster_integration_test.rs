mod common;

use chrono::{TimeZone, Utc};
use common::{city_viewport, load_pitches, sorted_ids};
use gridcluster::{
    next_zoom_region, to_feature_collection, visible_points, Category, EdgePadding, GeoPoint,
    GridClusterer, MemorySource, Options, PointFilter, PointSource, RenderItem, ScreenSize,
    Viewport, DEFAULT_VISIBLE_LIMIT,
};

const PHONE: ScreenSize = ScreenSize {
    width: 390.0,
    height: 844.0,
};

fn visible_in_city(pitches: &[GeoPoint]) -> Vec<GeoPoint> {
    visible_points(pitches, &city_viewport(), None, DEFAULT_VISIBLE_LIMIT)
        .into_iter()
        .cloned()
        .collect()
}

fn member_ids(item: &RenderItem) -> Vec<&str> {
    item.points().iter().map(|p| p.id.as_str()).collect()
}

#[test]
fn test_load_fixture() {
    let pitches = load_pitches();

    assert_eq!(pitches.len(), 13);
    assert_eq!(pitches[0].id, "boqueria-1");
    assert_eq!(pitches[0].category(), Category::Food);
    assert_eq!(pitches[12].category(), Category::Other);
}

#[test]
fn test_cluster_city_view() {
    let visible = visible_in_city(&load_pitches());

    assert_eq!(visible.len(), 9);

    let items = GridClusterer::default().cluster(&visible, &city_viewport());
    let counts: Vec<usize> = items.iter().map(RenderItem::count).collect();

    assert_eq!(counts, vec![3, 2, 1, 1, 1, 1]);
    assert_eq!(
        member_ids(&items[0]),
        vec!["boqueria-1", "boqueria-2", "boqueria-3"]
    );
    assert_eq!(member_ids(&items[1]), vec!["sagrada-1", "sagrada-2"]);
    assert!(items[2..].iter().all(|item| !item.is_cluster()));
}

#[test]
fn test_every_point_is_rendered_exactly_once() {
    let pitches = load_pitches();
    let expected = sorted_ids(&pitches);
    let clusterer = GridClusterer::default();
    let mut viewport = Viewport::new(41.3874, 2.1686, 180.0, 360.0);

    for _ in 0..24 {
        let items = clusterer.cluster(&pitches, &viewport);
        let rendered = sorted_ids(items.iter().flat_map(RenderItem::points));

        assert_eq!(rendered, expected, "at {viewport:?}");

        viewport = next_zoom_region(&viewport);
    }
}

#[test]
fn test_world_view_groups_by_region() {
    let items = GridClusterer::default().cluster(
        &load_pitches(),
        &Viewport::new(41.3874, 2.1686, 180.0, 360.0),
    );

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].count(), 11);
    assert_eq!(member_ids(&items[1]), vec!["madrid", "valencia"]);
}

#[test]
fn test_street_view_splits_almost_everything() {
    let items = GridClusterer::default().cluster(
        &load_pitches(),
        &Viewport::new(41.3874, 2.1686, 0.005, 0.005),
    );

    assert_eq!(items.len(), 11);
    assert_eq!(items.iter().filter(|item| item.is_cluster()).count(), 2);
}

#[test]
fn test_smaller_cells_split_more() {
    let pitches = load_pitches();
    let viewport = Viewport::new(41.3874, 2.1686, 0.3, 0.3);

    let coarse = GridClusterer::new(Options {
        cell_size: 128.0,
        ..Options::default()
    })
    .cluster(&pitches, &viewport);
    let fine = GridClusterer::default().cluster(&pitches, &viewport);

    assert!(coarse.len() <= fine.len());
    assert_eq!(fine.len(), 5);
}

#[test]
fn test_cluster_from_source_listing() {
    let source = MemorySource::with_points(load_pitches());
    let filter = PointFilter {
        query: Some("mercad".to_string()),
        ..PointFilter::default()
    };

    let listed = source.list_points(&filter).unwrap();
    let items = GridClusterer::default().cluster(&listed, &city_viewport());

    assert_eq!(items.len(), 1);
    assert_eq!(member_ids(&items[0]), vec!["boqueria-3", "boqueria-2"]);
}

#[test]
fn test_tapping_a_cluster_splits_it() {
    let visible = visible_in_city(&load_pitches());
    let clusterer = GridClusterer::default();

    for item in clusterer.cluster(&visible, &city_viewport()) {
        let RenderItem::Cluster(cluster) = item else {
            continue;
        };

        let zoomed = cluster.expansion_viewport(EdgePadding::default(), PHONE);
        let bounds = zoomed.bounds();
        let split = clusterer.cluster(&cluster.members, &zoomed);

        assert!(cluster.members.iter().all(|p| bounds.contains(p.lat, p.lng)));
        assert_eq!(split.len(), cluster.count, "{} did not split", cluster.id);
    }
}

#[test]
fn test_geojson_output() {
    let visible = visible_in_city(&load_pitches());
    let items = GridClusterer::default().cluster(&visible, &city_viewport());

    let collection = to_feature_collection(&items).unwrap();

    assert_eq!(collection.features.len(), 6);

    let first = collection.features[0].properties.as_ref().unwrap();
    assert_eq!(first["cluster"], true);
    assert_eq!(first["point_count"], 3);

    let last = collection.features[5].properties.as_ref().unwrap();
    assert!(last.get("cluster").is_none());
    assert!(last.get("title").is_some());
}

#[test]
fn test_render_items_survive_json() {
    let items = GridClusterer::default().cluster(&load_pitches(), &city_viewport());

    let json = serde_json::to_value(&items).unwrap();
    let back: Vec<RenderItem> = serde_json::from_value(json).unwrap();

    assert_eq!(back, items);
}

#[test]
fn test_live_window_from_fixture() {
    let pitches = load_pitches();
    let night_visit = pitches.iter().find(|p| p.id == "sagrada-1").unwrap();
    let during = Utc.with_ymd_and_hms(2025, 6, 21, 21, 30, 0).unwrap();
    let after = Utc.with_ymd_and_hms(2025, 6, 22, 0, 30, 0).unwrap();

    assert!(night_visit.is_live_at(during));
    assert!(!night_visit.is_live_at(after));
    assert_eq!(pitches.iter().filter(|p| p.is_live_at(during)).count(), 1);
}
