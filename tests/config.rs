//! TOML profiles against hand-composed weighting stacks

mod common;

use std::io::Write;
use std::sync::Arc;

use butterfly_search::attributes::{BorderCrossing, BorderType, VecStore};
use butterfly_search::weighting::{
    AvoidFeaturesWeighting, BorderRestriction, BordersWeighting, GreenWeighting,
};
use butterfly_search::{
    AttributeStores, AvoidFeatures, Error, FastestWeighting, Graph, OneToManyDijkstra,
    ProfileConfig, RoadGraph, TraversalMode, TravelMode, Weighting,
};

use common::{assert_same_cost, diamond};

const PROFILE: &str = r#"
[weighting]
base = "fastest"
max_speed_kmh = 40.0
travel_mode = "cycling"
avoid_features = ["ferries"]
green = 0.5

[weighting.borders]
restriction = "forbid_controlled"

[search]
max_visited_nodes = 1000
"#;

fn stores(g: &RoadGraph) -> AttributeStores {
    let n = g.edge_count();
    let mut categories = VecStore::new(n, AvoidFeatures::NONE);
    categories.set(0, AvoidFeatures::FERRIES).unwrap();
    let mut borders = VecStore::new(n, BorderCrossing::default());
    borders
        .set(3, BorderCrossing::crossing(BorderType::Controlled, 56, 250))
        .unwrap();
    let mut green = VecStore::new(n, 0u8);
    green.set(1, 63).unwrap();

    AttributeStores {
        way_category: Some(Arc::new(categories)),
        borders: Some(Arc::new(borders)),
        green: Some(Arc::new(green)),
        ..Default::default()
    }
}

#[test]
fn profile_file_matches_hand_built_stack() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROFILE.as_bytes()).unwrap();
    let profile = ProfileConfig::from_file(file.path()).unwrap();
    assert_eq!(profile.search.max_visited_nodes, 1000);
    assert_eq!(profile.search.traversal, TraversalMode::NodeBased);

    let g = diamond();
    let stores = stores(&g);
    let from_config = profile.build_weighting(&stores).unwrap();

    let by_hand = GreenWeighting::new(
        BordersWeighting::new(
            AvoidFeaturesWeighting::new(
                FastestWeighting::with_max_speed(40.0).unwrap(),
                TravelMode::Cycling,
                AvoidFeatures::FERRIES,
                stores.way_category.clone(),
                stores.steepness.clone(),
            )
            .unwrap(),
            stores.borders.clone(),
            BorderRestriction::ForbidControlled,
            std::iter::empty(),
        )
        .unwrap(),
        stores.green.clone(),
        0.5,
    )
    .unwrap();

    for id in 0..g.edge_count() as u32 {
        let edge = g.edge(id).unwrap();
        let a = from_config.calc_weight(&edge, false, None).unwrap();
        let b = by_hand.calc_weight(&edge, false, None).unwrap();
        if a.is_infinite() || b.is_infinite() {
            assert_eq!(a, b, "edge {id}");
        } else {
            assert_same_cost(Some(a), Some(b), &format!("edge {id}"));
        }
    }

    // the controlled border closes 3→4, the ferry on 1→2 is only expensive
    let mut search = OneToManyDijkstra::new(&g, from_config);
    search.set_max_visited_nodes(profile.search.max_visited_nodes);
    let res = search.calc_paths(1, &[4, 3]).unwrap();
    let to_4 = res[0].unwrap();
    assert_eq!(search.path_edges(to_4), vec![0, 1]);
    assert!(search.entry(to_4).unwrap().weight > 1000.0);
    assert!(res[1].is_some());
}

#[test]
fn missing_profile_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProfileConfig::from_file(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn malformed_profile_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[weighting\nbase = ").unwrap();
    let err = ProfileConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
}

#[test]
fn profile_needing_absent_store_fails_before_search() {
    let profile: ProfileConfig = "[weighting]\n[weighting.steepness]\ndifficulty = 2\n"
        .parse()
        .unwrap();
    let err = profile.build_weighting(&AttributeStores::default()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let bad_difficulty: ProfileConfig = "[weighting.steepness]\ndifficulty = 7\n".parse().unwrap();
    let stores = AttributeStores {
        steepness: Some(Arc::new(VecStore::new(1, 0u8))),
        ..Default::default()
    };
    assert!(matches!(
        bad_difficulty.build_weighting(&stores),
        Err(Error::Configuration(_))
    ));
}
