//! Hand-built graphs with known answers, run through both searches

mod common;

use std::sync::{Arc, Mutex};

use butterfly_search::attributes::{BorderCrossing, BorderType, EdgeStore, VecStore};
use butterfly_search::matrix::rphast_path_metrics;
use butterfly_search::weighting::{BorderRestriction, BordersWeighting};
use butterfly_search::{
    DistanceMatrix, Error, Graph, HistogramObserver, OneToManyDijkstra, PathMetrics, RphastSearch,
    ShortestWeighting, TraversalMode,
};

use common::{contract, diamond, init_tracing, two_sources_one_target};

#[test]
fn diamond_plain_search_takes_the_short_side() {
    init_tracing();
    let g = diamond();
    let mut search = OneToManyDijkstra::new(&g, ShortestWeighting);
    let res = search.calc_paths(1, &[4]).unwrap();

    let idx = res[0].unwrap();
    assert_eq!(search.entry(idx).unwrap().weight, 6.0);
    assert_eq!(search.path_edges(idx), vec![2, 3]);
    assert_eq!(search.tree().path_nodes(idx), vec![1, 3, 4]);

    let metrics = PathMetrics::for_base_path(&g, search.path_edges(idx), 6.0);
    assert_eq!(metrics.distance, 6.0);
}

#[test]
fn diamond_hierarchy_search_unpacks_through_node_3() {
    init_tracing();
    let base = Arc::new(diamond());
    // 2 and 3 contracted first, so 1→4 exists only as shortcuts
    let ch = contract(base, &ShortestWeighting, &[0, 2, 3, 1, 4]);
    assert_eq!(ch.shortcut_count(), 2);

    let mut search = RphastSearch::new(&ch, ShortestWeighting);
    search.prepare(&[1], &[4]).unwrap();
    let res = search.calc_paths(&[1], &[4]).unwrap();

    let matrix = DistanceMatrix::from_rphast(&search, 1, &res);
    assert_eq!(matrix.get(0, 0), Some(6.0));

    let metrics = rphast_path_metrics(&search, 1, &res);
    let path = metrics[0].as_ref().unwrap();
    assert_eq!(path.edges, vec![2, 3]);
    assert_eq!(path.distance, 6.0);
}

#[test]
fn many_to_many_returns_every_pair() {
    let base = Arc::new(two_sources_one_target());
    let ch = contract(base.clone(), &ShortestWeighting, &[0, 1, 2, 3]);

    let mut search = RphastSearch::new(&ch, ShortestWeighting);
    search.prepare(&[0, 1], &[3]).unwrap();
    let res = search.calc_paths(&[0, 1], &[3]).unwrap();
    let matrix = DistanceMatrix::from_rphast(&search, 2, &res);

    assert_eq!(matrix.get(0, 0), Some(10.0));
    assert_eq!(matrix.get(1, 0), Some(7.0));

    // same numbers one source at a time
    let mut plain = OneToManyDijkstra::new(base.as_ref(), ShortestWeighting);
    for (s, expected) in [(0, 10.0), (1, 7.0)] {
        let res = plain.calc_paths(s, &[3]).unwrap();
        let row = DistanceMatrix::from_one_to_many(&plain, &res);
        assert_eq!(row.get(0, 0), Some(expected));
    }
}

#[test]
fn zero_budget_only_reaches_the_source() {
    let g = diamond();
    let mut plain = OneToManyDijkstra::new(&g, ShortestWeighting);
    plain.set_max_visited_nodes(0);
    let res = plain.calc_paths(1, &[4, 1, 2]).unwrap();
    let row = DistanceMatrix::from_one_to_many(&plain, &res);
    assert_eq!(row.row(0), &[None, Some(0.0), None]);
    assert_eq!(plain.visited_nodes(), 0);

    let ch = contract(Arc::new(diamond()), &ShortestWeighting, &[0, 1, 2, 3, 4]);
    let mut rphast = RphastSearch::new(&ch, ShortestWeighting);
    rphast.set_max_visited_nodes(0);
    rphast.prepare(&[1], &[4, 1]).unwrap();
    let res = rphast.calc_paths(&[1], &[4, 1]).unwrap();
    let row = DistanceMatrix::from_rphast(&rphast, 1, &res);
    assert_eq!(row.row(0), &[None, Some(0.0)]);
}

#[test]
fn forbidden_border_forces_the_long_side() {
    let g = diamond();
    let mut crossings = VecStore::new(g.edge_count(), BorderCrossing::default());
    crossings
        .set(2, BorderCrossing::crossing(BorderType::Controlled, 56, 276))
        .unwrap();
    let store: Arc<dyn EdgeStore<BorderCrossing>> = Arc::new(crossings);

    let allow = BordersWeighting::new(
        ShortestWeighting,
        Some(store.clone()),
        BorderRestriction::AllowAll,
        std::iter::empty(),
    )
    .unwrap();
    let forbid = BordersWeighting::new(
        ShortestWeighting,
        Some(store.clone()),
        BorderRestriction::ForbidControlled,
        std::iter::empty(),
    )
    .unwrap();
    let avoid_be =
        BordersWeighting::new(ShortestWeighting, Some(store), BorderRestriction::AllowAll, [56])
            .unwrap();

    let cost = |w: &BordersWeighting<ShortestWeighting>| {
        let mut search = OneToManyDijkstra::new(&g, w);
        let res = search.calc_paths(1, &[4]).unwrap();
        let weight = res[0].and_then(|idx| search.entry(idx)).map(|e| e.weight);
        weight
    };
    assert_eq!(cost(&allow), Some(6.0));
    assert_eq!(cost(&forbid), Some(10.0));
    assert_eq!(cost(&avoid_be), Some(10.0));
}

#[test]
fn unprepared_and_edge_based_hierarchy_queries_fail() {
    let ch = contract(Arc::new(diamond()), &ShortestWeighting, &[0, 1, 2, 3, 4]);

    let mut search = RphastSearch::new(&ch, ShortestWeighting);
    assert!(matches!(search.calc_paths(&[1], &[4]), Err(Error::NotPrepared)));

    let mut edge_based =
        RphastSearch::new(&ch, ShortestWeighting).with_mode(TraversalMode::EdgeBased);
    assert!(matches!(
        edge_based.prepare(&[1], &[4]),
        Err(Error::UnsupportedMode(_))
    ));

    assert!(matches!(
        search.prepare(&[1], &[99]),
        Err(Error::InvalidNode { node: 99, .. })
    ));
}

#[test]
fn shared_observer_sees_both_searches() {
    let g = diamond();
    let ch = contract(Arc::new(diamond()), &ShortestWeighting, &[0, 2, 3, 1, 4]);
    let observer = Arc::new(Mutex::new(HistogramObserver::new().unwrap()));

    let mut plain = OneToManyDijkstra::new(&g, ShortestWeighting);
    plain.set_observer(Box::new(observer.clone()));
    plain.calc_paths(1, &[4]).unwrap();

    let mut rphast = RphastSearch::new(&ch, ShortestWeighting);
    rphast.set_observer(Box::new(observer.clone()));
    rphast.prepare(&[1], &[4, 0]).unwrap();
    rphast.calc_paths(&[1], &[4, 0]).unwrap();

    let summary = observer.lock().unwrap().summary();
    assert_eq!(summary.queries, 2);
    assert_eq!(summary.unreached_targets, 1);
    assert_eq!(summary.budget_exhausted, 0);
}
