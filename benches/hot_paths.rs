use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fruit_map::geo::LatLng;
use fruit_map::map::{BaseLayer, Surface, TerminalHost};
use fruit_map::markers::{icon_for, MarkerRegistry};
use fruit_map::model::TreeRecord;

const KINDS: [&str; 6] = ["Lemon", "Fig", "Loquat", "Olive", "Orange", "Durian"];

fn snapshot(n: u64) -> Vec<TreeRecord> {
    (0..n)
        .map(|i| {
            let position = LatLng::new(-34.60 - (i % 100) as f64 * 1e-4, -58.38 - (i / 100) as f64 * 1e-4);
            TreeRecord::new(i, KINDS[i as usize % KINDS.len()], "sp.", position, i % 3 == 0)
        })
        .collect()
}

fn host() -> TerminalHost {
    TerminalHost::initialize(Surface::new(400, 200), BaseLayer::new(), LatLng::new(-34.6, -58.38), 15)
        .expect("surface")
}

fn bench_icon_for(c: &mut Criterion) {
    c.bench_function("icon_for", |b| {
        b.iter(|| {
            for kind in KINDS {
                black_box(icon_for(black_box(kind), true));
                black_box(icon_for(black_box(kind), false));
            }
        })
    });
}

fn bench_upsert(c: &mut Criterion) {
    let trees = snapshot(5_000);

    c.bench_function("upsert_5k_fresh", |b| {
        b.iter(|| {
            let mut host = host();
            let mut registry = MarkerRegistry::new();
            black_box(registry.upsert_tree_markers(&mut host, &trees));
        })
    });

    let mut host = host();
    let mut registry = MarkerRegistry::new();
    registry.upsert_tree_markers(&mut host, &trees);
    c.bench_function("upsert_5k_unchanged", |b| {
        b.iter(|| black_box(registry.upsert_tree_markers(&mut host, &trees)))
    });

    // Every other tree flips season and is recreated
    let mut flipped = trees.clone();
    for tree in flipped.iter_mut().step_by(2) {
        tree.in_season = !tree.in_season;
    }
    c.bench_function("upsert_5k_alternating", |b| {
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let next = if toggle { &flipped } else { &trees };
            black_box(registry.upsert_tree_markers(&mut host, next))
        })
    });
}

criterion_group!(benches, bench_icon_for, bench_upsert);
criterion_main!(benches);
