// Benchmarks for the hot paths: per-tick coverage queries and the
// rasterization cost of committing a field-closing link.
//
// Run with: cargo bench -p leyline_engine

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use leyline_engine::{EngineConfig, Position, Registry, TeamId};

const RED: TeamId = TeamId(1);

/// A fan of `spokes` triangles sharing an apex at the origin — lots of
/// overlapping fields stacked over the same ground. The apex carries one
/// link per spoke, so the limit is raised above the default 8.
fn fan_registry(spokes: i32) -> Registry {
    let config = EngineConfig {
        max_links_per_beacon: 16,
        ..EngineConfig::default()
    };
    let reg = Registry::new(config);
    let apex = reg.add_beacon(Position::new(0, 64, 0), Some(RED)).unwrap();
    let mut rim = Vec::new();
    for i in 0..spokes {
        // Rim points spread along a shallow arc east of the apex.
        let spoke = reg
            .add_beacon(Position::new(120 + i * 7, 64, 10 + i * 23), Some(RED))
            .unwrap();
        reg.link(RED, apex, spoke).unwrap();
        rim.push(spoke);
    }
    for pair in rim.windows(2) {
        reg.link(RED, pair[0], pair[1]).unwrap();
    }
    reg
}

fn bench_fields_at(c: &mut Criterion) {
    let reg = fan_registry(12);
    c.bench_function("fields_at_deep_stack", |b| {
        b.iter(|| {
            let mut depth = 0usize;
            for z in 0..64 {
                for x in 0..64 {
                    depth += reg.fields_at(black_box(x), black_box(z)).len();
                }
            }
            depth
        });
    });
}

fn bench_area_query(c: &mut Criterion) {
    let reg = fan_registry(12);
    c.bench_function("area_of_cached", |b| {
        b.iter(|| reg.area_of(black_box(RED)));
    });
}

fn bench_link_with_rasterization(c: &mut Criterion) {
    c.bench_function("link_closing_one_field", |b| {
        b.iter_batched(
            || {
                let reg = Registry::new(EngineConfig::default());
                let a = reg.add_beacon(Position::new(0, 64, 0), Some(RED)).unwrap();
                let b = reg.add_beacon(Position::new(200, 64, 0), Some(RED)).unwrap();
                let c = reg.add_beacon(Position::new(0, 64, 200), Some(RED)).unwrap();
                reg.link(RED, a, b).unwrap();
                reg.link(RED, b, c).unwrap();
                (reg, c, a)
            },
            |(reg, c, a)| reg.link(RED, black_box(c), black_box(a)).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_fields_at,
    bench_area_query,
    bench_link_with_rasterization
);
criterion_main!(benches);
