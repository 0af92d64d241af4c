use criterion::{black_box, criterion_group, criterion_main, Criterion};

use forager_env::body::Pose;
use forager_env::geometry::{Footprint, Vec2};
use forager_env::sensor::{scan, SensorConfig};
use forager_env::Target;

fn scene(count: usize) -> Vec<Target> {
    // Deterministic spread, no rng in the hot path
    (0..count)
        .map(|i| Target {
            center: Vec2::new((i as f64 * 37.0) % 800.0, (i as f64 * 53.0) % 600.0),
            footprint: Footprint::Circle { radius: 12.5 },
        })
        .collect()
}

fn bench_scan(c: &mut Criterion) {
    let config = SensorConfig::new(20, 90.0, 100.0).unwrap();
    let pose = Pose::new(Vec2::new(400.0, 300.0), 45.0);
    let targets = scene(50);

    c.bench_function("scan_20_rays_50_targets", |b| {
        b.iter(|| scan(black_box(&pose), black_box(&targets), black_box(&config)));
    });
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
