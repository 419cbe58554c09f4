use air_quality_monitor::satellite::locator::SatelliteLocator;
use air_quality_monitor::{aggregate, AqiCategory, GridPoint, HourlySample, LatLon};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeMap;

fn hourly_samples(days: i64) -> Vec<HourlySample> {
    (0..days * 24)
        .map(|hour| HourlySample {
            timestamp: 1_709_251_200 + hour * 3600,
            aqi_category: AqiCategory::from_u8((hour % 5 + 1) as u8).unwrap_or(AqiCategory::Good),
            components: BTreeMap::from([
                ("co".to_string(), 200.0 + hour as f64),
                ("pm2_5".to_string(), 5.0 + (hour % 7) as f64),
            ]),
        })
        .collect()
}

fn grid(side: usize) -> Vec<GridPoint> {
    (0..side * side)
        .map(|i| GridPoint {
            latitude: 14.0 + (i / side) as f64 * 0.02,
            longitude: -130.0 + (i % side) as f64 * 0.02,
            value: if i % 11 == 0 { 0.0 } else { 1.0e15 + i as f64 },
            quality_flag: (i % 3) as i32,
        })
        .collect()
}

fn bench_monitor(c: &mut Criterion) {
    let samples = hourly_samples(5);
    c.bench_function("aggregate_5_days", |b| b.iter(|| aggregate(black_box(&samples))));

    let points = grid(500);
    let locator = SatelliteLocator::new("molecules/cm^2", Some(-1.0e30));
    c.bench_function("locate_250k_cells", |b| {
        b.iter(|| locator.locate(black_box(LatLon(18.5, -125.0)), black_box(&points)))
    });
}

criterion_group!(benches, bench_monitor);
criterion_main!(benches);
