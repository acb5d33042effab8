// Criterion benchmarks for Concierge Match

use chrono::{Duration, NaiveDate, NaiveTime};
use concierge_match::core::availability::{generate_slots, CandidateAvailability};
use concierge_match::core::distance::haversine_miles;
use concierge_match::core::filters::{filter_by_budget, filter_by_distance};
use concierge_match::core::{RankingEngine, SlotExtractor};
use concierge_match::models::{Candidate, Coordinates, DayHours, PreferenceRecord};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const ORIGIN: Coordinates = Coordinates {
    latitude: 42.3601,
    longitude: -71.0589,
};

fn create_candidate(id: usize) -> Candidate {
    let offset = (id as f64 * 0.001) % 0.5;
    Candidate {
        service_id: format!("svc-{}", id),
        provider_id: format!("provider-{}", id),
        provider_name: format!("Provider {}", id),
        service_name: "Haircut".to_string(),
        category: "Barber".to_string(),
        base_price: 20.0 + (id % 100) as f64,
        rating: 3.5 + (id % 15) as f64 / 10.0,
        review_count: (id % 200) as u32,
        is_verified: id % 3 != 0,
        latitude: Some(ORIGIN.latitude + offset),
        longitude: Some(ORIGIN.longitude - offset),
        state: Some("MA".to_string()),
        ..Default::default()
    }
}

fn bench_haversine(c: &mut Criterion) {
    c.bench_function("haversine_miles", |b| {
        b.iter(|| {
            haversine_miles(
                black_box(42.3601),
                black_box(-71.0589),
                black_box(42.3736),
                black_box(-71.1190),
            )
        });
    });
}

fn bench_extraction(c: &mut Criterion) {
    let extractor = SlotExtractor::default();
    let now = NaiveDate::from_ymd_opt(2024, 3, 11)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let prior = PreferenceRecord::default();

    c.bench_function("extract_full_utterance", |b| {
        b.iter(|| {
            extractor.extract(
                black_box("I need a haircut around $40 tomorrow after 3pm in back bay"),
                black_box(&prior),
                now,
            )
        });
    });
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    for candidate_count in [10, 100, 1000].iter() {
        let candidates: Vec<Candidate> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("distance", candidate_count),
            &candidates,
            |b, candidates| b.iter(|| filter_by_distance(black_box(candidates.clone()), ORIGIN, 10.0)),
        );
        group.bench_with_input(
            BenchmarkId::new("budget", candidate_count),
            &candidates,
            |b, candidates| b.iter(|| filter_by_budget(black_box(candidates.clone()), Some(30.0), Some(80.0), 0.1)),
        );
    }

    group.finish();
}

fn bench_slot_generation(c: &mut Criterion) {
    let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
    let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let hours = DayHours::new(open, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    let bookings: Vec<_> = (0..6)
        .map(|i| {
            let start = date.and_time(open) + Duration::minutes(i * 90);
            (start, start + Duration::minutes(45))
        })
        .collect();

    c.bench_function("generate_slots_busy_day", |b| {
        b.iter(|| generate_slots(date, hours, black_box(&bookings), 60, 30, None));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let engine = RankingEngine::default();
    let record = PreferenceRecord {
        budget_max: Some(80.0),
        ..Default::default()
    };

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10, 100, 500].iter() {
        let resolved: Vec<CandidateAvailability> = (0..*candidate_count)
            .map(|i| CandidateAvailability {
                candidate: Candidate {
                    distance_miles: Some((i % 20) as f64 * 0.5),
                    ..create_candidate(i)
                },
                slots: Vec::new(),
                slot_count: i % 12,
                working_hours: String::new(),
                timezone: "America/New_York".to_string(),
                user_timezone: "America/New_York".to_string(),
                alternatives: Vec::new(),
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(candidate_count),
            &resolved,
            |b, resolved| b.iter(|| engine.rank(black_box(resolved.clone()), &record)),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine,
    bench_extraction,
    bench_filters,
    bench_slot_generation,
    bench_ranking
);
criterion_main!(benches);
