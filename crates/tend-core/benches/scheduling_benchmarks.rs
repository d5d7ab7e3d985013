use chrono::{DateTime, Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tend_core::db::establish_connection;
use tend_core::models::{CareKind, ItemKind, NewItemData, NewRuleData, Occurrence, SchedulerConfig, Unit};
use tend_core::recurrence::next_due_date;
use tend_core::repository::{ItemRepository, OccurrenceRepository, RuleRepository, SqliteRepository};
use tend_core::windows::{calendar, classify};
use tokio::runtime::Runtime;
use uuid::Uuid;

const UNITS: [Unit; 3] = [Unit::Day, Unit::Week, Unit::Month];

fn random_occurrences(count: usize, now: DateTime<Utc>) -> Vec<Occurrence> {
    let mut rng = fastrand::Rng::with_seed(7);
    (0..count)
        .map(|_| Occurrence {
            id: Uuid::now_v7(),
            rule_id: Uuid::now_v7(),
            due_date: now + Duration::minutes(rng.i64(-60 * 24 * 30..60 * 24 * 60)),
            is_completed: false,
            completed_at: None,
        })
        .collect()
}

fn bench_next_due_date(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(42);
    let now = Utc::now();
    let inputs: Vec<(Option<DateTime<Utc>>, i64, Unit)> = (0..1_000)
        .map(|_| {
            let reference = rng.bool().then(|| now - Duration::hours(rng.i64(0..10_000)));
            (reference, rng.i64(1..=10_000), UNITS[rng.usize(..UNITS.len())])
        })
        .collect();

    c.bench_function("next_due_date_1000", |b| {
        b.iter(|| {
            for (reference, interval, unit) in &inputs {
                black_box(next_due_date(black_box(*reference), *interval, *unit));
            }
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    let now = Utc::now();
    let tz = chrono_tz::Europe::Berlin;
    let mut group = c.benchmark_group("classify");

    for count in [100, 1_000, 10_000] {
        let occurrences = random_occurrences(count, now);
        group.bench_with_input(BenchmarkId::from_parameter(count), &occurrences, |b, occurrences| {
            b.iter(|| classify(black_box(occurrences.clone()), now, &tz, Some(30)))
        });
    }
    group.finish();
}

fn bench_calendar(c: &mut Criterion) {
    let now = Utc::now();
    let tz = chrono_tz::America::New_York;
    let occurrences = random_occurrences(1_000, now);

    c.bench_function("calendar_30_days", |b| {
        b.iter(|| calendar(black_box(occurrences.clone()), now, &tz, 30))
    });
}

fn bench_completion(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("bench.db");

    let (repo, rule_id) = rt.block_on(async {
        let pool = establish_connection(&db_path.to_string_lossy()).await.unwrap();
        let repo = SqliteRepository::new(pool, SchedulerConfig::default());
        let item = repo
            .add_item(
                "bench",
                NewItemData {
                    kind: ItemKind::Plant,
                    nickname: Some("Monstera".to_string()),
                    species: None,
                    site_id: None,
                    birth_date: None,
                },
            )
            .await
            .unwrap();
        let rule = repo
            .create_rule(
                "bench",
                NewRuleData {
                    item_id: item.id,
                    kind: CareKind::Watering,
                    interval: 1,
                    unit: Unit::Day,
                    description: None,
                    last_completed_at: None,
                },
            )
            .await
            .unwrap();
        (repo, rule.id)
    });

    let mut open = rt.block_on(async {
        repo.find_occurrences_for_rule(rule_id, "bench")
            .await
            .unwrap()
            .into_iter()
            .find(Occurrence::is_open)
            .unwrap()
    });

    c.bench_function("complete_occurrence", |b| {
        b.iter(|| {
            open = rt
                .block_on(repo.complete_occurrence(open.id, "bench", Utc::now()))
                .unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_next_due_date,
    bench_classify,
    bench_calendar,
    bench_completion
);
criterion_main!(benches);
