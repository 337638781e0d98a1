use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use decider_core::bucketer::Md5Bucketer;
use decider_core::eval::choose;
use decider_core::{Configuration, Context};

const CONFIG: &str = r#"
  {
    "frontpage_ranking": {
      "id": 1,
      "name": "frontpage_ranking",
      "enabled": true,
      "owner": "growth",
      "version": 4,
      "type": "range_variant",
      "start_ts": 0,
      "stop_ts": 2147483647,
      "emit_event": true,
      "experiment": {
        "variants": [
          {"name": "control_1", "range_start": 0.0, "range_end": 0.2},
          {"name": "control_2", "range_start": 0.2, "range_end": 0.4},
          {"name": "variant_3", "range_start": 0.4, "range_end": 0.6},
          {"name": "variant_4", "range_start": 0.6, "range_end": 0.8},
          {"name": "variant_5", "range_start": 0.8, "range_end": 1.0}
        ],
        "experiment_version": 1,
        "shuffle_version": 0,
        "bucket_val": "user_id",
        "targeting": {"ALL": [{"NOT": {"EQ": {"field": "is_employee", "values": [true]}}}]}
      }
    },
    "dark_mode_default": {
      "id": 20,
      "name": "dark_mode_default",
      "enabled": true,
      "owner": "ui",
      "version": 1,
      "type": "dynamic_config",
      "start_ts": 0,
      "stop_ts": 2147483647,
      "value": true,
      "value_type": "Boolean"
    }
  }
"#;

fn criterion_benchmark(c: &mut Criterion) {
    let configuration = Configuration::from_json(CONFIG.as_bytes()).unwrap();
    let now = 1_000_000;

    {
        let mut group = c.benchmark_group("range-variant");
        group.throughput(Throughput::Elements(1));
        let context = Context {
            user_id: Some("795244".into()),
            ..Context::default()
        };
        group.bench_function("choose", |b| {
            b.iter(|| {
                choose(
                    black_box(Some(&configuration)),
                    black_box("frontpage_ranking"),
                    black_box(&context),
                    &Md5Bucketer,
                    black_box(now),
                )
            })
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("dynamic-config");
        group.throughput(Throughput::Elements(1));
        let context = Context::default();
        group.bench_function("choose", |b| {
            b.iter(|| {
                choose(
                    black_box(Some(&configuration)),
                    black_box("dark_mode_default"),
                    black_box(&context),
                    &Md5Bucketer,
                    black_box(now),
                )
            })
        });
        group.finish();
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
