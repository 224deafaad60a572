//! Benchmarks for work item construction, timer bookkeeping and engine rounds.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use directflow::prelude::*;
use directflow::testing::{event_timer, transform, value, FnEvaluatorFactory};
use directflow::timers::TimerTable;
use std::sync::Arc;

fn work_item_benchmark(c: &mut Criterion) {
    let elements: Vec<WindowedValue> = (0..100).map(|i| value(serde_json::json!(i))).collect();
    c.bench_function("keyed_work_item_elements", |b| {
        b.iter(|| KeyedWorkItem::for_elements(Key::from("k"), black_box(elements.clone())))
    });
}

fn timer_table_benchmark(c: &mut Criterion) {
    c.bench_function("timer_table_set_and_fire_1000", |b| {
        b.iter(|| {
            let mut table = TimerTable::new();
            for i in 0..1000 {
                table.set(event_timer("k", &format!("t{}", i % 100), i));
            }
            black_box(table.extract_fired_event_time(EventTime::MAX))
        })
    });
}

fn engine_round_benchmark(c: &mut Criterion) {
    c.bench_function("engine_run_100_keys", |b| {
        b.iter(|| {
            tokio_test::block_on(async {
                let engine = EvaluationEngine::new(EngineConfig::default()).ok()?;
                engine
                    .register_transform(
                        transform("ParDo(Forward)", &["in"], &["out"]),
                        Arc::new(FnEvaluatorFactory::forward_to("out")),
                    )
                    .ok()?;
                let id = TransformId::from("ParDo(Forward)");
                for k in 0..100 {
                    engine
                        .submit_elements(&id, Key::new(format!("k{k}")), vec![value(serde_json::json!(k))])
                        .await
                        .ok()?;
                }
                engine.run_until_idle().await.ok()
            })
        })
    });
}

criterion_group!(benches, work_item_benchmark, timer_table_benchmark, engine_round_benchmark);
criterion_main!(benches);
