//! Benchmarks for the backoff schedule and the pipeline fold.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use learnflow::context::{PipelineState, StateUpdate};
use learnflow::core::ArtifactKind;
use learnflow::pipeline::{LearningPipeline, RetryConfig, RetryState};
use learnflow::stages::StageDeps;
use learnflow::store::MemoryStore;
use learnflow::testing::{
    fast_retry, sample_flashcards, sample_quiz, sample_state, sample_summary, scripted_happy_path,
};
use std::sync::Arc;

fn backoff_benchmark(c: &mut Criterion) {
    let config = RetryConfig::default();
    c.bench_function("backoff_schedule", |b| {
        b.iter(|| {
            let mut state = RetryState::new(&config);
            for _ in 0..config.max_retries {
                black_box(state.next_delay(&config));
            }
        });
    });
}

fn fold_benchmark(c: &mut Criterion) {
    let updates = vec![
        StateUpdate::artifact(ArtifactKind::Summary, sample_summary()),
        StateUpdate::artifact(ArtifactKind::Quiz, sample_quiz()),
        StateUpdate::empty(),
        StateUpdate::artifact(ArtifactKind::Flashcards, sample_flashcards()),
    ];
    c.bench_function("state_fold", |b| {
        b.iter(|| {
            let mut state: PipelineState = sample_state("s1", "Photosynthesis");
            for update in updates.iter().cloned() {
                state.apply(update);
            }
            black_box(state)
        });
    });
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => panic!("failed to start runtime: {e}"),
    };
    let deps = StageDeps::new(Arc::new(scripted_happy_path()), Arc::new(MemoryStore::new()))
        .with_retry(fast_retry());
    let pipeline = LearningPipeline::standard(deps);

    c.bench_function("standard_pipeline_run", |b| {
        b.iter(|| runtime.block_on(pipeline.run(sample_state("s1", "Photosynthesis"))));
    });
}

criterion_group!(benches, backoff_benchmark, fold_benchmark, pipeline_benchmark);
criterion_main!(benches);
