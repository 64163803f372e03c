use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rigtrim_animation_core::MotionLibrary;
use rigtrim_orchestrator::Optimizer;
use rigtrim_scene_core::SceneGraph;

fn benchmark_optimize(c: &mut Criterion) {
    let (scene, motions) =
        rigtrim_test_fixtures::scenarios::json("avatar").expect("avatar scenario");
    let scene = SceneGraph::from_json(&scene).expect("scene");
    let library = MotionLibrary::from_json(&motions.expect("motions")).expect("library");
    let optimizer = Optimizer::default();

    c.bench_function("optimize_avatar", |b| {
        b.iter_batched(
            || scene.clone(),
            |mut scene| black_box(optimizer.run(&mut scene, &library).expect("run")),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_optimize);
criterion_main!(benches);
