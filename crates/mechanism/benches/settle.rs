use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mechanism::{all_settled, reached_target_pose, JointState, LinkState, JointRole};

fn settle_benchmark(c: &mut Criterion) {
    let joints: Vec<JointState> = (0..1024)
        .map(|i| JointState {
            role: JointRole::Link(i + 2),
            angle: 0.001,
            speed: 0.0,
            target: 0.0,
        })
        .collect();
    let links: Vec<LinkState> = (0..1024)
        .map(|_| LinkState {
            awake: true,
            angular_velocity: 5.0e-5,
        })
        .collect();

    c.bench_function("reached_target_pose_1024", |b| {
        b.iter(|| reached_target_pose(black_box(&joints), black_box(0.01)));
    });
    c.bench_function("all_settled_1024", |b| {
        b.iter(|| all_settled(black_box(&links), black_box(1.0e-4)));
    });
}

criterion_group!(benches, settle_benchmark);
criterion_main!(benches);
