//! # Arm Solve Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arm_lib::arm_ctrl::{inverse_kinematics, orientation, ArmCtrl, InputData, Params};
use nalgebra::Vector3;
use util::module::State;

fn solve_benchmark(c: &mut Criterion) {
    // ---- Build the arm ----

    let mut arm_ctrl = ArmCtrl::new(Params::default()).unwrap();
    let geometry = *arm_ctrl.geometry();

    // Targets sweeping across the front of the arm
    let targets: Vec<Vector3<f64>> = (0..64)
        .map(|i| {
            let angle = (i as f64) * std::f64::consts::PI / 64.0;
            Vector3::new(16.0 * angle.sin(), 16.0 * angle.cos(), 4.0 + (i % 8) as f64)
        })
        .collect();

    let heading = Vector3::new(1.0, 0.0, -1.0).normalize();

    // ---- Benchmarks ----

    c.bench_function("solve_position", |b| {
        b.iter(|| {
            for t in targets.iter() {
                black_box(inverse_kinematics::solve_position(&geometry, black_box(t)).ok());
            }
        })
    });

    c.bench_function("wrist_target", |b| {
        b.iter(|| {
            for t in targets.iter() {
                black_box(orientation::wrist_target(&geometry, &heading, black_box(t)));
            }
        })
    });

    c.bench_function("arm_ctrl_proc", |b| {
        b.iter(|| {
            for t in targets.iter() {
                let input = InputData {
                    target_cm: *t,
                    heading,
                    grip_pct: 50.0,
                };
                black_box(arm_ctrl.proc(black_box(&input)).ok());
            }
        })
    });
}

criterion_group!(benches, solve_benchmark);
criterion_main!(benches);
