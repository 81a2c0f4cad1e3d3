//! Benchmarks for the joint constraint solver.
//!
//! Run with: cargo bench -p sim-constraint
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p sim-constraint -- --save-baseline main
//! 2. After changes: cargo bench -p sim-constraint -- --baseline main

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nalgebra::{Point3, Vector3};
use sim_constraint::{
    JointAnchors, JointSolver, LimitMotor, Translational3Constraint, TranslationalConstraint,
};
use sim_types::{BodySet, MassProperties, Pose, RigidBody, SimulationConfig, SolverConfig};

const DT: f64 = 1.0 / 60.0;

// =============================================================================
// Scene Generation
// =============================================================================

/// Two dynamic bodies joined by a three-axis constraint with mixed regimes.
fn coupled_pair() -> (BodySet, Translational3Constraint) {
    let mut bodies = BodySet::new();
    let a = bodies.insert(
        RigidBody::dynamic(Pose::identity(), MassProperties::sphere(2.0, 0.5))
            .unwrap()
            .with_velocity(Vector3::new(0.5, -1.0, 0.2), Vector3::new(0.3, -0.2, 1.0)),
    );
    let b = bodies.insert(
        RigidBody::dynamic(
            Pose::from_position(Point3::new(1.2, 0.1, -0.2)),
            MassProperties::box_shape(1.0, Vector3::new(0.3, 0.2, 0.1)),
        )
        .unwrap()
        .with_velocity(Vector3::new(-1.5, 0.3, 0.8), Vector3::new(-0.6, 0.1, 0.4)),
    );

    let constraint = Translational3Constraint::new(
        a,
        b,
        JointAnchors::new(Point3::new(0.5, 0.1, 0.2), Point3::new(-0.5, 0.0, 0.1)),
        [
            LimitMotor::fixed(Vector3::x()),
            LimitMotor::new(Vector3::new(1.0, 1.0, 0.0).normalize())
                .with_limits(-0.1, 0.1)
                .with_motor(1.0, 100.0),
            LimitMotor::new(Vector3::z())
                .with_limits(0.0, 0.0)
                .with_spring(5.0, 0.7),
        ],
    );
    (bodies, constraint)
}

/// A hanging chain of `links` bodies joined by rope constraints.
fn rope_chain(links: usize) -> (BodySet, Vec<TranslationalConstraint>) {
    let mut bodies = BodySet::with_capacity(links + 1);
    let mut previous = bodies.insert(RigidBody::fixed(Pose::identity()));
    let mut joints = Vec::with_capacity(links);

    for i in 0..links {
        let z = -((i + 1) as f64) * 0.5;
        let body = bodies.insert(
            RigidBody::dynamic(
                Pose::from_position(Point3::new(0.0, 0.0, z)),
                MassProperties::sphere(0.5, 0.1),
            )
            .unwrap(),
        );
        joints.push(TranslationalConstraint::new(
            previous,
            body,
            JointAnchors::centers(),
            LimitMotor::new(Vector3::z()).with_limits(-0.5, 0.0),
        ));
        previous = body;
    }
    (bodies, joints)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_translational3(c: &mut Criterion) {
    let mut group = c.benchmark_group("translational3");

    for iterations in [1, 8, 32] {
        group.throughput(Throughput::Elements(iterations as u64));
        group.bench_with_input(
            BenchmarkId::new("pre_solve_and_solve", iterations),
            &iterations,
            |bench, &iterations| {
                let (bodies, constraint) = coupled_pair();
                bench.iter(|| {
                    let mut bodies = bodies.clone();
                    let mut constraint = constraint.clone();
                    constraint.pre_solve(&mut bodies, DT, 1.0 / DT);
                    for _ in 0..iterations {
                        constraint.solve(black_box(&mut bodies));
                    }
                    black_box(constraint.axis_state(0).limit_impulse)
                });
            },
        );
    }

    group.finish();
}

fn bench_rope_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("rope_step");
    group.sample_size(50);

    for links in [8, 64] {
        group.throughput(Throughput::Elements(links as u64));
        group.bench_with_input(BenchmarkId::new("links", links), &links, |bench, &links| {
            let config =
                SimulationConfig::default().solver(SolverConfig::default().with_validation(false));
            let (bodies, joints) = rope_chain(links);
            bench.iter(|| {
                let mut bodies = bodies.clone();
                let mut joints = joints.clone();
                let mut solver = JointSolver::new(config.clone()).unwrap();
                black_box(solver.step(&mut bodies, &mut joints))
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_translational3, bench_rope_step);
criterion_main!(benches);
