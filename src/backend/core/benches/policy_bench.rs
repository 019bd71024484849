//! Policy engine benchmarks. Run with: cargo bench --bench policy_bench
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lattice_core::authz::{
    Action, Identity, OrganizationSubject, PolicyEngine, ProjectSubject, Role, Subject, SubjectKind,
};
use uuid::Uuid;

fn bench_ability_build(c: &mut Criterion) {
    let engine = PolicyEngine::new();
    let mut g = c.benchmark_group("ability_build");
    for role in Role::ALL {
        let identity = Identity::new(Uuid::from_u128(1), role);
        g.bench_function(role.as_str(), |b| {
            b.iter(|| black_box(engine.ability_for(&identity)));
        });
    }
    g.finish();
}

fn bench_decisions(c: &mut Criterion) {
    let engine = PolicyEngine::new();
    let me = Uuid::from_u128(1);
    let admin = engine.ability_for(&Identity::new(me, Role::Admin));
    let member = engine.ability_for(&Identity::new(me, Role::Member));
    let owned = Subject::from(ProjectSubject::new(Uuid::from_u128(2), me));
    let foreign = Subject::from(ProjectSubject::new(Uuid::from_u128(3), Uuid::from_u128(4)));
    let org = Subject::from(OrganizationSubject::new(Uuid::from_u128(5), me));

    let mut g = c.benchmark_group("decision");
    g.bench_function("admin_wildcard_hit", |b| {
        b.iter(|| black_box(admin.can(Action::Get, SubjectKind::Project)));
    });
    g.bench_function("admin_ownership_gate", |b| {
        b.iter(|| black_box(admin.can(Action::Delete, &org)));
    });
    g.bench_function("member_owned_project", |b| {
        b.iter(|| black_box(member.can(Action::Delete, &owned)));
    });
    g.bench_function("member_foreign_project", |b| {
        b.iter(|| black_box(member.can(Action::Delete, &foreign)));
    });
    g.bench_function("default_deny", |b| {
        b.iter(|| black_box(member.can(Action::Create, SubjectKind::Invite)));
    });
    g.finish();
}

criterion_group!(benches, bench_ability_build, bench_decisions);
criterion_main!(benches);
