use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use alliances_access::{
    AccessRule, AppKey, ExpiryPolicy, Membership, ResolvedMembership, Tier, TierKey, TierRegistry,
    evaluate, resolve_highest_active,
};
use alliances_core::{OrganisationId, UserId};
use chrono::Utc;

fn rules(count: usize) -> Vec<AccessRule> {
    (0..count)
        .map(|i| {
            AccessRule::allow(
                AppKey::TALENT_DISCOVERY,
                Tier::new(TierKey::new(format!("T{i}")), format!("Tier {i}"), (i as i32) + 3),
            )
        })
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let caller = Tier::new(TierKey::GOLD, "Gold Partner", 3);

    for count in [1usize, 8, 64] {
        let rules = rules(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &rules, |b, rules| {
            b.iter(|| evaluate(black_box(Some(&caller)), black_box(rules)))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let registry = TierRegistry::standard();
    let user = UserId::new();
    let memberships: Vec<ResolvedMembership> = registry
        .ordered_by_rank()
        .iter()
        .cycle()
        .take(32)
        .map(|tier| ResolvedMembership {
            membership: Membership::active(user, OrganisationId::new(), tier.key.clone()),
            tier: tier.clone(),
        })
        .collect();
    let now = Utc::now();

    c.bench_function("resolve_highest_active/32", |b| {
        b.iter(|| resolve_highest_active(black_box(&memberships), ExpiryPolicy::Ignore, now))
    });
}

criterion_group!(benches, bench_evaluate, bench_resolve);
criterion_main!(benches);
