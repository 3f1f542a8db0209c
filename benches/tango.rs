// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use buffered_proxy::{
    BufferedProxy,
    host::{List, Object, Value},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;
use tango_bench::{IntoBenchmarks, benchmark_fn, tango_benchmarks, tango_main};

const KEYS: usize = 256;

fn wide_object() -> Object {
    (0..KEYS).fold(Object::new(), |object, i| {
        object.with(format!("field_{i}"), i as u64)
    })
}

fn random_keys(n: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| format!("field_{}", rng.random_range(0..KEYS)))
        .collect()
}

fn gate_benchmarks() -> impl IntoBenchmarks {
    buffered_proxy::enable_determinism();

    let content = wide_object();
    let keys = random_keys(64);
    let keys: &'static [String] = Box::leak(keys.into_boxed_slice());
    [
        benchmark_fn("gate::read_cold", move |b| {
            let content = content.clone();
            b.iter(move || {
                let proxy = BufferedProxy::new(content.clone());
                for key in keys {
                    black_box(proxy.get(key));
                }
            })
        }),
        benchmark_fn("gate::write", {
            let content = wide_object();
            move |b| {
                let content = content.clone();
                b.iter(move || {
                    let proxy = BufferedProxy::new(content.clone());
                    for (i, key) in keys.iter().enumerate() {
                        proxy.set(key, (i + KEYS) as u64);
                    }
                    proxy
                })
            }
        }),
        benchmark_fn("gate::write_then_revert", {
            let content = wide_object();
            move |b| {
                let content = content.clone();
                b.iter(move || {
                    let proxy = BufferedProxy::new(content.clone());
                    for key in keys {
                        proxy.set(key, u64::MAX);
                        let original = content.get(key);
                        proxy.set(key, original);
                    }
                    proxy.has_changes()
                })
            }
        }),
    ]
}

fn commit_benchmarks() -> impl IntoBenchmarks {
    buffered_proxy::enable_determinism();

    let keys: &'static [String] = Box::leak(random_keys(64).into_boxed_slice());
    [
        benchmark_fn("commit::apply_flat", move |b| {
            b.iter(move || {
                let proxy = BufferedProxy::new(wide_object());
                for key in keys {
                    proxy.set(key, "changed");
                }
                proxy.apply_changes()
            })
        }),
        benchmark_fn("commit::discard_flat", move |b| {
            b.iter(move || {
                let proxy = BufferedProxy::new(wide_object());
                for key in keys {
                    proxy.set(key, "changed");
                }
                proxy.discard_changes();
                proxy
            })
        }),
        benchmark_fn("commit::apply_nested", |b| {
            b.iter(|| {
                let rows: List = (0..32)
                    .map(|i| Object::new().with("row", i).with("label", "x"))
                    .collect();
                let proxy = BufferedProxy::new(Object::new().with("rows", rows));
                let rows = proxy.get("rows").into_sequence();
                for row in rows.iter().flat_map(|rows| rows.elements()) {
                    if let Some(row) = row.as_proxy() {
                        row.set("label", "y");
                    }
                }
                proxy.apply_changes()
            })
        }),
        benchmark_fn("commit::has_deep_changes", |b| {
            let leaf = Object::new().with("value", 0);
            let root = (0..16).fold(leaf, |inner, _| {
                Object::new().with("inner", Value::from(inner))
            });
            let proxy = BufferedProxy::new(root);
            let mut cursor = proxy.clone();
            while let Some(next) = cursor.get("inner").into_proxy() {
                cursor = next;
            }
            cursor.set("value", 1);
            b.iter(move || proxy.has_deep_changes())
        }),
    ]
}

tango_benchmarks!(gate_benchmarks(), commit_benchmarks());
tango_main!();
