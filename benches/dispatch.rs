use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use eventry::{EventRegistry, EventResult, EventTarget, InMemoryResolver, ListenerTarget, Output, Resolver, Value};

#[derive(Default)]
struct Sink;

impl EventTarget for Sink {
    fn responds_to(&self, method: &str) -> bool {
        method == "write"
    }

    fn call(&self, _method: &str, args: &[Value], out: &mut Output) -> EventResult<()> {
        out.push(args.len().to_string());
        Ok(())
    }
}

fn make_registry(listeners: usize) -> EventRegistry {
    let resolver = Arc::new(InMemoryResolver::new());
    resolver.define_default::<Sink>("Sink").unwrap();
    let mut registry = EventRegistry::new(resolver as Arc<dyn Resolver>);

    // Half selectors, half closures, spread over a few priorities.
    for i in 0..listeners {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let priority = (i % 4) as i32;
        if i % 2 == 0 {
            registry
                .listen_at("bench", "Sink::write", priority)
                .unwrap()
                .with_rule("env", "prod|staging");
        } else {
            registry
                .listen_at(
                    "bench",
                    ListenerTarget::callable(|_args: &[Value], out: &mut Output| {
                        out.push(".");
                        Ok(())
                    }),
                    priority,
                )
                .unwrap();
        }
    }

    registry
}

fn bench_trigger(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for &n in &[1usize, 16, 128] {
        let registry = make_registry(n);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("trigger_matching/{n}"), |b| {
            b.iter(|| {
                registry
                    .dispatch("bench")
                    .rule("env", "prod")
                    .arg(1)
                    .send()
                    .unwrap()
            });
        });

        group.bench_function(format!("trigger_filtered/{n}"), |b| {
            b.iter(|| registry.dispatch("bench").rule("env", "dev").send().unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_trigger);
criterion_main!(benches);
