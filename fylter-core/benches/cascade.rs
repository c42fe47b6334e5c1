use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fylter_core::{DataSource, FilterConfig, FilterOption, FilterSet, FilterSetConfig, NoFetcher, Surface};

// =============================================================================
// Layouts
// =============================================================================

fn options(prefix: &str) -> DataSource {
    DataSource::options((1..=8).map(|i| FilterOption::new(format!("{prefix} {i}"), i.to_string())))
}

/// `depth` filters, each depending on the previous one.
fn chain(depth: usize) -> Vec<FilterConfig> {
    (0..depth)
        .map(|i| {
            let config = FilterConfig::new(format!("f{i}"), |_| options("chain"));
            if i == 0 {
                config
            } else {
                config.depends_on([format!("f{}", i - 1)])
            }
        })
        .collect()
}

/// One root with `width` direct dependents.
fn fan_out(width: usize) -> Vec<FilterConfig> {
    let mut filters = vec![FilterConfig::new("root", |_| options("root"))];
    filters.extend((0..width).map(|i| FilterConfig::new(format!("leaf{i}"), |_| options("leaf")).depends_on(["root"])));
    filters
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_cascade(c: &mut Criterion, group_name: &str, layout: fn(usize) -> Vec<FilterConfig>, origin: &str) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");

    let mut group = c.benchmark_group(group_name);
    for size in [8usize, 64, 256] {
        let set = runtime
            .block_on(FilterSet::mount(&Surface::new(), FilterSetConfig::new(layout(size)).fetcher(NoFetcher)))
            .expect("valid layout");
        let origin = set.filter(origin).cloned().expect("origin filter");

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            let mut toggle = false;
            b.iter(|| {
                toggle = !toggle;
                let value = if toggle { "2" } else { "1" };
                runtime.block_on(origin.on_select(black_box(value)));
            })
        });
    }
    group.finish();
}

fn bench_deep_chain(c: &mut Criterion) {
    bench_cascade(c, "cascade_deep_chain", chain, "f0");
}

fn bench_wide_fan_out(c: &mut Criterion) {
    bench_cascade(c, "cascade_wide_fan_out", fan_out, "root");
}

fn bench_mount(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");

    c.bench_function("mount_chain_64", |b| {
        b.iter(|| {
            runtime
                .block_on(FilterSet::mount(&Surface::new(), FilterSetConfig::new(chain(64)).fetcher(NoFetcher)))
                .expect("valid layout")
        })
    });
}

criterion_group!(benches, bench_deep_chain, bench_wide_fan_out, bench_mount);
criterion_main!(benches);
