use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use shadowsync::event::ChangeEvent;
use shadowsync::paths::{CaseSensitivity, RootConfig, translate};
use shadowsync::utils::IgnoreSet;
use shadowsync::watcher::scope;
use std::hint::black_box;
use std::path::PathBuf;

fn deep_path(root: &str, depth: usize) -> PathBuf {
    let mut path = PathBuf::from(root);
    for i in 0..depth {
        path.push(format!("dir_{i}"));
    }
    path.push("file.txt");
    path
}

fn benchmark_translate(c: &mut Criterion) {
    let roots = RootConfig::new("/home/user/site/resources", "/home/user/site/temp_resources");
    let mut group = c.benchmark_group("translate");

    for depth in [1, 8, 32] {
        let inside = deep_path("/home/user/site/resources", depth);
        group.bench_with_input(BenchmarkId::new("contained", depth), &inside, |b, path| {
            b.iter(|| translate(black_box(path), &roots, CaseSensitivity::Sensitive));
        });

        group.bench_with_input(
            BenchmarkId::new("contained_case_insensitive", depth),
            &inside,
            |b, path| {
                b.iter(|| translate(black_box(path), &roots, CaseSensitivity::Insensitive));
            },
        );
    }

    let outside = deep_path("/home/user/site/resources_old", 8);
    group.bench_function("not_contained", |b| {
        b.iter(|| translate(black_box(&outside), &roots, CaseSensitivity::Sensitive));
    });

    group.finish();
}

fn benchmark_scope_filter(c: &mut Criterion) {
    let roots = RootConfig::new("/home/user/site/resources", "/home/user/site/temp_resources");
    let ignore = IgnoreSet::new(&[
        ".git".to_string(),
        "*.swp".to_string(),
        "*.tmp".to_string(),
        "*~".to_string(),
        "4913".to_string(),
    ])
    .unwrap();

    let event = ChangeEvent::Saved(deep_path("/home/user/site/resources", 8));
    c.bench_function("scope_filter", |b| {
        b.iter(|| scope(black_box(event.clone()), &roots, &ignore));
    });
}

criterion_group!(benches, benchmark_translate, benchmark_scope_filter);
criterion_main!(benches);
