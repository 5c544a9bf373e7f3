//! Benchmarks for compiling link-heavy documents.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use wt_compiler::{CallbackResolver, Compiler, LinkCapabilities, LinkConfig, PageHandle, RuleSet};

/// Document with `links` wiki-links spread over paragraphs.
fn link_document(links: usize) -> String {
    let mut text = String::from("+ Index\n\n");
    for i in 0..links {
        text.push_str(&format!(
            "Entry {i}: [[[page-{}|**Page** {i}]]] and ((other {}))\n",
            i % 50,
            i % 7
        ));
        if i % 10 == 9 {
            text.push('\n');
        }
    }
    text
}

fn compiler() -> Compiler {
    let resolver = CallbackResolver::new(|page| {
        Ok(page
            .strip_prefix("page-")
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| n % 2 == 0)
            .map(|n| PageHandle::new(n, page)))
    });
    let links = LinkConfig::default()
        .with_view_url("/view/%s")
        .with_new_url("/new/%s");
    let capabilities = LinkCapabilities::new().with_resolver(Arc::new(resolver));
    Compiler::html(RuleSet::standard(), &links, capabilities).unwrap()
}

fn bench_compile(c: &mut Criterion) {
    let compiler = compiler();
    let mut group = c.benchmark_group("compile");

    for links in [10, 100, 1000] {
        let text = link_document(links);
        group.bench_with_input(BenchmarkId::new("links", links), &text, |b, text| {
            b.iter(|| compiler.compile(black_box(text)).unwrap());
        });
    }

    group.finish();
}

fn bench_compile_many(c: &mut Criterion) {
    let compiler = compiler();
    let docs: Vec<String> = (0..64).map(|_| link_document(100)).collect();

    c.bench_function("compile_many_64x100", |b| {
        b.iter(|| compiler.compile_many(black_box(docs.as_slice())));
    });
}

criterion_group!(benches, bench_compile, bench_compile_many);
criterion_main!(benches);
