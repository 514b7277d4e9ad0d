//! Performance benchmarks for treeb

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use treeb::exclusion::RulesHandle;
use treeb::test_utils::TestTree;
use treeb::{
    ExclusionRuleSet, FlattenConfig, Flattener, SelectionExpander, TextTokenizer,
    TiktokenTokenizer, TreeRenderer,
};

const RUST_SOURCE: &str = r#"//! Module documentation

use std::path::Path;

/// Main function documentation
fn main() {
    println!("Hello, world!");
}
"#;

/// A project with `dirs` packages of `files` sources each, plus excluded noise.
fn create_project(dirs: usize, files: usize) -> TestTree {
    let tree = TestTree::new();
    for d in 0..dirs {
        for f in 0..files {
            tree.add_file(&format!("proj/pkg{}/mod{}.rs", d, f), RUST_SOURCE);
        }
        tree.add_file(&format!("proj/pkg{}/debug.log", d), "noise");
    }
    for i in 0..50 {
        tree.add_file(&format!("proj/node_modules/dep{}/index.js", i), "module.exports = {}");
    }
    tree
}

fn bench_expand(c: &mut Criterion) {
    let tree = create_project(20, 10);
    let rules = ExclusionRuleSet::default();
    let selection = [tree.selection("proj")];

    c.bench_function("expand_200_files", |b| {
        b.iter(|| {
            let expander = SelectionExpander::new(&rules);
            black_box(expander.expand(black_box(&selection)))
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let tree = create_project(20, 10);
    let rules = ExclusionRuleSet::default();
    let set = SelectionExpander::new(&rules).expand(&[tree.selection("proj")]);
    let renderer = TreeRenderer::new();

    c.bench_function("render_tree_200_files", |b| {
        b.iter(|| black_box(renderer.render(black_box(set.structure_entries())).header()))
    });
}

fn bench_flatten(c: &mut Criterion) {
    let tree = create_project(10, 10);
    let selection = [tree.selection("proj")];

    let plain = Flattener::new(RulesHandle::default(), FlattenConfig::default());
    c.bench_function("flatten_100_files_no_tokenizer", |b| {
        b.iter(|| black_box(plain.flatten(black_box(&selection))))
    });

    if let Ok(tokenizer) = TiktokenTokenizer::cl100k() {
        let counted = Flattener::new(RulesHandle::default(), FlattenConfig::default())
            .with_tokenizer(tokenizer);
        c.bench_function("flatten_100_files_cl100k", |b| {
            b.iter(|| black_box(counted.flatten(black_box(&selection))))
        });
    }
}

fn bench_tokenizer(c: &mut Criterion) {
    let Ok(tokenizer) = TiktokenTokenizer::cl100k() else {
        return;
    };
    let text = RUST_SOURCE.repeat(200);

    c.bench_function("cl100k_count_40kb", |b| {
        b.iter(|| black_box(tokenizer.count(black_box(&text))))
    });
}

criterion_group!(
    benches,
    bench_expand,
    bench_render,
    bench_flatten,
    bench_tokenizer
);
criterion_main!(benches);
