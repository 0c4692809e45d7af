use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use editor_core_diff::{
    DiffModel, DifferConfig, DocumentEvent, LineDiffer, LineEdit, StaticReference, TextDocument,
};
use ropey::Rope;
use std::sync::Arc;
use std::time::Duration;

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 48);
    for i in 0..line_count {
        out.push_str(&format!("{i:06} fn quick_diff_benchmark_line() {{}}\n"));
    }
    out.pop();
    out
}

fn bench_full_diff(c: &mut Criterion) {
    let reference = Rope::from_str(&large_text(20_000));
    let working = Rope::from_str(&large_text(20_000).replace("010000 fn", "010000 // fn"));
    c.bench_function("full_diff/20k_lines", |b| {
        b.iter(|| {
            let model = DiffModel::new(black_box(&reference), black_box(&working));
            black_box(model.differences().len());
        })
    });
}

fn bench_incremental_typing(c: &mut Criterion) {
    let text = large_text(50_000);
    let reference = Rope::from_str(&text);
    let config = DifferConfig::default();
    c.bench_function("incremental_typing/100_inserts", |b| {
        b.iter_batched(
            || (DiffModel::new(&reference, &reference), reference.clone()),
            |(mut model, mut working)| {
                let mut offset = working.len_chars() / 2;
                for version in 1..=100 {
                    let event = DocumentEvent::new(offset, 0, "x", version);
                    let edit = LineEdit::analyze(&working, &event).unwrap();
                    event.apply_to(&mut working).unwrap();
                    if model.apply_edit(&edit, &working, &config).is_err() {
                        model = DiffModel::new(&reference, &working);
                    }
                    offset += 1;
                }
                black_box(model.differences().len());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_line_info_scan(c: &mut Criterion) {
    let text = large_text(10_000);
    let working = text.replace("005000 fn", "005000 // fn");
    let document = TextDocument::new(&working);
    let differ = LineDiffer::with_config(DifferConfig::default().with_debounce(Duration::ZERO));
    differ.set_reference_provider(Arc::new(StaticReference::new(&text)));
    differ.connect(&document).unwrap();
    assert!(differ.wait_until_synchronized(Duration::from_secs(10)));

    c.bench_function("line_info/10k_sequential", |b| {
        b.iter(|| {
            let mut changed = 0;
            for line in 0..document.line_count() {
                if differ.line_info(line).is_some_and(|info| info.has_changes()) {
                    changed += 1;
                }
            }
            black_box(changed);
        })
    });
}

criterion_group!(
    benches,
    bench_full_diff,
    bench_incremental_typing,
    bench_line_info_scan
);
criterion_main!(benches);
