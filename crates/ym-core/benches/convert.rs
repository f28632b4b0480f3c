use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ym_core::annotate::{Annotator, PinyinAnnotator, WholeRun};
use ym_core::converter::{ConvertOptions, Converter};
use ym_core::store::{Fallback, PronunciationStore};
use ym_core::tone::{build_contexts, ToneContext, ToneToken};

static SYLLABLES: &[(&str, &str)] = &[
    ("ni", "に"),
    ("hao", "はお"),
    ("wo", "を"),
    ("hen", "へん"),
    ("xiang", "しゃん"),
    ("jin", "じん"),
    ("tian", "てぃえん"),
    ("qi", "ち"),
    ("zhen", "じぇん"),
    ("de", "で"),
    ("shi", "しー"),
    ("yi", "いー"),
    ("ge", "げ"),
    ("ren", "れん"),
];

fn bench_store() -> PronunciationStore {
    let rows: Vec<(String, String, String)> = SYLLABLES
        .iter()
        .flat_map(|&(syllable, kana)| {
            ToneContext::all_valid().map(move |c| (syllable.to_string(), c.to_string(), kana.to_string()))
        })
        .collect();
    let store = PronunciationStore::in_memory();
    store.insert_batch(&rows).unwrap();
    store
}

static INPUTS: &[(&str, &str)] = &[
    ("short", "你好"),
    ("medium", "今天天气真好，我很想你。"),
    ("long", "我今天很想你，天气真的很好。ABC 123个人，你好吗？我想是的。"),
];

fn bench_lookup_batch(c: &mut Criterion) {
    let store = bench_store();
    let annotator = PinyinAnnotator::new();
    let mut group = c.benchmark_group("store/lookup_batch");
    for &(label, text) in INPUTS {
        let mut tokens = vec![ToneToken::sentinel()];
        tokens.extend(annotator.annotate(text));
        tokens.push(ToneToken::sentinel());
        let keys = build_contexts(&tokens);
        let fallback = Fallback::Literal(String::new());
        group.bench_with_input(BenchmarkId::new(label, keys.len()), &keys, |b, keys| {
            b.iter(|| store.lookup_batch(keys, &fallback).unwrap());
        });
    }
    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let store = bench_store();
    let annotator = PinyinAnnotator::new();
    let options = ConvertOptions::default();
    let converter = Converter::new(&store, &annotator, &WholeRun, &options);
    let mut group = c.benchmark_group("converter/convert");
    for &(label, text) in INPUTS {
        group.bench_with_input(BenchmarkId::new(label, text.len()), &text, |b, &text| {
            b.iter(|| converter.convert(text).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lookup_batch, bench_convert);
criterion_main!(benches);
