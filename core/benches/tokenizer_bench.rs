use criterion::{criterion_group, criterion_main, Criterion};
use wikidex_core::stopwords::StopwordSet;
use wikidex_core::tokenizer::Normalizer;

const SAMPLE: &str = "The domestic cat is a small carnivorous mammal. It is the only \
    domesticated species of the family Felidae. [[Category:Cats]] {{cite web|url=x}} \
    Cats are commonly kept as house pets, but can also be farm cats or feral cats; \
    running, jumping and hunting are among their instinctive behaviours.";

fn bench_normalize(c: &mut Criterion) {
    let normalizer = Normalizer::english(StopwordSet::english());
    let text = SAMPLE.repeat(64);
    c.bench_function("normalize_article", |b| b.iter(|| normalizer.terms(&text).count()));
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
