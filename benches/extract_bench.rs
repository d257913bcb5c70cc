//! Extraction engine benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reasonkit_media::config::ExtractorConfig;
use reasonkit_media::extraction::{MediaExtractor, UrlResolver};
use url::Url;

fn synthetic_page(blocks: usize) -> String {
    let mut page = String::from("<html><head><title>Bench page</title></head><body>");
    for i in 0..blocks {
        page.push_str(&format!(
            r#"<div class="card"><p>Lorem ipsum dolor sit amet {i}</p>
<video poster="/img/{i}.jpg"><source src="/media/{i}.mp4" type="video/mp4"></video>
<a href="/files/{i}.webm">Episode {i}</a>
<iframe src="https://player.vimeo.com/video/{i}"></iframe>
<script>var cfg{i} = {{ videoUrl: "https:\/\/cdn.example.net\/v\/{i}", hls: "//cdn.example.net/hls/{i}/index.m3u8" }};</script>
</div>"#,
            i = i
        ));
    }
    page.push_str("</body></html>");
    page
}

fn bench_extract(c: &mut Criterion) {
    let engine = MediaExtractor::new(ExtractorConfig::default()).unwrap();
    let mut group = c.benchmark_group("extract");

    for blocks in [10usize, 100, 1000] {
        let page = synthetic_page(blocks);
        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &page, |b, page| {
            b.iter(|| {
                engine
                    .extract(black_box(page), "https://example.com/bench")
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = UrlResolver::new();
    let base = Url::parse("https://example.com/a/b/c.html").unwrap();
    let mut group = c.benchmark_group("resolve");

    group.bench_function("relative", |b| {
        b.iter(|| resolver.resolve(black_box("../media/clip.mp4"), &base))
    });
    group.bench_function("escaped_protocol_relative", |b| {
        b.iter(|| resolver.resolve(black_box(r"\/\/cdn.example.net\/v\/clip.mp4"), &base))
    });

    group.finish();
}

criterion_group!(benches, bench_extract, bench_resolve);
criterion_main!(benches);
