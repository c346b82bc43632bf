//! Criterion microbenches for labelport ingestion.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure full ingestion (decode + match + attach) for
//! the two single-document formats, COCO JSON and CSV.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use labelport::{ingest, AnnotationFormat, ClassRegistry, ImageRecord, SourceFile};

const IMAGE_COUNT: usize = 50;
const ANNOTATIONS_PER_IMAGE: usize = 10;

fn loaded_images() -> Vec<ImageRecord> {
    (0..IMAGE_COUNT)
        .map(|i| ImageRecord::new((i + 1) as u64, format!("image{:03}.jpg", i), 640, 480))
        .collect()
}

/// Builds a COCO document annotating every image.
fn coco_fixture() -> String {
    let images: Vec<String> = (0..IMAGE_COUNT)
        .map(|i| {
            format!(
                r#"{{"id": {}, "width": 640, "height": 480, "file_name": "image{:03}.jpg"}}"#,
                i + 1,
                i
            )
        })
        .collect();

    let mut annotations = Vec::new();
    let mut next_id = 1;
    for image_id in 1..=IMAGE_COUNT {
        for a in 0..ANNOTATIONS_PER_IMAGE {
            annotations.push(format!(
                r#"{{"id": {}, "image_id": {}, "category_id": {}, "bbox": [{}, {}, 40.0, 30.0]}}"#,
                next_id,
                image_id,
                a % 5,
                (a * 13 % 600) as f64,
                (a * 7 % 440) as f64,
            ));
            next_id += 1;
        }
    }

    format!(
        r#"{{"categories": [{{"id": 0, "name": "person"}}, {{"id": 1, "name": "car"}}], "images": [{}], "annotations": [{}]}}"#,
        images.join(","),
        annotations.join(",")
    )
}

fn csv_fixture() -> String {
    let mut out = String::from("filename,class,x,y,width,height\n");
    for i in 0..IMAGE_COUNT {
        for a in 0..ANNOTATIONS_PER_IMAGE {
            out.push_str(&format!(
                "image{:03}.jpg,class{},{},{},40,30\n",
                i,
                a % 5,
                a * 13 % 600,
                a * 7 % 440,
            ));
        }
    }
    out
}

fn bench_coco_ingest(c: &mut Criterion) {
    let fixture = coco_fixture();
    let files = [SourceFile::new("annotations.json", fixture.clone().into_bytes())];

    let mut group = c.benchmark_group("coco_ingest");
    group.throughput(Throughput::Bytes(fixture.len() as u64));

    group.bench_function("ingest_coco", |b| {
        b.iter(|| {
            let mut images = loaded_images();
            let mut registry = ClassRegistry::new();
            let report = ingest(
                AnnotationFormat::Coco,
                black_box(&files),
                &mut images,
                &mut registry,
            );
            black_box(report)
        })
    });

    group.finish();
}

fn bench_csv_ingest(c: &mut Criterion) {
    let fixture = csv_fixture();
    let files = [SourceFile::new("annotations.csv", fixture.clone().into_bytes())];

    let mut group = c.benchmark_group("csv_ingest");
    group.throughput(Throughput::Bytes(fixture.len() as u64));

    group.bench_function("ingest_csv", |b| {
        b.iter(|| {
            let mut images = loaded_images();
            let mut registry = ClassRegistry::new();
            let report = ingest(
                AnnotationFormat::Csv,
                black_box(&files),
                &mut images,
                &mut registry,
            );
            black_box(report)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_coco_ingest, bench_csv_ingest);
criterion_main!(benches);
