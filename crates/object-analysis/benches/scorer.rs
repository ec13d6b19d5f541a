use criterion::{black_box, criterion_group, criterion_main, Criterion};
use detection_types::{BBox, HandDetection, Handedness, ObjectDetection};
use object_analysis::{suspiciousness, FrameContext, ScoringWeights};

fn bench_suspiciousness(c: &mut Criterion) {
    let weights = ScoringWeights::default();
    let hands = [
        HandDetection::new(BBox::new(110.0, 150.0, 80.0, 80.0), Handedness::Right, 0.9),
        HandDetection::new(BBox::new(400.0, 150.0, 80.0, 80.0), Handedness::Left, 0.8),
    ];
    let detections = [
        ObjectDetection::new("cell phone", 0.65, BBox::new(100.0, 100.0, 60.0, 120.0)),
        ObjectDetection::new("remote", 0.45, BBox::new(380.0, 120.0, 40.0, 90.0)),
        ObjectDetection::new("person", 0.95, BBox::new(50.0, 20.0, 500.0, 700.0)),
    ];
    let context = FrameContext { hands: &hands };

    c.bench_function("suspiciousness_frame", |b| {
        b.iter(|| {
            detections
                .iter()
                .map(|d| suspiciousness(black_box(d), &context, &weights))
                .sum::<u32>()
        })
    });
}

criterion_group!(benches, bench_suspiciousness);
criterion_main!(benches);
