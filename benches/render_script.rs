use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use csv_sqlgen::{
    data::Value,
    dtype::Dtype,
    frame::{Column, DataFrame},
    sql,
};

const ROWS: usize = 20_000;

fn build_frame() -> DataFrame {
    let titles = (0..ROWS)
        .map(|idx| Value::String(format!("Track {idx} 'live'")))
        .collect();
    let streams = (0..ROWS).map(|idx| Value::Integer(idx as i64 * 1_000)).collect();
    let scores = (0..ROWS).map(|idx| Value::Float(idx as f64 / 7.0)).collect();
    let flags = (0..ROWS).map(|idx| Value::Boolean(idx % 2 == 0)).collect();
    DataFrame::from_columns(vec![
        Column::new("Track Name", Dtype::String, titles),
        Column::new("Streams", Dtype::Int64, streams),
        Column::new("Score", Dtype::Float64, scores),
        Column::new("In Charts", Dtype::Bool, flags),
    ])
    .expect("benchmark frame")
}

fn bench_render(c: &mut Criterion) {
    let frame = build_frame();
    let mut group = c.benchmark_group("render_script");
    group.sample_size(20);

    group.bench_function("render_in_memory", |b| {
        b.iter(|| {
            let script = sql::render_script(black_box(&frame), "songs").expect("render");
            black_box(script.len())
        })
    });

    group.bench_function("stream_to_writer", |b| {
        b.iter(|| {
            let mut sink = Vec::with_capacity(ROWS * 48);
            let rows = sql::write_insert_statements(&mut sink, "songs", black_box(&frame).rows())
                .expect("stream");
            black_box((rows, sink.len()))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
