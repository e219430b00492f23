use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use jsonschema_llm_core::{convert, ConvertOptions, Target};
use serde_json::{json, Value};

fn flat_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "format": "uuid"},
            "name": {"type": "string", "minLength": 1, "maxLength": 80},
            "age": {"type": "integer", "minimum": 0, "maximum": 150},
            "active": {"type": "boolean"},
            "tags": {"type": "array", "items": {"type": "string"}, "uniqueItems": true}
        },
        "required": ["id", "name"]
    })
}

fn recursive_schema(depth: usize) -> Value {
    let mut node = json!({"type": "string"});
    for _ in 0..depth {
        node = json!({"type": "object", "properties": {"child": node}});
    }
    json!({
        "$defs": {"Node": node},
        "$ref": "#/$defs/Node"
    })
}

fn bench_convert_flat(c: &mut Criterion) {
    let schema = flat_schema();
    let mut group = c.benchmark_group("convert_flat_schema");
    for target in [Target::OpenaiStrict, Target::Gemini, Target::Claude] {
        let config = ConvertOptions {
            target,
            ..ConvertOptions::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(format!("{target:?}")), &config, |b, config| {
            b.iter(|| convert(&schema, config).unwrap());
        });
    }
    group.finish();
}

fn bench_convert_recursive(c: &mut Criterion) {
    let schema = recursive_schema(6);
    let config = ConvertOptions {
        target: Target::OpenaiStrict,
        recursion_limit: 4,
        ..ConvertOptions::default()
    };
    c.bench_function("convert_recursive_ref_depth_6", |b| {
        b.iter(|| convert(&schema, &config).unwrap());
    });
}

criterion_group!(benches, bench_convert_flat, bench_convert_recursive);
criterion_main!(benches);
