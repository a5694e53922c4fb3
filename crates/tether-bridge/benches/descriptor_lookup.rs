use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tether_bridge::{Bridge, BridgeOptions, Instance, ScriptValue};
use tether_engine::{Engine, Value};
use tether_sdk::{AbiResult, BoundObject, NativeValue};

struct Widget;

impl BoundObject for Widget {
    fn has_method(&self, name: &str) -> bool {
        name.starts_with("method")
    }
    fn has_property(&self, name: &str) -> bool {
        name.starts_with("field")
    }
    fn invoke_method(&self, _name: &str, args: &[NativeValue]) -> AbiResult<NativeValue> {
        Ok(args.first().cloned().unwrap_or_default())
    }
    fn get_property(&self, _name: &str) -> NativeValue {
        NativeValue::Int32(1)
    }
    fn set_property(&self, _name: &str, _value: NativeValue) {}
    fn string_value(&self) -> String {
        "Widget".to_string()
    }
}

fn setup() -> (Bridge, ScriptValue) {
    let bridge = Bridge::init(Engine::default(), BridgeOptions::default());
    let widget = bridge.expose(Rc::new(Widget)).unwrap();
    (bridge, widget)
}

fn bench_methods_named(c: &mut Criterion) {
    let (bridge, widget) = setup();
    let engine = bridge.engine();
    let widget = widget.engine_value();
    let host = engine.host_object(widget).unwrap();
    let instance = host.as_any().downcast_ref::<Instance>().unwrap();
    let class = instance.class();

    let mut group = c.benchmark_group("methods_named");
    group.bench_function("cached_hit", |b| {
        class.methods_named(engine, "method0", instance);
        b.iter(|| class.methods_named(engine, black_box("method0"), instance));
    });
    group.bench_function("uncached_miss", |b| {
        b.iter(|| class.methods_named(engine, black_box("missing"), instance));
    });
    group.finish();
}

fn bench_script_method_call(c: &mut Criterion) {
    let (bridge, widget) = setup();
    let engine = bridge.engine();
    let widget = widget.engine_value();

    let mut group = c.benchmark_group("script_method_call");
    for arg_count in [0usize, 1, 4] {
        let args: Vec<Value> = (0..arg_count).map(|i| Value::from(i as i32)).collect();
        group.bench_with_input(BenchmarkId::new("args", arg_count), &args, |b, args| {
            b.iter(|| {
                let method = engine.get(widget, "method0").unwrap();
                let result = engine.call(&method, widget, black_box(args)).unwrap();
                engine.collect();
                result
            });
        });
    }
    group.finish();
}

fn bench_field_read(c: &mut Criterion) {
    let (bridge, widget) = setup();
    let engine = bridge.engine();
    let widget = widget.engine_value();

    c.bench_function("field_read", |b| {
        b.iter(|| engine.get(widget, black_box("field0")).unwrap());
    });
}

criterion_group!(
    benches,
    bench_methods_named,
    bench_script_method_call,
    bench_field_read
);
criterion_main!(benches);
