use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rmp::encode;
use spark_codec_composite::{
    AbsentValuePolicy, CompositeDecoder, InMemoryCodecRegistry, MemberDescriptor, MsgPackCursor,
};

#[derive(Debug, Default)]
struct Quote {
    symbol: String,
    bid: f64,
    ask: f64,
    volume: u64,
    venue: Option<String>,
}

fn quote_decoder() -> CompositeDecoder<Quote> {
    CompositeDecoder::<Quote>::builder()
        .field(MemberDescriptor::new("symbol"), |q| &q.symbol, |q| &mut q.symbol)
        .field(MemberDescriptor::new("bid"), |q| &q.bid, |q| &mut q.bid)
        .field(MemberDescriptor::new("ask"), |q| &q.ask, |q| &mut q.ask)
        .field(MemberDescriptor::new("volume"), |q| &q.volume, |q| &mut q.volume)
        .nullable_field(
            MemberDescriptor::new("venue").with_policy(AbsentValuePolicy::SetToNull),
            |q| &q.venue,
            |q| &mut q.venue,
        )
        .default_constructor()
        .build(&InMemoryCodecRegistry::with_primitives())
        .expect("valid configuration")
}

fn positional_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    encode::write_array_len(&mut buf, 5).unwrap();
    encode::write_str(&mut buf, "ACME").unwrap();
    encode::write_f64(&mut buf, 101.25).unwrap();
    encode::write_f64(&mut buf, 101.5).unwrap();
    encode::write_uint(&mut buf, 12_000).unwrap();
    encode::write_nil(&mut buf).unwrap();
    buf
}

fn keyed_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    encode::write_map_len(&mut buf, 6).unwrap();
    encode::write_str(&mut buf, "venue").unwrap();
    encode::write_str(&mut buf, "XNAS").unwrap();
    encode::write_str(&mut buf, "volume").unwrap();
    encode::write_uint(&mut buf, 12_000).unwrap();
    encode::write_str(&mut buf, "ask").unwrap();
    encode::write_f64(&mut buf, 101.5).unwrap();
    encode::write_str(&mut buf, "bid").unwrap();
    encode::write_f64(&mut buf, 101.25).unwrap();
    encode::write_str(&mut buf, "symbol").unwrap();
    encode::write_str(&mut buf, "ACME").unwrap();
    encode::write_str(&mut buf, "sequence").unwrap();
    encode::write_uint(&mut buf, 7).unwrap();
    buf
}

/// 同一结构的位置序列与键值映射两种形态的解码开销对比。
///
/// 键值形态额外包含名字索引查找与一个被跳过的未知键。
fn bench_shapes(c: &mut Criterion) {
    let decoder = quote_decoder();
    let positional = positional_bytes();
    let keyed = keyed_bytes();

    let mut group = c.benchmark_group("composite_decode");
    group.bench_function("positional", |b| {
        b.iter_batched(
            || MsgPackCursor::new(&positional),
            |mut cursor| black_box(decoder.decode(&mut cursor)),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("keyed", |b| {
        b.iter_batched(
            || MsgPackCursor::new(&keyed),
            |mut cursor| black_box(decoder.decode(&mut cursor)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(composite_benches, bench_shapes);
criterion_main!(composite_benches);
