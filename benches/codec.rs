use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qr_codec::{decode, decode_bit_matrix, encode_text, ECLevel, Luma8Source, Symbol};

const SHORT_TEXT: &str = "HELLO WORLD";
const LONG_TEXT: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do \
eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis \
nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.";

fn render(symbol: &Symbol, scale: usize, border: usize) -> Luma8Source {
    let side = (symbol.size() + 2 * border) * scale;
    let mut gray = vec![255u8; side * side];
    for y in 0..symbol.size() {
        for x in 0..symbol.size() {
            if symbol.module(x, y) {
                for dy in 0..scale {
                    let py = (y + border) * scale + dy;
                    for dx in 0..scale {
                        gray[py * side + (x + border) * scale + dx] = 0;
                    }
                }
            }
        }
    }
    Luma8Source::new(gray, side, side)
}

fn bench_encode(c: &mut Criterion) {
    c.bench_function("encode_short_text", |b| {
        b.iter(|| encode_text(black_box(SHORT_TEXT), ECLevel::M).unwrap())
    });
    c.bench_function("encode_long_text", |b| {
        b.iter(|| encode_text(black_box(LONG_TEXT), ECLevel::Q).unwrap())
    });
}

fn bench_decode_matrix(c: &mut Criterion) {
    let symbol = encode_text(LONG_TEXT, ECLevel::M).unwrap();
    c.bench_function("decode_matrix_direct", |b| {
        b.iter(|| decode_bit_matrix(black_box(symbol.matrix())).unwrap())
    });
}

fn bench_decode_image(c: &mut Criterion) {
    let symbol = encode_text(LONG_TEXT, ECLevel::M).unwrap();
    let source = render(&symbol, 4, 4);
    c.bench_function("decode_rendered_image", |b| {
        b.iter(|| decode(black_box(&source)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode_matrix, bench_decode_image);
criterion_main!(benches);
