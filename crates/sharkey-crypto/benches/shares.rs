use std::time::SystemTime;

use sharkey_core::ThresholdScheme;
use sharkey_crypto::{
    combine, decode_auto, encode_symbolic, encode_words, identity_from_seed_with, split_seed, MasterSeed,
    ShareIdentifier, StretchParams,
};

fn make_seed() -> MasterSeed {
    let mut bytes = [0u8; 48];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (i.wrapping_mul(7) ^ (i >> 3)) as u8;
    }
    MasterSeed::from_bytes(bytes)
}

#[divan::bench(args = [(2, 3), (5, 10), (128, 255)])]
fn bench_split(bencher: divan::Bencher, (t, n): (u8, u8)) {
    let seed = make_seed();
    let scheme = ThresholdScheme::new(t, n).unwrap();
    let id = ShareIdentifier::new(SystemTime::now());
    bencher.bench(|| split_seed(divan::black_box(&seed), scheme, &id).unwrap());
}

#[divan::bench(args = [(2, 3), (5, 10), (128, 255)])]
fn bench_combine(bencher: divan::Bencher, (t, n): (u8, u8)) {
    let seed = make_seed();
    let scheme = ThresholdScheme::new(t, n).unwrap();
    let shares = split_seed(&seed, scheme, &ShareIdentifier::new(SystemTime::now())).unwrap();
    bencher.bench(|| combine(divan::black_box(&shares[..t as usize])).unwrap());
}

#[divan::bench]
fn bench_decode_symbolic(bencher: divan::Bencher) {
    let shares = split_seed(
        &make_seed(),
        ThresholdScheme::new(2, 3).unwrap(),
        &ShareIdentifier::new(SystemTime::now()),
    )
    .unwrap();
    let text = encode_symbolic(shares[0].as_bytes());
    bencher.bench(|| decode_auto(divan::black_box(&text)).unwrap());
}

#[divan::bench]
fn bench_decode_words(bencher: divan::Bencher) {
    let shares = split_seed(
        &make_seed(),
        ThresholdScheme::new(2, 3).unwrap(),
        &ShareIdentifier::new(SystemTime::now()),
    )
    .unwrap();
    let text = encode_words(shares[0].as_bytes());
    bencher.bench(|| decode_auto(divan::black_box(&text)).unwrap());
}

// log_n 14 keeps the run short; the protocol cost is 2^20
#[divan::bench(sample_count = 10)]
fn bench_identity_from_seed(bencher: divan::Bencher) {
    let seed = make_seed();
    let params = StretchParams { log_n: 14, r: 8, p: 1 };
    bencher.bench(|| identity_from_seed_with(&params, divan::black_box(&seed)).unwrap());
}

fn main() {
    divan::main();
}
