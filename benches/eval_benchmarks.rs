use criterion::{Criterion, criterion_group, criterion_main};
use hand_tracker::poker::{Card, evaluate};

/// Benchmark a 5-card evaluation (worst case for mid-hand odds callers)
fn bench_evaluate_5_cards(c: &mut Criterion) {
    // A two-pair board, the most common mid-strength shape
    let cards = [Card(48), Card(50), Card(20), Card(22), Card(9)];
    c.bench_function("evaluate_5_cards", |b| {
        b.iter(|| evaluate(&cards));
    });
}

/// Benchmark a full 7-card evaluation (showdown phrasing path)
fn bench_evaluate_7_cards(c: &mut Criterion) {
    // Pocket aces over a paired board: a full house
    let cards = [
        Card(48),
        Card(49),
        Card(50),
        Card(46),
        Card(21),
        Card(23),
        Card(0),
    ];
    c.bench_function("evaluate_7_cards", |b| {
        b.iter(|| evaluate(&cards));
    });
}

/// Benchmark evaluation across a sweep of distinct 7-card hands
fn bench_evaluate_sweep(c: &mut Criterion) {
    let hands: Vec<Vec<Card>> = (0u8..45)
        .map(|base| (base..base + 7).map(Card).collect())
        .collect();
    c.bench_function("evaluate_45_hand_sweep", |b| {
        b.iter(|| {
            hands
                .iter()
                .map(|cards| evaluate(cards))
                .collect::<Vec<_>>()
        });
    });
}

criterion_group!(
    hand_evaluation,
    bench_evaluate_5_cards,
    bench_evaluate_7_cards,
    bench_evaluate_sweep,
);

criterion_main!(hand_evaluation);
