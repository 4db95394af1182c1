/// Property-based tests for the hand evaluator using proptest
///
/// These verify the evaluator's contracts across randomly generated card
/// sets: order invariance, determinism, category dominance, and the
/// never-weaker property of adding cards.
use hand_tracker::poker::{Card, HandCategory, evaluate};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

// Strategy to generate a set of distinct cards drawn from the 52-card deck
fn card_set(min: usize, max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::sample::subsequence((0u8..52).collect::<Vec<u8>>(), min..=max)
        .prop_map(|ids| ids.into_iter().map(Card).collect())
}

proptest! {
    #[test]
    fn test_evaluate_is_deterministic(cards in card_set(5, 7)) {
        prop_assert_eq!(evaluate(&cards), evaluate(&cards));
    }

    #[test]
    fn test_evaluate_is_order_invariant(cards in card_set(5, 7), seed in any::<u64>()) {
        let baseline = evaluate(&cards);
        let mut shuffled = cards.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(evaluate(&shuffled), baseline);
    }

    #[test]
    fn test_any_straight_flush_beats_any_other_hand(cards in card_set(7, 7)) {
        // The weakest straight flush is the five-high wheel; every hand
        // that is not itself a straight flush must rank below it.
        let wheel_flush = [Card(0), Card(4), Card(8), Card(12), Card(48)]; // 2s 3s 4s 5s As
        let floor = evaluate(&wheel_flush);
        prop_assert_eq!(floor.category, HandCategory::StraightFlush);

        let rank = evaluate(&cards);
        if rank.category != HandCategory::StraightFlush {
            prop_assert!(rank < floor);
        }
    }

    #[test]
    fn test_adding_cards_never_weakens_a_hand(cards in card_set(6, 7)) {
        // The full set contains every 5-card subset, so it can only match
        // or beat any prefix.
        let partial = evaluate(&cards[..5]);
        let full = evaluate(&cards);
        prop_assert!(full >= partial);
        if cards.len() == 7 {
            let six = evaluate(&cards[..6]);
            prop_assert!(full >= six);
            prop_assert!(six >= partial);
        }
    }

    #[test]
    fn test_phrase_is_always_renderable(cards in card_set(5, 7)) {
        let phrase = evaluate(&cards).phrase();
        prop_assert!(!phrase.is_empty());
    }
}
