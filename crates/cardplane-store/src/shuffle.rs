use cardplane_schema::Card;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Build the 52-card universe in canonical order and shuffle it with `seed`.
///
/// Pure: the same seed always yields the same order, on every platform.
pub fn materialize(seed: i64) -> Vec<Card> {
    let mut cards = Card::universe();
    shuffle_ascending(&mut cards, seed);
    cards
}

/// Seeded swap shuffle walking the indices upwards.
///
/// For each `i` in `1..len`, draws `j` uniformly from `0..=i` and swaps the
/// two positions. The walk direction and draw range fix the resulting order
/// for a given seed, so neither may change without reordering every deck.
/// Draws are always 64-bit so the order does not depend on `usize` width.
pub fn shuffle_ascending<T>(items: &mut [T], seed: i64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    for i in 1..items.len() {
        let j = draw_index(&mut rng, i);
        items.swap(i, j);
    }
}

fn draw_index(rng: &mut ChaCha8Rng, upper: usize) -> usize {
    rng.gen_range(0..=upper as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardplane_schema::DECK_SIZE;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_order() {
        assert_eq!(materialize(42), materialize(42));
        assert_eq!(materialize(-1), materialize(-1));
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(materialize(42), materialize(43));
    }

    #[test]
    fn materialized_deck_is_a_permutation_of_the_universe() {
        let cards = materialize(7);
        assert_eq!(cards.len(), DECK_SIZE);
        let faces: HashSet<String> = cards.iter().map(Card::face).collect();
        let universe: HashSet<String> = Card::universe().iter().map(Card::face).collect();
        assert_eq!(faces, universe);
    }

    #[test]
    fn shuffle_moves_cards() {
        assert_ne!(materialize(42), Card::universe());
    }

    #[test]
    fn swap_indices_come_from_64_bit_draws() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let expected: Vec<u64> = (1..52u64).map(|i| rng.gen_range(0..=i)).collect();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let drawn: Vec<u64> = (1..52usize)
            .map(|i| draw_index(&mut rng, i) as u64)
            .collect();
        assert_eq!(drawn, expected);

        let mut order: Vec<usize> = (0..52).collect();
        for (i, j) in (1..52).zip(&expected) {
            order.swap(i, *j as usize);
        }
        let universe = Card::universe();
        let replayed: Vec<Card> = order.iter().map(|&k| universe[k]).collect();
        assert_eq!(materialize(42), replayed);
    }

    #[test]
    fn short_slices_are_untouched() {
        let mut empty: Vec<u8> = Vec::new();
        shuffle_ascending(&mut empty, 1);
        assert!(empty.is_empty());

        let mut one = vec![9];
        shuffle_ascending(&mut one, 1);
        assert_eq!(one, vec![9]);
    }

    #[test]
    fn shuffle_is_seed_stable_for_arbitrary_items() {
        let mut a: Vec<u32> = (0..100).collect();
        let mut b: Vec<u32> = (0..100).collect();
        shuffle_ascending(&mut a, 1234);
        shuffle_ascending(&mut b, 1234);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<u32>>());
    }
}
