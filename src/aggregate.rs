//! Group/reduce helpers the reports are built from.
//!
//! Everything in here is pure. Groups are returned in the order their key was
//! first seen, so reports list categories, grades and subjects the way they
//! appear in the data files.

use std::hash::Hash;

use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Folds every item into the accumulator of its group.
/// Each group starts from a copy of `initial`
pub fn group_reduce<I, T, K, A, KF, RF>(
    items: I,
    mut key_fn: KF,
    mut reduce_fn: RF,
    initial: A,
) -> IndexMap<K, A>
where
    I: IntoIterator<Item = T>,
    K: Hash + Eq,
    A: Clone,
    KF: FnMut(&T) -> K,
    RF: FnMut(A, &T) -> A,
{
    let mut groups: IndexMap<K, A> = IndexMap::new();
    for item in items {
        let accumulator = groups
            .entry(key_fn(&item))
            .or_insert_with(|| initial.clone());
        let current = std::mem::replace(accumulator, initial.clone());
        *accumulator = reduce_fn(current, &item);
    }
    groups
}

/// Item with the highest score, the first one wins on ties
pub fn arg_max<I, T, S, F>(items: I, mut score_fn: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    S: PartialOrd,
    F: FnMut(&T) -> S,
{
    let mut best: Option<(T, S)> = None;
    for item in items {
        let score = score_fn(&item);
        let replace = match &best {
            Some((_, top)) => score > *top,
            None => true,
        };
        if replace {
            best = Some((item, score));
        }
    }
    best.map(|(item, _)| item)
}

/// Sums quantities per key and returns the key with the largest total
pub fn top_by_quantity<I, T, K, KF, QF>(items: I, key_fn: KF, mut quantity_fn: QF) -> Option<(K, u64)>
where
    I: IntoIterator<Item = T>,
    K: Hash + Eq,
    KF: FnMut(&T) -> K,
    QF: FnMut(&T) -> u64,
{
    let totals = group_reduce(items, key_fn, |total, item| total + quantity_fn(item), 0u64);
    arg_max(totals, |(_, total)| *total)
}

/// Sum of the values of each group
pub fn group_sum<I, T, K, KF, VF>(items: I, key_fn: KF, mut value_fn: VF) -> IndexMap<K, Decimal>
where
    I: IntoIterator<Item = T>,
    K: Hash + Eq,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> Decimal,
{
    group_reduce(items, key_fn, |total, item| total + value_fn(item), Decimal::ZERO)
}

/// Mean of the values of each group
pub fn group_mean<I, T, K, KF, VF>(items: I, key_fn: KF, mut value_fn: VF) -> IndexMap<K, Decimal>
where
    I: IntoIterator<Item = T>,
    K: Hash + Eq,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> Decimal,
{
    group_reduce(
        items,
        key_fn,
        |(total, count), item| (total + value_fn(item), count + 1),
        (Decimal::ZERO, 0usize),
    )
    .into_iter()
    .map(|(key, (total, count))| (key, mean(total, count)))
    .collect()
}

/// `total / count`, or 0 for an empty set
pub fn mean(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total / Decimal::from(count)
}

/// Cumulative sum after each item
pub fn running_totals<I, T, F>(items: I, mut value_fn: F) -> Vec<Decimal>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> Decimal,
{
    let mut total = Decimal::ZERO;
    items
        .into_iter()
        .map(|item| {
            total += value_fn(&item);
            total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::entities::Product;

    fn products() -> Vec<Product> {
        vec![
            Product::new(1, "Laptop", "Electronics", dec!(55000), 4),
            Product::new(2, "Pen", "Stationery", dec!(10), 200),
            Product::new(3, "Phone", "Electronics", dec!(55000), 12),
            Product::new(4, "Notebook", "Stationery", dec!(45.50), 3),
        ]
    }

    #[test]
    fn test_group_reduce_empty() {
        let empty: Vec<Product> = Vec::new();
        let groups = group_reduce(&empty, |p| p.category.clone(), |n, _| n + 1, 0);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_reduce_keeps_first_seen_order() {
        let products = vec![
            Product::new(1, "Pen", "Stationery", dec!(10), 1),
            Product::new(2, "Laptop", "Electronics", dec!(100), 1),
            Product::new(3, "Ink", "Stationery", dec!(5), 1),
            Product::new(4, "Apple", "Grocery", dec!(1), 1),
        ];
        let counts = group_reduce(&products, |p| p.category.clone(), |n, _| n + 1, 0);
        let keys: Vec<&str> = counts.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["Stationery", "Electronics", "Grocery"]);
        assert_eq!(counts["Stationery"], 2);
    }

    #[test]
    fn test_single_category_revenue() {
        let lines = vec![
            (Product::new(1, "Pen", "Stationery", dec!(10), 10), 3u32),
            (Product::new(2, "Ink", "Stationery", dec!(2.5), 10), 4),
            (Product::new(3, "Pad", "Stationery", dec!(7), 10), 1),
        ];
        let revenue = group_sum(
            &lines,
            |(p, _)| p.category.clone(),
            |(p, qty)| p.price * Decimal::from(*qty),
        );
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue["Stationery"], dec!(47));
    }

    #[test]
    fn test_arg_max_by_price() {
        let products = products();
        let top = arg_max(&products, |p| p.price).unwrap();
        assert!(products.iter().all(|p| top.price >= p.price));
        // Laptop and Phone tie, the first one is kept
        assert_eq!(top.id, 1);

        let empty: Vec<Product> = Vec::new();
        assert!(arg_max(&empty, |p| p.price).is_none());
    }

    #[test]
    fn test_top_by_quantity() {
        let lines = vec![(2u32, 5u64), (1, 3), (2, 1), (1, 3)];
        assert_eq!(
            top_by_quantity(&lines, |(id, _)| *id, |(_, qty)| *qty),
            Some((2, 6))
        );

        let empty: Vec<(u32, u64)> = Vec::new();
        assert_eq!(top_by_quantity(&empty, |(id, _)| *id, |(_, qty)| *qty), None);
    }

    #[test]
    fn test_group_mean() {
        let averages = group_mean(&products(), |p| p.category.clone(), |p| p.price);
        assert_eq!(averages["Electronics"], dec!(55000));
        assert_eq!(averages["Stationery"], dec!(27.75));
    }

    #[test]
    fn test_mean_of_nothing_is_zero() {
        assert_eq!(mean(dec!(10), 0), Decimal::ZERO);
        assert_eq!(mean(dec!(10), 4), dec!(2.5));
    }

    #[test]
    fn test_running_totals() {
        let totals = running_totals(vec![dec!(5), dec!(10), dec!(2.5)], |v| *v);
        assert_eq!(totals, vec![dec!(5), dec!(15), dec!(17.5)]);
        assert!(running_totals(Vec::<Decimal>::new(), |v| *v).is_empty());
    }
}
