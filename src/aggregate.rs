use std::cmp::Ordering;
use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{CityGroup, Located};

pub const DEFAULT_LEADERBOARD_SIZE: usize = 3;

/// Collation key for place names: accents stripped and case folded, so
/// `Élancourt` sorts next to `Elancourt` and `lahore` next to `Lahore`.
pub fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Alphabetical order for place names, ignoring case and accents.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

/// Groups records by exact `(city, country)` pair, in first-seen order.
fn group_in_first_seen_order<R: Located>(records: &[R]) -> Vec<CityGroup> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<CityGroup> = Vec::new();

    for record in records {
        let key = (record.city(), record.country());
        match index.get(&key) {
            Some(&position) => groups[position].count += 1,
            None => {
                index.insert(key, groups.len());
                groups.push(CityGroup {
                    city: key.0.to_string(),
                    country: key.1.to_string(),
                    count: 1,
                });
            }
        }
    }

    groups
}

/// Distinct `(city, country)` groups sorted alphabetically by city name.
/// Names that collate equal keep the order in which they were first seen.
pub fn group_by_city_country<R: Located>(records: &[R]) -> Vec<CityGroup> {
    let mut groups = group_in_first_seen_order(records);
    groups.sort_by_cached_key(|group| collation_key(&group.city));
    groups
}

/// The `n` largest groups by count. Order among equal counts is not part of
/// the contract.
pub fn top_cities<R: Located>(records: &[R], n: usize) -> Vec<CityGroup> {
    let mut groups = group_in_first_seen_order(records);
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(n);
    groups
}

pub fn count_for_city<R: Located>(records: &[R], city: &str) -> u64 {
    records.iter().filter(|record| record.city() == city).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationRow;
    use proptest::prelude::*;

    fn row(city: &str, country: &str) -> LocationRow {
        LocationRow {
            city: city.to_string(),
            country_name: country.to_string(),
        }
    }

    fn repeated(city: &str, country: &str, times: usize) -> Vec<LocationRow> {
        std::iter::repeat_with(|| row(city, country))
            .take(times)
            .collect()
    }

    #[test]
    fn lahore_outranks_karachi() {
        let mut records = repeated("Lahore", "Pakistan", 600);
        records.extend(repeated("Karachi", "Pakistan", 300));

        let top = top_cities(&records, DEFAULT_LEADERBOARD_SIZE);
        assert_eq!(
            top,
            vec![
                CityGroup {
                    city: "Lahore".to_string(),
                    country: "Pakistan".to_string(),
                    count: 600,
                },
                CityGroup {
                    city: "Karachi".to_string(),
                    country: "Pakistan".to_string(),
                    count: 300,
                },
            ]
        );
    }

    #[test]
    fn empty_input_yields_empty_views() {
        let records: Vec<LocationRow> = Vec::new();
        assert!(group_by_city_country(&records).is_empty());
        assert!(top_cities(&records, 3).is_empty());
        assert_eq!(count_for_city(&records, "Lahore"), 0);
    }

    #[test]
    fn groups_sort_alphabetically_and_split_by_country() {
        let records = vec![
            row("Paris", "France"),
            row("Lahore", "Pakistan"),
            row("Paris", "United States"),
            row("Paris", "France"),
            row("Berlin", "Germany"),
        ];

        let groups = group_by_city_country(&records);
        let labels: Vec<(&str, &str, u64)> = groups
            .iter()
            .map(|g| (g.city.as_str(), g.country.as_str(), g.count))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Berlin", "Germany", 1),
                ("Lahore", "Pakistan", 1),
                ("Paris", "France", 2),
                ("Paris", "United States", 1),
            ]
        );
    }

    #[test]
    fn grouping_is_case_sensitive_and_untrimmed() {
        let records = vec![
            row("lahore", "Pakistan"),
            row("Lahore", "Pakistan"),
            row("Lahore ", "Pakistan"),
        ];
        assert_eq!(group_by_city_country(&records).len(), 3);
        assert_eq!(count_for_city(&records, "Lahore"), 1);
    }

    #[test]
    fn city_order_ignores_case_and_accents() {
        let records = vec![
            row("Zurich", "Switzerland"),
            row("Élancourt", "France"),
            row("lahore", "Pakistan"),
            row("Multan", "Pakistan"),
            row("Berlin", "Germany"),
        ];

        let names: Vec<String> = group_by_city_country(&records)
            .into_iter()
            .map(|g| g.city)
            .collect();
        assert_eq!(names, vec!["Berlin", "Élancourt", "lahore", "Multan", "Zurich"]);
    }

    #[test]
    fn names_equal_under_collation_keep_first_seen_order() {
        let records = vec![
            row("Lahore", "Pakistan"),
            row("Aachen", "Germany"),
            row("lahore", "Pakistan"),
        ];

        let labels: Vec<String> = group_by_city_country(&records)
            .into_iter()
            .map(|g| g.city)
            .collect();
        assert_eq!(labels, vec!["Aachen", "Lahore", "lahore"]);
        assert_eq!(compare_names("Élancourt", "elancourt"), Ordering::Equal);
        assert_eq!(compare_names("Zurich", "lahore"), Ordering::Greater);
    }

    #[test]
    fn count_for_city_ignores_country() {
        let records = vec![
            row("Paris", "France"),
            row("Paris", "United States"),
            row("Lyon", "France"),
        ];
        assert_eq!(count_for_city(&records, "Paris"), 2);
        assert_eq!(count_for_city(&records, "Nice"), 0);
    }

    #[test]
    fn top_cities_truncates() {
        let mut records = repeated("A", "X", 5);
        records.extend(repeated("B", "X", 4));
        records.extend(repeated("C", "X", 3));
        records.extend(repeated("D", "X", 2));

        let top = top_cities(&records, 3);
        let counts: Vec<u64> = top.iter().map(|g| g.count).collect();
        assert_eq!(counts, vec![5, 4, 3]);
    }

    fn arb_rows() -> impl Strategy<Value = Vec<LocationRow>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["Lahore", "Karachi", "Paris", "Berlin", "Lyon"]),
                prop::sample::select(vec!["Pakistan", "France", "Germany"]),
            )
                .prop_map(|(city, country)| row(city, country)),
            0..200,
        )
    }

    proptest! {
        #[test]
        fn group_counts_sum_to_record_count(records in arb_rows()) {
            let total: u64 = group_by_city_country(&records).iter().map(|g| g.count).sum();
            prop_assert_eq!(total, records.len() as u64);
        }

        #[test]
        fn leaderboard_is_descending_and_bounded(records in arb_rows(), n in 0usize..6) {
            let groups = group_by_city_country(&records);
            let top = top_cities(&records, n);
            prop_assert!(top.len() <= n);
            prop_assert!(top.len() <= groups.len());
            prop_assert!(top.windows(2).all(|pair| pair[0].count >= pair[1].count));
        }

        #[test]
        fn grouping_is_idempotent(records in arb_rows()) {
            prop_assert_eq!(group_by_city_country(&records), group_by_city_country(&records));
        }
    }
}
