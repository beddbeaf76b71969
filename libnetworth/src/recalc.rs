use crate::record::Record;

/// Sorts `records` by date and rewrites every `gain`.
///
/// The sort is stable, so records sharing a date keep their input order.
/// Totals are read as they are and never recomputed here. The first record
/// gets a gain of zero; every later one gets its total minus the total of
/// the record right before it.
pub fn recalculate(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(Record::date);

    let mut previous: Option<f64> = None;
    for record in records.iter_mut() {
        let gain = previous.map_or(0f64, |prev| record.total() - prev);
        record.set_gain(gain);
        previous = Some(record.total());
    }

    records
}

#[cfg(test)]
mod tests {
    use crate::recalc::recalculate;
    use crate::record::tests::{date, record};
    use crate::record::{Assets, Record, RecordId};

    use chrono::{Days, NaiveDate};
    use proptest::prelude::*;

    fn gains(records: &[Record]) -> Vec<f64> {
        records.iter().map(Record::gain).collect()
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn empty_input() {
        assert!(recalculate(vec![]).is_empty());
    }

    #[test]
    fn single_record_has_zero_gain() {
        let mut rec = record("only", "2024-01-01", &[("A", 100f64)]);
        rec.set_gain(77f64);
        let out = recalculate(vec![rec]);
        assert_eq!(gains(&out), vec![0f64]);
    }

    #[test]
    fn sorts_then_diffs() {
        let out = recalculate(vec![
            record("feb", "2024-02-01", &[("A", 150f64)]),
            record("jan", "2024-01-01", &[("A", 100f64)]),
            record("mar", "2024-03-01", &[("A", 90f64), ("B", 5f64)]),
        ]);

        assert_eq!(ids(&out), vec!["jan", "feb", "mar"]);
        assert_eq!(gains(&out), vec![0f64, 50f64, -55f64]);
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let out = recalculate(vec![
            record("late", "2024-05-01", &[("A", 1f64)]),
            record("second", "2024-01-01", &[("A", 30f64)]),
            record("first", "2024-01-01", &[("A", 10f64)]),
        ]);

        assert_eq!(ids(&out), vec!["second", "first", "late"]);
        assert_eq!(gains(&out), vec![0f64, -20f64, -9f64]);
    }

    #[test]
    fn other_fields_untouched() {
        let mut rec = record("x", "2024-01-01", &[("A", 1f64)]);
        rec.set_income(12f64);
        rec.set_mpf(3f64);
        rec.set_note(Some("hello".to_string()));

        let out = recalculate(vec![rec.clone()]);

        assert_eq!(out[0], rec);
    }

    fn arb_records() -> impl Strategy<Value = Vec<Record>> {
        prop::collection::vec(
            (0u64..60, prop::collection::vec(-10_000i64..10_000, 0..4)),
            0..12,
        )
        .prop_map(|rows| {
            let base = date("2024-01-01");
            rows.into_iter()
                .enumerate()
                .map(|(idx, (offset, balances))| {
                    let day: NaiveDate = base.checked_add_days(Days::new(offset)).unwrap();
                    let assets: Assets = balances
                        .into_iter()
                        .enumerate()
                        .map(|(k, v)| (format!("K{}", k), v as f64))
                        .collect();
                    Record::with_id(RecordId::new(format!("r{}", idx)), day, assets)
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_sorted_with_zero_first_gain(records in arb_records()) {
            let out = recalculate(records.clone());
            prop_assert_eq!(out.len(), records.len());
            prop_assert!(out.windows(2).all(|w| w[0].date() <= w[1].date()));
            if let Some(first) = out.first() {
                prop_assert_eq!(first.gain(), 0f64);
            }
        }

        #[test]
        fn prop_gain_is_total_delta(records in arb_records()) {
            let out = recalculate(records);
            for w in out.windows(2) {
                prop_assert_eq!(w[1].gain(), w[1].total() - w[0].total());
            }
        }

        #[test]
        fn prop_idempotent(records in arb_records()) {
            let once = recalculate(records);
            let twice = recalculate(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_same_records_by_id(records in arb_records()) {
            let out = recalculate(records.clone());
            let mut before: Vec<&str> = ids(&records);
            let mut after: Vec<&str> = ids(&out);
            before.sort_unstable();
            after.sort_unstable();
            prop_assert_eq!(before, after);
        }
    }
}
