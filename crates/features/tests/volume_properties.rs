//! Property tests for the volume distribution analyzer.

use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use stockcard_core::{MinuteBar, SessionBucket, VolumeAnalysis, VolumeReport};
use stockcard_features::{VolumeDistributionAnalyzer, TOP_VOLUME_COUNT};

fn arb_bar() -> impl Strategy<Value = MinuteBar> {
    // 09:00 .. 15:30 so some bars fall outside the session
    (540u32..930, 0u64..50_000, 5.0..50.0_f64).prop_map(|(minute, volume, close)| {
        let time = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap();
        MinuteBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_time(time),
            open: close,
            high: close,
            low: close,
            close,
            volume,
            amount: volume as f64 * close,
        }
    })
}

fn arb_day() -> impl Strategy<Value = Vec<MinuteBar>> {
    prop::collection::vec(arb_bar(), 1..60)
}

/// A day together with a random permutation of it.
fn arb_permuted_day() -> impl Strategy<Value = (Vec<MinuteBar>, Vec<MinuteBar>)> {
    arb_day().prop_flat_map(|bars| {
        let shuffled = Just(bars.clone()).prop_shuffle();
        (Just(bars), shuffled)
    })
}

/// A day together with a random permutation of its indices.
fn arb_day_with_order() -> impl Strategy<Value = (Vec<MinuteBar>, Vec<usize>)> {
    arb_day().prop_flat_map(|bars| {
        let order = Just((0..bars.len()).collect::<Vec<_>>()).prop_shuffle();
        (Just(bars), order)
    })
}

fn analyze(bars: &[MinuteBar]) -> VolumeAnalysis {
    VolumeDistributionAnalyzer::default().analyze(bars)
}

fn same_aggregates(a: &VolumeReport, b: &VolumeReport) -> bool {
    a.total_volume == b.total_volume
        && a.distribution == b.distribution
        && a.signals == b.signals
        && (a.total_amount - b.total_amount).abs() <= 1e-9 * a.total_amount.abs().max(1.0)
}

proptest! {
    /// Totals, buckets, signals and ranked volumes don't depend on input
    /// order; only tie order in the ranking may change.
    #[test]
    fn aggregates_independent_of_order((bars, shuffled) in arb_permuted_day()) {
        let original = analyze(&bars);
        let permuted = analyze(&shuffled);

        match (original.report(), permuted.report()) {
            (Some(a), Some(b)) => {
                prop_assert!(same_aggregates(a, b));
                let ranked = |r: &VolumeReport| r.top_volumes.iter().map(|t| t.volume).collect::<Vec<_>>();
                prop_assert_eq!(ranked(a), ranked(b));
            }
            (None, None) => prop_assert_eq!(&original, &permuted),
            _ => prop_assert!(false, "outcomes differ"),
        }
    }

    /// Permuting and then restoring the input restores the exact report,
    /// tie order included.
    #[test]
    fn ranking_stable_under_revert((bars, order) in arb_day_with_order()) {
        let permuted: Vec<MinuteBar> = order.iter().map(|&i| bars[i].clone()).collect();
        let mut restored = permuted.clone();
        for (&i, bar) in order.iter().zip(permuted) {
            restored[i] = bar;
        }
        prop_assert_eq!(analyze(&restored), analyze(&bars));
    }

    /// Bucket volumes never exceed the eligible total.
    #[test]
    fn buckets_conserve_volume(bars in arb_day()) {
        let raw_total: u64 = bars.iter().filter(|b| b.is_eligible()).map(|b| b.volume).sum();
        if let Some(r) = analyze(&bars).report() {
            let bucket_sum: u64 = r.distribution.values().map(|s| s.volume).sum();
            prop_assert!(bucket_sum * 100 <= r.total_volume * 100);
            prop_assert!(r.total_volume * 100 <= raw_total);

            let all_bucketed = bars
                .iter()
                .filter(|b| b.is_eligible())
                .all(|b| SessionBucket::for_minute(b.minute_of_day()).is_some());
            if !all_bucketed {
                check_partial_bucketing(r, &bars)?;
            }
        }
    }

    /// Percentages stay within [0, 100].
    #[test]
    fn percents_well_formed(bars in arb_day()) {
        if let Some(r) = analyze(&bars).report() {
            for stat in r.distribution.values() {
                prop_assert!((0.0..=100.0).contains(&stat.percent));
            }
            let percent_sum: f64 = r.distribution.values().map(|s| s.percent).sum();
            prop_assert!(percent_sum <= 100.0 + 0.2);
        }
    }

    /// Ranking length, order and tie stability.
    #[test]
    fn ranking_correct(bars in arb_day()) {
        let eligible: Vec<&MinuteBar> = bars.iter().filter(|b| b.is_eligible()).collect();
        if let Some(r) = analyze(&bars).report() {
            prop_assert_eq!(r.top_volumes.len(), eligible.len().min(TOP_VOLUME_COUNT));

            let mut expected = eligible.clone();
            expected.sort_by(|a, b| b.volume.cmp(&a.volume));
            for (got, want) in r.top_volumes.iter().zip(expected.iter()) {
                prop_assert_eq!(got.volume, want.volume / 100);
                prop_assert_eq!(&got.time, &want.timestamp.format("%H:%M:%S").to_string());
            }
        }
    }

    /// Zero-volume bars contribute nothing.
    #[test]
    fn zero_volume_ignored(bars in arb_day(), minute in 565u32..=900) {
        let time = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap();
        let mut with_zero = bars.clone();
        with_zero.insert(0, MinuteBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_time(time),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0,
            amount: 0.0,
        });

        prop_assert_eq!(analyze(&with_zero), analyze(&bars));
    }
}

/// With unbucketed eligible volume, the raw bucket sum is strictly below
/// the raw total.
fn check_partial_bucketing(r: &VolumeReport, bars: &[MinuteBar]) -> Result<(), TestCaseError> {
    let eligible = bars.iter().filter(|b| b.is_eligible());
    let unbucketed: u64 = eligible
        .clone()
        .filter(|b| SessionBucket::for_minute(b.minute_of_day()).is_none())
        .map(|b| b.volume)
        .sum();
    let raw_total: u64 = eligible.map(|b| b.volume).sum();
    let raw_bucketed = raw_total - unbucketed;

    prop_assert!(raw_bucketed < raw_total);
    prop_assert!(r.distribution.values().map(|s| s.volume * 100).sum::<u64>() <= raw_bucketed);
    Ok(())
}
