//! Intraday volume distribution.
//!
//! Partitions a day of minute bars into fixed session buckets, ranks the
//! heaviest bars and derives concentration signals.
//!
//! Pre-open (09:25-09:30) and lunch (11:30-13:00) minutes belong to no bucket
//! but still count toward the total and the ranking, so bucket percentages
//! need not add up to 100.

use std::collections::BTreeMap;
use stockcard_core::{
    config::SignalThresholds, round_dp, to_lots, BucketStat, MinuteBar, SessionBucket,
    TopVolumeBar, VolumeAnalysis, VolumeReport, VolumeSignal,
};

/// Number of bars kept in the top-volume ranking.
pub const TOP_VOLUME_COUNT: usize = 10;

/// Volume distribution analyzer.
#[derive(Debug, Clone, Default)]
pub struct VolumeDistributionAnalyzer {
    thresholds: SignalThresholds,
}

impl VolumeDistributionAnalyzer {
    /// Create an analyzer with the given signal thresholds.
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }

    /// Analyze one trading day of bars. Input order only matters for
    /// breaking ties in the volume ranking.
    pub fn analyze(&self, bars: &[MinuteBar]) -> VolumeAnalysis {
        if bars.is_empty() {
            return VolumeAnalysis::NoData;
        }

        let eligible: Vec<&MinuteBar> = bars.iter().filter(|b| b.is_eligible()).collect();
        if eligible.is_empty() {
            return VolumeAnalysis::NoUsableData;
        }

        let total_volume: u64 = eligible.iter().map(|b| b.volume).sum();
        let total_amount: f64 = eligible.iter().map(|b| b.amount).sum();

        let mut bucket_volume: BTreeMap<SessionBucket, u64> =
            SessionBucket::ALL.iter().map(|&b| (b, 0)).collect();
        for bar in &eligible {
            if let Some(bucket) = SessionBucket::for_minute(bar.minute_of_day()) {
                *bucket_volume.entry(bucket).or_default() += bar.volume;
            }
        }

        let distribution = bucket_volume
            .iter()
            .map(|(&bucket, &volume)| {
                let stat = BucketStat {
                    volume: to_lots(volume),
                    percent: percent_of(volume, total_volume),
                };
                (bucket, stat)
            })
            .collect();

        let signals = self.signals(
            bucket_volume[&SessionBucket::Open30Min],
            bucket_volume[&SessionBucket::Close30Min],
            total_volume,
        );

        VolumeAnalysis::Report(VolumeReport {
            total_volume: to_lots(total_volume),
            total_amount,
            distribution,
            top_volumes: top_volumes(&eligible),
            signals,
        })
    }

    /// Evaluate the threshold rules in order. Late-session rules are
    /// exclusive of each other; the two opening rules are independent.
    fn signals(&self, open_volume: u64, close_volume: u64, total_volume: u64) -> Vec<VolumeSignal> {
        let mut signals = Vec::new();
        if total_volume == 0 {
            return signals;
        }

        let t = &self.thresholds;
        let close_ratio = close_volume as f64 / total_volume as f64;
        let open_ratio = open_volume as f64 / total_volume as f64;

        if close_ratio > t.late_session_high {
            signals.push(VolumeSignal::AggressiveLateSession);
        } else if close_ratio > t.late_session_moderate {
            signals.push(VolumeSignal::ModerateLateSession);
        }
        if open_ratio > t.open_surge {
            signals.push(VolumeSignal::EarlyAccumulation);
        }
        if open_ratio > t.open_surge_extreme {
            signals.push(VolumeSignal::AbnormalOpeningSurge);
        }

        signals
    }
}

/// Share of `part` in `total`, in percent to 1 dp; 0 for an empty total.
fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_dp(part as f64 / total as f64 * 100.0, 1)
}

/// Highest-volume bars, descending, ties in input order.
fn top_volumes(eligible: &[&MinuteBar]) -> Vec<TopVolumeBar> {
    let mut ranked = eligible.to_vec();
    // stable: equal volumes keep input order
    ranked.sort_by(|a, b| b.volume.cmp(&a.volume));
    ranked
        .into_iter()
        .take(TOP_VOLUME_COUNT)
        .map(|bar| TopVolumeBar {
            time: bar.timestamp.format("%H:%M:%S").to_string(),
            price: bar.close,
            volume: to_lots(bar.volume),
            amount: bar.amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;

    fn bar(time: &str, volume: u64) -> MinuteBar {
        MinuteBar {
            timestamp: NaiveDateTime::parse_from_str(
                &format!("2024-06-03 {time}:00"),
                "%Y-%m-%d %H:%M:%S",
            )
            .unwrap(),
            open: 10.0,
            high: 10.0,
            low: 10.0,
            close: 10.0,
            volume,
            amount: volume as f64 * 10.0,
        }
    }

    fn report(bars: &[MinuteBar]) -> VolumeReport {
        match VolumeDistributionAnalyzer::default().analyze(bars) {
            VolumeAnalysis::Report(r) => r,
            other => panic!("expected report, got {other:?}"),
        }
    }

    #[test]
    fn test_reference_day() {
        let bars = [
            bar("09:29", 1000),
            bar("09:45", 3000),
            bar("10:05", 2000),
            bar("14:50", 5000),
            bar("14:55", 0),
        ];
        let r = report(&bars);

        assert_eq!(r.total_volume, 110);
        assert_relative_eq!(r.total_amount, 110_000.0);

        let open = r.bucket(SessionBucket::Open30Min);
        assert_eq!(open.volume, 30);
        assert_relative_eq!(open.percent, 27.3);

        let mid_am = r.bucket(SessionBucket::MidAm);
        assert_eq!(mid_am.volume, 20);
        assert_relative_eq!(mid_am.percent, 18.2);

        assert_eq!(r.bucket(SessionBucket::MidPm), BucketStat::default());

        let close = r.bucket(SessionBucket::Close30Min);
        assert_eq!(close.volume, 50);
        assert_relative_eq!(close.percent, 45.5);

        assert_eq!(r.signals, vec![VolumeSignal::AggressiveLateSession]);

        let volumes: Vec<u64> = r.top_volumes.iter().map(|t| t.volume).collect();
        assert_eq!(volumes, vec![50, 30, 20, 10]);
        assert_eq!(r.top_volumes[0].time, "14:50:00");
        assert_relative_eq!(r.top_volumes[0].price, 10.0);
        assert_relative_eq!(r.top_volumes[0].amount, 50_000.0);
    }

    #[test]
    fn test_percent_ties_round_to_even() {
        // 1000 / 16000 = 6.25%, 15000 / 16000 = 93.75%
        let r = report(&[bar("09:45", 1000), bar("10:30", 15000)]);
        assert_eq!(r.bucket(SessionBucket::Open30Min).percent, 6.2);
        assert_eq!(r.bucket(SessionBucket::MidAm).percent, 93.8);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert_eq!(
            VolumeDistributionAnalyzer::default().analyze(&[]),
            VolumeAnalysis::NoData
        );
    }

    #[test]
    fn test_out_of_session_is_no_usable_data() {
        let bars = [bar("09:00", 1000), bar("09:10", 2000), bar("15:30", 500)];
        assert_eq!(
            VolumeDistributionAnalyzer::default().analyze(&bars),
            VolumeAnalysis::NoUsableData
        );
    }

    #[test]
    fn test_all_zero_volume_is_no_usable_data() {
        let bars = [bar("10:00", 0), bar("10:01", 0)];
        assert_eq!(
            VolumeDistributionAnalyzer::default().analyze(&bars),
            VolumeAnalysis::NoUsableData
        );
    }

    #[test]
    fn test_all_buckets_present_even_when_empty() {
        let r = report(&[bar("12:00", 1000)]);
        assert_eq!(r.distribution.len(), 4);
        for bucket in SessionBucket::ALL {
            assert_eq!(r.bucket(bucket).volume, 0);
            assert_eq!(r.bucket(bucket).percent, 0.0);
        }
        assert_eq!(r.total_volume, 10);
        assert!(r.signals.is_empty());
    }

    #[test]
    fn test_sub_lot_volume_report() {
        // eligible volume that scales to zero lots still yields a report
        let r = report(&[bar("10:00", 50)]);
        assert_eq!(r.total_volume, 0);
        assert_eq!(r.bucket(SessionBucket::MidAm).volume, 0);
        assert_relative_eq!(r.bucket(SessionBucket::MidAm).percent, 100.0);
    }

    #[test]
    fn test_moderate_late_session() {
        // close = 20%
        let r = report(&[bar("10:00", 8000), bar("14:45", 2000)]);
        assert_eq!(r.signals, vec![VolumeSignal::ModerateLateSession]);
    }

    #[test]
    fn test_late_session_boundary_is_strict() {
        // close = exactly 25% -> only the moderate rule fires
        let r = report(&[bar("10:00", 7500), bar("14:45", 2500)]);
        assert_eq!(r.signals, vec![VolumeSignal::ModerateLateSession]);

        // close = exactly 15% -> nothing
        let r = report(&[bar("10:00", 8500), bar("14:45", 1500)]);
        assert!(r.signals.is_empty());
    }

    #[test]
    fn test_opening_rules_stack() {
        // open = 50%: both opening rules
        let r = report(&[bar("09:35", 5000), bar("10:30", 5000)]);
        assert_eq!(
            r.signals,
            vec![VolumeSignal::EarlyAccumulation, VolumeSignal::AbnormalOpeningSurge]
        );

        // open = 35%: only the first
        let r = report(&[bar("09:35", 3500), bar("10:30", 6500)]);
        assert_eq!(r.signals, vec![VolumeSignal::EarlyAccumulation]);
    }

    #[test]
    fn test_late_and_open_signals_together() {
        let r = report(&[bar("09:40", 4500), bar("14:59", 5500)]);
        assert_eq!(
            r.signals,
            vec![
                VolumeSignal::AggressiveLateSession,
                VolumeSignal::EarlyAccumulation,
                VolumeSignal::AbnormalOpeningSurge,
            ]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let analyzer = VolumeDistributionAnalyzer::new(SignalThresholds {
            late_session_high: 0.60,
            late_session_moderate: 0.50,
            open_surge: 0.30,
            open_surge_extreme: 0.40,
        });
        let bars = [bar("10:00", 4500), bar("14:45", 5500)];
        let r = analyzer.analyze(&bars);
        assert_eq!(
            r.report().unwrap().signals,
            vec![VolumeSignal::ModerateLateSession]
        );
    }

    #[test]
    fn test_closing_minute_in_close_bucket() {
        let r = report(&[bar("15:00", 1000), bar("10:00", 1000)]);
        assert_eq!(r.bucket(SessionBucket::Close30Min).volume, 10);
    }

    #[test]
    fn test_top_volumes_capped_and_stable() {
        let mut bars = Vec::new();
        for i in 0..15u32 {
            bars.push(bar(&format!("10:{i:02}"), 1000));
        }
        bars.push(bar("10:30", 2000));

        let r = report(&bars);
        assert_eq!(r.top_volumes.len(), TOP_VOLUME_COUNT);
        assert_eq!(r.top_volumes[0].time, "10:30:00");
        // ties keep input order
        let times: Vec<&str> = r.top_volumes[1..].iter().map(|t| t.time.as_str()).collect();
        assert_eq!(
            times,
            vec![
                "10:00:00", "10:01:00", "10:02:00", "10:03:00", "10:04:00", "10:05:00",
                "10:06:00", "10:07:00", "10:08:00",
            ]
        );
    }

    #[test]
    fn test_ranking_includes_unbucketed_bars() {
        let r = report(&[bar("12:00", 9000), bar("10:00", 1000)]);
        assert_eq!(r.top_volumes[0].time, "12:00:00");
    }

    #[test]
    fn test_report_serializes_bucket_keys() {
        let r = report(&[bar("09:45", 1000)]);
        let json = serde_json::to_value(VolumeAnalysis::Report(r)).unwrap();
        assert_eq!(json["status"], "report");
        assert_eq!(json["distribution"]["open_30min"]["volume"], 10);
        assert_eq!(json["distribution"]["open_30min"]["percent"], 100.0);
        assert!(json["signals"].is_array());
    }
}
