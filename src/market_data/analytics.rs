use crate::database::models::MarketTick;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default moving average window (number of ticks)
pub const DEFAULT_MOVING_AVERAGE_PERIOD: usize = 20;

/// One point of a trailing moving average series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovingAveragePoint {
    pub timestamp: DateTime<Utc>,
    #[schema(value_type = String, example = "101.00")]
    pub close: Decimal,
    #[schema(value_type = String, example = "101.50")]
    pub moving_average: Decimal,
}

/// Price alert definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceAlert {
    pub symbol: String,
    #[schema(value_type = String, example = "105")]
    pub threshold: Decimal,
}

/// Evaluated price alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertResult {
    pub symbol: String,
    pub triggered: bool,
    #[schema(value_type = String, example = "102")]
    pub current_price: Decimal,
    #[schema(value_type = String, example = "105")]
    pub threshold: Decimal,
}

/// Trailing moving average of close prices
///
/// `ticks` must be ascending by time. Point `i` averages ticks
/// `[max(0, i + 1 - period), i]`, so the first points use fewer samples.
pub fn trailing_moving_average(ticks: &[MarketTick], period: usize) -> Vec<MovingAveragePoint> {
    let period = period.max(1);
    let mut points = Vec::with_capacity(ticks.len());
    let mut window_sum = Decimal::ZERO;

    for (i, tick) in ticks.iter().enumerate() {
        window_sum += tick.close;
        if i >= period {
            window_sum -= ticks[i - period].close;
        }

        let count = (i + 1).min(period);
        points.push(MovingAveragePoint {
            timestamp: tick.tick_time,
            close: tick.close,
            moving_average: window_sum / Decimal::from(count),
        });
    }

    points
}

/// Evaluate alerts against the latest stored ticks
///
/// An alert fires when its threshold is above the current close. Alerts for
/// symbols missing from `latest` are dropped.
pub fn evaluate_alerts(alerts: &[PriceAlert], latest: &[MarketTick]) -> Vec<AlertResult> {
    alerts
        .iter()
        .filter_map(|alert| {
            let tick = latest.iter().find(|t| t.symbol == alert.symbol)?;
            Some(AlertResult {
                symbol: alert.symbol.clone(),
                triggered: alert.threshold > tick.close,
                current_price: tick.close,
                threshold: alert.threshold,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewMarketTick, SymbolMetadata};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn stored(symbol: &str, minute: u32, close: Decimal) -> MarketTick {
        let time = Utc.with_ymd_and_hms(2025, 1, 6, 9, minute, 0).unwrap();
        NewMarketTick::new(&SymbolMetadata::new(symbol), time, close, close, close, close, None)
            .into_stored(minute as i64, time)
    }

    #[test]
    fn test_moving_average_period_two() {
        let ticks = vec![
            stored("AAPL", 30, dec!(100)),
            stored("AAPL", 31, dec!(101)),
            stored("AAPL", 32, dec!(102)),
        ];

        let points = trailing_moving_average(&ticks, 2);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].moving_average, dec!(100));
        assert_eq!(points[1].moving_average, dec!(100.5));
        assert_eq!(points[2].moving_average, dec!(101.5));
        assert_eq!(points[2].timestamp, ticks[2].tick_time);
    }

    #[test]
    fn test_moving_average_matches_window_mean() {
        let closes = [dec!(10), dec!(12), dec!(9), dec!(15), dec!(11), dec!(13)];
        let ticks: Vec<_> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| stored("MSFT", i as u32, *c))
            .collect();

        for period in 1..=7 {
            let points = trailing_moving_average(&ticks, period);
            for (i, point) in points.iter().enumerate() {
                let start = (i + 1).saturating_sub(period);
                let window = &closes[start..=i];
                let mean = window.iter().sum::<Decimal>() / Decimal::from(window.len());
                assert_eq!(point.moving_average, mean, "period {} index {}", period, i);
            }
        }
    }

    #[test]
    fn test_moving_average_zero_period_treated_as_one() {
        let ticks = vec![stored("AAPL", 30, dec!(100)), stored("AAPL", 31, dec!(104))];
        let points = trailing_moving_average(&ticks, 0);
        assert_eq!(points[1].moving_average, dec!(104));
    }

    #[test]
    fn test_alert_triggered_when_threshold_above_price() {
        let latest = vec![stored("AAPL", 32, dec!(102))];
        let alerts = vec![
            PriceAlert { symbol: "AAPL".to_string(), threshold: dec!(105) },
            PriceAlert { symbol: "TSLA".to_string(), threshold: dec!(1) },
        ];

        let results = evaluate_alerts(&alerts, &latest);

        assert_eq!(results.len(), 1);
        assert!(results[0].triggered);
        assert_eq!(results[0].current_price, dec!(102));
        assert_eq!(results[0].threshold, dec!(105));
    }

    #[test]
    fn test_alert_not_triggered_at_or_below_price() {
        let latest = vec![stored("AAPL", 32, dec!(102))];
        let alerts = vec![
            PriceAlert { symbol: "AAPL".to_string(), threshold: dec!(102) },
            PriceAlert { symbol: "AAPL".to_string(), threshold: dec!(90) },
        ];

        let results = evaluate_alerts(&alerts, &latest);
        assert!(results.iter().all(|r| !r.triggered));
    }
}
