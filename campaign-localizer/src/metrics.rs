use serde::Serialize;

const TRADITIONAL_HOURS_PER_ASSET: f64 = 8.0;
const AI_HOURS_PER_ASSET: f64 = 0.5;
const COST_PER_HOUR: f64 = 75.0;

/// Estimated savings of generating `assets_created` localized assets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetrics {
    pub time_saved: f64,
    pub cost_saved: f64,
    /// Traditional effort as a percentage of generated effort.
    pub speed_increase: i64,
    pub assets_created: usize,
}

impl CampaignMetrics {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn for_assets(count: usize) -> Self {
        let assets = count as f64;
        let traditional = assets * TRADITIONAL_HOURS_PER_ASSET;
        let generated = assets * AI_HOURS_PER_ASSET;
        let time_saved = traditional - generated;
        let speed_increase = if generated > 0.0 {
            (traditional / generated * 100.0).round() as i64
        } else {
            0
        };

        Self {
            time_saved,
            cost_saved: time_saved * COST_PER_HOUR,
            speed_increase,
            assets_created: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_markets() {
        let metrics = CampaignMetrics::for_assets(3);
        assert!((metrics.time_saved - 22.5).abs() < f64::EPSILON);
        assert!((metrics.cost_saved - 1687.5).abs() < f64::EPSILON);
        assert_eq!(metrics.speed_increase, 1600);
        assert_eq!(metrics.assets_created, 3);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(CampaignMetrics::for_assets(2)).expect("serializable");
        assert_eq!(value["timeSaved"], 15.0);
        assert_eq!(value["costSaved"], 1125.0);
        assert_eq!(value["speedIncrease"], 1600);
        assert_eq!(value["assetsCreated"], 2);
    }
}
