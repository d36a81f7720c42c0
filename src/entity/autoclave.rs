use serde::{Deserialize, Serialize};

/// One autoclave curing cycle, covering every batch loaded into it.
///
/// Each step of the cycle is recorded as a time of day and a pressure
/// reading; the `*_duration` fields hold the elapsed time from the previous
/// step as `"Xh Ym"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoclaveRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub autoclave_id: u32,
    pub shift: String,
    /// Comma separated batch numbers.
    pub batches_processed: String,
    pub previous_door_open_time: String,
    pub previous_door_open_pressure: Option<f64>,
    pub door_close_time: String,
    pub door_close_pressure: Option<f64>,
    pub vacuum_finish_time: String,
    pub vacuum_finish_pressure: Option<f64>,
    pub slow_steam_start_time: String,
    pub slow_steam_start_pressure: Option<f64>,
    pub fast_steam_start_time: String,
    pub fast_steam_start_pressure: Option<f64>,
    pub max_pressure_time: String,
    pub max_pressure: Option<f64>,
    pub release_start_time: String,
    pub release_start_pressure: Option<f64>,
    pub door_open_time: String,
    pub door_open_pressure: Option<f64>,
    pub door_close_duration: String,
    pub vacuum_finish_duration: String,
    pub slow_steam_duration: String,
    pub fast_steam_duration: String,
    pub max_pressure_duration: String,
    pub release_start_duration: String,
    pub door_open_duration: String,
}

impl AutoclaveRecord {
    /// Batch numbers this cycle processed.
    pub fn batch_numbers(&self) -> impl Iterator<Item = &str> {
        self.batches_processed
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn processed_batch(&self, batch_id: &str) -> bool {
        self.batch_numbers().any(|id| id == batch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_membership() {
        let record = AutoclaveRecord {
            batches_processed: "1510, 1511,1512 ".to_string(),
            ..Default::default()
        };
        assert_eq!(record.batch_numbers().collect::<Vec<_>>(), vec!["1510", "1511", "1512"]);
        assert!(record.processed_batch("1512"));
        assert!(!record.processed_batch("151"));
    }
}
