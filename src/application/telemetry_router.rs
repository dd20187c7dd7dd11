// Telemetry router - Maps a topic onto the series it feeds
use crate::domain::series::SeriesKind;

/// Classify a topic by its last `/` segment, case-insensitively.
///
/// Anything that is not `humidity` or `pressure` lands in the temperature series,
/// including empty segments and unknown suffixes.
pub fn classify(topic: &str) -> SeriesKind {
    let segment = topic.rsplit('/').next().unwrap_or_default();

    match segment.to_lowercase().as_str() {
        "humidity" => SeriesKind::Humidity,
        "pressure" => SeriesKind::Pressure,
        _ => SeriesKind::Temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_suffixes() {
        assert_eq!(classify("sensor/temperature"), SeriesKind::Temperature);
        assert_eq!(classify("sensor/humidity"), SeriesKind::Humidity);
        assert_eq!(classify("lab/room-2/pressure"), SeriesKind::Pressure);
        assert_eq!(classify("pressure"), SeriesKind::Pressure);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("Sensor/HUMIDITY"), SeriesKind::Humidity);
        assert_eq!(classify("sensor/Pressure"), SeriesKind::Pressure);
    }

    #[test]
    fn test_unknown_suffix_falls_back_to_temperature() {
        assert_eq!(classify("sensor/data"), SeriesKind::Temperature);
        assert_eq!(classify("sensor/"), SeriesKind::Temperature);
        assert_eq!(classify(""), SeriesKind::Temperature);
        // Only the last segment counts
        assert_eq!(classify("humidity/sensor"), SeriesKind::Temperature);
    }
}
