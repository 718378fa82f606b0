#[cfg(test)]
use super::*;

#[test]
fn sum_up_duration() {
    let dur1 = Duration::new("5000:40:31");
    let dur2 = Duration::new("00:46:30");
    let sum = Duration::new("5001:27:01");
    assert!(
        dur1 + dur2 == sum,
        "Duration does not sum up correctly. dur1: {} + dur2: {} is {}; but should be {}",
        dur1,
        dur2,
        dur1 + dur2,
        sum
    );
}

#[test]
fn add_duration_to_time_across_month_and_leap_day() {
    // ARRANGE
    let no_leap = DateTime::new("1999-2-28T23:40:59");
    let leap = DateTime::new("2000-2-28T23:40");

    // ACT
    let sum_no_leap = no_leap + Duration::new("48:46:01");
    let sum_leap = leap + Duration::new("48:46:03");

    // ASSERT
    assert_eq!(sum_no_leap, DateTime::new("1999-3-3T00:27"));
    assert_eq!(sum_leap, DateTime::new("2000-3-2T00:26:03"));
}

#[test]
fn epoch_and_iso_round_trip() {
    // ARRANGE
    let epoch = DateTime::new("1970-01-01T00:00");
    let before_epoch = DateTime::new("1969-12-31T23:59:59");
    let morning = DateTime::new("2024-05-13T08:30:00Z");

    // ASSERT
    assert_eq!(epoch, DateTime::Point(0));
    assert_eq!(before_epoch, DateTime::Point(-1));
    assert_eq!(morning.as_iso(), "2024-05-13T08:30:00");
    assert_eq!(DateTime::new(&morning.as_iso()), morning);
    assert_eq!(format!("{}", morning), "13.05.2024_08:30");
}

#[test]
fn add_duration_to_earliest_latest() {
    let dur = Duration::new("50:00");
    assert_eq!(DateTime::Earliest + dur, DateTime::Earliest);
    assert_eq!(DateTime::Latest + dur, DateTime::Latest);
    assert_eq!(DateTime::new("1-01-01T00:00") + Duration::Infinity, DateTime::Latest);
    assert_eq!(DateTime::Earliest + Duration::Infinity, DateTime::Latest);
}

#[test]
fn test_difference_of_two_times() {
    let cases = [
        ("2022-02-06T16:32:45", "2022-02-06T16:32:45", "0:00:00"),
        ("2022-02-06T16:32:45", "2022-02-06T17:32:44", "0:59:59"),
        ("1989-10-01T02:25", "2022-02-06T17:31", "283599:06:00"),
        ("2000-01-01T23:59:59", "2000-01-02T00:00:00", "0:00:01"),
    ];
    for (earlier, later, duration) in cases {
        let earlier = DateTime::new(earlier);
        let later = DateTime::new(later);
        let duration = Duration::new(duration);
        assert!(
            later - earlier == duration,
            "Subtracting {} from {} gives {} but should give {}",
            earlier,
            later,
            later - earlier,
            duration
        );
        assert_eq!(earlier + (later - earlier), later);
        assert_eq!(later - (later - earlier), earlier);
    }
}

#[test]
fn test_difference_of_latest_and_earliest() {
    let point = DateTime::new("2022-02-06T17:31");
    assert_eq!(point - DateTime::Earliest, Duration::Infinity);
    assert_eq!(DateTime::Latest - point, Duration::Infinity);
    assert_eq!(DateTime::Latest - DateTime::Earliest, Duration::Infinity);
    assert_eq!(DateTime::Latest - DateTime::Latest, Duration::zero());
    assert_eq!(
        point.saturating_duration_since(DateTime::new("2022-02-06T18:00")),
        Duration::zero()
    );
}

#[test]
fn malformed_input_is_rejected() {
    assert!("2022-13-01T00:00".parse::<DateTime>().is_err());
    assert!("2023-02-29T00:00".parse::<DateTime>().is_err());
    assert!("2022-01-01".parse::<DateTime>().is_err());
    assert!("12:60".parse::<Duration>().is_err());
    assert!("abc".parse::<Duration>().is_err());
    assert_eq!("Inf".parse::<Duration>(), Ok(Duration::Infinity));
}

#[test]
fn durations_in_other_units() {
    let dur = Duration::new("1:30");
    assert_eq!(dur.in_sec(), 5400);
    assert_eq!(dur.in_min(), 90);
    assert!((dur.in_hours() - 1.5).abs() < 1e-12);
    assert_eq!(Duration::Infinity.in_hours(), f64::INFINITY);
    assert_eq!(dur.saturating_sub(Duration::new("2:00")), Duration::zero());
    assert_eq!(format!("{}", Duration::from_seconds(3725)), "01:02:05h");
}

#[test]
fn serde_representation() {
    // ARRANGE
    let time = DateTime::new("2024-05-13T08:30");
    let dur = Duration::from_minutes(5);

    // ACT
    let time_json = serde_json::to_value(time).unwrap();
    let dur_json = serde_json::to_value(dur).unwrap();
    let inf_json = serde_json::to_value(Duration::Infinity).unwrap();

    // ASSERT
    assert_eq!(time_json, serde_json::json!("2024-05-13T08:30:00"));
    assert_eq!(dur_json, serde_json::json!(300));
    assert_eq!(inf_json, serde_json::json!("Inf"));
    assert_eq!(serde_json::from_value::<DateTime>(time_json).unwrap(), time);
    assert_eq!(serde_json::from_value::<Duration>(dur_json).unwrap(), dur);
    assert_eq!(
        serde_json::from_value::<Duration>(serde_json::json!("0:05")).unwrap(),
        dur
    );
}
