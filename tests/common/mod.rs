//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const RATINGS: [&str; 6] = [
    "Extremely Poor",
    "Poor",
    "Needs Improvement",
    "Acceptable",
    "Good",
    "Excellent",
];

pub const PLATFORM: [&str; 6] = [
    "Very Inconvenient",
    "Inconvenient",
    "Needs Improvement",
    "Manageable",
    "Convenient",
    "Very Convenient",
];

pub const SURVEY_RATED: [&str; 13] = [
    "Seat_Comfort",
    "Arrival_Time_Convenient",
    "Catering",
    "Onboard_Wifi_Service",
    "Onboard_Entertainment",
    "Online_Support",
    "Ease_of_Online_Booking",
    "Onboard_Service",
    "Legroom",
    "Baggage_Handling",
    "CheckIn_Service",
    "Cleanliness",
    "Online_Boarding",
];

/// Rating index of `Onboard_Entertainment` for row `i`; the label is 1 when it is at least 3
pub fn entertainment_level(i: usize) -> usize {
    (i * 7 + i / 6) % 6
}

pub fn satisfied(i: usize) -> bool {
    entertainment_level(i) >= 3
}

/// Travel CSV with the real column layout. Every 9th row misses `Age`,
/// every 13th misses `Arrival_Delay_in_Mins` and every 17th misses `Customer_Type`.
pub fn travel_csv(ids: &[i64]) -> String {
    let mut out = String::from(
        "ID,Gender,Customer_Type,Age,Type_Travel,Travel_Class,Travel_Distance,Departure_Delay_in_Mins,Arrival_Delay_in_Mins\n",
    );
    for (i, id) in ids.iter().enumerate() {
        let gender = if i % 2 == 0 { "Female" } else { "Male" };
        let customer = if i % 17 == 5 {
            ""
        } else if i % 3 == 0 {
            "Disloyal Customer"
        } else {
            "Loyal Customer"
        };
        let age = if i % 9 == 4 {
            String::new()
        } else {
            format!("{}", 18 + (i * 5) % 60)
        };
        let travel = if i % 4 == 0 { "Personal Travel" } else { "Business Travel" };
        let class = if i % 5 < 2 { "Eco" } else { "Business" };
        let distance = 200 + (i * 37) % 4000;
        let departure = (i * 11) % 40;
        let arrival = if i % 13 == 6 {
            String::new()
        } else {
            format!("{}", departure + i % 3)
        };
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{}",
            id, gender, customer, age, travel, class, distance, departure, arrival
        )
        .unwrap();
    }
    out
}

/// Survey CSV; the label column is written only when `with_label` is set
pub fn survey_csv(ids: &[i64], with_label: bool) -> String {
    let mut header = String::from("ID");
    if with_label {
        header.push_str(",Overall_Experience");
    }
    header.push_str(",Seat_Class,Platform_Location");
    for name in SURVEY_RATED {
        header.push(',');
        header.push_str(name);
    }
    let mut out = header + "\n";

    for (i, id) in ids.iter().enumerate() {
        let mut row = id.to_string();
        if with_label {
            row.push_str(if satisfied(i) { ",1" } else { ",0" });
        }
        let seat_class = if i % 2 == 0 { "Green Car" } else { "Ordinary" };
        let platform = PLATFORM[(i * 5) % 6];
        write!(row, ",{},{}", seat_class, platform).unwrap();
        for (k, name) in SURVEY_RATED.iter().enumerate() {
            let value = if *name == "Onboard_Entertainment" {
                RATINGS[entertainment_level(i)]
            } else if (i + k) % 23 == 0 {
                ""
            } else {
                RATINGS[(i * (k + 2) + k) % 6]
            };
            row.push(',');
            row.push_str(value);
        }
        out.push_str(&row);
        out.push('\n');
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A data directory with the four default input files.
/// Training ids start at 98800001, test ids at 99900001.
pub fn create_data_dir(n_train: usize, n_test: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let train_ids: Vec<i64> = (1..=n_train as i64).map(|i| 98_800_000 + i).collect();
    let test_ids: Vec<i64> = (1..=n_test as i64).map(|i| 99_900_000 + i).collect();

    write_file(dir.path(), "Traveldata_train.csv", &travel_csv(&train_ids));
    write_file(dir.path(), "Surveydata_train.csv", &survey_csv(&train_ids, true));
    write_file(dir.path(), "Traveldata_test.csv", &travel_csv(&test_ids));
    write_file(dir.path(), "Surveydata_test.csv", &survey_csv(&test_ids, false));
    dir
}

/// The three-row frame used by the A/B encoding scenario
pub fn create_ab_frame() -> DataFrame {
    df! {
        "ID" => [1i64, 2, 3],
        "A" => [Some("x"), None, Some("y")],
        "B" => ["p", "q", "p"],
        "y" => [1i64, 0, 1],
    }
    .unwrap()
}

/// Read a u8 indicator column into plain values
pub fn indicator_values(df: &DataFrame, name: &str) -> Vec<u8> {
    df.column(name)
        .unwrap()
        .u8()
        .unwrap()
        .into_no_null_iter()
        .collect()
}
