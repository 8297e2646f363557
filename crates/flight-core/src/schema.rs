//! Sheet and column names of the flight-operations workbook.

// ── Flight columns ────────────────────────────────────────────────────────────
pub mod flights {
    pub const DATE: &str = "日付";
    pub const PASSENGERS: &str = "旅客数";
    pub const CARGO_WEIGHT: &str = "貨物重量";
    pub const ARRIVAL_AIRPORT: &str = "到着空港";
    pub const FLIGHT_NUMBER: &str = "便名";

    pub const ALL: [&str; 5] = [DATE, PASSENGERS, CARGO_WEIGHT, ARRIVAL_AIRPORT, FLIGHT_NUMBER];
}

// ── Monthly sheets ────────────────────────────────────────────────────────────
pub mod sheets {
    pub const NOVEMBER_2020: &str = "2020年11月";
    pub const DECEMBER_2020: &str = "2020年12月";
}
