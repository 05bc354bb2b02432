//! Decoding of spreadsheet rows into per-customer records.
//!
//! A room row lists its tenants as newline-separated entries inside single
//! cells (names, genders, birth dates, phones). Entries are matched by line
//! index. Every cell is split into positional slots first; a blank or
//! unparsable line becomes an empty slot that still holds its index, so one
//! bad birth date never shifts the phones of later tenants.

use std::sync::LazyLock;

use chrono::NaiveDate;
use database::Contract;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use database::validation::normalize_phone;

/// Leading enumeration such as `"2) "`.
static LINE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\)\s*").expect("line prefix pattern"));

/// `D/M/YYYY`, anywhere in the line.
static DMY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("date pattern"));

/// Phones shorter than this are rejected.
pub const MIN_PHONE_LENGTH: usize = 10;

/// Gender recorded when the gender cell has no entry for a tenant.
pub const UNKNOWN_GENDER: &str = "N/A";

/// Zero-based column positions of the billing sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub room_code: usize,
    pub names: usize,
    pub genders: usize,
    pub birth_dates: usize,
    pub phones: usize,
    pub contract_start: usize,
    pub contract_months: usize,
    pub contract_end: usize,
    pub room_price: usize,
    pub stay_days: usize,
    pub actual_room_fee: usize,
    pub new_index: usize,
    pub old_index: usize,
    pub used_kwh: usize,
    pub electricity_price: usize,
    pub water_usage: usize,
    pub water_fee: usize,
    pub management_fee: usize,
    pub old_debt: usize,
    pub deduction: usize,
    pub total_amount: usize,
    pub amount_paid: usize,
    pub remaining_amount: usize,
    pub note: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            room_code: 0,
            names: 1,
            genders: 2,
            birth_dates: 3,
            phones: 4,
            contract_start: 8,
            contract_months: 9,
            contract_end: 10,
            room_price: 14,
            stay_days: 15,
            actual_room_fee: 16,
            new_index: 17,
            old_index: 18,
            used_kwh: 19,
            electricity_price: 20,
            water_usage: 21,
            water_fee: 22,
            management_fee: 23,
            old_debt: 24,
            deduction: 25,
            total_amount: 26,
            amount_paid: 27,
            remaining_amount: 28,
            note: 29,
        }
    }
}

/// Framing of the fetched block: header rows on top, a totals row at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub header_rows: usize,
    pub footer_rows: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_rows: 3,
            footer_rows: 1,
        }
    }
}

impl SheetLayout {
    /// The data rows between header and footer. Empty when the block is too short.
    pub fn body<'a>(&self, rows: &'a [Vec<String>]) -> &'a [Vec<String>] {
        let end = rows.len().saturating_sub(self.footer_rows);
        if end <= self.header_rows {
            return &[];
        }
        &rows[self.header_rows..end]
    }

    /// 1-based sheet row number of the `index`-th body row.
    pub fn row_number(&self, start_row: u32, index: usize) -> u32 {
        start_row + (self.header_rows + index) as u32
    }
}

/// One tenant decoded from a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCustomer {
    pub name: String,
    /// International form, see [`normalize_phone`].
    pub phone: String,
    pub gender: String,
    pub dob: Option<NaiveDate>,
}

/// Why a tenant line was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum CustomerSkip {
    #[error("tenant line {index} has no name")]
    BlankName { index: usize },

    #[error("invalid phone number for {name}: '{phone}'")]
    InvalidPhone { name: String, phone: String },
}

/// Monetary and meter columns exactly as the sheet states them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetAmounts {
    pub room_price: i64,
    pub stay_days: i64,
    /// `None` when the cell is blank.
    pub actual_room_fee: Option<i64>,
    pub new_index: i64,
    pub old_index: i64,
    pub used_kwh: i64,
    pub electricity_price: i64,
    pub water_usage: i64,
    pub water_fee: i64,
    pub management_fee: i64,
    pub old_debt: i64,
    pub deduction: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub remaining_amount: i64,
}

/// A decoded room row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub row_number: u32,
    pub room_code: String,
    pub customers: Vec<ParsedCustomer>,
    pub skipped: Vec<CustomerSkip>,
    pub contract: Contract,
    pub amounts: SheetAmounts,
    pub note: String,
}

/// Why a whole row was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum RowSkip {
    #[error("missing room code")]
    MissingRoomCode,

    #[error("room {room_code} lists no customers")]
    NoCustomers { room_code: String },

    #[error("column {column} is not a number: '{value}'")]
    InvalidNumber { column: &'static str, value: String },
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

/// Split a multi-line cell into positional slots.
///
/// Enumeration prefixes are stripped and blank lines become `None`. Trailing
/// blank lines are dropped.
pub fn split_slots(value: &str) -> Vec<Option<String>> {
    let mut slots: Vec<Option<String>> = value
        .split('\n')
        .map(|line| {
            let line = LINE_PREFIX.replace(line.trim(), "");
            let line = line.trim();
            (!line.is_empty()).then(|| line.to_string())
        })
        .collect();

    while matches!(slots.last(), Some(None)) {
        slots.pop();
    }
    slots
}

/// Parse the first `D/M/YYYY` date found in `value`.
pub fn parse_dmy_date(value: &str) -> Option<NaiveDate> {
    let caps = DMY_DATE.captures(value)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse an integer written with `.` thousands separators.
///
/// Blank input is `Ok(None)`.
pub fn parse_amount(value: &str) -> Result<Option<i64>, String> {
    let digits: String = value
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect();
    if digits.is_empty() {
        return Ok(None);
    }
    digits.parse::<i64>().map(Some).map_err(|_| value.to_string())
}

fn amount(row: &[String], index: usize, column: &'static str) -> Result<Option<i64>, RowSkip> {
    parse_amount(cell(row, index)).map_err(|value| RowSkip::InvalidNumber { column, value })
}

fn number(row: &[String], index: usize, column: &'static str) -> Result<i64, RowSkip> {
    Ok(amount(row, index, column)?.unwrap_or(0))
}

fn slot(slots: &[Option<String>], index: usize) -> Option<&str> {
    slots.get(index).and_then(|s| s.as_deref())
}

/// Decode one row. `row_number` is only used for reporting.
pub fn parse_row(row: &[String], layout: &ColumnLayout, row_number: u32) -> Result<ParsedRow, RowSkip> {
    let room_code = cell(row, layout.room_code);
    if room_code.is_empty() {
        return Err(RowSkip::MissingRoomCode);
    }

    let names = split_slots(cell(row, layout.names));
    if names.iter().all(Option::is_none) {
        return Err(RowSkip::NoCustomers {
            room_code: room_code.to_string(),
        });
    }

    let amounts = SheetAmounts {
        room_price: number(row, layout.room_price, "room_price")?,
        stay_days: number(row, layout.stay_days, "stay_days")?,
        actual_room_fee: amount(row, layout.actual_room_fee, "actual_room_fee")?,
        new_index: number(row, layout.new_index, "new_index")?,
        old_index: number(row, layout.old_index, "old_index")?,
        used_kwh: number(row, layout.used_kwh, "used_kwh")?,
        electricity_price: number(row, layout.electricity_price, "electricity_price")?,
        water_usage: number(row, layout.water_usage, "water_usage")?,
        water_fee: number(row, layout.water_fee, "water_fee")?,
        management_fee: number(row, layout.management_fee, "management_fee")?,
        old_debt: number(row, layout.old_debt, "old_debt")?,
        deduction: number(row, layout.deduction, "deduction")?,
        total_amount: number(row, layout.total_amount, "total_amount")?,
        amount_paid: number(row, layout.amount_paid, "amount_paid")?,
        remaining_amount: number(row, layout.remaining_amount, "remaining_amount")?,
    };

    let contract = Contract {
        start_date: parse_dmy_date(cell(row, layout.contract_start)),
        end_date: parse_dmy_date(cell(row, layout.contract_end)),
        duration_months: number(row, layout.contract_months, "contract_months")?,
    };

    let genders = split_slots(cell(row, layout.genders));
    let birth_dates = split_slots(cell(row, layout.birth_dates));
    let phones = split_slots(cell(row, layout.phones));

    let mut customers = Vec::new();
    let mut skipped = Vec::new();

    for (index, name) in names.iter().enumerate() {
        let Some(name) = name else {
            skipped.push(CustomerSkip::BlankName { index });
            continue;
        };

        let phone = slot(&phones, index).unwrap_or("");
        if phone.chars().count() < MIN_PHONE_LENGTH {
            skipped.push(CustomerSkip::InvalidPhone {
                name: name.clone(),
                phone: phone.to_string(),
            });
            continue;
        }

        customers.push(ParsedCustomer {
            name: name.clone(),
            phone: normalize_phone(phone),
            gender: slot(&genders, index).unwrap_or(UNKNOWN_GENDER).to_string(),
            dob: slot(&birth_dates, index).and_then(parse_dmy_date),
        });
    }

    Ok(ParsedRow {
        row_number,
        room_code: room_code.to_string(),
        customers,
        skipped,
        contract,
        amounts,
        note: cell(row, layout.note).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(usize, &str)]) -> Vec<String> {
        let mut row = vec![String::new(); 30];
        for (index, value) in cells {
            row[*index] = value.to_string();
        }
        row
    }

    fn two_tenant_row() -> Vec<String> {
        row(&[
            (0, "101"),
            (1, "1) Nguyen Van A\n2) Tran Thi B"),
            (2, "Nam\nNữ"),
            (3, "01/01/1990\n02/02/1992"),
            (4, "0901111111\n0902222222"),
            (8, "1/3/2024"),
            (9, "6"),
            (10, "31/8/2024"),
            (14, "3.500.000"),
            (15, "30"),
            (16, "3.500.000"),
            (17, "1.250"),
            (18, "1.200"),
            (19, "50"),
            (20, "175.000"),
            (21, "2"),
            (22, "200.000"),
            (23, "150.000"),
            (26, "4.025.000"),
            (28, "4.025.000"),
            (29, "ghi chú"),
        ])
    }

    #[test]
    fn test_split_slots_strips_prefix_and_keeps_positions() {
        assert_eq!(
            split_slots("1) An\n\n3) Binh\n\n"),
            vec![Some("An".to_string()), None, Some("Binh".to_string())]
        );
        assert!(split_slots("").is_empty());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("3.500.000"), Ok(Some(3_500_000)));
        assert_eq!(parse_amount(" 42 "), Ok(Some(42)));
        assert_eq!(parse_amount("-50.000"), Ok(Some(-50_000)));
        assert_eq!(parse_amount(""), Ok(None));
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_dmy_date() {
        assert_eq!(parse_dmy_date("2/3/1995"), NaiveDate::from_ymd_opt(1995, 3, 2));
        assert_eq!(parse_dmy_date("sn: 02/03/1995"), NaiveDate::from_ymd_opt(1995, 3, 2));
        assert_eq!(parse_dmy_date("31/2/1995"), None);
        assert_eq!(parse_dmy_date("1995"), None);
    }

    #[test]
    fn test_parse_two_tenant_row() {
        let parsed = parse_row(&two_tenant_row(), &ColumnLayout::default(), 18).unwrap();

        assert_eq!(parsed.row_number, 18);
        assert_eq!(parsed.room_code, "101");
        assert_eq!(parsed.customers.len(), 2);
        assert!(parsed.skipped.is_empty());

        let first = &parsed.customers[0];
        assert_eq!(first.name, "Nguyen Van A");
        assert_eq!(first.phone, "84901111111");
        assert_eq!(first.gender, "Nam");
        assert_eq!(first.dob, NaiveDate::from_ymd_opt(1990, 1, 1));

        let second = &parsed.customers[1];
        assert_eq!(second.name, "Tran Thi B");
        assert_eq!(second.phone, "84902222222");
        assert_eq!(second.gender, "Nữ");

        assert_eq!(parsed.contract.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parsed.contract.duration_months, 6);
        assert_eq!(parsed.amounts.room_price, 3_500_000);
        assert_eq!(parsed.amounts.actual_room_fee, Some(3_500_000));
        assert_eq!(parsed.amounts.electricity_price, 175_000);
        assert_eq!(parsed.amounts.deduction, 0);
        assert_eq!(parsed.note, "ghi chú");
    }

    #[test]
    fn test_one_phone_two_names_skips_second_tenant() {
        let mut cells = two_tenant_row();
        cells[4] = "0901111111".to_string();

        let parsed = parse_row(&cells, &ColumnLayout::default(), 18).unwrap();

        assert_eq!(parsed.customers.len(), 1);
        assert_eq!(parsed.customers[0].name, "Nguyen Van A");
        assert_eq!(
            parsed.skipped,
            vec![CustomerSkip::InvalidPhone {
                name: "Tran Thi B".to_string(),
                phone: String::new(),
            }]
        );
    }

    #[test]
    fn test_bad_birth_date_does_not_shift_later_tenants() {
        let mut cells = two_tenant_row();
        cells[3] = "khong ro\n02/02/1992".to_string();

        let parsed = parse_row(&cells, &ColumnLayout::default(), 18).unwrap();

        assert_eq!(parsed.customers[0].dob, None);
        assert_eq!(parsed.customers[1].dob, NaiveDate::from_ymd_opt(1992, 2, 2));
    }

    #[test]
    fn test_short_phone_is_skipped() {
        let mut cells = two_tenant_row();
        cells[4] = "0901111111\n090222".to_string();

        let parsed = parse_row(&cells, &ColumnLayout::default(), 18).unwrap();

        assert_eq!(parsed.customers.len(), 1);
        assert!(matches!(
            &parsed.skipped[0],
            CustomerSkip::InvalidPhone { name, .. } if name == "Tran Thi B"
        ));
    }

    #[test]
    fn test_missing_gender_defaults() {
        let mut cells = two_tenant_row();
        cells[2] = "Nam".to_string();

        let parsed = parse_row(&cells, &ColumnLayout::default(), 18).unwrap();
        assert_eq!(parsed.customers[1].gender, UNKNOWN_GENDER);
    }

    #[test]
    fn test_blank_name_slot_is_skipped() {
        let mut cells = two_tenant_row();
        cells[1] = "\n2) Tran Thi B".to_string();

        let parsed = parse_row(&cells, &ColumnLayout::default(), 18).unwrap();

        assert_eq!(parsed.customers.len(), 1);
        assert_eq!(parsed.customers[0].phone, "84902222222");
        assert_eq!(parsed.skipped, vec![CustomerSkip::BlankName { index: 0 }]);
    }

    #[test]
    fn test_row_skips() {
        let layout = ColumnLayout::default();

        assert_eq!(
            parse_row(&row(&[(1, "An")]), &layout, 1),
            Err(RowSkip::MissingRoomCode)
        );
        assert!(matches!(
            parse_row(&row(&[(0, "101")]), &layout, 1),
            Err(RowSkip::NoCustomers { .. })
        ));

        let mut cells = two_tenant_row();
        cells[22] = "n/a".to_string();
        assert!(matches!(
            parse_row(&cells, &layout, 1),
            Err(RowSkip::InvalidNumber { column: "water_fee", .. })
        ));
    }

    #[test]
    fn test_short_row_reads_missing_cells_as_empty() {
        let cells: Vec<String> = ["101", "An", "Nam", "", "0901111111"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let parsed = parse_row(&cells, &ColumnLayout::default(), 1).unwrap();
        assert_eq!(parsed.customers.len(), 1);
        assert_eq!(parsed.amounts, SheetAmounts::default());
        assert_eq!(parsed.note, "");
    }

    #[test]
    fn test_sheet_layout_body() {
        let rows: Vec<Vec<String>> = (0..6).map(|i| vec![i.to_string()]).collect();
        let layout = SheetLayout::default();

        let body = layout.body(&rows);
        assert_eq!(body.len(), 2);
        assert_eq!(body[0][0], "3");
        assert_eq!(layout.row_number(15, 0), 18);

        assert!(layout.body(&rows[..4]).is_empty());
    }
}
