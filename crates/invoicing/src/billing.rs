//! Derived monetary fields of an invoice.
//!
//! Two paths exist and are kept apart. Manually created invoices price
//! electricity at [`ELECTRICITY_UNIT_RATE`]; synced invoices take the
//! electricity price the sheet already computed. Both derive totals with the
//! same formula, so `total_amount` and `remaining_amount` always agree with
//! the fee fields they are stored with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::SheetAmounts;

/// Price of one kWh for manually created invoices.
pub const ELECTRICITY_UNIT_RATE: i64 = 4000;

/// Fee components that make up a total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charges {
    pub actual_room_fee: i64,
    pub water_fee: i64,
    pub management_fee: i64,
    pub electricity_price: i64,
    pub old_debt: i64,
    pub deduction: i64,
}

/// An amount left the range of `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invoice amounts are out of range")]
pub struct AmountOverflow;

impl Charges {
    pub fn total(&self) -> Result<i64, AmountOverflow> {
        self.actual_room_fee
            .checked_add(self.water_fee)
            .and_then(|sum| sum.checked_add(self.management_fee))
            .and_then(|sum| sum.checked_add(self.electricity_price))
            .and_then(|sum| sum.checked_add(self.old_debt))
            .and_then(|sum| sum.checked_sub(self.deduction))
            .ok_or(AmountOverflow)
    }
}

/// Derived fields written onto an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub used_kwh: i64,
    pub electricity_price: i64,
    pub actual_room_fee: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub remaining_amount: i64,
}

/// Raw inputs of a manually entered invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCharges {
    pub room_price: i64,
    /// Overrides `room_price` as the billed rent.
    pub actual_room_fee: Option<i64>,
    pub old_index: i64,
    pub new_index: i64,
    pub water_fee: i64,
    pub management_fee: i64,
    pub old_debt: i64,
    pub deduction: i64,
}

/// Bill a manually entered invoice. Nothing has been paid yet.
///
/// A meter read backwards yields negative usage; it is passed through.
pub fn compute_manual(input: &ManualCharges) -> Result<Bill, AmountOverflow> {
    let used_kwh = input
        .new_index
        .checked_sub(input.old_index)
        .ok_or(AmountOverflow)?;
    let electricity_price = used_kwh
        .checked_mul(ELECTRICITY_UNIT_RATE)
        .ok_or(AmountOverflow)?;
    let actual_room_fee = input.actual_room_fee.unwrap_or(input.room_price);

    let total_amount = Charges {
        actual_room_fee,
        water_fee: input.water_fee,
        management_fee: input.management_fee,
        electricity_price,
        old_debt: input.old_debt,
        deduction: input.deduction,
    }
    .total()?;

    Ok(Bill {
        used_kwh,
        electricity_price,
        actual_room_fee,
        total_amount,
        amount_paid: 0,
        remaining_amount: total_amount,
    })
}

/// Bill a synced row. Usage and electricity price are the sheet's own values.
pub fn compute_synced(amounts: &SheetAmounts) -> Result<Bill, AmountOverflow> {
    let actual_room_fee = amounts.actual_room_fee.unwrap_or(amounts.room_price);

    let total_amount = Charges {
        actual_room_fee,
        water_fee: amounts.water_fee,
        management_fee: amounts.management_fee,
        electricity_price: amounts.electricity_price,
        old_debt: amounts.old_debt,
        deduction: amounts.deduction,
    }
    .total()?;
    let remaining_amount = total_amount
        .checked_sub(amounts.amount_paid)
        .ok_or(AmountOverflow)?;

    Ok(Bill {
        used_kwh: amounts.used_kwh,
        electricity_price: amounts.electricity_price,
        actual_room_fee,
        total_amount,
        amount_paid: amounts.amount_paid,
        remaining_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_bill() {
        let bill = compute_manual(&ManualCharges {
            room_price: 3_000_000,
            old_index: 1200,
            new_index: 1250,
            water_fee: 100_000,
            management_fee: 150_000,
            old_debt: 50_000,
            deduction: 20_000,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(bill.used_kwh, 50);
        assert_eq!(bill.electricity_price, 200_000);
        assert_eq!(bill.actual_room_fee, 3_000_000);
        assert_eq!(bill.total_amount, 3_480_000);
        assert_eq!(bill.amount_paid, 0);
        assert_eq!(bill.remaining_amount, 3_480_000);
    }

    #[test]
    fn test_manual_override_and_negative_usage() {
        let bill = compute_manual(&ManualCharges {
            room_price: 3_000_000,
            actual_room_fee: Some(1_500_000),
            old_index: 100,
            new_index: 90,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(bill.used_kwh, -10);
        assert_eq!(bill.electricity_price, -40_000);
        assert_eq!(bill.total_amount, 1_460_000);
    }

    #[test]
    fn test_synced_bill_keeps_sheet_electricity() {
        let amounts = SheetAmounts {
            room_price: 3_500_000,
            used_kwh: 50,
            electricity_price: 175_000,
            water_fee: 200_000,
            management_fee: 150_000,
            amount_paid: 1_000_000,
            // sheet's own total is off by one digit
            total_amount: 4_020_000,
            ..Default::default()
        };

        let bill = compute_synced(&amounts).unwrap();

        assert_eq!(bill.used_kwh, 50);
        assert_eq!(bill.electricity_price, 175_000);
        assert_eq!(bill.actual_room_fee, 3_500_000);
        assert_eq!(bill.total_amount, 4_025_000);
        assert_eq!(bill.remaining_amount, 3_025_000);
    }

    #[test]
    fn test_paths_disagree_on_same_meter_reading() {
        // Known inconsistency: the sheet prices electricity with its own tariff.
        let manual = compute_manual(&ManualCharges {
            room_price: 3_500_000,
            old_index: 1200,
            new_index: 1250,
            ..Default::default()
        })
        .unwrap();
        let synced = compute_synced(&SheetAmounts {
            room_price: 3_500_000,
            old_index: 1200,
            new_index: 1250,
            used_kwh: 50,
            electricity_price: 175_000,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(manual.used_kwh, synced.used_kwh);
        assert_eq!(manual.electricity_price, 200_000);
        assert_eq!(synced.electricity_price, 175_000);
        assert_ne!(manual.total_amount, synced.total_amount);
    }

    #[test]
    fn test_manual_overflow_is_an_error() {
        let huge_meter = compute_manual(&ManualCharges {
            new_index: 3_000_000_000_000_000,
            ..Default::default()
        });
        assert_eq!(huge_meter, Err(AmountOverflow));

        let huge_debt = compute_manual(&ManualCharges {
            room_price: i64::MAX,
            old_debt: 1,
            ..Default::default()
        });
        assert_eq!(huge_debt, Err(AmountOverflow));
    }

    #[test]
    fn test_synced_overflow_is_an_error() {
        let amounts = SheetAmounts {
            room_price: i64::MAX,
            water_fee: 1,
            ..Default::default()
        };
        assert_eq!(compute_synced(&amounts), Err(AmountOverflow));

        let amounts = SheetAmounts {
            deduction: i64::MAX,
            amount_paid: i64::MAX,
            ..Default::default()
        };
        assert_eq!(compute_synced(&amounts), Err(AmountOverflow));
    }
}
