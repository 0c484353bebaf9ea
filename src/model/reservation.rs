use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Financial/customer wrapper around exactly one concrete booking record,
/// referenced through the `booking_type` tag + `booking_id` pair.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Reservation {
    pub id: u64,
    pub customer_id: u64,
    pub supplier_id: Option<u64>,
    #[schema(example = "Flight")]
    pub booking_type: String,
    pub booking_id: u64,
    #[schema(example = "Hold")]
    pub status: String,
    pub sell_price: f64,
    pub cost: f64,
    pub fees: f64,
    pub net_profit: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum ReservationStatus {
    Hold,
    Issued,
    Cancelled,
}

/// The money columns of a reservation, with the derivation rule in one
/// place: net profit = sell - cost - fees unless explicitly overridden.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Financials {
    pub sell_price: f64,
    pub cost: f64,
    pub fees: f64,
    pub net_profit: f64,
}

impl Financials {
    pub fn new(sell_price: f64, cost: f64, fees: f64, net_override: Option<f64>) -> Self {
        Self {
            sell_price,
            cost,
            fees,
            net_profit: net_override.unwrap_or(sell_price - cost - fees),
        }
    }

    /// "Sometimes" merge for updates: absent fields keep their stored
    /// value. Net profit is recomputed whenever sell/cost/fees change,
    /// unless the patch overrides it outright; untouched financials keep
    /// the stored net profit even if it was itself an override.
    pub fn merged(
        &self,
        sell_price: Option<f64>,
        cost: Option<f64>,
        fees: Option<f64>,
        net_override: Option<f64>,
    ) -> Self {
        let changed = sell_price.is_some() || cost.is_some() || fees.is_some();
        let sell_price = sell_price.unwrap_or(self.sell_price);
        let cost = cost.unwrap_or(self.cost);
        let fees = fees.unwrap_or(self.fees);
        let net_profit = match net_override {
            Some(n) => n,
            None if changed => sell_price - cost - fees,
            None => self.net_profit,
        };
        Self {
            sell_price,
            cost,
            fees,
            net_profit,
        }
    }
}

impl Reservation {
    pub fn financials(&self) -> Financials {
        Financials {
            sell_price: self.sell_price,
            cost: self.cost,
            fees: self.fees,
            net_profit: self.net_profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_profit_is_derived_unless_overridden() {
        let f = Financials::new(1000.0, 700.0, 50.0, None);
        assert_eq!(f.net_profit, 250.0);

        let f = Financials::new(1000.0, 700.0, 50.0, Some(300.0));
        assert_eq!(f.net_profit, 300.0);
    }

    #[test]
    fn merge_recomputes_when_any_input_changes() {
        let stored = Financials::new(1000.0, 700.0, 50.0, None);

        let f = stored.merged(None, Some(600.0), None, None);
        assert_eq!(f.net_profit, 350.0);
        assert_eq!(f.sell_price, 1000.0);

        let f = stored.merged(None, None, Some(0.0), None);
        assert_eq!(f.net_profit, 300.0);
    }

    #[test]
    fn merge_keeps_stored_net_when_nothing_changes() {
        // Stored net was an explicit override; a notes-only update must
        // not silently recompute it.
        let stored = Financials::new(1000.0, 700.0, 50.0, Some(400.0));
        let f = stored.merged(None, None, None, None);
        assert_eq!(f.net_profit, 400.0);
    }

    #[test]
    fn merge_honours_explicit_override() {
        let stored = Financials::new(1000.0, 700.0, 50.0, None);
        let f = stored.merged(Some(1200.0), None, None, Some(111.0));
        assert_eq!(f.sell_price, 1200.0);
        assert_eq!(f.net_profit, 111.0);
    }

    #[test]
    fn reservation_status_round_trips() {
        use std::str::FromStr;
        assert_eq!(ReservationStatus::Hold.to_string(), "Hold");
        assert_eq!(
            ReservationStatus::from_str("Issued").unwrap(),
            ReservationStatus::Issued
        );
        assert!(ReservationStatus::from_str("Paid").is_err());
    }
}
