use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Discriminant for the one concrete booking record a reservation wraps.
/// Closed set; the string form is what the `reservations.booking_type`
/// column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum BookingType {
    Flight,
    Hotel,
    Cruise,
    Visa,
    Insurance,
    Ticket,
    Transportation,
    Appointment,
}

impl BookingType {
    /// The five variants sold through a wholesale supplier.
    pub fn requires_supplier(self) -> bool {
        matches!(
            self,
            BookingType::Flight
                | BookingType::Hotel
                | BookingType::Cruise
                | BookingType::Ticket
                | BookingType::Transportation
        )
    }

    pub fn table(self) -> &'static str {
        match self {
            BookingType::Flight => "flights",
            BookingType::Hotel => "hotels",
            BookingType::Cruise => "cruises",
            BookingType::Visa => "visas",
            BookingType::Insurance => "insurances",
            BookingType::Ticket => "tickets",
            BookingType::Transportation => "transportations",
            BookingType::Appointment => "appointments",
        }
    }
}

// Per-variant status sets. Stored as the exact variant name.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum FlightStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum HotelStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum CruiseStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum VisaStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum InsuranceStatus {
    Active,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum TicketStatus {
    Pending,
    Issued,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum TransportationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

// Row structs, one table per variant.

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Flight {
    pub id: u64,
    pub airline: String,
    pub flight_number: Option<String>,
    pub departure: String,
    pub destination: String,
    #[schema(value_type = String, format = "date")]
    pub departure_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub return_date: Option<NaiveDate>,
    pub passengers: u32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Hotel {
    pub id: u64,
    pub hotel_name: String,
    pub city: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub check_in: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub check_out: NaiveDate,
    pub rooms: u32,
    pub guests: u32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Cruise {
    pub id: u64,
    pub cruise_line: String,
    pub ship_name: Option<String>,
    pub cabin_type: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub departure_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub return_date: Option<NaiveDate>,
    pub passengers: u32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Visa {
    pub id: u64,
    pub country: String,
    pub visa_type: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub application_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub travel_date: Option<NaiveDate>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Insurance {
    pub id: u64,
    pub provider: String,
    pub policy_type: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Ticket {
    pub id: u64,
    pub event_name: String,
    #[schema(value_type = String, format = "date")]
    pub event_date: NaiveDate,
    pub quantity: u32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Transportation {
    pub id: u64,
    pub vehicle_type: Option<String>,
    pub pickup_location: String,
    pub dropoff_location: String,
    #[schema(value_type = String, format = "date-time")]
    pub pickup_time: NaiveDateTime,
    pub passengers: u32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Appointment {
    pub id: u64,
    pub service: String,
    pub location: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub appointment_time: NaiveDateTime,
    pub status: String,
}

/// The concrete record embedded in reservation responses, tagged the same
/// way create payloads are.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum BookingRecord {
    Flight(Flight),
    Hotel(Hotel),
    Cruise(Cruise),
    Visa(Visa),
    Insurance(Insurance),
    Ticket(Ticket),
    Transportation(Transportation),
    Appointment(Appointment),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tag_round_trips_through_strings() {
        for tag in [
            "Flight",
            "Hotel",
            "Cruise",
            "Visa",
            "Insurance",
            "Ticket",
            "Transportation",
            "Appointment",
        ] {
            assert_eq!(BookingType::from_str(tag).unwrap().to_string(), tag);
        }
        assert!(BookingType::from_str("Yacht").is_err());
    }

    #[test]
    fn supplier_bearing_set_is_exactly_five() {
        let bearing: Vec<_> = [
            BookingType::Flight,
            BookingType::Hotel,
            BookingType::Cruise,
            BookingType::Visa,
            BookingType::Insurance,
            BookingType::Ticket,
            BookingType::Transportation,
            BookingType::Appointment,
        ]
        .into_iter()
        .filter(|t| t.requires_supplier())
        .collect();
        assert_eq!(
            bearing,
            vec![
                BookingType::Flight,
                BookingType::Hotel,
                BookingType::Cruise,
                BookingType::Ticket,
                BookingType::Transportation,
            ]
        );
    }

    #[test]
    fn embedded_record_carries_its_tag() {
        let record = BookingRecord::Visa(Visa {
            id: 9,
            country: "Japan".into(),
            visa_type: Some("Tourist".into()),
            application_date: "2026-04-01".parse().unwrap(),
            travel_date: None,
            status: VisaStatus::Submitted.to_string(),
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Visa");
        assert_eq!(json["country"], "Japan");
    }
}
