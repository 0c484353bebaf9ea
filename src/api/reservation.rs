use crate::error::{ApiError, field_error, validation_error};
use crate::model::booking::{
    Appointment, AppointmentStatus, BookingRecord, BookingType, Cruise, CruiseStatus, Flight,
    FlightStatus, Hotel, HotelStatus, Insurance, InsuranceStatus, Ticket, TicketStatus,
    Transportation, TransportationStatus, Visa, VisaStatus,
};
use crate::model::customer::Customer;
use crate::model::reservation::{Financials, Reservation, ReservationStatus};
use crate::model::supplier::Supplier;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::{MySql, MySqlPool, Transaction};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,19}$").unwrap());

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("invalid phone number".into());
        Err(err)
    }
}

/* =========================
Create payloads (one per variant, selected by the "type" tag)
========================= */

#[derive(Debug, Deserialize, Validate)]
pub struct FlightPayload {
    #[validate(length(min = 1))]
    pub airline: String,
    pub flight_number: Option<String>,
    #[validate(length(min = 1))]
    pub departure: String,
    #[validate(length(min = 1))]
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub passengers: u32,
    /// Ignored: newly created flights always start Pending.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HotelPayload {
    #[validate(length(min = 1))]
    pub hotel_name: String,
    pub city: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1))]
    pub rooms: u32,
    #[validate(range(min = 1))]
    pub guests: u32,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CruisePayload {
    #[validate(length(min = 1))]
    pub cruise_line: String,
    pub ship_name: Option<String>,
    pub cabin_type: Option<String>,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub passengers: u32,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VisaPayload {
    #[validate(length(min = 1))]
    pub country: String,
    pub visa_type: Option<String>,
    pub application_date: NaiveDate,
    pub travel_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InsurancePayload {
    #[validate(length(min = 1))]
    pub provider: String,
    pub policy_type: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TicketPayload {
    #[validate(length(min = 1))]
    pub event_name: String,
    pub event_date: NaiveDate,
    #[validate(range(min = 1))]
    pub quantity: u32,
    /// Ignored: newly created tickets always start Pending.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransportationPayload {
    pub vehicle_type: Option<String>,
    #[validate(length(min = 1))]
    pub pickup_location: String,
    #[validate(length(min = 1))]
    pub dropoff_location: String,
    pub pickup_time: NaiveDateTime,
    #[validate(range(min = 1))]
    pub passengers: u32,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AppointmentPayload {
    #[validate(length(min = 1))]
    pub service: String,
    pub location: Option<String>,
    pub appointment_time: NaiveDateTime,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BookingPayload {
    Flight(FlightPayload),
    Hotel(HotelPayload),
    Cruise(CruisePayload),
    Visa(VisaPayload),
    Insurance(InsurancePayload),
    Ticket(TicketPayload),
    Transportation(TransportationPayload),
    Appointment(AppointmentPayload),
}

impl BookingPayload {
    pub fn booking_type(&self) -> BookingType {
        match self {
            BookingPayload::Flight(_) => BookingType::Flight,
            BookingPayload::Hotel(_) => BookingType::Hotel,
            BookingPayload::Cruise(_) => BookingType::Cruise,
            BookingPayload::Visa(_) => BookingType::Visa,
            BookingPayload::Insurance(_) => BookingType::Insurance,
            BookingPayload::Ticket(_) => BookingType::Ticket,
            BookingPayload::Transportation(_) => BookingType::Transportation,
            BookingPayload::Appointment(_) => BookingType::Appointment,
        }
    }

    /// Per-variant schema checks plus the cross-field date rules the
    /// derive cannot express.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            BookingPayload::Flight(p) => {
                p.validate()?;
                if let Some(ret) = p.return_date {
                    if ret < p.departure_date {
                        return Err(validation_error(
                            "return_date",
                            "must not be before departure_date",
                        ));
                    }
                }
                Ok(())
            }
            BookingPayload::Hotel(p) => {
                p.validate()?;
                if p.check_out <= p.check_in {
                    return Err(validation_error("check_out", "must be after check_in"));
                }
                Ok(())
            }
            BookingPayload::Cruise(p) => {
                p.validate()?;
                if let Some(ret) = p.return_date {
                    if ret < p.departure_date {
                        return Err(validation_error(
                            "return_date",
                            "must not be before departure_date",
                        ));
                    }
                }
                Ok(())
            }
            BookingPayload::Visa(p) => p.validate(),
            BookingPayload::Insurance(p) => {
                p.validate()?;
                if p.end_date < p.start_date {
                    return Err(validation_error("end_date", "must not be before start_date"));
                }
                Ok(())
            }
            BookingPayload::Ticket(p) => p.validate(),
            BookingPayload::Transportation(p) => p.validate(),
            BookingPayload::Appointment(p) => p.validate(),
        }
    }

    /// The status the concrete record is created with. Flight and Ticket
    /// ignore any requested status and start Pending (intentional
    /// normalization); the rest accept a known status or fall back to
    /// their variant default.
    pub fn initial_status(&self) -> Result<String, ApiError> {
        match self {
            BookingPayload::Flight(_) => Ok(FlightStatus::Pending.to_string()),
            BookingPayload::Ticket(_) => Ok(TicketStatus::Pending.to_string()),
            BookingPayload::Hotel(p) => parse_status_or(p.status.as_deref(), HotelStatus::Pending),
            BookingPayload::Cruise(p) => {
                parse_status_or(p.status.as_deref(), CruiseStatus::Pending)
            }
            BookingPayload::Visa(p) => parse_status_or(p.status.as_deref(), VisaStatus::Submitted),
            BookingPayload::Insurance(p) => {
                parse_status_or(p.status.as_deref(), InsuranceStatus::Active)
            }
            BookingPayload::Transportation(p) => {
                parse_status_or(p.status.as_deref(), TransportationStatus::Pending)
            }
            BookingPayload::Appointment(p) => {
                parse_status_or(p.status.as_deref(), AppointmentStatus::Scheduled)
            }
        }
    }
}

fn parse_status_or<T>(input: Option<&str>, default: T) -> Result<String, ApiError>
where
    T: FromStr + Display,
{
    match input {
        Some(v) => v
            .parse::<T>()
            .map(|s| s.to_string())
            .map_err(|_| field_error("status", "unknown status for this booking type")),
        None => Ok(default.to_string()),
    }
}

fn patched_status<T>(input: Option<&str>, current: String) -> Result<String, ApiError>
where
    T: FromStr + Display,
{
    match input {
        Some(v) => v
            .parse::<T>()
            .map(|s| s.to_string())
            .map_err(|_| field_error("status", "unknown status for this booking type")),
        None => Ok(current),
    }
}

/* =========================
Shared create/update DTOs
========================= */

#[derive(Debug, Deserialize, Validate)]
pub struct FinancialDetails {
    #[validate(range(min = 0.0))]
    pub sell_price: f64,
    #[validate(range(min = 0.0))]
    pub cost: f64,
    #[validate(range(min = 0.0))]
    pub fees: Option<f64>,
    /// Explicit override; otherwise derived as sell - cost - fees.
    pub net_profit: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservation {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(rename = "phoneNumber")]
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[serde(flatten)]
    pub booking: BookingPayload,
    #[serde(rename = "supplierName")]
    pub supplier_name: Option<String>,
    pub supplier_phone: Option<String>,
    /// Accepted for compatibility and ignored: reservations start on Hold.
    pub payment_status: Option<String>,
    #[validate]
    pub details: FinancialDetails,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FinancialPatch {
    #[validate(range(min = 0.0))]
    pub sell_price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub cost: Option<f64>,
    #[validate(range(min = 0.0))]
    pub fees: Option<f64>,
    pub net_profit: Option<f64>,
}

/// Partial update: absent fields keep their stored value. Variant fields
/// arrive flattened at the top level, the same shape creation uses; the
/// "type" tag is optional and re-derived from the stored record.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReservation {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(rename = "phoneNumber")]
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    #[serde(rename = "supplierName")]
    pub supplier_name: Option<String>,
    pub supplier_phone: Option<String>,
    pub status: Option<String>,
    #[validate]
    pub details: Option<FinancialPatch>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub booking_fields: serde_json::Map<String, Value>,
}

/* =========================
Variant patches
========================= */

#[derive(Debug, Default, Deserialize)]
pub struct FlightPatch {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HotelPatch {
    pub hotel_name: Option<String>,
    pub city: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub rooms: Option<u32>,
    pub guests: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CruisePatch {
    pub cruise_line: Option<String>,
    pub ship_name: Option<String>,
    pub cabin_type: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VisaPatch {
    pub country: Option<String>,
    pub visa_type: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub travel_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InsurancePatch {
    pub provider: Option<String>,
    pub policy_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketPatch {
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub quantity: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransportationPatch {
    pub vehicle_type: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub pickup_time: Option<NaiveDateTime>,
    pub passengers: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentPatch {
    pub service: Option<String>,
    pub location: Option<String>,
    pub appointment_time: Option<NaiveDateTime>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BookingPatch {
    Flight(FlightPatch),
    Hotel(HotelPatch),
    Cruise(CruisePatch),
    Visa(VisaPatch),
    Insurance(InsurancePatch),
    Ticket(TicketPatch),
    Transportation(TransportationPatch),
    Appointment(AppointmentPatch),
}

/* =========================
Patch merges (pure)
========================= */

fn merged_flight(current: Flight, p: &FlightPatch) -> Result<Flight, ApiError> {
    Ok(Flight {
        id: current.id,
        airline: p.airline.clone().unwrap_or(current.airline),
        flight_number: p.flight_number.clone().or(current.flight_number),
        departure: p.departure.clone().unwrap_or(current.departure),
        destination: p.destination.clone().unwrap_or(current.destination),
        departure_date: p.departure_date.unwrap_or(current.departure_date),
        return_date: p.return_date.or(current.return_date),
        passengers: p.passengers.unwrap_or(current.passengers),
        status: patched_status::<FlightStatus>(p.status.as_deref(), current.status)?,
    })
}

fn merged_hotel(current: Hotel, p: &HotelPatch) -> Result<Hotel, ApiError> {
    let merged = Hotel {
        id: current.id,
        hotel_name: p.hotel_name.clone().unwrap_or(current.hotel_name),
        city: p.city.clone().or(current.city),
        check_in: p.check_in.unwrap_or(current.check_in),
        check_out: p.check_out.unwrap_or(current.check_out),
        rooms: p.rooms.unwrap_or(current.rooms),
        guests: p.guests.unwrap_or(current.guests),
        status: patched_status::<HotelStatus>(p.status.as_deref(), current.status)?,
    };
    if merged.check_out <= merged.check_in {
        return Err(field_error("check_out", "must be after check_in"));
    }
    Ok(merged)
}

fn merged_cruise(current: Cruise, p: &CruisePatch) -> Result<Cruise, ApiError> {
    Ok(Cruise {
        id: current.id,
        cruise_line: p.cruise_line.clone().unwrap_or(current.cruise_line),
        ship_name: p.ship_name.clone().or(current.ship_name),
        cabin_type: p.cabin_type.clone().or(current.cabin_type),
        departure_date: p.departure_date.unwrap_or(current.departure_date),
        return_date: p.return_date.or(current.return_date),
        passengers: p.passengers.unwrap_or(current.passengers),
        status: patched_status::<CruiseStatus>(p.status.as_deref(), current.status)?,
    })
}

fn merged_visa(current: Visa, p: &VisaPatch) -> Result<Visa, ApiError> {
    Ok(Visa {
        id: current.id,
        country: p.country.clone().unwrap_or(current.country),
        visa_type: p.visa_type.clone().or(current.visa_type),
        application_date: p.application_date.unwrap_or(current.application_date),
        travel_date: p.travel_date.or(current.travel_date),
        status: patched_status::<VisaStatus>(p.status.as_deref(), current.status)?,
    })
}

fn merged_insurance(current: Insurance, p: &InsurancePatch) -> Result<Insurance, ApiError> {
    let merged = Insurance {
        id: current.id,
        provider: p.provider.clone().unwrap_or(current.provider),
        policy_type: p.policy_type.clone().or(current.policy_type),
        start_date: p.start_date.unwrap_or(current.start_date),
        end_date: p.end_date.unwrap_or(current.end_date),
        status: patched_status::<InsuranceStatus>(p.status.as_deref(), current.status)?,
    };
    if merged.end_date < merged.start_date {
        return Err(field_error("end_date", "must not be before start_date"));
    }
    Ok(merged)
}

fn merged_ticket(current: Ticket, p: &TicketPatch) -> Result<Ticket, ApiError> {
    Ok(Ticket {
        id: current.id,
        event_name: p.event_name.clone().unwrap_or(current.event_name),
        event_date: p.event_date.unwrap_or(current.event_date),
        quantity: p.quantity.unwrap_or(current.quantity),
        status: patched_status::<TicketStatus>(p.status.as_deref(), current.status)?,
    })
}

fn merged_transportation(
    current: Transportation,
    p: &TransportationPatch,
) -> Result<Transportation, ApiError> {
    Ok(Transportation {
        id: current.id,
        vehicle_type: p.vehicle_type.clone().or(current.vehicle_type),
        pickup_location: p.pickup_location.clone().unwrap_or(current.pickup_location),
        dropoff_location: p
            .dropoff_location
            .clone()
            .unwrap_or(current.dropoff_location),
        pickup_time: p.pickup_time.unwrap_or(current.pickup_time),
        passengers: p.passengers.unwrap_or(current.passengers),
        status: patched_status::<TransportationStatus>(p.status.as_deref(), current.status)?,
    })
}

fn merged_appointment(current: Appointment, p: &AppointmentPatch) -> Result<Appointment, ApiError> {
    Ok(Appointment {
        id: current.id,
        service: p.service.clone().unwrap_or(current.service),
        location: p.location.clone().or(current.location),
        appointment_time: p.appointment_time.unwrap_or(current.appointment_time),
        status: patched_status::<AppointmentStatus>(p.status.as_deref(), current.status)?,
    })
}

/* =========================
Row access
========================= */

const RES_COLS: &str =
    "id, customer_id, supplier_id, booking_type, booking_id, status, sell_price, cost, fees, net_profit, notes";

async fn fetch_reservation(pool: &MySqlPool, id: u64) -> Result<Option<Reservation>, ApiError> {
    let sql = format!("SELECT {RES_COLS} FROM reservations WHERE id = ? AND deleted_at IS NULL");
    let reservation = sqlx::query_as::<_, Reservation>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(reservation)
}

async fn insert_booking(
    tx: &mut Transaction<'_, MySql>,
    payload: &BookingPayload,
    status: &str,
) -> Result<u64, ApiError> {
    let result = match payload {
        BookingPayload::Flight(p) => {
            sqlx::query(
                r#"
                INSERT INTO flights
                (airline, flight_number, departure, destination, departure_date, return_date, passengers, status)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&p.airline)
            .bind(p.flight_number.as_deref())
            .bind(&p.departure)
            .bind(&p.destination)
            .bind(p.departure_date)
            .bind(p.return_date)
            .bind(p.passengers)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
        BookingPayload::Hotel(p) => {
            sqlx::query(
                r#"
                INSERT INTO hotels
                (hotel_name, city, check_in, check_out, rooms, guests, status)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&p.hotel_name)
            .bind(p.city.as_deref())
            .bind(p.check_in)
            .bind(p.check_out)
            .bind(p.rooms)
            .bind(p.guests)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
        BookingPayload::Cruise(p) => {
            sqlx::query(
                r#"
                INSERT INTO cruises
                (cruise_line, ship_name, cabin_type, departure_date, return_date, passengers, status)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&p.cruise_line)
            .bind(p.ship_name.as_deref())
            .bind(p.cabin_type.as_deref())
            .bind(p.departure_date)
            .bind(p.return_date)
            .bind(p.passengers)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
        BookingPayload::Visa(p) => {
            sqlx::query(
                r#"
                INSERT INTO visas
                (country, visa_type, application_date, travel_date, status)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&p.country)
            .bind(p.visa_type.as_deref())
            .bind(p.application_date)
            .bind(p.travel_date)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
        BookingPayload::Insurance(p) => {
            sqlx::query(
                r#"
                INSERT INTO insurances
                (provider, policy_type, start_date, end_date, status)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&p.provider)
            .bind(p.policy_type.as_deref())
            .bind(p.start_date)
            .bind(p.end_date)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
        BookingPayload::Ticket(p) => {
            sqlx::query(
                r#"
                INSERT INTO tickets (event_name, event_date, quantity, status)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&p.event_name)
            .bind(p.event_date)
            .bind(p.quantity)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
        BookingPayload::Transportation(p) => {
            sqlx::query(
                r#"
                INSERT INTO transportations
                (vehicle_type, pickup_location, dropoff_location, pickup_time, passengers, status)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(p.vehicle_type.as_deref())
            .bind(&p.pickup_location)
            .bind(&p.dropoff_location)
            .bind(p.pickup_time)
            .bind(p.passengers)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
        BookingPayload::Appointment(p) => {
            sqlx::query(
                r#"
                INSERT INTO appointments (service, location, appointment_time, status)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&p.service)
            .bind(p.location.as_deref())
            .bind(p.appointment_time)
            .bind(status)
            .execute(&mut **tx)
            .await?
        }
    };
    Ok(result.last_insert_id())
}

async fn fetch_booking(
    pool: &MySqlPool,
    booking_type: BookingType,
    booking_id: u64,
) -> Result<Option<BookingRecord>, ApiError> {
    let record = match booking_type {
        BookingType::Flight => sqlx::query_as::<_, Flight>(
            "SELECT id, airline, flight_number, departure, destination, departure_date, return_date, passengers, status FROM flights WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Flight),
        BookingType::Hotel => sqlx::query_as::<_, Hotel>(
            "SELECT id, hotel_name, city, check_in, check_out, rooms, guests, status FROM hotels WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Hotel),
        BookingType::Cruise => sqlx::query_as::<_, Cruise>(
            "SELECT id, cruise_line, ship_name, cabin_type, departure_date, return_date, passengers, status FROM cruises WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Cruise),
        BookingType::Visa => sqlx::query_as::<_, Visa>(
            "SELECT id, country, visa_type, application_date, travel_date, status FROM visas WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Visa),
        BookingType::Insurance => sqlx::query_as::<_, Insurance>(
            "SELECT id, provider, policy_type, start_date, end_date, status FROM insurances WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Insurance),
        BookingType::Ticket => sqlx::query_as::<_, Ticket>(
            "SELECT id, event_name, event_date, quantity, status FROM tickets WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Ticket),
        BookingType::Transportation => sqlx::query_as::<_, Transportation>(
            "SELECT id, vehicle_type, pickup_location, dropoff_location, pickup_time, passengers, status FROM transportations WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Transportation),
        BookingType::Appointment => sqlx::query_as::<_, Appointment>(
            "SELECT id, service, location, appointment_time, status FROM appointments WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .map(BookingRecord::Appointment),
    };
    Ok(record)
}

async fn apply_booking_patch(
    tx: &mut Transaction<'_, MySql>,
    booking_type: BookingType,
    booking_id: u64,
    patch: &BookingPatch,
) -> Result<(), ApiError> {
    match (booking_type, patch) {
        (BookingType::Flight, BookingPatch::Flight(p)) => {
            let current = sqlx::query_as::<_, Flight>(
                "SELECT id, airline, flight_number, departure, destination, departure_date, return_date, passengers, status FROM flights WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_flight(current, p)?;
            sqlx::query(
                "UPDATE flights SET airline = ?, flight_number = ?, departure = ?, destination = ?, departure_date = ?, return_date = ?, passengers = ?, status = ? WHERE id = ?",
            )
            .bind(&merged.airline)
            .bind(merged.flight_number.as_deref())
            .bind(&merged.departure)
            .bind(&merged.destination)
            .bind(merged.departure_date)
            .bind(merged.return_date)
            .bind(merged.passengers)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        (BookingType::Hotel, BookingPatch::Hotel(p)) => {
            let current = sqlx::query_as::<_, Hotel>(
                "SELECT id, hotel_name, city, check_in, check_out, rooms, guests, status FROM hotels WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_hotel(current, p)?;
            sqlx::query(
                "UPDATE hotels SET hotel_name = ?, city = ?, check_in = ?, check_out = ?, rooms = ?, guests = ?, status = ? WHERE id = ?",
            )
            .bind(&merged.hotel_name)
            .bind(merged.city.as_deref())
            .bind(merged.check_in)
            .bind(merged.check_out)
            .bind(merged.rooms)
            .bind(merged.guests)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        (BookingType::Cruise, BookingPatch::Cruise(p)) => {
            let current = sqlx::query_as::<_, Cruise>(
                "SELECT id, cruise_line, ship_name, cabin_type, departure_date, return_date, passengers, status FROM cruises WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_cruise(current, p)?;
            sqlx::query(
                "UPDATE cruises SET cruise_line = ?, ship_name = ?, cabin_type = ?, departure_date = ?, return_date = ?, passengers = ?, status = ? WHERE id = ?",
            )
            .bind(&merged.cruise_line)
            .bind(merged.ship_name.as_deref())
            .bind(merged.cabin_type.as_deref())
            .bind(merged.departure_date)
            .bind(merged.return_date)
            .bind(merged.passengers)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        (BookingType::Visa, BookingPatch::Visa(p)) => {
            let current = sqlx::query_as::<_, Visa>(
                "SELECT id, country, visa_type, application_date, travel_date, status FROM visas WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_visa(current, p)?;
            sqlx::query(
                "UPDATE visas SET country = ?, visa_type = ?, application_date = ?, travel_date = ?, status = ? WHERE id = ?",
            )
            .bind(&merged.country)
            .bind(merged.visa_type.as_deref())
            .bind(merged.application_date)
            .bind(merged.travel_date)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        (BookingType::Insurance, BookingPatch::Insurance(p)) => {
            let current = sqlx::query_as::<_, Insurance>(
                "SELECT id, provider, policy_type, start_date, end_date, status FROM insurances WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_insurance(current, p)?;
            sqlx::query(
                "UPDATE insurances SET provider = ?, policy_type = ?, start_date = ?, end_date = ?, status = ? WHERE id = ?",
            )
            .bind(&merged.provider)
            .bind(merged.policy_type.as_deref())
            .bind(merged.start_date)
            .bind(merged.end_date)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        (BookingType::Ticket, BookingPatch::Ticket(p)) => {
            let current = sqlx::query_as::<_, Ticket>(
                "SELECT id, event_name, event_date, quantity, status FROM tickets WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_ticket(current, p)?;
            sqlx::query(
                "UPDATE tickets SET event_name = ?, event_date = ?, quantity = ?, status = ? WHERE id = ?",
            )
            .bind(&merged.event_name)
            .bind(merged.event_date)
            .bind(merged.quantity)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        (BookingType::Transportation, BookingPatch::Transportation(p)) => {
            let current = sqlx::query_as::<_, Transportation>(
                "SELECT id, vehicle_type, pickup_location, dropoff_location, pickup_time, passengers, status FROM transportations WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_transportation(current, p)?;
            sqlx::query(
                "UPDATE transportations SET vehicle_type = ?, pickup_location = ?, dropoff_location = ?, pickup_time = ?, passengers = ?, status = ? WHERE id = ?",
            )
            .bind(merged.vehicle_type.as_deref())
            .bind(&merged.pickup_location)
            .bind(&merged.dropoff_location)
            .bind(merged.pickup_time)
            .bind(merged.passengers)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        (BookingType::Appointment, BookingPatch::Appointment(p)) => {
            let current = sqlx::query_as::<_, Appointment>(
                "SELECT id, service, location, appointment_time, status FROM appointments WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound("Booking"))?;
            let merged = merged_appointment(current, p)?;
            sqlx::query(
                "UPDATE appointments SET service = ?, location = ?, appointment_time = ?, status = ? WHERE id = ?",
            )
            .bind(&merged.service)
            .bind(merged.location.as_deref())
            .bind(merged.appointment_time)
            .bind(&merged.status)
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;
        }
        _ => {
            return Err(field_error(
                "type",
                "does not match the reservation's booking type",
            ));
        }
    }
    Ok(())
}

/// Reservation row with its booking, customer, and supplier embedded.
async fn assemble_reservation(
    pool: &MySqlPool,
    reservation: Reservation,
) -> Result<Value, ApiError> {
    let booking_type: BookingType = reservation
        .booking_type
        .parse()
        .map_err(|_| ApiError::Internal(format!(
            "reservation {} has unparseable booking type '{}'",
            reservation.id, reservation.booking_type
        )))?;

    let booking = fetch_booking(pool, booking_type, reservation.booking_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!(
            "reservation {} references missing {} record {}",
            reservation.id, reservation.booking_type, reservation.booking_id
        )))?;

    let customer = sqlx::query_as::<_, Customer>("SELECT id, name, phone FROM customers WHERE id = ?")
        .bind(reservation.customer_id)
        .fetch_optional(pool)
        .await?;

    let supplier = match reservation.supplier_id {
        Some(id) => {
            sqlx::query_as::<_, Supplier>("SELECT id, name, phone FROM suppliers WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        None => None,
    };

    let mut value = serde_json::to_value(&reservation)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    value["booking"] = serde_json::to_value(&booking).map_err(|e| ApiError::Internal(e.to_string()))?;
    value["customer"] = serde_json::to_value(&customer).map_err(|e| ApiError::Internal(e.to_string()))?;
    value["supplier"] = serde_json::to_value(&supplier).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(value)
}

/* =========================
Create
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    request_body(content = Object, description = "Shared fields + a tagged variant payload", content_type = "application/json", example = json!({
        "name": "Jane Doe",
        "phoneNumber": "+201001234567",
        "type": "Flight",
        "airline": "EgyptAir",
        "departure": "CAI",
        "destination": "DXB",
        "departure_date": "2026-05-01",
        "passengers": 2,
        "supplierName": "Sky Wholesale",
        "details": { "sell_price": 1000.0, "cost": 700.0, "fees": 50.0 },
        "notes": "window seats"
    })),
    responses(
        (status = 201, description = "Reservation created on Hold", body = Object, example = json!({
            "message": "Reservation created",
            "reservation": { "id": 1, "status": "Hold", "booking": { "type": "Flight", "status": "Pending" } }
        })),
        (status = 422, description = "Validation failed", body = Object, example = json!({
            "success": false,
            "message": "validation failed",
            "errors": { "passengers": ["range"] }
        })),
        (status = 500, description = "Internal server error (nothing partially created)")
    ),
    tag = "Reservations"
)]
pub async fn create_reservation(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateReservation>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    // Fail fast before touching the database; the transaction below
    // guarantees no orphan rows if anything still fails mid-sequence.
    payload.validate().map_err(ApiError::Validation)?;
    payload.booking.validate().map_err(ApiError::Validation)?;

    let booking_type = payload.booking.booking_type();
    let booking_status = payload.booking.initial_status()?;

    if payload.payment_status.is_some() {
        debug!("payment_status on create is ignored; reservations start on Hold");
    }
    if let Some(name) = payload.supplier_name.as_deref() {
        if booking_type.requires_supplier() && name.trim().is_empty() {
            return Err(field_error("supplierName", "must not be empty").into());
        }
    }

    let details = &payload.details;
    let financials = Financials::new(
        details.sell_price,
        details.cost,
        details.fees.unwrap_or(0.0),
        details.net_profit,
    );

    let mut tx = pool.begin().await.map_err(ApiError::Database)?;

    let customer_id = sqlx::query("INSERT INTO customers (name, phone) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(&payload.phone_number)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?
        .last_insert_id();

    let booking_id = insert_booking(&mut tx, &payload.booking, &booking_status).await?;

    let supplier_id = if booking_type.requires_supplier() {
        match payload
            .supplier_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            Some(name) => {
                let id = sqlx::query("INSERT INTO suppliers (name, phone) VALUES (?, ?)")
                    .bind(name)
                    .bind(payload.supplier_phone.as_deref())
                    .execute(&mut *tx)
                    .await
                    .map_err(ApiError::Database)?
                    .last_insert_id();
                Some(id)
            }
            None => None,
        }
    } else {
        None
    };

    let reservation_id = sqlx::query(
        r#"
        INSERT INTO reservations
        (customer_id, supplier_id, booking_type, booking_id, status, sell_price, cost, fees, net_profit, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(customer_id)
    .bind(supplier_id)
    .bind(booking_type.to_string())
    .bind(booking_id)
    .bind(ReservationStatus::Hold.to_string())
    .bind(financials.sell_price)
    .bind(financials.cost)
    .bind(financials.fees)
    .bind(financials.net_profit)
    .bind(payload.notes.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(ApiError::Database)?
    .last_insert_id();

    tx.commit().await.map_err(ApiError::Database)?;

    info!(reservation_id, %booking_type, "reservation created");

    let reservation = fetch_reservation(pool.get_ref(), reservation_id)
        .await?
        .ok_or(ApiError::NotFound("Reservation"))?;
    let body = assemble_reservation(pool.get_ref(), reservation).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Reservation created",
        "reservation": body,
    })))
}

/* =========================
Detail / list
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/reservations/{reservation_id}",
    params(("reservation_id" = u64, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation with booking, customer and supplier", body = Object),
        (status = 404, description = "Reservation not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reservations"
)]
pub async fn get_reservation(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let reservation = fetch_reservation(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Reservation"))?;
    let body = assemble_reservation(pool.get_ref(), reservation).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": body })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReservationFilter {
    /// Filter by booking variant tag
    #[serde(rename = "type")]
    #[schema(example = "Flight")]
    pub booking_type: Option<String>,
    /// Filter by reservation status
    #[schema(example = "Hold")]
    pub status: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    params(ReservationFilter),
    responses(
        (status = 200, description = "Paginated reservations", body = Object, example = json!({
            "success": true,
            "data": [],
            "page": 1,
            "per_page": 10,
            "total": 0
        })),
        (status = 422, description = "Unknown type/status filter"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reservations"
)]
pub async fn list_reservations(
    pool: web::Data<MySqlPool>,
    query: web::Query<ReservationFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE deleted_at IS NULL");
    let mut args: Vec<String> = Vec::new();

    if let Some(tag) = query.booking_type.as_deref() {
        let tag: BookingType = tag
            .parse()
            .map_err(|_| field_error("type", "unknown booking type"))?;
        where_sql.push_str(" AND booking_type = ?");
        args.push(tag.to_string());
    }
    if let Some(status) = query.status.as_deref() {
        let status: ReservationStatus = status
            .parse()
            .map_err(|_| field_error("status", "unknown reservation status"))?;
        where_sql.push_str(" AND status = ?");
        args.push(status.to_string());
    }

    let count_sql = format!("SELECT COUNT(*) FROM reservations{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = count_q.bind(arg);
    }
    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::Database)?;

    let data_sql = format!(
        "SELECT {RES_COLS} FROM reservations{} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, Reservation>(&data_sql);
    for arg in &args {
        data_q = data_q.bind(arg);
    }
    let reservations = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::Database)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": reservations,
        "page": page,
        "per_page": per_page,
        "total": total,
    })))
}

/* =========================
Update
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/reservations/{reservation_id}",
    params(("reservation_id" = u64, Path, description = "Reservation ID")),
    request_body(content = Object, description = "Any subset of reservation, financial, and variant fields", content_type = "application/json", example = json!({
        "status": "Issued",
        "details": { "cost": 650.0 },
        "destination": "JED"
    })),
    responses(
        (status = 200, description = "Reservation updated", body = Object),
        (status = 404, description = "Reservation not found"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reservations"
)]
pub async fn update_reservation(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateReservation>,
) -> actix_web::Result<impl Responder> {
    let reservation_id = path.into_inner();
    let body = body.into_inner();
    body.validate().map_err(ApiError::Validation)?;

    let reservation = fetch_reservation(pool.get_ref(), reservation_id)
        .await?
        .ok_or(ApiError::NotFound("Reservation"))?;

    let booking_type: BookingType = reservation
        .booking_type
        .parse()
        .map_err(|_| ApiError::Internal(format!(
            "reservation {} has unparseable booking type '{}'",
            reservation.id, reservation.booking_type
        )))?;

    // Variant fields arrive flattened; the tag defaults to the stored one.
    let booking_patch = if body.booking_fields.is_empty() {
        None
    } else {
        let mut fields = body.booking_fields.clone();
        match fields.get("type") {
            Some(Value::String(tag)) if *tag == reservation.booking_type => {}
            Some(_) => {
                return Err(field_error(
                    "type",
                    "does not match the reservation's booking type",
                )
                .into());
            }
            None => {
                fields.insert("type".into(), Value::String(reservation.booking_type.clone()));
            }
        }
        let patch: BookingPatch = serde_json::from_value(Value::Object(fields))
            .map_err(|e| field_error("type", e.to_string()))?;
        Some(patch)
    };

    let status = match body.status.as_deref() {
        Some(s) => s
            .parse::<ReservationStatus>()
            .map_err(|_| field_error("status", "unknown reservation status"))?
            .to_string(),
        None => reservation.status.clone(),
    };

    let financials = match &body.details {
        Some(d) => reservation
            .financials()
            .merged(d.sell_price, d.cost, d.fees, d.net_profit),
        None => reservation.financials(),
    };
    let notes = body.notes.clone().or_else(|| reservation.notes.clone());

    let mut tx = pool.begin().await.map_err(ApiError::Database)?;

    if body.name.is_some() || body.phone_number.is_some() {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone FROM customers WHERE id = ?",
        )
        .bind(reservation.customer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("Customer"))?;

        sqlx::query("UPDATE customers SET name = ?, phone = ? WHERE id = ?")
            .bind(body.name.as_deref().unwrap_or(&customer.name))
            .bind(body.phone_number.as_deref().unwrap_or(&customer.phone))
            .bind(customer.id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::Database)?;
    }

    let mut supplier_id = reservation.supplier_id;
    if body.supplier_name.is_some() || body.supplier_phone.is_some() {
        match supplier_id {
            Some(id) => {
                let supplier = sqlx::query_as::<_, Supplier>(
                    "SELECT id, name, phone FROM suppliers WHERE id = ?",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(ApiError::Database)?
                .ok_or(ApiError::NotFound("Supplier"))?;

                sqlx::query("UPDATE suppliers SET name = ?, phone = ? WHERE id = ?")
                    .bind(body.supplier_name.as_deref().unwrap_or(&supplier.name))
                    .bind(body.supplier_phone.as_deref().or(supplier.phone.as_deref()))
                    .bind(supplier.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(ApiError::Database)?;
            }
            None => {
                // A bearing reservation without a supplier gains one once
                // a name arrives; supplier fields are ignored otherwise.
                if booking_type.requires_supplier() {
                    if let Some(name) = body
                        .supplier_name
                        .as_deref()
                        .filter(|s| !s.trim().is_empty())
                    {
                        let id = sqlx::query("INSERT INTO suppliers (name, phone) VALUES (?, ?)")
                            .bind(name)
                            .bind(body.supplier_phone.as_deref())
                            .execute(&mut *tx)
                            .await
                            .map_err(ApiError::Database)?
                            .last_insert_id();
                        supplier_id = Some(id);
                    }
                }
            }
        }
    }

    if let Some(patch) = &booking_patch {
        apply_booking_patch(&mut tx, booking_type, reservation.booking_id, patch).await?;
    }

    sqlx::query(
        r#"
        UPDATE reservations
        SET supplier_id = ?, status = ?, sell_price = ?, cost = ?, fees = ?, net_profit = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(supplier_id)
    .bind(&status)
    .bind(financials.sell_price)
    .bind(financials.cost)
    .bind(financials.fees)
    .bind(financials.net_profit)
    .bind(notes)
    .bind(reservation_id)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::Database)?;

    tx.commit().await.map_err(ApiError::Database)?;

    info!(reservation_id, "reservation updated");

    let reservation = fetch_reservation(pool.get_ref(), reservation_id)
        .await?
        .ok_or(ApiError::NotFound("Reservation"))?;
    let body = assemble_reservation(pool.get_ref(), reservation).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": body })))
}

/* =========================
Delete (cascades to booking + customer)
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{reservation_id}",
    params(("reservation_id" = u64, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation, its booking record, and its customer deleted", body = Object, example = json!({
            "success": true,
            "message": "Reservation deleted"
        })),
        (status = 404, description = "Reservation not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reservations"
)]
pub async fn delete_reservation(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let reservation_id = path.into_inner();

    let reservation = fetch_reservation(pool.get_ref(), reservation_id)
        .await?
        .ok_or(ApiError::NotFound("Reservation"))?;

    let booking_type: BookingType = reservation
        .booking_type
        .parse()
        .map_err(|_| ApiError::Internal(format!(
            "reservation {} has unparseable booking type '{}'",
            reservation.id, reservation.booking_type
        )))?;

    let mut tx = pool.begin().await.map_err(ApiError::Database)?;

    let booking_sql = format!(
        "UPDATE {} SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?",
        booking_type.table()
    );
    sqlx::query(&booking_sql)
        .bind(reservation.booking_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

    sqlx::query("UPDATE customers SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(reservation.customer_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

    sqlx::query("UPDATE reservations SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(reservation_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

    tx.commit().await.map_err(ApiError::Database)?;

    info!(reservation_id, "reservation deleted with booking and customer");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Reservation deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight_body() -> Value {
        json!({
            "name": "Jane Doe",
            "phoneNumber": "+201001234567",
            "type": "Flight",
            "airline": "EgyptAir",
            "departure": "CAI",
            "destination": "DXB",
            "departure_date": "2026-05-01",
            "passengers": 2,
            "status": "Confirmed",
            "supplierName": "Sky Wholesale",
            "details": { "sell_price": 1000.0, "cost": 700.0 }
        })
    }

    #[test]
    fn tagged_payload_parses_from_flat_body() {
        let payload: CreateReservation = serde_json::from_value(flight_body()).unwrap();
        assert_eq!(payload.booking.booking_type(), BookingType::Flight);
        assert!(payload.validate().is_ok());
        assert!(payload.booking.validate().is_ok());
    }

    #[test]
    fn flight_status_is_normalized_to_pending() {
        // The request asked for Confirmed; flights always start Pending.
        let payload: CreateReservation = serde_json::from_value(flight_body()).unwrap();
        assert_eq!(payload.booking.initial_status().unwrap(), "Pending");
    }

    #[test]
    fn ticket_status_is_normalized_to_pending() {
        let booking: BookingPayload = serde_json::from_value(json!({
            "type": "Ticket",
            "event_name": "Opera Aida",
            "event_date": "2026-06-15",
            "quantity": 4,
            "status": "Issued"
        }))
        .unwrap();
        assert_eq!(booking.initial_status().unwrap(), "Pending");
    }

    #[test]
    fn hotel_keeps_a_known_requested_status() {
        let booking: BookingPayload = serde_json::from_value(json!({
            "type": "Hotel",
            "hotel_name": "Marriott",
            "check_in": "2026-05-01",
            "check_out": "2026-05-04",
            "rooms": 1,
            "guests": 2,
            "status": "Confirmed"
        }))
        .unwrap();
        assert_eq!(booking.initial_status().unwrap(), "Confirmed");
    }

    #[test]
    fn unknown_variant_status_is_a_field_error() {
        let booking: BookingPayload = serde_json::from_value(json!({
            "type": "Hotel",
            "hotel_name": "Marriott",
            "check_in": "2026-05-01",
            "check_out": "2026-05-04",
            "rooms": 1,
            "guests": 2,
            "status": "Teleported"
        }))
        .unwrap();
        match booking.initial_status() {
            Err(ApiError::Validation(errs)) => {
                assert!(errs.field_errors().contains_key("status"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn visa_defaults_to_submitted() {
        let booking: BookingPayload = serde_json::from_value(json!({
            "type": "Visa",
            "country": "Japan",
            "application_date": "2026-04-01"
        }))
        .unwrap();
        assert_eq!(booking.initial_status().unwrap(), "Submitted");
        assert!(!booking.booking_type().requires_supplier());
    }

    #[test]
    fn zero_passengers_fails_with_named_field() {
        let booking: BookingPayload = serde_json::from_value(json!({
            "type": "Flight",
            "airline": "EgyptAir",
            "departure": "CAI",
            "destination": "DXB",
            "departure_date": "2026-05-01",
            "passengers": 0
        }))
        .unwrap();
        let errs = booking.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("passengers"));
    }

    #[test]
    fn hotel_checkout_must_follow_checkin() {
        let booking: BookingPayload = serde_json::from_value(json!({
            "type": "Hotel",
            "hotel_name": "Marriott",
            "check_in": "2026-05-04",
            "check_out": "2026-05-01",
            "rooms": 1,
            "guests": 2
        }))
        .unwrap();
        let errs = booking.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("check_out"));
    }

    #[test]
    fn phone_number_is_validated() {
        let mut body = flight_body();
        body["phoneNumber"] = json!("not-a-phone");
        let payload: CreateReservation = serde_json::from_value(body).unwrap();
        let errs = payload.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("phone_number"));
    }

    #[test]
    fn fees_default_to_zero_in_net_profit() {
        let payload: CreateReservation = serde_json::from_value(flight_body()).unwrap();
        let d = &payload.details;
        let fin = Financials::new(d.sell_price, d.cost, d.fees.unwrap_or(0.0), d.net_profit);
        assert_eq!(fin.fees, 0.0);
        assert_eq!(fin.net_profit, 300.0);
    }

    #[test]
    fn flight_patch_merges_only_present_fields() {
        let current = Flight {
            id: 3,
            airline: "EgyptAir".into(),
            flight_number: Some("MS910".into()),
            departure: "CAI".into(),
            destination: "DXB".into(),
            departure_date: "2026-05-01".parse().unwrap(),
            return_date: None,
            passengers: 2,
            status: "Pending".into(),
        };
        let patch = FlightPatch {
            destination: Some("JED".into()),
            status: Some("Confirmed".into()),
            ..Default::default()
        };
        let merged = merged_flight(current, &patch).unwrap();
        assert_eq!(merged.destination, "JED");
        assert_eq!(merged.status, "Confirmed");
        assert_eq!(merged.airline, "EgyptAir");
        assert_eq!(merged.passengers, 2);
        assert_eq!(merged.flight_number.as_deref(), Some("MS910"));
    }

    #[test]
    fn patch_rejects_status_outside_the_variant_set() {
        let current = Ticket {
            id: 5,
            event_name: "Opera Aida".into(),
            event_date: "2026-06-15".parse().unwrap(),
            quantity: 4,
            status: "Pending".into(),
        };
        let patch = TicketPatch {
            status: Some("Approved".into()), // a visa status, not a ticket one
            ..Default::default()
        };
        assert!(merged_ticket(current, &patch).is_err());
    }

    #[test]
    fn update_body_splits_shared_and_variant_fields() {
        let body: UpdateReservation = serde_json::from_value(json!({
            "status": "Issued",
            "details": { "cost": 650.0 },
            "destination": "JED"
        }))
        .unwrap();
        assert_eq!(body.status.as_deref(), Some("Issued"));
        assert!(body.booking_fields.contains_key("destination"));
        assert!(!body.booking_fields.contains_key("status"));

        // Injecting the stored tag turns the leftover fields into a patch.
        let mut fields = body.booking_fields.clone();
        fields.insert("type".into(), json!("Flight"));
        let patch: BookingPatch = serde_json::from_value(Value::Object(fields)).unwrap();
        match patch {
            BookingPatch::Flight(p) => assert_eq!(p.destination.as_deref(), Some("JED")),
            _ => panic!("expected flight patch"),
        }
    }
}
