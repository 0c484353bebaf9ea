use crate::api::attendance::{CalendarQuery, DayStatus};
use crate::api::breaks::StartBreak;
use crate::api::leave_request::{ApprovedLeaveQuery, CreateLeave, LeaveFilter, ReviewLeave};
use crate::api::reservation::ReservationFilter;
use crate::api::shift::{CreateShift, EndShift, ShiftQuery, ShiftResponse, StartShift, UpdateShift};
use crate::model::booking::{
    Appointment, BookingType, Cruise, Flight, Hotel, Insurance, Ticket, Transportation, Visa,
};
use crate::model::customer::Customer;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::reservation::{Reservation, ReservationStatus};
use crate::model::shift::{Shift, ShiftBreak, ShiftState};
use crate::model::supplier::Supplier;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workdesk API",
        version = "1.0.0",
        description = r#"
## Workforce & Travel-Desk Backend

Shift and attendance tracking plus travel-agency reservations.

### Key Features
- **Shifts & Breaks**
  - Start/end shifts, take breaks, net work time net of breaks
- **Attendance Calendar**
  - Per-day present / excused / unexcused classification with period metrics
- **Leave Management**
  - Apply for leave, approve/reject, feed approved leaves into the calendar
- **Reservations**
  - One reservation wrapping exactly one booking variant (flight, hotel,
    cruise, visa, insurance, ticket, transportation, appointment), with
    customer, optional supplier, and derived net profit

### Response Format
- JSON envelopes: `success`/`data` for reads, `message` objects for mutations
- Validation failures return 422 with a field-keyed error map

Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::shift::start_shift,
        crate::api::shift::end_shift,
        crate::api::shift::create_shift,
        crate::api::shift::list_shifts,
        crate::api::shift::get_shift,
        crate::api::shift::update_shift,
        crate::api::shift::delete_shift,
        crate::api::shift::auto_end,

        crate::api::breaks::start_break,
        crate::api::breaks::end_break,

        crate::api::attendance::calendar,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::approved_leaves,

        crate::api::reservation::create_reservation,
        crate::api::reservation::get_reservation,
        crate::api::reservation::list_reservations,
        crate::api::reservation::update_reservation,
        crate::api::reservation::delete_reservation
    ),
    components(
        schemas(
            Shift,
            ShiftBreak,
            ShiftState,
            ShiftResponse,
            StartShift,
            EndShift,
            CreateShift,
            UpdateShift,
            ShiftQuery,
            StartBreak,
            CalendarQuery,
            DayStatus,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            CreateLeave,
            ReviewLeave,
            LeaveFilter,
            ApprovedLeaveQuery,
            Customer,
            Supplier,
            Reservation,
            ReservationStatus,
            ReservationFilter,
            BookingType,
            Flight,
            Hotel,
            Cruise,
            Visa,
            Insurance,
            Ticket,
            Transportation,
            Appointment
        )
    ),
    tags(
        (name = "Shifts", description = "Shift lifecycle and records"),
        (name = "Breaks", description = "Break lifecycle within a shift"),
        (name = "Attendance", description = "Calendar aggregation"),
        (name = "Leave", description = "Leave request management"),
        (name = "Reservations", description = "Travel bookings and financials"),
    )
)]
pub struct ApiDoc;
