use crate::model::holiday::Holiday;
use crate::model::leave_request::LeaveRequestView;
use crate::model::user::UserView;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// Wire event names. The connected client dispatches on these strings, so
// they are part of the external contract and must not be renamed.
pub const LEAVE_STATUS_UPDATE: &str = "leaveStatusUpdate";
pub const DEPARTMENT_LEAVE_UPDATE: &str = "departmentLeaveUpdate";
pub const MANAGER_NOTIFICATION: &str = "managerNotification";
pub const HOLIDAY_ANNOUNCEMENT: &str = "holidayAnnouncement";
pub const USER_CREATED: &str = "userCreated";
pub const SYSTEM_ALERT: &str = "systemAlert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Leave,
    Holiday,
    User,
    System,
}

/// What actually travels to a socket. Ephemeral: notifications are never
/// stored, so `read` is always emitted as false and flips only client-side.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: String, payload: serde_json::Value) -> Self {
        Notification {
            id: Uuid::new_v4().to_string(),
            kind,
            message,
            timestamp: Utc::now(),
            read: false,
            payload,
        }
    }
}

/// Domain occurrences that fan out to sockets. Producers hand these to
/// [`Hub::dispatch`](crate::notify::hub::Hub::dispatch) after their database
/// write has committed.
#[derive(Debug, Clone)]
pub enum Event {
    LeaveSubmitted {
        request: LeaveRequestView,
        employee_name: String,
    },
    LeaveResolved {
        request: LeaveRequestView,
        employee_name: String,
        /// Managers of the request's department at resolution time.
        manager_ids: Vec<u64>,
    },
    HolidayAnnounced {
        holiday: Holiday,
        /// None broadcasts to every department.
        department: Option<String>,
    },
    UserCreated {
        user: UserView,
    },
    SystemAlert {
        /// Raw target: "admin", a user id, or a department name.
        target: String,
        message: String,
    },
}
