use crate::model::role::Role;
use crate::notify::event::{self, Event, Notification, NotificationKind};
use crate::notify::hub::{Audience, ChannelKey};
use serde_json::{Value, json};

/// One routed delivery: which sockets, which wire event, what body.
#[derive(Debug, Clone)]
pub struct Emit {
    pub audience: Audience,
    pub event: &'static str,
    pub notification: Notification,
}

impl Emit {
    fn to(audience: Audience, event: &'static str, notification: Notification) -> Self {
        Emit {
            audience,
            event,
            notification,
        }
    }
}

fn user(id: u64) -> Audience {
    Audience::Channel(ChannelKey::User(id))
}

fn department(name: String) -> Audience {
    Audience::Channel(ChannelKey::Department(name))
}

/// socket.io rooms were addressed by raw strings; the same namespace maps
/// onto typed channels here. "admin" is reserved, numeric targets are user
/// ids, anything else names a department.
fn parse_target(target: &str) -> ChannelKey {
    if target == "admin" {
        ChannelKey::Admins
    } else if let Ok(id) = target.parse::<u64>() {
        ChannelKey::User(id)
    } else {
        ChannelKey::Department(target.to_string())
    }
}

/// The fan-out table. Pure: no registry access, no IO; the hub resolves
/// audiences to live connections afterwards.
pub fn route(event: Event) -> Vec<Emit> {
    match event {
        Event::LeaveSubmitted {
            request,
            employee_name,
        } => {
            let employee = user(request.employee_id);
            let dept = department(request.department.clone());
            let payload = json!({ "leaveRequest": request });

            vec![
                Emit::to(
                    employee,
                    event::LEAVE_STATUS_UPDATE,
                    Notification::new(
                        NotificationKind::Leave,
                        "Your leave request has been submitted".into(),
                        payload.clone(),
                    ),
                ),
                Emit::to(
                    dept,
                    event::DEPARTMENT_LEAVE_UPDATE,
                    Notification::new(
                        NotificationKind::Leave,
                        format!("New leave request from {employee_name}"),
                        payload,
                    ),
                ),
            ]
        }

        Event::LeaveResolved {
            request,
            employee_name,
            manager_ids,
        } => {
            let status = request.status;
            let employee = user(request.employee_id);
            let dept = department(request.department.clone());
            let payload = json!({ "leaveRequest": request });
            let peer_message = format!("Leave request from {employee_name} has been {status}");

            let mut emits = vec![
                Emit::to(
                    employee,
                    event::LEAVE_STATUS_UPDATE,
                    Notification::new(
                        NotificationKind::Leave,
                        format!("Your leave request has been {status}"),
                        payload.clone(),
                    ),
                ),
                Emit::to(
                    dept,
                    event::DEPARTMENT_LEAVE_UPDATE,
                    Notification::new(
                        NotificationKind::Leave,
                        peer_message.clone(),
                        payload.clone(),
                    ),
                ),
            ];

            // Managers get a personal copy on their own channel as well.
            for manager_id in manager_ids {
                emits.push(Emit::to(
                    user(manager_id),
                    event::MANAGER_NOTIFICATION,
                    Notification::new(
                        NotificationKind::Leave,
                        peer_message.clone(),
                        payload.clone(),
                    ),
                ));
            }

            emits
        }

        Event::HolidayAnnounced {
            holiday,
            department: target,
        } => {
            let audience = match target {
                Some(name) => department(name),
                None => Audience::AllDepartments,
            };
            let message = format!("New holiday announced: {}", holiday.name);

            vec![Emit::to(
                audience,
                event::HOLIDAY_ANNOUNCEMENT,
                Notification::new(
                    NotificationKind::Holiday,
                    message,
                    json!({ "holiday": holiday }),
                ),
            )]
        }

        Event::UserCreated { user } => vec![Emit::to(
            Audience::Channel(ChannelKey::Admins),
            event::USER_CREATED,
            Notification::new(
                NotificationKind::User,
                format!("New user registered: {}", user.name),
                json!({ "user": user }),
            ),
        )],

        Event::SystemAlert { target, message } => vec![Emit::to(
            Audience::Channel(parse_target(&target)),
            event::SYSTEM_ALERT,
            Notification::new(
                NotificationKind::System,
                message.clone(),
                json!({ "alert": { "target": target, "message": message } }),
            ),
        )],
    }
}

/// Inbound frame table. Exactly one client-originated event survives:
/// admin-sent system alerts. Everything else coming up the socket is
/// ignored; channel membership is fixed at connect time, so the old
/// join-room frames have no effect.
pub fn client_frame(name: &str, data: &Value, role: Role) -> Vec<Emit> {
    match name {
        event::SYSTEM_ALERT if role == Role::Admin => {
            let target = data.get("target").and_then(Value::as_str);
            let message = data.get("message").and_then(Value::as_str);

            match (target, message) {
                (Some(target), Some(message)) => route(Event::SystemAlert {
                    target: target.to_string(),
                    message: message.to_string(),
                }),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::{Holiday, HolidayType};
    use crate::model::leave_request::{LeaveRequestView, LeaveStatus, LeaveType};
    use crate::model::user::{LeaveBalance, UserView};
    use chrono::NaiveDate;

    fn request_view(status: LeaveStatus) -> LeaveRequestView {
        LeaveRequestView {
            id: 31,
            employee_id: 7,
            leave_type: LeaveType::Annual,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            reason: "Family event".into(),
            status,
            total_days: 3,
            department: "Engineering".into(),
            manager_id: Some(2),
            manager_note: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn holiday() -> Holiday {
        Holiday {
            id: 5,
            name: "Founders Day".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            kind: HolidayType::Company,
            description: None,
            is_recurring: false,
            created_by: 1,
            created_at: None,
        }
    }

    #[test]
    fn submission_notifies_employee_and_department() {
        let emits = route(Event::LeaveSubmitted {
            request: request_view(LeaveStatus::Pending),
            employee_name: "Jane Doe".into(),
        });

        assert_eq!(emits.len(), 2);

        assert_eq!(emits[0].audience, Audience::Channel(ChannelKey::User(7)));
        assert_eq!(emits[0].event, "leaveStatusUpdate");
        assert_eq!(
            emits[0].notification.message,
            "Your leave request has been submitted"
        );

        assert_eq!(
            emits[1].audience,
            Audience::Channel(ChannelKey::Department("Engineering".into()))
        );
        assert_eq!(emits[1].event, "departmentLeaveUpdate");
        assert_eq!(
            emits[1].notification.message,
            "New leave request from Jane Doe"
        );
    }

    #[test]
    fn resolution_adds_a_copy_per_department_manager() {
        let emits = route(Event::LeaveResolved {
            request: request_view(LeaveStatus::Approved),
            employee_name: "Jane Doe".into(),
            manager_ids: vec![2, 9],
        });

        assert_eq!(emits.len(), 4);
        assert_eq!(
            emits[0].notification.message,
            "Your leave request has been approved"
        );

        let manager_emits: Vec<_> = emits
            .iter()
            .filter(|e| e.event == "managerNotification")
            .collect();
        assert_eq!(manager_emits.len(), 2);
        assert_eq!(
            manager_emits[0].audience,
            Audience::Channel(ChannelKey::User(2))
        );
        assert_eq!(
            manager_emits[1].audience,
            Audience::Channel(ChannelKey::User(9))
        );
        assert_eq!(
            manager_emits[0].notification.message,
            "Leave request from Jane Doe has been approved"
        );
    }

    #[test]
    fn rejection_wording_follows_the_status() {
        let emits = route(Event::LeaveResolved {
            request: request_view(LeaveStatus::Rejected),
            employee_name: "Jane Doe".into(),
            manager_ids: vec![],
        });

        assert_eq!(
            emits[0].notification.message,
            "Your leave request has been rejected"
        );
    }

    #[test]
    fn targeted_holiday_goes_to_one_department() {
        let emits = route(Event::HolidayAnnounced {
            holiday: holiday(),
            department: Some("Sales".into()),
        });

        assert_eq!(emits.len(), 1);
        assert_eq!(emits[0].event, "holidayAnnouncement");
        assert_eq!(
            emits[0].audience,
            Audience::Channel(ChannelKey::Department("Sales".into()))
        );
        assert_eq!(
            emits[0].notification.message,
            "New holiday announced: Founders Day"
        );
    }

    #[test]
    fn org_wide_holiday_targets_every_department() {
        let emits = route(Event::HolidayAnnounced {
            holiday: holiday(),
            department: None,
        });

        assert_eq!(emits[0].audience, Audience::AllDepartments);
    }

    #[test]
    fn user_creation_goes_to_admins() {
        let emits = route(Event::UserCreated {
            user: UserView {
                id: 12,
                name: "New Hire".into(),
                email: "hire@company.com".into(),
                role: Role::Employee,
                department: "Sales".into(),
                position: None,
                joining_date: None,
                leave_balance: LeaveBalance {
                    annual: 20,
                    sick: 10,
                    casual: 10,
                },
                created_at: None,
            },
        });

        assert_eq!(emits.len(), 1);
        assert_eq!(emits[0].audience, Audience::Channel(ChannelKey::Admins));
        assert_eq!(emits[0].event, "userCreated");
        assert_eq!(emits[0].notification.message, "New user registered: New Hire");
    }

    #[test]
    fn alert_targets_parse_the_room_namespace() {
        assert_eq!(parse_target("admin"), ChannelKey::Admins);
        assert_eq!(parse_target("17"), ChannelKey::User(17));
        assert_eq!(
            parse_target("Engineering"),
            ChannelKey::Department("Engineering".into())
        );
    }

    #[test]
    fn notifications_are_born_unread_with_typed_kind() {
        let emits = route(Event::SystemAlert {
            target: "admin".into(),
            message: "Maintenance at 22:00".into(),
        });

        let value = serde_json::to_value(&emits[0].notification).unwrap();
        assert_eq!(value["type"], "system");
        assert_eq!(value["read"], false);
        assert_eq!(value["message"], "Maintenance at 22:00");
        assert!(value["id"].as_str().is_some());
        assert_eq!(value["payload"]["alert"]["target"], "admin");
    }

    #[test]
    fn only_admins_can_push_system_alerts() {
        let data = serde_json::json!({ "target": "Sales", "message": "Heads up" });

        assert!(client_frame("systemAlert", &data, Role::Employee).is_empty());
        assert!(client_frame("systemAlert", &data, Role::Manager).is_empty());

        let emits = client_frame("systemAlert", &data, Role::Admin);
        assert_eq!(emits.len(), 1);
        assert_eq!(emits[0].event, "systemAlert");
        assert_eq!(
            emits[0].audience,
            Audience::Channel(ChannelKey::Department("Sales".into()))
        );
    }

    #[test]
    fn unknown_or_malformed_client_frames_are_dropped() {
        assert!(client_frame("joinDepartment", &serde_json::json!("Sales"), Role::Admin).is_empty());
        assert!(client_frame("systemAlert", &serde_json::json!({ "target": 5 }), Role::Admin).is_empty());
    }
}
