use crate::auth::auth::AuthUser;
use crate::auth::middleware::user_from_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::notify::hub::{ChannelKey, Hub};
use crate::notify::route;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

#[derive(Deserialize)]
pub struct WsQuery {
    /// Access token; websockets cannot carry the Authorization header.
    pub token: Option<String>,
}

/// Everything one connection owns: its registry id, the exact channels it
/// joined, and the receiving end the hub delivers into. Dropping the
/// connection unregisters precisely these keys, nothing shared, nothing
/// global.
struct ConnContext {
    conn_id: u64,
    keys: Vec<ChannelKey>,
    rx: UnboundedReceiver<String>,
}

impl ConnContext {
    fn subscribe(hub: &Hub, user: &AuthUser) -> Self {
        let mut keys = vec![
            ChannelKey::User(user.user_id),
            ChannelKey::Department(user.department.clone()),
        ];
        if user.role == Role::Admin {
            keys.push(ChannelKey::Admins);
        }

        let (conn_id, rx) = hub.register(&keys);
        ConnContext { conn_id, keys, rx }
    }
}

/// `GET /ws?token=` upgrade endpoint. Subscriptions are fixed at connect
/// time from the verified token; there is no join/leave protocol.
pub async fn connect(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    config: web::Data<Config>,
    hub: web::Data<Hub>,
) -> actix_web::Result<HttpResponse> {
    let token = query
        .token
        .as_deref()
        .ok_or_else(|| AppError::Unauthenticated("Authentication required".into()))?;
    let user = user_from_token(token, &config.jwt_secret)?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    let ctx = ConnContext::subscribe(&hub, &user);
    info!(user_id = user.user_id, conn_id = ctx.conn_id, "Client connected");

    actix_web::rt::spawn(session_loop(session, msg_stream, ctx, user, hub));

    Ok(response)
}

async fn session_loop(
    mut session: Session,
    mut msg_stream: MessageStream,
    mut ctx: ConnContext,
    user: AuthUser,
    hub: web::Data<Hub>,
) {
    let close_reason = loop {
        tokio::select! {
            frame = ctx.rx.recv() => {
                match frame {
                    Some(text) => {
                        if session.text(text).await.is_err() {
                            break None;
                        }
                    }
                    None => break None,
                }
            }

            msg = msg_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&text, &user, &hub);
                    }
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break None;
                        }
                    }
                    Some(Ok(Message::Close(reason))) => break reason,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(conn_id = ctx.conn_id, error = %e, "WebSocket protocol error");
                        break None;
                    }
                    None => break None,
                }
            }
        }
    };

    hub.unregister(ctx.conn_id, &ctx.keys);
    let _ = session.close(close_reason).await;
    info!(user_id = user.user_id, conn_id = ctx.conn_id, "Client disconnected");
}

#[derive(Deserialize)]
struct InboundFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

fn handle_client_frame(text: &str, user: &AuthUser, hub: &Hub) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => {
            debug!(user_id = user.user_id, "Ignoring malformed client frame");
            return;
        }
    };

    for emit in route::client_frame(&frame.event, &frame.data, user.role) {
        hub.publish(&emit);
    }
}
