use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::messaging::PublishedMessage;
use crate::types::{AgentSnapshot, InboundCommand};

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub topic: Option<String>,
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub accepted: bool,
    pub command: String,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn get_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "config": &*state.config,
        "topics": state.control.topics(),
    }))
}

pub async fn get_status(State(state): State<AppState>) -> Json<AgentSnapshot> {
    Json(state.control.snapshot().await)
}

pub async fn post_command(
    State(state): State<AppState>,
    Json(command): Json<InboundCommand>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let name = command.name().to_string();
    state.control.apply_command(command).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CommandResponse {
            accepted: true,
            command: name,
        }),
    ))
}

/// History of one topic, or the latest message of every topic when no topic
/// is given.
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<PublishedMessage>>, ApiError> {
    let messages = match query.topic {
        Some(topic) => state.bus.history(&topic)?,
        None => {
            let mut latest = Vec::new();
            for topic in state.bus.topics()? {
                if let Some(message) = state.bus.latest(&topic)? {
                    latest.push(message);
                }
            }
            latest
        }
    };
    Ok(Json(messages))
}

pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.bus.subscribe()).filter_map(|item| {
        // Lagged receivers just skip what they missed.
        let published = item.ok()?;
        Event::default()
            .event(published.message.kind())
            .json_data(&published)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
