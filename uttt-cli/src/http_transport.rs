//! HTTP client for the online rooms server

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use uttt_core::Player;
use uttt_sync::{
    CreateRoomResponse, ErrorBody, MoveAccepted, RoomId, RoomSnapshot, SubmitMoveRequest,
    SubmitOutcome, Transport, TransportError,
};

/// `Transport` over the server's JSON API
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Client for `base_url`; every request is abandoned after `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a room; the caller plays X
    pub async fn create_room(&self, password: Option<&str>) -> Result<RoomId> {
        let response = self
            .client
            .post(self.url("/api/room/create"))
            .json(&json!({ "password": password }))
            .send()
            .await
            .context("Failed to reach server")?;
        let response = ensure_success(response).await?;
        let body: CreateRoomResponse = response.json().await.context("Malformed create response")?;
        Ok(body.room_id)
    }

    /// Take the O seat of an existing room
    pub async fn join_room(&self, room_id: &str, password: Option<&str>) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/room/join"))
            .json(&json!({ "roomId": room_id, "password": password }))
            .send()
            .await
            .context("Failed to reach server")?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn leave_room(&self, room_id: &str, player: Player) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/room/leave"))
            .json(&json!({ "roomId": room_id, "player": player }))
            .send()
            .await
            .context("Failed to reach server")?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn request_rematch(&self, room_id: &str, player: Player) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/api/game/{}/rematch", room_id)))
            .json(&json!({ "player": player }))
            .send()
            .await
            .context("Failed to reach server")?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Timeouts and connection failures are network errors; anything else
/// while reading a reply is a decode error
fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        TransportError::Network(err.to_string())
    } else {
        TransportError::Decode(err.to_string())
    }
}

/// Turn a non-2xx lobby response into an error carrying the server message
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    anyhow::bail!("Server refused request ({}): {}", status.as_u16(), message)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit_move(
        &self,
        room_id: &str,
        request: &SubmitMoveRequest,
    ) -> Result<SubmitOutcome, TransportError> {
        let response = self
            .client
            .post(self.url(&format!("/api/game/{}/move", room_id)))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(room = room_id, status = status.as_u16(), "move submitted");
        if status.is_success() {
            let accepted: MoveAccepted = response
                .json()
                .await
                .map_err(transport_error)?;
            return Ok(SubmitOutcome::Accepted(accepted));
        }

        // Bodies that are not an ErrorBody (extractor rejections, proxies)
        // stay transport errors; only 5xx among them is resent
        match response.json::<ErrorBody>().await {
            Ok(body) => Ok(SubmitOutcome::Rejected(body.into_rejection(room_id))),
            Err(_) => Err(TransportError::Http {
                status: status.as_u16(),
                message: status.to_string(),
            }),
        }
    }

    async fn fetch(&self, room_id: &str) -> Result<RoomSnapshot, TransportError> {
        let response = self
            .client
            .get(self.url(&format!("/api/game/{}", room_id)))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }
        response
            .json()
            .await
            .map_err(transport_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;
    use uttt_core::Move;

    #[test]
    fn test_base_url_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:8003/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.url("/api/status"), "http://localhost:8003/api/status");
    }

    #[tokio::test]
    async fn test_silent_server_times_out_as_network_error() {
        // Accepts connections and never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let transport = HttpTransport::new(format!("http://{}", addr), Duration::from_millis(200)).unwrap();
        let request = SubmitMoveRequest::new(Move::new(0, 0, Player::X), 0);

        let err = transport.submit_move("ROOM01", &request).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)), "{:?}", err);
        assert!(err.is_retryable());

        let err = transport.fetch("ROOM01").await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)), "{:?}", err);
    }
}
