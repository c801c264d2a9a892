//! Backend coaching API: the trait the controller talks to and its reqwest
//! implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DurationChoice, RoutineId, SessionId},
    error::ApiError,
    protocol::{
        CancelCoachingRequest, CoachingStepPayload, MalformedResponse, NextCoachingRequest,
        RecommendRequest, RoutineCandidate, StartCoachingRequest, StepOutcome,
    },
};
use tracing::debug;

use crate::{config::Settings, error::CoachError};

const RECOMMEND_PATH: &str = "/api/v1/routines/recommend";
const START_PATH: &str = "/api/v1/coaching/start";
const NEXT_PATH: &str = "/api/v1/coaching/next";
const CANCEL_PATH: &str = "/api/v1/coaching/cancel";

#[async_trait]
pub trait CoachingApi: Send + Sync {
    async fn recommend(&self, duration: DurationChoice)
        -> Result<Vec<RoutineCandidate>, CoachError>;
    async fn start(&self, routine_id: RoutineId) -> Result<StepOutcome, CoachError>;
    async fn next(&self, session_id: &SessionId) -> Result<StepOutcome, CoachError>;
    async fn cancel(&self, request: &CancelCoachingRequest) -> Result<(), CoachError>;
}

pub struct HttpCoachingApi {
    http: Client,
    server_url: String,
    auth_token: Option<String>,
}

impl HttpCoachingApi {
    pub fn new(server_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self::with_client(Client::new(), server_url, auth_token)
    }

    pub fn with_client(
        http: Client,
        server_url: impl Into<String>,
        auth_token: Option<String>,
    ) -> Self {
        let server_url = server_url.into().trim().trim_end_matches('/').to_string();
        Self {
            http,
            server_url,
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, CoachError> {
        let base = settings.api_base()?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(
            builder.build()?,
            base.as_str(),
            settings.auth_token.clone(),
        ))
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.http.post(format!("{}{path}", self.server_url));
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, path: &'static str, request: RequestBuilder) -> Result<Vec<u8>, CoachError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(path, status = status.as_u16(), bytes = body.len(), "coaching api response");
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(CoachError::Status {
                status: status.as_u16(),
                error: ApiError::from_response(status.as_u16(), &text),
            });
        }
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        path: &'static str,
        request: RequestBuilder,
    ) -> Result<T, CoachError> {
        let body = self.send(path, request).await?;
        serde_json::from_slice(&body)
            .map_err(|e| CoachError::Malformed(MalformedResponse::new(format!("{path}: {e}"))))
    }
}

#[async_trait]
impl CoachingApi for HttpCoachingApi {
    async fn recommend(
        &self,
        duration: DurationChoice,
    ) -> Result<Vec<RoutineCandidate>, CoachError> {
        let request = self.post(RECOMMEND_PATH).json(&RecommendRequest {
            total_time_min: duration,
        });
        self.send_json(RECOMMEND_PATH, request).await
    }

    async fn start(&self, routine_id: RoutineId) -> Result<StepOutcome, CoachError> {
        let request = self.post(START_PATH).json(&StartCoachingRequest {
            ai_routine_id: routine_id,
        });
        let payload: CoachingStepPayload = self.send_json(START_PATH, request).await?;
        Ok(StepOutcome::try_from(payload)?)
    }

    async fn next(&self, session_id: &SessionId) -> Result<StepOutcome, CoachError> {
        let request = self.post(NEXT_PATH).json(&NextCoachingRequest {
            coaching_session_id: session_id.clone(),
        });
        let payload: CoachingStepPayload = self.send_json(NEXT_PATH, request).await?;
        Ok(StepOutcome::try_from(payload)?)
    }

    async fn cancel(&self, request: &CancelCoachingRequest) -> Result<(), CoachError> {
        let builder = self.post(CANCEL_PATH).json(request);
        self.send(CANCEL_PATH, builder).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
