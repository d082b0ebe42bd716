use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use common::rpc::RpcError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// JSON procedure input. An empty body reads as `null`, so procedures with
/// optional input take `RpcInput<Option<T>>`.
#[derive(Debug)]
pub struct RpcInput<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for RpcInput<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = RpcError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| RpcError::bad_request(rejection.body_text()))?;

        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &body
        };

        serde_json::from_slice(body)
            .map(RpcInput)
            .map_err(|e| RpcError::bad_request(format!("Invalid input: {}", e)))
    }
}

/// Input naming a single record
#[derive(Debug, Clone, Deserialize)]
pub struct IdInput {
    pub id: String,
}
