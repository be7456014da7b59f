use api_types::ErrorBody;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
    response::IntoResponse,
};
use engine::EngineError;
use serde::de::DeserializeOwned;

pub use server::{router, run, run_with_listener, spawn_with_listener};

mod categorized;
mod flows;
mod rooms;
mod server;
mod summary;
mod views;

pub mod types {
    pub mod room {
        pub use api_types::room::{
            DailyAmount, OverviewQuery, RoomBalanceView, RoomListItem, RoomListResponse, RoomNew,
            RoomOverviewView, RoomStatus, RoomView,
        };
    }

    pub mod member {
        pub use api_types::member::{MemberView, RegisterMember};
    }

    pub mod flow {
        pub use api_types::flow::{FlowCreated, FlowDeleted, FlowEdit, FlowEdited, FlowNew, FlowView};
    }

    pub mod categorized {
        pub use api_types::categorized::{
            Category, CategorizedCreated, CategorizedDeleted, CategorizedEdit, CategorizedEdited,
            CategorizedList, CategorizedListResponse, CategorizedNew, CategorizedView, EntryKind,
        };
    }

    pub mod summary {
        pub use api_types::summary::{SummaryQuery, SummaryResponse, TotalsView};
    }

    pub mod activity {
        pub use api_types::activity::{ActivityResponse, ActivityView};
    }

    pub use api_types::ErrorBody;
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_) | EngineError::InsufficientFunds(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn kind_for_engine_error(err: &EngineError) -> &'static str {
    match err {
        EngineError::Validation(_) => "validation",
        EngineError::NotFound(_) => "not_found",
        EngineError::InsufficientFunds(_) => "insufficient_funds",
        EngineError::Conflict(_) => "conflict",
        EngineError::Timeout(_) => "timeout",
        EngineError::Database(_) => "internal",
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => {
            tracing::debug!("request rejected: {other}");
            other.to_string()
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let kind = kind_for_engine_error(&err).to_string();
                let retryable = err.is_retryable();
                let message = message_for_engine_error(err);
                (
                    status,
                    ErrorBody {
                        kind,
                        message,
                        retryable,
                    },
                )
            }
            ServerError::Generic(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    kind: "bad_request".to_string(),
                    message,
                    retryable: false,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// JSON body extractor whose rejections (bad syntax, wrong shape, missing
/// content type) all answer `400` with an [`ErrorBody`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ServerError::Generic(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path extractor answering `400` with an [`ErrorBody`] when a segment
/// does not parse.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| ServerError::Generic(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query-string extractor answering `400` with an [`ErrorBody`] on a missing
/// or malformed parameter.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| ServerError::Generic(rejection.body_text()))?;
        Ok(Self(value))
    }
}
