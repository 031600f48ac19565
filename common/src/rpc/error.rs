use std::fmt::{Display, Formatter};

#[cfg(feature = "rpc-server")]
use actix_web::{HttpResponse, ResponseError};

use serde_json::{json, Error as SerdeError, Value};
use thiserror::Error;

use super::{Id, JSON_RPC_VERSION};

/// Errors returned to JSON-RPC clients
#[derive(Error, Debug)]
pub enum InternalRpcError {
    #[error("Invalid body in request")]
    ParseBodyError,
    #[error("Invalid JSON request")]
    InvalidJSONRequest,
    #[error("Expected json_rpc set to '2.0'")]
    InvalidVersion,
    #[error("batch limit exceeded")]
    BatchLimitExceeded,
    #[error("Method '{}' in request was not found", _0)]
    MethodNotFound(String),
    #[error("Invalid params: {}", _0)]
    InvalidJSONParams(#[from] SerdeError),
    #[error("Unexpected parameters for this method")]
    UnexpectedParams,
    #[error("{}", _0)]
    AdminOnly(&'static str),
    // Ledger denials, code between 1 and 31999
    #[error("{}", message)]
    Ledger { code: i16, message: String },
}

impl InternalRpcError {
    pub fn get_code(&self) -> i16 {
        match self {
            Self::ParseBodyError => -32700,
            Self::InvalidJSONRequest
            | Self::InvalidVersion
            | Self::BatchLimitExceeded
            | Self::AdminOnly(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidJSONParams(_) | Self::UnexpectedParams => -32602,
            Self::Ledger { code, .. } => *code,
        }
    }
}

/// An error bound to the id of the request that caused it
#[derive(Debug)]
pub struct RpcResponseError {
    id: Option<Id>,
    error: InternalRpcError,
}

impl RpcResponseError {
    pub fn new<T: Into<InternalRpcError>>(id: Option<Id>, error: T) -> Self {
        Self {
            id,
            error: error.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "jsonrpc": JSON_RPC_VERSION,
            "id": self.id,
            "error": {
                "code": self.error.get_code(),
                "message": self.error.to_string(),
            }
        })
    }
}

impl Display for RpcResponseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcError[id: {:?}, error: {}]", self.id, self.error)
    }
}

#[cfg(feature = "rpc-server")]
impl ResponseError for RpcResponseError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::Ok().json(self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_object() {
        let err = RpcResponseError::new(
            Some(Id::Number(7)),
            InternalRpcError::Ledger {
                code: 3,
                message: "insufficient funds".to_string(),
            },
        );
        let value = err.to_json();
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["error"]["code"], json!(3));
        assert_eq!(value["error"]["message"], json!("insufficient funds"));

        let err = RpcResponseError::new(None, InternalRpcError::AdminOnly("localhost only"));
        assert_eq!(err.to_json()["id"], Value::Null);
        assert_eq!(err.to_json()["error"]["code"], json!(-32600));
    }
}
