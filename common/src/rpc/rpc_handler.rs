use std::{collections::HashMap, future::Future, pin::Pin};

use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{Id, InternalRpcError, RpcRequest, RpcResponseError, JSON_RPC_VERSION};
use crate::context::Context;

pub type Handler = for<'a> fn(
    &'a Context,
    Value,
) -> Pin<Box<dyn Future<Output = Result<Value, InternalRpcError>> + Send + 'a>>;

// Maximum requests accepted in a single batch
pub const DEFAULT_BATCH_LIMIT: usize = 20;

pub struct RPCHandler<T: Send + Clone + 'static> {
    // all RPC methods registered
    methods: HashMap<String, Handler>,
    data: T,
    batch_limit: usize,
}

impl<T> RPCHandler<T>
where
    T: Send + Sync + Clone + 'static,
{
    pub fn new(data: T) -> Self {
        Self {
            methods: HashMap::new(),
            data,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    pub async fn handle_request(&self, body: &[u8]) -> Result<Value, RpcResponseError> {
        let mut context = Context::new();
        context.store(self.data.clone());
        self.handle_request_with_context(context, body).await
    }

    pub async fn handle_request_with_context(
        &self,
        context: Context,
        body: &[u8],
    ) -> Result<Value, RpcResponseError> {
        let request: Value = serde_json::from_slice(body)
            .map_err(|_| RpcResponseError::new(None, InternalRpcError::ParseBodyError))?;

        match request {
            Value::Array(requests) => {
                if requests.len() > self.batch_limit {
                    return Err(RpcResponseError::new(
                        None,
                        InternalRpcError::BatchLimitExceeded,
                    ));
                }

                let mut responses = Vec::with_capacity(requests.len());
                for value in requests {
                    let response = match self.parse_request(value) {
                        Ok(request) => match self.execute_method(&context, request).await {
                            Ok(Some(response)) => response,
                            // notification, nothing to answer
                            Ok(None) => continue,
                            Err(e) => e.to_json(),
                        },
                        Err(e) => e.to_json(),
                    };
                    responses.push(response);
                }
                Ok(Value::Array(responses))
            }
            Value::Object(_) => {
                let request = self.parse_request(request)?;
                Ok(self
                    .execute_method(&context, request)
                    .await?
                    .unwrap_or(Value::Null))
            }
            _ => Err(RpcResponseError::new(
                None,
                InternalRpcError::InvalidJSONRequest,
            )),
        }
    }

    pub fn parse_request(&self, body: Value) -> Result<RpcRequest, RpcResponseError> {
        let request: RpcRequest = serde_json::from_value(body)
            .map_err(|_| RpcResponseError::new(None, InternalRpcError::InvalidJSONRequest))?;
        if request.jsonrpc != JSON_RPC_VERSION {
            return Err(RpcResponseError::new(
                request.id,
                InternalRpcError::InvalidVersion,
            ));
        }
        Ok(request)
    }

    pub async fn execute_method(
        &self,
        context: &Context,
        mut request: RpcRequest,
    ) -> Result<Option<Value>, RpcResponseError> {
        let handler = match self.methods.get(&request.method) {
            Some(handler) => handler,
            None => {
                if log::log_enabled!(log::Level::Debug) {
                    debug!("Requested method '{}' not found", request.method);
                }
                return Err(RpcResponseError::new(
                    request.id,
                    InternalRpcError::MethodNotFound(request.method),
                ));
            }
        };

        if log::log_enabled!(log::Level::Trace) {
            trace!("executing '{}' RPC method", request.method);
        }
        let params = request.params.take().unwrap_or(Value::Null);
        let result = handler(context, params)
            .await
            .map_err(|err| RpcResponseError::new(request.id.clone(), err))?;

        Ok(request.id.map(|id: Id| {
            json!({
                "jsonrpc": JSON_RPC_VERSION,
                "id": id,
                "result": result
            })
        }))
    }

    // register a new RPC method handler
    pub fn register_method(&mut self, name: &str, handler: Handler) {
        if self.methods.insert(name.into(), handler).is_some() && log::log_enabled!(log::Level::Debug) {
            debug!("RPC method '{}' was already registered, replaced", name);
        }
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn get_data(&self) -> &T {
        &self.data
    }
}

pub fn parse_params<P: DeserializeOwned>(value: Value) -> Result<P, InternalRpcError> {
    serde_json::from_value(value).map_err(InternalRpcError::InvalidJSONParams)
}

// RPC Method with no params required
// Check that the params field is either null or empty
pub fn require_no_params(value: Value) -> Result<(), InternalRpcError> {
    match value {
        Value::Null => Ok(()),
        Value::Object(map) if map.is_empty() => Ok(()),
        Value::Array(array) if array.is_empty() => Ok(()),
        _ => Err(InternalRpcError::UnexpectedParams),
    }
}

// Box the future of an async RPC method so it can be registered as a `Handler`
#[macro_export]
macro_rules! async_handler {
    ($func: expr) => {
        |a, b| Box::pin($func(a, b))
    };
}
