// HTTP entry point of the JSON-RPC handler

use std::net::IpAddr;

use actix_web::{
    web::{self, Data},
    HttpRequest, HttpResponse, Responder,
};
use log::trace;

use super::{RPCHandler, RpcResponseError};
use crate::context::Context;

/// Peer address of the HTTP connection, None when actix could not resolve it.
/// Admin methods are served to loopback peers only.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<IpAddr>);

impl ClientAddr {
    pub fn is_loopback(&self) -> bool {
        self.0.is_some_and(|ip| ip.is_loopback())
    }
}

pub trait RPCServerHandler<T: Send + Clone> {
    fn get_rpc_handler(&self) -> &RPCHandler<T>;
}

/// `POST /json_rpc`: the shared data and the peer address go into the context
pub async fn json_rpc<T, H>(
    server: Data<H>,
    request: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder, RpcResponseError>
where
    T: Send + Sync + Clone + 'static,
    H: RPCServerHandler<T>,
{
    let handler = server.get_rpc_handler();
    let peer = ClientAddr(request.peer_addr().map(|addr| addr.ip()));
    if log::log_enabled!(log::Level::Trace) {
        trace!("json_rpc request of {} bytes from {:?}", body.len(), peer.0);
    }

    let mut context = Context::new();
    context.store(handler.get_data().clone());
    context.store(peer);

    let response = handler.handle_request_with_context(context, &body).await?;
    Ok(HttpResponse::Ok().json(response))
}
