pub mod rpc;

use std::sync::Arc;

use actix_web::{
    dev::ServerHandle,
    get,
    web::{self, Data},
    App, HttpResponse, HttpServer, Responder,
};
use log::{error, info, warn};
use harvest_common::{
    config::VERSION,
    rpc::{
        server::{json_rpc, RPCServerHandler},
        RPCHandler,
    },
};
use tokio::sync::Mutex;

use crate::core::{storage::Storage, Ledger};

pub type SharedLedgerRpcServer<S> = Arc<LedgerRpcServer<S>>;

/// RPC server settings
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub bind_address: String,
    pub workers: usize,
    pub allow_admin_methods: bool,
}

pub struct LedgerRpcServer<S: Storage> {
    handle: Mutex<Option<ServerHandle>>,
    rpc_handler: RPCHandler<Arc<Ledger<S>>>,
}

impl<S: Storage> LedgerRpcServer<S> {
    /// Build the method registry without binding any socket
    pub fn new(ledger: Arc<Ledger<S>>, allow_admin_methods: bool) -> Self {
        let mut rpc_handler = RPCHandler::new(ledger);
        rpc::register_methods(&mut rpc_handler, allow_admin_methods);

        Self {
            handle: Mutex::new(None),
            rpc_handler,
        }
    }

    /// Bind and spawn the HTTP server
    pub async fn start(ledger: Arc<Ledger<S>>, config: RpcConfig) -> std::io::Result<SharedLedgerRpcServer<S>> {
        let server = Arc::new(Self::new(ledger, config.allow_admin_methods));

        if config.bind_address.starts_with("0.0.0.0") {
            warn!("RPC server is bound to 0.0.0.0 (all interfaces)");
            warn!("Admin methods stay restricted to loopback clients, a reverse proxy on this host would bypass it");
            warn!("RECOMMENDED: Use 127.0.0.1:8080 for localhost-only access");
        }

        if log::log_enabled!(log::Level::Info) {
            info!(
                "Starting RPC server on {} with {} workers",
                config.bind_address, config.workers
            );
        }

        let clone = Arc::clone(&server);
        let http_server = HttpServer::new(move || {
            let server = Arc::clone(&clone);
            App::new()
                .app_data(Data::from(server))
                .route(
                    "/json_rpc",
                    web::post().to(json_rpc::<Arc<Ledger<S>>, LedgerRpcServer<S>>),
                )
                .service(index)
        })
        .disable_signals()
        .bind(&config.bind_address)?
        .workers(config.workers)
        .run();

        {
            // save the server handle to be able to stop it later
            let handle = http_server.handle();
            let mut lock = server.handle.lock().await;
            *lock = Some(handle);
        }
        tokio::spawn(async move {
            if let Err(e) = http_server.await {
                error!("RPC server stopped with an error: {}", e);
            }
        });

        Ok(server)
    }

    pub async fn stop(&self) {
        info!("Stopping RPC Server...");
        let mut handle = self.handle.lock().await;
        if let Some(handle) = handle.take() {
            handle.stop(false).await;
            info!("RPC Server is now stopped!");
        } else {
            warn!("RPC Server is not running!");
        }
    }
}

impl<S: Storage> RPCServerHandler<Arc<Ledger<S>>> for LedgerRpcServer<S> {
    fn get_rpc_handler(&self) -> &RPCHandler<Arc<Ledger<S>>> {
        &self.rpc_handler
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().body(format!("Harvest ledger\nRunning on: {}", VERSION))
}
