use std::sync::Arc;

use crate::{config, error, info, server};

pub async fn serve(state: server::AppState, addr: Option<String>) {
    let addr = addr.unwrap_or_else(config::server_addr);
    info!("Serving on http://{}", addr);

    if let Err(e) = server::start_api_server(Arc::new(state), &addr).await {
        error!("Server stopped. Err: {}", e);
    }
}
