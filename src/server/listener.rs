use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::Config;
use crate::files::Dispatcher;
use crate::http::connection::Connection;

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    let dispatcher = Arc::new(Dispatcher::from_config(&cfg.static_files));
    info!(
        "Serving {} on {}",
        dispatcher.root().display(),
        cfg.server.listen_addr
    );

    serve(listener, dispatcher).await
}

/// Accept loop over an already bound listener; one task per connection.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        debug!("Accepted connection from {}", peer);

        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, dispatcher);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
