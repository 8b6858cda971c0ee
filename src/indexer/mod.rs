//! Indexer module for DeepBook REST polling

mod client;
mod poller;

pub use client::IndexerClient;
pub use poller::{Feed, MarketPoller};

#[cfg(test)]
pub(crate) mod tests {
    use axum::Router;

    /// Serve `router` on an ephemeral local port and return its base URL
    pub(crate) async fn spawn_indexer(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
