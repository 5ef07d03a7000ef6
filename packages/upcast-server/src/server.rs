use hyper::{service::Service, Request, Response};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use upcast_utils::BoxError;

use crate::handler::{Body, UpdateRequestHandler};

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct UpdateServer {
    handler: Arc<UpdateRequestHandler>,
}

impl UpdateServer {
    pub fn new(handler: UpdateRequestHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub async fn start(self, addr: SocketAddr) -> Result<(), BoxError> {
        let listener = TcpListener::bind(addr).await?;
        self.run(listener).await
    }

    /// Serve connections from `listener` until the task is dropped.
    pub async fn run(self, listener: TcpListener) -> Result<(), BoxError> {
        tracing::info!(
            addr = %listener.local_addr()?,
            repo = %self.handler.config().repo,
            "update server listening"
        );

        loop {
            let (stream, peer) = accept_with_backoff(|| listener.accept()).await;
            let io = TokioIo::new(stream);
            let service = UpdateService {
                handler: self.handler.clone(),
            };

            tokio::spawn(async move {
                if let Err(error) = hyper::server::conn::http1::Builder::new()
                    .serve_connection(io, service)
                    .await
                {
                    tracing::error!(%peer, %error, "error serving connection");
                }
            });
        }
    }
}

/// Retry `accept` until it yields a connection. Errors such as EMFILE
/// persist until a descriptor frees up, so each one waits before the retry.
async fn accept_with_backoff<T, F, Fut>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(error) => {
                tracing::error!(%error, "failed to accept connection");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

#[derive(Clone)]
struct UpdateService {
    handler: Arc<UpdateRequestHandler>,
}

impl Service<Request<hyper::body::Incoming>> for UpdateService {
    type Response = Response<Body>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<hyper::body::Incoming>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move {
            let response = handler.handle(req.method(), req.uri()).await;
            tracing::debug!(
                method = %req.method(),
                uri = %req.uri(),
                status = response.status().as_u16(),
                "request"
            );
            Ok(response)
        })
    }
}
