//! HTTP liveness endpoint.
//!
//! Serves a fixed banner at `/` so load balancers and uptime checks can tell
//! the bridge is running. Every other path is a 404.

use std::convert::Infallible;
use std::net::SocketAddr;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Body returned from `/`.
pub const BANNER: &str = "Upcachet Uptime Robot endpoint";

/// Bind `addr` and serve the liveness endpoint on a background task.
///
/// Binding happens before returning so address errors surface at startup.
pub async fn spawn(addr: SocketAddr) -> std::io::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Liveness endpoint listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = serve(listener).await {
            tracing::error!(error = %e, "Liveness endpoint stopped");
        }
    }))
}

/// Accept connections on `listener` until accepting fails.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
                Ok::<_, Infallible>(respond(req.method(), req.uri().path()))
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %e, "Liveness connection error");
            }
        });
    }
}

fn respond(method: &Method, path: &str) -> Response<Full<Bytes>> {
    let (status, body) = match (method, path) {
        (&Method::GET | &Method::HEAD, "/") => (StatusCode::OK, BANNER),
        _ => (StatusCode::NOT_FOUND, "Not Found"),
    };

    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}
