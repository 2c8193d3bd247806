//! Easy mode: a minimal paste-your-passwords web front-end.
//!
//! `GET /` serves the form, `POST /check` scores the url-encoded `passwords`
//! field with the same scorer and deadline as the CLI path and answers with
//! the score line as plain text.

use std::net::SocketAddr;
use std::sync::Arc;

use breachscore_index::IndexStore;
use breachscore_scorer::Scorer;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, header};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

const FORM_PAGE: &str = r#"<head></head><body><form action="/check" method="post">
<input type="submit"><br>
<textarea rows="50" cols="40" name="passwords">Passwords go here</textarea>
</form></body>"#;

pub async fn serve(
    addr: SocketAddr,
    scorer: Arc<Scorer>,
    store: Arc<dyn IndexStore>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "easy mode listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let scorer = Arc::clone(&scorer);
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let service =
                service_fn(move |req| handle(req, Arc::clone(&scorer), Arc::clone(&store)));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!(%peer, error = %e, "connection error");
            }
        });
    }
}

async fn handle(
    req: Request<Incoming>,
    scorer: Arc<Scorer>,
    store: Arc<dyn IndexStore>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => Ok(response("text/html", Bytes::from_static(FORM_PAGE.as_bytes()))),
        (&Method::POST, "/check") => {
            let body = req.into_body().collect().await?.to_bytes();
            let lines = candidate_lines(&body);
            tracing::debug!(candidates = lines.len(), "scoring form submission");

            let report = scorer.score(lines, store).await;
            let mut out = String::new();
            if report.partial {
                out.push_str("Time elapsed before every password was checked.\n");
            }
            out.push_str(&format!("Score is {} ({:.2}).\n", report.score, report.bonus));
            Ok(response("text/plain", Bytes::from(out)))
        }
        _ => {
            let mut resp = response("text/plain", Bytes::from_static(b"not found\n"));
            *resp.status_mut() = StatusCode::NOT_FOUND;
            Ok(resp)
        }
    }
}

fn response(content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    if let Ok(value) = header::HeaderValue::from_str(content_type) {
        resp.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    resp
}

/// Extracts candidate lines from the url-encoded `passwords` form field.
fn candidate_lines(body: &[u8]) -> Vec<Vec<u8>> {
    for (name, value) in url::form_urlencoded::parse(body) {
        if name == "passwords" {
            return value.lines().map(|l| l.as_bytes().to_vec()).collect();
        }
    }
    Vec::new()
}
