pub use tracing::{debug, error, info, trace, warn};
use std::{convert::Infallible, net::SocketAddr};
use std::sync::{Arc, Mutex};
use askama::Template;
use tokio::{
    select,
    sync::{broadcast, mpsc},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use warp::{sse::Event, Filter};

use crate::monitor::MonitorMsg;
use crate::tracker::{Status, Tracker};

#[derive(Template)]
#[template(path = "root.html")]
struct Root {}

#[derive(Clone)]
struct UpdateChan<T>(Arc<Mutex<broadcast::Sender<T>>>);
impl<T: Clone> UpdateChan<T> {
    fn new() -> Self {
        let (ch, _) = broadcast::channel(32);
        Self(Arc::new(Mutex::new(ch)))
    }
    fn subscribe(&self) -> broadcast::Receiver<T> {
        self.0.lock().unwrap().subscribe()
    }
    fn send(&self, msg: T) -> Result<usize, tokio::sync::broadcast::error::SendError<T>> {
        self.0.lock().unwrap().send(msg)
    }
}

pub async fn server(update_rx: broadcast::Receiver<MonitorMsg>, port: u16) {
    let update_chan = UpdateChan::new();
    let status = Arc::new(Mutex::new(Status::default()));
    info!("Starting web server");
    let (kick_tx, kick_rx) = mpsc::channel(1);
    tokio::task::spawn(statemonitor(
        update_rx,
        update_chan.clone(),
        kick_rx,
        status.clone(),
    ));
    let root_route = warp::path!("root").and(warp::get()).and_then(root);
    let status_route = warp::path!("status").and(warp::get()).map(move || {
        let snapshot = status.lock().unwrap().clone();
        warp::reply::with_header(
            status_json(&snapshot),
            "content-type",
            "application/json",
        )
    });
    let sse_route = warp::path("sse")
        .and(warp::get())
        .map(move || update_chan.subscribe())
        .map(move |rx| warp::sse::reply(warp::sse::keep_alive().stream(sse_updates(rx))));
    let sse_kick = warp::path("sse")
        .and(warp::post())
        .map(move || kick_tx.clone())
        .and_then(kick);
    let routes = root_route.or(status_route).or(sse_kick).or(sse_route);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    warp::serve(routes).run(addr).await;
}

/// keeps the state tracker in a dedicated task and manages the update
/// broadcast channel
async fn statemonitor(
    mut update_rx: broadcast::Receiver<MonitorMsg>,
    chan: UpdateChan<String>,
    mut kick_chan: mpsc::Receiver<()>,
    status: Arc<Mutex<Status>>,
) {
    debug!("statemonitor started");
    let mut tracker = Tracker::new();
    loop {
        select! {
            Ok(msg) = update_rx.recv() => {
                tracker.update(msg);
                *status.lock().unwrap() = tracker.snapshot();
            },
            _ = kick_chan.recv() => {
            },
            else => { continue },
        }
        if let Ok(html) = tracker.render() {
            _ = chan.send(html);
        } else {
            error!("Could not construct HTML update");
        }
    }
}

/// Initiates resending the latest SSE message to all connected clients
async fn kick(kick_chan: mpsc::Sender<()>) -> Result<impl warp::Reply, Infallible> {
    _ = kick_chan.send(()).await;
    Ok(warp::reply::with_status(
        warp::reply(),
        warp::http::StatusCode::OK,
    ))
}

async fn root() -> Result<impl warp::Reply, Infallible> {
    let page = Root {};
    match page.render() {
        Ok(html) => Ok(warp::reply::html(html)),
        Err(_) => Ok(warp::reply::html("template error".to_string())),
    }
}

fn sse_updates(chan: broadcast::Receiver<String>) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(chan)
        .filter_map(|item| item.ok())
        .map(|data| Ok(Event::default().data(data)))
}

fn status_json(status: &Status) -> String {
    serde_json::to_string(status).unwrap_or_else(|_| "{}".into())
}

#[cfg(test)]
mod checks {
    use super::*;

    #[test]
    fn check_status_json() {
        let mut s = Status::default();
        s.state = "Monitoring".into();
        s.ready = vec!["sw1".to_string()];
        let json = status_json(&s);
        assert!(json.contains("\"state\":\"Monitoring\""));
        assert!(json.contains("\"ready\":[\"sw1\"]"));
    }
}
