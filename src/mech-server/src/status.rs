// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! HTTP status endpoint.
//!
//! Serves the latest status snapshot published by the coordinator.
//! A snapshot that cannot be rendered within the configured cap is
//! served as an empty document rather than a truncated one.

use std::net::SocketAddr;

use actix_web::{web, App, HttpResponse, HttpServer};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use mech_protocol::{render_status, StatusSnapshot};

#[derive(Clone, Copy)]
struct StatusCap(usize);

/// Spawn the status frontend on its own task.
pub fn spawn_status_frontend(
    addr: SocketAddr,
    status_rx: watch::Receiver<StatusSnapshot>,
    cap: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(addr, status_rx, cap).await {
            error!("HTTP status server error: {:?}", e);
        }
    })
}

async fn serve(
    addr: SocketAddr,
    status_rx: watch::Receiver<StatusSnapshot>,
    cap: usize,
) -> std::io::Result<()> {
    let status_data = web::Data::new(status_rx);
    let cap_data = web::Data::new(StatusCap(cap));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(status_data.clone())
            .app_data(cap_data.clone())
            .route("/mech/status", web::get().to(status_handler))
    })
    .shutdown_timeout(1)
    .disable_signals()
    .bind(addr)?
    .run();

    info!("http status frontend listening on {}", addr);
    server.await
}

async fn status_handler(
    status_rx: web::Data<watch::Receiver<StatusSnapshot>>,
    cap: web::Data<StatusCap>,
) -> HttpResponse {
    let snapshot = status_rx.borrow().clone();
    match render_status(&snapshot, cap.0) {
        Ok(body) => HttpResponse::Ok()
            .content_type("application/json")
            .body(body),
        Err(error) => {
            warn!("Status document: {}", error);
            HttpResponse::Ok().content_type("application/json").body("{}")
        }
    }
}
