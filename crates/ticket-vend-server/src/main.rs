//! Server implementation

#![warn(missing_docs)]

mod http;

use std::path::PathBuf;
use std::thread;

use clap::Parser;
use eyre::{eyre, Result, WrapErr};
use ticket_vend_core::{Config, RequestHandler};
use tracing::{error, info};

/// Command line options
#[derive(Parser, Debug)]
#[command(version, about = "Hands out strictly increasing tickets per key over HTTP")]
struct Opts {
    /// File holding the durable snapshot of all counters
    #[arg(long)]
    storage: PathBuf,

    /// Host for the HTTP server to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port for the HTTP server to listen on
    #[arg(long, default_value_t = 8888)]
    port: u16,
    /// Number of threads answering requests
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    handler_threads: u32,
}

fn http_loop<H: RequestHandler>(server: &tiny_http::Server, handler: &H) {
    loop {
        let rq = match server.recv() {
            Ok(rq) => rq,
            Err(e) => {
                error!(error = %e, "HTTP receive failed");
                continue;
            }
        };
        if let Some(rq) = http::parse(rq) {
            handler.handle(rq);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let opts = Opts::parse();
    let config = Config::new(opts.storage);

    let vendor = ticket_vend_store::launch(&config).wrap_err_with(|| {
        format!(
            "refusing to serve from {}",
            config.storage_path.display()
        )
    })?;

    let server = tiny_http::Server::http((opts.host.as_str(), opts.port))
        .map_err(|e| eyre!("failed to listen on {}:{}: {e}", opts.host, opts.port))?;
    info!(
        host = opts.host.as_str(),
        port = opts.port,
        storage = %config.storage_path.display(),
        threads = opts.handler_threads,
        "serving tickets"
    );

    thread::scope(|s| {
        for i in 0..opts.handler_threads {
            let (server, vendor) = (&server, &vendor);
            thread::Builder::new()
                .name(format!("handler_{i}"))
                .spawn_scoped(s, move || http_loop(server, vendor))
                .wrap_err("failed to spawn handler thread")?;
        }
        Ok(())
    })
}
