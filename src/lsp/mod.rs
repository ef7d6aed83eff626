//! Language Server Protocol implementation for veriformat
//!
//! Exposes document and range formatting backed by verible-verilog-format.
//! Started with `veriformat server`.

pub mod server;
pub mod types;

pub use server::VeriformatLanguageServer;
pub use types::{VeriformatLspConfig, edit_to_lsp, format_diagnostic_to_lsp};

use anyhow::Result;
use tokio::net::TcpListener;
use tower_lsp::{LspService, Server};

/// Start the Language Server Protocol server over stdio
pub async fn start_server(config_path: Option<&str>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| VeriformatLanguageServer::new(client, config_path));

    log::info!("Starting veriformat Language Server Protocol server");

    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

/// Start the LSP server over TCP (useful for debugging)
pub async fn start_tcp_server(port: u16, config_path: Option<&str>) -> Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    log::info!("veriformat LSP server listening on 127.0.0.1:{port}");

    loop {
        let (stream, _) = listener.accept().await?;
        let config_path = config_path.map(str::to_string);
        let (service, socket) =
            LspService::new(move |client| VeriformatLanguageServer::new(client, config_path.as_deref()));

        tokio::spawn(async move {
            let (read, write) = tokio::io::split(stream);
            Server::new(read, write, socket).serve(service).await;
        });
    }
}
