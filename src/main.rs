//! Binary entry point for the design MCP gateway.

// std
use std::sync::Arc;
// crates.io
use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
// self
use design_mcp_gateway::{
	cli::{Cli, Transport},
	config::GatewayConfig,
	gateway::Gateway,
	mcp::{McpHandler, stdio},
	obs,
	server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	obs::init_tracing(&cli.log_level, cli.log_format).map_err(color_eyre::eyre::Report::msg)?;

	let config = GatewayConfig::from_cli(&cli).wrap_err("Invalid configuration.")?;

	tracing::info!(?config, "Starting design MCP gateway.");

	let gateway = Gateway::from_config(&config).wrap_err("Failed to build the gateway.")?;
	let handler = McpHandler::new(Arc::new(gateway));
	let state = AppState::new(handler.clone());
	let callback_path = config.callback_path().to_owned();

	match config.transport {
		Transport::Http => server::serve(state, config.listen, &callback_path)
			.await
			.wrap_err("HTTP server failed.")?,
		Transport::Stdio => {
			let listen = config.listen;
			// The redirect must still land somewhere while MCP traffic uses stdio.
			let callback = tokio::spawn(async move {
				if let Err(e) = server::serve(state, listen, &callback_path).await {
					tracing::error!(error = %e, "Callback server failed.");
				}
			});

			stdio::serve_stdio(&handler).await.wrap_err("Stdio transport failed.")?;
			callback.abort();
		},
	}

	Ok(())
}
