pub mod config;
pub mod io;
pub mod questionnaire;
pub mod review;
pub mod status;

use std::future::Future;

use riskportal_core::{Config, HttpGateway};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Per-invocation credential overrides (flags or env).
pub struct Overrides {
    pub token: Option<String>,
    pub role: Option<String>,
}

/// Run an async command on a fresh multi-thread runtime.
pub fn block_on<F: Future<Output = CmdResult>>(fut: F) -> CmdResult {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(fut)
}

/// Gateway built from config plus overrides.
pub fn gateway(config: &Config, overrides: &Overrides) -> Result<HttpGateway, Box<dyn std::error::Error>> {
    let credentials = config.credentials(overrides.token.as_deref(), overrides.role.as_deref())?;
    tracing::debug!(base_url = %config.api.base_url, role = %credentials.role(), "gateway ready");
    let gateway = HttpGateway::new(&config.api.base_url, credentials, config.timeout())?
        .with_chunk_size(usize::try_from(config.upload.chunk_size).unwrap_or(usize::MAX));
    Ok(gateway)
}
