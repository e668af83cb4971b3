//! Configuration for IPSphere
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// IPSphere - backend service for the IP valuation and tokenization marketplace
#[derive(Parser, Debug, Clone)]
#[command(name = "ipsphere")]
#[command(about = "HTTP backend for the IPSphere intellectual-property marketplace")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5001")]
    pub listen: SocketAddr,

    /// Port override; takes precedence over the port in LISTEN
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "ipsphere")]
    pub mongodb_db: String,

    /// Ethereum JSON-RPC endpoint for the HyDRAULIC registry contract
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Hex-encoded private key of the service account (sender identity)
    #[arg(long, env = "PRIVATE_KEY")]
    pub private_key: Option<String>,

    /// Deployed HyDRAULIC registry contract address
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Enable development mode (MongoDB and chain RPC become optional)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Outbound request timeout in milliseconds (chain RPC)
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// How long to wait for a transaction receipt before giving up, in milliseconds
    #[arg(long, env = "CHAIN_CONFIRM_TIMEOUT_MS", default_value = "60000")]
    pub chain_confirm_timeout_ms: u64,
}

impl Args {
    /// Effective listen address (LISTEN with any PORT override applied)
    pub fn listen_addr(&self) -> SocketAddr {
        let mut addr = self.listen;
        if let Some(port) = self.port {
            addr.set_port(port);
        }
        addr
    }

    /// Whether a full chain client configuration is present
    pub fn chain_configured(&self) -> bool {
        self.rpc_url.is_some() && self.private_key.is_some() && self.contract_address.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        // A partially configured chain client is always a mistake
        let chain_parts = [
            self.rpc_url.is_some(),
            self.private_key.is_some(),
            self.contract_address.is_some(),
        ];
        let set = chain_parts.iter().filter(|p| **p).count();
        if set != 0 && set != chain_parts.len() {
            return Err(
                "RPC_URL, PRIVATE_KEY and CONTRACT_ADDRESS must be set together".to_string(),
            );
        }

        if self.chain_confirm_timeout_ms == 0 {
            return Err("CHAIN_CONFIRM_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["ipsphere"])
    }

    #[test]
    fn default_args_are_valid() {
        assert!(base_args().validate().is_ok());
    }

    #[test]
    fn port_overrides_the_listen_port() {
        let mut args = base_args();
        assert_eq!(args.listen_addr().port(), 5001);

        args.port = Some(8080);
        assert_eq!(args.listen_addr().port(), 8080);
        assert_eq!(args.listen_addr().ip(), args.listen.ip());
    }

    #[test]
    fn partial_chain_config_is_rejected() {
        let mut args = base_args();
        args.rpc_url = Some("http://localhost:8545".to_string());
        assert!(args.validate().is_err());
        assert!(!args.chain_configured());

        args.private_key = Some("0xabc".to_string());
        args.contract_address = Some("0xdef".to_string());
        assert!(args.validate().is_ok());
        assert!(args.chain_configured());
    }
}
