use std::net::IpAddr;

use clap::Parser;

/// The cli of ikebuster-probe
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Cli {
    /// The IP to address the request to
    pub ip: IpAddr,

    /// The port to address the request to
    #[clap(short, default_value_t = 500)]
    pub port: u16,
}
