//! # ikebuster-probe
//!
//! Builds one `IKE_SA_INIT` request with the `isakmp` core and prints the
//! bytes it generates. This exists to show the core being driven by a
//! caller; it does not open a socket, send anything, or track SA state the
//! way a real scanner would.

#![warn(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use isakmp::message::{IkeSaId, Message};
use isakmp::params::{
    EncryptionAlgorithm, ExchangeType, KeyExchangeMethod, PseudorandomFunction, SecurityProtocol,
};
use isakmp::payload::sa::{Proposal, Transform};
use isakmp::payload::{KeyExchange, Nonce, PayloadBody, SecurityAssociation};
use isakmp::transform::{Crypter, Signer};
use isakmp::IsakmpError;
use rand::RngCore;
use tracing::{info, instrument};

mod cli;

use cli::Cli;

/// `IKE_SA_INIT` never carries an encryption envelope, so `generate` never
/// calls into either transform; these exist only to satisfy the signature.
struct UnusedCrypter;

impl Crypter for UnusedCrypter {
    fn block_size(&self) -> usize {
        0
    }
    fn encrypt(&self, data: &[u8], _iv: &[u8]) -> Vec<u8> {
        data.to_vec()
    }
    fn decrypt(&self, data: &[u8], _iv: &[u8]) -> Vec<u8> {
        data.to_vec()
    }
}

struct UnusedSigner;

impl Signer for UnusedSigner {
    fn block_size(&self) -> usize {
        0
    }
    fn get_signature(&self, _data: &[u8]) -> Vec<u8> {
        Vec::new()
    }
}

#[instrument(skip_all, fields(destination = %destination))]
fn build_ike_sa_init_request(destination: SocketAddr) -> Result<Vec<u8>, IsakmpError> {
    let mut rng = rand::rng();

    let mut ke_data = vec![0u8; 32];
    rng.fill_bytes(&mut ke_data);
    let mut nonce_data = vec![0u8; 32];
    rng.fill_bytes(&mut nonce_data);
    let initiator_spi = loop {
        let candidate = rng.next_u64();
        if candidate != 0 {
            break candidate;
        }
    };

    let mut msg = Message::new();
    msg.set_exchange_type(ExchangeType::IkeSaInit);
    msg.set_request(true);
    msg.set_endpoints(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0), destination);
    msg.set_ike_sa_id(IkeSaId {
        initiator_spi,
        responder_spi: 0,
        is_original_initiator: true,
    });

    msg.add_payload(PayloadBody::SecurityAssociation(SecurityAssociation {
        proposals: vec![Proposal {
            protocol: SecurityProtocol::InternetKeyExchange,
            spi: Vec::new(),
            transforms: vec![
                Transform::Encryption(EncryptionAlgorithm::AesGcm16, Some(256)),
                Transform::PseudoRandomFunction(PseudorandomFunction::HmacSha2_256),
                Transform::KeyExchange(KeyExchangeMethod::Curve25519),
            ],
        }],
    }));
    msg.add_payload(PayloadBody::KeyExchange(KeyExchange {
        dh_group: KeyExchangeMethod::Curve25519,
        data: ke_data,
    }));
    msg.add_payload(PayloadBody::Nonce(Nonce(nonce_data)));

    info!(initiator_spi = %format!("{initiator_spi:016x}"), "built IKE_SA_INIT request");
    msg.generate(Box::new(UnusedCrypter), Box::new(UnusedSigner))
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let destination = SocketAddr::new(cli.ip, cli.port);

    match build_ike_sa_init_request(destination) {
        Ok(packet) => {
            println!("{} octet(s):", packet.len());
            for chunk in packet.chunks(16) {
                let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
                println!("{}", hex.join(" "));
            }
        }
        Err(err) => {
            eprintln!("failed to build the request: {err}");
            std::process::exit(1);
        }
    }
}
