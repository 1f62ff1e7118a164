//! Showing pairing codes to the operator.

use tracing::{info, warn};

/// Presents a pairing code so it can be scanned with the phone app.
pub trait PairingDisplay: Send + Sync {
    fn show_code(&self, code: &str);
}

/// Renders codes as a QR code on stdout.
pub struct TerminalQr;

impl PairingDisplay for TerminalQr {
    fn show_code(&self, code: &str) {
        info!("Scan the QR code below with WhatsApp on your phone");
        info!("WhatsApp → Settings → Linked Devices → Link a Device");

        if let Err(e) = qr2term::print_qr(code) {
            warn!("Failed to render QR code: {}", e);
            info!(code = %code, "Pairing code");
        }
    }
}
