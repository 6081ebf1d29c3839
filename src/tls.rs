use std::sync::Once;

static INSTALL: Once = Once::new();

/// Select ring as the process-wide rustls provider before any client is built.
///
/// Without this rustls cannot pick a provider when more than one backend is
/// compiled in. Safe to call repeatedly.
pub fn install_crypto_provider() {
    INSTALL.call_once(|| {
        if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
            tracing::debug!("crypto provider already installed: {e:?}");
        }
    });
}
