use std::sync::Once;

/// Installs the ring provider as the process default unless one is already set.
pub(crate) fn ensure_rustls_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            // Losing the race to another installer is fine.
            let _ = rustls::crypto::ring::default_provider().install_default();
        }
    });
}
