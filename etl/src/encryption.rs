use std::sync::Once;

use tracing::debug;

static INIT_CRYPTO: Once = Once::new();

/// Installs the AWS LC rustls crypto provider as the process default.
///
/// Must run before the BigQuery client is built. Safe to call more than once; a provider
/// installed earlier by someone else is kept.
pub fn install_crypto_provider() {
    INIT_CRYPTO.call_once(|| {
        if rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .is_err()
        {
            debug!("a rustls crypto provider was already installed, keeping it");
        }
    });
}
