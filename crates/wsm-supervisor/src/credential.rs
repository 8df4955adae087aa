//! RPC credential generation.

use rand::rngs::OsRng;
use rand::Rng;
use wsm_rpc::RpcCredential;

/// Length of every generated token.
pub const CREDENTIAL_LENGTH: usize = 20;

/// Token alphabet: upper and lower case ASCII letters.
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a fresh credential from the OS random source.
///
/// Every character is drawn uniformly from the 52-letter alphabet.
pub fn generate_credential() -> RpcCredential {
    let mut rng = OsRng;
    let token: String = (0..CREDENTIAL_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..LETTERS.len());
            LETTERS.get(idx).copied().map(char::from).unwrap_or('a')
        })
        .collect();
    RpcCredential::new(token)
}
