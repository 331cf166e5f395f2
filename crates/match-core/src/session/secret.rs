//! Session secret generation

use rand::Rng;

/// Length of a generated secret, fixed for wire compatibility.
pub const SECRET_LENGTH: usize = 12;

const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a fresh session secret.
///
/// `thread_rng` is a CSPRNG, so secrets are not predictable from earlier
/// ones. The output stays fixed-length uppercase alphanumeric.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..SECRET_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARS.len());
            CHARS[idx] as char
        })
        .collect()
}
