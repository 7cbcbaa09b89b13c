//! Seeded randomness for round selection and id generation.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::constants::{ID_ALPHABET, ID_LEN, RNG_DOMAIN_IDS, RNG_DOMAIN_SELECTION};

/// Independent RNG streams derived from one user-visible seed, so that id
/// generation never perturbs which confession gets drawn.
#[derive(Debug, Clone)]
pub struct SessionRng {
    seed: u64,
    selection: ChaCha20Rng,
    ids: ChaCha20Rng,
}

impl SessionRng {
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            selection: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, RNG_DOMAIN_SELECTION)),
            ids: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, RNG_DOMAIN_IDS)),
        }
    }

    /// Seed from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_user_seed(rand::thread_rng().next_u64())
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub fn selection(&mut self) -> &mut ChaCha20Rng {
        &mut self.selection
    }

    /// Draw a short base-36 id that `taken` does not already claim.
    pub fn next_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id: String = (0..ID_LEN)
                .map(|_| char::from(ID_ALPHABET[self.ids.gen_range(0..ID_ALPHABET.len())]))
                .collect();
            if !taken(&id) {
                return id;
            }
        }
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("hmac accepts any key length");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
