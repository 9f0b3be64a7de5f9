use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const SEED_LEN: usize = 32;

/// Derive a draw seed from entropy sampled at draw time, mixed with the
/// game id and round counter. The entropy does not exist before the
/// draw executes, so no caller can predict the outcome when committing
/// to a join. Trust assumption: the entropy is local to the drawing
/// process and not externally verifiable.
pub fn draw_seed(game_id: Uuid, round: u64) -> [u8; SEED_LEN] {
    let mut entropy = [0u8; SEED_LEN];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mut hasher = Sha256::new();
    hasher.update(entropy);
    hasher.update(game_id.as_bytes());
    hasher.update(round.to_le_bytes());
    hasher.finalize().into()
}

/// Winner slot from a seed: XOR-fold the bytes and take the low bit.
/// Always 0 or 1.
pub fn winning_index(seed: &[u8]) -> usize {
    let parity = seed.iter().fold(0u8, |acc, &byte| acc ^ byte) & 1;
    parity as usize
}
