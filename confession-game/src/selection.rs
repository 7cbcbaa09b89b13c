//! Confession draw policy.
use rand::Rng;

use crate::category::HeatLevel;
use crate::model::Confession;

/// Whether `confession` may be drawn at `heat`.
#[must_use]
pub fn is_eligible(confession: &Confession, heat: HeatLevel) -> bool {
    !confession.is_used && heat.allows(confession.category)
}

/// Indices of every confession eligible at `heat`, in pool order.
#[must_use]
pub fn eligible_indices(pool: &[Confession], heat: HeatLevel) -> Vec<usize> {
    pool.iter()
        .enumerate()
        .filter(|(_, confession)| is_eligible(confession, heat))
        .map(|(idx, _)| idx)
        .collect()
}

/// Pick an unused confession uniformly among those the heat level allows.
/// Returns its index in `pool`, or `None` when nothing is eligible.
pub fn pick_confession<R: Rng + ?Sized>(
    pool: &[Confession],
    heat: HeatLevel,
    rng: &mut R,
) -> Option<usize> {
    let eligible = eligible_indices(pool, heat);
    if eligible.is_empty() {
        log::debug!("no eligible confession at heat {heat} ({} in pool)", pool.len());
        return None;
    }
    let chosen = eligible[rng.gen_range(0..eligible.len())];
    log::debug!(
        "drew confession {} at heat {heat} from {} candidates",
        pool[chosen].id,
        eligible.len()
    );
    Some(chosen)
}
