use crate::domain::model::PlaceCandidate;
use rand::Rng;

/// 唯一的隨機挑選函式：在排除 `exclude_id` 後的候選中均勻挑選一個
pub fn choose<'a, R: Rng + ?Sized>(
    candidates: &'a [PlaceCandidate],
    exclude_id: Option<&str>,
    rng: &mut R,
) -> Option<&'a PlaceCandidate> {
    let remaining: Vec<&PlaceCandidate> = candidates
        .iter()
        .filter(|c| exclude_id.map_or(true, |id| c.id != id))
        .collect();

    if remaining.is_empty() {
        return None;
    }

    let index = rng.gen_range(0..remaining.len());
    Some(remaining[index])
}

pub fn pick<'a, R: Rng + ?Sized>(
    candidates: &'a [PlaceCandidate],
    rng: &mut R,
) -> Option<&'a PlaceCandidate> {
    choose(candidates, None, rng)
}

/// 排除上一次的選擇；沒有其他候選時回傳 None
pub fn pick_again<'a, R: Rng + ?Sized>(
    candidates: &'a [PlaceCandidate],
    previous_id: &str,
    rng: &mut R,
) -> Option<&'a PlaceCandidate> {
    choose(candidates, Some(previous_id), rng)
}
