use crate::domain::model::{BusinessStatus, PlaceCandidate};

/// 評分必須嚴格大於此值
pub const MIN_RATING_EXCLUSIVE: f64 = 3.0;

pub fn is_eligible(candidate: &PlaceCandidate) -> bool {
    if matches!(
        candidate.business_status,
        Some(BusinessStatus::ClosedPermanently)
    ) {
        return false;
    }

    match candidate.rating {
        Some(rating) => rating > MIN_RATING_EXCLUSIVE,
        None => false,
    }
}

/// 套用接受條件，保留供應商原本的順序
pub fn accept(candidates: Vec<PlaceCandidate>) -> Vec<PlaceCandidate> {
    let total = candidates.len();
    let accepted: Vec<PlaceCandidate> = candidates.into_iter().filter(is_eligible).collect();

    tracing::debug!(
        "Acceptance filter kept {}/{} candidates",
        accepted.len(),
        total
    );
    accepted
}
