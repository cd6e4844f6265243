use crate::core::{filter, selection};
use crate::domain::model::{
    CandidateSet, Coordinate, PlaceCandidate, ProviderStatus, SearchRadius, UserLocation,
};
use crate::domain::ports::PlacesProvider;
use crate::utils::error::{ErrorKind, LocationFailure, PickerError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;

pub const RESTAURANT_CATEGORY: &str = "restaurant";

/// 每個 session 的狀態：NoLocation → HasLocation → HasCandidates → HasSelection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    NoLocation { failure: Option<ErrorKind> },
    HasLocation { failure: Option<ErrorKind> },
    HasCandidates,
    HasSelection,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    #[serde(flatten)]
    pub state: WorkflowState,
    pub location: Option<UserLocation>,
    pub radius_km: i64,
    pub candidate_count: usize,
    pub selection: Option<PlaceCandidate>,
}

/// 呼叫供應商並套用接受條件；狀態非 OK 或過濾後為空都視為失敗
pub async fn discover_candidates(
    provider: &dyn PlacesProvider,
    coordinate: Coordinate,
    radius: SearchRadius,
) -> Result<CandidateSet> {
    tracing::debug!(
        "Searching {} around {} within {} m",
        RESTAURANT_CATEGORY,
        coordinate.as_query(),
        radius.meters()
    );

    let search = provider
        .nearby_search(coordinate, radius.meters(), RESTAURANT_CATEGORY)
        .await?;

    match search.status {
        ProviderStatus::Ok => {}
        ProviderStatus::ZeroResults => {
            return Err(PickerError::NoCandidatesFound {
                radius_km: radius.km(),
            })
        }
        ProviderStatus::Other(status) => {
            let message = match search.error_message {
                Some(detail) => format!("{}: {}", status, detail),
                None => status,
            };
            return Err(PickerError::provider(message));
        }
    }

    let candidates = filter::accept(search.candidates);
    if candidates.is_empty() {
        return Err(PickerError::NoCandidatesFound {
            radius_km: radius.km(),
        });
    }

    Ok(CandidateSet {
        coordinate,
        radius,
        candidates,
    })
}

/// 探索與挑選流程，一個 session 一個實例
pub struct DiscoveryWorkflow {
    provider: Arc<dyn PlacesProvider>,
    rng: StdRng,
    location: Option<UserLocation>,
    radius: SearchRadius,
    candidates: Option<CandidateSet>,
    selection: Option<PlaceCandidate>,
    last_failure: Option<ErrorKind>,
}

impl DiscoveryWorkflow {
    pub fn new(provider: Arc<dyn PlacesProvider>) -> Self {
        Self::with_rng(provider, StdRng::from_entropy())
    }

    /// 固定亂數種子，讓挑選結果可重現
    pub fn with_seed(provider: Arc<dyn PlacesProvider>, seed: u64) -> Self {
        Self::with_rng(provider, StdRng::seed_from_u64(seed))
    }

    fn with_rng(provider: Arc<dyn PlacesProvider>, rng: StdRng) -> Self {
        Self {
            provider,
            rng,
            location: None,
            radius: SearchRadius::default(),
            candidates: None,
            selection: None,
            last_failure: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        if self.selection.is_some() {
            WorkflowState::HasSelection
        } else if self.candidates.is_some() {
            WorkflowState::HasCandidates
        } else if self.location.is_some() {
            WorkflowState::HasLocation {
                failure: self.last_failure,
            }
        } else {
            WorkflowState::NoLocation {
                failure: self.last_failure,
            }
        }
    }

    pub fn location(&self) -> Option<&UserLocation> {
        self.location.as_ref()
    }

    pub fn radius(&self) -> SearchRadius {
        self.radius
    }

    pub fn candidates(&self) -> Option<&CandidateSet> {
        self.candidates.as_ref()
    }

    pub fn selection(&self) -> Option<&PlaceCandidate> {
        self.selection.as_ref()
    }

    pub fn last_failure(&self) -> Option<ErrorKind> {
        self.last_failure
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            state: self.state(),
            location: self.location.clone(),
            radius_km: self.radius.km(),
            candidate_count: self.candidates.as_ref().map_or(0, CandidateSet::len),
            selection: self.selection.clone(),
        }
    }

    pub fn set_location(&mut self, location: UserLocation) {
        let moved = self
            .location
            .as_ref()
            .map_or(true, |current| current.coordinate != location.coordinate);

        if moved {
            // 位置改變後舊的候選清單不再適用
            self.candidates = None;
            self.selection = None;
        }
        self.location = Some(location);
        self.last_failure = None;
    }

    pub fn set_radius(&mut self, radius: SearchRadius) {
        self.radius = radius;
    }

    /// 記錄流程外發生的失敗（例如定位失敗），不改變既有資料
    pub fn record_failure(&mut self, kind: ErrorKind) {
        self.last_failure = Some(kind);
    }

    pub async fn discover(
        &mut self,
        coordinate: Coordinate,
        radius: SearchRadius,
    ) -> Result<&CandidateSet> {
        self.candidates = None;
        self.selection = None;

        match discover_candidates(self.provider.as_ref(), coordinate, radius).await {
            Ok(set) => {
                tracing::info!(
                    "🍽️ Discovered {} eligible restaurants within {} km",
                    set.len(),
                    radius.km()
                );
                self.last_failure = None;
                Ok(self.candidates.insert(set))
            }
            Err(e) => {
                tracing::warn!("❌ Discovery failed: {}", e);
                self.last_failure = Some(e.kind());
                Err(e)
            }
        }
    }

    /// 「挑一間」：重新搜尋後隨機挑選
    pub async fn pick_restaurant(&mut self) -> Result<PlaceCandidate> {
        let coordinate = match &self.location {
            Some(location) => location.coordinate,
            None => return Err(PickerError::location(LocationFailure::PositionUnavailable)),
        };
        let radius = self.radius;

        self.discover(coordinate, radius).await?;
        self.choose_from_current(None)
            .ok_or(PickerError::NoCandidatesFound {
                radius_km: radius.km(),
            })
    }

    /// 「再挑一次」：排除上一個選擇；清單用完時重新搜尋
    pub async fn pick_again(&mut self) -> Result<PlaceCandidate> {
        let (coordinate, radius) = match &self.candidates {
            Some(set) => (set.coordinate, set.radius),
            None => return self.pick_restaurant().await,
        };

        let previous_id = match &self.selection {
            Some(previous) => previous.id.clone(),
            None => {
                return self.choose_from_current(None).ok_or(PickerError::NoCandidatesFound {
                    radius_km: radius.km(),
                })
            }
        };

        if let Some(chosen) = self.choose_from_current(Some(&previous_id)) {
            return Ok(chosen);
        }

        tracing::info!(
            "🔄 No alternative to '{}' in the current set, searching again",
            previous_id
        );
        self.discover(coordinate, radius).await?;

        // 新清單若只剩同一間才會重複顯示
        match self.choose_from_current(Some(&previous_id)) {
            Some(chosen) => Ok(chosen),
            None => self
                .choose_from_current(None)
                .ok_or(PickerError::NoCandidatesFound {
                    radius_km: radius.km(),
                }),
        }
    }

    fn choose_from_current(&mut self, exclude_id: Option<&str>) -> Option<PlaceCandidate> {
        let set = self.candidates.as_ref()?;
        let chosen = match exclude_id {
            Some(previous_id) => {
                selection::pick_again(&set.candidates, previous_id, &mut self.rng)
            }
            None => selection::pick(&set.candidates, &mut self.rng),
        }?
        .clone();

        tracing::debug!("Selected '{}' ({})", chosen.name, chosen.id);
        self.selection = Some(chosen.clone());
        Some(chosen)
    }

    /// 照片僅供顯示，解析失敗時回傳 None
    pub async fn resolve_photo(&self, candidate: &PlaceCandidate, max_width: u32) -> Option<String> {
        let reference = candidate.photo_reference.as_deref()?;
        match self.provider.photo_url(reference, max_width).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("⚠️ Could not resolve photo for '{}': {}", candidate.name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BusinessStatus, NearbySearch};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedPlaces {
        responses: Mutex<VecDeque<Result<NearbySearch>>>,
        calls: AtomicUsize,
    }

    impl ScriptedPlaces {
        fn new(responses: Vec<Result<NearbySearch>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlacesProvider for ScriptedPlaces {
        async fn nearby_search(
            &self,
            _coordinate: Coordinate,
            _radius_meters: i64,
            _category: &str,
        ) -> Result<NearbySearch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PickerError::provider("no scripted response")))
        }

        async fn photo_url(&self, photo_reference: &str, _max_width: u32) -> Result<String> {
            if photo_reference == "broken" {
                return Err(PickerError::provider("photo lookup failed"));
            }
            Ok(format!("https://images.example.com/{}", photo_reference))
        }
    }

    fn place(id: &str, rating: Option<f64>) -> PlaceCandidate {
        PlaceCandidate {
            id: id.to_string(),
            name: format!("Place {}", id),
            address: "Main St".to_string(),
            rating,
            price_level: Some(2),
            photo_reference: None,
            location: Coordinate { lat: 37.0, lng: -122.0 },
            business_status: Some(BusinessStatus::Operational),
        }
    }

    fn located(provider: Arc<ScriptedPlaces>) -> DiscoveryWorkflow {
        let mut workflow = DiscoveryWorkflow::with_seed(provider, 11);
        workflow.set_location(UserLocation {
            coordinate: Coordinate::new(37.0, -122.0).unwrap(),
            address: "Somewhere".to_string(),
        });
        workflow
    }

    #[tokio::test]
    async fn test_discover_filters_ratings_strictly() {
        let provider = ScriptedPlaces::new(vec![Ok(NearbySearch::ok(vec![
            place("a", Some(4.5)),
            place("b", Some(2.9)),
            place("c", Some(3.0)),
        ]))]);
        let mut workflow = located(provider);

        let set = workflow
            .discover(Coordinate::new(37.0, -122.0).unwrap(), SearchRadius::new(5).unwrap())
            .await
            .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.candidates[0].id, "a");
        assert_eq!(workflow.state(), WorkflowState::HasCandidates);
    }

    #[tokio::test]
    async fn test_discover_provider_status_error() {
        let provider = ScriptedPlaces::new(vec![Ok(NearbySearch {
            status: ProviderStatus::Other("REQUEST_DENIED".to_string()),
            candidates: vec![],
            error_message: Some("The provided API key is invalid.".to_string()),
        })]);
        let mut workflow = located(provider);

        let err = workflow
            .discover(Coordinate::new(37.0, -122.0).unwrap(), SearchRadius::new(5).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProviderError);
        assert!(workflow.candidates().is_none());
        assert_eq!(
            workflow.state(),
            WorkflowState::HasLocation {
                failure: Some(ErrorKind::ProviderError)
            }
        );
    }

    #[tokio::test]
    async fn test_discover_zero_results_is_no_candidates() {
        let provider = ScriptedPlaces::new(vec![Ok(NearbySearch {
            status: ProviderStatus::ZeroResults,
            candidates: vec![],
            error_message: None,
        })]);
        let mut workflow = located(provider);

        let err = workflow.pick_restaurant().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCandidatesFound);
    }

    #[tokio::test]
    async fn test_failure_clears_previous_selection() {
        let provider = ScriptedPlaces::new(vec![
            Ok(NearbySearch::ok(vec![place("a", Some(4.0))])),
            Err(PickerError::provider("connection reset")),
        ]);
        let mut workflow = located(provider);

        workflow.pick_restaurant().await.unwrap();
        assert_eq!(workflow.state(), WorkflowState::HasSelection);

        assert!(workflow.pick_restaurant().await.is_err());
        assert!(workflow.selection().is_none());
        assert_eq!(
            workflow.state(),
            WorkflowState::HasLocation {
                failure: Some(ErrorKind::ProviderError)
            }
        );
    }

    #[tokio::test]
    async fn test_pick_restaurant_requires_location() {
        let provider = ScriptedPlaces::new(vec![]);
        let mut workflow = DiscoveryWorkflow::with_seed(provider.clone(), 1);

        let err = workflow.pick_restaurant().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocationUnavailable);
        assert_eq!(provider.calls(), 0);
        assert_eq!(workflow.state(), WorkflowState::NoLocation { failure: None });
    }

    #[tokio::test]
    async fn test_pick_again_two_candidates_alternates() {
        let provider = ScriptedPlaces::new(vec![Ok(NearbySearch::ok(vec![
            place("a", Some(4.0)),
            place("b", Some(4.5)),
        ]))]);
        let mut workflow = located(provider.clone());

        let mut previous = workflow.pick_restaurant().await.unwrap();
        for _ in 0..20 {
            let next = workflow.pick_again().await.unwrap();
            assert_ne!(next.id, previous.id);
            previous = next;
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_pick_again_single_candidate_rediscovers() {
        let provider = ScriptedPlaces::new(vec![
            Ok(NearbySearch::ok(vec![place("solo", Some(4.0))])),
            Ok(NearbySearch::ok(vec![
                place("solo", Some(4.0)),
                place("new", Some(4.1)),
            ])),
        ]);
        let mut workflow = located(provider.clone());

        assert_eq!(workflow.pick_restaurant().await.unwrap().id, "solo");
        let next = workflow.pick_again().await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(next.id, "new");
    }

    #[tokio::test]
    async fn test_pick_again_repeats_only_when_fresh_set_has_one() {
        let provider = ScriptedPlaces::new(vec![
            Ok(NearbySearch::ok(vec![place("solo", Some(4.0))])),
            Ok(NearbySearch::ok(vec![place("solo", Some(4.0))])),
        ]);
        let mut workflow = located(provider.clone());

        workflow.pick_restaurant().await.unwrap();
        let next = workflow.pick_again().await.unwrap();

        assert_eq!(next.id, "solo");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_pick_again_without_candidates_picks_fresh() {
        let provider = ScriptedPlaces::new(vec![Ok(NearbySearch::ok(vec![place(
            "a",
            Some(4.0),
        )]))]);
        let mut workflow = located(provider.clone());

        assert_eq!(workflow.pick_again().await.unwrap().id, "a");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_set_location_resets_candidates_when_moved() {
        let provider = ScriptedPlaces::new(vec![Ok(NearbySearch::ok(vec![place(
            "a",
            Some(4.0),
        )]))]);
        let mut workflow = located(provider);
        workflow.pick_restaurant().await.unwrap();

        workflow.set_location(UserLocation {
            coordinate: Coordinate::new(40.0, -74.0).unwrap(),
            address: "Elsewhere".to_string(),
        });

        assert!(workflow.candidates().is_none());
        assert_eq!(workflow.state(), WorkflowState::HasLocation { failure: None });
    }

    #[tokio::test]
    async fn test_resolve_photo_failure_is_none() {
        let provider = ScriptedPlaces::new(vec![]);
        let workflow = DiscoveryWorkflow::with_seed(provider, 1);

        let mut candidate = place("a", Some(4.0));
        assert!(workflow.resolve_photo(&candidate, 800).await.is_none());

        candidate.photo_reference = Some("broken".to_string());
        assert!(workflow.resolve_photo(&candidate, 800).await.is_none());

        candidate.photo_reference = Some("abc".to_string());
        assert_eq!(
            workflow.resolve_photo(&candidate, 800).await.as_deref(),
            Some("https://images.example.com/abc")
        );
    }
}
