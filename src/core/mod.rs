pub mod filter;
pub mod locate;
pub mod selection;
pub mod workflow;

pub use crate::domain::model::{CandidateSet, Coordinate, PlaceCandidate, SearchRadius, UserLocation};
pub use crate::domain::ports::{ConfigProvider, Geocoder, LocationProvider, PlacesProvider};
pub use crate::utils::error::Result;
pub use workflow::{DiscoveryWorkflow, WorkflowSnapshot, WorkflowState};
