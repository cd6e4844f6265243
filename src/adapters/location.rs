use crate::domain::model::Coordinate;
use crate::domain::ports::LocationProvider;
use crate::utils::error::{LocationFailure, PickerError, Result};
use async_trait::async_trait;

/// 由命令列或設定檔提供的固定座標
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinate> {
        Ok(self.0)
    }
}

/// 用戶端（瀏覽器）回報的定位結果
#[derive(Debug, Clone, Copy)]
pub enum ReportedLocation {
    Position(Coordinate),
    Failed(LocationFailure),
}

impl ReportedLocation {
    pub fn from_error_code(code: i64) -> Self {
        ReportedLocation::Failed(LocationFailure::from_code(code))
    }
}

#[async_trait]
impl LocationProvider for ReportedLocation {
    async fn current_position(&self) -> Result<Coordinate> {
        match self {
            ReportedLocation::Position(coordinate) => Ok(*coordinate),
            ReportedLocation::Failed(failure) => Err(PickerError::location(*failure)),
        }
    }
}
