use crate::error::PredictError;
use crate::resolver::Covariates;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// 0 = Monday .. 6 = Sunday
    #[serde(deserialize_with = "whole_number")]
    pub day_of_week: i32,
    #[serde(deserialize_with = "whole_number")]
    pub hour_of_day: i32,
    /// Estimated share of business rides, 0.0 to 1.0
    pub business_ratio: f64,
}

impl PredictionRequest {
    /// Range-check every field and return the model covariates.
    pub fn validate(&self) -> Result<Covariates, PredictError> {
        check_coordinates(self.latitude, self.longitude)?;
        let day_of_week = check_day(self.day_of_week)?;
        let hour_of_day = check_hour(self.hour_of_day)?;
        if !(0.0..=1.0).contains(&self.business_ratio) {
            return Err(PredictError::InvalidRequest(format!(
                "business_ratio must be between 0.0 and 1.0, got {}",
                self.business_ratio
            )));
        }
        Ok(Covariates {
            day_of_week,
            hour_of_day,
            business_ratio: self.business_ratio,
        })
    }
}

/// Query of `GET /heatmap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapQuery {
    pub lat: f64,
    pub lon: f64,
    pub day: i32,
    pub hour: i32,
}

impl HeatmapQuery {
    /// Range-check and return `(day_of_week, hour_of_day)`.
    pub fn validate(&self) -> Result<(u8, u8), PredictError> {
        check_coordinates(self.lat, self.lon)?;
        Ok((check_day(self.day)?, check_hour(self.hour)?))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WholeNumber {
    Int(i64),
    Float(f64),
}

/// Integer field that also takes an integral float such as `2.0`.
fn whole_number<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    match WholeNumber::deserialize(deserializer)? {
        WholeNumber::Int(v) => {
            i32::try_from(v).map_err(|_| D::Error::custom(format!("integer {} is out of range", v)))
        }
        WholeNumber::Float(v) if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 => Ok(v as i32),
        WholeNumber::Float(v) => Err(D::Error::custom(format!("expected a whole number, got {}", v))),
    }
}

fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), PredictError> {
    if latitude.is_finite() && longitude.is_finite() {
        Ok(())
    } else {
        Err(PredictError::InvalidCoordinate { latitude, longitude })
    }
}

fn check_day(day: i32) -> Result<u8, PredictError> {
    match u8::try_from(day) {
        Ok(d) if d <= 6 => Ok(d),
        _ => Err(PredictError::InvalidRequest(format!(
            "day_of_week must be between 0 (Monday) and 6 (Sunday), got {}",
            day
        ))),
    }
}

fn check_hour(hour: i32) -> Result<u8, PredictError> {
    match u8::try_from(hour) {
        Ok(h) if h <= 23 => Ok(h),
        _ => Err(PredictError::InvalidRequest(format!(
            "hour_of_day must be between 0 and 23, got {}",
            hour
        ))),
    }
}
