use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tutorflow_scheduling::{TimeSlots, WEEKEND_DAY};

/// One scheduled course as returned by the dashboard read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub course_id: String,
    pub subject: String,
    pub start_date: NaiveDate,
    pub session_dates: Vec<NaiveDate>,
    pub slots: TimeSlots,
}

impl CourseSummary {
    /// Display time for one session date.
    ///
    /// Resolved per-date by day-of-week, the same way the enrollment
    /// scheduler resolves slot preferences.
    pub fn session_time_on(&self, date: NaiveDate) -> NaiveTime {
        self.slots.time_for(date, WEEKEND_DAY)
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("courses request failed: {0}")]
    Network(String),

    #[error("courses endpoint returned {0}: {1}")]
    Api(u16, String),

    #[error("courses response malformed: {0}")]
    Parse(String),
}

/// Read endpoint for a student's scheduled courses (`GET {api}/courses`).
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    async fn courses(&self, token: &str) -> Result<Vec<CourseSummary>, DirectoryError>;
}

#[derive(Debug, Deserialize)]
struct CoursesResponse {
    courses: Vec<CourseSummary>,
}

pub struct HttpCourseDirectory {
    api_url: String,
    client: reqwest::Client,
}

impl HttpCourseDirectory {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CourseDirectory for HttpCourseDirectory {
    async fn courses(&self, token: &str) -> Result<Vec<CourseSummary>, DirectoryError> {
        let url = format!("{}/courses", self.api_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DirectoryError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        let body: CoursesResponse = resp
            .json()
            .await
            .map_err(|e| DirectoryError::Parse(e.to_string()))?;

        Ok(body.courses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_times_resolve_per_date() {
        let course = CourseSummary {
            course_id: "c-1".to_string(),
            subject: "Maths".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 11, 15).unwrap(),
            session_dates: vec![
                NaiveDate::from_ymd_opt(2025, 11, 15).unwrap(), // Sat
                NaiveDate::from_ymd_opt(2025, 11, 17).unwrap(), // Mon
            ],
            slots: TimeSlots::Split {
                weekday: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
                weekend: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            },
        };

        assert_eq!(
            course.session_time_on(course.session_dates[0]),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap()
        );
        assert_eq!(
            course.session_time_on(course.session_dates[1]),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap()
        );
    }

    #[test]
    fn courses_response_parses_the_wire_shape() {
        let json = r#"{
            "courses": [{
                "courseId": "c-1",
                "subject": "Maths",
                "startDate": "2025-11-15",
                "sessionDates": ["2025-11-15", "2025-11-17"],
                "slots": {"kind": "split", "weekday": "16:00:00", "weekend": "10:30:00"}
            }]
        }"#;
        let parsed: CoursesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.courses.len(), 1);
        assert_eq!(parsed.courses[0].subject, "Maths");
    }
}
