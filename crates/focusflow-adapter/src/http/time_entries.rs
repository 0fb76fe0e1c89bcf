/*
[INPUT]:  Time entry bodies and bearer authentication
[OUTPUT]: Time entry records (list, create, update)
[POS]:    HTTP layer - time tracking endpoints (require auth)
[UPDATE]: When adding new time entry endpoints or filters
*/

use chrono::NaiveDate;
use reqwest::Method;

use crate::http::{FocusflowClient, Result};
use crate::types::{NewTimeEntry, TimeEntry, TimeEntryPatch};

impl FocusflowClient {
    /// List every time entry visible to the user
    ///
    /// GET /api/time-entries
    pub async fn list_time_entries(&self) -> Result<Vec<TimeEntry>> {
        let builder = self.authed_request(Method::GET, "api/time-entries")?;
        self.send_json(builder).await
    }

    /// List time entries recorded on a calendar date
    ///
    /// GET /api/time-entries?date={YYYY-MM-DD}
    pub async fn list_time_entries_on(&self, date: NaiveDate) -> Result<Vec<TimeEntry>> {
        let endpoint = format!("api/time-entries?date={}", date.format("%Y-%m-%d"));
        let builder = self.authed_request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }

    /// Create a time entry
    ///
    /// POST /api/time-entries
    pub async fn create_time_entry(&self, entry: &NewTimeEntry) -> Result<TimeEntry> {
        let builder = self
            .authed_request(Method::POST, "api/time-entries")?
            .json(entry);
        self.send_json(builder).await
    }

    /// Apply a partial update to a time entry
    ///
    /// PATCH /api/time-entries/{id}
    pub async fn update_time_entry(&self, id: &str, patch: &TimeEntryPatch) -> Result<TimeEntry> {
        let endpoint = format!("api/time-entries/{}", id);
        let builder = self.authed_request(Method::PATCH, &endpoint)?.json(patch);
        self.send_json(builder).await
    }
}
