//! REST helpers for the hosted row store (PostgREST conventions).

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde_json::json;

use super::{
    RiderBackend,
    models::{NewWithdrawal, Profile, TransactionKind, TransactionRow, TransactionStatus, TripRow},
};
use crate::config::BackendCfg;

/// Authenticated client for `{url}/rest/v1`.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    /// Project URL without a trailing slash.
    base_url: String,
    /// Public key sent as `apikey`.
    anon_key: String,
    /// Bearer token; the anon key when the rider token is not set.
    bearer: String,
}

impl BackendClient {
    pub fn new(cfg: &BackendCfg) -> Self {
        let bearer = if cfg.access_token.trim().is_empty() {
            cfg.anon_key.clone()
        } else {
            cfg.access_token.trim().to_string()
        };
        Self {
            http: Client::new(),
            base_url: cfg.url.trim().trim_end_matches('/').to_string(),
            anon_key: cfg.anon_key.clone(),
            bearer,
        }
    }

    /// Endpoint for a table.
    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Attach the key headers every request needs.
    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.anon_key).bearer_auth(&self.bearer)
    }
}

#[async_trait]
impl RiderBackend for BackendClient {
    async fn fetch_profile(&self, rider_id: &str) -> Result<Option<Profile>> {
        let url = format!(
            "{}?select=*&id=eq.{}",
            self.table_url("profiles"),
            urlencoding::encode(rider_id)
        );
        let rows = self
            .authed(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Profile>>()
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn set_online(&self, rider_id: &str, online: bool) -> Result<()> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url("profiles"),
            urlencoding::encode(rider_id)
        );
        self.authed(self.http.patch(url))
            .json(&json!({ "is_online": online }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch_pending_trips(&self) -> Result<Vec<TripRow>> {
        let url = format!(
            "{}?select=*&status=eq.pending&order=created_at.asc",
            self.table_url("trips")
        );
        let rows = self
            .authed(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<TripRow>>()
            .await?;
        Ok(rows)
    }

    async fn accept_trip(&self, trip_id: &str, rider_id: &str) -> Result<bool> {
        // Conditional update: only a still-pending row is claimed.
        let url = format!(
            "{}?id=eq.{}&status=eq.pending",
            self.table_url("trips"),
            urlencoding::encode(trip_id)
        );
        let rows = self
            .authed(self.http.patch(url))
            .header("Prefer", "return=representation")
            .json(&json!({
                "status": "active",
                "user_id": rider_id,
                "pickup_time": Utc::now(),
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<TripRow>>()
            .await?;
        Ok(!rows.is_empty())
    }

    async fn complete_trip(
        &self,
        trip_id: &str,
        rider_id: &str,
        drop_location: Option<&str>,
    ) -> Result<()> {
        // Only the rider's own active row may be closed.
        let url = format!(
            "{}?id=eq.{}&status=eq.active&user_id=eq.{}",
            self.table_url("trips"),
            urlencoding::encode(trip_id),
            urlencoding::encode(rider_id)
        );
        let rows = self
            .authed(self.http.patch(url))
            .header("Prefer", "return=representation")
            .json(&json!({
                "status": "completed",
                "completed_at": Utc::now(),
                "drop_location": drop_location,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<TripRow>>()
            .await?;
        if rows.is_empty() {
            bail!("trip {trip_id} is not active for rider {rider_id}");
        }
        Ok(())
    }

    async fn fetch_trips(&self, rider_id: &str) -> Result<Vec<TripRow>> {
        let url = format!(
            "{}?select=*&user_id=eq.{}&order=created_at.desc",
            self.table_url("trips"),
            urlencoding::encode(rider_id)
        );
        let rows = self
            .authed(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<TripRow>>()
            .await?;
        Ok(rows)
    }

    async fn fetch_transactions(&self, rider_id: &str) -> Result<Vec<TransactionRow>> {
        let url = format!(
            "{}?select=*&user_id=eq.{}&order=created_at.desc",
            self.table_url("transactions"),
            urlencoding::encode(rider_id)
        );
        let rows = self
            .authed(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<TransactionRow>>()
            .await?;
        Ok(rows)
    }

    async fn record_withdrawal(
        &self,
        rider_id: &str,
        amount: f64,
        momo_number: &str,
    ) -> Result<()> {
        let body = NewWithdrawal {
            user_id: rider_id,
            kind: TransactionKind::Withdrawal,
            amount,
            description: format!("Withdrawal to MoMo {momo_number}"),
            status: TransactionStatus::Pending,
        };
        self.authed(self.http.post(self.table_url("transactions")))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: &str) -> BackendClient {
        BackendClient::new(&BackendCfg {
            url: format!("{}/", server.uri()),
            anon_key: "anon-key".into(),
            access_token: token.into(),
        })
    }

    fn trip_json(id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "customer_name": "Kwame Mensah",
            "pickup_location": "Osu Oxford Street, Accra",
            "fare": 25.0,
            "status": status,
            "created_at": "2024-01-15T14:30:00+00:00",
            "pickup_lat": 5.5557,
            "pickup_lng": -0.1969
        })
    }

    #[tokio::test]
    async fn test_fetch_trips_sends_keys_and_rider_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/trips"))
            .and(query_param("user_id", "eq.rider-1"))
            .and(query_param("order", "created_at.desc"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer rider-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([trip_json("t1", "completed")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rows = client_for(&server, "rider-token").fetch_trips("rider-1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "t1");
    }

    #[tokio::test]
    async fn test_bearer_falls_back_to_anon_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let profile = client_for(&server, "").fetch_profile("rider-1").await.unwrap();
        assert_eq!(profile, None);
    }

    #[tokio::test]
    async fn test_accept_reports_trip_taken_by_another_rider() {
        // 空の結果は他のライダーが先に受諾したことを意味する。
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/trips"))
            .and(query_param("id", "eq.t1"))
            .and(query_param("status", "eq.pending"))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!({ "status": "active", "user_id": "rider-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let won = client_for(&server, "t").accept_trip("t1", "rider-1").await.unwrap();
        assert!(!won);
    }

    #[tokio::test]
    async fn test_accept_succeeds_when_row_returned() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/trips"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([trip_json("t1", "active")])),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server, "t").accept_trip("t1", "rider-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_accept_server_error_is_an_error_not_a_claim() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/trips"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server, "t").accept_trip("t1", "rider-1").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_completion_is_scoped_to_riders_active_trip() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/trips"))
            .and(query_param("id", "eq.t1"))
            .and(query_param("status", "eq.active"))
            .and(query_param("user_id", "eq.rider-1"))
            .and(body_partial_json(json!({
                "status": "completed",
                "drop_location": "Kpone Landfill Site"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([trip_json("t1", "completed")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server, "t")
            .complete_trip("t1", "rider-1", Some("Kpone Landfill Site"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_completion_of_unclaimed_trip_fails() {
        // 他のライダーのトリップや未受諾のトリップは更新されない。
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/trips"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = client_for(&server, "t")
            .complete_trip("t1", "rider-1", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not active"));
    }

    #[tokio::test]
    async fn test_withdrawal_posts_pending_transaction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/transactions"))
            .and(body_partial_json(json!({
                "type": "withdrawal",
                "status": "pending",
                "amount": 50.0,
                "user_id": "rider-1"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server, "t")
            .record_withdrawal("rider-1", 50.0, "0501234567")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_server_error_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/trips"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server, "t").fetch_pending_trips().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
