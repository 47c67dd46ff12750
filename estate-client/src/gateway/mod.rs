//! REST transport for the platform API.
//!
//! Every call goes through [`RestGateway::send`], which injects the bearer
//! token, maps transport failures to [`ApiError::Network`], turns a 401
//! into a global session clear via [`CredentialStore::invalidate`], and
//! carries server rejection messages through verbatim.

pub mod mock;

use anyhow::Context;
use async_trait::async_trait;
use estate::error::{ApiError, Result};
use estate::model::{
    AuthGrant, DepositReceipt, Investment, KycCase, KycDecision, KycStatus, KycSubmission,
    Listing, ListingDraft, MarketPurchaseReceipt, Notification, PortfolioSnapshot, Profile,
    PurchaseReceipt, SecondaryListing, StatementEntry, UserAccount, UserUpdate, WalletChallenge,
};
use estate::traits::credentials::CredentialStore;
use estate::traits::gateway::Gateway;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::config::ClientConfig;

pub struct RestGateway {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl RestGateway {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // The one error with a side effect outside the calling flow.
            self.credentials.invalidate();
            return Err(ApiError::Unauthorized);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Rejected(extract_message(&body, status)));
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::decode(e.to_string()))
    }

    /// For endpoints whose success body carries nothing we use.
    async fn send_unit(&self, request: RequestBuilder) -> Result<()> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ApiError::Rejected(extract_message(&body, status)));
        }
        Ok(())
    }
}

/// Error bodies look like `{"message": "..."}`; anything else falls back
/// to the HTTP status so the user still sees something actionable.
fn extract_message(body: &[u8], status: StatusCode) -> String {
    #[derive(Deserialize)]
    struct ServerMessage {
        message: Option<String>,
    }

    serde_json::from_slice::<ServerMessage>(body)
        .ok()
        .and_then(|m| m.message)
        .unwrap_or_else(|| format!("request failed with status {}", status))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingIdResponse {
    listing_id: String,
}

#[derive(Deserialize)]
struct KycStatusResponse {
    status: KycStatus,
}

#[async_trait]
impl Gateway for RestGateway {
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthGrant> {
        let body = json!({ "name": name, "email": email, "password": password });
        self.send(self.http.post(self.url("/auth/register")).json(&body))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        let body = json!({ "email": email, "password": password });
        self.send(self.http.post(self.url("/auth/login")).json(&body))
            .await
    }

    async fn current_profile(&self) -> Result<Profile> {
        self.send(self.http.get(self.url("/auth/me"))).await
    }

    async fn wallet_nonce(&self) -> Result<WalletChallenge> {
        self.send(self.http.get(self.url("/auth/nonce"))).await
    }

    async fn link_wallet(&self, wallet_address: &str, signature: &str) -> Result<Profile> {
        let body = json!({ "walletAddress": wallet_address, "signature": signature });
        self.send(self.http.post(self.url("/auth/wallet/link")).json(&body))
            .await
    }

    async fn unlink_wallet(&self) -> Result<Profile> {
        self.send(self.http.post(self.url("/auth/wallet/unlink")))
            .await
    }

    async fn deposit(&self, amount: f64) -> Result<DepositReceipt> {
        let body = json!({ "amount": amount });
        self.send(self.http.post(self.url("/financial/deposit")).json(&body))
            .await
    }

    async fn statement(&self) -> Result<Vec<StatementEntry>> {
        self.send(self.http.get(self.url("/financial/statement")))
            .await
    }

    async fn list_assets(&self, category: Option<&str>) -> Result<Vec<Listing>> {
        let mut request = self.http.get(self.url("/assets"));
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        self.send(request).await
    }

    async fn asset(&self, id: &str) -> Result<Listing> {
        self.send(self.http.get(self.url(&format!("/assets/{id}"))))
            .await
    }

    async fn buy_primary(&self, asset_id: &str, shares: u64) -> Result<PurchaseReceipt> {
        let body = json!({ "assetId": asset_id, "shares": shares });
        self.send(self.http.post(self.url("/investments/buy")).json(&body))
            .await
    }

    async fn portfolio(&self) -> Result<PortfolioSnapshot> {
        self.send(self.http.get(self.url("/investments/portfolio")))
            .await
    }

    async fn list_secondary(
        &self,
        asset_id: &str,
        shares: u64,
        price_per_share: f64,
    ) -> Result<String> {
        let body = json!({
            "assetId": asset_id,
            "shares": shares,
            "pricePerShare": price_per_share,
        });
        let response: ListingIdResponse = self
            .send(self.http.post(self.url("/market/list")).json(&body))
            .await?;
        Ok(response.listing_id)
    }

    async fn market_listings(&self) -> Result<Vec<SecondaryListing>> {
        self.send(self.http.get(self.url("/market"))).await
    }

    async fn buy_secondary(
        &self,
        listing_id: &str,
        shares: u64,
    ) -> Result<MarketPurchaseReceipt> {
        let body = json!({ "sharesToBuy": shares });
        self.send(
            self.http
                .post(self.url(&format!("/market/{listing_id}/buy")))
                .json(&body),
        )
        .await
    }

    async fn cancel_secondary(&self, listing_id: &str) -> Result<()> {
        self.send_unit(self.http.delete(self.url(&format!("/market/{listing_id}"))))
            .await
    }

    async fn submit_kyc(&self, submission: KycSubmission) -> Result<KycStatus> {
        let document = reqwest::multipart::Part::bytes(submission.document_bytes)
            .file_name(submission.document_file_name);
        let form = reqwest::multipart::Form::new()
            .text("fullName", submission.full_name)
            .text("dob", submission.date_of_birth)
            .text("documentType", submission.document_type.as_str())
            .text("documentNumber", submission.document_number)
            .part("document", document);

        let response: KycStatusResponse = self
            .send(self.http.post(self.url("/kyc/submit")).multipart(form))
            .await?;
        Ok(response.status)
    }

    async fn notifications(&self) -> Result<Vec<Notification>> {
        self.send(self.http.get(self.url("/notifications"))).await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.send_unit(
            self.http
                .patch(self.url(&format!("/notifications/{id}/read"))),
        )
        .await
    }

    async fn create_asset(&self, draft: &ListingDraft) -> Result<Listing> {
        self.send(self.http.post(self.url("/assets")).json(draft))
            .await
    }

    async fn update_asset(&self, id: &str, draft: &ListingDraft) -> Result<Listing> {
        self.send(
            self.http
                .put(self.url(&format!("/assets/{id}")))
                .json(draft),
        )
        .await
    }

    async fn delete_asset(&self, id: &str) -> Result<()> {
        self.send_unit(self.http.delete(self.url(&format!("/assets/{id}"))))
            .await
    }

    async fn all_investments(&self) -> Result<Vec<Investment>> {
        self.send(self.http.get(self.url("/investments"))).await
    }

    async fn pending_kyc(&self) -> Result<Vec<KycCase>> {
        self.send(self.http.get(self.url("/kyc/pending"))).await
    }

    async fn adjudicate_kyc(&self, user_id: &str, decision: &KycDecision) -> Result<()> {
        self.send_unit(
            self.http
                .put(self.url(&format!("/kyc/{user_id}/verify")))
                .json(decision),
        )
        .await
    }

    async fn all_users(&self) -> Result<Vec<UserAccount>> {
        self.send(self.http.get(self.url("/users"))).await
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<UserAccount> {
        self.send(
            self.http
                .put(self.url(&format!("/users/{id}")))
                .json(update),
        )
        .await
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        self.send_unit(self.http.delete(self.url(&format!("/users/{id}"))))
            .await
    }
}
