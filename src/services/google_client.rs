//! Google Business Profile API client.
//!
//! Wraps the three Business Profile API surfaces:
//! - Account Management v1 (account lookup)
//! - Business Information v1 (location listing)
//! - My Business v4 (reviews and review replies)

use crate::error::AppError;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Account Management API base URL.
const ACCOUNT_MGMT_BASE: &str = "https://mybusinessaccountmanagement.googleapis.com/v1";

/// Business Information API base URL.
const BUSINESS_INFO_BASE: &str = "https://mybusinessbusinessinformation.googleapis.com/v1";

/// My Business v4 API base URL (reviews and replies).
const MY_BUSINESS_BASE: &str = "https://mybusiness.googleapis.com/v4";

/// Google Business Profile API client configuration.
#[derive(Debug, Clone)]
pub struct GoogleClientConfig {
    /// OAuth access token for the connected account.
    pub access_token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Google Business Profile API client.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    client: Client,
}

/// Account resource from the Account Management API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAccount {
    /// Resource name, e.g. `accounts/123456789`.
    pub name: String,

    /// Human-readable account name.
    #[serde(default)]
    pub account_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsListResponse {
    #[serde(default)]
    accounts: Vec<GoogleAccount>,
}

/// Structured storefront address on a location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
}

impl PostalAddress {
    /// Flatten the structured address into a single display string.
    pub fn flatten(&self) -> Option<String> {
        let mut parts: Vec<String> = self.address_lines.clone();
        if let Some(locality) = &self.locality {
            parts.push(locality.clone());
        }
        if let Some(postal_code) = &self.postal_code {
            parts.push(postal_code.clone());
        }
        if let Some(region_code) = &self.region_code {
            parts.push(region_code.clone());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Location resource from the Business Information API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLocation {
    /// Resource name, e.g. `locations/987654321`.
    pub name: String,

    /// Display title.
    #[serde(default)]
    pub title: Option<String>,

    /// Structured storefront address.
    #[serde(default)]
    pub storefront_address: Option<PostalAddress>,
}

impl GoogleLocation {
    /// Trailing segment of the resource name (`locations/{id}` -> `{id}`).
    pub fn location_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationsListResponse {
    #[serde(default)]
    locations: Vec<GoogleLocation>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Reviewer info attached to a review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReviewer {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Published reply attached to a review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReviewReply {
    #[serde(default)]
    pub comment: Option<String>,

    /// RFC 3339 timestamp of the last reply update.
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Review resource from the My Business v4 API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReview {
    /// Google review ID.
    pub review_id: String,

    #[serde(default)]
    pub reviewer: Option<GoogleReviewer>,

    /// Star rating as a v4 enum string: `ONE` .. `FIVE`.
    #[serde(default)]
    pub star_rating: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,

    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub create_time: Option<String>,

    #[serde(default)]
    pub review_reply: Option<GoogleReviewReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsListResponse {
    #[serde(default)]
    reviews: Vec<GoogleReview>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Map a v4 `starRating` enum string to its numeric value.
pub fn star_rating_value(star_rating: &str) -> Option<i64> {
    match star_rating {
        "ONE" => Some(1),
        "TWO" => Some(2),
        "THREE" => Some(3),
        "FOUR" => Some(4),
        "FIVE" => Some(5),
        _ => None,
    }
}

impl GoogleClient {
    /// Create a new client authenticated with a Bearer access token.
    pub fn new(config: GoogleClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();

        let token_value =
            header::HeaderValue::from_str(&format!("Bearer {}", config.access_token))
                .map_err(|_| AppError::authentication("Invalid access token format"))?;
        headers.insert(header::AUTHORIZATION, token_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Handle API response errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)))
        } else if status == StatusCode::UNAUTHORIZED {
            // 401 Unauthorized - token is expired or revoked
            Err(AppError::authentication_expired(
                "Google access token expired or revoked. Please re-authenticate.",
            ))
        } else {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            // Google returns errors as {"error": {"message": "...", ...}}
            let body_message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(String::from)
                });

            let message = match (status, &body_message) {
                (StatusCode::FORBIDDEN, _) => "Access denied".to_string(),
                (StatusCode::NOT_FOUND, _) => "Resource not found".to_string(),
                (StatusCode::TOO_MANY_REQUESTS, _) => "Rate limit exceeded".to_string(),
                (_, Some(msg)) => msg.clone(),
                _ => format!("Request failed ({}): {}", status_code, body),
            };

            Err(AppError::google_api_full(&message, status_code, endpoint))
        }
    }

    /// List the Business Profile accounts visible to the token.
    pub async fn list_accounts(&self) -> Result<Vec<GoogleAccount>, AppError> {
        let endpoint = "/accounts";
        let url = format!("{}{}", ACCOUNT_MGMT_BASE, endpoint);
        let response = self.client.get(&url).send().await?;
        let parsed: AccountsListResponse = self.handle_response(response, endpoint).await?;
        Ok(parsed.accounts)
    }

    /// Resource name of the first Business Profile account (`accounts/{id}`).
    pub async fn primary_account_name(&self) -> Result<String, AppError> {
        let accounts = self.list_accounts().await?;
        accounts
            .into_iter()
            .next()
            .map(|a| a.name)
            .ok_or_else(|| AppError::not_found("Google Business Profile account"))
    }

    /// List all locations under an account, following pagination.
    pub async fn list_locations(
        &self,
        account_name: &str,
    ) -> Result<Vec<GoogleLocation>, AppError> {
        let endpoint = format!("/{}/locations", account_name);
        let url = format!("{}{}", BUSINESS_INFO_BASE, endpoint);

        let mut all_locations = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[
                ("pageSize", "100"),
                ("readMask", "name,title,storefrontAddress"),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let parsed: LocationsListResponse = self.handle_response(response, &endpoint).await?;

            all_locations.extend(parsed.locations);

            match parsed.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all_locations)
    }

    /// List all reviews for a location, following pagination.
    ///
    /// `account_name` is `accounts/{id}`; `location_id` is the bare
    /// trailing segment of the location resource name.
    pub async fn list_reviews(
        &self,
        account_name: &str,
        location_id: &str,
    ) -> Result<Vec<GoogleReview>, AppError> {
        let endpoint = format!("/{}/locations/{}/reviews", account_name, location_id);
        let url = format!("{}{}", MY_BUSINESS_BASE, endpoint);

        let mut all_reviews = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("pageSize", "50")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let parsed: ReviewsListResponse = self.handle_response(response, &endpoint).await?;

            all_reviews.extend(parsed.reviews);

            match parsed.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all_reviews)
    }

    /// Attach (or overwrite) the owner reply on a review.
    pub async fn update_reply(
        &self,
        account_name: &str,
        location_id: &str,
        review_id: &str,
        text: &str,
    ) -> Result<GoogleReviewReply, AppError> {
        let endpoint = format!(
            "/{}/locations/{}/reviews/{}/reply",
            account_name, location_id, review_id
        );
        let url = format!("{}{}", MY_BUSINESS_BASE, endpoint);

        let response = self
            .client
            .put(&url)
            .json(&serde_json::json!({ "comment": text }))
            .send()
            .await?;

        self.handle_response(response, &endpoint).await
    }

    /// Delete the owner reply from a review.
    pub async fn delete_reply(
        &self,
        account_name: &str,
        location_id: &str,
        review_id: &str,
    ) -> Result<(), AppError> {
        let endpoint = format!(
            "/{}/locations/{}/reviews/{}/reply",
            account_name, location_id, review_id
        );
        let url = format!("{}{}", MY_BUSINESS_BASE, endpoint);

        let response = self.client.delete(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            // Reuse the error mapping; the success payload is discarded
            self.handle_response::<serde_json::Value>(response, &endpoint)
                .await
                .map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_rating_mapping() {
        assert_eq!(star_rating_value("ONE"), Some(1));
        assert_eq!(star_rating_value("FIVE"), Some(5));
        assert_eq!(star_rating_value("STAR_RATING_UNSPECIFIED"), None);
        assert_eq!(star_rating_value("six"), None);
    }

    #[test]
    fn test_location_id_extraction() {
        let location = GoogleLocation {
            name: "locations/987654321".into(),
            title: None,
            storefront_address: None,
        };
        assert_eq!(location.location_id(), "987654321");
    }

    #[test]
    fn test_address_flattening() {
        let address = PostalAddress {
            address_lines: vec!["12 Rue de la Paix".into()],
            locality: Some("Paris".into()),
            postal_code: Some("75002".into()),
            region_code: Some("FR".into()),
        };
        assert_eq!(
            address.flatten().unwrap(),
            "12 Rue de la Paix, Paris, 75002, FR"
        );

        assert_eq!(PostalAddress::default().flatten(), None);
    }

    #[test]
    fn test_review_deserialization() {
        let json = r#"{
            "reviewId": "rev-1",
            "reviewer": {"displayName": "Alice"},
            "starRating": "FIVE",
            "comment": "Great!",
            "createTime": "2026-01-15T10:00:00Z",
            "reviewReply": {"comment": "Thanks!", "updateTime": "2026-01-16T08:00:00Z"}
        }"#;
        let review: GoogleReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.review_id, "rev-1");
        assert_eq!(review.reviewer.unwrap().display_name.unwrap(), "Alice");
        assert_eq!(star_rating_value(review.star_rating.as_deref().unwrap()), Some(5));
        assert_eq!(review.review_reply.unwrap().comment.unwrap(), "Thanks!");
    }
}
