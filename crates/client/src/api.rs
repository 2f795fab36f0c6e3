//! Typed access to the storefront API.
//!
//! Every response is decoded as an `Envelope<T>`: a body that does not match
//! is `ClientError::Decode`, and `success: false` is `ClientError::Api`
//! carrying the server's message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use lakshmi_core::{Envelope, ProductId};

use crate::error::ClientError;
use crate::types::{Cart, Product, ProductQuery, ProductSummary, Review, Session};

/// Requests taking longer than this fail with `ClientError::Http`.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The storefront operations the client screens use.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn register(&self, name: &str, email: &str, password: &str)
    -> Result<Session, ClientError>;

    async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError>;

    /// Ask the server to mail a reset code.
    async fn request_password_reset(&self, email: &str) -> Result<(), ClientError>;

    async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        code: &str,
    ) -> Result<(), ClientError>;

    async fn list_products(&self, query: &ProductQuery)
    -> Result<Vec<ProductSummary>, ClientError>;

    async fn product(&self, id: ProductId) -> Result<Product, ClientError>;

    async fn related_products(&self, id: ProductId) -> Result<Vec<ProductSummary>, ClientError>;

    async fn add_review(
        &self,
        token: &str,
        id: ProductId,
        text: &str,
    ) -> Result<Review, ClientError>;

    async fn cart(&self, token: &str) -> Result<Cart, ClientError>;

    async fn add_to_cart(
        &self,
        token: &str,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, ClientError>;

    /// Set a line's quantity; `0` removes it.
    async fn update_cart(
        &self,
        token: &str,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, ClientError>;

    async fn remove_from_cart(
        &self,
        token: &str,
        product_id: ProductId,
        size: &str,
    ) -> Result<Cart, ClientError>;
}

/// Decode a response body as an envelope, yielding its payload.
///
/// # Errors
///
/// Returns `ClientError::Decode` if the body is not an `Envelope<T>`.
/// Returns `ClientError::Api` if the envelope reports failure.
pub fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ClientError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    envelope.into_result().map_err(ClientError::Api)
}

fn required<T>(data: Option<T>) -> Result<T, ClientError> {
    data.ok_or_else(|| ClientError::Decode("response has no data".to_owned()))
}

/// `reqwest` implementation of [`StorefrontApi`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client for the API at `base_url` (e.g. `http://localhost:4000`).
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ClientError> {
        let builder = self.client.request(method, self.url(path)?);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "API response");
        decode_envelope(&body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T, ClientError> {
        required(self.send(self.request(Method::GET, path, token)?).await?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Option<T>, ClientError> {
        self.send(self.request(Method::POST, path, token)?.json(body))
            .await
    }
}

#[async_trait]
impl StorefrontApi for HttpApi {
    #[instrument(skip(self, password))]
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let body = json!({"name": name, "email": email, "password": password});
        required(self.post("api/user/register", None, &body).await?)
    }

    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let body = json!({"email": email, "password": password});
        required(self.post("api/user/login", None, &body).await?)
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), ClientError> {
        let body = json!({"email": email});
        self.post::<Value>("api/user/forgot-password/request", None, &body)
            .await?;
        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        code: &str,
    ) -> Result<(), ClientError> {
        let body = json!({"email": email, "new_password": new_password, "code": code});
        self.post::<Value>("api/user/forgot-password", None, &body)
            .await?;
        Ok(())
    }

    async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<ProductSummary>, ClientError> {
        let mut url = self.url("api/product/list")?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        required(self.send(self.client.get(url)).await?)
    }

    async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        self.get(&format!("api/product/{id}"), None).await
    }

    async fn related_products(&self, id: ProductId) -> Result<Vec<ProductSummary>, ClientError> {
        self.get(&format!("api/product/{id}/related"), None).await
    }

    async fn add_review(
        &self,
        token: &str,
        id: ProductId,
        text: &str,
    ) -> Result<Review, ClientError> {
        let body = json!({"review": text});
        required(
            self.post(&format!("api/product/{id}/review/add"), Some(token), &body)
                .await?,
        )
    }

    async fn cart(&self, token: &str) -> Result<Cart, ClientError> {
        self.get("api/cart/get", Some(token)).await
    }

    async fn add_to_cart(
        &self,
        token: &str,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, ClientError> {
        let body = json!({"product_id": product_id, "size": size, "quantity": quantity});
        required(self.post("api/cart/add", Some(token), &body).await?)
    }

    async fn update_cart(
        &self,
        token: &str,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, ClientError> {
        let body = json!({"product_id": product_id, "size": size, "quantity": quantity});
        required(self.post("api/cart/update", Some(token), &body).await?)
    }

    async fn remove_from_cart(
        &self,
        token: &str,
        product_id: ProductId,
        size: &str,
    ) -> Result<Cart, ClientError> {
        let body = json!({"product_id": product_id, "size": size});
        required(self.post("api/cart/remove", Some(token), &body).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_and_failure() {
        let data: Option<Vec<u32>> =
            decode_envelope(br#"{"success":true,"data":[1,2]}"#).unwrap();
        assert_eq!(data, Some(vec![1, 2]));

        let err = decode_envelope::<Vec<u32>>(br#"{"success":false,"message":"Your cart is empty"}"#)
            .unwrap_err();
        assert!(matches!(err, ClientError::Api(ref m) if m == "Your cart is empty"));
    }

    #[test]
    fn test_decode_malformed_is_typed() {
        let err = decode_envelope::<u32>(b"<html>502</html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));

        let err = decode_envelope::<u32>(br#"{"success":true,"data":"seven"}"#).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_base_url_keeps_prefix() {
        let api = HttpApi::new("http://localhost:4000/shop").unwrap();
        assert_eq!(
            api.url("api/cart/get").unwrap().as_str(),
            "http://localhost:4000/shop/api/cart/get"
        );

        let api = HttpApi::new("http://localhost:4000").unwrap();
        assert_eq!(
            api.url("/api/product/3").unwrap().as_str(),
            "http://localhost:4000/api/product/3"
        );

        assert!(matches!(
            HttpApi::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
