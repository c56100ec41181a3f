//! Amazon S3 (and S3-compatible) backend.
//!
//! Object traffic goes through `object_store`'s S3 client with path-style
//! addressing. The three bucket-level calls `object_store` lacks are sent as
//! AWS Signature V4 signed requests with reqwest.

use super::{Backend, ContainerMeta};
use crate::{CloudError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use reqwest::{Client, Method};
use sha2::{Digest, Sha256};
use siphon_core::PoolConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// S3 backend built from a `PoolConfig`
pub struct S3Backend {
    region: String,
    access_key_id: String,
    secret_access_key: String,
    endpoint: Option<String>,
    allow_http: bool,
    client: Client,
}

impl S3Backend {
    /// Build from the recognized config keys plus the `endpoint` and
    /// `allow_http` extensions
    pub fn new(config: &PoolConfig) -> Result<Self> {
        let endpoint = config
            .get("endpoint")
            .map(|ep| ep.trim_end_matches('/').to_string());
        if let Some(ep) = &endpoint {
            Url::parse(ep)
                .map_err(|e| CloudError::Config(format!("invalid endpoint {}: {}", ep, e)))?;
        }

        Ok(Self {
            region: config.region.clone(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            endpoint,
            allow_http: config.get("allow_http") == Some("true"),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()?,
        })
    }

    fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(ep) => ep.clone(),
            None => format!("https://s3.{}.amazonaws.com", self.region),
        }
    }

    /// Service URL, or the path-style bucket URL when `bucket` is given
    fn service_url(&self, bucket: Option<&str>) -> Result<Url> {
        let base = self.endpoint();
        let url = match bucket {
            Some(bucket) => format!("{}/{}", base, bucket),
            None => format!("{}/", base),
        };
        Url::parse(&url).map_err(|e| CloudError::Config(format!("invalid URL {}: {}", url, e)))
    }

    /// Compute the Authorization header for a request
    fn sign(
        &self,
        method: &str,
        path: &str,
        headers: &BTreeMap<String, String>,
        body_hash: &str,
        date_time: &str,
        date: &str,
    ) -> String {
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

        // Bucket-level calls carry no query string
        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method, path, canonical_headers, signed_headers, body_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            date_time,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = derive_signing_key(&self.secret_access_key, date, &self.region, "s3");
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!(
            "AWS4-HMAC-SHA256 Credential={}/{},SignedHeaders={},Signature={}",
            self.access_key_id, credential_scope, signed_headers, signature
        )
    }

    /// Send a signed request and return the response body
    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        bucket: Option<&str>,
        body: Bytes,
    ) -> Result<String> {
        let url = self.service_url(bucket)?;
        let now = Utc::now();
        let date_time = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let body_hash = hex::encode(Sha256::digest(&body));

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), host_header(&url));
        headers.insert("x-amz-content-sha256".to_string(), body_hash.clone());
        headers.insert("x-amz-date".to_string(), date_time.clone());

        let auth = self.sign(
            method.as_str(),
            url.path(),
            &headers,
            &body_hash,
            &date_time,
            &date,
        );

        debug!("S3 {} {}", operation, url);
        let resp = self
            .client
            .request(method, url)
            .header("x-amz-date", &date_time)
            .header("x-amz-content-sha256", &body_hash)
            .header("Authorization", auth)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CloudError::S3Response {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

impl fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint())
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

#[async_trait]
impl Backend for S3Backend {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn list_containers(&self) -> Result<Vec<ContainerMeta>> {
        let body = self.send("ListBuckets", Method::GET, None, Bytes::new()).await?;
        Ok(parse_bucket_list(&body))
    }

    async fn create_container(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CloudError::InvalidPath("empty bucket name".to_string()));
        }

        // us-east-1 rejects an explicit location constraint
        let body = if self.region == "us-east-1" {
            Bytes::new()
        } else {
            Bytes::from(format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <LocationConstraint>{}</LocationConstraint>\
                 </CreateBucketConfiguration>",
                self.region
            ))
        };

        self.send("CreateBucket", Method::PUT, Some(name), body).await?;
        info!("Created bucket {}", name);
        Ok(())
    }

    async fn delete_container(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CloudError::InvalidPath("empty bucket name".to_string()));
        }
        self.send("DeleteBucket", Method::DELETE, Some(name), Bytes::new())
            .await?;
        info!("Deleted bucket {}", name);
        Ok(())
    }

    fn container(&self, name: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut builder = AmazonS3Builder::new()
            .with_region(&self.region)
            .with_bucket_name(name)
            .with_virtual_hosted_style_request(false)
            .with_allow_http(self.allow_http);

        if !self.access_key_id.is_empty() {
            builder = builder
                .with_access_key_id(&self.access_key_id)
                .with_secret_access_key(&self.secret_access_key);
        }
        if let Some(ep) = &self.endpoint {
            builder = builder.with_endpoint(ep);
        }

        Ok(Arc::new(builder.build()?))
    }
}

fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let key = format!("AWS4{}", secret);
    let k_date = hmac_sha256(key.as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key length ok");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// `host[:port]` exactly as reqwest will send it
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Extract buckets from a ListAllMyBucketsResult document
fn parse_bucket_list(xml: &str) -> Vec<ContainerMeta> {
    let mut buckets = Vec::new();
    let mut remaining = xml;
    while let Some(start) = remaining.find("<Bucket>") {
        remaining = &remaining[start + "<Bucket>".len()..];
        let end = remaining.find("</Bucket>").unwrap_or(remaining.len());
        let entry = &remaining[..end];

        if let Some(name) = tag_text(entry, "Name") {
            let created = tag_text(entry, "CreationDate")
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc));
            buckets.push(ContainerMeta {
                name: name.to_string(),
                created,
            });
        }
        remaining = &remaining[end..];
    }
    buckets
}

fn tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let len = xml[start..].find(&close)?;
    Some(&xml[start..start + len])
}
