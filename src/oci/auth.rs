//! OCI Authentication
//!
//! Requests are authorized by a [`RequestSigner`]. The bundled
//! [`SecurityTokenSigner`] signs requests for the session created by
//! `oci session authenticate`: the security token is the key id and the
//! session private key signs the `date`, `(request-target)` and `host`
//! headers (OCI HTTP signature, `rsa-sha256`).
//!
//! The token is cached for a bounded time so a session refreshed with
//! `oci session refresh` is picked up during long runs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION, DATE};
use reqwest::{Method, Request};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

/// How long a token read from disk is reused before the file is read again
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Headers covered by the signature, in signing order
const SIGNED_HEADERS: &str = "date (request-target) host";

/// Resolves the tenancy and authorizes outgoing requests
#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// Tenancy the credentials belong to
    fn tenancy_id(&self) -> &str;

    /// Attach authorization headers to a fully built request
    async fn authorize(&self, request: &mut Request) -> Result<()>;
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(token: String) -> Self {
        Self {
            token,
            expires_at: Instant::now() + TOKEN_CACHE_TTL,
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Session security token plus the session private key
#[derive(Clone)]
pub struct SecurityTokenSigner {
    tenancy_id: String,
    token_file: PathBuf,
    private_key: Arc<RsaPrivateKey>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl SecurityTokenSigner {
    /// Load a session. The tenancy is taken from the token's `tenant` claim.
    pub fn new(token_file: &Path, key_file: &Path) -> Result<Self> {
        let token = read_token(token_file)?;
        let tenancy_id = token_tenancy(&token).with_context(|| {
            format!("Security token {:?} carries no tenant claim", token_file)
        })?;
        let private_key = load_private_key(key_file)?;

        Ok(Self {
            tenancy_id,
            token_file: token_file.to_path_buf(),
            private_key: Arc::new(private_key),
            token_cache: Arc::new(RwLock::new(Some(CachedToken::new(token)))),
        })
    }

    /// Get the token, re-reading the file once the cached copy expires
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached security token expired, reloading");
            }
        }

        let content = tokio::fs::read_to_string(&self.token_file)
            .await
            .with_context(|| format!("Failed to read security token {:?}", self.token_file))?;
        let token = content.trim().to_string();
        if token.is_empty() {
            anyhow::bail!("Security token file {:?} is empty", self.token_file);
        }

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken::new(token.clone()));
        }

        Ok(token)
    }

    /// Base64 RSA-SHA256 signature of `data`
    fn sign(&self, data: &str) -> Result<String> {
        let digest = Sha256::digest(data.as_bytes());
        let signature = self
            .private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .context("Failed to sign request")?;
        Ok(STANDARD.encode(signature))
    }
}

#[async_trait]
impl RequestSigner for SecurityTokenSigner {
    fn tenancy_id(&self) -> &str {
        &self.tenancy_id
    }

    async fn authorize(&self, request: &mut Request) -> Result<()> {
        let token = self.get_token().await?;
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let signature = self.sign(&signing_string(request.method(), request.url(), &date)?)?;

        let authorization = format!(
            r#"Signature version="1",keyId="ST${}",algorithm="rsa-sha256",headers="{}",signature="{}""#,
            token, SIGNED_HEADERS, signature
        );

        let headers = request.headers_mut();
        headers.insert(DATE, HeaderValue::from_str(&date)?);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);
        Ok(())
    }
}

/// The text covered by the signature, one `name: value` line per header
pub fn signing_string(method: &Method, url: &Url, date: &str) -> Result<String> {
    let host = url.host_str().context("Request URL has no host")?;
    let host = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    Ok(format!(
        "date: {}\n(request-target): {} {}\nhost: {}",
        date,
        method.as_str().to_ascii_lowercase(),
        target,
        host
    ))
}

fn read_token(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read security token {:?}", path))?;
    let token = content.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("Security token file {:?} is empty", path);
    }
    Ok(token)
}

/// `tenant` claim of a JWT security token
pub fn token_tenancy(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims
        .get("tenant")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

/// Session key in PKCS#8 or PKCS#1 PEM form
fn load_private_key(path: &Path) -> Result<RsaPrivateKey> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session key {:?}", path))?;
    RsaPrivateKey::from_pkcs8_pem(&pem)
        .ok()
        .or_else(|| RsaPrivateKey::from_pkcs1_pem(&pem).ok())
        .with_context(|| format!("Session key {:?} is not an unencrypted RSA PEM key", path))
}

fn session_file(name: &str) -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".oci")
            .join("sessions")
            .join("DEFAULT")
            .join(name)
    })
}

/// Default token location used by `oci session authenticate`
pub fn default_token_file() -> Option<PathBuf> {
    session_file("token")
}

/// Default session private key location used by `oci session authenticate`
pub fn default_key_file() -> Option<PathBuf> {
    session_file("oci_api_key.pem")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY_PEM: &str = include_str!("../../tests/fixtures/session_key.pem");
    const TENANCY: &str = "ocid1.tenancy.oc1..t";

    fn jwt(claims: Value) -> String {
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    /// Session directory with a token for `TENANCY` and the fixture key
    fn session(token: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let token_file = dir.path().join("token");
        let key_file = dir.path().join("oci_api_key.pem");
        std::fs::write(&token_file, format!("{}\n", token)).unwrap();
        std::fs::write(&key_file, KEY_PEM).unwrap();
        (dir, token_file, key_file)
    }

    #[test]
    fn test_tenancy_comes_from_token_claim() {
        let token = jwt(json!({"tenant": TENANCY, "sub": "ocid1.user.oc1..u"}));
        assert_eq!(token_tenancy(&token).as_deref(), Some(TENANCY));

        let (_dir, token_file, key_file) = session(&token);
        let signer = SecurityTokenSigner::new(&token_file, &key_file).unwrap();
        assert_eq!(signer.tenancy_id(), TENANCY);
    }

    #[test]
    fn test_token_without_tenant_is_rejected() {
        assert!(token_tenancy("not-a-jwt").is_none());
        let (_dir, token_file, key_file) = session(&jwt(json!({"sub": "u"})));
        assert!(SecurityTokenSigner::new(&token_file, &key_file).is_err());
    }

    #[test]
    fn test_missing_files_are_rejected() {
        let (_dir, token_file, key_file) = session(&jwt(json!({"tenant": TENANCY})));
        assert!(SecurityTokenSigner::new(Path::new("/nonexistent/token"), &key_file).is_err());
        assert!(SecurityTokenSigner::new(&token_file, Path::new("/nonexistent/key.pem")).is_err());
    }

    #[tokio::test]
    async fn test_cached_token_survives_file_change() {
        let first = jwt(json!({"tenant": TENANCY, "jti": "1"}));
        let (_dir, token_file, key_file) = session(&first);
        let signer = SecurityTokenSigner::new(&token_file, &key_file).unwrap();

        std::fs::write(&token_file, jwt(json!({"tenant": TENANCY, "jti": "2"}))).unwrap();
        assert_eq!(signer.get_token().await.unwrap(), first);
    }

    #[test]
    fn test_signing_string_layout() {
        let url = Url::parse(
            "https://iaas.us-ashburn-1.oraclecloud.com/20160918/instances?compartmentId=c1&page=p2",
        )
        .unwrap();
        let text = signing_string(&Method::GET, &url, "Mon, 15 Jan 2024 10:30:00 GMT").unwrap();
        assert_eq!(
            text,
            "date: Mon, 15 Jan 2024 10:30:00 GMT\n\
             (request-target): get /20160918/instances?compartmentId=c1&page=p2\n\
             host: iaas.us-ashburn-1.oraclecloud.com"
        );

        let local = Url::parse("http://127.0.0.1:8080/20160918/volumes").unwrap();
        let text = signing_string(&Method::GET, &local, "d").unwrap();
        assert!(text.ends_with("host: 127.0.0.1:8080"));
    }

    #[tokio::test]
    async fn test_authorize_adds_verifiable_signature() {
        let token = jwt(json!({"tenant": TENANCY}));
        let (_dir, token_file, key_file) = session(&token);
        let signer = SecurityTokenSigner::new(&token_file, &key_file).unwrap();

        let url = Url::parse("https://identity.eu-frankfurt-1.oraclecloud.com/20160918/compartments?compartmentId=c").unwrap();
        let mut request = Request::new(Method::GET, url.clone());
        signer.authorize(&mut request).await.unwrap();

        let date = request.headers()[DATE].to_str().unwrap().to_string();
        let authorization = request.headers()[AUTHORIZATION].to_str().unwrap().to_string();
        assert!(authorization.starts_with(&format!(
            r#"Signature version="1",keyId="ST${}",algorithm="rsa-sha256",headers="date (request-target) host""#,
            token
        )));

        let signature = authorization
            .rsplit("signature=\"")
            .next()
            .unwrap()
            .trim_end_matches('"');
        let signature = STANDARD.decode(signature).unwrap();
        let digest = Sha256::digest(signing_string(&Method::GET, &url, &date).unwrap().as_bytes());

        signer
            .private_key
            .to_public_key()
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
            .expect("signature should verify with the session public key");
    }
}
