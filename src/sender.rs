use anyhow::Context;
use url::Url;

/// POSTs encoded bid requests to the endpoint under test.
#[derive(Clone)]
pub struct HttpSender {
    client: reqwest::Client,
    url: Url,
}

impl HttpSender {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let url = Url::parse(endpoint).context("endpoint URL does not parse")?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("endpoint URL scheme must be http or https");
        }
        if url.host_str().map_or(true, str::is_empty) {
            anyhow::bail!("endpoint URL must have a hostname");
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }

    /// Returns the HTTP status and the raw response body.
    pub async fn send(&self, payload: Vec<u8>) -> anyhow::Result<(u16, Vec<u8>)> {
        let response = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_schemes() {
        assert!(HttpSender::new("ftp://bidder.test/bid").is_err());
        assert!(HttpSender::new("not a url").is_err());
    }

    #[test]
    fn accepts_http_and_https() {
        assert!(HttpSender::new("http://bidder.test:8080/bid").is_ok());
        assert!(HttpSender::new("https://bidder.test/bid").is_ok());
    }
}
