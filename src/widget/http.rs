use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{LookupError, LookupReply, OrderSource};

/// [`OrderSource`] that calls the order service over HTTP.
///
/// No client-side timeout is configured; a hung request stays pending until
/// the transport gives up.
pub struct HttpOrderSource {
    http: Client,
    base_url: Url,
}

impl HttpOrderSource {
    pub fn new(base_url: &str) -> Result<Self, LookupError> {
        let base_url =
            Url::parse(base_url).map_err(|e| LookupError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    /// `{base}/order/{identifier}`, with the identifier percent-encoded as a
    /// single path segment.
    pub fn order_url(&self, identifier: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("order").push(identifier);
        }
        url
    }
}

#[async_trait]
impl OrderSource for HttpOrderSource {
    async fn fetch(&self, identifier: &str) -> Result<LookupReply, LookupError> {
        let url = self.order_url(identifier);
        tracing::debug!(%url, "Requesting order");

        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(LookupReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_url_joins_base() {
        let source = HttpOrderSource::new("http://localhost:8081").unwrap();
        assert_eq!(
            source.order_url("b563feb7b2b84b6test").as_str(),
            "http://localhost:8081/order/b563feb7b2b84b6test"
        );
    }

    #[test]
    fn test_order_url_keeps_base_path() {
        let source = HttpOrderSource::new("http://gateway/api/").unwrap();
        assert_eq!(source.order_url("x").as_str(), "http://gateway/api/order/x");
    }

    #[test]
    fn test_identifier_is_a_single_segment() {
        let source = HttpOrderSource::new("http://localhost:8081").unwrap();
        assert_eq!(
            source.order_url("a/b?c#d").as_str(),
            "http://localhost:8081/order/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn test_rejects_unusable_base() {
        assert!(matches!(
            HttpOrderSource::new("not a url"),
            Err(LookupError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            HttpOrderSource::new("mailto:orders@example.com"),
            Err(LookupError::InvalidBaseUrl(_))
        ));
    }
}
