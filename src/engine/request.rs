//! HTTP/1.1 request rendering for a single query.
use crate::error::ConnectionError;

/// Upper bound on a rendered request; larger requests fail the query.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

/// Everything about a request except the query itself.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: RequestMethod,
    prefix: String,
    host: String,
    extra_header: Option<String>,
}

impl RequestTemplate {
    #[must_use]
    pub fn new(
        method: RequestMethod,
        prefix: String,
        host: String,
        extra_header: Option<String>,
    ) -> Self {
        Self {
            method,
            prefix,
            host,
            extra_header: extra_header.filter(|header| !header.is_empty()),
        }
    }

    #[must_use]
    pub const fn method(&self) -> RequestMethod {
        self.method
    }

    /// Renders the request for `query` into `out`, replacing its content.
    ///
    /// GET puts the query after the prefix in the request target; POST sends
    /// it as the body of a request to the prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::RequestTooLarge`] when the request would not
    /// fit in [`MAX_REQUEST_BYTES`].
    pub fn render(&self, query: &[u8], out: &mut Vec<u8>) -> Result<(), ConnectionError> {
        out.clear();
        let len = self.rendered_len(query);
        if len > MAX_REQUEST_BYTES {
            return Err(ConnectionError::RequestTooLarge {
                len,
                limit: MAX_REQUEST_BYTES,
            });
        }
        out.reserve(len);

        match self.method {
            RequestMethod::Get => {
                out.extend_from_slice(b"GET ");
                out.extend_from_slice(self.prefix.as_bytes());
                out.extend_from_slice(query);
            }
            RequestMethod::Post => {
                out.extend_from_slice(b"POST ");
                out.extend_from_slice(self.prefix.as_bytes());
            }
        }
        out.extend_from_slice(b" HTTP/1.1\r\nHost: ");
        out.extend_from_slice(self.host.as_bytes());
        out.extend_from_slice(b"\r\nConnection: close\r\n");
        if self.method == RequestMethod::Post {
            out.extend_from_slice(format!("Content-Length: {}\r\n", query.len()).as_bytes());
        }
        if let Some(header) = self.extra_header.as_deref() {
            out.extend_from_slice(header.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        if self.method == RequestMethod::Post {
            out.extend_from_slice(query);
        }
        Ok(())
    }

    fn rendered_len(&self, query: &[u8]) -> usize {
        const FIXED: usize = " HTTP/1.1\r\nHost: \r\nConnection: close\r\n\r\n".len();
        let method = match self.method {
            RequestMethod::Get => "GET ".len(),
            RequestMethod::Post => "POST ".len(),
        };
        let content_length = match self.method {
            RequestMethod::Get => 0,
            RequestMethod::Post => "Content-Length: \r\n"
                .len()
                .saturating_add(query.len().to_string().len()),
        };
        let extra = self
            .extra_header
            .as_ref()
            .map_or(0, |header| header.len().saturating_add(2));
        [
            FIXED,
            method,
            self.prefix.len(),
            self.host.len(),
            query.len(),
            content_length,
            extra,
        ]
        .iter()
        .fold(0usize, |acc, part| acc.saturating_add(*part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(template: &RequestTemplate, query: &str) -> Result<String, String> {
        let mut out = Vec::new();
        template
            .render(query.as_bytes(), &mut out)
            .map_err(|err| err.to_string())?;
        String::from_utf8(out).map_err(|err| err.to_string())
    }

    #[test]
    fn get_request_layout() -> Result<(), String> {
        let template = RequestTemplate::new(
            RequestMethod::Get,
            "/search?q=".to_owned(),
            "example.com".to_owned(),
            Some("X-Bench: 1".to_owned()),
        );
        let request = render(&template, "cats")?;
        let expected = "GET /search?q=cats HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\nX-Bench: 1\r\n\r\n";
        if request != expected {
            return Err(format!("Unexpected request: {:?}", request));
        }
        Ok(())
    }

    #[test]
    fn get_without_extra_header() -> Result<(), String> {
        let template = RequestTemplate::new(
            RequestMethod::Get,
            String::new(),
            "localhost".to_owned(),
            Some(String::new()),
        );
        let request = render(&template, "/a")?;
        if request != "GET /a HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n" {
            return Err(format!("Unexpected request: {:?}", request));
        }
        Ok(())
    }

    #[test]
    fn post_request_carries_body() -> Result<(), String> {
        let template = RequestTemplate::new(
            RequestMethod::Post,
            "/api".to_owned(),
            "localhost".to_owned(),
            Some("Content-Type: text/plain".to_owned()),
        );
        let request = render(&template, "hello")?;
        let expected = "POST /api HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 5\r\nContent-Type: text/plain\r\n\r\nhello";
        if request != expected {
            return Err(format!("Unexpected request: {:?}", request));
        }
        Ok(())
    }

    #[test]
    fn query_bytes_are_sent_verbatim() -> Result<(), String> {
        let template = RequestTemplate::new(
            RequestMethod::Get,
            "/q/".to_owned(),
            "h".to_owned(),
            None,
        );
        let mut out = Vec::new();
        template
            .render(b"caf\xe9", &mut out)
            .map_err(|err| err.to_string())?;
        if !out.starts_with(b"GET /q/caf\xe9 HTTP/1.1\r\n") {
            return Err(format!("Unexpected request: {:?}", out));
        }
        Ok(())
    }

    #[test]
    fn computed_length_matches_output() -> Result<(), String> {
        let template = RequestTemplate::new(
            RequestMethod::Post,
            "/p".to_owned(),
            "h".to_owned(),
            Some("A: b".to_owned()),
        );
        let query = "x".repeat(1234);
        let mut out = Vec::new();
        template
            .render(query.as_bytes(), &mut out)
            .map_err(|err| err.to_string())?;
        if out.len() != template.rendered_len(query.as_bytes()) {
            return Err(format!(
                "rendered {} bytes, predicted {}",
                out.len(),
                template.rendered_len(query.as_bytes())
            ));
        }
        Ok(())
    }

    #[test]
    fn oversized_request_is_rejected() -> Result<(), String> {
        let template = RequestTemplate::new(
            RequestMethod::Get,
            String::new(),
            "localhost".to_owned(),
            None,
        );
        let query = "q".repeat(MAX_REQUEST_BYTES);
        let mut out = Vec::new();
        match template.render(query.as_bytes(), &mut out) {
            Err(ConnectionError::RequestTooLarge { limit, .. }) if limit == MAX_REQUEST_BYTES => {
                Ok(())
            }
            other => Err(format!("Expected RequestTooLarge, got {:?}", other)),
        }
    }
}
