//! Blocking HTTPS GET over the ESP-IDF client
//!
//! One connection per request, bounded by `HTTP_TIMEOUT_MS`. Server
//! certificates are checked against the ESP-IDF CA bundle.

use alloc::vec::Vec;
use core::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::http::Method;
use embedded_svc::io::Read;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use esp_idf_svc::io::EspIOError;

use super::{FetchError, MAX_BODY_LEN};
use crate::config::HTTP_TIMEOUT_MS;

/// Status line and body of a reply
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl From<EspIOError> for FetchError {
    fn from(e: EspIOError) -> Self {
        FetchError::Transport(e.0.code())
    }
}

/// GET `url` with `headers`, reading at most `MAX_BODY_LEN` bytes of body
pub fn get(url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
    let connection = EspHttpConnection::new(&Configuration {
        timeout: Some(Duration::from_millis(HTTP_TIMEOUT_MS)),
        crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
        ..Default::default()
    })
    .map_err(|e| FetchError::Transport(e.code()))?;
    let mut client = Client::wrap(connection);

    let request = client.request(Method::Get, url, headers)?;
    let mut response = request.submit()?;
    let status = response.status();

    let mut body = Vec::new();
    let mut chunk = [0u8; 512];
    loop {
        let n = response.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        if body.len() + n > MAX_BODY_LEN {
            return Err(FetchError::TooLarge);
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Ok(HttpResponse { status, body })
}
