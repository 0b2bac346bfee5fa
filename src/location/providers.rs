//! Reverse-geocoding providers: the `ReverseGeocoder` seam and Nominatim.

use super::types::{AddressLabel, LookupError};
use serde::Deserialize;
use std::time::Duration;

/// OpenStreetMap Nominatim reverse endpoint.
pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Sent with every request, as Nominatim's usage policy requires.
pub const USER_AGENT: &str = concat!(
    "geofill/",
    env!("CARGO_PKG_VERSION"),
    " (reverse-geocoding batch enrichment)"
);

/// Upper bound on a single reverse request.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(6);

/// Something that can turn a coordinate into a (possibly partial) place label.
///
/// Implementations make exactly one attempt per call.
pub trait ReverseGeocoder {
    fn reverse(&mut self, lat: f64, lon: f64) -> Result<AddressLabel, LookupError>;
}

impl<G: ReverseGeocoder + ?Sized> ReverseGeocoder for &mut G {
    fn reverse(&mut self, lat: f64, lon: f64) -> Result<AddressLabel, LookupError> {
        (**self).reverse(lat, lon)
    }
}

// ─── Nominatim provider ─────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct ReverseResponse {
    #[serde(default)]
    address: ReverseAddress,
}

#[derive(Deserialize, Debug, Default)]
struct ReverseAddress {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<ReverseResponse> for AddressLabel {
    fn from(r: ReverseResponse) -> Self {
        let a = r.address;
        AddressLabel {
            city: non_empty(a.city)
                .or_else(|| non_empty(a.town))
                .or_else(|| non_empty(a.village)),
            country: non_empty(a.country),
        }
    }
}

/// Parse a Nominatim `format=json` reverse body.
///
/// City falls back from `city` to `town` to `village`. A body without an
/// `address` object yields an empty label, not an error.
pub fn parse_reverse_response(body: &str) -> Result<AddressLabel, LookupError> {
    serde_json::from_str::<ReverseResponse>(body)
        .map(AddressLabel::from)
        .map_err(|e| LookupError::InvalidResponse(e.to_string()))
}

/// Blocking Nominatim reverse-geocoding client.
#[derive(Debug, Clone)]
pub struct Nominatim {
    endpoint: String,
    timeout: Duration,
}

impl Nominatim {
    pub fn new() -> Self {
        Self {
            endpoint: NOMINATIM_REVERSE_URL.to_string(),
            timeout: LOOKUP_TIMEOUT,
        }
    }

    /// Point the client at another server (for testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for Nominatim {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverseGeocoder for Nominatim {
    fn reverse(&mut self, lat: f64, lon: f64) -> Result<AddressLabel, LookupError> {
        let response = match ureq::get(&self.endpoint)
            .set("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .query("lat", &lat.to_string())
            .query("lon", &lon.to_string())
            .query("format", "json")
            .query("addressdetails", "1")
            .call()
        {
            Ok(r) => r,
            Err(ureq::Error::Status(code, _)) => return Err(LookupError::Status(code)),
            Err(e) => return Err(LookupError::Network(e.to_string())),
        };

        if response.status() != 200 {
            return Err(LookupError::Status(response.status()));
        }

        let body = response
            .into_string()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        parse_reverse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one canned HTTP response and hand back the raw request.
    fn one_shot_server(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/reverse", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    #[test]
    fn test_parse_city() {
        let label = parse_reverse_response(
            r#"{"display_name":"Oslo, Norway","address":{"city":"Oslo","country":"Norge","country_code":"no"}}"#,
        )
        .unwrap();
        assert_eq!(label.city.as_deref(), Some("Oslo"));
        assert_eq!(label.country.as_deref(), Some("Norge"));
    }

    #[test]
    fn test_parse_town_then_village_fallback() {
        let town = parse_reverse_response(r#"{"address":{"town":"Kiruna","village":"Jukkasjärvi","country":"Sverige"}}"#).unwrap();
        assert_eq!(town.city.as_deref(), Some("Kiruna"));

        let village = parse_reverse_response(r#"{"address":{"village":"Jukkasjärvi","country":"Sverige"}}"#).unwrap();
        assert_eq!(village.city.as_deref(), Some("Jukkasjärvi"));
    }

    #[test]
    fn test_parse_empty_city_falls_through() {
        let label = parse_reverse_response(r#"{"address":{"city":"","town":"Alta","country":"Norge"}}"#).unwrap();
        assert_eq!(label.city.as_deref(), Some("Alta"));
    }

    #[test]
    fn test_parse_missing_country() {
        let label = parse_reverse_response(r#"{"address":{"city":"Somewhere"}}"#).unwrap();
        assert_eq!(label.city.as_deref(), Some("Somewhere"));
        assert_eq!(label.country, None);
        assert_eq!(label.complete(), None);
    }

    #[test]
    fn test_parse_no_address() {
        let label = parse_reverse_response(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert_eq!(label, AddressLabel::default());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_reverse_response("<html>busy</html>"),
            Err(LookupError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_reverse_response("[1, 2, 3]"),
            Err(LookupError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_reverse_sends_expected_request() {
        let (url, handle) = one_shot_server(
            "200 OK",
            r#"{"address":{"city":"CityX","country":"CountryY"}}"#,
        );
        let mut client = Nominatim::new().with_endpoint(url);
        let label = client.reverse(10.0, 10.5).unwrap();
        assert_eq!(label.complete().unwrap().city, "CityX");

        let request = handle.join().unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /reverse?"));
        assert!(request_line.contains("lat=10"));
        assert!(request_line.contains("lon=10.5"));
        assert!(request_line.contains("format=json"));
        assert!(request_line.contains("addressdetails=1"));
        assert!(request.to_lowercase().contains("user-agent: geofill/"));
    }

    #[test]
    fn test_reverse_http_error_status() {
        let (url, handle) = one_shot_server("503 Service Unavailable", "{}");
        let mut client = Nominatim::new().with_endpoint(url);
        assert!(matches!(client.reverse(1.0, 1.0), Err(LookupError::Status(503))));
        handle.join().unwrap();
    }

    #[test]
    fn test_reverse_non_200_success_status() {
        let (url, handle) = one_shot_server("204 No Content", "");
        let mut client = Nominatim::new().with_endpoint(url);
        assert!(matches!(client.reverse(1.0, 1.0), Err(LookupError::Status(204))));
        handle.join().unwrap();
    }

    #[test]
    fn test_reverse_malformed_body() {
        let (url, handle) = one_shot_server("200 OK", "not json");
        let mut client = Nominatim::new().with_endpoint(url);
        assert!(matches!(
            client.reverse(1.0, 1.0),
            Err(LookupError::InvalidResponse(_))
        ));
        handle.join().unwrap();
    }

    #[test]
    fn test_reverse_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut client = Nominatim::new()
            .with_endpoint(format!("http://127.0.0.1:{}/reverse", port))
            .with_timeout(Duration::from_millis(500));
        assert!(matches!(client.reverse(1.0, 1.0), Err(LookupError::Network(_))));
    }

    #[test]
    fn test_reverse_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/reverse", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            // Accept and hold the connection open without answering.
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(800));
            drop(stream);
        });

        let mut client = Nominatim::new()
            .with_endpoint(url)
            .with_timeout(Duration::from_millis(200));
        assert!(matches!(client.reverse(1.0, 1.0), Err(LookupError::Network(_))));
        handle.join().unwrap();
    }

    #[test]
    fn test_defaults() {
        let client = Nominatim::default();
        assert_eq!(client.endpoint, NOMINATIM_REVERSE_URL);
        assert_eq!(client.timeout, Duration::from_secs(6));
    }
}
