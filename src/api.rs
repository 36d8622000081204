// Roster client: a small blocking HTTP client that talks to the
// school-data-hub. Every call returns a freshly built roster; nothing is
// cached between operations.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::roster::{Roster, RosterSource};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Holds a reqwest blocking client, the roster endpoint and its API key.
#[derive(Clone)]
pub struct RosterClient {
    client: Client,
    url: String,
    api_key: String,
}

impl RosterClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Ok(RosterClient {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

impl RosterSource for RosterClient {
    /// GET the roster with the `x-api-key` header and decode it.
    #[instrument(level = "debug", skip_all, fields(url = %self.url))]
    fn fetch_roster(&self) -> Result<Roster> {
        let body = self
            .client
            .get(&self.url)
            .header("x-api-key", &self.api_key)
            .send()?
            .text()?;

        match Roster::from_body(&body) {
            Ok(roster) => {
                info!(students = roster.len(), "Reading from SDH is OK");
                Ok(roster)
            }
            Err(e) => {
                error!("Reading from SDH is NOK, {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeerIdError;
    use crate::test_support::{http_response, StubServer};

    fn client(server: &StubServer) -> RosterClient {
        RosterClient::new(format!("{}/students", server.url), "sdh-key").unwrap()
    }

    #[test]
    fn sends_api_key_and_decodes_roster() {
        let body = r#"{"status": true, "data": [
            {"stamboeknummer": 1001, "instellingsnummer": 30569, "leerlingnummer": 7001, "klascode": "1A"}
        ]}"#;
        let server = StubServer::serve_once(http_response("200 OK", "application/json", body));

        let roster = client(&server).fetch_roster().unwrap();
        assert_eq!(roster.get(1001).unwrap().student_number, 7001);

        let request = server.request().to_ascii_lowercase();
        assert!(request.starts_with("get /students http/1.1"));
        assert!(request.contains("x-api-key: sdh-key"));
    }

    #[test]
    fn rejection_carries_the_error_payload() {
        let body = r#"{"status": false, "data": "invalid api key"}"#;
        let server = StubServer::serve_once(http_response("200 OK", "application/json", body));

        match client(&server).fetch_roster() {
            Err(LeerIdError::RosterRejected(msg)) => assert_eq!(msg, "invalid api key"),
            other => panic!("unexpected result: {other:?}"),
        }
        server.request();
    }

    #[test]
    fn non_json_body_is_an_error() {
        let server = StubServer::serve_once(http_response(
            "502 Bad Gateway",
            "text/html",
            "<html>bad gateway</html>",
        ));

        assert!(matches!(
            client(&server).fetch_roster(),
            Err(LeerIdError::InvalidRosterPayload(_))
        ));
        server.request();
    }

    #[test]
    fn dropped_connection_is_an_error() {
        let server = StubServer::serve_once(String::new());

        assert!(matches!(
            client(&server).fetch_roster(),
            Err(LeerIdError::Http(_))
        ));
        server.request();
    }
}
