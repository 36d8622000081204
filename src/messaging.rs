// Messaging client: posts one SOAP `sendMsg` call per recipient to the
// school platform's webservice.

use std::time::Duration;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{LeerIdError, Result};

const TIMEOUT: Duration = Duration::from_secs(30);

/// One personalised message, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Anything that can deliver an [`OutgoingMessage`]. Returns the
/// acknowledgement value of the service.
pub trait MessageSender {
    fn send_msg(&self, message: &OutgoingMessage) -> Result<String>;
}

pub struct SoapMessenger {
    client: Client,
    endpoint: String,
    api_key: String,
    sender_id: String,
}

impl SoapMessenger {
    /// `url` may be the WSDL location; the `?wsdl` suffix is dropped.
    pub fn new(
        url: &str,
        api_key: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Ok(SoapMessenger {
            client,
            endpoint: endpoint_from_url(url),
            api_key: api_key.into(),
            sender_id: sender_id.into(),
        })
    }

    fn envelope(&self, message: &OutgoingMessage) -> String {
        send_msg_envelope(&self.endpoint, &self.api_key, &self.sender_id, message)
    }
}

impl MessageSender for SoapMessenger {
    fn send_msg(&self, message: &OutgoingMessage) -> Result<String> {
        let res = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}#sendMsg\"", self.endpoint))
            .body(self.envelope(message))
            .send()?;
        let status = res.status();
        let text = res.text()?;
        debug!(%status, "sendMsg response received");

        match parse_response(&text) {
            Err(fault @ LeerIdError::SoapFault(_)) => Err(fault),
            _ if !status.is_success() => {
                let snippet: String = text.chars().take(200).collect();
                Err(LeerIdError::SoapFault(format!("HTTP {status}: {snippet}")))
            }
            other => other,
        }
    }
}

fn endpoint_from_url(url: &str) -> String {
    let trimmed = url.trim();
    match trimmed.len().checked_sub(5) {
        Some(split)
            if trimmed.is_char_boundary(split)
                && trimmed[split..].eq_ignore_ascii_case("?wsdl") =>
        {
            trimmed[..split].to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// SOAP 1.1 rpc envelope for `sendMsg`. The trailing parameters are the
/// attachments (none), co-account (0) and copy-to-student-file (false).
pub fn send_msg_envelope(
    namespace: &str,
    api_key: &str,
    sender_id: &str,
    message: &OutgoingMessage,
) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:ns="{ns}">"#,
            "<soapenv:Body><ns:sendMsg>",
            r#"<accesscode xsi:type="xsd:string">{key}</accesscode>"#,
            r#"<userIdentifier xsi:type="xsd:string">{to}</userIdentifier>"#,
            r#"<title xsi:type="xsd:string">{title}</title>"#,
            r#"<body xsi:type="xsd:string">{body}</body>"#,
            r#"<senderIdentifier xsi:type="xsd:string">{from}</senderIdentifier>"#,
            r#"<attachments xsi:type="xsd:string"></attachments>"#,
            r#"<coaccount xsi:type="xsd:int">0</coaccount>"#,
            r#"<copyToLVS xsi:type="xsd:boolean">false</copyToLVS>"#,
            "</ns:sendMsg></soapenv:Body></soapenv:Envelope>",
        ),
        ns = escape(namespace),
        key = escape(api_key),
        to = escape(message.recipient.as_str()),
        title = escape(message.subject.as_str()),
        body = escape(message.body.as_str()),
        from = escape(sender_id),
    )
}

/// Text of the first `return` element, or the fault string of a SOAP fault.
pub fn parse_response(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut capture: Option<&'static str> = None;
    let mut ack: Option<String> = None;
    let mut fault: Option<String> = None;
    let mut in_fault = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Fault" => in_fault = true,
                b"faultstring" if in_fault => capture = Some("fault"),
                b"return" if ack.is_none() => capture = Some("return"),
                _ => {}
            },
            Event::Text(t) => match capture {
                Some("fault") => fault = Some(t.unescape()?.into_owned()),
                Some(_) => ack = Some(t.unescape()?.into_owned()),
                None => {}
            },
            Event::End(_) => capture = None,
            Event::Eof => break,
            _ => {}
        }
    }

    if in_fault {
        return Err(LeerIdError::SoapFault(
            fault.unwrap_or_else(|| "unknown fault".into()),
        ));
    }
    Ok(ack.unwrap_or_default())
}
