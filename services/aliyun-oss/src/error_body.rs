//! Decoding of server error responses.

use std::collections::HashMap;
use std::mem;

use ossreq_core::hash::base64_decode;
use ossreq_core::{Error, ResponseMessage, Result, ServiceError};
use quick_xml::escape::{resolve_xml_entity, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::constants::{X_OSS_EC, X_OSS_ERR, X_OSS_REQUEST_ID};

/// Code used when the error document can't be decoded.
pub const BAD_ERROR_RESPONSE: &str = "BadErrorResponse";

/// Flatten an `<Error>` document into its child element texts.
pub fn parse_error_xml(body: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(body);

    let mut fields = HashMap::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if stack.is_empty() && name != "Error" {
                    return Err(Error::serialization(format!(
                        "unexpected root element {name} in error response"
                    )));
                }
                stack.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                if stack.len() == 1 {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    fields.insert(name, String::new());
                }
            }
            Event::Text(e) => {
                let decoded = e.decode().map_err(xml_error)?;
                text.push_str(&unescape(&decoded).map_err(xml_error)?);
            }
            Event::GeneralRef(e) => {
                if let Some(c) = e.resolve_char_ref().map_err(xml_error)? {
                    text.push(c);
                } else if let Some(v) = resolve_xml_entity(&e.decode().map_err(xml_error)?) {
                    text.push_str(v);
                }
            }
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => {
                if let Some(name) = stack.pop() {
                    // Only direct children of <Error> are kept.
                    if stack.len() == 1 {
                        fields.insert(name, mem::take(&mut text).trim().to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::serialization("error response is truncated"));
    }
    Ok(fields)
}

fn xml_error(e: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::serialization("decode error response failed").with_source(e)
}

/// Build the [`ServiceError`] of a non-2xx response.
///
/// An empty body falls back to the base64 encoded `x-oss-err` header.
pub fn service_error(resp: &ResponseMessage, request_target: String) -> ServiceError {
    let content = match resp.header(X_OSS_ERR) {
        Some(v) if resp.body.is_empty() => base64_decode(v).unwrap_or_default(),
        _ => resp.body.to_vec(),
    };

    let (fields, parsed) = if content.is_empty() {
        (HashMap::new(), true)
    } else {
        match parse_error_xml(&content) {
            Ok(fields) => (fields, true),
            Err(_) => (HashMap::new(), false),
        }
    };

    let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
    let (code, message) = if parsed {
        (field("Code"), field("Message"))
    } else {
        (
            BAD_ERROR_RESPONSE.to_string(),
            format!(
                "failed to decode error response: {}",
                String::from_utf8_lossy(&content)
            ),
        )
    };
    let request_id = fields
        .get("RequestId")
        .cloned()
        .or_else(|| resp.header(X_OSS_REQUEST_ID).map(str::to_string))
        .unwrap_or_default();
    let ec = fields
        .get("EC")
        .cloned()
        .or_else(|| resp.header(X_OSS_EC).map(str::to_string))
        .unwrap_or_default();

    ServiceError {
        status: resp.status,
        code,
        message,
        request_id,
        ec,
        fields,
        headers: resp.headers.clone(),
        snapshot: resp.body.clone(),
        request_target,
    }
}
