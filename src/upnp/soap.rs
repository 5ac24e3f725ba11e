use crate::http::response::{Response, ResponseBuilder, StatusCode, XML_CONTENT_TYPE};

/// Executes a control action posted to one of the service control URLs.
pub trait SoapHandler: Send + Sync {
    /// `action` is the SOAPAction header without quotes,
    /// e.g. `urn:schemas-upnp-org:service:ContentDirectory:1#Browse`.
    fn execute(&self, action: &str, body: &[u8]) -> Response;
}

/// Answers every action with UPnP error 401 (Invalid Action).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedActions;

impl SoapHandler for UnsupportedActions {
    fn execute(&self, action: &str, _body: &[u8]) -> Response {
        tracing::warn!(action = %action, "Unknown SOAP action");
        soap_fault(401, "Invalid Action")
    }
}

/// A SOAP `UPnPError` fault, sent with status 500.
pub fn soap_fault(code: u16, description: &str) -> Response {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n\
         <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">\
         <s:Body><s:Fault>\
         <faultcode>s:Client</faultcode>\
         <faultstring>UPnPError</faultstring>\
         <detail><UPnPError xmlns=\"urn:schemas-upnp-org:control-1-0\">\
         <errorCode>{code}</errorCode>\
         <errorDescription>{description}</errorDescription>\
         </UPnPError></detail>\
         </s:Fault></s:Body></s:Envelope>\r\n"
    );

    ResponseBuilder::new(StatusCode::InternalServerError)
        .header("Content-Type", XML_CONTENT_TYPE)
        .header("EXT", "")
        .body(body.into_bytes())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_carries_error_code() {
        let resp = UnsupportedActions.execute("urn:x#Nope", b"");
        let body = String::from_utf8(resp.body.as_bytes().unwrap().to_vec()).unwrap();

        assert_eq!(resp.status, StatusCode::InternalServerError);
        assert!(body.contains("<errorCode>401</errorCode>"));
    }
}
