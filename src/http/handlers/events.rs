//! SUBSCRIBE / UNSUBSCRIBE.

use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode, XML_CONTENT_TYPE};
use crate::upnp::events::{DEFAULT_TIMEOUT_SECS, EventSubscriptions};

fn accepted(sid: Option<&str>, timeout: u32) -> Response {
    let timeout = if timeout == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        timeout
    };
    let mut builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", XML_CONTENT_TYPE)
        .header("Timeout", format!("Second-{timeout}"));
    if let Some(sid) = sid {
        builder = builder.header("SID", sid);
    }
    builder.build()
}

/// A Callback opens a new subscription; a bare SID renews one.
pub fn subscribe(events: &dyn EventSubscriptions, req: &Request) -> Response {
    let path = req.path_only();
    let fields = &req.fields;
    tracing::debug!(
        path = %path,
        callback = ?fields.callback,
        sid = ?fields.sid,
        timeout = fields.timeout,
        "SUBSCRIBE"
    );

    if let Some(callback) = &fields.callback {
        let sid = events.subscribe(path, callback, fields.timeout);
        if let Some(sid) = &sid {
            tracing::debug!(sid = %sid, "Generated SID");
        }
        return accepted(sid.as_deref(), fields.timeout);
    }

    let Some(sid) = &fields.sid else {
        tracing::warn!(path = %path, "SUBSCRIBE without Callback or SID");
        return Response::precondition_failed();
    };

    if events.renew(sid, DEFAULT_TIMEOUT_SECS) {
        // DLNA devices must enforce a five minute timeout
        accepted(Some(sid), DEFAULT_TIMEOUT_SECS)
    } else {
        tracing::warn!(sid = %sid, "Renewal for unknown SID");
        Response::precondition_failed()
    }
}

pub fn unsubscribe(events: &dyn EventSubscriptions, req: &Request) -> Response {
    let sid = req.fields.sid.as_deref().unwrap_or_default();
    tracing::debug!(path = %req.path_only(), sid = %sid, "UNSUBSCRIBE");

    if events.unsubscribe(sid) {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", XML_CONTENT_TYPE)
            .build()
    } else {
        Response::precondition_failed()
    }
}
