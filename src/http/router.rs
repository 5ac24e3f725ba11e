use std::sync::Arc;

use crate::db::Database;
use crate::http::handlers::{art, events, icons::Icons, media, resized};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::upnp::{
    Description, DescriptionFiles, DescriptionProvider, EventSubscriptions, SoapHandler,
    SubscriptionRegistry, UnsupportedActions, VendorCommand,
};

const MEDIA_ITEMS: &str = "/MediaItems/";
const THUMBNAILS: &str = "/Thumbnails/";
const ALBUM_ART: &str = "/AlbumArt/";
const RESIZED: &str = "/Resized/";
const ICONS: &str = "/icons/";

const NO_SOAP_ACTION: &str = "<html><body>Bad request</body></html>";

/// Maps a complete request to its response. Blocking: run it off the
/// async reactor.
pub struct Router {
    db: Arc<Database>,
    icons: Icons,
    soap: Arc<dyn SoapHandler>,
    descriptions: Arc<dyn DescriptionProvider>,
    events: Arc<dyn EventSubscriptions>,
    vendor: Option<Arc<dyn VendorCommand>>,
}

impl Router {
    pub fn new(db: Arc<Database>) -> Self {
        let icons = Icons::generate().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not render icons");
            Icons::default()
        });
        Self {
            db,
            icons,
            soap: Arc::new(UnsupportedActions),
            descriptions: Arc::new(DescriptionFiles::default()),
            events: Arc::new(SubscriptionRegistry::new()),
            vendor: None,
        }
    }

    pub fn with_soap(mut self, soap: Arc<dyn SoapHandler>) -> Self {
        self.soap = soap;
        self
    }

    pub fn with_descriptions(mut self, descriptions: Arc<dyn DescriptionProvider>) -> Self {
        self.descriptions = descriptions;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSubscriptions>) -> Self {
        self.events = events;
        self
    }

    pub fn with_vendor(mut self, vendor: Arc<dyn VendorCommand>) -> Self {
        self.vendor = Some(vendor);
        self
    }

    pub fn respond(&self, req: &Request) -> Response {
        match &req.method {
            Method::POST => self.post(req),
            Method::GET | Method::HEAD => self.get(req),
            Method::SUBSCRIBE => events::subscribe(self.events.as_ref(), req),
            Method::UNSUBSCRIBE => events::unsubscribe(self.events.as_ref(), req),
            Method::Other(cmd) => {
                tracing::warn!(method = %cmd, "Unsupported HTTP command");
                Response::not_implemented()
            }
        }
    }

    fn post(&self, req: &Request) -> Response {
        match &req.fields.soap_action {
            Some(action) => {
                tracing::debug!(action = %action, "SOAPAction");
                self.soap.execute(action, &req.body)
            }
            None => {
                tracing::warn!("No SOAPAction in HTTP headers");
                ResponseBuilder::new(StatusCode::BadRequest)
                    .header("Content-Type", "text/html")
                    .body(NO_SOAP_ACTION.as_bytes().to_vec())
                    .build()
            }
        }
    }

    fn get(&self, req: &Request) -> Response {
        if !req.is_valid() {
            tracing::warn!(path = %req.path, "Invalid request (no Host header?), responding 400");
            return Response::bad_request();
        }
        if req.fields.time_seek {
            tracing::warn!(path = %req.path, "DLNA TimeSeek requested, responding 406");
            return Response::not_acceptable();
        }

        let path = req.path.as_str();
        let db = self.db.as_ref();

        if let Some(which) = Description::from_path(path) {
            return self.describe(which);
        }
        if let Some(object) = path.strip_prefix(MEDIA_ITEMS) {
            return media::serve_item(db, object, req);
        }
        if let Some(object) = path.strip_prefix(THUMBNAILS) {
            return art::serve_thumbnail(db, object, req);
        }
        if let Some(object) = path.strip_prefix(ALBUM_ART) {
            return art::serve_album_art(db, object, req);
        }
        if let Some(object) = path.strip_prefix(RESIZED) {
            return resized::serve_resized(db, object, req);
        }
        if let Some(name) = path.strip_prefix(ICONS) {
            return self.icons.serve(name);
        }
        if let Some(vendor) = self.vendor.as_ref().filter(|v| path.starts_with(v.prefix())) {
            return vendor.handle(req);
        }

        tracing::warn!(path = %path, "Not found, responding 404");
        Response::not_found()
    }

    fn describe(&self, which: Description) -> Response {
        match self.descriptions.describe(which) {
            Some(xml) => Response::xml(xml),
            None => {
                tracing::error!(document = ?which, "Failed to generate XML description");
                Response::internal_error()
            }
        }
    }
}
