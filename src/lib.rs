//! mediaserve - DLNA media server core
//!
//! HTTP engine, album-art cache and the UPnP hooks they serve.

pub mod art;
pub mod config;
pub mod db;
pub mod exif;
pub mod http;
pub mod imaging;
pub mod media;
pub mod server;
pub mod upnp;
pub mod video;
