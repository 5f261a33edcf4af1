//! Storeez story strip: fetches a widget's stories and drives the
//! mount / load / browse lifecycle independently of any UI toolkit.

pub mod api;
pub mod browser;
pub mod config;
pub mod host;
pub mod open_url;
pub mod ui;
pub mod util;
pub mod widget;
