//! Media Wall Frontend Entry Point

mod api;
mod app;
mod components;
mod context;
mod flip;
mod grouping;
mod image_cache;
mod layout;
mod models;
mod store;
mod virtualize;

use app::App;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}
