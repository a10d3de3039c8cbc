//! HTML pages and static assets served from the public directory.
//!
//! Layout under the public directory:
//! - `html/contacts.html`, `html/new-contact.html`, `html/manage-contacts.html`
//! - `css/`, `js/`, `images/`

use axum::Router;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// `(route, file under html/)` for each page.
pub const PAGES: [(&str, &str); 3] = [
    ("/contacts", "contacts.html"),
    ("/contacts/new", "new-contact.html"),
    ("/contacts/manage", "manage-contacts.html"),
];

const ASSET_DIRS: [&str; 3] = ["css", "js", "images"];

/// Routes for the pages and asset directories.
///
/// Anything else not matched by the router falls through to the public
/// directory itself.
pub fn page_routes<S>(public_dir: &Path) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let html_dir = public_dir.join("html");
    let mut router = Router::new();

    for (route, file) in PAGES {
        router = router.route_service(route, ServeFile::new(html_dir.join(file)));
    }
    for dir in ASSET_DIRS {
        router = router.nest_service(&format!("/{dir}"), ServeDir::new(public_dir.join(dir)));
    }

    router.fallback_service(ServeDir::new(public_dir))
}
