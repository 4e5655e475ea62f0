//! The upload page served at `/`.

use filedrop_files::ALLOWED_EXTENSIONS;
use minijinja::{context, Environment, Error};

/// Template name; the `.html` suffix turns on HTML auto-escaping.
const INDEX_TEMPLATE: &str = "index.html";
const INDEX_SOURCE: &str = include_str!("../templates/index.html");

/// Renders the upload page, optionally with a success banner.
pub fn render(success: Option<&str>) -> Result<String, Error> {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE, INDEX_SOURCE)?;
    let tmpl = env.get_template(INDEX_TEMPLATE)?;
    tmpl.render(context! {
        success => success,
        allowed => ALLOWED_EXTENSIONS,
    })
}
