//! Handlebars rendering for the generated launcher and metadata files.

use crate::bundler::Result;
use handlebars::Handlebars;
use serde::Serialize;

/// Renders `template` with `data`.
///
/// Output is code and plain text, so HTML escaping is disabled; a missing
/// variable is an error rather than an empty string.
pub fn render<T: Serialize>(template: &str, data: &T) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    Ok(handlebars.render_template(template, data)?)
}
