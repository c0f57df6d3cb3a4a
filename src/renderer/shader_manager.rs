//! Shader Template Environment
//!
//! WGSL templates are embedded with `rust-embed` and rendered through a
//! process-wide minijinja environment. Template syntax:
//!
//! | Construct | Syntax |
//! |-----------|--------|
//! | block     | `{$ if shadow_soft $} ... {$ endif $}` |
//! | variable  | `{{ max_lights }}` |
//! | include   | `{$ include "globals" $}` resolves to `chunks/globals.wgsl` |
//!
//! Anchor markers (`//#include <name>`) are plain WGSL comments, so they
//! survive rendering untouched and remain available to shader patches.

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, Error, ErrorKind, syntax::SyntaxConfig};
use rust_embed::RustEmbed;
use serde::Serialize;

static SHADER_ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/renderer/shaders"]
struct ShaderAssets;

pub fn get_env() -> &'static Environment<'static> {
    SHADER_ENV.get_or_init(|| {
        let mut env = Environment::new();

        match SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
        {
            Ok(syntax) => env.set_syntax(syntax),
            Err(e) => log::error!("Failed to configure shader template syntax: {e}"),
        }

        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);

        env.set_loader(shader_loader);
        env.set_path_join_callback(|name, _parent| format!("chunks/{name}").into());

        env
    })
}

fn shader_loader(name: &str) -> Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    let Some(file) = ShaderAssets::get(&filename) else {
        return Ok(None);
    };

    match std::str::from_utf8(file.data.as_ref()) {
        Ok(source) => Ok(Some(source.to_string())),
        Err(e) => Err(Error::new(
            ErrorKind::TemplateNotFound,
            format!("shader '{filename}' is not valid UTF-8: {e}"),
        )),
    }
}

/// Renders an embedded template with the given context.
pub fn render_template<S: Serialize>(name: &str, ctx: S) -> Result<String, Error> {
    get_env().get_template(name)?.render(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_resolve_to_chunks() {
        let out = render_template("shadow_depth", minijinja::context! {}).unwrap();
        assert!(out.contains("struct ModelUniforms"));
        assert!(out.contains("fn vs_main"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(render_template("does_not_exist", minijinja::context! {}).is_err());
    }
}
