//! Minimal client-stub generator.
//!
//! Renders a thin language-specific wrapper around one of the binding
//! crates (wasm, python, java) from an embedded template. This is
//! scaffolding for SDK authors, not a code generator for the conversion
//! engine itself — the engine's behavior lives entirely in
//! `jsonschema-llm-core`.

use anyhow::{Context, Result};
use heck::ToSnekCase;
use rust_embed::RustEmbed;
use serde::Serialize;
use tera::Tera;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// A binding target a client stub can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLanguage {
    TypeScript,
    Python,
}

impl ClientLanguage {
    fn template_name(self) -> &'static str {
        match self {
            ClientLanguage::TypeScript => "client.ts.tera",
            ClientLanguage::Python => "client.py.tera",
        }
    }
}

#[derive(Serialize)]
struct ClientContext<'a> {
    module_name: &'a str,
}

/// Renders a client stub for `language` that imports `module_name` (the
/// compiled binding module/package name) and re-exports its functions.
pub fn generate_client_stub(language: ClientLanguage, module_name: &str) -> Result<String> {
    // Python module names must be valid identifiers; other languages accept
    // the caller's module name verbatim.
    let module_name = match language {
        ClientLanguage::Python => module_name.to_snek_case(),
        ClientLanguage::TypeScript => module_name.to_string(),
    };
    let module_name = module_name.as_str();

    let template_name = language.template_name();
    let template_bytes = Templates::get(template_name)
        .with_context(|| format!("embedded template '{template_name}' not found"))?;
    let template_str = std::str::from_utf8(&template_bytes.data)
        .with_context(|| format!("embedded template '{template_name}' is not valid UTF-8"))?;

    let mut tera = Tera::default();
    tera.add_raw_template(template_name, template_str)
        .with_context(|| format!("failed to register template '{template_name}'"))?;

    let context = tera::Context::from_serialize(ClientContext { module_name })
        .context("failed to build template context")?;
    tera.render(template_name, &context)
        .with_context(|| format!("failed to render template '{template_name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_typescript_client_stub() {
        let stub = generate_client_stub(ClientLanguage::TypeScript, "jsonschema_llm_wasm").unwrap();
        assert!(stub.contains("jsonschema_llm_wasm"));
    }

    #[test]
    fn renders_python_client_stub() {
        let stub = generate_client_stub(ClientLanguage::Python, "jsonschema_llm").unwrap();
        assert!(stub.contains("jsonschema_llm"));
    }

    #[test]
    fn writes_rendered_stub_to_disk() {
        let stub = generate_client_stub(ClientLanguage::TypeScript, "jsonschema-llm-wasm").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.ts");
        std::fs::write(&path, &stub).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), stub);
    }
}
