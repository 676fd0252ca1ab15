//! Write the gateway's OpenAPI document as pretty JSON.
//!
//!   cargo run --bin export_openapi                         # stdout
//!   cargo run --bin export_openapi -- --output openapi.json

use anyhow::{Context, Result};
use ledger_transfer::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    match args.as_slice() {
        [flag, path, ..] if flag == "--output" => {
            std::fs::write(path, &document).with_context(|| format!("Failed to write {}", path))?;
            eprintln!("OpenAPI document written to {}", path);
        }
        _ => println!("{}", document),
    }
    Ok(())
}
