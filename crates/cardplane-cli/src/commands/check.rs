use super::{json_pretty, EXIT_SUCCESS};
use cardplane_core::Controller;
use cardplane_schema::parse_manifest_file;
use std::path::Path;

pub fn run(manifest: &Path, json: bool) -> Result<u8, String> {
    let parsed = parse_manifest_file(manifest).map_err(|e| format!("manifest error: {e}"))?;
    // Assembling the controller also rejects foreign resource kinds.
    Controller::from_manifest(&parsed).map_err(|e| e.to_string())?;

    let configs: Vec<serde_json::Value> = parsed
        .provider_configs
        .iter()
        .map(|pc| {
            let cards: Vec<&str> = parsed
                .cards
                .iter()
                .filter(|c| c.provider_config == pc.name)
                .map(|c| c.name.as_str())
                .collect();
            serde_json::json!({
                "name": pc.name,
                "credentials": pc.credentials.kind(),
                "cards": cards,
            })
        })
        .collect();

    if json {
        let payload = serde_json::json!({
            "manifest": manifest.display().to_string(),
            "valid": true,
            "provider_configs": configs,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{}: {} provider configs, {} cards",
            manifest.display(),
            parsed.provider_configs.len(),
            parsed.cards.len()
        );
        for pc in &configs {
            println!(
                "  {:<16} {:<12} {}",
                pc["name"].as_str().unwrap_or_default(),
                pc["credentials"].as_str().unwrap_or_default(),
                pc["cards"].as_array().map_or(0, Vec::len)
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
