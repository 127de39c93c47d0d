use super::{
    colorize_face, colorize_outcome, json_pretty, spin_done, spinner, EXIT_FAILURE, EXIT_SUCCESS,
};
use cardplane_core::{
    shutdown_requested, Condition, ConditionKind, Controller, ManagedResource, PassReport,
};
use cardplane_store::DeckStatus;
use std::path::Path;
use tracing::info;

/// What to run on top of the plain passes.
pub struct Plan {
    pub passes: u32,
    pub restart: bool,
    pub delete: Vec<String>,
}

pub fn run(manifest: &Path, plan: &Plan, json: bool) -> Result<u8, String> {
    let mut controller = Controller::from_manifest_file(manifest).map_err(|e| e.to_string())?;
    // Reject unknown names before any pass runs.
    if let Some(unknown) = plan.delete.iter().find(|n| controller.resource(n).is_none()) {
        return Err(format!("managed resource not found: {unknown}"));
    }
    let mut reports = Vec::new();

    let pb = if json {
        None
    } else {
        Some(spinner("reconciling..."))
    };

    for pass in 1..=plan.passes {
        if shutdown_requested() {
            break;
        }
        if let Some(ref pb) = pb {
            pb.set_message(format!("pass {pass}/{}", plan.passes));
        }
        reports.push(controller.run_pass());
    }

    if plan.restart && !shutdown_requested() {
        info!("simulating restart");
        controller.reset_decks();
        reports.push(controller.run_pass());
    }

    if !plan.delete.is_empty() && !shutdown_requested() {
        controller.request_deletions(&plan.delete).map_err(|e| e.to_string())?;
        reports.push(controller.run_pass());
    }

    let failed = reports.last().map_or(0, PassReport::failed);
    if let Some(ref pb) = pb {
        let msg = format!("{} passes run", reports.len());
        spin_done(pb, failed == 0, &msg);
    }

    let decks = deck_statuses(&controller)?;
    if json {
        let resources: Vec<serde_json::Value> = controller
            .resources()
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name(),
                    "provider_config": r.provider_config_name(),
                    "face": r.observation().face,
                    "ready": r.condition(ConditionKind::Ready).is_some_and(Condition::is_true),
                    "synced": r.condition(ConditionKind::Synced).is_some_and(Condition::is_true),
                })
            })
            .collect();
        let payload = serde_json::json!({
            "passes": reports,
            "converged": controller.converged(),
            "resources": resources,
            "decks": decks,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        print_human(&reports, &decks, controller.converged());
    }

    if failed == 0 {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}

fn deck_statuses(controller: &Controller) -> Result<Vec<DeckStatus>, String> {
    let registry = controller.registry();
    let names = registry.names().map_err(|e| format!("store error: {e}"))?;
    let mut decks = Vec::with_capacity(names.len());
    for name in &names {
        if let Some(status) = registry.get(name).map_err(|e| format!("store error: {e}"))? {
            decks.push(status);
        }
    }
    Ok(decks)
}

fn print_human(reports: &[PassReport], decks: &[DeckStatus], converged: bool) {
    for (i, report) in reports.iter().enumerate() {
        println!("pass {}:", i + 1);
        for r in &report.resources {
            let outcome = colorize_outcome(r.outcome.unwrap_or("failed"));
            let face = r.face.as_deref().map(colorize_face).unwrap_or_default();
            match &r.error {
                Some(err) => println!("  {:<16} {outcome:<12} {err}", r.name),
                None => println!("  {:<16} {outcome:<12} {face}", r.name),
            }
        }
    }
    for deck in decks {
        println!(
            "deck {}: {} left, generation {}",
            deck.name, deck.remaining, deck.generation
        );
    }
    println!("converged: {converged}");
}
