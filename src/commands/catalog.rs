use crate::app::{App, AppState};
use crate::catalog::{self, Activation, Assistant, SectionOffer, Tier};
use crate::router::Screen;

pub fn list_sections(app: &App) -> Result<Vec<SectionOffer>, String> {
    app.ledger.offers().map_err(|e| e.to_string())
}

/// Every assistant with whether the current purchases unlock it.
pub fn list_assistants(app: &App) -> Result<Vec<(&'static Assistant, bool)>, String> {
    catalog::ASSISTANTS
        .iter()
        .map(|a| {
            app.ledger
                .is_unlocked(a)
                .map(|unlocked| (a, unlocked))
                .map_err(|e| e.to_string())
        })
        .collect()
}

/// Runs the tier's call-to-action and shows the assistants it opens.
pub fn activate_tier(
    app: &App,
    state: &mut AppState,
    section_key: &str,
    tier: &str,
) -> Result<Activation, String> {
    let tier: Tier = tier.parse()?;
    let activation = app
        .ledger
        .activate(section_key, tier)
        .map_err(|e| e.to_string())?;

    state.selection = Some((activation.section.key, activation.tier));
    state
        .router
        .navigate(Screen::Assistants)
        .map_err(|e| e.to_string())?;
    Ok(activation)
}
