//! Model listing for `gemchat models`.

use crate::core::models::ModelId;

/// One line per model variant. The active model is marked with `*`, the
/// configured default with `(default)`.
pub fn model_lines(active: ModelId, configured_default: Option<ModelId>) -> Vec<String> {
    ModelId::ALL
        .iter()
        .map(|&model| {
            let marker = if model == active { "*" } else { " " };
            let default = if configured_default == Some(model) {
                " (default)"
            } else {
                ""
            };
            format!(
                "{marker} {:<6} {:<22} {}{default}",
                model.short_name(),
                model.as_str(),
                model.label()
            )
        })
        .collect()
}

pub fn list_models(active: ModelId, configured_default: Option<ModelId>) {
    println!("🤖 Available Gemini models");
    println!();
    for line in model_lines(active, configured_default) {
        println!("{line}");
    }
    println!();
    println!("Use -m <name> for one run, or 'gemchat set default-model <name>' to persist.");
}
