use crate::core::config::data::Config;
use crate::core::models::ModelId;

impl Config {
    /// Lines describing every config key, as shown by `gemchat set` without
    /// arguments.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec!["Current configuration:".to_string()];
        match self.default_model {
            Some(model) => lines.push(format!("  default-model: {} ({})", model, model.label())),
            None => lines.push(format!(
                "  default-model: (unset, using {})",
                ModelId::default()
            )),
        }
        match &self.base_url {
            Some(url) => lines.push(format!("  base-url: {url}")),
            None => lines.push("  base-url: (unset)".to_string()),
        }
        let markdown = if self.markdown_enabled() { "on" } else { "off" };
        lines.push(format!("  markdown: {markdown}"));
        lines
    }

    pub fn print_all(&self) {
        for line in self.describe() {
            println!("{line}");
        }
    }
}
