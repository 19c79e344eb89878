use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub model_name: String,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let model_name = config.model_name();
        Self { config, model_name }
    }
}
