use std::io;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::config::{Overrides, Settings};
use crate::rchain::chat_models::ChatCompletions;
use crate::session::{Session, SessionEnd};
use crate::toolbox::Toolbox;
use crate::weather::WeatherClient;

#[derive(Debug, Args, Clone, Default)]
pub struct ChatArgs {
    /// Profile from the config file to start from.
    #[arg(long)]
    pub profile: Option<String>,
    /// Chat model identifier.
    #[arg(long)]
    pub model: Option<String>,
    /// Sampling temperature (0.0 to 2.0).
    #[arg(long)]
    pub temperature: Option<f64>,
    /// Replacement system prompt.
    #[arg(long)]
    pub system: Option<String>,
    /// Maximum tool rounds per user turn before control returns to the prompt.
    #[arg(long)]
    pub max_tool_rounds: Option<usize>,
}

impl ChatArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            model: self.model.clone(),
            system: self.system.clone(),
            temperature: self.temperature,
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

pub fn run(args: ChatArgs) -> Result<(), String> {
    let settings =
        Settings::load(&args.overrides(), args.profile.as_deref()).map_err(|err| err.to_string())?;
    info!(?settings, "starting chat session");

    let model = ChatCompletions::new(
        settings.model.clone(),
        settings.temperature,
        settings.api_key.clone(),
        &settings.base_url,
        Duration::from_secs(settings.request_timeout_secs),
    )
    .map_err(|err| err.to_string())?;
    let weather = WeatherClient::new(settings.geocoding_url.clone(), settings.forecast_url.clone())
        .map_err(|err| format!("could not build HTTP client: {err}"))?;
    let toolbox = Toolbox::new(weather);

    let mut session = Session::new(&model, &toolbox, &settings);
    let end = session
        .run(io::stdin().lock(), io::stdout())
        .map_err(|err| err.to_string())?;
    match end {
        SessionEnd::Exit => info!("session ended by command"),
        SessionEnd::EndOfInput => info!("session ended at end of input"),
    }
    Ok(())
}
