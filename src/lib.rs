//! Tour Assistant: a terminal travel-planning chat backed by an
//! OpenAI-compatible model and an Open-Meteo weather tool.

pub mod commands;
pub mod config;
pub mod logging;
pub mod rchain;
pub mod session;
pub mod toolbox;
pub mod weather;
