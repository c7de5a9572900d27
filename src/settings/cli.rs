use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Issues and rotates session credentials")]
pub struct Cli {
    /// Path to a settings file, defaults to settings/dev.toml (debug) or settings/release.toml
    #[arg(long)]
    pub settings: Option<String>,
}
