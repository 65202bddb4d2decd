use clap::{Parser, Subcommand};
use domshot::Viewport;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "domshot")]
#[command(
    version,
    about = "Capture server-side DOM markup as an image via headless Chromium",
    long_about = "domshot\n\nServes an HTML document over a transient local endpoint and captures it\nwith headless Chromium. Intended for screenshot tests of markup produced by\nheadless DOM implementations; the CLI covers one-off captures and debugging."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional options file (TOML); command-line flags override it"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture an HTML document to an image file
    Capture {
        #[arg(long, value_name = "PATH", help = "HTML file to capture; '-' reads stdin")]
        input: PathBuf,

        #[arg(long, short, value_name = "PATH", help = "Where to write the image")]
        output: PathBuf,

        #[arg(long, help = "Viewport dimensions (WIDTHxHEIGHT)")]
        viewport: Option<Viewport>,

        #[arg(
            long = "serve",
            value_name = "DIR",
            help = "Directory served as static content next to the markup (repeatable)"
        )]
        serve: Vec<PathBuf>,

        #[arg(long, help = "CSS selector of the element to clip the capture to")]
        target_selector: Option<String>,

        #[arg(long, help = "Wait for network idle before capturing")]
        wait_network_idle: bool,

        #[arg(long, help = "Capture the full scrollable page")]
        full_page: bool,

        #[arg(long, help = "Dump the markup to stdout before capturing")]
        debug: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
