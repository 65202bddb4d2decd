mod cli;

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use cli::Commands;
use domshot::{generate_image, CaptureOptions, DomshotError, ScreenshotOptions};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let payload = err.to_payload();
            eprintln!("domshot: {}", payload.message);
            if let Some(remediation) = payload.remediation {
                eprintln!("hint: {remediation}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "domshot=debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

async fn run(args: cli::Cli) -> domshot::Result<()> {
    let base = match &args.config {
        Some(path) => load_options_file(path)?,
        None => CaptureOptions::default(),
    };

    match args.command {
        Commands::Capture {
            input,
            output,
            viewport,
            serve,
            target_selector,
            wait_network_idle,
            full_page,
            debug,
        } => {
            let html = read_input(&input)?;

            let cli_options = CaptureOptions {
                viewport,
                serve,
                target_selector,
                wait_until_network_idle: wait_network_idle.then_some(true),
                debug: debug.then_some(true),
                screenshot: ScreenshotOptions {
                    full_page: full_page.then_some(true),
                    ..ScreenshotOptions::default()
                },
                ..CaptureOptions::default()
            };
            let options = cli_options.merged_over(base);

            let image = generate_image(&html, &options).await?;
            std::fs::write(&output, &image).map_err(DomshotError::Io)?;
            log::info!("wrote {} bytes to {}", image.len(), output.display());
            Ok(())
        }
    }
}

fn load_options_file(path: &Path) -> domshot::Result<CaptureOptions> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        DomshotError::config(format!(
            "failed to read options file {}: {e}",
            path.display()
        ))
    })?;
    CaptureOptions::from_toml_str(&raw)
}

fn read_input(path: &Path) -> domshot::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(DomshotError::Io)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            DomshotError::config(format!("failed to read input {}: {e}", path.display()))
        })
    }
}
