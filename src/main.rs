use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use stream_screenshot::capture::FfmpegCapture;
use stream_screenshot::config::{self, ConfigError, ServiceConfig};
use stream_screenshot::handler::ScreenshotHandler;
use stream_screenshot::imaging::RustBackend;
use stream_screenshot::output;
use stream_screenshot::server::Server;

#[derive(Parser)]
#[command(name = "stream-screenshot")]
#[command(about = "Serve on-demand PNG screenshots of a live video stream")]
#[command(long_about = "\
Serve on-demand PNG screenshots of a live video stream

Every request grabs one fresh frame from the stream with ffmpeg (or avconv),
scales it down if asked, and returns it as image/png.

  GET /screenshot              native size
  GET /screenshot?size=low     320x180
  GET /screenshot?size=med     640x360
  GET /screenshot?size=hi      960x540
  GET /screenshot?size=hd      1280x720
  GET /screenshot?size=thumb   preset from screenshot.conf

Sizes never exceed the captured frame. Which built-in sizes are allowed, and
any named presets, come from screenshot.conf next to config.toml:

  screenshot small medium;
  screenshot_sizes {
      thumb 160 90;
  }

Run 'stream-screenshot gen-config' to generate a documented config.toml.
Set RUST_LOG=debug to log every request.")]
#[command(version)]
struct Cli {
    /// Service configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve screenshots over HTTP
    Serve {
        /// Address to bind, overriding server.listen
        #[arg(long)]
        listen: Option<String>,
        /// Stream URI, overriding capture.stream
        #[arg(long)]
        stream: Option<String>,
    },
    /// Validate config.toml and the directive file without serving
    Check,
    /// Capture one screenshot to a file
    Snap {
        /// Size token, as in ?size=
        #[arg(long)]
        size: Option<String>,
        /// Where to write the PNG
        #[arg(long, default_value = "screenshot.png")]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { listen, stream } => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            if let Some(stream) = stream {
                config.capture.stream = stream;
            }
            config.validate()?;

            let handler = build_handler(&config, &cli.config)?;
            let server = Server::bind(
                &config.server.listen,
                &config.server.path,
                config.server.workers,
                handler,
            )?;
            server.run()?;
        }
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            let config = config::load_config(&cli.config)?;
            let presets = config::load_presets(&config, &cli.config)?;
            output::print_check_output(&config, &presets);
            println!("==> Configuration is valid");
        }
        Command::Snap { size, out } => {
            let config = config::load_config(&cli.config)?;
            let handler = build_handler(&config, &cli.config)?;
            let rendered = handler.screenshot(size.as_deref())?;
            std::fs::write(&out, &rendered.body)?;
            output::print_snap_output(&rendered, &out);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build the shared handler: presets, capture tool and image backend.
///
/// The backend lives as long as the handler, so it is set up once here.
fn build_handler(
    config: &ServiceConfig,
    config_path: &Path,
) -> Result<ScreenshotHandler<FfmpegCapture, RustBackend>, ConfigError> {
    let presets = config::load_presets(config, config_path)?;
    info!(
        "sizes enabled: {}; {} presets",
        presets.enabled().names().join(" "),
        presets.presets().len()
    );
    info!(
        "capturing from {} with {}",
        config.capture.stream, config.capture.program
    );

    Ok(ScreenshotHandler::new(
        FfmpegCapture::from_config(&config.capture),
        RustBackend::new(),
        presets,
        config.output.render_params(),
        config.capture.effective_temp_dir(),
    ))
}
