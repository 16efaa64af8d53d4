mod options;

use bw_core::EngineError;
use bw_core::EngineResult;
use bw_net::HttpClient;
use bw_render::RenderConfig;
use bw_renderer::RendererProcess;
use options::CliOptions;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match CliOptions::from_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("{}", error.message);
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &CliOptions) -> EngineResult<()> {
    let markup = load_markup(options)?;

    let process = RendererProcess::new(RenderConfig {
        viewport_width: options.width,
        viewport_height: options.height,
        ..RenderConfig::default()
    });
    let document = process.parse_document(&markup)?;
    let title = document.title();
    if !title.is_empty() {
        log::info!("title: {title}");
    }

    let frame = process.paint(&document);
    frame.save(&options.out)?;
    log::info!(
        "wrote {}x{} frame with {} boxes to {}",
        frame.width(),
        frame.height(),
        frame.draw_calls,
        options.out.display()
    );
    Ok(())
}

fn load_markup(options: &CliOptions) -> EngineResult<String> {
    if !options.is_remote() {
        return std::fs::read_to_string(&options.source).map_err(|error| {
            EngineError::new(
                "app.source.read_failed",
                format!("reading `{}`: {error}", options.source),
            )
        });
    }

    let client = HttpClient::default();
    let response = if options.form.is_empty() {
        client.get(&options.source)?
    } else {
        let fields: Vec<(&str, &str)> = options
            .form
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        client.post_form(&options.source, &fields)?
    };

    log::info!(
        "{} {} ({} bytes)",
        response.status.as_u16(),
        response.reason,
        response.body.len()
    );
    if !response.status.is_success() {
        return Err(EngineError::new(
            "app.source.http_status",
            format!("{} answered {}", options.source, response.status.as_u16()),
        ));
    }
    Ok(response.text())
}
