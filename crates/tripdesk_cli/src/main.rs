//! Line-oriented driver for the trips routes.
//!
//! # Responsibility
//! - Read `METHOD PATH [JSON-BODY]` lines from stdin.
//! - Dispatch each through the core route table and print `STATUS BODY`.
//!
//! Configuration comes from `TRIPDESK_*` environment variables.

use http::Method;
use log::warn;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tripdesk_core::{core_version, App, AppConfig, HttpRequest, HttpResponse};

fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("tripdesk: {err}");
            return ExitCode::FAILURE;
        }
    };
    let app = match App::open(&config) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("tripdesk: {err}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("tripdesk_core version={}", core_version());

    match run(&app, io::stdin().lock(), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tripdesk: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(app: &App, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_request(trimmed) {
            Ok(request) => {
                let response = app.dispatch(&request);
                writeln!(output, "{}", render(&response))?;
            }
            Err(message) => {
                warn!("event=cli_parse module=cli status=error");
                writeln!(output, "error: {message}")?;
            }
        }
    }
    output.flush()
}

fn parse_request(line: &str) -> Result<HttpRequest, String> {
    let mut parts = line.splitn(3, char::is_whitespace);
    let method = parts.next().unwrap_or_default();
    let path = parts
        .next()
        .ok_or_else(|| "usage: METHOD PATH [JSON-BODY]".to_string())?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid method `{method}`"))?;

    let request = HttpRequest::new(method, path);
    match parts.next().map(str::trim).filter(|body| !body.is_empty()) {
        Some(body) => serde_json::from_str(body)
            .map(|body| request.with_body(body))
            .map_err(|err| format!("invalid JSON body: {err}")),
        None => Ok(request),
    }
}

fn render(response: &HttpResponse) -> String {
    match &response.body {
        Some(body) => format!("{} {body}", response.status.as_u16()),
        None => response.status.as_u16().to_string(),
    }
}
