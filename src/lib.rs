//! qrbatch - QR Scan Batching Station
//!
//! Reads codes from a live camera feed, keeps the unique values in scan
//! order and submits the whole batch to an HTTP endpoint as one GET request.
//!
//! # Commands
//!
//! - `qrbatch scan` opens the interactive station (see [`tui`])
//! - `qrbatch send` submits values given as arguments or on stdin
//!
//! # Library Layout
//!
//! - [`batch`]: the ordered, duplicate-free batch
//! - [`debounce`]: recognition events to accepted values
//! - [`station`]: batch ownership and the submit lifecycle
//! - [`submit`]: request construction, outcomes and notifications
//! - [`http`] and [`capture`]: the network and camera seams

pub mod batch;
pub mod capture;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http;
pub mod logging;
pub mod output;
pub mod progress;
pub mod signal;
pub mod station;
pub mod submit;
pub mod tui;

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::{mpsc, Arc};

use anyhow::Context;

use crate::batch::CodeValue;
use crate::capture::{CommandCapture, NullCapture};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs, SendArgs};
use crate::config::Config;
use crate::debounce::ScanDebouncer;
use crate::error::ExitCode;
use crate::http::ReqwestHttpClient;
use crate::logging::{init_logging, LogTarget};
use crate::output::{exit_code_for, SendReport};
use crate::progress::SendSpinner;
use crate::signal::{install_handler, ShutdownHandler};
use crate::station::Station;
use crate::submit::LogNotifier;
use crate::tui::{run_tui, App, Session, Theme};

/// Run the application with the parsed command line.
///
/// # Errors
///
/// Returns an error for anything that prevents the command from running at
/// all. Rejected or failed submissions are reported through the exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let target = LogTarget::select(cli.log_file.clone(), cli.command.is_interactive());
    init_logging(cli.verbose, cli.quiet, target)?;

    let shutdown = install_handler().context("Failed to install Ctrl+C handler")?;

    match &cli.command {
        Commands::Scan(args) => run_scan(&cli, args, &shutdown),
        Commands::Send(args) => run_send(&cli, args, &shutdown),
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs, shutdown: &ShutdownHandler) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), &args.overrides())?;
    let config_path = cli.config.clone().or_else(|| Config::config_path().ok());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    let (scan_tx, scan_rx) = mpsc::channel();
    let capture = Arc::new(CommandCapture::new(config.capture_command.clone(), scan_tx));
    let client = Arc::new(ReqwestHttpClient::new(config.request_timeout()));

    let mut session = Session::new(
        Station::new(),
        capture,
        scan_rx,
        client,
        runtime.handle().clone(),
        ScanDebouncer::new(config.debounce_window()),
        config_path,
    );
    let mut app = App::new(config.endpoint.clone()).with_theme(Theme::from_arg(config.theme));

    log::info!("Opening scanning station for {}", config.endpoint);
    run_tui(&mut app, &mut session, Some(shutdown.get_flag()))?;

    let remaining = session.station().len();
    if remaining > 0 {
        log::info!("Exiting with {} unsent value(s)", remaining);
    }

    if shutdown.is_shutdown_requested() {
        Ok(ExitCode::Interrupted)
    } else {
        Ok(ExitCode::Success)
    }
}

fn run_send(cli: &Cli, args: &SendArgs, shutdown: &ShutdownHandler) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), &args.overrides())?;

    let raw = if args.values.is_empty() && !io::stdin().is_terminal() {
        read_values(io::stdin().lock())?
    } else {
        args.values.clone()
    };

    let station = Station::new();
    station.add_if_absent(raw.into_iter().filter_map(CodeValue::new));

    if station.is_empty() {
        log::warn!("Nothing to send");
        return Ok(ExitCode::NothingToSend);
    }

    let mut stdout = io::stdout().lock();
    send_batch(&station, &config, args.output, cli.quiet, shutdown, &mut stdout)
}

/// Submit the station's batch once and write the report to `out`.
///
/// Once the request has gone out its outcome is final: an interrupt during
/// the request does not change the exit code or suppress the report. An
/// interrupt before anything was sent yields [`ExitCode::Interrupted`].
fn send_batch<W: Write>(
    station: &Station,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
    shutdown: &ShutdownHandler,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    if shutdown.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }

    let values = station.values();
    let client = ReqwestHttpClient::new(config.request_timeout());
    let show_spinner = output == OutputFormat::Text && !quiet && io::stderr().is_terminal();
    let spinner = SendSpinner::start(
        format!("Sending {} value(s) to {}", values.len(), config.endpoint),
        show_spinner,
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let outcome = runtime.block_on(station.submit(
        &config.endpoint,
        &client,
        &NullCapture::default(),
        &LogNotifier,
    ));
    spinner.finish();

    let Some(outcome) = outcome else {
        return Ok(if shutdown.is_shutdown_requested() {
            ExitCode::Interrupted
        } else {
            ExitCode::NothingToSend
        });
    };
    if shutdown.is_shutdown_requested() {
        log::info!("Interrupted while sending; reporting the completed request");
    }

    let code = exit_code_for(&outcome);
    let report = SendReport::new(config.endpoint.clone(), values, outcome);

    match output {
        OutputFormat::Json => report.write_json(out)?,
        OutputFormat::Text => {
            if !quiet {
                writeln!(out, "{}", report.to_text())?;
            }
        }
    }

    Ok(code)
}

/// Read one value per line, skipping blank lines.
fn read_values<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut values = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            values.push(trimmed.to_string());
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer one request with `status` and `body`, running `during` after
    /// the request has arrived and before the response is written.
    fn serve_once<F>(status: &str, body: &str, during: F) -> (String, JoinHandle<String>)
    where
        F: FnOnce() + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/send", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            during();
            stream.write_all(response.as_bytes()).unwrap();
            let request = String::from_utf8_lossy(&request).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });

        (url, handle)
    }

    fn station_with(values: &[&str]) -> Station {
        let station = Station::new();
        station.add_if_absent(values.iter().filter_map(|v| CodeValue::new(*v)));
        station
    }

    fn config_for(endpoint: String) -> Config {
        Config {
            endpoint,
            request_timeout_secs: 5,
            ..Config::default()
        }
    }

    #[test]
    fn test_send_batch_interrupt_during_request_keeps_outcome() {
        let shutdown = ShutdownHandler::new();
        let in_flight = shutdown.clone();
        let (url, server) = serve_once("200 OK", "saved", move || in_flight.request_shutdown());
        let station = station_with(&["A", "B"]);
        let mut out = Vec::new();

        let code = send_batch(
            &station,
            &config_for(url),
            OutputFormat::Json,
            false,
            &shutdown,
            &mut out,
        )
        .unwrap();

        assert!(shutdown.is_shutdown_requested());
        assert_eq!(code, ExitCode::Success);
        assert!(station.is_empty());
        assert_eq!(server.join().unwrap(), "GET /send?qr=A%2CB HTTP/1.1");

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["outcome"], "accepted");
        assert_eq!(json["body"], "saved");
        assert_eq!(json["exit_code"], 0);
    }

    #[test]
    fn test_send_batch_interrupt_during_rejected_request() {
        let shutdown = ShutdownHandler::new();
        let in_flight = shutdown.clone();
        let (url, server) =
            serve_once("500 Internal Server Error", "down", move || in_flight.request_shutdown());
        let station = station_with(&["A"]);
        let mut out = Vec::new();

        let code = send_batch(
            &station,
            &config_for(url),
            OutputFormat::Json,
            false,
            &shutdown,
            &mut out,
        )
        .unwrap();
        server.join().unwrap();

        assert_eq!(code, ExitCode::Rejected);
        assert_eq!(station.len(), 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_send_batch_interrupt_before_sending() {
        let shutdown = ShutdownHandler::new();
        shutdown.request_shutdown();
        let station = station_with(&["A"]);
        let mut out = Vec::new();

        // Nothing listens here; the request must not be attempted
        let code = send_batch(
            &station,
            &config_for("http://127.0.0.1:9/send".to_string()),
            OutputFormat::Json,
            false,
            &shutdown,
            &mut out,
        )
        .unwrap();

        assert_eq!(code, ExitCode::Interrupted);
        assert_eq!(station.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_send_batch_text_report() {
        yansi::disable();
        let (url, server) = serve_once("201 Created", "", || {});
        let station = station_with(&["X"]);
        let mut out = Vec::new();

        let code = send_batch(
            &station,
            &config_for(url),
            OutputFormat::Text,
            false,
            &ShutdownHandler::new(),
            &mut out,
        )
        .unwrap();
        server.join().unwrap();

        assert_eq!(code, ExitCode::Success);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "✓ 1 value(s) accepted (status 201)\n"
        );
    }

    #[test]
    fn test_read_values_skips_blank_lines() {
        let input = "A\n\n  B  \r\nA\n";
        let values = read_values(input.as_bytes()).unwrap();
        assert_eq!(values, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_read_values_empty() {
        assert!(read_values(&b""[..]).unwrap().is_empty());
    }
}
