//! upload command - Upload a single object
//!
//! Puts a local file (or stdin) into a bucket with one request, then polls
//! until the object is visible. Exit code 0 means the object was confirmed.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use osc_core::{
    ByteSource, ClassifiedError, ClientOptions, ErrorKind, ObjectKey, ObjectStoreClient,
    UploadOutcome, UploadRequest, WaitConfig, WaitReport,
};
use serde::Serialize;

use super::GlobalArgs;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Destination bucket
    pub bucket: String,

    /// Destination object key
    pub key: String,

    /// Local file to upload, or `-` to read from stdin
    pub file: String,

    /// Content type (guessed from the key or file name if omitted)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Expected size in bytes when reading from stdin
    #[arg(long, value_name = "BYTES")]
    pub size: Option<u64>,

    /// Seconds to wait for the object to become visible
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Milliseconds between existence checks
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    bucket: String,
    key: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    attempts: u32,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "is_zero")]
    head_errors: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<ErrorKind>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Execute the upload command
pub async fn execute(
    args: UploadArgs,
    global: &GlobalArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let key = match ObjectKey::new(&args.bucket, &args.key) {
        Ok(k) => k,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let (config, store) = match super::setup(global, &formatter).await {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mut options = match ClientOptions::from_config(&config) {
        Ok(o) => o,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };
    options.wait = match wait_config(&args, options.wait) {
        Ok(w) => w,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    // Stdin is buffered inside the uploader, so its length is not known here.
    let (source, size_bytes) = if args.file == "-" {
        (ByteSource::Reader(Box::new(tokio::io::stdin())), None)
    } else {
        let path = PathBuf::from(&args.file);
        let size = tokio::fs::metadata(&path).await.ok().map(|m| m.len());
        (ByteSource::Path(path), size)
    };

    let mut request = UploadRequest::new(key.clone(), source);
    if let Some(size) = args.size {
        request = request.with_size_hint(size);
    }
    if let Some(ct) = args.content_type {
        request = request.with_content_type(ct);
    }

    let spinner = spinner(&formatter, &key);
    let client = ObjectStoreClient::new(store, options);
    let result = client.upload_object(request).await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            formatter.classified_error(&failure_context(&err, &key, &args.file), &err);
            return ExitCode::from_classified(&err);
        }
    };

    report(&formatter, &key, size_bytes, outcome)
}

/// Apply command-line overrides to the configured wait settings
///
/// A `--timeout` shorter than the configured interval pulls the interval down
/// with it. An explicit `--interval` longer than the timeout is an error.
fn wait_config(args: &UploadArgs, configured: WaitConfig) -> osc_core::Result<WaitConfig> {
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(configured.timeout());
    let interval = match args.interval {
        Some(ms) => Duration::from_millis(ms),
        None => configured.interval().min(timeout),
    };
    WaitConfig::new(timeout, interval)
}

/// Human context for a failed upload, separating "nothing was sent" from a store rejection
fn failure_context(err: &ClassifiedError, key: &ObjectKey, file: &str) -> String {
    match err.kind {
        ErrorKind::ObjectTooLarge if err.is_local() => format!("Nothing sent for {key}"),
        ErrorKind::ObjectTooLarge => format!("Store rejected {key} as too large"),
        _ if err.is_local() => format!("Nothing uploaded from {file}"),
        _ => format!("Couldn't upload {file} to {key}"),
    }
}

fn spinner(formatter: &Formatter, key: &ObjectKey) -> ProgressBar {
    if !formatter.progress_enabled() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Uploading {key}"));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn report(
    formatter: &Formatter,
    key: &ObjectKey,
    size_bytes: Option<u64>,
    outcome: UploadOutcome,
) -> ExitCode {
    let (status, wait, code) = match outcome {
        UploadOutcome::Confirmed(r) => ("confirmed", r, ExitCode::Success),
        UploadOutcome::TimedOut(r) => ("timed_out", r, ExitCode::TimedOut),
    };

    if formatter.is_json() {
        formatter.json(&UploadOutput {
            bucket: key.bucket.clone(),
            key: key.key.clone(),
            status,
            size_bytes,
            attempts: wait.attempts,
            elapsed_ms: wait.elapsed.as_millis() as u64,
            head_errors: wait.head_errors,
            last_error: wait.last_error,
        });
        return code;
    }

    let size = size_bytes
        .map(|s| format!(" ({})", formatter.style_size(&format_size(s, BINARY))))
        .unwrap_or_default();
    let name = formatter.style_name(&key.to_string());

    match outcome {
        UploadOutcome::TimedOut(r) => {
            formatter.warning(&timeout_message(formatter, &name, &size, &r))
        }
        UploadOutcome::Confirmed(r) => formatter.success(&format!(
            "Uploaded {name}{size}, visible after {}",
            describe_wait(formatter, &r)
        )),
    }

    code
}

fn timeout_message(formatter: &Formatter, name: &str, size: &str, report: &WaitReport) -> String {
    let waited = describe_wait(formatter, report);
    match report.last_error {
        Some(kind) => format!(
            "Uploaded {name}{size}, but visibility could not be confirmed after {waited}; \
             {} of the existence checks failed (last: {kind})",
            report.head_errors
        ),
        None => format!(
            "Uploaded {name}{size}, but it was not visible after {waited}; it will most likely appear shortly"
        ),
    }
}

fn describe_wait(formatter: &Formatter, report: &WaitReport) -> String {
    let checks = if report.attempts == 1 { "check" } else { "checks" };
    formatter.style_date(&format!(
        "{:.1}s, {} {checks}",
        report.elapsed.as_secs_f64(),
        report.attempts
    ))
}
