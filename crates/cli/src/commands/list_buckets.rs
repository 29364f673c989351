//! list-buckets command - List all buckets
//!
//! Walks every page of the bucket listing. If a page fails, the buckets
//! gathered so far are still printed before the error.

use clap::Args;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use osc_core::{Bucket, ClassifiedError, ClientOptions, ErrorKind, ListOutcome, ObjectStoreClient};
use serde::Serialize;

use super::GlobalArgs;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Args, Debug)]
pub struct ListBucketsArgs {
    /// Buckets to request per page
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
    pub page_size: Option<i32>,
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    buckets: &'a [Bucket],
    count: usize,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ClassifiedError>,
}

/// Execute the list-buckets command
pub async fn execute(
    args: ListBucketsArgs,
    global: &GlobalArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

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
    if args.page_size.is_some() {
        options.page_size = args.page_size;
    }

    let client = ObjectStoreClient::new(store, options);
    let outcome = client.list_buckets().await;

    render(&formatter, &outcome)
}

fn render(formatter: &Formatter, outcome: &ListOutcome) -> ExitCode {
    if formatter.is_json() {
        formatter.json(&ListOutput {
            buckets: &outcome.buckets,
            count: outcome.buckets.len(),
            complete: outcome.is_complete(),
            error: outcome.error.as_ref(),
        });
    } else if outcome.buckets.is_empty() {
        if outcome.is_complete() {
            formatter.println("No buckets found.");
        }
    } else {
        formatter.println(&bucket_table(formatter, &outcome.buckets).to_string());
    }

    match &outcome.error {
        None => ExitCode::Success,
        Some(err) => {
            let context = match err.kind {
                ErrorKind::AccessDenied => "You don't have permission to list buckets for this account",
                _ => "Couldn't list buckets",
            };
            formatter.classified_error(context, err);
            if !outcome.buckets.is_empty() {
                formatter.warning(&format!(
                    "Listing is incomplete: showing {} bucket(s) fetched before the error",
                    outcome.buckets.len()
                ));
            }
            ExitCode::from_classified(err)
        }
    }
}

fn bucket_table(formatter: &Formatter, buckets: &[Bucket]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !formatter.colors_enabled() {
        table.force_no_tty();
    }

    table.set_header(
        ["NAME", "CREATED", "REGION"].map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for bucket in buckets {
        table.add_row(vec![
            Cell::new(&bucket.name),
            Cell::new(format_created(bucket)),
            Cell::new(bucket.region.as_deref().unwrap_or("-")),
        ]);
    }

    table
}

fn format_created(bucket: &Bucket) -> String {
    bucket
        .created
        .map(|ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_core::{RemoteError, classify};

    #[test]
    fn test_format_created() {
        let mut bucket = Bucket::new("logs");
        assert_eq!(format_created(&bucket), "-");

        bucket.created = jiff::Timestamp::from_second(1_700_000_000).ok();
        assert_eq!(format_created(&bucket), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_table_lists_every_bucket() {
        let formatter = Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        });
        let buckets = vec![Bucket::new("alpha"), Bucket::new("beta")];
        let rendered = bucket_table(&formatter, &buckets).to_string();
        assert!(rendered.contains("alpha"));
        assert!(rendered.contains("beta"));
        assert!(rendered.contains("NAME"));
    }

    #[test]
    fn test_json_output_shape() {
        let err = classify(&RemoteError::service("AccessDenied", "Access Denied"));
        let buckets = vec![Bucket::new("alpha")];
        let output = ListOutput {
            buckets: &buckets,
            count: 1,
            complete: false,
            error: Some(&err),
        };

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["buckets"][0]["name"], "alpha");
        assert_eq!(json["complete"], false);
        assert_eq!(json["error"]["kind"], "access_denied");
    }

    #[test]
    fn test_partial_listing_exit_code() {
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        let outcome = ListOutcome {
            buckets: vec![Bucket::new("alpha")],
            error: Some(classify(&RemoteError::service("AccessDenied", "denied"))),
        };
        assert_eq!(render(&formatter, &outcome), ExitCode::AccessDenied);

        let complete = ListOutcome {
            buckets: vec![],
            error: None,
        };
        assert_eq!(render(&formatter, &complete), ExitCode::Success);
    }
}
