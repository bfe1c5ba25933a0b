use anyhow::Result;
use chrono::{DateTime, Utc};
use std::io::Write;
use tracing::{debug, warn};

use crate::cli::GetMetricStatisticsArgs;
use crate::error::QueryError;
use crate::session::{MetricsClient, Session, CLOUDWATCH_SERVICE};
use crate::time::{parse_relative, parse_timestamp};

const ABSOLUTE_RANGE: [&str; 2] = ["start-time", "end-time"];
const RELATIVE_RANGE: [&str; 2] = ["since", "until"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// The normalized GetMetricStatistics call, built once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsRequest {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub period: i32,
    pub statistics: Vec<String>,
    pub unit: String,
}

/// Runs `cloudwatch get-metric-statistics` and writes the raw response to `out`.
pub async fn get_metric_statistics<S: Session>(
    session: &S,
    region: Option<&str>,
    args: GetMetricStatisticsArgs,
    out: &mut impl Write,
) -> Result<()> {
    get_metric_statistics_at(session, region, args, out, Utc::now()).await
}

async fn get_metric_statistics_at<S: Session>(
    session: &S,
    region: Option<&str>,
    args: GetMetricStatisticsArgs,
    out: &mut impl Write,
    now: DateTime<Utc>,
) -> Result<()> {
    // everything that can be rejected locally is rejected before a client exists
    let request = build_request(&args, now)?;
    debug!(?request, "built statistics request");

    let client = session.create_client(CLOUDWATCH_SERVICE, region).await?;
    let response = client.get_metric_statistics(request).await?;

    writeln!(out, "{response:?}")?;
    Ok(())
}

/// Fails if any argument of `group_a` is present together with any argument of `group_b`.
/// Each entry is the argument name and whether the user supplied it.
pub fn validate_mutually_exclusive(
    group_a: &[(&str, bool)],
    group_b: &[(&str, bool)],
) -> Result<(), QueryError> {
    let first_a = group_a.iter().find(|(_, present)| *present);
    let first_b = group_b.iter().find(|(_, present)| *present);
    if let (Some((a, _)), Some((b, _))) = (first_a, first_b) {
        return Err(QueryError::validation(format!(
            "cannot specify --{a} together with --{b}"
        )));
    }
    Ok(())
}

pub fn build_request(
    args: &GetMetricStatisticsArgs,
    now: DateTime<Utc>,
) -> Result<StatisticsRequest, QueryError> {
    validate_mutually_exclusive(
        &[
            (ABSOLUTE_RANGE[0], args.start_time.is_some()),
            (ABSOLUTE_RANGE[1], args.end_time.is_some()),
        ],
        &[
            (RELATIVE_RANGE[0], args.since.is_some()),
            (RELATIVE_RANGE[1], args.until.is_some()),
        ],
    )?;

    let (start_time, end_time) = resolve_time_range(args, now)?;
    let period = parse_period(&args.period)?;
    let statistics = split_statistics(&args.statistics);

    // TODO: forward dimensions into the request, it is always sent empty for now
    if !args.dimensions.is_empty() {
        warn!(
            count = args.dimensions.len(),
            "--dimensions is accepted but not applied to the request"
        );
    }

    Ok(StatisticsRequest {
        namespace: args.namespace.clone(),
        metric_name: args.metric_name.clone(),
        dimensions: Vec::new(),
        start_time,
        end_time,
        period,
        statistics,
        unit: args.unit.clone(),
    })
}

pub fn resolve_time_range(
    args: &GetMetricStatisticsArgs,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), QueryError> {
    let (start, end) = match (&args.start_time, &args.end_time, &args.since, &args.until) {
        (Some(start), Some(end), _, _) => (
            parse_timestamp("start-time", start)?,
            parse_timestamp("end-time", end)?,
        ),
        (Some(_), None, _, _) => {
            return Err(QueryError::validation(
                "--end-time is required when --start-time is given",
            ))
        }
        (None, Some(_), _, _) => {
            return Err(QueryError::validation(
                "--start-time is required when --end-time is given",
            ))
        }
        (None, None, Some(since), until) => {
            let start = parse_relative("since", since, now)?;
            let end = match until {
                Some(until) => parse_relative("until", until, now)?,
                None => now,
            };
            (start, end)
        }
        (None, None, None, Some(_)) => {
            return Err(QueryError::validation(
                "--since is required when --until is given",
            ))
        }
        (None, None, None, None) => {
            return Err(QueryError::validation(
                "a time range is required: pass --start-time and --end-time, or --since",
            ))
        }
    };

    if start > end {
        return Err(QueryError::validation(format!(
            "the time range starts at {} which is after its end {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }
    Ok((start, end))
}

pub fn parse_period(raw: &str) -> Result<i32, QueryError> {
    let period: i32 = raw.trim().parse().map_err(|_| {
        QueryError::validation(format!(
            "--period must be a whole number of seconds, got '{raw}'"
        ))
    })?;
    if period <= 0 {
        return Err(QueryError::validation("--period must be greater than zero"));
    }
    Ok(period)
}

/// Splits the comma separated `--statistics` value, keeping order and count.
pub fn split_statistics(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}
