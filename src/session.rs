use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatch::config::Region;
use aws_sdk_cloudwatch::operation::get_metric_statistics::builders::GetMetricStatisticsFluentBuilder;
use aws_sdk_cloudwatch::operation::get_metric_statistics::GetMetricStatisticsOutput;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Dimension as AwsDimension, StandardUnit, Statistic};
use std::fmt::Debug;
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::statistics::StatisticsRequest;

pub const CLOUDWATCH_SERVICE: &str = "cloudwatch";

/// Hands out service clients for a region.
#[async_trait]
pub trait Session: Send + Sync {
    type Client: MetricsClient;

    async fn create_client(&self, service_name: &str, region: Option<&str>)
        -> Result<Self::Client>;
}

#[async_trait]
pub trait MetricsClient: Send + Sync {
    type Response: Debug + Send;

    async fn get_metric_statistics(&self, request: StatisticsRequest) -> Result<Self::Response>;
}

/// A [`Session`] backed by the shared AWS config chain (environment, config/credentials
/// files, SSO, IMDS).
pub struct AwsSession {
    profile: Option<String>,
    endpoint_url: Option<String>,
}

impl AwsSession {
    pub fn new(globals: &GlobalArgs) -> Self {
        Self {
            profile: globals.profile.clone(),
            endpoint_url: globals.endpoint_url.clone(),
        }
    }
}

#[async_trait]
impl Session for AwsSession {
    type Client = CloudWatchClient;

    async fn create_client(
        &self,
        service_name: &str,
        region: Option<&str>,
    ) -> Result<CloudWatchClient> {
        if service_name != CLOUDWATCH_SERVICE {
            bail!("unsupported service '{service_name}'");
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let config = loader.load().await;
        debug!(region = ?config.region(), profile = ?self.profile, "loaded aws config");

        Ok(CloudWatchClient {
            inner: aws_sdk_cloudwatch::Client::new(&config),
        })
    }
}

pub struct CloudWatchClient {
    inner: aws_sdk_cloudwatch::Client,
}

impl CloudWatchClient {
    /// Maps the request onto the SDK call without sending it.
    fn prepare(&self, request: StatisticsRequest) -> GetMetricStatisticsFluentBuilder {
        let dimensions = request
            .dimensions
            .into_iter()
            .map(|d| AwsDimension::builder().name(d.name).value(d.value).build())
            .collect::<Vec<_>>();
        let statistics = request
            .statistics
            .iter()
            .map(|s| Statistic::from(s.as_str()))
            .collect();

        self.inner
            .get_metric_statistics()
            .namespace(request.namespace)
            .metric_name(request.metric_name)
            .set_dimensions(Some(dimensions))
            .start_time(AwsDateTime::from_millis(request.start_time.timestamp_millis()))
            .end_time(AwsDateTime::from_millis(request.end_time.timestamp_millis()))
            .period(request.period)
            .set_statistics(Some(statistics))
            .unit(StandardUnit::from(request.unit.as_str()))
    }
}

#[async_trait]
impl MetricsClient for CloudWatchClient {
    type Response = GetMetricStatisticsOutput;

    async fn get_metric_statistics(
        &self,
        request: StatisticsRequest,
    ) -> Result<GetMetricStatisticsOutput> {
        self.prepare(request)
            .send()
            .await
            .map_err(aws_sdk_cloudwatch::Error::from)
            .context("GetMetricStatistics request failed")
    }
}
