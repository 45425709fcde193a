use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AssetMaster, AssetMasterRecord, Branch, BranchDirectory, CustomerLookupRequest,
    CustomerMaster, CustomerProfile, CustomerSyncPayload, CustomerSyncResult, InstallmentQuote,
    InstallmentRequest, LoanAmountQuery, LoanAmountQuote, LoanCalculator, MarketingProgram,
    ProgramQuery, UpstreamError, Upstreams, VehicleCheck, VehicleCheckRequest,
};
use crate::config::UpstreamConfig;
use crate::workflows::principle::repository::{EventError, EventPublisher, PrincipleEvent};

const ASSET_MASTER: &str = "asset-master";
const BRANCH_SERVICE: &str = "branch-service";
const CUSTOMER_MASTER: &str = "customer-master";
const LOAN_SERVICE: &str = "loan-service";
const EVENT_BUS: &str = "event-bus";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Shared reqwest plumbing for one upstream service.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    service: &'static str,
    base_url: Url,
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(
        service: &'static str,
        base_url: &str,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url).map_err(|err| UpstreamError::Configuration {
            service,
            detail: format!("invalid base url '{base_url}': {err}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Configuration {
                service,
                detail: format!("base url '{base_url}' cannot carry a path"),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| UpstreamError::Transport { service, source })?;

        Ok(Self {
            service,
            base_url,
            client,
            token,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET a resource, mapping 404 to `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Option<T>, UpstreamError> {
        let url = self.url(segments);
        debug!(service = self.service, %url, "upstream GET");
        let response = self
            .authorize(self.client.get(url).query(query))
            .send()
            .await
            .map_err(|source| self.transport(source))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.decode(response).await.map(Some)
    }

    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_post(segments, body).await?;
        self.decode(response).await
    }

    async fn send_post<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Response, UpstreamError> {
        let url = self.url(segments);
        debug!(service = self.service, %url, "upstream POST");
        self.authorize(self.client.post(url).json(body))
            .send()
            .await
            .map_err(|source| self.transport(source))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service: self.service,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| self.transport(source))?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|err| UpstreamError::Decode {
                service: self.service,
                detail: err.to_string(),
            })?;
        Ok(envelope.data)
    }

    fn transport(&self, source: reqwest::Error) -> UpstreamError {
        UpstreamError::Transport {
            service: self.service,
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpAssetMaster {
    gateway: HttpGateway,
}

impl HttpAssetMaster {
    pub fn new(gateway: HttpGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AssetMaster for HttpAssetMaster {
    async fn asset(
        &self,
        asset_code: &str,
        branch_id: &str,
    ) -> Result<Option<AssetMasterRecord>, UpstreamError> {
        self.gateway
            .get_optional(
                &["api", "v1", "assets", asset_code],
                &[("branch_id", branch_id)],
            )
            .await
    }

    async fn vehicle_check(
        &self,
        request: &VehicleCheckRequest,
    ) -> Result<VehicleCheck, UpstreamError> {
        self.gateway
            .post(&["api", "v1", "assets", "vehicle-check"], request)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct HttpBranchDirectory {
    gateway: HttpGateway,
}

impl HttpBranchDirectory {
    pub fn new(gateway: HttpGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl BranchDirectory for HttpBranchDirectory {
    async fn branch(&self, branch_id: &str) -> Result<Option<Branch>, UpstreamError> {
        self.gateway
            .get_optional(&["api", "v1", "branches", branch_id], &[])
            .await
    }
}

#[derive(Debug, Clone)]
pub struct HttpCustomerMaster {
    gateway: HttpGateway,
}

impl HttpCustomerMaster {
    pub fn new(gateway: HttpGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CustomerMaster for HttpCustomerMaster {
    async fn lookup(
        &self,
        request: &CustomerLookupRequest,
    ) -> Result<CustomerProfile, UpstreamError> {
        self.gateway
            .post(&["api", "v1", "customers", "lookup"], request)
            .await
    }

    async fn sync(
        &self,
        payload: &CustomerSyncPayload,
    ) -> Result<CustomerSyncResult, UpstreamError> {
        self.gateway
            .post(&["api", "v1", "customers", "sync"], payload)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct HttpLoanCalculator {
    gateway: HttpGateway,
}

impl HttpLoanCalculator {
    pub fn new(gateway: HttpGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl LoanCalculator for HttpLoanCalculator {
    async fn max_loan_amount(
        &self,
        query: &LoanAmountQuery,
    ) -> Result<LoanAmountQuote, UpstreamError> {
        self.gateway
            .post(&["api", "v1", "loans", "max-amount"], query)
            .await
    }

    async fn eligible_programs(
        &self,
        query: &ProgramQuery,
    ) -> Result<Vec<MarketingProgram>, UpstreamError> {
        self.gateway
            .post(&["api", "v1", "programs", "eligible"], query)
            .await
    }

    async fn installment(
        &self,
        request: &InstallmentRequest,
    ) -> Result<InstallmentQuote, UpstreamError> {
        self.gateway
            .post(&["api", "v1", "installments", "calculate"], request)
            .await
    }
}

/// Builds every reqwest-backed adapter from the upstream configuration.
pub struct HttpUpstreams;

impl HttpUpstreams {
    pub fn from_config(config: &UpstreamConfig) -> Result<Upstreams, UpstreamError> {
        let gateway = |service: &'static str, url: &str| {
            HttpGateway::new(service, url, config.timeout(), config.api_token.clone())
        };

        Ok(Upstreams {
            assets: Arc::new(HttpAssetMaster::new(gateway(
                ASSET_MASTER,
                &config.asset_master_url,
            )?)),
            branches: Arc::new(HttpBranchDirectory::new(gateway(
                BRANCH_SERVICE,
                &config.branch_service_url,
            )?)),
            customers: Arc::new(HttpCustomerMaster::new(gateway(
                CUSTOMER_MASTER,
                &config.customer_master_url,
            )?)),
            loans: Arc::new(HttpLoanCalculator::new(gateway(
                LOAN_SERVICE,
                &config.loan_service_url,
            )?)),
        })
    }
}

#[derive(Debug, Serialize)]
struct EventEnvelope<'a> {
    topic: &'a str,
    payload: &'a PrincipleEvent,
}

/// Publishes state transitions to the event bus HTTP ingress.
#[derive(Debug, Clone)]
pub struct HttpEventPublisher {
    gateway: HttpGateway,
}

impl HttpEventPublisher {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            gateway: HttpGateway::new(EVENT_BUS, base_url, timeout, token)?,
        })
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: PrincipleEvent) -> Result<(), EventError> {
        let envelope = EventEnvelope {
            topic: &event.topic,
            payload: &event,
        };
        let response = self
            .gateway
            .send_post(&["api", "v1", "events"], &envelope)
            .await
            .map_err(|err| EventError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(EventError::Transport(format!(
                "{} rejected event with status {}",
                self.gateway.service(),
                status.as_u16()
            )))
        }
    }
}
