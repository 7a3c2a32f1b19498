use actix_web::{dev::Server, App, HttpServer};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use std::net::SocketAddr;

lazy_static! {
    pub static ref DEPLOYMENTS: IntCounterVec = register_int_counter_vec!(
        "contract_deployer_deploy_contract",
        "number of contract deployment requests",
        &["chain", "endpoint", "status"],
    )
    .unwrap();
}

pub fn count_deploy_contract(chain: &str, endpoint: &str, success: bool) {
    let status = if success { "ok" } else { "fail" };
    DEPLOYMENTS
        .with_label_values(&[chain, endpoint, status])
        .inc();
}

#[derive(Clone)]
pub struct Metrics {
    metrics_middleware: PrometheusMetrics,
    deployment_middleware: PrometheusMetrics,
}

impl Metrics {
    pub fn new(endpoint: String) -> Self {
        let registry = prometheus::default_registry();
        let metrics_middleware = PrometheusMetricsBuilder::new("contract_deployer_metrics")
            .registry(registry.clone())
            .endpoint(&endpoint)
            .build()
            .unwrap();
        // note: deployment middleware has no endpoint
        let deployment_middleware = PrometheusMetricsBuilder::new("contract_deployer")
            .registry(registry.clone())
            .build()
            .unwrap();

        Self {
            metrics_middleware,
            deployment_middleware,
        }
    }

    pub fn middleware(&self) -> &PrometheusMetrics {
        &self.deployment_middleware
    }

    pub fn run_server(&self, addr: SocketAddr) -> Server {
        let metrics_middleware = self.metrics_middleware.clone();
        HttpServer::new(move || App::new().wrap(metrics_middleware.clone()))
            .bind(addr)
            .unwrap()
            .run()
    }
}
