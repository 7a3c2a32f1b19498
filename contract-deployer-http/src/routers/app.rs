use super::{
    account::AccountRouter,
    deployment::DeploymentRouter,
    router::{configure_router, Router},
};
use crate::{
    handlers::status::{self, HealthStatus},
    settings::Settings,
};
use actix_web::web;
use contract_deployer::{Chain, SolcConfig};

pub struct AppRouter {
    ethereum: Option<DeploymentRouter>,
    bnb: Option<DeploymentRouter>,
    celo: Option<DeploymentRouter>,
    account: Option<AccountRouter>,
    health: web::Data<HealthStatus>,
}

impl AppRouter {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let chains: Vec<_> = settings
            .enabled_chains()
            .into_iter()
            .map(|(chain, _)| chain)
            .collect();

        // One resolved compiler shared by every chain router.
        let (mut ethereum, mut bnb, mut celo) = (None, None, None);
        if !chains.is_empty() {
            let solc = SolcConfig::from(settings.solc.clone()).resolve()?;
            ethereum = settings.ethereum.enabled.then(|| {
                DeploymentRouter::new(Chain::Ethereum, settings.ethereum.clone(), solc.clone())
            });
            bnb = settings
                .bnb
                .enabled
                .then(|| DeploymentRouter::new(Chain::Bnb, settings.bnb.clone(), solc.clone()));
            celo = settings
                .celo
                .enabled
                .then(|| DeploymentRouter::new(Chain::Celo, settings.celo.clone(), solc));
        }

        let account = match settings.wallet.enabled {
            false => None,
            true => Some(AccountRouter::new(settings.wallet.clone())?),
        };

        let health = web::Data::new(HealthStatus {
            status: "ok",
            chains: chains.iter().map(Chain::route_name).collect(),
            wallet: settings.wallet.enabled,
        });

        Ok(Self {
            ethereum,
            bnb,
            celo,
            account,
            health,
        })
    }
}

impl Router for AppRouter {
    fn register_routes(&self, service_config: &mut web::ServiceConfig) {
        service_config
            .app_data(self.health.clone())
            .route("/health", web::get().to(status::status))
            .configure(configure_router(&self.ethereum))
            .configure(configure_router(&self.bnb))
            .configure(configure_router(&self.celo))
            .configure(configure_router(&self.account));
    }
}
