use super::Router;
use crate::{handlers::deploy, settings::ChainSettings};
use actix_web::web;
use contract_deployer::{Chain, ContractDeployer};
use ethers_solc::Solc;

/// One router per enabled chain, serving `/<chain>` and `/<chain>Price`.
pub struct DeploymentRouter {
    chain: Chain,
    deployer: web::Data<ContractDeployer>,
}

impl DeploymentRouter {
    pub fn new(chain: Chain, settings: ChainSettings, solc: Solc) -> Self {
        let deployer = ContractDeployer::new(settings.profile(chain), solc);
        Self {
            chain,
            deployer: web::Data::new(deployer),
        }
    }
}

impl Router for DeploymentRouter {
    fn register_routes(&self, service_config: &mut web::ServiceConfig) {
        // The deployer is attached per resource: the routes live at the top
        // level and all chains share the `web::Data<ContractDeployer>` type.
        let route = self.chain.route_name();
        service_config
            .service(
                web::resource(format!("/{route}"))
                    .app_data(self.deployer.clone())
                    .route(web::post().to(deploy::deploy)),
            )
            .service(
                web::resource(format!("/{route}Price"))
                    .app_data(self.deployer.clone())
                    .route(web::post().to(deploy::quote)),
            );
    }
}
