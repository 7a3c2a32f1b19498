use super::Router;
use crate::{handlers::account, settings::WalletSettings};
use actix_web::web;
use contract_deployer::{AccountService, NetworksConfig};

pub struct AccountRouter {
    service: web::Data<AccountService>,
}

impl AccountRouter {
    pub fn new(settings: WalletSettings) -> anyhow::Result<Self> {
        let config = NetworksConfig::from_file(&settings.networks_config)?;
        Ok(Self {
            service: web::Data::new(AccountService::new(config)),
        })
    }
}

impl Router for AccountRouter {
    fn register_routes(&self, service_config: &mut web::ServiceConfig) {
        service_config
            .app_data(self.service.clone())
            .route("/createWallet", web::get().to(account::create_wallet))
            .route("/getBalance", web::post().to(account::get_balance))
            .route("/transfer", web::post().to(account::transfer));
    }
}
