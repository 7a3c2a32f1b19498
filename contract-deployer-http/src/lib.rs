mod handlers;
mod metrics;
mod responses;
mod routers;
mod run;
mod settings;
mod tracer;

pub use responses::{
    AccountErrorResponse, BalancesResponse, DeployResponse, ErrorResponse, QuoteResponse,
    TransferResponse, WalletResponse,
};
pub use routers::{configure_router, AppRouter, Router};
pub use run::run;
pub use settings::Settings;
pub use tracer::init_logs;
