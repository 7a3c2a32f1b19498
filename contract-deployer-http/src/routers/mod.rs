mod account;
mod app;
mod deployment;
mod router;

pub use self::{
    app::AppRouter,
    router::{configure_router, Router},
};
