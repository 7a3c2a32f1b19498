use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub chains: Vec<&'static str>,
    pub wallet: bool,
}

pub async fn status(health: web::Data<HealthStatus>) -> HttpResponse {
    HttpResponse::Ok().json(health.get_ref())
}
