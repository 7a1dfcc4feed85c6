use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;

use crate::node::NodeContext;
use crate::web::models::{ApiResponse, BalanceResponse, CreateWalletRequest, WalletResponse};

/// Create a new wallet
#[utoipa::path(
    post,
    path = "/api/v1/wallet",
    tag = "Wallet",
    request_body = CreateWalletRequest,
    responses(
        (status = 200, description = "Wallet created", body = ApiResponse<WalletResponse>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_wallet(
    State(node): State<Arc<NodeContext>>,
    Json(_request): Json<CreateWalletRequest>,
) -> Result<Json<ApiResponse<WalletResponse>>, StatusCode> {
    let address = node
        .create_wallet()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ApiResponse::success(WalletResponse { address })))
}

/// List all local wallet addresses
#[utoipa::path(
    get,
    path = "/api/v1/wallet/addresses",
    tag = "Wallet",
    responses(
        (status = 200, description = "Addresses retrieved", body = ApiResponse<Vec<String>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_addresses(
    State(node): State<Arc<NodeContext>>,
) -> Result<Json<ApiResponse<Vec<String>>>, StatusCode> {
    let addresses = node
        .list_wallet_addresses()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ApiResponse::success(addresses)))
}

/// Get wallet information for an address
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{address}",
    tag = "Wallet",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Wallet found", body = ApiResponse<WalletResponse>),
        (status = 404, description = "Wallet not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_wallet_info(
    State(node): State<Arc<NodeContext>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WalletResponse>>, StatusCode> {
    let wallet = node
        .get_wallet(&address)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ApiResponse::success(WalletResponse {
        address: wallet.get_address().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    })))
}

/// Get the balance of an address
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{address}/balance",
    tag = "Wallet",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Balance retrieved", body = ApiResponse<BalanceResponse>),
        (status = 400, description = "Invalid address"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_balance(
    State(node): State<Arc<NodeContext>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<BalanceResponse>>, StatusCode> {
    if !crate::validate_address(&address).unwrap_or(false) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let balance = node
        .get_balance(&address)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ApiResponse::success(BalanceResponse { address, balance })))
}
