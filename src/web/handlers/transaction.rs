use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;

use crate::node::NodeContext;
use crate::transaction::TxSummary;
use crate::web::models::{
    ApiResponse, PaginatedResponse, SendBitCoinResponse, SendTransactionRequest, TransactionQuery,
    TransactionResponse,
};

/// Create, sign, and submit a transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "Transaction",
    request_body = SendTransactionRequest,
    responses(
        (status = 200, description = "Transaction submitted", body = ApiResponse<SendBitCoinResponse>),
        (status = 400, description = "Bad request - invalid addresses or amount"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn send_transaction(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<SendTransactionRequest>,
) -> Result<Json<ApiResponse<SendBitCoinResponse>>, StatusCode> {
    if !crate::validate_address(&request.from_address).unwrap_or(false)
        || !crate::validate_address(&request.to_address).unwrap_or(false)
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    let txid = node
        .btc_transaction(&request.from_address, &request.to_address, request.amount)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    Ok(Json(ApiResponse::success(SendBitCoinResponse { txid })))
}

/// Look up a single transaction in the mempool by ID
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{txid}",
    tag = "Transaction",
    params(("txid" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction retrieved", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_transaction(
    State(node): State<Arc<NodeContext>>,
    Path(txid): Path<String>,
) -> Result<Json<ApiResponse<TransactionResponse>>, StatusCode> {
    let tx = node
        .get_transaction(&txid)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ApiResponse::success(TransactionResponse {
        txid: tx.id_hex(),
        is_coinbase: tx.is_coinbase(),
        input_count: tx.inputs().len(),
        output_count: tx.outputs().len(),
        total_output_value: tx.outputs().iter().map(|o| o.value()).sum(),
    })))
}

/// Transactions seen anywhere in the chain, paginated
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "Transaction",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default: 0)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Transactions retrieved", body = ApiResponse<PaginatedResponse<TransactionResponse>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_transactions(
    State(node): State<Arc<NodeContext>>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<TransactionResponse>>>, StatusCode> {
    let page = query.page.unwrap_or(0);
    let limit = query.limit.unwrap_or(10);

    let all = node
        .find_all_transactions()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let total = all.len() as u32;

    let items: Vec<TransactionResponse> = all
        .values()
        .skip(page as usize * limit as usize)
        .take(limit as usize)
        .map(summary_to_response)
        .collect();

    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, page, limit, total))))
}

/// Transactions currently waiting in the mempool
#[utoipa::path(
    get,
    path = "/api/v1/transactions/mempool",
    tag = "Transaction",
    responses(
        (status = 200, description = "Mempool transactions retrieved", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_mempool(
    State(node): State<Arc<NodeContext>>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, StatusCode> {
    let txs = node
        .get_mempool_transactions()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_iter()
        .map(|tx| TransactionResponse {
            txid: tx.id_hex(),
            is_coinbase: tx.is_coinbase(),
            input_count: tx.inputs().len(),
            output_count: tx.outputs().len(),
            total_output_value: tx.outputs().iter().map(|o| o.value()).sum(),
        })
        .collect();

    Ok(Json(ApiResponse::success(txs)))
}

/// Look up a single mempool transaction by ID
#[utoipa::path(
    get,
    path = "/api/v1/transactions/mempool/{txid}",
    tag = "Transaction",
    params(("txid" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction retrieved", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_mempool_transaction(
    State(node): State<Arc<NodeContext>>,
    Path(txid): Path<String>,
) -> Result<Json<ApiResponse<TransactionResponse>>, StatusCode> {
    get_transaction(State(node), Path(txid)).await
}

/// Transaction history for an address (as a sender or receiver)
#[utoipa::path(
    get,
    path = "/api/v1/transactions/address/{address}",
    tag = "Transaction",
    params(
        ("address" = String, Path, description = "Wallet address"),
        ("page" = Option<u32>, Query, description = "Page number (default: 0)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Address transactions retrieved", body = ApiResponse<PaginatedResponse<TransactionResponse>>),
        (status = 400, description = "Invalid address format"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_address_transactions(
    State(node): State<Arc<NodeContext>>,
    Path(address): Path<String>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<TransactionResponse>>>, StatusCode> {
    if !crate::validate_address(&address).unwrap_or(false) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let page = query.page.unwrap_or(0);
    let limit = query.limit.unwrap_or(10);

    let all = node
        .find_all_transactions()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let matching: Vec<&TxSummary> = all
        .values()
        .filter(|summary| summary.outputs.iter().any(|o| o.address == address))
        .collect();
    let total = matching.len() as u32;

    let items: Vec<TransactionResponse> = matching
        .into_iter()
        .skip(page as usize * limit as usize)
        .take(limit as usize)
        .map(summary_to_response)
        .collect();

    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, page, limit, total))))
}

fn summary_to_response(summary: &TxSummary) -> TransactionResponse {
    TransactionResponse {
        txid: summary.id_hex.clone(),
        is_coinbase: summary.inputs.is_empty(),
        input_count: summary.inputs.len(),
        output_count: summary.outputs.len(),
        total_output_value: summary.outputs.iter().map(|o| o.value).sum(),
    }
}
