use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::GLOBAL_CONFIG;
use crate::chain::UTXOSet;
use crate::node::NodeContext;
use crate::transaction::Transaction;
use crate::web::models::{ApiResponse, MiningRequest, MiningStatusResponse};

/// Report whether this node is configured to mine and how full its mempool is
#[utoipa::path(
    get,
    path = "/api/v1/mining/info",
    tag = "Mining",
    responses(
        (status = 200, description = "Mining info retrieved", body = ApiResponse<MiningStatusResponse>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_mining_info(
    State(node): State<Arc<NodeContext>>,
) -> Result<Json<ApiResponse<MiningStatusResponse>>, StatusCode> {
    let mempool_size = node.get_mempool_size().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ApiResponse::success(MiningStatusResponse {
        is_miner: GLOBAL_CONFIG.is_miner(),
        mining_address: GLOBAL_CONFIG.get_mining_addr(),
        mempool_size,
    })))
}

/// Mine a single block paying the reward to `mining_address`, bypassing this
/// node's configured mining address. Sweeps the current mempool along with it.
#[utoipa::path(
    post,
    path = "/api/v1/mining/generatetoaddress",
    tag = "Mining",
    request_body = MiningRequest,
    responses(
        (status = 200, description = "Block mined", body = ApiResponse<String>),
        (status = 400, description = "Invalid mining address"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_to_address(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<MiningRequest>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    if !crate::validate_address(&request.mining_address).unwrap_or(false) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let coinbase = Transaction::new_coinbase(&request.mining_address, b"generatetoaddress".to_vec())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let pending = node.get_mempool_transactions().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut txs = vec![coinbase];
    txs.extend(pending);

    let cancel = Arc::new(AtomicBool::new(false));
    let block = node
        .mine_block(&txs, &cancel)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    node.add_block(&block).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    UTXOSet::new(node.blockchain().clone())
        .update(&block)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    for tx in block.transactions() {
        if !tx.is_coinbase() {
            node.remove_from_memory_pool(&tx.id_hex());
        }
    }

    Ok(Json(ApiResponse::success(data_encoding::HEXLOWER.encode(block.hash()))))
}
