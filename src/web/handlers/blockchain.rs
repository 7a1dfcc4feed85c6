use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;

use crate::Block;
use crate::node::NodeContext;
use crate::web::models::{
    ApiResponse, BlockQuery, BlockResponse, BlockchainInfoResponse, PaginatedResponse,
};

/// Get blockchain information
#[utoipa::path(
    get,
    path = "/api/v1/blockchain",
    tag = "Blockchain",
    responses(
        (status = 200, description = "Blockchain info retrieved", body = ApiResponse<BlockchainInfoResponse>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_blockchain_info(
    State(node): State<Arc<NodeContext>>,
) -> Result<Json<ApiResponse<BlockchainInfoResponse>>, StatusCode> {
    let height = node
        .get_blockchain_height()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let latest = node
        .get_latest_blocks(1)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (last_block_hash, difficulty, last_block_timestamp) = match latest.first() {
        Some(block) => (
            data_encoding::HEXLOWER.encode(block.hash()),
            block.difficulty(),
            chrono::DateTime::from_timestamp(block.timestamp() / 1000, 0).unwrap_or_else(chrono::Utc::now),
        ),
        None => (String::new(), 0, chrono::Utc::now()),
    };

    let mempool_size = node.get_mempool_size().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let info = BlockchainInfoResponse {
        height,
        difficulty,
        total_blocks: height + 1,
        total_transactions: 0,
        mempool_size,
        last_block_hash,
        last_block_timestamp,
    };

    Ok(Json(ApiResponse::success(info)))
}

/// Get a block by its hex-encoded hash
#[utoipa::path(
    get,
    path = "/api/v1/blockchain/blocks/{hash}",
    tag = "Blockchain",
    params(("hash" = String, Path, description = "Hex-encoded block hash")),
    responses(
        (status = 200, description = "Block found", body = ApiResponse<BlockResponse>),
        (status = 404, description = "Block not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_block_by_hash(
    State(node): State<Arc<NodeContext>>,
    Path(hash): Path<String>,
) -> Result<Json<ApiResponse<BlockResponse>>, StatusCode> {
    let block = node
        .get_block_by_hash(&hash)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ApiResponse::success(block_to_response(&block))))
}

/// Get blocks with pagination, newest-first
#[utoipa::path(
    get,
    path = "/api/v1/blockchain/blocks",
    tag = "Blockchain",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default: 0)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Blocks retrieved", body = ApiResponse<PaginatedResponse<BlockResponse>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_blocks(
    State(node): State<Arc<NodeContext>>,
    Query(query): Query<BlockQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<BlockResponse>>>, StatusCode> {
    let page = query.page.unwrap_or(0);
    let limit = query.limit.unwrap_or(10);
    let height = node
        .get_blockchain_height()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let skip = page as usize * limit as usize;
    let blocks = node
        .get_latest_blocks(skip + limit as usize)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let page_blocks: Vec<BlockResponse> = blocks
        .into_iter()
        .skip(skip)
        .take(limit as usize)
        .map(|b| block_to_response(&b))
        .collect();

    let paginated = PaginatedResponse::new(page_blocks, page, limit, (height + 1) as u32);
    Ok(Json(ApiResponse::success(paginated)))
}

/// Get the most recent blocks
#[utoipa::path(
    get,
    path = "/api/v1/blockchain/blocks/latest",
    tag = "Blockchain",
    params(("limit" = Option<u32>, Query, description = "Number of blocks (default: 10)")),
    responses(
        (status = 200, description = "Latest blocks retrieved", body = ApiResponse<Vec<BlockResponse>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_latest_blocks(
    State(node): State<Arc<NodeContext>>,
    Query(query): Query<BlockQuery>,
) -> Result<Json<ApiResponse<Vec<BlockResponse>>>, StatusCode> {
    let limit = query.limit.unwrap_or(10) as usize;
    let blocks = node
        .get_latest_blocks(limit)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .iter()
        .map(block_to_response)
        .collect();

    Ok(Json(ApiResponse::success(blocks)))
}

fn block_to_response(block: &Block) -> BlockResponse {
    BlockResponse {
        hash: data_encoding::HEXLOWER.encode(block.hash()),
        previous_hash: data_encoding::HEXLOWER.encode(block.prev_hash()),
        timestamp: chrono::DateTime::from_timestamp(block.timestamp() / 1000, 0).unwrap_or_else(chrono::Utc::now),
        height: block.height(),
        nonce: block.nonce(),
        difficulty: block.difficulty(),
        transaction_count: block.transactions().len(),
    }
}
