use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::{AdminOrder, LedgerStats, OrderWithProduct};

/// The caller's completed purchases.
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<OrderWithProduct>>> {
    let conn = state.db.get()?;
    let orders = queries::list_paid_orders_for_user(&conn, &ctx.user.id)?;
    Ok(Json(orders))
}

/// Every order in the ledger with its buyer (admin only, enforced by the route layer).
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<AdminOrder>>> {
    let conn = state.db.get()?;
    let orders = queries::list_all_orders(&conn)?;
    Ok(Json(orders))
}

/// GET /admin/stats
pub async fn ledger_stats(State(state): State<AppState>) -> Result<Json<LedgerStats>> {
    let conn = state.db.get()?;
    Ok(Json(queries::ledger_stats(&conn)?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderWithProduct>> {
    let conn = state.db.get()?;
    let order = queries::get_order_with_product(&conn, &order_id)?
        .or_not_found(msg::ORDER_NOT_FOUND)?;

    if !ctx.can_access(&order.order.user_id) {
        return Err(AppError::Forbidden(msg::NOT_ORDER_OWNER.into()));
    }

    Ok(Json(order))
}
