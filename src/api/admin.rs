/// Admin API Endpoints
///
/// Every handler hands the (optional) session to the console, which runs the
/// access gate before touching anything.
use crate::{
    admin::{
        AdminAccess, AdminInvitation, AdminWithUser, AuditLogPage, CreateInvitationRequest,
        CurrentAdmin, UpdateAdminPermissionsRequest, UpdateAdminStatusRequest,
    },
    auth::OptionalAuthContext,
    error::AdminResult,
    AppContext,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

/// Build admin API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        // Invitations
        .route(
            "/api/admin/invitations",
            post(create_invitation).get(list_pending_invitations),
        )
        .route("/api/admin/invitations/:id/revoke", post(revoke_invitation))
        // Admins
        .route("/api/admin/admins", get(list_admins))
        .route("/api/admin/me", get(current_admin))
        .route("/api/admin/admins/:id/status", put(update_admin_status))
        .route("/api/admin/admins/:id/permissions", put(update_admin_permissions))
        // Audit
        .route("/api/admin/audit-logs", get(list_audit_logs))
}

/// Issue an invitation
async fn create_invitation(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Json(req): Json<CreateInvitationRequest>,
) -> AdminResult<(StatusCode, Json<AdminInvitation>)> {
    let invitation = ctx
        .console
        .create_invitation(auth.session.as_ref(), req)
        .await?;

    Ok((StatusCode::CREATED, Json(invitation)))
}

async fn list_pending_invitations(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
) -> AdminResult<Json<Vec<AdminInvitation>>> {
    let invitations = ctx
        .console
        .list_pending_invitations(auth.session.as_ref())
        .await?;

    Ok(Json(invitations))
}

async fn revoke_invitation(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Path(id): Path<String>,
) -> AdminResult<Json<AdminInvitation>> {
    let invitation = ctx
        .console
        .revoke_invitation(auth.session.as_ref(), &id)
        .await?;

    Ok(Json(invitation))
}

async fn list_admins(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
) -> AdminResult<Json<Vec<AdminWithUser>>> {
    Ok(Json(ctx.console.list_admins(auth.session.as_ref()).await?))
}

async fn current_admin(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
) -> AdminResult<Json<CurrentAdmin>> {
    Ok(Json(ctx.console.current_admin(auth.session.as_ref()).await?))
}

async fn update_admin_status(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateAdminStatusRequest>,
) -> AdminResult<Json<AdminAccess>> {
    let access = ctx
        .console
        .update_admin_status(auth.session.as_ref(), &id, req)
        .await?;

    Ok(Json(access))
}

async fn update_admin_permissions(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateAdminPermissionsRequest>,
) -> AdminResult<Json<AdminAccess>> {
    let access = ctx
        .console
        .update_admin_permissions(auth.session.as_ref(), &id, req)
        .await?;

    Ok(Json(access))
}

#[derive(Debug, Deserialize)]
struct AuditLogQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_audit_logs(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Query(query): Query<AuditLogQuery>,
) -> AdminResult<Json<AuditLogPage>> {
    let page = ctx
        .console
        .list_audit_logs(auth.session.as_ref(), query.page, query.limit)
        .await?;

    Ok(Json(page))
}
