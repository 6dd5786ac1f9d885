//! The `/kobo` page: code entry form and file list for the e-reader browser.
//!
//! The code arrives as `?code=` from the form's GET submit or as a urlencoded
//! POST body. Every outcome renders a full page with status 200.

use crate::state::AppState;
use crate::views;
use axum::{
    extract::{Query, State},
    response::Html,
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct CodeParams {
    /// Pairing code, any case, with or without the hyphen
    pub code: Option<String>,
}

#[utoipa::path(
    get,
    path = "/kobo",
    tag = "kobo",
    params(CodeParams),
    responses(
        (status = 200, description = "Entry form, error page or file list", content_type = "text/html")
    )
)]
pub async fn kobo_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CodeParams>,
) -> Html<String> {
    render(&state, params.code.as_deref()).await
}

#[utoipa::path(
    post,
    path = "/kobo",
    tag = "kobo",
    request_body(content = inline(Object), content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Entry form, error page or file list", content_type = "text/html")
    )
)]
pub async fn kobo_submit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CodeParams>,
    Form(form): Form<CodeParams>,
) -> Html<String> {
    let code = query.code.filter(|c| !c.is_empty()).or(form.code);
    render(&state, code.as_deref()).await
}

async fn render(state: &AppState, code: Option<&str>) -> Html<String> {
    let page = state.listing.lookup(code).await;
    Html(views::render_kobo_page(&page))
}
