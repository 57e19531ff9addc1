//! Library home-page summary endpoint

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::{error::AppResult, models::summary::LibrarySummary};

/// Cookie carrying the client's visit count
const VISIT_COOKIE: &str = "num_visits";

/// Library summary: entity counts plus the caller's visit count.
///
/// The counter is request-scoped: the prior count arrives in a cookie,
/// the response reports it and sets the cookie to prior + 1. A first
/// visit (or an unreadable cookie) reports 0.
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Library summary", body = LibrarySummary)
    )
)]
pub async fn library_summary(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<LibrarySummary>)> {
    let num_visits: i64 = jar
        .get(VISIT_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
        .unwrap_or(0);

    let summary = state.services.catalog.summary(num_visits).await?;

    let jar = jar.add(
        Cookie::build((VISIT_COOKIE, (num_visits + 1).to_string()))
            .path("/")
            .build(),
    );

    Ok((jar, Json(summary)))
}
