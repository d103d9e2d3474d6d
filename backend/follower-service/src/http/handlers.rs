use crate::connection::{Health, LivenessProbe};
use crate::domain::FollowEdge;
use crate::error::GraphError;
use crate::services::{parse_limit, RecommendationEngine, RelationshipService};
use actix_web::{web, HttpResponse};

/// Shared handler state; cheap to clone per worker.
#[derive(Clone)]
pub struct AppState {
    pub relationships: RelationshipService,
    pub recommendations: RecommendationEngine,
    pub probe: LivenessProbe,
}

impl AppState {
    pub fn new(relationships: RelationshipService, probe: LivenessProbe) -> Self {
        Self {
            recommendations: RecommendationEngine::new(relationships.clone()),
            relationships,
            probe,
        }
    }
}

/// First value of `key` in a decoded query string. Repeated keys are not an
/// error; later occurrences are ignored.
fn first_param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub async fn follow(
    state: web::Data<AppState>,
    body: web::Json<FollowEdge>,
) -> Result<HttpResponse, GraphError> {
    state
        .relationships
        .follow(&body.follower, &body.followee)
        .await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn unfollow(
    state: web::Data<AppState>,
    body: web::Json<FollowEdge>,
) -> Result<HttpResponse, GraphError> {
    let removed = state
        .relationships
        .unfollow(&body.follower, &body.followee)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}

pub async fn followers(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, GraphError> {
    let ids = state.relationships.followers(&path).await?;
    Ok(HttpResponse::Ok().json(ids))
}

pub async fn following(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, GraphError> {
    let ids = state.relationships.following(&path).await?;
    Ok(HttpResponse::Ok().json(ids))
}

pub async fn recommendations(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse, GraphError> {
    // Raw pairs so a malformed or repeated limit falls back instead of rejecting
    let limit = parse_limit(first_param(&query, "limit"));
    let ids = state.recommendations.recommendations(&path, limit).await?;
    Ok(HttpResponse::Ok().json(ids))
}

pub async fn visibility(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, GraphError> {
    let (viewer, author) = path.into_inner();
    let visible = state.relationships.can_view(&viewer, &author).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "visible": visible })))
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.probe.check().await {
        Health::Healthy => HttpResponse::Ok().body("OK"),
        Health::Unhealthy => HttpResponse::ServiceUnavailable().body("unhealthy"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_first_param_takes_earliest_value() {
        let query = pairs(&[("other", "x"), ("limit", "1"), ("limit", "2")]);
        assert_eq!(first_param(&query, "limit"), Some("1"));
        assert_eq!(first_param(&query, "missing"), None);
    }
}
